pub mod all_themes;
pub mod candle;
pub mod fetch;
pub mod kline;
pub mod themes;

use crate::constants::MAX_RENDER_SCALE;
use crate::error::{Error, Result};
use crate::services::{CancelToken, GenerationStats};
use crate::services::render::RenderOptions;

/// Run a blocking chart job with Ctrl+C wired to its cancel token
pub(crate) fn run_cancellable<F>(job: F) -> Result<GenerationStats>
where
    F: FnOnce(CancelToken) -> Result<GenerationStats> + Send + 'static,
{
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let cancel = CancelToken::new();
        cancel.cancel_on_ctrl_c();
        tokio::task::spawn_blocking(move || job(cancel))
            .await
            .map_err(|e| Error::Other(format!("Chart task failed: {}", e)))?
    })
}

pub(crate) fn render_options(scale: f64) -> Result<RenderOptions> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::InvalidInput(format!("scale must be positive, got {}", scale)));
    }
    if scale > MAX_RENDER_SCALE {
        return Err(Error::InvalidInput(format!(
            "scale must be at most {}, got {}",
            MAX_RENDER_SCALE, scale
        )));
    }
    Ok(RenderOptions { render_scale: scale })
}

pub(crate) fn print_stats(stats: &GenerationStats) {
    println!("\n📊 Summary:");
    println!("   Stocks processed: {}", stats.stocks_processed);
    println!("   Stocks failed:    {}", stats.stocks_failed);
    println!("   Charts written:   {}", stats.charts_written);
    if stats.interrupted {
        println!("⚠️  Interrupted by user, partial output kept");
    } else {
        println!("✅ Done");
    }
}

/// Print a top-level error and exit with status 1
pub(crate) fn exit_with_error(e: Error) -> ! {
    tracing::error!(error = %e, "Command failed");
    eprintln!("❌ Error: {}", e);
    std::process::exit(1);
}
