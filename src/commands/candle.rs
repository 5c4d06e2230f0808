use crate::cli::CandleArgs;
use crate::constants::{CANDLE_OUTPUT_DIR, MULTI_DAY_OUTPUT_DIR};
use crate::error::Result;
use crate::models::ThemeRegistry;
use crate::services::{CandleGenerator, GenerationStats};
use crate::utils::get_data_dir;
use std::path::PathBuf;

pub fn run(limit: usize, theme: String, candles: CandleArgs, scale: f64) {
    match generate(limit, theme, candles, scale) {
        Ok(stats) => super::print_stats(&stats),
        Err(e) => super::exit_with_error(e),
    }
}

fn generate(limit: usize, theme: String, candles: CandleArgs, scale: f64) -> Result<GenerationStats> {
    let registry = ThemeRegistry::builtin();
    println!("🎨 Available themes: {}", registry.names().join(", "));
    let theme = registry.resolve(&theme).clone();

    let mut generator = CandleGenerator::new(
        get_data_dir(),
        PathBuf::from(CANDLE_OUTPUT_DIR),
        PathBuf::from(MULTI_DAY_OUTPUT_DIR),
        theme,
    );
    generator.limit = Some(limit);
    generator.single = !candles.no_single;
    generator.periods = candles.effective_periods();
    generator.options = super::render_options(scale)?;

    super::run_cancellable(move |cancel| generator.run(&cancel))
}
