use crate::cli::CandleArgs;
use crate::error::Result;
use crate::models::ThemeRegistry;
use crate::services::{GenerationStats, ThemeRunner, ThemeRunnerConfig};
use crate::utils::get_data_dir;
use std::path::PathBuf;
use std::time::Instant;

pub struct AllThemesArgs {
    pub limit: usize,
    pub kline: bool,
    pub candle: bool,
    pub clear: bool,
    pub theme: Option<String>,
    pub candles: CandleArgs,
    pub scale: f64,
}

pub fn run(args: AllThemesArgs) {
    let started = Instant::now();
    match generate(args) {
        Ok(stats) => {
            super::print_stats(&stats);
            println!("⏱️  Total time: {:.1}s", started.elapsed().as_secs_f64());
        }
        Err(e) => super::exit_with_error(e),
    }
}

fn generate(args: AllThemesArgs) -> Result<GenerationStats> {
    let mut config = ThemeRunnerConfig::new(get_data_dir(), PathBuf::from("."));
    config.limit = Some(args.limit);
    config.kline = args.kline;
    config.candle = args.candle;
    config.clear = args.clear;
    config.theme = args.theme;
    config.single = !args.candles.no_single;
    config.periods = args.candles.effective_periods();
    config.options = super::render_options(args.scale)?;

    let runner = ThemeRunner::new(config, ThemeRegistry::builtin());
    super::run_cancellable(move |cancel| runner.run(&cancel))
}
