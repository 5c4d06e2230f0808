pub mod candle_generator;
pub mod csv_store;
pub mod data_fetcher;
pub mod indicator_engine;
pub mod interrupt;
pub mod kline_generator;
pub mod render;
pub mod theme_runner;
pub mod tushare;
pub mod windowing;

pub use candle_generator::CandleGenerator;
pub use csv_store::{list_stock_files, load_daily_csv, save_daily_csv, StockFile};
pub use data_fetcher::{DataFetcher, FetchStats};
pub use indicator_engine::{compute_indicators, AugmentedSeries, IndicatorColumn};
pub use interrupt::CancelToken;
pub use kline_generator::KlineGenerator;
pub use theme_runner::{ThemeRunner, ThemeRunnerConfig};
pub use tushare::TushareClient;
pub use windowing::{calendar_windows, positional_windows, PositionalWindow};

use indicatif::{ProgressBar, ProgressStyle};

/// Outcome of a chart generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub stocks_processed: usize,
    pub stocks_failed: usize,
    pub charts_written: usize,
    pub interrupted: bool,
}

impl GenerationStats {
    pub fn merge(&mut self, other: &GenerationStats) {
        self.stocks_processed += other.stocks_processed;
        self.stocks_failed += other.stocks_failed;
        self.charts_written += other.charts_written;
        self.interrupted |= other.interrupted;
    }
}

/// Progress bar over stock files
pub(crate) fn stock_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
