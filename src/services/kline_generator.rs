use crate::error::Result;
use crate::models::{ColorScheme, DailyBar, IndicatorConfig, ThemeDescriptor, TimeRange};
use crate::services::csv_store::{filter_range, list_stock_files, load_daily_csv};
use crate::services::indicator_engine::compute_indicators;
use crate::services::interrupt::CancelToken;
use crate::services::render::{render_kline, RenderOptions};
use crate::services::windowing::calendar_windows;
use crate::services::{stock_progress_bar, GenerationStats};
use crate::utils::{ensure_dir, format_trade_date};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// `<code>_kline_pro_<start>_<end>_<theme>.png`
pub fn kline_file_name(code: &str, start: NaiveDate, end: NaiveDate, theme: &str) -> String {
    format!(
        "{}_kline_pro_{}_{}_{}.png",
        code,
        format_trade_date(start),
        format_trade_date(end),
        theme
    )
}

/// Multi-panel chart generator, one chart per calendar window
pub struct KlineGenerator {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub theme: ThemeDescriptor,
    pub colors: ColorScheme,
    pub indicators: IndicatorConfig,
    pub range: TimeRange,
    /// Only the first N stock files
    pub limit: Option<usize>,
    pub options: RenderOptions,
}

impl KlineGenerator {
    pub fn new(data_dir: PathBuf, output_dir: PathBuf, theme: ThemeDescriptor) -> Self {
        Self {
            data_dir,
            output_dir,
            theme,
            colors: ColorScheme::default(),
            indicators: IndicatorConfig::default(),
            range: TimeRange::default(),
            limit: None,
            options: RenderOptions::default(),
        }
    }

    /// Render every window of one stock; returns the number of charts written
    pub fn render_stock(&self, code: &str, bars: &[DailyBar], cancel: &CancelToken) -> Result<usize> {
        let bars = filter_range(bars, &self.range);
        if bars.is_empty() {
            warn!(code = code, start = %self.range.start_date, "No data in time range");
            return Ok(0);
        }

        let augmented = compute_indicators(&bars, &self.indicators);
        let windows = calendar_windows(&augmented, self.range.window_months)?;

        ensure_dir(&self.output_dir)?;
        let mut written = 0;
        for window in &windows {
            if cancel.is_cancelled() {
                break;
            }
            let Some((start, end)) = window.date_span() else {
                continue;
            };
            let path = self
                .output_dir
                .join(kline_file_name(code, start, end, &self.theme.name));
            render_kline(window, &self.theme, &self.colors, &path, &self.options)?;
            written += 1;
        }

        info!(code = code, windows = windows.len(), written = written, theme = %self.theme.name, "Generated kline charts");
        Ok(written)
    }

    fn process_file(&self, code: &str, path: &Path, cancel: &CancelToken) -> Result<usize> {
        let bars = load_daily_csv(path)?;
        self.render_stock(code, &bars, cancel)
    }

    /// Run over the stock files of the data directory
    pub fn run(&self, cancel: &CancelToken) -> Result<GenerationStats> {
        let mut files = list_stock_files(&self.data_dir)?;
        if let Some(limit) = self.limit {
            files.truncate(limit);
        }

        println!(
            "📈 Generating kline charts for {} stocks (theme: {})",
            files.len(),
            self.theme.name
        );

        let mut stats = GenerationStats::default();
        let pb = stock_progress_bar(files.len());
        for file in &files {
            if cancel.is_cancelled() {
                stats.interrupted = true;
                break;
            }
            pb.set_message(file.code.clone());

            match self.process_file(&file.code, &file.path, cancel) {
                Ok(written) => {
                    stats.stocks_processed += 1;
                    stats.charts_written += written;
                }
                Err(e) => {
                    error!(code = %file.code, error = %e, "Failed to generate kline charts");
                    stats.stocks_failed += 1;
                }
            }
            pb.inc(1);
        }
        if cancel.is_cancelled() {
            stats.interrupted = true;
        }
        pb.finish_with_message("done");

        Ok(stats)
    }
}
