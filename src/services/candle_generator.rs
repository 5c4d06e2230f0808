use crate::constants::DEFAULT_PERIODS;
use crate::error::Result;
use crate::models::{ColorScheme, DailyBar, ThemeDescriptor};
use crate::services::csv_store::{list_stock_files, load_daily_csv};
use crate::services::interrupt::CancelToken;
use crate::services::render::{render_candles, RenderOptions};
use crate::services::windowing::positional_windows;
use crate::services::{stock_progress_bar, GenerationStats};
use crate::utils::{ensure_dir, format_trade_date};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// `<out>/<code>/<code>_candle_<YYYYMMDD>.png`
pub fn single_candle_path(out_dir: &Path, code: &str, date: NaiveDate) -> PathBuf {
    out_dir
        .join(code)
        .join(format!("{}_candle_{}.png", code, format_trade_date(date)))
}

/// Directory holding the slices of one period: `<multi>/<code>/<P>日`
pub fn period_dir(multi_dir: &Path, code: &str, period: usize) -> PathBuf {
    multi_dir.join(code).join(format!("{}日", period))
}

/// `<code>_<P>日_<start>_<end>.png`
pub fn multi_day_file_name(code: &str, period: usize, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{}_{}日_{}_{}.png",
        code,
        period,
        format_trade_date(start),
        format_trade_date(end)
    )
}

/// Candle-only charts: one per trading day and one per positional slice
pub struct CandleGenerator {
    pub data_dir: PathBuf,
    pub single_dir: PathBuf,
    pub multi_dir: PathBuf,
    pub theme: ThemeDescriptor,
    pub colors: ColorScheme,
    /// Only the first N stock files
    pub limit: Option<usize>,
    /// Multi-day periods; empty disables multi-day charts
    pub periods: Vec<usize>,
    pub single: bool,
    pub show_details: bool,
    pub options: RenderOptions,
}

impl CandleGenerator {
    pub fn new(data_dir: PathBuf, single_dir: PathBuf, multi_dir: PathBuf, theme: ThemeDescriptor) -> Self {
        Self {
            data_dir,
            single_dir,
            multi_dir,
            theme,
            colors: ColorScheme::default(),
            limit: Some(1),
            periods: DEFAULT_PERIODS.to_vec(),
            single: true,
            show_details: true,
            options: RenderOptions::default(),
        }
    }

    /// One chart per trading day
    ///
    /// A failure stops this phase only; the charts already written are counted.
    pub fn render_single_days(&self, code: &str, bars: &[DailyBar], cancel: &CancelToken) -> usize {
        let mut written = 0;
        if let Err(e) = self.try_single_days(code, bars, cancel, &mut written) {
            error!(code = code, written = written, error = %e, "Failed to render single-day candles");
        }
        written
    }

    fn try_single_days(&self, code: &str, bars: &[DailyBar], cancel: &CancelToken, written: &mut usize) -> Result<()> {
        ensure_dir(&self.single_dir.join(code))?;

        let total = bars.len();
        for (idx, bar) in bars.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }
            if idx % 10 == 0 || idx + 1 == total {
                info!(code = code, progress = idx + 1, total = total, "Rendering single-day candles");
            }
            let path = single_candle_path(&self.single_dir, code, bar.trade_date);
            render_candles(
                std::slice::from_ref(bar),
                &self.theme,
                &self.colors,
                &path,
                self.show_details,
                &self.options,
            )?;
            *written += 1;
        }
        Ok(())
    }

    /// Positional slices for each configured period
    ///
    /// Like the single-day phase, an error ends the phase and keeps the count.
    pub fn render_multi_day(&self, code: &str, bars: &[DailyBar], cancel: &CancelToken) -> usize {
        let mut written = 0;
        if let Err(e) = self.try_multi_day(code, bars, cancel, &mut written) {
            error!(code = code, written = written, error = %e, "Failed to render multi-day candles");
        }
        written
    }

    fn try_multi_day(&self, code: &str, bars: &[DailyBar], cancel: &CancelToken, written: &mut usize) -> Result<()> {
        for &period in &self.periods {
            if cancel.is_cancelled() {
                break;
            }

            let windows = positional_windows(bars, period)?;
            let dir = period_dir(&self.multi_dir, code, period);
            ensure_dir(&dir)?;
            info!(code = code, period = period, windows = windows.len(), "Rendering multi-day candles");

            for window in &windows {
                if cancel.is_cancelled() {
                    break;
                }
                let (Some(first), Some(last)) = (window.rows.first(), window.rows.last()) else {
                    continue;
                };
                let path = dir.join(multi_day_file_name(code, period, first.trade_date, last.trade_date));
                render_candles(&window.rows, &self.theme, &self.colors, &path, self.show_details, &self.options)?;
                *written += 1;
            }
        }
        Ok(())
    }

    /// Single-day charts (when enabled) followed by the multi-day slices
    pub fn render_stock(&self, code: &str, bars: &[DailyBar], cancel: &CancelToken) -> usize {
        if bars.is_empty() {
            warn!(code = code, "No rows to chart");
            return 0;
        }

        let mut written = 0;
        if self.single {
            written += self.render_single_days(code, bars, cancel);
        }
        if !self.periods.is_empty() && !cancel.is_cancelled() {
            written += self.render_multi_day(code, bars, cancel);
        }
        written
    }

    pub fn run(&self, cancel: &CancelToken) -> Result<GenerationStats> {
        let mut files = list_stock_files(&self.data_dir)?;
        if let Some(limit) = self.limit {
            files.truncate(limit);
        }

        println!(
            "🕯️  Generating candle charts for {} stocks (theme: {}, periods: {:?})",
            files.len(),
            self.theme.name,
            self.periods
        );

        let mut stats = GenerationStats::default();
        let pb = stock_progress_bar(files.len());
        for file in &files {
            if cancel.is_cancelled() {
                stats.interrupted = true;
                break;
            }
            pb.set_message(file.code.clone());

            let result = load_daily_csv(&file.path).map(|bars| self.render_stock(&file.code, &bars, cancel));
            match result {
                Ok(written) => {
                    stats.stocks_processed += 1;
                    stats.charts_written += written;
                }
                Err(e) => {
                    error!(code = %file.code, error = %e, "Failed to generate candle charts");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThemeRegistry;
    use crate::services::csv_store::{daily_file_path, save_daily_csv};
    use chrono::Duration;

    fn bars(n: usize) -> Vec<DailyBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let c = 8.0 + (i % 4) as f64 * 0.1;
                DailyBar::new(start + Duration::days(i as i64), c, c + 0.3, c - 0.3, c + 0.05, 500.0)
            })
            .collect()
    }

    fn generator(root: &Path) -> CandleGenerator {
        let theme = ThemeRegistry::builtin().resolve("sas").clone();
        let mut generator = CandleGenerator::new(
            root.join("daily_data"),
            root.join("candle_images"),
            root.join("multi_day_candles"),
            theme,
        );
        generator.options = RenderOptions { render_scale: 0.02 };
        generator
    }

    #[test]
    fn test_paths() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(
            single_candle_path(Path::new("out"), "600000.SH", date),
            Path::new("out/600000.SH/600000.SH_candle_20240506.png")
        );
        assert_eq!(
            period_dir(Path::new("multi"), "600000.SH", 5),
            Path::new("multi/600000.SH/5日")
        );
        assert_eq!(
            multi_day_file_name("600000.SH", 5, date, date + Duration::days(4)),
            "600000.SH_5日_20240506_20240510.png"
        );
    }

    #[test]
    fn test_run_writes_single_and_multi_day() {
        let tmp = tempfile::tempdir().unwrap();
        let mut generator = generator(tmp.path());
        generator.periods = vec![5];
        save_daily_csv(&daily_file_path(&generator.data_dir, "600000.SH"), "600000.SH", &bars(23)).unwrap();

        let stats = generator.run(&CancelToken::new()).unwrap();

        // 23 single-day charts plus 3 five-day windows
        assert_eq!(stats.charts_written, 26);
        let period = period_dir(&generator.multi_dir, "600000.SH", 5);
        assert_eq!(std::fs::read_dir(&period).unwrap().count(), 3);
        assert!(period.join("600000.SH_5日_20240101_20240105.png").exists());
        assert!(period.join("600000.SH_5日_20240111_20240115.png").exists());
    }

    #[test]
    fn test_single_day_failure_still_renders_multi_day() {
        let tmp = tempfile::tempdir().unwrap();
        let mut generator = generator(tmp.path());
        generator.periods = vec![5];
        let rows = bars(12);
        save_daily_csv(&daily_file_path(&generator.data_dir, "600000.SH"), "600000.SH", &rows).unwrap();

        // A directory where the fourth single-day chart should go
        std::fs::create_dir_all(single_candle_path(&generator.single_dir, "600000.SH", rows[3].trade_date)).unwrap();

        let stats = generator.run(&CancelToken::new()).unwrap();

        // three single-day charts before the failure plus one five-day window
        assert_eq!(stats.stocks_processed, 1);
        assert_eq!(stats.stocks_failed, 0);
        assert_eq!(stats.charts_written, 4);
        let period = period_dir(&generator.multi_dir, "600000.SH", 5);
        assert!(period.join("600000.SH_5日_20240101_20240105.png").exists());
    }

    #[test]
    fn test_header_only_csv_renders_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let generator = generator(tmp.path());
        std::fs::create_dir_all(&generator.data_dir).unwrap();
        std::fs::write(
            generator.data_dir.join("600000.SH_daily.csv"),
            "ts_code,trade_date,open,high,low,close,vol\n",
        )
        .unwrap();

        let stats = generator.run(&CancelToken::new()).unwrap();

        assert_eq!(stats.stocks_processed, 1);
        assert_eq!(stats.stocks_failed, 0);
        assert_eq!(stats.charts_written, 0);
        assert!(!generator.single_dir.join("600000.SH").exists());
        assert!(!generator.multi_dir.join("600000.SH").exists());
    }

    #[test]
    fn test_single_disabled_and_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let mut generator = generator(tmp.path());
        generator.single = false;
        generator.periods = vec![10, 20];
        for code in ["600000.SH", "600519.SH"] {
            save_daily_csv(&daily_file_path(&generator.data_dir, code), code, &bars(12)).unwrap();
        }

        let stats = generator.run(&CancelToken::new()).unwrap();

        // limit defaults to the first stock; 12 rows give one slice per period
        assert_eq!(stats.stocks_processed, 1);
        assert_eq!(stats.charts_written, 2);
        assert!(!generator.single_dir.exists());
        assert!(!generator.multi_dir.join("600519.SH").exists());
    }
}
