//! Runs the chart generators once per theme
//!
//! Each theme writes straight into `<base>/<theme>/` under three base
//! directories; the theme is handed to the generators explicitly.

use crate::constants::{
    ALL_THEMES_CANDLE_DIR, ALL_THEMES_KLINE_DIR, ALL_THEMES_LIMIT, ALL_THEMES_MULTI_DAY_DIR,
    DEFAULT_PERIODS,
};
use crate::error::Result;
use crate::models::{IndicatorConfig, ThemeDescriptor, ThemeRegistry, TimeRange};
use crate::services::candle_generator::CandleGenerator;
use crate::services::interrupt::CancelToken;
use crate::services::kline_generator::KlineGenerator;
use crate::services::render::RenderOptions;
use crate::services::GenerationStats;
use crate::utils::clear_directory;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ThemeRunnerConfig {
    pub data_dir: PathBuf,
    /// Parent of the `all_themes_*` directories
    pub output_root: PathBuf,
    /// Only this theme; unknown names fall back to all themes
    pub theme: Option<String>,
    /// Stock files per theme for the candle generator; kline charts cover every file
    pub limit: Option<usize>,
    pub kline: bool,
    pub candle: bool,
    /// Delete and recreate the base directories first
    pub clear: bool,
    pub single: bool,
    pub periods: Vec<usize>,
    pub indicators: IndicatorConfig,
    pub range: TimeRange,
    pub options: RenderOptions,
}

impl ThemeRunnerConfig {
    pub fn new(data_dir: PathBuf, output_root: PathBuf) -> Self {
        Self {
            data_dir,
            output_root,
            theme: None,
            limit: Some(ALL_THEMES_LIMIT),
            kline: true,
            candle: true,
            clear: true,
            single: true,
            periods: DEFAULT_PERIODS.to_vec(),
            indicators: IndicatorConfig::default(),
            range: TimeRange::default(),
            options: RenderOptions::default(),
        }
    }

    pub fn kline_base(&self) -> PathBuf {
        self.output_root.join(ALL_THEMES_KLINE_DIR)
    }

    pub fn candle_base(&self) -> PathBuf {
        self.output_root.join(ALL_THEMES_CANDLE_DIR)
    }

    pub fn multi_day_base(&self) -> PathBuf {
        self.output_root.join(ALL_THEMES_MULTI_DAY_DIR)
    }
}

pub struct ThemeRunner {
    config: ThemeRunnerConfig,
    registry: ThemeRegistry,
}

impl ThemeRunner {
    pub fn new(config: ThemeRunnerConfig, registry: ThemeRegistry) -> Self {
        Self { config, registry }
    }

    /// Themes to process, in registry order
    pub fn selected_themes(&self) -> Vec<&ThemeDescriptor> {
        if let Some(name) = &self.config.theme {
            match self.registry.get(name) {
                Some(theme) => return vec![theme],
                None => warn!(theme = %name, "Unknown theme, processing all themes"),
            }
        }
        self.registry.iter().collect()
    }

    fn prepare_directories(&self) -> Result<()> {
        let mut bases = Vec::new();
        if self.config.kline {
            bases.push(self.config.kline_base());
        }
        if self.config.candle {
            bases.push(self.config.candle_base());
            bases.push(self.config.multi_day_base());
        }
        for base in bases {
            if self.config.clear {
                clear_directory(&base)?;
            } else {
                std::fs::create_dir_all(&base)?;
            }
        }
        Ok(())
    }

    fn run_theme(&self, theme: &ThemeDescriptor, cancel: &CancelToken) -> Result<GenerationStats> {
        let mut stats = GenerationStats::default();

        if self.config.kline {
            let mut kline = KlineGenerator::new(
                self.config.data_dir.clone(),
                self.config.kline_base().join(&theme.name),
                theme.clone(),
            );
            kline.indicators = self.config.indicators.clone();
            kline.range = self.config.range.clone();
            kline.options = self.config.options;
            stats.merge(&kline.run(cancel)?);
        }

        if self.config.candle && !cancel.is_cancelled() {
            let mut candle = CandleGenerator::new(
                self.config.data_dir.clone(),
                self.config.candle_base().join(&theme.name),
                self.config.multi_day_base().join(&theme.name),
                theme.clone(),
            );
            candle.limit = self.config.limit;
            candle.single = self.config.single;
            candle.periods = self.config.periods.clone();
            candle.options = self.config.options;
            stats.merge(&candle.run(cancel)?);
        }

        Ok(stats)
    }

    /// Generate charts for every selected theme; per-theme failures are logged and skipped
    pub fn run(&self, cancel: &CancelToken) -> Result<GenerationStats> {
        self.prepare_directories()?;

        let themes = self.selected_themes();
        let mut total = GenerationStats::default();
        for (idx, theme) in themes.iter().enumerate() {
            if cancel.is_cancelled() {
                total.interrupted = true;
                break;
            }

            println!("\n🎨 [{}/{}] Theme: {}", idx + 1, themes.len(), theme.name);
            let started = Instant::now();
            match self.run_theme(theme, cancel) {
                Ok(stats) => {
                    info!(
                        theme = %theme.name,
                        charts = stats.charts_written,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Theme complete"
                    );
                    total.merge(&stats);
                }
                Err(e) => error!(theme = %theme.name, error = %e, "Theme failed"),
            }
        }

        Ok(total)
    }
}
