use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use crate::constants::{ALL_THEMES_LIMIT, DEFAULT_START_DATE, DEFAULT_THEME, DEFAULT_WINDOW_MONTHS};

#[derive(Parser)]
#[command(name = "kline-studio")]
#[command(about = "Daily stock data fetcher and candlestick chart generator", long_about = None)]
pub struct Cli {
    /// Output size multiplier applied to figsize × dpi
    #[arg(long, global = true, default_value_t = 1.0)]
    pub scale: f64,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by the candle chart commands
#[derive(Args, Debug, Clone)]
pub struct CandleArgs {
    /// Multi-day periods in trading days
    #[arg(long, num_args = 1.., value_delimiter = ',', default_values_t = vec![5, 10, 20])]
    pub periods: Vec<usize>,

    /// Skip single-day charts
    #[arg(long)]
    pub no_single: bool,

    /// Skip multi-day charts
    #[arg(long)]
    pub no_multi: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download SSE 50 daily data from Tushare into the data directory
    Fetch {
        /// Only fetch the first N stocks
        #[arg(short, long)]
        limit: Option<usize>,

        /// First trading date (YYYYMMDD)
        #[arg(long, default_value = DEFAULT_START_DATE)]
        start_date: String,

        /// Last trading date (YYYYMMDD), defaults to today
        #[arg(long)]
        end_date: Option<String>,
    },
    /// Multi-panel kline charts with indicators, one per calendar window
    Kline {
        #[arg(short, long, default_value = DEFAULT_THEME)]
        theme: String,

        /// Only process the first N stock files
        #[arg(short, long)]
        limit: Option<usize>,

        /// Comma separated indicators (MA5,MA20,VWAP,RSI,BOLL,MACD)
        #[arg(short, long)]
        indicators: Option<String>,

        #[arg(long, default_value = DEFAULT_START_DATE)]
        start_date: String,

        #[arg(long)]
        end_date: Option<String>,

        /// Months per chart
        #[arg(long, default_value_t = DEFAULT_WINDOW_MONTHS)]
        window_months: u32,

        /// Output directory, defaults to kline_images
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Candle-only charts: one per trading day plus multi-day slices
    Candle {
        /// Only process the first N stock files
        #[arg(short, long, default_value_t = 1)]
        limit: usize,

        #[arg(short, long, default_value = DEFAULT_THEME)]
        theme: String,

        #[command(flatten)]
        candles: CandleArgs,
    },
    /// Generate charts for every theme into all_themes_* directories
    AllThemes {
        /// Only process the first N stock files for candle charts
        #[arg(short, long, default_value_t = ALL_THEMES_LIMIT)]
        limit: usize,

        /// Only kline charts
        #[arg(long, conflicts_with = "candle_only")]
        kline_only: bool,

        /// Only candle charts
        #[arg(long)]
        candle_only: bool,

        /// Keep existing output directories
        #[arg(long)]
        no_clear: bool,

        /// Only this theme
        #[arg(short, long)]
        theme: Option<String>,

        #[command(flatten)]
        candles: CandleArgs,
    },
    /// List available themes
    Themes,
}

pub fn run() {
    let cli = Cli::parse();
    let scale = cli.scale;

    match cli.command {
        Commands::Fetch {
            limit,
            start_date,
            end_date,
        } => {
            commands::fetch::run(limit, start_date, end_date);
        }
        Commands::Kline {
            theme,
            limit,
            indicators,
            start_date,
            end_date,
            window_months,
            output,
        } => {
            commands::kline::run(commands::kline::KlineArgs {
                theme,
                limit,
                indicators,
                start_date,
                end_date,
                window_months,
                output,
                scale,
            });
        }
        Commands::Candle { limit, theme, candles } => {
            commands::candle::run(limit, theme, candles, scale);
        }
        Commands::AllThemes {
            limit,
            kline_only,
            candle_only,
            no_clear,
            theme,
            candles,
        } => {
            commands::all_themes::run(commands::all_themes::AllThemesArgs {
                limit,
                kline: !candle_only,
                candle: !kline_only,
                clear: !no_clear,
                theme,
                candles,
                scale,
            });
        }
        Commands::Themes => {
            commands::themes::run();
        }
    }
}

impl CandleArgs {
    /// Periods to render; empty when multi-day charts are disabled
    pub fn effective_periods(&self) -> Vec<usize> {
        if self.no_multi {
            Vec::new()
        } else {
            self.periods.clone()
        }
    }
}
