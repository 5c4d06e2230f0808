//! Shared constants
//!
//! File layout, data source identifiers and the fixed windows used by the
//! indicator formulas.

use std::time::Duration;

/// Suffix of per-stock cache files (`600000.SH_daily.csv`)
pub const DAILY_FILE_SUFFIX: &str = "_daily.csv";

/// Header written by the CSV cache
pub const CSV_HEADER: [&str; 7] = ["ts_code", "trade_date", "open", "high", "low", "close", "vol"];

/// Date format used in CSV files, API params and output file names
pub const TRADE_DATE_FORMAT: &str = "%Y%m%d";

/// Default first trading date when fetching or charting
pub const DEFAULT_START_DATE: &str = "20230101";

/// Default calendar window size for multi-panel charts
pub const DEFAULT_WINDOW_MONTHS: u32 = 3;

/// Default multi-day candle periods
pub const DEFAULT_PERIODS: [usize; 3] = [5, 10, 20];

/// Minimum rows a multi-day slice needs to be rendered
pub const MIN_SLICE_ROWS: usize = 2;

/// SSE 50 index, whose constituents form the default universe
pub const SSE50_INDEX_CODE: &str = "000016.SH";

/// Fallback list of stock codes when the index lookup fails
pub const STOCK_CODE_FILE: &str = "stockcode.csv";

/// Tushare Pro HTTP endpoint
pub const TUSHARE_API_URL: &str = "http://api.tushare.pro";

/// Fixed delay between consecutive data source requests
pub const FETCH_PACING: Duration = Duration::from_secs(1);

/// Largest accepted render scale; the default figure is 4800 px square at 1.0
pub const MAX_RENDER_SCALE: f64 = 4.0;

/// Files processed per theme by the all-themes candle run
pub const ALL_THEMES_LIMIT: usize = 2;

/// Name of the theme used when a lookup misses
pub const DEFAULT_THEME: &str = "default";

/// Output directories
pub const KLINE_OUTPUT_DIR: &str = "kline_images";
pub const CANDLE_OUTPUT_DIR: &str = "candle_images";
pub const MULTI_DAY_OUTPUT_DIR: &str = "multi_day_candles";
pub const ALL_THEMES_KLINE_DIR: &str = "all_themes_kline";
pub const ALL_THEMES_CANDLE_DIR: &str = "all_themes_candle";
pub const ALL_THEMES_MULTI_DAY_DIR: &str = "all_themes_multi_day";

/// Indicator windows
pub const MA_SHORT_WINDOW: usize = 5;
pub const MA_LONG_WINDOW: usize = 20;
pub const VWAP_WINDOW: usize = 14;
pub const RSI_WINDOW: usize = 14;
pub const BOLL_WINDOW: usize = 20;
pub const BOLL_DEV: f64 = 2.0;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
