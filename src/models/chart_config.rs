use crate::constants::{DEFAULT_START_DATE, DEFAULT_WINDOW_MONTHS};
use crate::error::{Error, Result};
use crate::utils::parse_trade_date;
use chrono::NaiveDate;
use image::Rgb;
use serde::{Deserialize, Serialize};

/// Date range and window size for multi-panel charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_date: NaiveDate,

    /// Open ended when `None`
    pub end_date: Option<NaiveDate>,

    /// Calendar months per chart
    pub window_months: u32,
}

impl TimeRange {
    /// Build from `YYYYMMDD` strings
    pub fn parse(start: Option<&str>, end: Option<&str>, window_months: u32) -> Result<Self> {
        if window_months == 0 {
            return Err(Error::InvalidInput("window_months must be positive".to_string()));
        }
        let start_date = parse_trade_date(start.unwrap_or(DEFAULT_START_DATE))?;
        let end_date = end.map(parse_trade_date).transpose()?;
        if let Some(end_date) = end_date {
            if end_date < start_date {
                return Err(Error::InvalidInput(format!(
                    "end date {} is before start date {}",
                    end_date, start_date
                )));
            }
        }
        Ok(Self {
            start_date,
            end_date,
            window_months,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.map_or(true, |end| date <= end)
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end_date: None,
            window_months: DEFAULT_WINDOW_MONTHS,
        }
    }
}

/// Candle and indicator colours
///
/// Up candles are red and down candles green, as on Chinese exchanges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScheme {
    pub up: Rgb<u8>,
    pub down: Rgb<u8>,
    pub ma5: Rgb<u8>,
    pub ma20: Rgb<u8>,
    pub vwap: Rgb<u8>,
    pub rsi: Rgb<u8>,
    pub boll: Rgb<u8>,
    pub macd: Rgb<u8>,
    pub signal: Rgb<u8>,
    pub hist_pos: Rgb<u8>,
    pub hist_neg: Rgb<u8>,

    /// Single candle guide lines
    pub open_line: Rgb<u8>,
    pub close_line: Rgb<u8>,
    pub high_line: Rgb<u8>,
    pub low_line: Rgb<u8>,
}

pub const RED: Rgb<u8> = Rgb([220, 20, 60]);
pub const GREEN: Rgb<u8> = Rgb([0, 160, 0]);
pub const BLUE: Rgb<u8> = Rgb([30, 90, 220]);
pub const PURPLE: Rgb<u8> = Rgb([128, 0, 128]);
pub const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
pub const ORANGE: Rgb<u8> = Rgb([255, 140, 0]);

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            up: RED,
            down: GREEN,
            ma5: RED,
            ma20: BLUE,
            vwap: PURPLE,
            rsi: GREEN,
            boll: GRAY,
            macd: BLUE,
            signal: ORANGE,
            hist_pos: RED,
            hist_neg: GREEN,
            open_line: BLUE,
            close_line: RED,
            high_line: GREEN,
            low_line: PURPLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_parse() {
        let range = TimeRange::parse(Some("20240101"), Some("20240630"), 3).unwrap();
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));

        let open = TimeRange::parse(None, None, 3).unwrap();
        assert_eq!(open, TimeRange::default());
        assert!(open.contains(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()));
    }

    #[test]
    fn test_time_range_rejects_bad_input() {
        assert!(TimeRange::parse(None, None, 0).is_err());
        assert!(TimeRange::parse(Some("20240601"), Some("20240101"), 3).is_err());
        assert!(TimeRange::parse(Some("2024-06-01"), None, 3).is_err());
    }

    #[test]
    fn test_chinese_market_colors() {
        let colors = ColorScheme::default();
        assert_eq!(colors.up, RED);
        assert_eq!(colors.down, GREEN);
        assert_eq!(colors.hist_pos, colors.up);
    }
}
