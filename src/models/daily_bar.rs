use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Trading day
    pub trade_date: NaiveDate,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Traded volume (Tushare reports lots, possibly fractional)
    pub volume: f64,
}

impl DailyBar {
    /// Create a new daily bar
    pub fn new(trade_date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            trade_date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Close at or above open
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// Sort ascending by date and drop repeated dates, keeping the last occurrence.
///
/// Returns the number of rows removed.
pub fn normalize_series(bars: &mut Vec<DailyBar>) -> usize {
    // Stable sort keeps file order among equal dates, so the last duplicate wins below
    bars.sort_by_key(|b| b.trade_date);

    let before = bars.len();
    let mut deduped: Vec<DailyBar> = Vec::with_capacity(before);
    for bar in bars.drain(..) {
        match deduped.last_mut() {
            Some(last) if last.trade_date == bar.trade_date => *last = bar,
            _ => deduped.push(bar),
        }
    }
    *bars = deduped;
    before - bars.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(y: i32, m: u32, d: u32, close: f64) -> DailyBar {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        DailyBar::new(date, close, close, close, close, 100.0)
    }

    #[test]
    fn test_normalize_sorts_and_dedupes() {
        let mut bars = vec![
            bar(2024, 1, 3, 3.0),
            bar(2024, 1, 1, 1.0),
            bar(2024, 1, 2, 2.0),
            bar(2024, 1, 2, 2.5),
        ];

        let removed = normalize_series(&mut bars);

        assert_eq!(removed, 1);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.5, 3.0]);
    }

    #[test]
    fn test_direction() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(DailyBar::new(date, 10.0, 12.0, 9.0, 11.0, 1000.0).is_up());
        assert!(DailyBar::new(date, 10.0, 12.0, 9.0, 10.0, 1000.0).is_up());
        assert!(!DailyBar::new(date, 10.0, 12.0, 9.0, 9.5, 1000.0).is_up());
    }
}
