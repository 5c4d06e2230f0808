//! Splitting series into chart-sized windows
//!
//! Two strategies:
//! - calendar windows of N months, one chart per window
//! - positional slices of P consecutive rows for multi-day candle charts

use crate::constants::MIN_SLICE_ROWS;
use crate::error::{Error, Result};
use crate::services::indicator_engine::AugmentedSeries;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

fn month_ordinal(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// Window group of each date, relative to the earliest month in the slice
///
/// Keys are non-negative and non-decreasing for sorted input.
pub fn window_group_keys(dates: &[NaiveDate], window_months: u32) -> Result<Vec<u32>> {
    if window_months == 0 {
        return Err(Error::InvalidInput("window_months must be positive".to_string()));
    }

    let Some(min_ordinal) = dates.iter().map(|d| month_ordinal(*d)).min() else {
        return Ok(Vec::new());
    };

    Ok(dates
        .iter()
        .map(|d| ((month_ordinal(*d) - min_ordinal) / window_months as i64) as u32)
        .collect())
}

/// Split a series into calendar windows of `window_months` months
///
/// Windows are yielded in ascending group order. Groups with no rows (for
/// example a suspension spanning a whole window) produce no window.
pub fn calendar_windows(series: &AugmentedSeries, window_months: u32) -> Result<Vec<AugmentedSeries>> {
    let dates: Vec<NaiveDate> = series.bars().iter().map(|b| b.trade_date).collect();
    let keys = window_group_keys(&dates, window_months)?;

    let groups: BTreeSet<u32> = keys.iter().copied().collect();
    Ok(groups
        .into_iter()
        .map(|group| series.select_rows(|i| keys[i] == group))
        .collect())
}

/// A contiguous run of rows
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalWindow<T> {
    /// Index of the first row in the source
    pub start: usize,
    pub rows: Vec<T>,
}

impl<T> PositionalWindow<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Source index range covered
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.rows.len()
    }
}

/// Number of positional windows for `len` rows of period `period`
///
/// `max(1, (len - period) / period)` with saturating subtraction. The last
/// full period and any remainder are not covered when `len > 2 * period`.
pub fn positional_window_count(len: usize, period: usize) -> usize {
    if period == 0 {
        return 0;
    }
    (len.saturating_sub(period) / period).max(1)
}

/// Slice rows into consecutive windows of `period` rows
///
/// Slices shorter than two rows are dropped.
pub fn positional_windows<T: Clone>(rows: &[T], period: usize) -> Result<Vec<PositionalWindow<T>>> {
    if period == 0 {
        return Err(Error::InvalidInput("period must be positive".to_string()));
    }

    let len = rows.len();
    let windows = (0..positional_window_count(len, period))
        .filter_map(|i| {
            let start = i * period;
            let end = (start + period).min(len);
            if start >= end || end - start < MIN_SLICE_ROWS {
                return None;
            }
            Some(PositionalWindow {
                start,
                rows: rows[start..end].to_vec(),
            })
        })
        .collect();

    Ok(windows)
}
