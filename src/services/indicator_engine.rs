//! Augments a price series with the enabled indicator columns

use crate::constants::{
    BOLL_DEV, BOLL_WINDOW, MACD_FAST, MACD_SIGNAL, MACD_SLOW, MA_LONG_WINDOW, MA_SHORT_WINDOW,
    RSI_WINDOW, VWAP_WINDOW,
};
use crate::models::indicators::{
    calculate_bollinger, calculate_macd, calculate_rsi, calculate_sma, calculate_vwap,
    split_histogram,
};
use crate::models::{DailyBar, IndicatorConfig, IndicatorKind};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Named indicator column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndicatorColumn {
    Ma5,
    Ma20,
    Vwap,
    Rsi,
    BollUpper,
    BollMiddle,
    BollLower,
    Macd,
    MacdSignal,
    MacdHist,
    MacdHistPos,
    MacdHistNeg,
}

impl IndicatorColumn {
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorColumn::Ma5 => "MA5",
            IndicatorColumn::Ma20 => "MA20",
            IndicatorColumn::Vwap => "VWAP",
            IndicatorColumn::Rsi => "RSI",
            IndicatorColumn::BollUpper => "BB_H",
            IndicatorColumn::BollMiddle => "BB_M",
            IndicatorColumn::BollLower => "BB_L",
            IndicatorColumn::Macd => "MACD",
            IndicatorColumn::MacdSignal => "MACD_signal",
            IndicatorColumn::MacdHist => "MACD_hist",
            IndicatorColumn::MacdHistPos => "MACD_hist_pos",
            IndicatorColumn::MacdHistNeg => "MACD_hist_neg",
        }
    }

    /// Columns produced for one indicator kind
    pub fn for_kind(kind: IndicatorKind) -> &'static [IndicatorColumn] {
        match kind {
            IndicatorKind::Ma5 => &[IndicatorColumn::Ma5],
            IndicatorKind::Ma20 => &[IndicatorColumn::Ma20],
            IndicatorKind::Vwap => &[IndicatorColumn::Vwap],
            IndicatorKind::Rsi => &[IndicatorColumn::Rsi],
            IndicatorKind::Boll => &[
                IndicatorColumn::BollUpper,
                IndicatorColumn::BollMiddle,
                IndicatorColumn::BollLower,
            ],
            IndicatorKind::Macd => &[
                IndicatorColumn::Macd,
                IndicatorColumn::MacdSignal,
                IndicatorColumn::MacdHist,
                IndicatorColumn::MacdHistPos,
                IndicatorColumn::MacdHistNeg,
            ],
        }
    }
}

impl fmt::Display for IndicatorColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Price bars plus one value column per enabled indicator
///
/// Every column has exactly one entry per bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AugmentedSeries {
    bars: Vec<DailyBar>,
    columns: BTreeMap<IndicatorColumn, Vec<Option<f64>>>,
}

impl AugmentedSeries {
    /// Wrap bars with no indicator columns
    pub fn from_bars(bars: Vec<DailyBar>) -> Self {
        Self {
            bars,
            columns: BTreeMap::new(),
        }
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Column values, `None` when the indicator was not computed
    pub fn column(&self, column: IndicatorColumn) -> Option<&[Option<f64>]> {
        self.columns.get(&column).map(Vec::as_slice)
    }

    pub fn has_column(&self, column: IndicatorColumn) -> bool {
        self.columns.contains_key(&column)
    }

    /// Present columns in a stable order
    pub fn column_names(&self) -> Vec<IndicatorColumn> {
        self.columns.keys().copied().collect()
    }

    fn insert(&mut self, column: IndicatorColumn, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.bars.len());
        self.columns.insert(column, values);
    }

    /// Sub-series of the rows whose index satisfies `keep`
    pub(crate) fn select_rows(&self, keep: impl Fn(usize) -> bool) -> AugmentedSeries {
        let idx: Vec<usize> = (0..self.bars.len()).filter(|i| keep(*i)).collect();
        Self {
            bars: idx.iter().map(|&i| self.bars[i].clone()).collect(),
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (*k, idx.iter().map(|&i| v[i]).collect()))
                .collect(),
        }
    }

    /// First and last trading day
    pub fn date_span(&self) -> Option<(chrono::NaiveDate, chrono::NaiveDate)> {
        Some((self.bars.first()?.trade_date, self.bars.last()?.trade_date))
    }
}

/// Compute the enabled indicators over a sorted series
///
/// Short series never fail: columns are filled with `None` where the warm-up
/// window is not reached. The input is left untouched.
pub fn compute_indicators(series: &[DailyBar], config: &IndicatorConfig) -> AugmentedSeries {
    let mut out = AugmentedSeries::from_bars(series.to_vec());

    let closes: Vec<f64> = series.iter().map(|b| b.close).collect();

    if config.is_enabled(IndicatorKind::Ma5) {
        out.insert(IndicatorColumn::Ma5, calculate_sma(&closes, MA_SHORT_WINDOW));
    }
    if config.is_enabled(IndicatorKind::Ma20) {
        out.insert(IndicatorColumn::Ma20, calculate_sma(&closes, MA_LONG_WINDOW));
    }

    if config.is_enabled(IndicatorKind::Vwap) {
        let highs: Vec<f64> = series.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = series.iter().map(|b| b.low).collect();
        let volumes: Vec<f64> = series.iter().map(|b| b.volume).collect();
        out.insert(
            IndicatorColumn::Vwap,
            calculate_vwap(&highs, &lows, &closes, &volumes, VWAP_WINDOW),
        );
    }

    if config.is_enabled(IndicatorKind::Rsi) {
        out.insert(IndicatorColumn::Rsi, calculate_rsi(&closes, RSI_WINDOW));
    }

    if config.is_enabled(IndicatorKind::Boll) {
        let bands = calculate_bollinger(&closes, BOLL_WINDOW, BOLL_DEV);
        out.insert(IndicatorColumn::BollUpper, bands.iter().map(|b| b.map(|p| p.upper)).collect());
        out.insert(IndicatorColumn::BollMiddle, bands.iter().map(|b| b.map(|p| p.middle)).collect());
        out.insert(IndicatorColumn::BollLower, bands.iter().map(|b| b.map(|p| p.lower)).collect());
    }

    if config.is_enabled(IndicatorKind::Macd) {
        let macd = calculate_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let (pos, neg) = split_histogram(&macd.histogram);
        out.insert(IndicatorColumn::Macd, macd.macd);
        out.insert(IndicatorColumn::MacdSignal, macd.signal);
        out.insert(IndicatorColumn::MacdHist, macd.histogram);
        out.insert(IndicatorColumn::MacdHistPos, pos);
        out.insert(IndicatorColumn::MacdHistNeg, neg);
    }

    debug!(
        rows = out.len(),
        columns = out.columns.len(),
        "Computed indicators"
    );

    out
}
