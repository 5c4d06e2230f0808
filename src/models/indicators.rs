//! Technical indicator formulas
//!
//! Every function maps an ordered numeric sequence (oldest first) to a vector of
//! the same length. `None` marks rows where the indicator is undefined, which is
//! always the leading warm-up window and never an error.
//!
//! The smoothing conventions follow the pandas/`ta` defaults most charting
//! tools are compared against:
//! - EMAs are recursive (`adjust = false`), seeded with the first observation
//! - Spans convert to `alpha = 2 / (span + 1)`, Wilder smoothing uses `alpha = 1 / n`
//! - Standard deviation is the population one (ddof = 0)

/// Calculate Simple Moving Average for a given period
///
/// # Arguments
/// * `values` - Slice of values, oldest first
/// * `period` - Window length (e.g., 5, 20)
///
/// # Returns
/// * Vector of MA values (`None` for the first `period - 1` rows)
pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut ma_values = vec![None; values.len()];

    if period == 0 || values.len() < period {
        return ma_values;
    }

    for i in (period - 1)..values.len() {
        let start_idx = i + 1 - period;
        let sum: f64 = values[start_idx..=i].iter().sum();
        ma_values[i] = Some(sum / period as f64);
    }

    ma_values
}

/// Recursive exponential smoothing with a given alpha
///
/// Output is `None` until `min_periods` observations have been seen.
fn smooth(values: &[f64], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut state: Option<f64> = None;

    for (i, &value) in values.iter().enumerate() {
        let next = match state {
            None => value,
            Some(prev) => (1.0 - alpha) * prev + alpha * value,
        };
        state = Some(next);
        out.push(if i + 1 >= min_periods { Some(next) } else { None });
    }

    out
}

/// Calculate Exponential Moving Average using span smoothing
///
/// Undefined for the first `span - 1` rows.
pub fn calculate_ema(values: &[f64], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    smooth(values, alpha, span)
}

/// Span EMA over a series with a leading undefined region
///
/// Smoothing starts at the first defined value (seeded with it) with no extra
/// warm-up, which is how pandas treats leading NaNs.
fn ema_from_first_defined(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    let Some(start) = values.iter().position(Option::is_some) else {
        return out;
    };
    if span == 0 {
        return out;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut state: Option<f64> = None;
    for (i, value) in values.iter().enumerate().skip(start) {
        if let Some(v) = value {
            let next = match state {
                None => *v,
                Some(prev) => (1.0 - alpha) * prev + alpha * v,
            };
            state = Some(next);
        }
        out[i] = state;
    }
    out
}

/// Calculate rolling Volume Weighted Average Price
///
/// `Σ(typical × volume) / Σ(volume)` over the trailing `period` rows, with
/// `typical = (high + low + close) / 3`. Undefined during warm-up and where the
/// window carries no volume.
pub fn calculate_vwap(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    volume: &[f64],
    period: usize,
) -> Vec<Option<f64>> {
    let len = close.len().min(high.len()).min(low.len()).min(volume.len());
    let mut vwap = vec![None; close.len()];

    if period == 0 || len < period {
        return vwap;
    }

    let tpv: Vec<f64> = (0..len)
        .map(|i| (high[i] + low[i] + close[i]) / 3.0 * volume[i])
        .collect();

    for i in (period - 1)..len {
        let start_idx = i + 1 - period;
        let tpv_sum: f64 = tpv[start_idx..=i].iter().sum();
        let vol_sum: f64 = volume[start_idx..=i].iter().sum();
        if vol_sum != 0.0 {
            vwap[i] = Some(tpv_sum / vol_sum);
        }
    }

    vwap
}

/// Calculate Relative Strength Index with Wilder smoothing
///
/// The first price change counts as zero. Undefined for the first `period - 1`
/// rows; 100 whenever the smoothed loss is zero.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.is_empty() {
        return vec![None; closes.len()];
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    gains.push(0.0);
    losses.push(0.0);
    for pair in closes.windows(2) {
        let diff = pair[1] - pair[0];
        gains.push(diff.max(0.0));
        losses.push((-diff).max(0.0));
    }

    let alpha = 1.0 / period as f64;
    let avg_gain = smooth(&gains, alpha, period);
    let avg_loss = smooth(&losses, alpha, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(gain, loss)| match (gain, loss) {
            (Some(_), Some(loss)) if *loss == 0.0 => Some(100.0),
            (Some(gain), Some(loss)) => Some(100.0 - 100.0 / (1.0 + gain / loss)),
            _ => None,
        })
        .collect()
}

/// Bollinger band values for one row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Calculate Bollinger Bands: SMA ± `num_std` population standard deviations
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> Vec<Option<BollingerPoint>> {
    let mut bands = vec![None; closes.len()];

    if period == 0 || closes.len() < period {
        return bands;
    }

    for i in (period - 1)..closes.len() {
        let window = &closes[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        let std_dev = variance.sqrt();
        bands[i] = Some(BollingerPoint {
            upper: mean + num_std * std_dev,
            middle: mean,
            lower: mean - num_std * std_dev,
        });
    }

    bands
}

/// MACD line, signal line and histogram
#[derive(Debug, Clone, Default)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// Calculate MACD
///
/// MACD = EMA(fast) - EMA(slow), undefined until the slow EMA is. The signal is
/// a `signal`-span EMA of the MACD line starting at its first defined value.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);

    let macd: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal_line = ema_from_first_defined(&macd, signal);

    let histogram = macd
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        macd,
        signal: signal_line,
        histogram,
    }
}

/// Split a histogram into its positive and non-positive parts for two-colour bars
///
/// `pos = max(h, 0)`, `neg = min(h, 0)`; undefined rows stay undefined in both.
pub fn split_histogram(histogram: &[Option<f64>]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    // Warm-up rows are not zero-filled: no bar is drawn until MACD is defined
    histogram
        .iter()
        .map(|h| (h.map(|v| v.max(0.0)), h.map(|v| v.min(0.0))))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("value should be defined");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_calculate_sma() {
        let closes = vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let ma3 = calculate_sma(&closes, 3);

        assert_eq!(ma3[0], None); // Not enough data
        assert_eq!(ma3[1], None); // Not enough data
        assert_eq!(ma3[2], Some(11.0)); // (10+11+12)/3
        assert_eq!(ma3[3], Some(12.0)); // (11+12+13)/3
        assert_eq!(ma3[4], Some(13.0)); // (12+13+14)/3
        assert_eq!(ma3[5], Some(14.0)); // (13+14+15)/3
    }

    #[test]
    fn test_sma_ma5_leading_gap() {
        let closes: Vec<f64> = (1..=12).map(|v| v as f64 * 1.5).collect();
        let ma5 = calculate_sma(&closes, 5);

        assert!(ma5[..4].iter().all(Option::is_none));
        for i in 4..closes.len() {
            let mean = closes[i - 4..=i].iter().sum::<f64>() / 5.0;
            assert_close(ma5[i], mean);
        }
    }

    #[test]
    fn test_sma_short_series() {
        assert_eq!(calculate_sma(&[1.0, 2.0], 5), vec![None, None]);
        assert!(calculate_sma(&[], 5).is_empty());
        assert_eq!(calculate_sma(&[1.0], 0), vec![None]);
    }

    #[test]
    fn test_ema_seeded_with_first_value() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        let ema = calculate_ema(&values, 3);
        // alpha = 0.5: 1.0, 1.5, 2.25, 3.125
        assert_eq!(ema[0], None);
        assert_eq!(ema[1], None);
        assert_close(ema[2], 2.25);
        assert_close(ema[3], 3.125);
    }

    #[test]
    fn test_vwap_rolling_window() {
        let high = vec![11.0, 12.0, 13.0];
        let low = vec![9.0, 10.0, 11.0];
        let close = vec![10.0, 11.0, 12.0];
        let volume = vec![100.0, 200.0, 300.0];

        let vwap = calculate_vwap(&high, &low, &close, &volume, 2);

        assert_eq!(vwap[0], None);
        // typical prices: 10, 11, 12
        assert_close(vwap[1], (10.0 * 100.0 + 11.0 * 200.0) / 300.0);
        assert_close(vwap[2], (11.0 * 200.0 + 12.0 * 300.0) / 500.0);
    }

    #[test]
    fn test_vwap_zero_volume_is_undefined() {
        let prices = vec![10.0; 3];
        let vwap = calculate_vwap(&prices, &prices, &prices, &[0.0, 0.0, 0.0], 2);
        assert!(vwap.iter().all(Option::is_none));
    }

    #[test]
    fn test_rsi_all_gains() {
        let closes: Vec<f64> = (0..20).map(|v| 100.0 + v as f64).collect();
        let rsi = calculate_rsi(&closes, 14);

        assert!(rsi[..13].iter().all(Option::is_none));
        for value in &rsi[13..] {
            assert_eq!(*value, Some(100.0));
        }
    }

    #[test]
    fn test_rsi_all_losses() {
        let closes: Vec<f64> = (0..20).map(|v| 100.0 - v as f64).collect();
        let rsi = calculate_rsi(&closes, 14);
        for value in &rsi[13..] {
            assert_close(*value, 0.0);
        }
    }

    #[test]
    fn test_rsi_bounded() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03, 45.61,
            46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        let rsi = calculate_rsi(&closes, 14);
        for value in rsi.iter().flatten() {
            assert!((0.0..=100.0).contains(value));
        }
        assert!(rsi[13].is_some());
    }

    #[test]
    fn test_bollinger_flat_prices() {
        let closes = vec![50.0; 25];
        let bands = calculate_bollinger(&closes, 20, 2.0);

        assert!(bands[..19].iter().all(Option::is_none));
        let last = bands[24].unwrap();
        assert_eq!(last.upper, 50.0);
        assert_eq!(last.middle, 50.0);
        assert_eq!(last.lower, 50.0);
    }

    #[test]
    fn test_bollinger_population_std() {
        let closes = vec![1.0, 2.0, 3.0, 4.0];
        let bands = calculate_bollinger(&closes, 4, 2.0);
        // mean 2.5, population variance 1.25
        let point = bands[3].unwrap();
        let std = 1.25_f64.sqrt();
        assert!((point.middle - 2.5).abs() < 1e-12);
        assert!((point.upper - (2.5 + 2.0 * std)).abs() < 1e-12);
        assert!((point.lower - (2.5 - 2.0 * std)).abs() < 1e-12);
    }

    #[test]
    fn test_macd_warm_up() {
        let closes: Vec<f64> = (0..40).map(|v| 10.0 + (v as f64 * 0.3).sin()).collect();
        let macd = calculate_macd(&closes, 12, 26, 9);

        assert!(macd.macd[..25].iter().all(Option::is_none));
        assert!(macd.macd[25].is_some());
        // Signal starts on the first MACD value, seeded with it
        assert_eq!(macd.signal[25], macd.macd[25]);
        assert_close(macd.histogram[25], 0.0);
        assert!(macd.histogram[24].is_none());
    }

    #[test]
    fn test_macd_flat_prices() {
        let closes = vec![20.0; 35];
        let macd = calculate_macd(&closes, 12, 26, 9);
        for value in macd.histogram.iter().flatten() {
            assert!(value.abs() < 1e-12);
        }
    }

    #[test]
    fn test_split_histogram_reassembles() {
        let hist = vec![None, Some(1.5), Some(-0.5), Some(0.0)];
        let (pos, neg) = split_histogram(&hist);

        assert_eq!(pos, vec![None, Some(1.5), Some(0.0), Some(0.0)]);
        assert_eq!(neg, vec![None, Some(0.0), Some(-0.5), Some(0.0)]);
        for ((h, p), n) in hist.iter().zip(&pos).zip(&neg) {
            if let (Some(h), Some(p), Some(n)) = (h, p, n) {
                assert_eq!(p + n, *h);
                assert!(*p >= 0.0 && *n <= 0.0);
            }
        }
    }

    // 40 sessions with expected values from pandas `ewm(adjust=False)` and rolling
    // sums, the conventions of the `ta` indicators
    const REF_CLOSE: [f64; 40] = [
        10.3, 10.36, 10.44, 11.04, 11.24, 10.69, 10.43, 10.58, 10.2, 9.54, 9.64, 10.07, 9.99, 10.02,
        10.78, 11.39, 11.29, 11.39, 11.88, 11.75, 11.08, 10.91, 11.02, 10.56, 10.12, 10.5, 10.98,
        10.92, 11.16, 11.99, 12.37, 12.11, 12.21, 12.53, 12.11, 11.42, 11.4, 11.5, 11.05, 10.9,
    ];
    const REF_HIGH: [f64; 40] = [
        10.45, 10.56, 10.69, 11.19, 11.44, 10.94, 10.58, 10.78, 10.45, 9.69, 9.84, 10.32, 10.14,
        10.22, 11.03, 11.54, 11.49, 11.64, 12.03, 11.95, 11.33, 11.06, 11.22, 10.81, 10.27, 10.7,
        11.23, 11.07, 11.36, 12.24, 12.52, 12.31, 12.46, 12.68, 12.31, 11.67, 11.55, 11.7, 11.3,
        11.05,
    ];
    const REF_LOW: [f64; 40] = [
        10.18, 10.2, 10.24, 10.8, 11.12, 10.53, 10.23, 10.34, 10.08, 9.38, 9.44, 9.83, 9.87, 9.86,
        10.58, 11.15, 11.17, 11.23, 11.68, 11.51, 10.96, 10.75, 10.82, 10.32, 10.0, 10.34, 10.78,
        10.68, 11.04, 11.83, 12.17, 11.87, 12.09, 12.37, 11.91, 11.18, 11.28, 11.34, 10.85, 10.66,
    ];
    const REF_VOLUME: [f64; 40] = [
        1000.0, 1187.0, 1374.0, 1561.0, 1748.0, 1685.0, 1872.0, 1100.0, 1287.0, 1474.0, 1411.0,
        1598.0, 1785.0, 1972.0, 1200.0, 1137.0, 1324.0, 1511.0, 1698.0, 1885.0, 1822.0, 1050.0,
        1237.0, 1424.0, 1611.0, 1548.0, 1735.0, 1922.0, 1150.0, 1337.0, 1274.0, 1461.0, 1648.0,
        1835.0, 2022.0, 1000.0, 1187.0, 1374.0, 1561.0, 1748.0,
    ];

    fn assert_reference(values: &[Option<f64>], expected: &[(usize, f64)]) {
        for &(idx, want) in expected {
            let got = values[idx].unwrap_or_else(|| panic!("row {} should be defined", idx));
            assert!(
                (got - want).abs() <= 1e-6 * want.abs().max(1.0),
                "row {}: expected {}, got {}",
                idx,
                want,
                got
            );
        }
    }

    #[test]
    fn test_rsi_reference_values() {
        let rsi = calculate_rsi(&REF_CLOSE, 14);
        assert!(rsi[12].is_none());
        assert_reference(
            &rsi,
            &[(13, 44.36734374503), (20, 55.350465975637), (39, 45.294466762956)],
        );
    }

    #[test]
    fn test_macd_reference_values() {
        let macd = calculate_macd(&REF_CLOSE, 12, 26, 9);
        assert!(macd.macd[24].is_none());
        assert!(macd.signal[24].is_none());
        assert_reference(
            &macd.macd,
            &[(25, 0.076413369927), (30, 0.285019858834), (39, 0.155884530932)],
        );
        assert_reference(
            &macd.signal,
            &[(25, 0.076413369927), (33, 0.261912401886), (39, 0.264898358805)],
        );
        assert_reference(
            &macd.histogram,
            &[(25, 0.0), (33, 0.166562856608), (39, -0.109013827873)],
        );
    }

    #[test]
    fn test_vwap_reference_values() {
        let vwap = calculate_vwap(&REF_HIGH, &REF_LOW, &REF_CLOSE, &REF_VOLUME, 14);
        assert!(vwap[12].is_none());
        assert_reference(
            &vwap,
            &[(13, 10.336602070865), (25, 10.894227818651), (39, 11.625344719425)],
        );
    }
}
