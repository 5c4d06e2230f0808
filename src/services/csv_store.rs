use crate::constants::{CSV_HEADER, DAILY_FILE_SUFFIX};
use crate::error::{Error, Result};
use crate::models::{normalize_series, DailyBar, TimeRange};
use crate::utils::{format_trade_date, parse_trade_date};
use csv::{Reader, StringRecord, Writer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A cached daily price file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockFile {
    /// Stock code, e.g. `600000.SH`
    pub code: String,
    pub path: PathBuf,
}

/// Cache file path for a stock code
pub fn daily_file_path(dir: &Path, code: &str) -> PathBuf {
    dir.join(format!("{}{}", code, DAILY_FILE_SUFFIX))
}

fn column_index(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| Error::Parse(format!("{}: missing column '{}'", path.display(), name)))
}

fn parse_field(record: &StringRecord, idx: usize, name: &str, path: &Path, line: u64) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.parse::<f64>().map_err(|_| {
        Error::Parse(format!(
            "{}:{}: invalid {} value '{}'",
            path.display(),
            line,
            name,
            raw
        ))
    })
}

/// Load a daily CSV file, sorted ascending with duplicate dates removed
///
/// Columns are addressed by header name; extra columns are ignored.
pub fn load_daily_csv(path: &Path) -> Result<Vec<DailyBar>> {
    let mut reader = Reader::from_path(path)
        .map_err(|e| Error::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let headers = reader.headers()?.clone();
    let date_idx = column_index(&headers, "trade_date", path)?;
    let open_idx = column_index(&headers, "open", path)?;
    let high_idx = column_index(&headers, "high", path)?;
    let low_idx = column_index(&headers, "low", path)?;
    let close_idx = column_index(&headers, "close", path)?;
    let vol_idx = column_index(&headers, "vol", path)?;

    let mut bars = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw_date = record.get(date_idx).unwrap_or("");
        let trade_date = parse_trade_date(raw_date)
            .map_err(|e| Error::Parse(format!("{}:{}: {}", path.display(), line, e)))?;

        bars.push(DailyBar {
            trade_date,
            open: parse_field(&record, open_idx, "open", path, line)?,
            high: parse_field(&record, high_idx, "high", path, line)?,
            low: parse_field(&record, low_idx, "low", path, line)?,
            close: parse_field(&record, close_idx, "close", path, line)?,
            volume: parse_field(&record, vol_idx, "vol", path, line)?,
        });
    }

    let removed = normalize_series(&mut bars);
    if removed > 0 {
        warn!(file = %path.display(), duplicates = removed, "Dropped duplicate trade dates");
    }

    debug!(file = %path.display(), rows = bars.len(), "Loaded daily CSV");
    Ok(bars)
}

/// Write bars as `ts_code,trade_date,open,high,low,close,vol`
pub fn save_daily_csv(path: &Path, code: &str, bars: &[DailyBar]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Io(format!("Failed to create {}: {}", parent.display(), e)))?;
    }

    let mut writer = Writer::from_path(path)
        .map_err(|e| Error::Io(format!("Failed to create {}: {}", path.display(), e)))?;

    writer.write_record(CSV_HEADER)?;
    for bar in bars {
        writer.write_record(&[
            code.to_string(),
            format_trade_date(bar.trade_date),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// List `*_daily.csv` files in a directory, sorted by file name
pub fn list_stock_files(dir: &Path) -> Result<Vec<StockFile>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(format!("Data directory {}", dir.display())));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(code) = name.strip_suffix(DAILY_FILE_SUFFIX) {
            if !code.is_empty() {
                files.push(StockFile {
                    code: code.to_string(),
                    path: path.clone(),
                });
            }
        }
    }

    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(files)
}

/// Rows inside a time range
pub fn filter_range(bars: &[DailyBar], range: &TimeRange) -> Vec<DailyBar> {
    bars.iter()
        .filter(|b| range.contains(b.trade_date))
        .cloned()
        .collect()
}
