use crate::constants::TRADE_DATE_FORMAT;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Get daily data directory from environment variable or use default
pub fn get_data_dir() -> PathBuf {
    std::env::var("DAILY_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("daily_data"))
}

/// Tushare API token from the `TUSHARE_TOKEN` environment variable
pub fn get_tushare_token() -> Result<String> {
    std::env::var("TUSHARE_TOKEN")
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Config("TUSHARE_TOKEN environment variable is not set".to_string()))
}

/// Parse a `YYYYMMDD` trade date
pub fn parse_trade_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), TRADE_DATE_FORMAT)
        .map_err(|e| Error::Parse(format!("Invalid trade date '{}': {}", s, e)))
}

/// Format a date as `YYYYMMDD`
pub fn format_trade_date(date: NaiveDate) -> String {
    date.format(TRADE_DATE_FORMAT).to_string()
}

/// Delete a directory with all its content and recreate it empty
pub fn clear_directory(dir: &Path) -> Result<()> {
    if dir.exists() {
        info!(dir = %dir.display(), "Clearing directory");
        fs::remove_dir_all(dir)
            .map_err(|e| Error::Io(format!("Failed to remove {}: {}", dir.display(), e)))?;
    }
    fs::create_dir_all(dir)
        .map_err(|e| Error::Io(format!("Failed to create {}: {}", dir.display(), e)))?;
    Ok(())
}

/// Create a directory (and parents) if it does not exist yet
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| Error::Io(format!("Failed to create {}: {}", dir.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trade_date() {
        let date = parse_trade_date("20240315").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(format_trade_date(date), "20240315");

        assert!(parse_trade_date("2024-03-15").is_err());
        assert!(parse_trade_date("").is_err());
    }

    #[test]
    fn test_clear_directory_recreates_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested").join("a.png"), b"x").unwrap();

        clear_directory(&dir).unwrap();

        assert!(dir.exists());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }
}
