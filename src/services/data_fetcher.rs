use crate::constants::{FETCH_PACING, SSE50_INDEX_CODE, STOCK_CODE_FILE};
use crate::error::{Error, Result};
use crate::models::{normalize_series, DailyBar};
use crate::services::csv_store::{daily_file_path, save_daily_csv};
use crate::services::interrupt::CancelToken;
use crate::services::tushare::{AdjFactor, DailyQuote, TushareClient};
use crate::utils::parse_trade_date;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Forward-adjust quotes so the latest prices are unchanged
///
/// `price × factor / latest_factor`, rounded to two decimals. Rows without a
/// factor keep their raw prices. Output is sorted ascending.
pub fn forward_adjust(quotes: &[DailyQuote], factors: &[AdjFactor]) -> Result<Vec<DailyBar>> {
    let by_date: HashMap<&str, f64> = factors
        .iter()
        .map(|f| (f.trade_date.as_str(), f.adj_factor))
        .collect();

    let latest_factor = factors
        .iter()
        .max_by(|a, b| a.trade_date.cmp(&b.trade_date))
        .map(|f| f.adj_factor)
        .filter(|f| *f > 0.0);

    let round2 = |v: f64| (v * 100.0).round() / 100.0;

    let mut bars = Vec::with_capacity(quotes.len());
    for quote in quotes {
        let ratio = match (by_date.get(quote.trade_date.as_str()), latest_factor) {
            (Some(factor), Some(latest)) => Some(factor / latest),
            _ => None,
        };
        let adjust = |price: f64| match ratio {
            Some(r) => round2(price * r),
            None => price,
        };

        bars.push(DailyBar {
            trade_date: parse_trade_date(&quote.trade_date)?,
            open: adjust(quote.open),
            high: adjust(quote.high),
            low: adjust(quote.low),
            close: adjust(quote.close),
            volume: quote.vol,
        });
    }

    normalize_series(&mut bars);
    Ok(bars)
}

/// Stock codes from the first column of a CSV file
pub fn read_stock_codes(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| Error::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut codes = Vec::new();
    for result in reader.records() {
        let record = result?;
        if let Some(code) = record.get(0).map(str::trim).filter(|c| !c.is_empty()) {
            codes.push(code.to_string());
        }
    }

    if codes.is_empty() {
        return Err(Error::NotFound(format!("No stock codes in {}", path.display())));
    }
    Ok(codes)
}

/// Outcome of a fetch run
#[derive(Debug, Clone, Default)]
pub struct FetchStats {
    pub requested: usize,
    pub saved: usize,
    pub failed: usize,
    pub interrupted: bool,
}

/// Downloads daily series and stores them in the CSV cache
pub struct DataFetcher {
    client: TushareClient,
    data_dir: PathBuf,
    start_date: String,
    end_date: String,
    pacing: Duration,
}

impl DataFetcher {
    pub fn new(client: TushareClient, data_dir: PathBuf, start_date: String, end_date: String) -> Self {
        Self {
            client,
            data_dir,
            start_date,
            end_date,
            pacing: FETCH_PACING,
        }
    }

    async fn pace(&self) {
        tokio::time::sleep(self.pacing).await;
    }

    /// SSE 50 constituents, with fallbacks to the latest weights and to `stockcode.csv`
    pub async fn fetch_universe(&self, today: &str) -> Vec<String> {
        let dated = self.client.index_constituents(SSE50_INDEX_CODE, Some(today)).await;
        self.pace().await;

        let codes = match dated {
            Ok(codes) if !codes.is_empty() => Ok(codes),
            Ok(_) => {
                info!(date = today, "No index weights for today, using latest available");
                let latest = self.client.index_constituents(SSE50_INDEX_CODE, None).await;
                self.pace().await;
                latest
            }
            Err(e) => Err(e),
        };

        match codes {
            Ok(codes) if !codes.is_empty() => return codes,
            Ok(_) => {}
            Err(e) => error!(error = %e, "Failed to fetch index constituents"),
        }

        warn!(file = STOCK_CODE_FILE, "Falling back to local stock code list");
        match read_stock_codes(Path::new(STOCK_CODE_FILE)) {
            Ok(codes) => codes,
            Err(e) => {
                error!(error = %e, "Failed to read stock code file");
                Vec::new()
            }
        }
    }

    /// Forward-adjusted daily bars of one stock
    pub async fn fetch_one(&self, ts_code: &str) -> Result<Vec<DailyBar>> {
        let quotes = self.client.daily(ts_code, &self.start_date, &self.end_date).await;
        self.pace().await;
        let quotes = quotes?;
        if quotes.is_empty() {
            return Ok(Vec::new());
        }

        let factors = match self.client.adj_factor(ts_code, &self.start_date, &self.end_date).await {
            Ok(factors) => factors,
            Err(e) => {
                warn!(ts_code = ts_code, error = %e, "No adjustment factors, keeping raw prices");
                Vec::new()
            }
        };
        self.pace().await;

        forward_adjust(&quotes, &factors)
    }

    /// Fetch and save each code in order; `limit` keeps the first N codes
    pub async fn fetch_all(&self, codes: &[String], limit: Option<usize>, cancel: &CancelToken) -> Result<FetchStats> {
        let codes = match limit {
            Some(n) => &codes[..n.min(codes.len())],
            None => codes,
        };

        let mut stats = FetchStats {
            requested: codes.len(),
            ..Default::default()
        };

        for (idx, code) in codes.iter().enumerate() {
            if cancel.is_cancelled() {
                stats.interrupted = true;
                break;
            }

            println!("📥 [{}/{}] Fetching {}...", idx + 1, codes.len(), code);
            match self.fetch_one(code).await {
                Ok(bars) if !bars.is_empty() => {
                    let path = daily_file_path(&self.data_dir, code);
                    if let Err(e) = save_daily_csv(&path, code, &bars) {
                        error!(ts_code = %code, file = %path.display(), error = %e, "Failed to save daily data");
                        stats.failed += 1;
                        continue;
                    }
                    info!(ts_code = %code, rows = bars.len(), file = %path.display(), "Saved daily data");
                    stats.saved += 1;
                }
                Ok(_) => {
                    warn!(ts_code = %code, "No data returned");
                    stats.failed += 1;
                }
                Err(e) => {
                    error!(ts_code = %code, error = %e, "Failed to fetch daily data");
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::csv_store::load_daily_csv;
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Answers `daily` with two rows for the requested code and `adj_factor` with none
    fn stub_reply(request: &Value) -> String {
        let ts_code = request["params"]["ts_code"].as_str().unwrap_or_default();
        let data = match request["api_name"].as_str() {
            Some("daily") => json!({
                "fields": ["ts_code", "trade_date", "open", "high", "low", "close", "vol"],
                "items": [
                    [ts_code, "20240103", 7.1, 7.2, 7.0, 7.15, 2500.0],
                    [ts_code, "20240102", 7.0, 7.1, 6.9, 7.05, 3000.0]
                ]
            }),
            _ => json!({ "fields": ["ts_code", "trade_date", "adj_factor"], "items": [] }),
        };
        json!({ "code": 0, "msg": "", "data": data }).to_string()
    }

    async fn handle(mut socket: TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let body = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= pos + 4 + len {
                break buf[pos + 4..pos + 4 + len].to_vec();
            }
        };

        let request: Value = serde_json::from_slice(&body).unwrap();
        let reply = stub_reply(&request);
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            reply.len(),
            reply
        );
        socket.write_all(response.as_bytes()).await.unwrap();
    }

    async fn spawn_stub_api() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(handle(socket));
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_all_continues_after_save_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = tmp.path().join("daily_data");
        // A directory in place of the first stock's CSV makes its save fail
        std::fs::create_dir_all(daily_file_path(&data_dir, "AAA.SH")).unwrap();

        let client = TushareClient::with_base_url(spawn_stub_api().await, "token".to_string()).unwrap();
        let mut fetcher = DataFetcher::new(client, data_dir.clone(), "20240101".to_string(), "20240131".to_string());
        fetcher.pacing = Duration::ZERO;

        let codes = vec!["AAA.SH".to_string(), "BBB.SH".to_string()];
        let stats = fetcher.fetch_all(&codes, None, &CancelToken::new()).await.unwrap();

        assert_eq!(stats.requested, 2);
        assert_eq!(stats.saved, 1);
        assert_eq!(stats.failed, 1);
        assert!(!stats.interrupted);

        let saved = load_daily_csv(&daily_file_path(&data_dir, "BBB.SH")).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].close, 7.05);
    }

    fn quote(date: &str, close: f64) -> DailyQuote {
        DailyQuote {
            ts_code: "600000.SH".to_string(),
            trade_date: date.to_string(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            vol: 1000.0,
        }
    }

    fn factor(date: &str, adj_factor: f64) -> AdjFactor {
        AdjFactor {
            trade_date: date.to_string(),
            adj_factor,
        }
    }

    #[test]
    fn test_forward_adjust() {
        let quotes = vec![quote("20240103", 10.0), quote("20240102", 20.0)];
        let factors = vec![factor("20240102", 1.0), factor("20240103", 2.0)];

        let bars = forward_adjust(&quotes, &factors).unwrap();

        // Sorted ascending; the earlier row is halved, the latest unchanged
        assert_eq!(bars[0].close, 10.0);
        assert_eq!(bars[0].high, 10.5);
        assert_eq!(bars[1].close, 10.0);
        assert_eq!(bars[1].volume, 1000.0);
    }

    #[test]
    fn test_forward_adjust_rounds_and_keeps_unfactored() {
        let quotes = vec![quote("20240102", 10.0), quote("20240103", 10.0)];
        let factors = vec![factor("20240103", 3.0), factor("20240101", 1.0)];

        let bars = forward_adjust(&quotes, &factors).unwrap();
        assert_eq!(bars[0].close, 10.0); // no factor for 20240102
        assert_eq!(bars[1].close, 10.0);

        let factors = vec![factor("20240102", 1.0), factor("20240103", 3.0)];
        let bars = forward_adjust(&quotes, &factors).unwrap();
        assert_eq!(bars[0].close, 3.33);
    }

    #[test]
    fn test_read_stock_codes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stockcode.csv");
        std::fs::write(&path, "code,name\n600000.SH,a\n600519.SH,b\n,c\n").unwrap();
        assert_eq!(read_stock_codes(&path).unwrap(), vec!["600000.SH", "600519.SH"]);

        std::fs::write(&path, "code\n").unwrap();
        assert!(read_stock_codes(&path).is_err());
    }
}
