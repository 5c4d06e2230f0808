use crate::constants::TUSHARE_API_URL;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info};

/// Request body of the Tushare Pro HTTP API
#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    api_name: &'a str,
    token: &'a str,
    params: Value,
    fields: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    data: Option<ApiTable>,
}

/// Column-oriented table returned by every endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTable {
    pub fields: Vec<String>,
    pub items: Vec<Vec<Value>>,
}

impl ApiTable {
    fn column(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| Error::Parse(format!("Missing field '{}' in response", name)))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// String values of one column, skipping nulls
    pub fn strings(&self, name: &str) -> Result<Vec<String>> {
        let idx = self.column(name)?;
        Ok(self
            .items
            .iter()
            .filter_map(|row| row.get(idx).and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    /// Rows as field-name maps
    pub fn records(&self) -> Vec<HashMap<&str, &Value>> {
        self.items
            .iter()
            .map(|row| {
                self.fields
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter())
                    .collect()
            })
            .collect()
    }
}

/// Raw daily quote
#[derive(Debug, Clone, PartialEq)]
pub struct DailyQuote {
    pub ts_code: String,
    pub trade_date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub vol: f64,
}

/// Adjustment factor of one trading day
#[derive(Debug, Clone, PartialEq)]
pub struct AdjFactor {
    pub trade_date: String,
    pub adj_factor: f64,
}

fn number(record: &HashMap<&str, &Value>, name: &str) -> Result<f64> {
    record
        .get(name)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| Error::Parse(format!("Missing or invalid '{}' field", name)))
}

fn text(record: &HashMap<&str, &Value>, name: &str) -> Result<String> {
    record
        .get(name)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Parse(format!("Missing or invalid '{}' field", name)))
}

/// Decode a raw response body into its data table
pub fn decode_response(body: &str) -> Result<ApiTable> {
    let response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("Failed to parse JSON response: {}", e)))?;

    if response.code != 0 {
        return Err(Error::Network(format!(
            "Tushare error {}: {}",
            response.code,
            response.msg.unwrap_or_default()
        )));
    }

    Ok(response.data.unwrap_or_default())
}

/// Decode `daily` rows
pub fn parse_daily(table: &ApiTable) -> Result<Vec<DailyQuote>> {
    table
        .records()
        .iter()
        .map(|r| {
            Ok(DailyQuote {
                ts_code: text(r, "ts_code")?,
                trade_date: text(r, "trade_date")?,
                open: number(r, "open")?,
                high: number(r, "high")?,
                low: number(r, "low")?,
                close: number(r, "close")?,
                vol: number(r, "vol")?,
            })
        })
        .collect()
}

/// Decode `adj_factor` rows
pub fn parse_adj_factor(table: &ApiTable) -> Result<Vec<AdjFactor>> {
    table
        .records()
        .iter()
        .map(|r| {
            Ok(AdjFactor {
                trade_date: text(r, "trade_date")?,
                adj_factor: number(r, "adj_factor")?,
            })
        })
        .collect()
}

/// Constituents of the most recent rebalance in an `index_weight` table
///
/// Without a date the endpoint returns several rebalances; only rows on the
/// latest `trade_date` are kept, first occurrence wins.
pub fn latest_constituents(table: &ApiTable) -> Result<Vec<String>> {
    let records = table.records();
    let dates: Vec<String> = records
        .iter()
        .map(|r| r.get("trade_date").and_then(|v| v.as_str()).unwrap_or_default().to_string())
        .collect();
    // YYYYMMDD compares correctly as text
    let latest = dates.iter().max().cloned().unwrap_or_default();

    let mut seen = HashSet::new();
    let mut codes = Vec::new();
    for (record, date) in records.iter().zip(&dates) {
        if *date != latest {
            continue;
        }
        if let Some(code) = record.get("con_code").and_then(|v| v.as_str()) {
            if seen.insert(code) {
                codes.push(code.to_string());
            }
        }
    }

    if codes.is_empty() && !table.is_empty() {
        // Distinguish a malformed table from an empty one
        table.column("con_code")?;
    }
    Ok(codes)
}

/// Client for the Tushare Pro HTTP API
pub struct TushareClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl TushareClient {
    /// Create a new API client
    pub fn new(token: String) -> Result<Self> {
        Self::with_base_url(TUSHARE_API_URL.to_string(), token)
    }

    pub fn with_base_url(base_url: String, token: String) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid base_url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }
        if token.trim().is_empty() {
            return Err(Error::Config("Tushare token is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            token,
            client,
        })
    }

    /// Call one API endpoint
    pub async fn query(&self, api_name: &str, params: Value, fields: &[&str]) -> Result<ApiTable> {
        let request = ApiRequest {
            api_name,
            token: &self.token,
            params,
            fields: fields.join(","),
        };

        debug!(api = api_name, "Sending Tushare request");
        let response = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(format!("API request failed: {} ({})", e, api_name)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(Error::Network(format!(
                "API returned error status {}: {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;

        let table = decode_response(&body)?;
        debug!(api = api_name, rows = table.items.len(), "Tushare response");
        Ok(table)
    }

    /// Constituent codes of an index; `trade_date = None` returns the latest weights
    pub async fn index_constituents(&self, index_code: &str, trade_date: Option<&str>) -> Result<Vec<String>> {
        let mut params = json!({ "index_code": index_code });
        if let Some(date) = trade_date {
            params["trade_date"] = json!(date);
        }

        let table = self
            .query("index_weight", params, &["index_code", "con_code", "trade_date", "weight"])
            .await?;
        let codes = latest_constituents(&table)?;

        info!(index = index_code, count = codes.len(), "Fetched index constituents");
        Ok(codes)
    }

    /// Unadjusted daily quotes
    pub async fn daily(&self, ts_code: &str, start_date: &str, end_date: &str) -> Result<Vec<DailyQuote>> {
        let table = self
            .query(
                "daily",
                json!({ "ts_code": ts_code, "start_date": start_date, "end_date": end_date }),
                &["ts_code", "trade_date", "open", "high", "low", "close", "vol"],
            )
            .await?;
        parse_daily(&table)
    }

    /// Adjustment factors
    pub async fn adj_factor(&self, ts_code: &str, start_date: &str, end_date: &str) -> Result<Vec<AdjFactor>> {
        let table = self
            .query(
                "adj_factor",
                json!({ "ts_code": ts_code, "start_date": start_date, "end_date": end_date }),
                &["ts_code", "trade_date", "adj_factor"],
            )
            .await?;
        parse_adj_factor(&table)
    }
}
