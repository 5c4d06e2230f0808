use crate::error::Result;
use crate::services::{CancelToken, DataFetcher, FetchStats, TushareClient};
use crate::utils::{format_trade_date, get_data_dir, get_tushare_token, parse_trade_date};

pub fn run(limit: Option<usize>, start_date: String, end_date: Option<String>) {
    println!("📥 Fetching daily data from Tushare\n");

    match fetch(limit, start_date, end_date) {
        Ok(stats) => {
            println!("\n📊 Summary:");
            println!("   Requested: {}", stats.requested);
            println!("   Saved:     {}", stats.saved);
            println!("   Failed:    {}", stats.failed);
            if stats.interrupted {
                println!("⚠️  Interrupted by user");
            } else {
                println!("✅ Fetch complete");
            }
        }
        Err(e) => super::exit_with_error(e),
    }
}

fn fetch(limit: Option<usize>, start_date: String, end_date: Option<String>) -> Result<FetchStats> {
    let today = format_trade_date(chrono::Local::now().date_naive());
    parse_trade_date(&start_date)?;
    let end_date = match end_date {
        Some(end) => {
            parse_trade_date(&end)?;
            end
        }
        None => today.clone(),
    };

    let token = get_tushare_token()?;
    let client = TushareClient::new(token)?;
    let data_dir = get_data_dir();
    println!("📁 Data directory: {}", data_dir.display());
    println!("📅 Range: {} → {}", start_date, end_date);

    let fetcher = DataFetcher::new(client, data_dir, start_date, end_date);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let cancel = CancelToken::new();
        cancel.cancel_on_ctrl_c();

        let codes = fetcher.fetch_universe(&today).await;
        println!("📋 Universe: {} stocks", codes.len());
        if codes.is_empty() {
            return Ok(FetchStats::default());
        }

        fetcher.fetch_all(&codes, limit, &cancel).await
    })
}
