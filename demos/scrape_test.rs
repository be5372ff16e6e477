//! 実サイトに対するスクレイプテスト
//!
//! 実行方法:
//! ```
//! NEWS_PHRASE=wildfire NEWS_SECTION=California NEWS_MONTHS=1 cargo run --example scrape_test
//! ```

use news_scraper::{ScrapeRequest, ScraperService, SearchCriteria};
use tower::Service;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 環境変数から検索条件を取得
    let phrase = std::env::var("NEWS_PHRASE").unwrap_or_else(|_| "wildfire".to_string());
    let topics: Vec<String> = std::env::var("NEWS_SECTION")
        .map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    let months: u32 = std::env::var("NEWS_MONTHS")
        .ok()
        .and_then(|m| m.parse().ok())
        .unwrap_or(1);

    let criteria = SearchCriteria::new(phrase, topics, months)?;

    println!("=== News Scraper Test ===");
    println!("Phrase: {}", criteria.phrase);
    println!("Topics: {:?}", criteria.topics);
    println!("Months: {}", criteria.months_back);
    println!();

    let request = ScrapeRequest::new(criteria)
        .with_output_dir("./output")
        .with_headless(false); // デバッグ用に表示モード

    let mut service = ScraperService::new();
    match service.call(request).await {
        Ok(result) => {
            println!("成功! {} 件", result.records.len());
            for (i, record) in result.records.iter().take(5).enumerate() {
                println!(
                    "{}. [{}] {} ({})",
                    i + 1,
                    record.published.format("%Y-%m-%d"),
                    record.title,
                    record.phrase_count
                );
            }
            println!("レポート: {:?}", result.report_path);
            println!("画像: {:?}", result.archive_path);
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
        }
    }

    Ok(())
}
