//! LA Times ニューススクレイパーライブラリ
//!
//! - フレーズで検索し、新しい順に並べ替え、トピックで絞り込む
//! - 指定した月数の範囲に入る記事をページ送りしながら抽出
//! - 記事画像をダウンロードし、CSVレポートと画像アーカイブを出力
//!
//! # 使用例
//!
//! ```rust,ignore
//! use news_scraper::{ScrapeRequest, ScraperService, SearchCriteria};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let criteria = SearchCriteria::new("wildfire", vec!["California".into()], 2).unwrap();
//!     let mut service = ScraperService::new();
//!
//!     let request = ScrapeRequest::new(criteria)
//!         .with_output_dir("./output")
//!         .with_headless(false);
//!
//!     let result = service.call(request).await.unwrap();
//!     println!("{} articles -> {:?}", result.records.len(), result.report_path);
//! }
//! ```

pub mod analysis;
pub mod browser;
pub mod config;
pub mod dates;
pub mod error;
pub mod http;
pub mod latimes;
pub mod logging;
pub mod report;
pub mod retry;
pub mod service;
pub mod traits;
pub mod workitem;

#[cfg(test)]
pub(crate) mod testing;

// 主要な型をリエクスポート
pub use browser::ChromiumBrowser;
pub use config::{ScraperConfig, WaitTimeouts};
pub use error::ScraperError;
pub use http::HttpDownloader;
pub use latimes::{ArticleRecord, LaTimesScraper, SearchCriteria};
pub use report::{ReportSummary, ReportWriter};
pub use retry::{Backoff, RetryPolicy};
pub use service::{run_scrape, ScrapeRequest, ScrapeResult, ScraperService};
pub use traits::{Browser, Downloader, Scraper};
pub use workitem::WorkItem;
