use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::Service;
use tracing::{error, info, warn};

use crate::browser::ChromiumBrowser;
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::http::HttpDownloader;
use crate::latimes::{ArticleRecord, LaTimesScraper, SearchCriteria};
use crate::report::ReportWriter;
use crate::traits::Scraper;

const IMAGE_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// スクレイピングリクエスト
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub criteria: SearchCriteria,
    pub config: ScraperConfig,
}

impl ScrapeRequest {
    pub fn new(criteria: SearchCriteria) -> Self {
        Self {
            criteria,
            config: ScraperConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScraperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let config = ScraperConfig::new(path)
            .with_base_url(self.config.base_url.clone())
            .with_headless(self.config.headless)
            .with_waits(self.config.waits.clone())
            .with_page_retry(self.config.page_retry.clone());
        self.config = config;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }
}

/// スクレイピング結果
#[derive(Debug)]
pub struct ScrapeResult {
    pub records: Vec<ArticleRecord>,
    pub report_path: PathBuf,
    pub archive_path: PathBuf,
}

/// スクレイピングを実行してレポートを書き出す
///
/// 失敗時はスクリーンショットを試みてからエラーを返す（途中までの結果は破棄）。
pub async fn run_scrape<S: Scraper>(
    scraper: &mut S,
    writer: &ReportWriter,
    screenshot_path: &Path,
) -> Result<ScrapeResult, ScraperError> {
    let records = match scraper.execute().await {
        Ok(records) => records,
        Err(e) => {
            error!("スクレイピング失敗: {}", e);
            if let Err(se) = scraper.capture_screenshot(screenshot_path).await {
                warn!("スクリーンショットを保存できませんでした: {}", se);
            }
            if let Err(ce) = scraper.close().await {
                warn!("ブラウザ終了エラー: {}", ce);
            }
            return Err(e);
        }
    };

    let summary = writer.write(&records)?;
    Ok(ScrapeResult {
        records,
        report_path: summary.report_path,
        archive_path: summary.archive_path,
    })
}

/// tower::Serviceを実装したスクレイパーサービス
#[derive(Debug, Clone, Default)]
pub struct ScraperService {}

impl ScraperService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<ScrapeRequest> for ScraperService {
    type Response = ScrapeResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!(
            "スクレイピングリクエスト受信: phrase={:?}, topics={:?}, months={}",
            req.criteria.phrase, req.criteria.topics, req.criteria.months_back
        );

        Box::pin(async move {
            let config = req.config;
            let browser = ChromiumBrowser::launch(&config).await?;
            let downloader = HttpDownloader::new(IMAGE_DOWNLOAD_TIMEOUT)?;
            let writer = ReportWriter::new(&config);
            let screenshot_path = config.screenshot_path.clone();

            let mut scraper = LaTimesScraper::new(config, req.criteria, browser, downloader);
            let result = run_scrape(&mut scraper, &writer, &screenshot_path).await?;

            info!(
                "スクレイピング完了: {}件, report={:?}, images={:?}",
                result.records.len(),
                result.report_path,
                result.archive_path
            );
            Ok(result)
        })
    }
}
