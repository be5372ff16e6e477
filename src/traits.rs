use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::ScraperError;
use crate::latimes::ArticleRecord;

/// 待機中のポーリング間隔
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// スクレイパーが必要とするブラウザ操作（セレクタは XPath）
#[async_trait]
pub trait Browser: Send + Sync {
    /// URLを開く
    async fn goto(&self, url: &str) -> Result<(), ScraperError>;

    /// セレクタに一致する要素数
    async fn count(&self, selector: &str) -> Result<usize, ScraperError>;

    /// 要素のテキスト（存在しなければ ElementNotFound）
    async fn text(&self, selector: &str) -> Result<String, ScraperError>;

    /// 要素の属性値（要素が存在しなければ ElementNotFound）
    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScraperError>;

    async fn click(&self, selector: &str) -> Result<(), ScraperError>;

    async fn input_text(&self, selector: &str, text: &str) -> Result<(), ScraperError>;

    /// `<select>` の表示ラベルで選択
    async fn select_by_label(&self, selector: &str, label: &str) -> Result<(), ScraperError>;

    async fn scroll_into_view(&self, selector: &str) -> Result<(), ScraperError>;

    async fn is_visible(&self, selector: &str) -> Result<bool, ScraperError>;

    async fn is_enabled(&self, selector: &str) -> Result<bool, ScraperError>;

    /// スクリーンショットをファイルに保存
    async fn screenshot(&self, path: &Path) -> Result<(), ScraperError>;

    /// リソース解放
    async fn close(&self) -> Result<(), ScraperError>;

    /// 要素が表示されるまで待機
    async fn wait_until_visible(&self, selector: &str, timeout: Duration) -> Result<(), ScraperError> {
        let start = Instant::now();
        loop {
            if self.is_visible(selector).await.unwrap_or(false) {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(ScraperError::Timeout(format!(
                    "{:?} 以内に表示されません: {}",
                    timeout, selector
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 要素が有効になるまで待機
    async fn wait_until_enabled(&self, selector: &str, timeout: Duration) -> Result<(), ScraperError> {
        let start = Instant::now();
        loop {
            if self.is_enabled(selector).await.unwrap_or(false) {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(ScraperError::Timeout(format!(
                    "{:?} 以内に有効になりません: {}",
                    timeout, selector
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

/// 画像ダウンロード
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), ScraperError>;
}

#[async_trait]
pub trait Scraper: Send + Sync {
    /// サイトを開いて検索フォームを表示
    async fn initialize(&mut self) -> Result<(), ScraperError>;

    /// 検索・並び替え・トピック絞り込み（結果が表示されたら true）
    async fn search(&mut self) -> Result<bool, ScraperError>;

    /// 期間内の記事を収集
    async fn collect(&mut self) -> Result<Vec<ArticleRecord>, ScraperError>;

    /// 失敗時の診断用スクリーンショット
    async fn capture_screenshot(&self, path: &Path) -> Result<(), ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// 一括実行（initialize → search → collect → close）
    async fn execute(&mut self) -> Result<Vec<ArticleRecord>, ScraperError> {
        self.initialize().await?;
        let records = if self.search().await? {
            self.collect().await?
        } else {
            Vec::new()
        };
        self.close().await?;
        Ok(records)
    }
}
