//! HTTP による画像ダウンロード

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ScraperError;
use crate::traits::Downloader;

pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> Result<Self, ScraperError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScraperError::Download(format!("HTTPクライアント初期化: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), ScraperError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScraperError::Download(format!("{}: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScraperError::Download(format!("{}: HTTP {}", url, status)));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ScraperError::Download(format!("{}: {}", url, e)))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        debug!("Downloaded {} ({} bytes) -> {:?}", url, bytes.len(), dest);
        Ok(())
    }
}

/// 画像の `src` をサイト URL 基準で解決する（`//cdn/x.png`、`/x.png`）
pub fn resolve_image_url(base_url: &str, src: &str) -> String {
    match reqwest::Url::parse(base_url).and_then(|base| base.join(src)) {
        Ok(url) => url.to_string(),
        Err(_) => src.to_string(),
    }
}
