use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://www.latimes.com";

/// ブラウザ操作の待機タイムアウト
#[derive(Debug, Clone)]
pub struct WaitTimeouts {
    /// 一般的な要素の表示待ち
    pub element: Duration,
    /// トピック一覧パネルの表示待ち
    pub topics_panel: Duration,
    /// 個々のトピックが有効になるまで
    pub topic_enabled: Duration,
    /// 検索直後の「結果なし」表示の確認
    pub no_results: Duration,
    /// トピック選択後の「結果なし」表示の確認
    pub topic_no_results: Duration,
    /// 検索結果件数の表示待ち
    pub results: Duration,
    /// ページ送り後のページ番号更新待ち
    pub page_advance: Duration,
}

impl Default for WaitTimeouts {
    fn default() -> Self {
        Self {
            element: Duration::from_secs(15),
            topics_panel: Duration::from_secs(60),
            topic_enabled: Duration::from_secs(10),
            no_results: Duration::from_secs(5),
            topic_no_results: Duration::from_secs(3),
            results: Duration::from_secs(15),
            page_advance: Duration::from_secs(10),
        }
    }
}

impl WaitTimeouts {
    /// すべての待機を即時判定にする
    pub fn immediate() -> Self {
        Self {
            element: Duration::ZERO,
            topics_panel: Duration::ZERO,
            topic_enabled: Duration::ZERO,
            no_results: Duration::ZERO,
            topic_no_results: Duration::ZERO,
            results: Duration::ZERO,
            page_advance: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub report_path: PathBuf,
    pub image_dir: PathBuf,
    pub archive_path: PathBuf,
    pub log_path: PathBuf,
    pub screenshot_path: PathBuf,
    pub headless: bool,
    pub waits: WaitTimeouts,
    pub page_retry: RetryPolicy,
    /// ログファイルから除外する行の部分文字列
    pub log_exclusions: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self::new("./output")
    }
}

impl ScraperConfig {
    /// 出力ディレクトリを基準に各ファイルパスを決める
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            report_path: output_dir.join("news.csv"),
            image_dir: output_dir.join("images"),
            archive_path: output_dir.join("images.zip"),
            log_path: output_dir.join("scraper.log"),
            screenshot_path: output_dir.join("failure.png"),
            output_dir,
            headless: true,
            waits: WaitTimeouts::default(),
            page_retry: RetryPolicy::default(),
            log_exclusions: default_log_exclusions(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    pub fn with_waits(mut self, waits: WaitTimeouts) -> Self {
        self.waits = waits;
        self
    }

    pub fn with_page_retry(mut self, policy: RetryPolicy) -> Self {
        self.page_retry = policy;
        self
    }

    pub fn image_path(&self, filename: &str) -> PathBuf {
        self.image_dir.join(filename)
    }
}

fn default_log_exclusions() -> Vec<String> {
    [
        "chromiumoxide::conn",
        "chromiumoxide::handler",
        "Browser event",
        "hyper",
        "reqwest::connect",
        "WS Invalid message",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
