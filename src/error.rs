use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("要素操作エラー: {0}")]
    Interaction(String),

    #[error("JavaScript実行エラー: {0}")]
    JavaScript(String),

    #[error("Unrecognized date format: {0:?}")]
    DateParse(String),

    #[error("入力エラー: {0}")]
    InvalidInput(String),

    #[error("ダウンロードエラー: {0}")]
    Download(String),

    #[error("レポート出力エラー: {0}")]
    Report(String),

    #[error("アーカイブエラー: {0}")]
    Archive(String),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),
}

impl ScraperError {
    /// UI のタイミング起因で、再試行すれば解消し得るエラーか
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScraperError::Timeout(_)
                | ScraperError::ElementNotFound(_)
                | ScraperError::Interaction(_)
                | ScraperError::Navigation(_)
        )
    }
}

impl From<csv::Error> for ScraperError {
    fn from(e: csv::Error) -> Self {
        ScraperError::Report(e.to_string())
    }
}

impl From<zip::result::ZipError> for ScraperError {
    fn from(e: zip::result::ZipError) -> Self {
        ScraperError::Archive(e.to_string())
    }
}
