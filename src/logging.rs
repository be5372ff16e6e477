//! コンソールとログファイルの設定
//!
//! ログファイルには debug レベルまで出力し、`ScraperConfig::log_exclusions`
//! の部分文字列を含む外部クレート由来の行は除外する。

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::ScraperConfig;
use crate::error::ScraperError;

/// 除外文字列を含む行を丸ごと捨てる Writer
pub struct FilteredLog<W> {
    sink: Arc<Mutex<W>>,
    exclusions: Arc<Vec<String>>,
}

impl<W> Clone for FilteredLog<W> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            exclusions: Arc::clone(&self.exclusions),
        }
    }
}

impl<W: Write> FilteredLog<W> {
    pub fn new(sink: W, exclusions: Vec<String>) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
            exclusions: Arc::new(exclusions),
        }
    }

    fn is_excluded(&self, line: &str) -> bool {
        self.exclusions.iter().any(|pattern| line.contains(pattern.as_str()))
    }

    fn write_lines(&self, buf: &[u8]) {
        let text = String::from_utf8_lossy(buf);
        let Ok(mut sink) = self.sink.lock() else {
            return;
        };
        for line in text.split_inclusive('\n') {
            if !self.is_excluded(line) {
                let _ = sink.write_all(line.as_bytes());
            }
        }
        let _ = sink.flush();
    }
}

/// 1イベント分のバッファ（drop 時に判定して書き込む）
pub struct FilteredLine<W: Write> {
    buf: Vec<u8>,
    log: FilteredLog<W>,
}

impl<W: Write> Write for FilteredLine<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write> Drop for FilteredLine<W> {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            self.log.write_lines(&self.buf);
        }
    }
}

impl<'a, W: Write + 'a> MakeWriter<'a> for FilteredLog<W> {
    type Writer = FilteredLine<W>;

    fn make_writer(&'a self) -> Self::Writer {
        FilteredLine {
            buf: Vec::new(),
            log: self.clone(),
        }
    }
}

/// グローバル subscriber を設定する
///
/// コンソールは `RUST_LOG`（既定 `info`）、ファイルは `config.log_path`。
pub fn init_logging(config: &ScraperConfig) -> Result<(), ScraperError> {
    if let Some(parent) = config.log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(true).with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(FilteredLog::new(file, config.log_exclusions.clone()))
        .with_filter(LevelFilter::DEBUG);

    // 既に初期化済みなら何もしない
    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_excluded_lines_are_dropped() {
        let buf = SharedBuf::default();
        let log = FilteredLog::new(buf.clone(), vec!["chromiumoxide::conn".into(), "hyper".into()]);

        for line in [
            "INFO news_scraper: 記事の抽出を開始します\n",
            "DEBUG chromiumoxide::conn: ws frame\n",
            "DEBUG hyper::proto: flushed 120 bytes\n",
            "INFO news_scraper::report: done\n",
        ] {
            let mut writer = log.make_writer();
            writer.write_all(line.as_bytes()).unwrap();
        }

        let contents = buf.contents();
        assert!(contents.contains("記事の抽出を開始します"));
        assert!(contents.contains("news_scraper::report: done"));
        assert!(!contents.contains("chromiumoxide"));
        assert!(!contents.contains("hyper"));
    }

    #[test]
    fn test_subscriber_writes_to_filtered_log() {
        let buf = SharedBuf::default();
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(FilteredLog::new(buf.clone(), vec!["Browser event".into()])),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Opening https://www.latimes.com");
            tracing::debug!("Browser event: Frame");
        });

        let contents = buf.contents();
        assert!(contents.contains("Opening https://www.latimes.com"));
        assert!(!contents.contains("Browser event"));
    }

    #[test]
    fn test_init_logging_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScraperConfig::new(dir.path()).with_log_path(dir.path().join("logs/run.log"));

        init_logging(&config).unwrap();
        assert!(config.log_path.exists());
    }
}
