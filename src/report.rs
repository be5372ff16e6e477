//! レポート出力: CSV の表とダウンロード画像の zip アーカイブ

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::latimes::ArticleRecord;

pub const COLUMNS: [&str; 6] = [
    "Title",
    "Date",
    "Description",
    "Image Filename",
    "Phrase Counts",
    "Money Present",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 実行で生成されたファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub report_path: PathBuf,
    pub archive_path: PathBuf,
    pub rows: usize,
    pub archived_images: usize,
}

#[derive(Debug, Clone)]
pub struct ReportWriter {
    report_path: PathBuf,
    image_dir: PathBuf,
    archive_path: PathBuf,
}

impl ReportWriter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            report_path: config.report_path.clone(),
            image_dir: config.image_dir.clone(),
            archive_path: config.archive_path.clone(),
        }
    }

    /// 表を書き出し、画像ディレクトリをアーカイブしてから削除する
    pub fn write(&self, records: &[ArticleRecord]) -> Result<ReportSummary, ScraperError> {
        info!("レポートを作成します: {} 件", records.len());
        let rows = self.write_table(records)?;
        let archived_images = self.archive_images()?;

        info!(
            "レポート作成完了: {:?}, 画像アーカイブ: {:?} ({} files)",
            self.report_path, self.archive_path, archived_images
        );
        Ok(ReportSummary {
            report_path: self.report_path.clone(),
            archive_path: self.archive_path.clone(),
            rows,
            archived_images,
        })
    }

    fn write_table(&self, records: &[ArticleRecord]) -> Result<usize, ScraperError> {
        ensure_parent(&self.report_path)?;
        let mut writer = csv::Writer::from_path(&self.report_path)?;
        writer.write_record(COLUMNS)?;

        for record in records {
            writer.write_record([
                record.title.clone(),
                record.published.format(DATE_FORMAT).to_string(),
                record.description.clone(),
                record.image_filename.clone(),
                record.phrase_count.to_string(),
                record.contains_money.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(records.len())
    }

    /// 画像ディレクトリ内のファイルをすべて zip にまとめ、ディレクトリを削除
    fn archive_images(&self) -> Result<usize, ScraperError> {
        ensure_parent(&self.archive_path)?;

        let mut files: Vec<PathBuf> = if self.image_dir.is_dir() {
            std::fs::read_dir(&self.image_dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect()
        } else {
            Vec::new()
        };
        files.sort();

        let mut zip = ZipWriter::new(File::create(&self.archive_path)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for path in &files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            zip.start_file(name.as_str(), options)?;
            io::copy(&mut File::open(path)?, &mut zip)?;
            debug!("アーカイブに追加: {}", name);
        }
        zip.finish()?;

        if self.image_dir.exists() {
            std::fs::remove_dir_all(&self.image_dir)?;
        }
        Ok(files.len())
    }
}

fn ensure_parent(path: &Path) -> Result<(), ScraperError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
