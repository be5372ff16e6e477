//! news-scraper CLI
//!
//! ```sh
//! news-scraper --work-item work-items.json
//! news-scraper --phrase wildfire --section "California, Politics" --months 2
//! ```

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tower::Service;
use tracing::{error, info};

use news_scraper::config::DEFAULT_BASE_URL;
use news_scraper::logging::init_logging;
use news_scraper::workitem::{MonthsBack, Topics};
use news_scraper::{ScrapeRequest, ScraperConfig, ScraperService, WorkItem};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Work item JSON file (payload with phrase / section / months)
    #[arg(short, long, env = "WORK_ITEM_PATH")]
    work_item: Option<PathBuf>,

    /// Search phrase (overrides the work item)
    #[arg(short, long)]
    phrase: Option<String>,

    /// Topics, comma separated (overrides the work item)
    #[arg(short, long)]
    section: Option<String>,

    /// Months back; 0 and 1 both mean the previous month (overrides the work item)
    #[arg(short, long)]
    months: Option<u32>,

    /// Directory for the report, image archive, log and failure screenshot
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Log file (defaults to <output-dir>/scraper.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long, env = "NEWS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Show the browser window
    #[arg(long)]
    show_browser: bool,
}

impl Cli {
    fn work_item(&self) -> Result<WorkItem, Box<dyn Error>> {
        let mut item = match &self.work_item {
            Some(path) => WorkItem::load(path)?,
            None => WorkItem::default(),
        };
        if let Some(phrase) = &self.phrase {
            item.phrase = phrase.clone();
        }
        if let Some(section) = &self.section {
            item.section = Some(Topics::One(section.clone()));
        }
        if let Some(months) = self.months {
            item.months = Some(MonthsBack::Number(i64::from(months)));
        }
        Ok(item)
    }

    fn config(&self) -> ScraperConfig {
        let mut config = ScraperConfig::new(&self.output_dir)
            .with_base_url(&self.base_url)
            .with_headless(!self.show_browser);
        if let Some(log_file) = &self.log_file {
            config = config.with_log_path(log_file);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.config();
    init_logging(&config)?;

    let criteria = cli.work_item()?.into_criteria()?;
    info!(
        "phrase={:?}, topics={:?}, months={}",
        criteria.phrase, criteria.topics, criteria.months_back
    );

    let mut service = ScraperService::new();
    match service.call(ScrapeRequest::new(criteria).with_config(config)).await {
        Ok(result) => {
            info!(
                "完了: {}件 -> {:?}, {:?}",
                result.records.len(),
                result.report_path,
                result.archive_path
            );
            Ok(())
        }
        Err(e) => {
            error!("処理に失敗しました: {}", e);
            Err(e.into())
        }
    }
}
