//! LA Times スクレイパー実装

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::analysis::{mentions_money, PhraseCounter};
use crate::config::ScraperConfig;
use crate::dates::{parse_article_date, resolve_cutoff};
use crate::error::ScraperError;
use crate::http::resolve_image_url;
use crate::traits::{Browser, Downloader, Scraper, POLL_INTERVAL};

use super::selectors::{self, promo_field};
use super::types::{ArticleRecord, SearchCriteria};

/// ページ単位の抽出ループの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageStep {
    FetchPage,
    Advance,
    Done,
}

/// 日付ラベル付きのプロモ（1始まりの位置）
struct DatedPromo {
    index: usize,
    label: String,
    published: NaiveDateTime,
}

/// LA Times スクレイパー
pub struct LaTimesScraper<B: Browser, D: Downloader> {
    config: ScraperConfig,
    criteria: SearchCriteria,
    browser: B,
    downloader: D,
    counter: PhraseCounter,
    now: NaiveDateTime,
}

impl<B: Browser, D: Downloader> LaTimesScraper<B, D> {
    pub fn new(config: ScraperConfig, criteria: SearchCriteria, browser: B, downloader: D) -> Self {
        let counter = PhraseCounter::new(&criteria.phrase);
        Self {
            config,
            criteria,
            browser,
            downloader,
            counter,
            now: Local::now().naive_local(),
        }
    }

    /// 基準時刻を固定する（相対日付と期間の計算に使う）
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    /// 画像ディレクトリを作成し、サイトを開いて検索フォームを表示
    pub async fn open(&self) -> Result<(), ScraperError> {
        info!("処理を開始します");
        std::fs::create_dir_all(&self.config.image_dir)?;

        self.browser.goto(&self.config.base_url).await?;
        self.browser
            .wait_until_visible(selectors::SEARCH_BUTTON, self.config.waits.element)
            .await?;
        self.browser.click(selectors::SEARCH_BUTTON).await?;
        Ok(())
    }

    /// フレーズを入力して検索
    pub async fn search_phrase(&self) -> Result<(), ScraperError> {
        info!("フレーズを検索: {:?}", self.criteria.phrase);
        let timeout = self.config.waits.element;

        self.browser
            .wait_until_visible(selectors::SEARCH_INPUT, timeout)
            .await?;
        self.browser
            .input_text(selectors::SEARCH_INPUT, &self.criteria.phrase)
            .await?;
        self.browser
            .wait_until_visible(selectors::SEARCH_SUBMIT, timeout)
            .await?;
        self.browser.click(selectors::SEARCH_SUBMIT).await?;
        Ok(())
    }

    /// 新しい順に並び替え
    pub async fn sort_newest(&self) -> Result<(), ScraperError> {
        info!("新しい順に並び替えます");
        self.browser
            .wait_until_visible(selectors::SORT_SELECT, self.config.waits.element)
            .await?;
        self.browser.click(selectors::SORT_SELECT).await?;
        self.browser
            .select_by_label(selectors::SORT_SELECT, selectors::SORT_NEWEST_LABEL)
            .await?;
        Ok(())
    }

    /// トピックを選択（失敗はログのみ）。すべて選択できたら true
    pub async fn select_topics(&self) -> bool {
        info!("トピック選択を開始: {:?}", self.criteria.topics);
        let mut all_clicked = true;

        for topic in &self.criteria.topics {
            let topic = title_case(topic.trim());
            match self.select_topic(&topic).await {
                Ok(true) => debug!("トピック選択: {}", topic),
                Ok(false) => {
                    all_clicked = false;
                    info!(
                        "{} トピックが一覧にないか、まだ有効になっていません",
                        topic
                    );
                }
                Err(e) => {
                    all_clicked = false;
                    info!("{} トピックを選択できませんでした: {}", topic, e);
                }
            }
        }

        if all_clicked {
            info!("すべてのトピックを選択しました");
        }
        all_clicked
    }

    async fn select_topic(&self, topic: &str) -> Result<bool, ScraperError> {
        let waits = &self.config.waits;
        let label = selectors::topic_label(topic);

        self.browser
            .wait_until_visible(selectors::TOPICS_PANEL, waits.topics_panel)
            .await?;
        if let Err(e) = self.browser.wait_until_enabled(&label, waits.topic_enabled).await {
            debug!("{}", e);
        }

        if !self.browser.is_enabled(&label).await? {
            return Ok(false);
        }

        self.browser.scroll_into_view(&label).await?;
        self.browser.click(&selectors::topic_checkbox(topic)).await?;

        // 絞り込み結果の反映待ち（「結果なし」表示でも続行）
        let _ = self
            .browser
            .wait_until_visible(selectors::NO_RESULTS, waits.topic_no_results)
            .await;
        Ok(true)
    }

    /// 検索結果が表示されたか確認
    pub async fn load_results(&self) -> Result<bool, ScraperError> {
        let waits = &self.config.waits;
        let _ = self
            .browser
            .wait_until_visible(selectors::NO_RESULTS, waits.no_results)
            .await;

        if self.browser.is_visible(selectors::NO_RESULTS).await? {
            info!("検索フレーズに一致する結果がありません");
            return Ok(false);
        }

        match self
            .browser
            .wait_until_visible(selectors::RESULTS_COUNT, waits.results)
            .await
        {
            Ok(()) => {
                info!("検索結果を読み込みました");
                Ok(true)
            }
            Err(ScraperError::Timeout(msg)) => {
                info!("検索結果が読み込まれませんでした: {}", msg);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// 期間の起点
    pub fn cutoff(&self) -> Result<NaiveDateTime, ScraperError> {
        let cutoff = resolve_cutoff(self.criteria.months_back, self.now.date())?;
        info!("{} 以降の記事を取得します", cutoff);
        Ok(cutoff)
    }

    /// ページを送りながら期間内の記事を収集
    ///
    /// 結果は新しい順に並んでいる前提で、ページ内の最も古い記事が期間外に
    /// なったページで打ち切る。
    pub async fn collect_articles(&self) -> Result<Vec<ArticleRecord>, ScraperError> {
        info!("記事の抽出を開始します");
        let cutoff = self.cutoff()?;
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut page_no = 1;
        let mut step = PageStep::FetchPage;

        while step != PageStep::Done {
            step = match step {
                PageStep::FetchPage => {
                    let oldest = self.read_page(cutoff, &mut records, &mut seen).await?;
                    match oldest {
                        Some(oldest) if oldest >= cutoff => PageStep::Advance,
                        Some(oldest) => {
                            debug!("ページ{}の最古の記事 {} が期間外", page_no, oldest);
                            PageStep::Done
                        }
                        None => {
                            warn!("ページ{}に日付付きの記事がありません", page_no);
                            PageStep::Done
                        }
                    }
                }
                PageStep::Advance => {
                    if self.advance().await? {
                        page_no += 1;
                        PageStep::FetchPage
                    } else {
                        PageStep::Done
                    }
                }
                PageStep::Done => PageStep::Done,
            };
        }

        info!("記事の抽出が完了しました: {}件 ({}ページ)", records.len(), page_no);
        Ok(records)
    }

    /// 現在のページを処理し、ページ内で最も古い記事の日付を返す
    async fn read_page(
        &self,
        cutoff: NaiveDateTime,
        records: &mut Vec<ArticleRecord>,
        seen: &mut HashSet<(String, String, String)>,
    ) -> Result<Option<NaiveDateTime>, ScraperError> {
        let promo_count = self.browser.count(selectors::PROMO).await?;
        debug!("プロモ数: {}", promo_count);

        let mut dated = Vec::with_capacity(promo_count);
        for index in 1..=promo_count {
            let Some(label) = self
                .optional_text(&promo_field(index, selectors::PROMO_TIMESTAMP))
                .await?
            else {
                debug!("プロモ{}に日付がありません", index);
                continue;
            };
            let published = parse_article_date(&label, self.now)?;
            dated.push(DatedPromo {
                index,
                label,
                published,
            });
        }

        let oldest = dated.last().map(|promo| promo.published);

        for promo in dated.into_iter().filter(|p| p.published >= cutoff) {
            let title = self
                .optional_text(&promo_field(promo.index, selectors::PROMO_TITLE))
                .await?
                .unwrap_or_default();
            let description = self
                .optional_text(&promo_field(promo.index, selectors::PROMO_DESCRIPTION))
                .await?
                .unwrap_or_default();

            let key = (title.clone(), promo.label.clone(), description.clone());
            if seen.contains(&key) {
                debug!("重複した記事をスキップ: {:?}", title);
                continue;
            }

            let image_filename = self.save_image(promo.index, records.len() + 1).await?;

            let record = ArticleRecord {
                phrase_count: self.counter.count_fields(&title, &description),
                contains_money: mentions_money(&title, &description),
                title,
                date_label: promo.label,
                published: promo.published,
                description,
                image_filename,
            };
            debug!("記事を追加: {:?} ({})", record.title, record.published);
            seen.insert(record.key());
            records.push(record);
        }

        Ok(oldest)
    }

    /// テキストを取得（要素がなければ None）
    async fn optional_text(&self, selector: &str) -> Result<Option<String>, ScraperError> {
        match self.browser.text(selector).await {
            Ok(text) => Ok(Some(text)),
            Err(ScraperError::ElementNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// プロモの画像を `image {n}.png` として保存し、ファイル名を返す
    async fn save_image(&self, index: usize, number: usize) -> Result<String, ScraperError> {
        let src = match self
            .browser
            .attribute(&promo_field(index, selectors::PROMO_IMAGE), "src")
            .await
        {
            Ok(src) => src.unwrap_or_default(),
            Err(ScraperError::ElementNotFound(_)) => String::new(),
            Err(e) => return Err(e),
        };

        if src.trim().is_empty() {
            return Ok(String::new());
        }

        let filename = format!("image {}.png", number);
        let url = resolve_image_url(&self.config.base_url, src.trim());
        self.downloader
            .download(&url, &self.config.image_path(&filename))
            .await?;
        Ok(filename)
    }

    /// 次のページへ。リトライを使い切った場合と最終ページでは false
    async fn advance(&self) -> Result<bool, ScraperError> {
        match self.config.page_retry.run("next page", || self.next_page()).await {
            Ok(advanced) => {
                if !advanced {
                    info!("最終ページに到達しました");
                }
                Ok(advanced)
            }
            Err(e) if (self.config.page_retry.retryable)(&e) => {
                info!("記事の取得が完了しました（ページ送り不可: {}）", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn next_page(&self) -> Result<bool, ScraperError> {
        self.browser.scroll_into_view(selectors::NEXT_PAGE).await?;

        let counter = self.browser.text(selectors::PAGE_COUNTS).await?;
        let (current, total) = parse_page_counter(&counter)?;
        if current >= total {
            return Ok(false);
        }

        let total_label = counter
            .rsplit("of")
            .next()
            .map(str::trim)
            .unwrap_or_default();
        let expected = format!("{} of {}", current + 1, total_label);

        self.browser.click(selectors::NEXT_PAGE).await?;
        self.wait_for_text(selectors::PAGE_COUNTS, &expected, self.config.waits.page_advance)
            .await?;
        debug!("ページ送り: {}", expected);
        Ok(true)
    }

    async fn wait_for_text(
        &self,
        selector: &str,
        expected: &str,
        timeout: Duration,
    ) -> Result<(), ScraperError> {
        let start = Instant::now();
        loop {
            if let Ok(text) = self.browser.text(selector).await {
                if text.trim() == expected {
                    return Ok(());
                }
            }
            if start.elapsed() >= timeout {
                return Err(ScraperError::Timeout(format!(
                    "{:?} 以内に {:?} になりません",
                    timeout, expected
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl<B: Browser, D: Downloader> Scraper for LaTimesScraper<B, D> {
    async fn initialize(&mut self) -> Result<(), ScraperError> {
        self.open().await
    }

    async fn search(&mut self) -> Result<bool, ScraperError> {
        self.search_phrase().await?;
        self.sort_newest().await?;
        if self.criteria.topics.is_empty() {
            info!("トピック指定なし");
        } else {
            self.select_topics().await;
        }
        self.load_results().await
    }

    async fn collect(&mut self) -> Result<Vec<ArticleRecord>, ScraperError> {
        self.collect_articles().await
    }

    async fn capture_screenshot(&self, path: &Path) -> Result<(), ScraperError> {
        self.browser.screenshot(path).await
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.browser.close().await
    }
}

/// "3 of 1,234" -> (3, 1234)
pub fn parse_page_counter(text: &str) -> Result<(u64, u64), ScraperError> {
    let invalid = || ScraperError::InvalidInput(format!("ページ番号の形式が不正: {:?}", text));

    let (current, total) = text.split_once("of").ok_or_else(invalid)?;
    let parse = |s: &str| s.trim().replace(',', "").parse::<u64>();
    let current = parse(current).map_err(|_| invalid())?;
    let total = parse(total).map_err(|_| invalid())?;
    Ok((current, total))
}

/// 単語の先頭を大文字、残りを小文字にする（"world & nation" -> "World & Nation"）
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
