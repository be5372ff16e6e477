//! ユニットテスト用のインメモリ実装（ブラウザ・ダウンローダー）

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ScraperError;
use crate::latimes::selectors::{self, promo_field};
use crate::traits::{Browser, Downloader};

#[derive(Debug, Clone, Default)]
pub(crate) struct FakePromo {
    date: Option<String>,
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
}

impl FakePromo {
    pub(crate) fn dated(label: &str) -> Self {
        Self {
            date: Some(label.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub(crate) fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub(crate) fn image(mut self, src: &str) -> Self {
        self.image = Some(src.to_string());
        self
    }
}

#[derive(Debug, Default)]
struct FakeState {
    page: usize,
    visited: Vec<String>,
    clicks: Vec<String>,
    inputs: Vec<(String, String)>,
    selections: Vec<(String, String)>,
    screenshots: Vec<PathBuf>,
    closed: bool,
}

/// ページ単位の検索結果。次ページボタンで最終ページまで進む
pub(crate) struct FakeBrowser {
    pages: Vec<Vec<FakePromo>>,
    topics: Vec<String>,
    no_results: bool,
    results_never_load: bool,
    page_counter: Option<String>,
    failing_next_clicks: AtomicU32,
    pub(crate) next_clicks: AtomicU32,
    state: Mutex<FakeState>,
}

impl FakeBrowser {
    pub(crate) fn new(pages: Vec<Vec<FakePromo>>) -> Self {
        Self {
            pages,
            topics: Vec::new(),
            no_results: false,
            results_never_load: false,
            page_counter: None,
            failing_next_clicks: AtomicU32::new(0),
            next_clicks: AtomicU32::new(0),
            state: Mutex::new(FakeState::default()),
        }
    }

    pub(crate) fn with_topics(mut self, topics: &[&str]) -> Self {
        self.topics = topics.iter().map(|t| t.to_string()).collect();
        self
    }

    pub(crate) fn without_results(mut self) -> Self {
        self.no_results = true;
        self
    }

    /// 「結果なし」も件数も表示されない
    pub(crate) fn results_never_load(mut self) -> Self {
        self.results_never_load = true;
        self
    }

    /// ページ番号表示を固定の文字列にする
    pub(crate) fn with_page_counter(mut self, label: &str) -> Self {
        self.page_counter = Some(label.to_string());
        self
    }

    /// 次ページボタンの最初の `n` 回のクリックを失敗させる
    pub(crate) fn failing_next_clicks(self, n: u32) -> Self {
        self.failing_next_clicks.store(n, Ordering::SeqCst);
        self
    }

    pub(crate) fn current_page(&self) -> usize {
        self.state.lock().unwrap().page
    }

    pub(crate) fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    pub(crate) fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub(crate) fn inputs(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().inputs.clone()
    }

    pub(crate) fn selections(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().selections.clone()
    }

    pub(crate) fn screenshots(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().screenshots.clone()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn promo_value(&self, selector: &str, pick: fn(&FakePromo) -> Option<&String>) -> Option<String> {
        let page = &self.pages[self.current_page()];
        let field = [
            selectors::PROMO_TIMESTAMP,
            selectors::PROMO_TITLE,
            selectors::PROMO_DESCRIPTION,
            selectors::PROMO_IMAGE,
        ]
        .into_iter()
        .find(|field| selector.ends_with(*field))?;

        page.iter()
            .enumerate()
            .find(|(i, _)| promo_field(i + 1, field) == selector)
            .and_then(|(_, promo)| pick(promo).cloned())
    }

    fn text_field(&self, selector: &str) -> Option<String> {
        if selector.ends_with(selectors::PROMO_TIMESTAMP) {
            self.promo_value(selector, |p| p.date.as_ref())
        } else if selector.ends_with(selectors::PROMO_TITLE) {
            self.promo_value(selector, |p| p.title.as_ref())
        } else if selector.ends_with(selectors::PROMO_DESCRIPTION) {
            self.promo_value(selector, |p| p.description.as_ref())
        } else {
            None
        }
    }

    fn is_topic(&self, selector: &str) -> bool {
        self.topics
            .iter()
            .any(|t| selectors::topic_label(t) == selector || selectors::topic_checkbox(t) == selector)
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        self.state.lock().unwrap().visited.push(url.to_string());
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize, ScraperError> {
        if selector == selectors::PROMO {
            Ok(self.pages[self.current_page()].len())
        } else {
            Ok(0)
        }
    }

    async fn text(&self, selector: &str) -> Result<String, ScraperError> {
        if selector == selectors::PAGE_COUNTS {
            if let Some(label) = &self.page_counter {
                return Ok(label.clone());
            }
            return Ok(format!("{} of {}", self.current_page() + 1, self.pages.len()));
        }
        self.text_field(selector)
            .ok_or_else(|| ScraperError::ElementNotFound(selector.to_string()))
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScraperError> {
        if name != "src" || !selector.ends_with(selectors::PROMO_IMAGE) {
            return Err(ScraperError::ElementNotFound(selector.to_string()));
        }
        self.promo_value(selector, |p| p.image.as_ref())
            .map(Some)
            .ok_or_else(|| ScraperError::ElementNotFound(selector.to_string()))
    }

    async fn click(&self, selector: &str) -> Result<(), ScraperError> {
        if selector == selectors::NEXT_PAGE {
            self.next_clicks.fetch_add(1, Ordering::SeqCst);
            let failing = self.failing_next_clicks.load(Ordering::SeqCst);
            if failing > 0 {
                self.failing_next_clicks.store(failing - 1, Ordering::SeqCst);
                return Err(ScraperError::Interaction("click intercepted".into()));
            }
            let mut state = self.state.lock().unwrap();
            if state.page + 1 < self.pages.len() {
                state.page += 1;
            }
        }
        self.state.lock().unwrap().clicks.push(selector.to_string());
        Ok(())
    }

    async fn input_text(&self, selector: &str, text: &str) -> Result<(), ScraperError> {
        self.state
            .lock()
            .unwrap()
            .inputs
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn select_by_label(&self, selector: &str, label: &str) -> Result<(), ScraperError> {
        self.state
            .lock()
            .unwrap()
            .selections
            .push((selector.to_string(), label.to_string()));
        Ok(())
    }

    async fn scroll_into_view(&self, _selector: &str) -> Result<(), ScraperError> {
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool, ScraperError> {
        Ok(match selector {
            s if s == selectors::NO_RESULTS => self.no_results,
            s if s == selectors::RESULTS_COUNT => !self.no_results && !self.results_never_load,
            s if s == selectors::SEARCH_BUTTON
                || s == selectors::SEARCH_INPUT
                || s == selectors::SEARCH_SUBMIT
                || s == selectors::SORT_SELECT
                || s == selectors::TOPICS_PANEL =>
            {
                true
            }
            _ => false,
        })
    }

    async fn is_enabled(&self, selector: &str) -> Result<bool, ScraperError> {
        Ok(self.is_topic(selector))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), ScraperError> {
        self.state.lock().unwrap().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&self) -> Result<(), ScraperError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// ダウンロード要求を記録し、ダミーファイルを書き出す
#[derive(Default)]
pub(crate) struct FakeDownloader {
    downloads: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeDownloader {
    pub(crate) fn downloads(&self) -> Vec<(String, PathBuf)> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), ScraperError> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, b"\x89PNG")?;
        self.downloads
            .lock()
            .unwrap()
            .push((url.to_string(), dest.to_path_buf()));
        Ok(())
    }
}
