//! [`Browser`] の Chromium (CDP) 実装
//!
//! セレクタは XPath。表示・有効状態の判定はページ内スクリプトで行い、
//! 要素が無い場合はエラーではなく `false` を返す。

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::Browser;

pub struct ChromiumBrowser {
    browser: Mutex<Option<ChromeBrowser>>,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromiumBrowser {
    /// Chromium を起動して空のページを開く
    pub async fn launch(config: &ScraperConfig) -> Result<Self, ScraperError> {
        info!("Launching browser (headless: {})...", config.headless);

        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = std::env::temp_dir().join(format!("news-scraper-{}", unique_id));

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            .window_size(1920, 1080)
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if let Ok(chrome_path) = std::env::var("CHROME_PATH").or_else(|_| std::env::var("CHROMIUM_PATH")) {
            builder = builder.chrome_executable(chrome_path);
        }

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let (browser, mut handler) = ChromeBrowser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        info!("Browser launched");
        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler_task,
        })
    }

    async fn find(&self, selector: &str) -> Result<Element, ScraperError> {
        self.page
            .find_xpath(selector)
            .await
            .map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", selector, e)))
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, ScraperError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| ScraperError::JavaScript(e.to_string()))
    }
}

/// XPath を JS 文字列リテラルにして最初の一致要素を取得する式
fn first_node_js(selector: &str) -> String {
    let literal = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
        literal
    )
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        info!("Opening {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize, ScraperError> {
        let literal = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
        let script = format!(
            "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
            literal
        );
        self.eval::<usize>(&script).await
    }

    async fn text(&self, selector: &str) -> Result<String, ScraperError> {
        let element = self.find(selector).await?;
        let text = element
            .inner_text()
            .await
            .map_err(|e| ScraperError::JavaScript(format!("{}: {}", selector, e)))?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScraperError> {
        let element = self.find(selector).await?;
        element
            .attribute(name)
            .await
            .map_err(|e| ScraperError::JavaScript(format!("{}@{}: {}", selector, name, e)))
    }

    async fn click(&self, selector: &str) -> Result<(), ScraperError> {
        let element = self.find(selector).await?;
        element
            .click()
            .await
            .map_err(|e| ScraperError::Interaction(format!("click {}: {}", selector, e)))?;
        Ok(())
    }

    async fn input_text(&self, selector: &str, text: &str) -> Result<(), ScraperError> {
        let element = self.find(selector).await?;
        element
            .click()
            .await
            .map_err(|e| ScraperError::Interaction(format!("focus {}: {}", selector, e)))?
            .type_str(text)
            .await
            .map_err(|e| ScraperError::Interaction(format!("type into {}: {}", selector, e)))?;
        Ok(())
    }

    async fn select_by_label(&self, selector: &str, label: &str) -> Result<(), ScraperError> {
        let label_literal = serde_json::to_string(label).unwrap_or_else(|_| "\"\"".to_string());
        let script = format!(
            r#"
            (() => {{
                const select = {};
                if (!select) return false;
                const option = Array.from(select.options).find(o => o.text.trim() === {});
                if (!option) return false;
                select.value = option.value;
                select.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            first_node_js(selector),
            label_literal
        );

        if self.eval::<bool>(&script).await? {
            Ok(())
        } else {
            Err(ScraperError::ElementNotFound(format!(
                "option {:?} in {}",
                label, selector
            )))
        }
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<(), ScraperError> {
        let element = self.find(selector).await?;
        element
            .scroll_into_view()
            .await
            .map_err(|e| ScraperError::Interaction(format!("scroll {}: {}", selector, e)))?;
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool, ScraperError> {
        let script = format!(
            r#"
            (() => {{
                const el = {};
                if (!el) return false;
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                return style.display !== 'none' &&
                       style.visibility !== 'hidden' &&
                       style.opacity !== '0' &&
                       (rect.width > 0 || rect.height > 0);
            }})()
            "#,
            first_node_js(selector)
        );
        self.eval::<bool>(&script).await
    }

    async fn is_enabled(&self, selector: &str) -> Result<bool, ScraperError> {
        let script = format!(
            "(() => {{ const el = {}; return !!el && !el.disabled; }})()",
            first_node_js(selector)
        );
        self.eval::<bool>(&script).await
    }

    async fn screenshot(&self, path: &Path) -> Result<(), ScraperError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await
            .map_err(|e| ScraperError::Interaction(format!("screenshot: {}", e)))?;
        info!("Screenshot saved to {:?}", path);
        Ok(())
    }

    async fn close(&self) -> Result<(), ScraperError> {
        info!("Closing browser...");
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                debug!("Failed to close browser: {}", e);
            }
        }
        self.handler_task.abort();
        info!("Browser closed");
        Ok(())
    }
}
