//! latimes.com 検索ページの XPath セレクタ

pub const SEARCH_BUTTON: &str = r#"//button[@data-element="search-button"]"#;
pub const SEARCH_INPUT: &str = r#"//input[@data-element="search-form-input"]"#;
pub const SEARCH_SUBMIT: &str = r#"//button[@data-element="search-submit-button"]"#;

pub const SORT_SELECT: &str = r#"//select[@class="select-input"]"#;
pub const SORT_NEWEST_LABEL: &str = "Newest";

pub const TOPICS_PANEL: &str = r#"//p[text()="Topics"]"#;

pub const NO_RESULTS: &str = r#"//div[@class="search-results-module-no-results"]"#;
pub const RESULTS_COUNT: &str = r#"//div[@class="search-results-module-count"]"#;

pub const NEXT_PAGE: &str = r#"//div[@class="search-results-module-next-page"]"#;
pub const PAGE_COUNTS: &str = r#"//div[@class="search-results-module-page-counts"]"#;

/// 検索結果1件（プロモ）のブロック
pub const PROMO: &str = "//ps-promo";

// プロモ内の相対パス
pub const PROMO_TIMESTAMP: &str = r#"//p[@class="promo-timestamp"]"#;
pub const PROMO_TITLE: &str = r#"//h3[@class="promo-title"]"#;
pub const PROMO_DESCRIPTION: &str = r#"//p[@class="promo-description"]"#;
pub const PROMO_IMAGE: &str = r#"//img[@class="image"]"#;

/// `index` 番目（1始まり）のプロモ内のフィールド
pub fn promo_field(index: usize, field: &str) -> String {
    format!("({})[{}]{}", PROMO, index, field)
}

pub fn topic_label(topic: &str) -> String {
    format!(r#"//span[text()="{}"]"#, topic)
}

pub fn topic_checkbox(topic: &str) -> String {
    format!(r#"//span[text()="{}"]//preceding-sibling::input"#, topic)
}
