//! 記事のタイトル・説明文に対するテキスト解析

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// `$1,234.56` または `500 dollars` / `1000 USD`
static MONEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\$\d+(?:,\d{3})*(?:\.\d+)?)|(?:\d+(?:,\d{3})*(?:\.\d+)?)\s*(?:dollars|USD)\b")
        .expect("money pattern is valid")
});

/// 検索フレーズの出現回数（フィールド別）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhraseCount {
    pub title: usize,
    pub description: usize,
}

impl fmt::Display for PhraseCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Title: {}; Description: {}", self.title, self.description)
    }
}

/// 大文字小文字を区別しないフレーズカウンター
#[derive(Debug, Clone)]
pub struct PhraseCounter {
    phrase: String,
}

impl PhraseCounter {
    pub fn new(phrase: &str) -> Self {
        Self {
            phrase: phrase.to_lowercase(),
        }
    }

    /// ASCII 記号を除去・小文字化した上で、重ならない出現回数を数える
    pub fn count(&self, text: &str) -> usize {
        if self.phrase.is_empty() {
            return 0;
        }
        let cleaned: String = text
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .collect::<String>()
            .to_lowercase();
        cleaned.matches(self.phrase.as_str()).count()
    }

    pub fn count_fields(&self, title: &str, description: &str) -> PhraseCount {
        PhraseCount {
            title: self.count(title),
            description: self.count(description),
        }
    }
}

pub fn contains_money(text: &str) -> bool {
    MONEY_RE.is_match(text)
}

pub fn mentions_money(title: &str, description: &str) -> bool {
    contains_money(title) || contains_money(description)
}
