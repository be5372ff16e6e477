//! LA Times 関連の型定義

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::analysis::PhraseCount;
use crate::error::ScraperError;

/// 検索条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    /// 検索フレーズ（空不可）
    pub phrase: String,
    /// 絞り込みトピック（空なら絞り込みなし）
    pub topics: Vec<String>,
    /// 何ヶ月前まで遡るか
    pub months_back: u32,
}

impl SearchCriteria {
    pub fn new(
        phrase: impl Into<String>,
        topics: Vec<String>,
        months_back: u32,
    ) -> Result<Self, ScraperError> {
        let phrase = phrase.into().trim().to_string();
        if phrase.is_empty() {
            return Err(ScraperError::InvalidInput("検索フレーズが空です".into()));
        }

        let topics = topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Self {
            phrase,
            topics,
            months_back,
        })
    }
}

/// 抽出した記事1件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleRecord {
    pub title: String,
    /// ページ上の日付表記そのまま
    pub date_label: String,
    pub published: NaiveDateTime,
    pub description: String,
    /// 画像がなければ空文字
    pub image_filename: String,
    pub phrase_count: PhraseCount,
    pub contains_money: bool,
}

impl ArticleRecord {
    /// 重複判定キー
    pub(crate) fn key(&self) -> (String, String, String) {
        (
            self.title.clone(),
            self.date_label.clone(),
            self.description.clone(),
        )
    }
}
