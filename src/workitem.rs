//! Work item 入力: `phrase`、`section`（トピック）、`months`

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::ScraperError;
use crate::latimes::SearchCriteria;

/// `section` は文字列・カンマ区切り文字列・リストのいずれか
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Topics {
    One(String),
    Many(Vec<String>),
}

impl Topics {
    pub fn into_list(self) -> Vec<String> {
        let items = match self {
            Topics::One(s) => s.split(',').map(str::to_string).collect(),
            Topics::Many(v) => v,
        };
        items
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// `months` は整数・小数（切り捨て）・数値文字列のいずれか
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MonthsBack {
    Number(i64),
    Float(f64),
    Text(String),
}

impl MonthsBack {
    pub fn value(&self) -> Result<u32, ScraperError> {
        let n = match self {
            MonthsBack::Number(n) => *n,
            MonthsBack::Float(f) if f.is_finite() => f.trunc() as i64,
            MonthsBack::Float(f) => {
                return Err(ScraperError::InvalidInput(format!("months が不正: {}", f)))
            }
            MonthsBack::Text(s) => s.trim().parse::<i64>().map_err(|_| {
                ScraperError::InvalidInput(format!("months が数値ではありません: {:?}", s))
            })?,
        };
        u32::try_from(n)
            .map_err(|_| ScraperError::InvalidInput(format!("months は0以上: {}", n)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkItem {
    #[serde(default)]
    pub phrase: String,
    #[serde(default)]
    pub section: Option<Topics>,
    #[serde(default)]
    pub months: Option<MonthsBack>,
}

impl WorkItem {
    /// JSON ファイルから読み込む
    ///
    /// payload そのもの、`payload` キーを持つオブジェクト、またはそのリスト
    /// （先頭のみ使用）を受け付ける。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScraperError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let item = Self::from_json(&text)?;
        info!("work item を読み込みました: {:?}", path);
        Ok(item)
    }

    pub fn from_json(text: &str) -> Result<Self, ScraperError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ScraperError::InvalidInput(format!("work item JSON: {}", e)))?;

        let value = match value {
            Value::Array(items) => items.into_iter().next().ok_or_else(|| {
                ScraperError::InvalidInput("work item リストが空です".into())
            })?,
            other => other,
        };
        let payload = match value {
            Value::Object(mut obj) if obj.contains_key("payload") => {
                obj.remove("payload").unwrap_or(Value::Null)
            }
            other => other,
        };

        serde_json::from_value(payload)
            .map_err(|e| ScraperError::InvalidInput(format!("work item payload: {}", e)))
    }

    pub fn into_criteria(self) -> Result<SearchCriteria, ScraperError> {
        let months_back = match &self.months {
            Some(months) => months.value()?,
            None => 0,
        };
        let topics = self.section.map(Topics::into_list).unwrap_or_default();
        SearchCriteria::new(self.phrase, topics, months_back)
    }
}
