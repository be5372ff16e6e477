//! 検索結果の日付処理
//!
//! - 期間の起点: 対象となる最も古い月の1日
//! - 記事の日付: 相対表記（"3h ago"）または絶対日付（"Oct. 12, 2024"）

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::ScraperError;

/// 当日公開を示す表記（現在時刻として扱う）
const RELATIVE_MARKERS: [&str; 5] = ["h ago", "minutes ago", "m ago", "hour ago", "hours ago"];

const DATETIME_FORMATS: [&str; 10] = [
    "%B %d, %Y %I:%M %p",
    "%B %d %Y %I:%M %p",
    "%B %d, %Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

// 月/日/年 は年/月/日 より先、%y は %Y より先（"10/5/26" を 10 年や 26 年と読まない）
const DATE_FORMATS: [&str; 8] = [
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
];

const WEEKDAYS: [&str; 17] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
    "mon", "tue", "tues", "wed", "thu", "thur", "thurs", "fri", "sat", "sun",
];

const ORDINAL_SUFFIXES: [&str; 4] = ["st", "nd", "rd", "th"];

/// 対象期間の起点（月の1日 0:00）
///
/// `months_back` が 0 と 1 はどちらも前月。2 以上は当月からその月数だけ遡る。
pub fn resolve_cutoff(months_back: u32, today: NaiveDate) -> Result<NaiveDateTime, ScraperError> {
    let back = months_back.max(1);

    let cutoff = today
        .with_day(1)
        .and_then(|first| first.checked_sub_months(Months::new(back)))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            ScraperError::InvalidInput(format!("months back out of range: {}", months_back))
        })?;

    debug!("cutoff for {} months back from {}: {}", months_back, today, cutoff);
    Ok(cutoff)
}

/// プロモの日付ラベルを解析する
///
/// 相対表記は逆算せず `now` を返す。絶対日付は曜日・序数（"5th"）・
/// "Sept" などの表記揺れを正規化してから、書式を順に試す。
pub fn parse_article_date(raw: &str, now: NaiveDateTime) -> Result<NaiveDateTime, ScraperError> {
    let label = raw.trim();
    let lower = label.to_lowercase();

    if RELATIVE_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return Ok(now);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(label) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(label) {
        return Ok(dt.naive_local());
    }

    let normalized = normalize_label(label);

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, format) {
            return midnight(date, raw);
        }
    }

    // "Oct 12" 形式は今年として扱う
    let with_year = format!("{} {}", normalized, now.year());
    if let Ok(date) = NaiveDate::parse_from_str(&with_year, "%B %d %Y") {
        return midnight(date, raw);
    }

    Err(ScraperError::DateParse(raw.to_string()))
}

fn midnight(date: NaiveDate, raw: &str) -> Result<NaiveDateTime, ScraperError> {
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| ScraperError::DateParse(raw.to_string()))
}

/// "Monday, Sept. 5th, 2024" -> "Sep 5, 2024"
fn normalize_label(label: &str) -> String {
    let cleaned = label.replace('.', "");
    let mut words: Vec<String> = cleaned.split_whitespace().map(normalize_word).collect();

    let leading_weekday = words
        .first()
        .map(|w| WEEKDAYS.contains(&w.trim_end_matches(',').to_lowercase().as_str()))
        .unwrap_or(false);
    if leading_weekday {
        words.remove(0);
    }
    words.join(" ")
}

fn normalize_word(word: &str) -> String {
    let (body, tail) = match word.strip_suffix(',') {
        Some(body) => (body, ","),
        None => (word, ""),
    };

    if body.eq_ignore_ascii_case("sept") {
        return format!("Sep{}", tail);
    }

    // 5th -> 5
    let digits = body.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let suffix = body[digits.len()..].to_ascii_lowercase();
    if !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && ORDINAL_SUFFIXES.contains(&suffix.as_str())
    {
        return format!("{}{}", digits, tail);
    }

    word.to_string()
}
