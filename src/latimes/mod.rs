//! LA Times 検索スクレイパーモジュール
//!
//! フレーズ検索 → 新しい順に並び替え → トピック絞り込み → 期間内の記事を
//! ページ送りしながら抽出する

mod scraper;
pub mod selectors;
mod types;

pub use scraper::{parse_page_counter, title_case, LaTimesScraper};
pub use types::{ArticleRecord, SearchCriteria};
