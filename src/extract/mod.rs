//! レンダリング済みHTMLから商品レコードを抽出する
//!
//! I/O は一切行わない。フィールドが見つからない場合はエラーにせず
//! [`FieldLookup::Missing`] として扱う。

mod selectors;

pub use self::selectors::{ListingSelectors, SELECTOR_CONTRACT_VERSION};

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::dataset::Record;
use crate::error::ScraperError;
use self::selectors::CompiledSelectors;

/// 1フィールドの探索結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLookup {
    Found(String),
    Missing,
}

impl FieldLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, FieldLookup::Found(_))
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            FieldLookup::Found(value) => Some(value),
            FieldLookup::Missing => None,
        }
    }
}

impl From<Option<String>> for FieldLookup {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldLookup::Missing, FieldLookup::Found)
    }
}

#[derive(Debug, Clone)]
pub struct Extractor {
    selectors: CompiledSelectors,
}

impl Extractor {
    /// デフォルトのセレクタで作成
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_selectors(&ListingSelectors::default())
    }

    pub fn with_selectors(selectors: &ListingSelectors) -> Result<Self, ScraperError> {
        Ok(Self {
            selectors: CompiledSelectors::compile(selectors)?,
        })
    }

    /// HTML全体を解析し、商品カードごとに1件のレコードを返す（DOM順）
    pub fn extract(&self, markup: &str) -> Result<Vec<Record>, ScraperError> {
        if markup.trim().is_empty() {
            return Err(ScraperError::Parse("snapshot markup is empty".into()));
        }

        let document = Html::parse_document(markup);
        if !document.errors.is_empty() {
            debug!("HTML parser recovered from {} errors", document.errors.len());
        }

        let records: Vec<Record> = document
            .select(&self.selectors.item)
            .map(|card| self.extract_record(card))
            .collect();

        info!("Extracted {} product cards", records.len());
        Ok(records)
    }

    fn extract_record(&self, card: ElementRef<'_>) -> Record {
        let s = &self.selectors;

        Record {
            name: text_of(card, &s.title).into_option(),
            subtitle: text_of(card, &s.subtitle).into_option(),
            price: text_of(card, &s.price).into_option(),
            image_url: nested_attr_of(card, &s.image_link, &s.image, "src").into_option(),
            product_link: attr_of(card, &s.detail_link, "href").into_option(),
        }
    }
}

/// テキストノードを個別にtrimして空のものを捨て、連結する
fn text_of(scope: ElementRef<'_>, selector: &Selector) -> FieldLookup {
    match scope.select(selector).next() {
        Some(node) => FieldLookup::Found(
            node.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<String>(),
        ),
        None => FieldLookup::Missing,
    }
}

/// 属性値をそのまま返す。空文字列は欠損扱い
fn attr_of(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> FieldLookup {
    scope
        .select(selector)
        .next()
        .and_then(|node| node.value().attr(attr))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .into()
}

fn nested_attr_of(
    scope: ElementRef<'_>,
    outer: &Selector,
    inner: &Selector,
    attr: &str,
) -> FieldLookup {
    match scope.select(outer).next() {
        Some(container) => attr_of(container, inner, attr),
        None => FieldLookup::Missing,
    }
}
