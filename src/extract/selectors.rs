//! 対象サイトのマークアップに依存するセレクタ定義
//!
//! サイト側の構造が変わったらここだけを更新し、`SELECTOR_CONTRACT_VERSION` を上げる。

use scraper::Selector;

use crate::error::ScraperError;

pub const SELECTOR_CONTRACT_VERSION: u32 = 1;

/// 商品カードと各フィールドのCSSセレクタ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSelectors {
    /// 商品カード1枚
    pub item: String,
    pub title: String,
    pub subtitle: String,
    pub price: String,
    /// 画像を包むリンク。画像そのものは `image` で内側を探す
    pub image_link: String,
    pub image: String,
    pub detail_link: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            item: r#"div[data-testid="product-card"]"#.to_string(),
            title: "div.product-card__title".to_string(),
            subtitle: "div.product-card__subtitle".to_string(),
            price: r#"div[data-testid="product-price"]"#.to_string(),
            image_link: r#"a[data-testid="product-card__img-link-overlay"]"#.to_string(),
            image: "img".to_string(),
            detail_link: r#"a[data-testid="product-card__link-overlay"]"#.to_string(),
        }
    }
}

/// コンパイル済みセレクタ
#[derive(Debug, Clone)]
pub(crate) struct CompiledSelectors {
    pub item: Selector,
    pub title: Selector,
    pub subtitle: Selector,
    pub price: Selector,
    pub image_link: Selector,
    pub image: Selector,
    pub detail_link: Selector,
}

impl CompiledSelectors {
    pub fn compile(selectors: &ListingSelectors) -> Result<Self, ScraperError> {
        Ok(Self {
            item: compile("item", &selectors.item)?,
            title: compile("title", &selectors.title)?,
            subtitle: compile("subtitle", &selectors.subtitle)?,
            price: compile("price", &selectors.price)?,
            image_link: compile("image_link", &selectors.image_link)?,
            image: compile("image", &selectors.image)?,
            detail_link: compile("detail_link", &selectors.detail_link)?,
        })
    }
}

fn compile(field: &str, selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector)
        .map_err(|e| ScraperError::Parse(format!("invalid {} selector '{}': {}", field, selector, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_contract_compiles() {
        assert!(CompiledSelectors::compile(&ListingSelectors::default()).is_ok());
    }

    #[test]
    fn test_invalid_selector_is_parse_error() {
        let selectors = ListingSelectors {
            price: "div[[".to_string(),
            ..Default::default()
        };
        let err = CompiledSelectors::compile(&selectors).unwrap_err();
        match err {
            ScraperError::Parse(msg) => assert!(msg.contains("price")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
