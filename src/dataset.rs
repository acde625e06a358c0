//! 収集結果の表形式データ

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 列の並び順（固定）
pub const COLUMNS: [&str; 5] = ["Name", "Subtitle", "Price", "Image URL", "Product Link"];

/// 商品カード1件分
///
/// どのフィールドも欠損し得る。全フィールドが欠損していてもレコードは残す。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Subtitle")]
    pub subtitle: Option<String>,
    /// 表示用の価格文字列（数値化しない）
    #[serde(rename = "Price")]
    pub price: Option<String>,
    #[serde(rename = "Image URL")]
    pub image_url: Option<String>,
    #[serde(rename = "Product Link")]
    pub product_link: Option<String>,
}

impl Record {
    /// `COLUMNS` の順で値を返す。欠損は空文字列
    pub fn row(&self) -> [&str; 5] {
        [
            self.name.as_deref().unwrap_or_default(),
            self.subtitle.as_deref().unwrap_or_default(),
            self.price.as_deref().unwrap_or_default(),
            self.image_url.as_deref().unwrap_or_default(),
            self.product_link.as_deref().unwrap_or_default(),
        ]
    }
}

/// 1回の収集で得たレコード列（DOM順、重複排除・並べ替えなし）
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    source_url: String,
    captured_at: DateTime<Utc>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(source_url: impl Into<String>, captured_at: DateTime<Utc>, records: Vec<Record>) -> Self {
        Self {
            source_url: source_url.into(),
            captured_at,
            records,
        }
    }

    pub fn columns(&self) -> [&'static str; 5] {
        COLUMNS
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = [&str; 5]> + '_ {
        self.records.iter().map(Record::row)
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> Record {
        Record {
            name: Some(name.to_string()),
            price: Some("€99.99".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_column_order_is_fixed() {
        let empty = Dataset::new("https://shop/c", Utc::now(), Vec::new());
        let full = Dataset::new("https://shop/c", Utc::now(), vec![record("a"), Record::default()]);

        let expected = ["Name", "Subtitle", "Price", "Image URL", "Product Link"];
        assert_eq!(empty.columns(), expected);
        assert_eq!(full.columns(), expected);
    }

    #[test]
    fn test_rows_keep_order_and_blank_missing_values() {
        let dataset = Dataset::new(
            "https://shop/c",
            Utc::now(),
            vec![record("first"), Record::default(), record("third")],
        );

        let rows: Vec<[&str; 5]> = dataset.rows().collect();
        assert_eq!(dataset.len(), 3);
        assert_eq!(rows[0], ["first", "", "€99.99", "", ""]);
        assert_eq!(rows[1], ["", "", "", "", ""]);
        assert_eq!(rows[2][0], "third");
    }

    #[test]
    fn test_json_uses_column_names() {
        let dataset = Dataset::new("https://shop/c", Utc::now(), vec![record("a")]);
        let json: serde_json::Value = serde_json::from_str(&dataset.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json[0]["Name"], "a");
        assert!(json[0]["Image URL"].is_null());
    }
}
