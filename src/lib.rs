//! 商品リスト収集ライブラリ
//!
//! - 無限スクロールのカテゴリページをChromiumで読み込み、遅延読み込みを発火させる
//! - レンダリング済みHTMLから商品カードを抽出し、固定列の表データにする
//!
//! # 使用例
//!
//! ```rust,ignore
//! use listing_harvester::{export, HarvestRequest, HarvestService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = HarvestService::new().unwrap();
//!
//!     let request = HarvestRequest::new("https://www.nike.com/lu/en/w/football-shoes-1gdj0zy7ok")
//!         .with_scroll_steps(20)
//!         .with_headless(true);
//!
//!     let dataset = service.call(request).await.unwrap();
//!     println!("Scraped {} products", dataset.len());
//!     export::save_csv(&dataset, export::DEFAULT_EXPORT_FILE_NAME).unwrap();
//! }
//! ```

pub mod browser;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod extract;
pub mod loader;
mod network;
pub mod scroll;
pub mod service;
pub mod traits;

#[cfg(test)]
mod testing;

// 主要な型をリエクスポート
pub use browser::{ChromiumLauncher, ChromiumSession};
pub use config::{ScraperConfig, ScrollStrategy};
pub use dataset::{Dataset, Record, COLUMNS};
pub use error::{LoadError, LoadErrorKind, ScraperError};
pub use extract::{Extractor, FieldLookup, ListingSelectors};
pub use loader::{PageLoader, PageSnapshot};
pub use scroll::ScrollDriver;
pub use service::{HarvestRequest, HarvestService};
pub use traits::{PageSession, SessionLauncher};
