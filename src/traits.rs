use async_trait::async_trait;

use crate::config::ScraperConfig;
use crate::error::ScraperError;

/// 1つのページを操作するブラウザセッション
#[async_trait]
pub trait PageSession: Send + Sync {
    /// URLへ移動（ロード完了まで待機）
    async fn goto(&self, url: &str) -> Result<(), ScraperError>;

    /// ネットワークがアイドルになるまで待機
    ///
    /// 上限時間は呼び出し側が課す。
    async fn wait_for_network_idle(&self) -> Result<(), ScraperError>;

    /// マウスホイールで下方向にスクロール
    async fn scroll_by(&self, delta_y: f64) -> Result<(), ScraperError>;

    /// 現在のドキュメント高さ
    async fn scroll_height(&self) -> Result<u64, ScraperError>;

    /// レンダリング済みHTML全体
    async fn content(&self) -> Result<String, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;
}

/// セッションの取得
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: PageSession + 'static;

    async fn launch(&self, config: &ScraperConfig) -> Result<Self::Session, ScraperError>;
}
