//! ナビゲーション → ネットワークアイドル待機 → スクロール → HTML取得

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::{LoadError, ScraperError};
use crate::scroll::ScrollDriver;
use crate::traits::{PageSession, SessionLauncher};

/// 取得時点のレンダリング済みHTML
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
    pub captured_at: DateTime<Utc>,
}

/// 起動済みセッションを保持する。
///
/// `release` を経ずにドロップされた場合（外側のタイムアウトで `load` が
/// 破棄された場合など）は、バックグラウンドタスクで `close` を実行する。
struct SessionGuard<S: PageSession + 'static> {
    session: Option<S>,
}

impl<S: PageSession + 'static> SessionGuard<S> {
    fn new(session: S) -> Self {
        Self {
            session: Some(session),
        }
    }

    fn get(&self) -> Result<&S, ScraperError> {
        self.session
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("Browser session already released".into()))
    }

    async fn release(mut self) -> Result<(), ScraperError> {
        match self.session.take() {
            Some(mut session) => session.close().await,
            None => Ok(()),
        }
    }
}

impl<S: PageSession + 'static> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        warn!("Page load cancelled, releasing browser session in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        warn!("Failed to release cancelled browser session: {}", e);
                    }
                });
            }
            // ランタイム外では同期的なドロップ処理に任せる
            Err(_) => debug!("No runtime available, dropping browser session"),
        }
    }
}

pub struct PageLoader<L> {
    launcher: L,
    config: ScraperConfig,
    scroll: ScrollDriver,
}

impl<L: SessionLauncher> PageLoader<L> {
    pub fn new(launcher: L, config: ScraperConfig) -> Self {
        let scroll = ScrollDriver::from_config(&config);
        Self {
            launcher,
            config,
            scroll,
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// セッションを起動してページを読み込み、スナップショットを返す
    ///
    /// 成功・失敗に関わらず、起動したセッションは必ず閉じる。
    /// 呼び出し側がこの future を途中で破棄した場合も同様。
    pub async fn load(&self, url: &str) -> Result<PageSnapshot, ScraperError> {
        let guard = SessionGuard::new(self.launcher.launch(&self.config).await?);

        let result = match guard.get() {
            Ok(session) => self.load_with(session, url).await,
            Err(e) => Err(e),
        };

        match (guard.release().await, &result) {
            (Err(e), Ok(_)) => warn!("Failed to release browser session: {}", e),
            (Err(e), Err(_)) => warn!("Failed to release browser session after error: {}", e),
            (Ok(()), _) => {}
        }

        result
    }

    async fn load_with(
        &self,
        session: &L::Session,
        url: &str,
    ) -> Result<PageSnapshot, ScraperError> {
        let nav_timeout = self.config.navigation_timeout;
        timeout(nav_timeout, session.goto(url))
            .await
            .map_err(|_| {
                LoadError::timeout(format!("navigation to {} exceeded {:?}", url, nav_timeout))
            })??;

        let idle_timeout = self.config.network_idle_timeout;
        timeout(idle_timeout, session.wait_for_network_idle())
            .await
            .map_err(|_| {
                LoadError::timeout(format!("network did not become idle within {:?}", idle_timeout))
            })??;

        self.scroll.drive(session).await?;

        let html = session.content().await?;
        info!("Captured {} bytes of markup from {}", html.len(), url);

        Ok(PageSnapshot {
            url: url.to_string(),
            html,
            captured_at: Utc::now(),
        })
    }
}
