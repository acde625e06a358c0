//! テスト用のスタブセッション

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::ScraperConfig;
use crate::error::{LoadError, ScraperError};
use crate::traits::{PageSession, SessionLauncher};

/// スタブの振る舞い
#[derive(Debug, Clone, Default)]
pub struct StubBehavior {
    pub html: String,
    /// 各ステップ後に返すページ高さ。尽きたら最後の値を繰り返す
    pub heights: Vec<u64>,
    pub hang_on_goto: bool,
    pub hang_on_network_idle: bool,
    pub navigation_error: bool,
    pub fail_scroll_at: Option<u32>,
    pub fail_launch: bool,
}

/// スタブ呼び出しの記録
#[derive(Debug, Default)]
pub struct StubCalls {
    pub launches: AtomicU32,
    pub gotos: AtomicU32,
    pub scrolls: AtomicU32,
    pub closes: AtomicU32,
    pub closed: AtomicBool,
    pub deltas: Mutex<Vec<f64>>,
}

pub struct StubSession {
    behavior: StubBehavior,
    calls: Arc<StubCalls>,
}

impl StubSession {
    pub fn new(behavior: StubBehavior) -> (Self, Arc<StubCalls>) {
        let calls = Arc::new(StubCalls::default());
        (
            Self {
                behavior,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl PageSession for StubSession {
    async fn goto(&self, _url: &str) -> Result<(), ScraperError> {
        self.calls.gotos.fetch_add(1, Ordering::SeqCst);
        if self.behavior.hang_on_goto {
            std::future::pending::<()>().await;
        }
        if self.behavior.navigation_error {
            return Err(LoadError::navigation("net::ERR_NAME_NOT_RESOLVED").into());
        }
        Ok(())
    }

    async fn wait_for_network_idle(&self) -> Result<(), ScraperError> {
        if self.behavior.hang_on_network_idle {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn scroll_by(&self, delta_y: f64) -> Result<(), ScraperError> {
        let step = self.calls.scrolls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.behavior.fail_scroll_at == Some(step) {
            return Err(ScraperError::Automation("mouse wheel rejected".into()));
        }
        self.calls
            .deltas
            .lock()
            .map_err(|e| ScraperError::Automation(e.to_string()))?
            .push(delta_y);
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, ScraperError> {
        let step = self.calls.scrolls.load(Ordering::SeqCst) as usize;
        let heights = &self.behavior.heights;
        Ok(heights
            .get(step.saturating_sub(1))
            .or_else(|| heights.last())
            .copied()
            .unwrap_or(0))
    }

    async fn content(&self) -> Result<String, ScraperError> {
        Ok(self.behavior.html.clone())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        self.calls.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// 起動のたびに同じ [`StubCalls`] を共有するランチャー
#[derive(Clone)]
pub struct StubLauncher {
    behavior: StubBehavior,
    pub calls: Arc<StubCalls>,
}

impl StubLauncher {
    pub fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(StubCalls::default()),
        }
    }
}

#[async_trait]
impl SessionLauncher for StubLauncher {
    type Session = StubSession;

    async fn launch(&self, _config: &ScraperConfig) -> Result<StubSession, ScraperError> {
        self.calls.launches.fetch_add(1, Ordering::SeqCst);
        if self.behavior.fail_launch {
            return Err(ScraperError::BrowserInit("chromium not found".into()));
        }
        Ok(StubSession {
            behavior: self.behavior.clone(),
            calls: self.calls.clone(),
        })
    }
}
