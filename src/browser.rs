//! chromiumoxide によるセッション実装

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::{LoadError, ScraperError};
use crate::network::NetworkWatch;
use crate::traits::{PageSession, SessionLauncher};

/// ネットワークアイドル判定のインターバル（ミリ秒）
const NETWORK_IDLE_CHECK_INTERVAL_MS: u64 = 100;
/// 実行中リクエスト0件がこの時間続けばアイドル（ミリ秒）
const NETWORK_QUIET_WINDOW_MS: u64 = 500;

/// セッション専用のユーザーデータディレクトリ。ドロップ時に削除する
#[derive(Debug)]
struct ProfileDir(PathBuf);

impl ProfileDir {
    fn new(path: PathBuf) -> Self {
        Self(path)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ProfileDir {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.0) {
                debug!("Failed to remove {:?}: {}", self.0, e);
            }
        }
    }
}

/// Chromium を起動して [`ChromiumSession`] を返す
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher;

impl ChromiumLauncher {
    pub fn new() -> Self {
        Self
    }

    fn chrome_executable(config: &ScraperConfig) -> Option<PathBuf> {
        config.chrome_executable.clone().or_else(|| {
            std::env::var("CHROME_PATH")
                .or_else(|_| std::env::var("CHROMIUM_PATH"))
                .ok()
                .map(PathBuf::from)
        })
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self, config: &ScraperConfig) -> Result<ChromiumSession, ScraperError> {
        info!("Launching browser...");

        // セッションごとにユーザーデータディレクトリを分ける
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let profile = ProfileDir::new(
            std::env::temp_dir().join(format!("listing-harvester-{}", unique_id)),
        );

        let (width, height) = config.window_size;
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .window_size(width, height)
            .request_timeout(config.navigation_timeout);

        if let Some(path) = Self::chrome_executable(config) {
            debug!("Using chrome executable {:?}", path);
            builder = builder.chrome_executable(path);
        }

        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        let browser_config = builder.build().map_err(ScraperError::BrowserInit)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ブラウザイベントハンドラをバックグラウンドで実行
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser event error: {:?}", e);
                }
            }
        });

        let mut session = ChromiumSession {
            browser: Some(browser),
            page: None,
            network: None,
            handler: Some(handler_task),
            profile: Some(profile),
            viewport: (f64::from(width) / 2.0, f64::from(height) / 2.0),
        };

        let new_page = match session.browser_ref()?.new_page("about:blank").await {
            Ok(page) => Ok(page),
            Err(e) => Err(ScraperError::BrowserInit(e.to_string())),
        };
        // ナビゲーション前に購読しないと最初のリクエストを取りこぼす
        let attached = match new_page {
            Ok(page) => NetworkWatch::attach(&page).await.map(|watch| (page, watch)),
            Err(e) => Err(e),
        };
        match attached {
            Ok((page, watch)) => {
                session.page = Some(page);
                session.network = Some(watch);
            }
            Err(e) => {
                // 起動済みのブラウザは必ず閉じる
                if let Err(close_err) = session.close().await {
                    warn!("Failed to release browser after init error: {}", close_err);
                }
                return Err(e);
            }
        }

        info!("Browser launched");
        Ok(session)
    }
}

/// 1回の収集で専有するブラウザプロセスとページ
pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    network: Option<NetworkWatch>,
    handler: Option<JoinHandle<()>>,
    profile: Option<ProfileDir>,
    /// ホイールイベントを送る座標（ビューポート中央）
    viewport: (f64, f64),
}

impl ChromiumSession {
    fn browser_ref(&self) -> Result<&Browser, ScraperError> {
        self.browser
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("Browser already closed".into()))
    }

    fn page(&self) -> Result<&Page, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("Page not initialized".into()))
    }

    fn network(&self) -> Result<&NetworkWatch, ScraperError> {
        self.network
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("Network watch not attached".into()))
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        let page = self.page()?;
        info!("Navigating to {}", url);

        match page.goto(url).await {
            Ok(_) => Ok(()),
            Err(CdpError::Timeout) => {
                Err(LoadError::timeout(format!("navigation to {} timed out", url)).into())
            }
            Err(e) => Err(LoadError::navigation(e.to_string()).into()),
        }
    }

    async fn wait_for_network_idle(&self) -> Result<(), ScraperError> {
        let page = self.page()?;
        let network = self.network()?;
        info!("Waiting for network to become idle...");
        let start = std::time::Instant::now();
        let quiet = Duration::from_millis(NETWORK_QUIET_WINDOW_MS);

        loop {
            let ready = match page.evaluate("document.readyState === 'complete'").await {
                Ok(val) => val.into_value::<bool>().unwrap_or(false),
                Err(e) => {
                    debug!("readyState check error: {}", e);
                    false
                }
            };

            if ready && network.is_idle(quiet) {
                info!("Network idle after {:?}", start.elapsed());
                return Ok(());
            }
            debug!("{} requests in flight", network.in_flight());

            sleep(Duration::from_millis(NETWORK_IDLE_CHECK_INTERVAL_MS)).await;
        }
    }

    async fn scroll_by(&self, delta_y: f64) -> Result<(), ScraperError> {
        let page = self.page()?;
        let (x, y) = self.viewport;

        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(x)
            .y(y)
            .delta_x(0.0)
            .delta_y(delta_y)
            .build()
            .map_err(ScraperError::Automation)?;

        page.execute(params)
            .await
            .map_err(|e| ScraperError::Automation(format!("mouse wheel: {}", e)))?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, ScraperError> {
        self.page()?
            .evaluate("document.documentElement.scrollHeight")
            .await
            .map_err(|e| ScraperError::Automation(e.to_string()))?
            .into_value::<u64>()
            .map_err(|e| ScraperError::Automation(format!("scrollHeight: {}", e)))
    }

    async fn content(&self) -> Result<String, ScraperError> {
        self.page()?
            .content()
            .await
            .map_err(|e| ScraperError::Automation(format!("page content: {}", e)))
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        info!("Closing browser...");

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }

        let mut result = Ok(());
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                result = Err(ScraperError::Automation(format!("browser close: {}", e)));
            }
            if let Err(e) = browser.wait().await {
                debug!("Failed to wait for browser process: {}", e);
            }
        }

        self.network = None;
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        self.profile = None;

        info!("Browser closed");
        result
    }
}

/// `close` を経ずに破棄された場合（呼び出し側のキャンセルなど）の後始末
impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.network = None;
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        // プロセスを止めてからプロファイルを消す
        self.page = None;
        self.browser = None;
        self.profile = None;
    }
}
