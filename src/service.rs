use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::Service;
use tracing::info;

use crate::browser::ChromiumLauncher;
use crate::config::{ScraperConfig, ScrollStrategy};
use crate::dataset::Dataset;
use crate::error::ScraperError;
use crate::extract::Extractor;
use crate::loader::PageLoader;
use crate::traits::SessionLauncher;

/// 収集リクエスト
#[derive(Debug, Clone)]
pub struct HarvestRequest {
    pub url: String,
    pub config: ScraperConfig,
}

impl HarvestRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            config: ScraperConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScraperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn with_scroll_steps(mut self, steps: u32) -> Self {
        self.config.scroll_steps = steps;
        self
    }

    pub fn with_scroll_delay(mut self, delay: Duration) -> Self {
        self.config.scroll_delay = delay;
        self
    }

    pub fn with_scroll_strategy(mut self, strategy: ScrollStrategy) -> Self {
        self.config.scroll_strategy = strategy;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.config.navigation_timeout = timeout;
        self
    }
}

/// tower::Serviceを実装した収集サービス
///
/// 呼び出しごとに独立したブラウザセッションを起動する。
#[derive(Clone)]
pub struct HarvestService<L = ChromiumLauncher> {
    launcher: L,
    extractor: Arc<Extractor>,
}

impl HarvestService<ChromiumLauncher> {
    pub fn new() -> Result<Self, ScraperError> {
        Ok(Self::with_launcher(ChromiumLauncher::new(), Extractor::new()?))
    }
}

impl<L> HarvestService<L>
where
    L: SessionLauncher + Clone + 'static,
{
    pub fn with_launcher(launcher: L, extractor: Extractor) -> Self {
        Self {
            launcher,
            extractor: Arc::new(extractor),
        }
    }
}

impl<L> Service<HarvestRequest> for HarvestService<L>
where
    L: SessionLauncher + Clone + 'static,
{
    type Response = Dataset;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: HarvestRequest) -> Self::Future {
        info!("Harvest request received: url={}", req.url);

        let loader = PageLoader::new(self.launcher.clone(), req.config);
        let extractor = self.extractor.clone();

        Box::pin(async move {
            let snapshot = loader.load(&req.url).await?;
            let records = extractor.extract(&snapshot.html)?;
            let dataset = Dataset::new(snapshot.url, snapshot.captured_at, records);

            info!("Scraped {} products from {}", dataset.len(), dataset.source_url());
            Ok(dataset)
        })
    }
}
