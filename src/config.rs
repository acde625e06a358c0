use std::path::PathBuf;
use std::time::Duration;

/// スクロール終了条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollStrategy {
    /// 常に `scroll_steps` 回スクロールする
    #[default]
    Fixed,
    /// ページの高さが `stable_steps` 回連続で変化しなければ早期終了する。
    /// `scroll_steps` は上限として残る。
    UntilStable { stable_steps: u32 },
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub scroll_steps: u32,
    pub scroll_delay: Duration,
    pub scroll_delta_pixels: f64,
    pub scroll_strategy: ScrollStrategy,
    pub navigation_timeout: Duration,
    pub network_idle_timeout: Duration,
    pub headless: bool,
    pub window_size: (u32, u32),
    pub chrome_executable: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            scroll_steps: 50,
            scroll_delay: Duration::from_millis(1500),
            scroll_delta_pixels: 5000.0,
            scroll_strategy: ScrollStrategy::Fixed,
            navigation_timeout: Duration::from_secs(60),
            network_idle_timeout: Duration::from_secs(30),
            headless: true,
            window_size: (1280, 800),
            chrome_executable: None,
        }
    }
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scroll_steps(mut self, steps: u32) -> Self {
        self.scroll_steps = steps;
        self
    }

    pub fn with_scroll_delay(mut self, delay: Duration) -> Self {
        self.scroll_delay = delay;
        self
    }

    pub fn with_scroll_delta_pixels(mut self, delta: f64) -> Self {
        self.scroll_delta_pixels = delta;
        self
    }

    pub fn with_scroll_strategy(mut self, strategy: ScrollStrategy) -> Self {
        self.scroll_strategy = strategy;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_network_idle_timeout(mut self, timeout: Duration) -> Self {
        self.network_idle_timeout = timeout;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }
}
