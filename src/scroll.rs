//! 遅延読み込みを発火させるためのスクロール処理

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::{ScraperConfig, ScrollStrategy};
use crate::error::ScraperError;
use crate::traits::PageSession;

/// 一定量のホイールスクロールと待機を繰り返す
///
/// 各ステップは逐次実行され、待機は `tokio::time::sleep` で行う。
#[derive(Debug, Clone)]
pub struct ScrollDriver {
    steps: u32,
    delay: Duration,
    delta_pixels: f64,
    strategy: ScrollStrategy,
}

impl Default for ScrollDriver {
    fn default() -> Self {
        Self::from_config(&ScraperConfig::default())
    }
}

impl ScrollDriver {
    pub fn new(steps: u32, delay: Duration, delta_pixels: f64) -> Self {
        Self {
            steps,
            delay,
            delta_pixels,
            strategy: ScrollStrategy::Fixed,
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            steps: config.scroll_steps,
            delay: config.scroll_delay,
            delta_pixels: config.scroll_delta_pixels,
            strategy: config.scroll_strategy,
        }
    }

    pub fn with_strategy(mut self, strategy: ScrollStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// スクロールを実行し、実際に行ったステップ数を返す
    pub async fn drive<S>(&self, page: &S) -> Result<u32, ScraperError>
    where
        S: PageSession + ?Sized,
    {
        info!(
            "Scrolling: up to {} steps of {}px every {:?} ({:?})",
            self.steps, self.delta_pixels, self.delay, self.strategy
        );

        let performed = match self.strategy {
            ScrollStrategy::Fixed => {
                for step in 1..=self.steps {
                    self.step(page, step).await?;
                }
                self.steps
            }
            ScrollStrategy::UntilStable { stable_steps } => {
                self.drive_until_stable(page, stable_steps).await?
            }
        };

        info!("Scrolling finished after {} steps", performed);
        Ok(performed)
    }

    async fn step<S>(&self, page: &S, step: u32) -> Result<(), ScraperError>
    where
        S: PageSession + ?Sized,
    {
        page.scroll_by(self.delta_pixels).await?;
        debug!("Scroll step {}/{}", step, self.steps);
        sleep(self.delay).await;
        Ok(())
    }

    async fn drive_until_stable<S>(&self, page: &S, stable_steps: u32) -> Result<u32, ScraperError>
    where
        S: PageSession + ?Sized,
    {
        let mut last_height = page.scroll_height().await?;
        let mut unchanged = 0;

        for step in 1..=self.steps {
            self.step(page, step).await?;

            let height = page.scroll_height().await?;
            if height == last_height {
                unchanged += 1;
                if unchanged >= stable_steps {
                    debug!("Page height stable at {}px for {} steps", height, unchanged);
                    return Ok(step);
                }
            } else {
                unchanged = 0;
                last_height = height;
            }
        }

        Ok(self.steps)
    }
}
