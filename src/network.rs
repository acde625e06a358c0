//! CDPのネットワークイベントから実行中のリクエストを追跡する

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::Page;
use futures::{stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::ScraperError;

/// 実行中のリクエストと最後に変化があった時刻
#[derive(Debug)]
pub(crate) struct NetworkActivity {
    in_flight: HashSet<String>,
    last_change: Instant,
}

impl NetworkActivity {
    pub fn new(now: Instant) -> Self {
        Self {
            in_flight: HashSet::new(),
            last_change: now,
        }
    }

    /// リダイレクトでは同じIDが再送されるため、集合で重複を吸収する
    pub fn request_started(&mut self, request_id: String, now: Instant) {
        self.in_flight.insert(request_id);
        self.last_change = now;
    }

    pub fn request_done(&mut self, request_id: &str, now: Instant) {
        if self.in_flight.remove(request_id) {
            self.last_change = now;
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// 実行中のリクエストが0件のまま `quiet` 以上経過していればアイドル
    pub fn is_idle(&self, now: Instant, quiet: Duration) -> bool {
        self.in_flight.is_empty() && now.saturating_duration_since(self.last_change) >= quiet
    }
}

enum NetworkEvent {
    Started(String),
    Done(String),
}

/// ページのネットワークイベント購読。タスクはドロップ時に止まる
pub(crate) struct NetworkWatch {
    activity: Arc<Mutex<NetworkActivity>>,
    task: JoinHandle<()>,
}

impl NetworkWatch {
    pub async fn attach(page: &Page) -> Result<Self, ScraperError> {
        page.execute(EnableParams::default())
            .await
            .map_err(|e| ScraperError::BrowserInit(format!("Network.enable: {}", e)))?;

        let listen_err = |e: chromiumoxide::error::CdpError| {
            ScraperError::BrowserInit(format!("network listener: {}", e))
        };
        let started = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(listen_err)?
            .map(|e| NetworkEvent::Started(e.request_id.inner().clone()));
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(listen_err)?
            .map(|e| NetworkEvent::Done(e.request_id.inner().clone()));
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(listen_err)?
            .map(|e| NetworkEvent::Done(e.request_id.inner().clone()));

        let activity = Arc::new(Mutex::new(NetworkActivity::new(Instant::now())));
        let shared = activity.clone();
        let task = tokio::spawn(async move {
            let mut events = Box::pin(stream::select(started, stream::select(finished, failed)));
            while let Some(event) = events.next().await {
                let now = Instant::now();
                let mut activity = lock(&shared);
                match event {
                    NetworkEvent::Started(id) => activity.request_started(id, now),
                    NetworkEvent::Done(id) => activity.request_done(&id, now),
                }
            }
            debug!("Network event stream ended");
        });

        Ok(Self { activity, task })
    }

    pub fn is_idle(&self, quiet: Duration) -> bool {
        lock(&self.activity).is_idle(Instant::now(), quiet)
    }

    pub fn in_flight(&self) -> usize {
        lock(&self.activity).in_flight()
    }
}

impl Drop for NetworkWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn lock(activity: &Mutex<NetworkActivity>) -> MutexGuard<'_, NetworkActivity> {
    activity.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(500);

    #[test]
    fn test_pending_request_is_not_idle() {
        let t0 = Instant::now();
        let mut activity = NetworkActivity::new(t0);
        activity.request_started("xhr-1".into(), t0);

        // 長時間のXHRが終わらない限りアイドルにならない
        assert!(!activity.is_idle(t0 + Duration::from_secs(30), QUIET));
        assert_eq!(activity.in_flight(), 1);
    }

    #[test]
    fn test_idle_after_quiet_window() {
        let t0 = Instant::now();
        let mut activity = NetworkActivity::new(t0);
        activity.request_started("doc".into(), t0);
        activity.request_done("doc", t0 + Duration::from_millis(200));

        assert!(!activity.is_idle(t0 + Duration::from_millis(600), QUIET));
        assert!(activity.is_idle(t0 + Duration::from_millis(700), QUIET));
    }

    #[test]
    fn test_new_request_restarts_quiet_window() {
        let t0 = Instant::now();
        let mut activity = NetworkActivity::new(t0);
        activity.request_started("a".into(), t0);
        activity.request_done("a", t0);
        activity.request_started("b".into(), t0 + Duration::from_millis(400));
        activity.request_done("b", t0 + Duration::from_millis(450));

        assert!(!activity.is_idle(t0 + Duration::from_millis(600), QUIET));
        assert!(activity.is_idle(t0 + Duration::from_millis(950), QUIET));
    }

    #[test]
    fn test_redirect_counts_once() {
        let t0 = Instant::now();
        let mut activity = NetworkActivity::new(t0);
        activity.request_started("r".into(), t0);
        activity.request_started("r".into(), t0);
        assert_eq!(activity.in_flight(), 1);

        activity.request_done("r", t0);
        assert_eq!(activity.in_flight(), 0);
    }

    #[test]
    fn test_unknown_completion_is_ignored() {
        let t0 = Instant::now();
        let mut activity = NetworkActivity::new(t0);
        activity.request_done("never-started", t0 + Duration::from_secs(1));

        assert!(activity.is_idle(t0 + Duration::from_millis(500), QUIET));
    }
}
