// Shared fixtures for the integration tests

pub mod bot_tests;
pub mod check_cycle_tests;
pub mod store_tests;
pub mod web_tests;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

use bargain_hunter::{
    config::SitesConfig,
    utils::error::{FetchError, NotifyError},
    ChatId, CheckEngine, CheckSettings, NotificationPayload, Notifier, PageFetcher,
    PluginManager, WatchStore,
};

pub const OZON_SEARCH_PAGE: &str = include_str!("../fixtures/ozon_search.html");

/// Serves one canned document for every URL and remembers what was asked.
pub struct FakeFetcher {
    body: Option<String>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn serving(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Every fetch fails with a 503.
    pub fn failing() -> Self {
        Self {
            body: None,
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        match &self.body {
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            }),
        }
    }
}

/// Keeps every delivered payload instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(ChatId, NotificationPayload)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(ChatId, NotificationPayload)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        destination: ChatId,
        payload: &NotificationPayload,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((destination, payload.clone()));
        Ok(())
    }
}

pub fn test_settings() -> CheckSettings {
    CheckSettings {
        pacing: Duration::from_millis(1),
        deduplicate: false,
        allow_overlap: false,
    }
}

pub async fn ozon_plugins(base_url: &str) -> PluginManager {
    let plugins = PluginManager::new();
    plugins
        .initialize_default_plugins(&SitesConfig {
            ozon_base_url: base_url.to_string(),
        })
        .await
        .expect("default plugins register");
    plugins
}

pub async fn create_test_engine(
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn Notifier>,
    settings: CheckSettings,
) -> Arc<CheckEngine> {
    Arc::new(CheckEngine::new(
        fetcher,
        ozon_plugins("https://www.ozon.ru").await,
        notifier,
        settings,
    ))
}

pub async fn create_test_store() -> (TempDir, Arc<WatchStore>) {
    let dir = TempDir::new().expect("temp dir");
    let store = WatchStore::open(dir.path()).await.expect("store opens");
    (dir, Arc::new(store))
}
