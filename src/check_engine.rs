use metrics::counter;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

use crate::config::CheckerConfig;
use crate::match_filter::MatchFilter;
use crate::models::{ChatId, Listing, NotificationPayload, WatchedProduct, WatchedSite};
use crate::plugins::manager::{PluginManager, SiteExtractorRef};
use crate::plugins::traits::Notifier;
use crate::scraper::PageFetcher;
use crate::store::WatchStore;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct CheckSettings {
    /// Pause between two notification deliveries
    pub pacing: Duration,
    /// Suppress listings already reported by this process. The set of
    /// reported keys lives for the whole process and is never pruned.
    pub deduplicate: bool,
    /// Let a second pass start while one is running
    pub allow_overlap: bool,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(1000),
            deduplicate: false,
            allow_overlap: false,
        }
    }
}

impl From<&CheckerConfig> for CheckSettings {
    fn from(config: &CheckerConfig) -> Self {
        Self {
            pacing: config.pacing().max(Duration::from_millis(1)),
            deduplicate: config.deduplicate,
            allow_overlap: config.allow_overlap,
        }
    }
}

struct RunGuard<'a> {
    active: &'a AtomicUsize,
    _exclusive: Option<MutexGuard<'a, ()>>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs check passes: every (product, site) pair is fetched, extracted and
/// filtered, then each match is handed to the notifier.
pub struct CheckEngine {
    fetcher: Arc<dyn PageFetcher>,
    plugins: PluginManager,
    notifier: Arc<dyn Notifier>,
    settings: CheckSettings,
    run_lock: Mutex<()>,
    active_runs: AtomicUsize,
    reported: Mutex<HashSet<String>>,
}

impl CheckEngine {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        plugins: PluginManager,
        notifier: Arc<dyn Notifier>,
        settings: CheckSettings,
    ) -> Self {
        Self {
            fetcher,
            plugins,
            notifier,
            settings,
            run_lock: Mutex::new(()),
            active_runs: AtomicUsize::new(0),
            reported: Mutex::new(HashSet::new()),
        }
    }

    pub fn settings(&self) -> &CheckSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.active_runs.load(Ordering::SeqCst) > 0
    }

    pub async fn supports_site(&self, site: &str) -> bool {
        self.plugins.has_extractor(site).await
    }

    /// Loads watches and the destination from the store, then runs a pass.
    pub async fn run_from_store(&self, store: &WatchStore) -> Result<Vec<Listing>> {
        let products = store.list_products().await?;
        let sites = store.list_sites().await?;
        let destination = store.chat_id().await?;

        self.run_check(&products, &sites, destination).await
    }

    pub async fn run_check(
        &self,
        products: &[WatchedProduct],
        sites: &[WatchedSite],
        destination: Option<ChatId>,
    ) -> Result<Vec<Listing>> {
        let Some(destination) = destination else {
            tracing::debug!("No notification destination configured, skipping check");
            return Ok(Vec::new());
        };
        if products.is_empty() || sites.is_empty() {
            tracing::debug!(
                "Nothing to check ({} products, {} sites)",
                products.len(),
                sites.len()
            );
            return Ok(Vec::new());
        }

        let _guard = self.begin_run()?;
        let start_time = Instant::now();
        counter!("hunter_checks_total").increment(1);
        tracing::info!(
            "Starting check of {} products across {} sites",
            products.len(),
            sites.len()
        );

        let mut listings = self.collect_listings(products, sites).await;
        if self.settings.deduplicate {
            listings = self.exclude_reported(listings).await;
        }

        tracing::info!(
            "Check finished with {} matches in {}ms",
            listings.len(),
            start_time.elapsed().as_millis()
        );

        self.deliver(destination, &listings).await;
        Ok(listings)
    }

    fn begin_run(&self) -> Result<RunGuard<'_>> {
        let exclusive = if self.settings.allow_overlap {
            None
        } else {
            let lock = self.run_lock.try_lock().map_err(|_| {
                tracing::warn!("Check requested while another one is running");
                AppError::CheckInProgress
            })?;
            Some(lock)
        };

        self.active_runs.fetch_add(1, Ordering::SeqCst);
        Ok(RunGuard {
            active: &self.active_runs,
            _exclusive: exclusive,
        })
    }

    async fn collect_listings(
        &self,
        products: &[WatchedProduct],
        sites: &[WatchedSite],
    ) -> Vec<Listing> {
        let mut listings = Vec::new();

        for product in products {
            for site in sites {
                let Some(extractor) = self.plugins.extractor_for(&site.name).await else {
                    tracing::debug!("No extractor for site '{}', skipping", site.name);
                    continue;
                };

                match self.check_pair(product, site, &extractor).await {
                    Ok(found) => listings.extend(found),
                    Err(e) => {
                        if matches!(e, AppError::Fetch(_)) {
                            counter!("hunter_fetch_failures_total").increment(1);
                        }
                        tracing::warn!(
                            "Check of '{}' on {} failed: {}",
                            product.name,
                            site.name,
                            e
                        );
                    }
                }
            }
        }

        listings
    }

    async fn check_pair(
        &self,
        product: &WatchedProduct,
        site: &WatchedSite,
        extractor: &SiteExtractorRef,
    ) -> Result<Vec<Listing>> {
        let url = extractor.search_url(&product.name)?;
        let html = self.fetcher.fetch(&url).await?;

        let candidates = extractor.extract_listings(&html, &product.name);
        let extracted = candidates.len();
        let matched: Vec<Listing> = MatchFilter::new(product.max_price)
            .apply(candidates)
            .into_iter()
            .map(|candidate| candidate.into_listing(&product.name, &site.name))
            .collect();

        tracing::debug!(
            "'{}' on {}: {} candidates, {} within {}",
            product.name,
            site.name,
            extracted,
            matched.len(),
            product.max_price
        );
        counter!("hunter_listings_matched_total").increment(matched.len() as u64);
        Ok(matched)
    }

    // Marks listings as reported before delivery; a failed send is not retried
    async fn exclude_reported(&self, listings: Vec<Listing>) -> Vec<Listing> {
        let mut reported = self.reported.lock().await;
        let total = listings.len();
        let fresh: Vec<Listing> = listings
            .into_iter()
            .filter(|listing| reported.insert(listing.dedup_key()))
            .collect();

        if fresh.len() < total {
            tracing::debug!("Suppressed {} already reported listings", total - fresh.len());
        }
        fresh
    }

    async fn deliver(&self, destination: ChatId, listings: &[Listing]) {
        for (index, listing) in listings.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.pacing).await;
            }

            let payload = NotificationPayload::from_listing(listing);
            match self.notifier.notify(destination, &payload).await {
                Ok(()) => {
                    counter!("hunter_notifications_sent_total").increment(1);
                }
                Err(e) => {
                    counter!("hunter_notifications_failed_total").increment(1);
                    tracing::error!("Failed to notify about '{}': {}", listing.name, e);
                }
            }
        }
    }
}
