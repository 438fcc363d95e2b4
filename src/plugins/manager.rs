use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::sites::OzonExtractor;
use super::traits::SiteExtractor;
use crate::config::SitesConfig;
use crate::utils::error::AppError;

pub type SiteExtractorRef = Arc<dyn SiteExtractor>;

/// Registry of site extractors keyed by site identifier.
#[derive(Clone)]
pub struct PluginManager {
    extractors: Arc<RwLock<HashMap<String, SiteExtractorRef>>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            extractors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a site extractor, replacing any previous one for the same site
    pub async fn register_extractor(&self, extractor: SiteExtractorRef) {
        let site = extractor.site().to_string();
        tracing::debug!("Registering extractor for {}", site);

        let mut extractors = self.extractors.write().await;
        extractors.insert(site, extractor);
    }

    pub async fn has_extractor(&self, site: &str) -> bool {
        let extractors = self.extractors.read().await;
        extractors.contains_key(site)
    }

    /// List all supported site identifiers
    pub async fn list_sites(&self) -> Vec<String> {
        let extractors = self.extractors.read().await;
        let mut sites: Vec<String> = extractors.keys().cloned().collect();
        sites.sort();
        sites
    }

    pub async fn extractor_for(&self, site: &str) -> Option<SiteExtractorRef> {
        let extractors = self.extractors.read().await;
        extractors.get(site).cloned()
    }

    /// Initialize all built-in extractors
    pub async fn initialize_default_plugins(&self, sites: &SitesConfig) -> Result<(), AppError> {
        self.register_extractor(Arc::new(OzonExtractor::new(&sites.ozon_base_url)?))
            .await;
        Ok(())
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
