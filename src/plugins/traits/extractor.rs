use url::Url;

use crate::models::ListingCandidate;
use crate::utils::error::Result;

/// Site-specific knowledge: where to search and how to read the results.
pub trait SiteExtractor: Send + Sync {
    /// Site identifier this extractor serves, e.g. `ozon.ru`.
    fn site(&self) -> &str;

    fn search_url(&self, query: &str) -> Result<Url>;

    /// Candidates whose names contain `query`, at most ten, in page order.
    fn extract_listings(&self, html: &str, query: &str) -> Vec<ListingCandidate>;
}
