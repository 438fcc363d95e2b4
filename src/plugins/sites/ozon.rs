use url::Url;

use crate::element_finder::{
    parse_selector, FieldChain, FieldStrategy, ListingExtractor, SearchPage, SiteLayout,
};
use crate::models::ListingCandidate;
use crate::plugins::traits::SiteExtractor;
use crate::utils::error::Result;

pub const OZON_SITE: &str = "ozon.ru";

pub struct OzonExtractor {
    extractor: ListingExtractor,
}

impl OzonExtractor {
    pub fn new(base_url: &str) -> Result<Self> {
        let origin = Url::parse(base_url)?;
        Ok(Self {
            extractor: ListingExtractor::new(Self::layout()?, origin),
        })
    }

    fn layout() -> Result<SiteLayout> {
        Ok(SiteLayout {
            containers: vec![
                parse_selector("div.tile-root")?,
                parse_selector("div.widget-search-result-container")?,
            ],
            name: FieldChain::new(vec![
                FieldStrategy::text("a.tile-hover-target")?,
                FieldStrategy::text("span.tsBody500Medium")?,
            ]),
            price: FieldChain::new(vec![
                FieldStrategy::text("span.tsHeadline500Medium")?,
                FieldStrategy::text("span.c3118-a0")?,
            ]),
            link: FieldChain::new(vec![FieldStrategy::attr("a[href]", "href")?]),
            image: FieldChain::new(vec![
                FieldStrategy::attr("img[src]", "src")?,
                FieldStrategy::attr("img[data-src]", "data-src")?,
            ]),
        })
    }
}

impl SiteExtractor for OzonExtractor {
    fn site(&self) -> &str {
        OZON_SITE
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        let mut url = self.extractor.origin().join("/search/")?;
        url.query_pairs_mut().append_pair("text", query);
        Ok(url)
    }

    fn extract_listings(&self, html: &str, query: &str) -> Vec<ListingCandidate> {
        let page = SearchPage::parse(html);
        self.extractor.extract(&page, query).collect()
    }
}
