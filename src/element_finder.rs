//! Layout-heuristic extraction of listing candidates from a search-results page.
//!
//! Result pages change markup often, so every field is described as an ordered
//! chain of [`FieldStrategy`] values tried until one yields a non-empty value.
//! A container that cannot produce a name, a price and a link is dropped on its
//! own; its siblings are unaffected.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use url::Url;

use crate::models::ListingCandidate;
use crate::price_normalizer::PriceNormalizer;
use crate::utils::error::{AppError, FieldMissing, MalformedPriceError, Result};

/// Upper bound on containers inspected per page.
pub const MAX_CONTAINERS: usize = 10;

pub fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// One way of reading a field out of a container.
#[derive(Debug, Clone)]
pub enum FieldStrategy {
    /// Trimmed text of the first matching element that has any.
    Text(Selector),
    /// First non-empty value of `attr` among elements matching the selector.
    Attr { selector: Selector, attr: &'static str },
}

impl FieldStrategy {
    pub fn text(css: &str) -> Result<Self> {
        Ok(Self::Text(parse_selector(css)?))
    }

    pub fn attr(css: &str, attr: &'static str) -> Result<Self> {
        Ok(Self::Attr {
            selector: parse_selector(css)?,
            attr,
        })
    }

    fn resolve(&self, scope: ElementRef<'_>) -> Option<String> {
        match self {
            Self::Text(selector) => scope.select(selector).find_map(|element| {
                let text = element
                    .text()
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                (!text.is_empty()).then_some(text)
            }),
            Self::Attr { selector, attr } => scope.select(selector).find_map(|element| {
                element
                    .value()
                    .attr(attr)
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            }),
        }
    }
}

/// Ordered fallbacks for a single field.
#[derive(Debug, Clone, Default)]
pub struct FieldChain {
    strategies: Vec<FieldStrategy>,
}

impl FieldChain {
    pub fn new(strategies: Vec<FieldStrategy>) -> Self {
        Self { strategies }
    }

    pub fn resolve(&self, scope: ElementRef<'_>) -> Option<String> {
        self.resolve_map(scope, |value| Some(value.to_string()))
    }

    /// Like [`FieldChain::resolve`], but a strategy only counts when `accept`
    /// turns its value into something usable.
    pub fn resolve_map<T>(
        &self,
        scope: ElementRef<'_>,
        accept: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        self.strategies
            .iter()
            .filter_map(|strategy| strategy.resolve(scope))
            .find_map(|value| accept(&value))
    }
}

/// Selectors describing one site's results markup.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    /// Item container selectors, in priority order.
    pub containers: Vec<Selector>,
    pub name: FieldChain,
    pub price: FieldChain,
    pub link: FieldChain,
    pub image: FieldChain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingField {
    Name,
    Price,
    Link,
}

impl ListingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Link => "link",
        }
    }

    fn missing(self) -> DropReason {
        DropReason::Missing(FieldMissing {
            field: self.as_str(),
        })
    }
}

/// Why a container did not become a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    Missing(FieldMissing),
    NameMismatch { name: String },
    MalformedPrice(MalformedPriceError),
    InvalidLink { href: String },
}

impl DropReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Missing(_) => "field_missing",
            Self::NameMismatch { .. } => "name_mismatch",
            Self::MalformedPrice(_) => "malformed_price",
            Self::InvalidLink { .. } => "invalid_link",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(err) => write!(f, "{}", err),
            Self::NameMismatch { name } => write!(f, "name '{}' does not match the query", name),
            Self::MalformedPrice(err) => write!(f, "{}", err),
            Self::InvalidLink { href } => write!(f, "link '{}' is not a web URL", href),
        }
    }
}

/// A parsed results document.
pub struct SearchPage {
    document: Html,
}

impl SearchPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }
}

pub struct ListingExtractor {
    layout: SiteLayout,
    origin: Url,
    normalizer: PriceNormalizer,
}

impl ListingExtractor {
    pub fn new(layout: SiteLayout, origin: Url) -> Self {
        Self {
            layout,
            origin,
            normalizer: PriceNormalizer::new(),
        }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Containers from the first selector that matches anything, capped at
    /// [`MAX_CONTAINERS`] in document order.
    pub fn containers<'a>(&self, page: &'a SearchPage) -> Vec<ElementRef<'a>> {
        self.layout
            .containers
            .iter()
            .map(|selector| {
                page.document
                    .select(selector)
                    .take(MAX_CONTAINERS)
                    .collect::<Vec<_>>()
            })
            .find(|items| !items.is_empty())
            .unwrap_or_default()
    }

    pub fn extract<'a>(
        &'a self,
        page: &'a SearchPage,
        query: &'a str,
    ) -> impl Iterator<Item = ListingCandidate> + 'a {
        self.extract_at(page, query, Utc::now())
    }

    /// Extraction with an explicit capture time; identical inputs give identical output.
    pub fn extract_at<'a>(
        &'a self,
        page: &'a SearchPage,
        query: &'a str,
        captured_at: DateTime<Utc>,
    ) -> impl Iterator<Item = ListingCandidate> + 'a {
        self.containers(page).into_iter().filter_map(move |item| {
            match self.resolve_candidate(item, query, captured_at) {
                Ok(candidate) => Some(candidate),
                Err(reason) => {
                    tracing::trace!("Dropped container: {}", reason);
                    metrics::counter!("hunter_candidates_dropped_total", "reason" => reason.label())
                        .increment(1);
                    None
                }
            }
        })
    }

    pub fn resolve_candidate(
        &self,
        item: ElementRef<'_>,
        query: &str,
        captured_at: DateTime<Utc>,
    ) -> std::result::Result<ListingCandidate, DropReason> {
        let name = self
            .layout
            .name
            .resolve(item)
            .ok_or_else(|| ListingField::Name.missing())?;
        if !name.to_lowercase().contains(&query.to_lowercase()) {
            return Err(DropReason::NameMismatch { name });
        }

        let price_text = self
            .layout
            .price
            .resolve(item)
            .ok_or_else(|| ListingField::Price.missing())?;
        let price = self
            .normalizer
            .normalize(&price_text)
            .map_err(DropReason::MalformedPrice)?;

        let link = match self.layout.link.resolve_map(item, |href| self.absolutize(href)) {
            Some(link) => link,
            None => {
                return Err(match self.layout.link.resolve(item) {
                    Some(href) => DropReason::InvalidLink { href },
                    None => ListingField::Link.missing(),
                });
            }
        };

        let image = self.layout.image.resolve_map(item, |src| self.absolutize(src));

        Ok(ListingCandidate {
            name,
            price,
            link,
            image,
            found_at: captured_at,
        })
    }

    /// Resolves relative references against the site origin. Protocol-relative
    /// references always become https. Anything that is not http(s) afterwards
    /// is rejected.
    fn absolutize(&self, reference: &str) -> Option<String> {
        let url = match reference.strip_prefix("//") {
            Some(rest) => Url::parse(&format!("https://{}", rest)).ok()?,
            None => self.origin.join(reference).ok()?,
        };
        matches!(url.scheme(), "http" | "https").then(|| url.to_string())
    }
}
