pub mod bot;
pub mod check_engine;
pub mod config;
pub mod element_finder;
pub mod match_filter;
pub mod models;
pub mod plugins;
pub mod price_normalizer;
pub mod scheduler;
pub mod scraper;
pub mod store;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use check_engine::{CheckEngine, CheckSettings};
pub use config::AppConfig;
pub use element_finder::{DropReason, ListingExtractor, SearchPage, MAX_CONTAINERS};
pub use match_filter::MatchFilter;
pub use models::{ChatId, Listing, ListingCandidate, NotificationPayload, WatchedProduct, WatchedSite};
pub use plugins::{Notifier, PluginManager, SiteExtractor};
pub use price_normalizer::PriceNormalizer;
pub use scheduler::{CheckScheduler, SchedulerStats};
pub use scraper::{HttpFetcher, PageFetcher};
pub use store::WatchStore;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
