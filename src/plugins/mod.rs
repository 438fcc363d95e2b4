pub mod manager;
pub mod notifiers;
pub mod sites;
pub mod traits;

pub use manager::PluginManager;
pub use traits::{Notifier, SiteExtractor};
