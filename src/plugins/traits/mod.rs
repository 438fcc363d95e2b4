pub mod extractor;
pub mod notifier;

pub use extractor::SiteExtractor;
pub use notifier::Notifier;

#[cfg(test)]
pub use notifier::MockNotifier;
