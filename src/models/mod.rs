use uuid::Uuid;

pub mod listing;
pub mod product;
pub mod site;

// Re-exports for convenience
pub use listing::*;
pub use product::*;
pub use site::*;

/// Chat that receives match notifications.
pub type ChatId = i64;

/// Stable identifier for watched products and sites.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
