// Site extractor implementations
pub mod ozon;

pub use ozon::OzonExtractor;
