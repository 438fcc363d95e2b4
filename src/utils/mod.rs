pub mod error;

pub use error::{AppError, FetchError, FieldMissing, MalformedPriceError, NotifyError, Result};
