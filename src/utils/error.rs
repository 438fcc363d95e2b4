use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("A check is already in progress")]
    CheckInProgress,

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

impl From<tokio_cron_scheduler::JobSchedulerError> for AppError {
    fn from(err: tokio_cron_scheduler::JobSchedulerError) -> Self {
        AppError::Scheduler(format!("{:?}", err))
    }
}

/// Failure to retrieve a search-results document. Isolated per (product, site) pair.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
}

/// Price text that does not reduce to a non-negative decimal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed price: '{raw}'")]
pub struct MalformedPriceError {
    pub raw: String,
}

/// A required listing field that no selector in its chain could resolve.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Field not found: {field}")]
pub struct FieldMissing {
    pub field: &'static str,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API rejected the request: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
