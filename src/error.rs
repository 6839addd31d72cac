//! Error type shared by page setup paths.
//!
//! Missing optional elements are not errors; components model those with
//! `Option` and skip themselves. `PageError` covers the failures that can
//! still happen while wiring a feature whose elements are present.

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("no global window")]
    MissingWindow,
    #[error("window has no document")]
    MissingDocument,
    #[error("failed to listen for {event}: {message}")]
    Listen { event: &'static str, message: String },
    #[error("storage: {0}")]
    Storage(String),
    #[error("invalid page config: {0}")]
    Config(#[from] serde_json::Error),
}
