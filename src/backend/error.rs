use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("battle result I/O failed")]
    Io(#[from] std::io::Error),

    #[error("failed to encode battle result")]
    Serialize(#[from] serde_json::Error),

    #[cfg(feature = "network")]
    #[error("request to ranking backend failed")]
    Http(#[from] reqwest::Error),

    #[error("ranking backend answered with status {0}")]
    Status(u16),

    #[error("ranking backend rejected the result: {0}")]
    Rejected(String),

    #[error("local battle store failed: {0}")]
    Store(String),
}
