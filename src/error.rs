use thiserror::Error;

/// Failures raised by the response store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("invalid answers payload: {0}")]
    Encoding(#[from] serde_json::Error),
}
