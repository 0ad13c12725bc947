use thiserror::Error;

pub type Result<T> = std::result::Result<T, SettlementError>;

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Escrow status is '{current}', cannot {action}.")]
    PreconditionFailed {
        current: String,
        action: &'static str,
    },
    /// A commit was rejected because one of its version guards went stale.
    /// Retried by the engine; never surfaced to callers directly.
    #[error("commit conflict on {0} record")]
    Conflict(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl SettlementError {
    /// HTTP-equivalent status for the response envelope. Anything that is
    /// not a caller error maps to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::NotFound(_) => 404,
            Self::PreconditionFailed { .. } => 409,
            _ => 500,
        }
    }
}
