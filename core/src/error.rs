use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Invalid profile: history must contain at least one amount")]
    InvalidProfile,

    #[error("Transaction '{id}' not found")]
    TransactionNotFound { id: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
