//! Typed errors for the backup pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schedule error: {0}")]
    Schedule(String),

    #[error("Discovery query failed: {0}")]
    Discovery(#[from] sqlx::Error),

    #[error("Dump of {unit} failed: {message}")]
    Dump { unit: String, message: String },

    #[error("Replication of {path} failed: {message}")]
    Replication { path: String, message: String },

    #[error("Transaction cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BackupError>;
