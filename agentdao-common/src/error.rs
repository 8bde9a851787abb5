use thiserror::Error;

/// Process-level errors: configuration, IO and wiring failures.
///
/// Governance and payment failures have their own enums in the crates that
/// own them; this type is what binaries and setup code bubble up.
#[derive(Debug, Error)]
pub enum DaoError {
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Other: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DaoError>;
