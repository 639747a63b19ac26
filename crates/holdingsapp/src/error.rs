use thiserror::Error;

/// Failures raised by the storage layer.
///
/// Only [`StorageError::CannotDeleteDefault`] is ever propagated by the
/// [`Database`](crate::database::Database) facade; everything else is logged
/// and reported through [`Outcome`](crate::database::Outcome) alongside a
/// safe default value.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage could not be opened: {0}")]
    InitFailure(String),

    #[error("Category '{0}' is built in and cannot be deleted")]
    CannotDeleteDefault(String),

    #[error("Stored record '{key}' is malformed: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl StorageError {
    pub(crate) fn corrupt(key: &str, reason: impl ToString) -> Self {
        StorageError::CorruptRecord {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<confique::Error> for StorageError {
    fn from(err: confique::Error) -> Self {
        StorageError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
