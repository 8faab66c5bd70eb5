use thiserror::Error;

pub type Result<T> = std::result::Result<T, TombolaError>;

#[derive(Error, Debug)]
pub enum TombolaError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid draw state: {0}")]
    InvalidState(String),

    #[error("Value for key '{key}' is {size} bytes, store limit is {limit}")]
    CapacityExceeded {
        key: String,
        size: usize,
        limit: usize,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Dialog error: {0}")]
    Dialog(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TombolaError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn dialog(msg: impl Into<String>) -> Self {
        Self::Dialog(msg.into())
    }
}

// conversion from dialoguer::Error
impl From<dialoguer::Error> for TombolaError {
    fn from(err: dialoguer::Error) -> Self {
        TombolaError::Dialog(err.to_string())
    }
}
