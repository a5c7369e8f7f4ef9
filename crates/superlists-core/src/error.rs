use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuperListsError {
    /// A required handle or parameter was missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An expected structural element is absent from the page.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Derived state could not be brought back in line with the page.
    #[error("Inconsistent state: {0}")]
    Inconsistent(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SuperListsError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}
