use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code the record store uses for a record that no longer exists.
/// The only code the engine distinguishes.
pub const NOT_FOUND_CODE: &str = "404";

/// Failure payload returned by every record-store operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{category}/{code}: {message}")]
pub struct ClientError {
    pub code: String,
    pub category: String,
    pub message: String,
}

impl ClientError {
    pub fn new(
        code: impl Into<String>,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            category: category.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(NOT_FOUND_CODE, "ResourceNotFound", message)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == NOT_FOUND_CODE
    }
}

pub type ApiResult<T> = Result<T, ClientError>;
