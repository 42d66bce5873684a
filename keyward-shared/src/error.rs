/// Operation-boundary errors
///
/// Every core operation returns [`CoreResult`]. Storage errors, validation
/// failures and token checks are all folded into the four kinds below before
/// they leave the core; the façade only ever maps a [`ErrorKind`] to a
/// status code.
///
/// # Example
///
/// ```
/// use keyward_shared::error::{CoreError, ErrorKind};
/// use keyward_shared::models::EntityKind;
/// use uuid::Uuid;
///
/// let err = CoreError::not_found(EntityKind::Organization, Uuid::nil());
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert_eq!(
///     err.to_string(),
///     "Organization with id 00000000-0000-0000-0000-000000000000 does not exist or is deleted"
/// );
///
/// let err = CoreError::Unexpected("connection reset by peer".to_string());
/// assert_eq!(err.public_message(), "Internal Server Error");
/// ```

use std::fmt;
use tracing::{error, warn};
use uuid::Uuid;

use crate::db::store::StoreError;
use crate::models::EntityKind;

/// Message shown to callers in place of any unexpected failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Error kinds visible outside the core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    TokenExpired,
    Unexpected,
}

/// Errors returned by core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The entity is absent or tombstoned
    #[error("{kind} with id {id} does not exist or is deleted")]
    NotFound { kind: EntityKind, id: String },

    /// Input rejected (missing fields, bad format, uniqueness)
    #[error("{0}")]
    Validation(String),

    /// The id+token pair matched but the token is past its expiry
    #[error("API token of developer {developer_id} has expired")]
    TokenExpired { developer_id: Uuid },

    /// Anything else; the detail is logged, never shown
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl CoreError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::TokenExpired { .. } => ErrorKind::TokenExpired,
            CoreError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Message safe to return to a caller
    pub fn public_message(&self) -> String {
        match self {
            CoreError::Unexpected(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Logs the error at a level matching its kind
    pub fn log(&self, operation: &str) {
        match self {
            CoreError::NotFound { kind, id } => {
                warn!(operation, entity = %kind, id = %id, "Entity not found");
            }
            CoreError::Validation(message) => {
                warn!(operation, error = %message, "Validation failed");
            }
            CoreError::TokenExpired { developer_id } => {
                warn!(operation, entity = "Developer", id = %developer_id, "API token expired");
            }
            CoreError::Unexpected(detail) => {
                error!(operation, error = %detail, "Unexpected failure");
            }
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { kind, field } => {
                CoreError::Validation(format!("{kind} with this {field} already exists"))
            }
            StoreError::ForeignKeyViolation { kind, .. } => {
                CoreError::Validation(format!("{kind} references a missing parent entity"))
            }
            other => CoreError::Unexpected(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "is invalid".to_string());
                    format!("{field}: {message}")
                })
            })
            .collect();
        messages.sort();

        CoreError::Validation(messages.join("; "))
    }
}
