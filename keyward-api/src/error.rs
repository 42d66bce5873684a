/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`. Every failure is rendered as the
/// envelope `{"success": false, "message": ...}` with a status chosen by
/// error kind:
///
/// | kind                         | status |
/// |------------------------------|--------|
/// | NotFound                     | 404    |
/// | Validation / malformed input | 400    |
/// | TokenExpired                 | 401    |
/// | missing permission           | 403    |
/// | Unexpected                   | 400, generic message |
///
/// # Example
///
/// ```
/// use axum::response::IntoResponse;
/// use axum::http::StatusCode;
/// use keyward_api::error::ApiError;
/// use keyward_shared::error::CoreError;
/// use keyward_shared::models::EntityKind;
/// use uuid::Uuid;
///
/// let err = ApiError::from(CoreError::not_found(EntityKind::Developer, Uuid::nil()));
/// assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keyward_shared::auth::authorization::AuthzError;
use keyward_shared::envelope::Envelope;
use keyward_shared::error::{CoreError, ErrorKind};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A core operation failed
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The request body or path could not be parsed (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The user lacks an application permission (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::TokenExpired => StatusCode::UNAUTHORIZED,
                ErrorKind::Unexpected => StatusCode::BAD_REQUEST,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let envelope = match self {
            ApiError::Core(err) => {
                err.log("request");
                Envelope::failure(&err)
            }
            ApiError::BadRequest(message) => {
                tracing::warn!(error = %message, "Malformed request");
                Envelope::failure(&CoreError::Validation(message))
            }
            ApiError::Forbidden(message) => {
                Envelope::failure(&CoreError::Validation(message))
            }
        };

        (status, Json(envelope)).into_response()
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden { permission, .. } => {
                ApiError::Forbidden(format!("Missing permission: {}", permission))
            }
            AuthzError::Core(err) => ApiError::Core(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
