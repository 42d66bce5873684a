/// Developer-token authentication middleware for Axum
///
/// Reads `Authorization: Bearer <api_token>`, resolves it to a live, active
/// developer through [`TokenLifecycle::authenticate`] and stores a
/// [`DeveloperContext`] in the request extensions. Failures answer 401 with
/// the envelope body `{"success": false, "message": ...}`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use keyward_shared::auth::middleware::{developer_auth, DeveloperContext};
/// use keyward_shared::auth::tokens::{TokenLifecycle, TokenPolicy};
/// use keyward_shared::db::memory::MemoryStore;
///
/// async fn whoami(Extension(ctx): Extension<DeveloperContext>) -> String {
///     ctx.developer.name
/// }
///
/// let tokens = TokenLifecycle::new(MemoryStore::new(), TokenPolicy::default());
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn_with_state(tokens, developer_auth::<MemoryStore>));
/// ```

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use super::tokens::TokenLifecycle;
use crate::db::store::Store;
use crate::envelope::Envelope;
use crate::error::{CoreError, INTERNAL_ERROR_MESSAGE};
use crate::models::developer::Developer;

/// The authenticated developer, added to request extensions
#[derive(Debug, Clone)]
pub struct DeveloperContext {
    pub developer: Developer,
}

impl DeveloperContext {
    pub fn developer_id(&self) -> Uuid {
        self.developer.id
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// No Authorization header
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    InvalidFormat,

    /// Token unknown, or its developer is deleted or inactive
    InvalidToken,

    /// Token matched but is past its expiry
    Expired,

    /// Store failure while authenticating
    Internal,
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { .. } | CoreError::Validation(_) => AuthError::InvalidToken,
            CoreError::TokenExpired { .. } => AuthError::Expired,
            CoreError::Unexpected(_) => AuthError::Internal,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Authentication token is missing")
            }
            AuthError::InvalidFormat => (StatusCode::UNAUTHORIZED, "Expected Bearer token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            AuthError::Expired => (StatusCode::UNAUTHORIZED, "Token expired"),
            AuthError::Internal => (StatusCode::BAD_REQUEST, INTERNAL_ERROR_MESSAGE),
        };

        let body = Envelope::failure(&CoreError::Validation(message.to_string()));
        (status, Json(body)).into_response()
    }
}

/// Extracts the bearer token from an Authorization header value
pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authenticates the request with a developer API token
pub async fn developer_auth<S: Store>(
    State(tokens): State<TokenLifecycle<S>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = bearer_token(header_value).ok_or(AuthError::InvalidFormat)?;

    let developer = tokens.authenticate(token).await.map_err(|err| {
        err.log("authenticate");
        AuthError::from(err)
    })?;

    req.extensions_mut().insert(DeveloperContext { developer });
    Ok(next.run(req).await)
}
