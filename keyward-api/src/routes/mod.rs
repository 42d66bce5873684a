/// API route handlers
///
/// Every handler answers with an [`Envelope`]. Creation answers 201, every
/// other success 200; failures go through [`crate::error::ApiError`].

pub mod access;
pub mod developers;
pub mod health;
pub mod organizations;
pub mod users;

use axum::{http::StatusCode, Json};
use keyward_shared::envelope::Envelope;

/// A successful handler response
pub type Reply = (StatusCode, Json<Envelope>);

pub(crate) fn ok(envelope: Envelope) -> Reply {
    (StatusCode::OK, Json(envelope))
}

pub(crate) fn created(envelope: Envelope) -> Reply {
    (StatusCode::CREATED, Json(envelope))
}
