/// Developer endpoints
///
/// # Endpoints
///
/// - `POST /v1/developers/:id/validate-token` - Check a developer's API token
/// - `POST /v1/developers` - Create developer under an organization
/// - `GET /v1/developers` - List live developers
/// - `GET /v1/developers/:id` - Get developer
/// - `PUT /v1/developers/:id` - Update name / active flag
/// - `DELETE /v1/developers/:id` - Soft-delete developer
/// - `POST /v1/developers/:id/regenerate-token` - Replace the API token
/// - `POST /v1/developers/:id/session-token` - Issue session token
/// - `DELETE /v1/developers/:id/session-token` - Revoke session token
/// - `POST /v1/developers/:id/session-token/rotate` - Rotate session token
/// - `GET /v1/developers/:id/organizations` - Live organizations of the developer
/// - `POST /v1/developers/:id/organizations` - Attach to an organization
/// - `DELETE /v1/developers/:id/organizations/:organization_id` - Detach

use super::{created, ok, Reply};
use crate::{
    app::AppState,
    error::ApiResult,
    extract::{Body, PathParams},
};
use axum::{extract::State, Extension};
use keyward_shared::{
    auth::middleware::DeveloperContext,
    db::store::Store,
    envelope::Envelope,
    models::{
        developer::{DeveloperChanges, NewDeveloper},
        developer_organization::NewDeveloperOrganization,
        view::Audience,
    },
};
use serde::Deserialize;
use uuid::Uuid;

/// Only the developer itself sees its `api_token`
fn audience_for(ctx: &DeveloperContext, developer_id: Uuid) -> Audience {
    if ctx.developer_id() == developer_id {
        Audience::Admin
    } else {
        Audience::Public
    }
}

/// Token validation request
#[derive(Debug, Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
}

/// Attach request; the developer comes from the path
#[derive(Debug, Deserialize)]
pub struct AttachRequest {
    pub organization_id: Uuid,

    #[serde(default)]
    pub role: Option<String>,
}

/// Validate a developer API token
///
/// ```text
/// POST /v1/developers/:id/validate-token
/// { "token": "3f0c..." }
/// ```
///
/// 200 with the public developer view when id and token match; 404 when they
/// do not (including a token that was regenerated away); 401 when the token
/// matched but has expired.
pub async fn validate_token<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
    Body(request): Body<ValidateTokenRequest>,
) -> ApiResult<Reply> {
    let developer = state.services.tokens.validate(id, &request.token).await?;
    Ok(ok(
        Envelope::entity(&developer, Audience::Public).with_message("Token is valid"),
    ))
}

/// Create developer
///
/// ```text
/// POST /v1/developers
/// { "organization_id": "...", "name": "svc1", "role": "owner" }
/// ```
///
/// The response is the only admin view that carries the generated
/// `api_token` before any regeneration.
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Body(input): Body<NewDeveloper>,
) -> ApiResult<Reply> {
    let developer = state.services.developers.create(input).await?;
    Ok(created(Envelope::entity(&developer, Audience::Admin)))
}

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
) -> ApiResult<Reply> {
    let developers = state.services.developers.list().await?;
    Ok(ok(Envelope::list_with(&developers, |d| audience_for(&ctx, d.id))))
}

pub async fn get<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let developer = state.services.developers.get(id).await?;
    Ok(ok(Envelope::entity(&developer, audience_for(&ctx, id))))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
    Body(changes): Body<DeveloperChanges>,
) -> ApiResult<Reply> {
    let developer = state.services.developers.update(id, changes).await?;
    Ok(ok(Envelope::entity(&developer, audience_for(&ctx, id))))
}

pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let developer = state.services.developers.delete(id).await?;
    Ok(ok(
        Envelope::entity(&developer, audience_for(&ctx, id)).with_message("Developer deleted"),
    ))
}

/// Regenerate API token
///
/// The previous token stops validating immediately.
pub async fn regenerate_token<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let developer = state.services.tokens.regenerate(id).await?;
    Ok(ok(
        Envelope::entity(&developer, Audience::Admin).with_message("API token regenerated"),
    ))
}

pub async fn issue_session<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let token = state.services.tokens.issue_session(id).await?;
    Ok(created(Envelope::entity(&token, Audience::Admin)))
}

pub async fn rotate_session<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let token = state.services.tokens.rotate_session(id).await?;
    Ok(ok(Envelope::entity(&token, Audience::Admin)))
}

pub async fn revoke_session<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let token = state.services.tokens.revoke_session(id).await?;
    Ok(ok(
        Envelope::entity(&token, Audience::Public).with_message("Session token revoked"),
    ))
}

pub async fn organizations<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let organizations = state.services.developers.organizations(id).await?;
    Ok(ok(Envelope::list(&organizations, Audience::Admin)))
}

pub async fn attach<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
    Body(request): Body<AttachRequest>,
) -> ApiResult<Reply> {
    let membership = state
        .services
        .developers
        .attach(NewDeveloperOrganization {
            developer_id: id,
            organization_id: request.organization_id,
            role: request.role,
        })
        .await?;
    Ok(created(Envelope::entity(&membership, Audience::Admin)))
}

pub async fn detach<S: Store>(
    State(state): State<AppState<S>>,
    PathParams((id, organization_id)): PathParams<(Uuid, Uuid)>,
) -> ApiResult<Reply> {
    let membership = state.services.developers.detach(id, organization_id).await?;
    Ok(ok(
        Envelope::entity(&membership, Audience::Admin).with_message("Developer detached"),
    ))
}
