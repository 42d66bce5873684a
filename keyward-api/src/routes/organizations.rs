/// Organization endpoints
///
/// # Endpoints
///
/// - `POST /v1/organizations` - Create organization
/// - `GET /v1/organizations` - List live organizations
/// - `GET /v1/organizations/:id` - Get organization
/// - `PUT /v1/organizations/:id` - Rename organization
/// - `DELETE /v1/organizations/:id` - Soft-delete organization

use super::{created, ok, Reply};
use crate::{
    app::AppState,
    error::ApiResult,
    extract::{Body, PathParams},
};
use axum::extract::State;
use keyward_shared::{
    db::store::Store,
    envelope::Envelope,
    models::{
        organization::{NewOrganization, OrganizationChanges},
        view::Audience,
    },
};
use uuid::Uuid;

/// Create organization
///
/// ```text
/// POST /v1/organizations
/// { "name": "Acme" }
/// ```
///
/// 201 with `{"success": true, "organization": {...}}`; a taken name is 400.
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Body(input): Body<NewOrganization>,
) -> ApiResult<Reply> {
    let organization = state.services.organizations.create(input).await?;
    Ok(created(Envelope::entity(&organization, Audience::Admin)))
}

pub async fn list<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Reply> {
    let organizations = state.services.organizations.list().await?;
    Ok(ok(Envelope::list(&organizations, Audience::Admin)))
}

pub async fn get<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let organization = state.services.organizations.get(id).await?;
    Ok(ok(Envelope::entity(&organization, Audience::Admin)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
    Body(changes): Body<OrganizationChanges>,
) -> ApiResult<Reply> {
    let organization = state.services.organizations.update(id, changes).await?;
    Ok(ok(Envelope::entity(&organization, Audience::Admin)))
}

pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let organization = state.services.organizations.delete(id).await?;
    Ok(ok(
        Envelope::entity(&organization, Audience::Admin).with_message("Organization deleted"),
    ))
}
