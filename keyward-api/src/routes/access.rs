/// Role and permission endpoints
///
/// Roles and permissions form one shared catalogue across developers.
///
/// # Endpoints
///
/// - `POST|GET /v1/roles`, `GET|PUT|DELETE /v1/roles/:id`
/// - `POST|GET /v1/roles/:id/permissions` - Grant / list grants
/// - `DELETE /v1/role-permissions/:id` - Revoke a grant
/// - `POST|GET /v1/permissions`, `GET|PUT|DELETE /v1/permissions/:id`

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
        permission::{NewPermission, PermissionChanges},
        role::{NewRole, RoleChanges},
        view::Audience,
    },
};
use serde::Deserialize;
use uuid::Uuid;

/// Permission grant request
#[derive(Debug, Deserialize)]
pub struct GrantPermissionRequest {
    pub permission_id: Uuid,
}

pub async fn create_role<S: Store>(
    State(state): State<AppState<S>>,
    Body(input): Body<NewRole>,
) -> ApiResult<Reply> {
    let role = state.services.access.create_role(input).await?;
    Ok(created(Envelope::entity(&role, Audience::Admin)))
}

pub async fn list_roles<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Reply> {
    let roles = state.services.access.list_roles().await?;
    Ok(ok(Envelope::list(&roles, Audience::Admin)))
}

pub async fn get_role<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let role = state.services.access.get_role(id).await?;
    Ok(ok(Envelope::entity(&role, Audience::Admin)))
}

pub async fn update_role<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
    Body(changes): Body<RoleChanges>,
) -> ApiResult<Reply> {
    let role = state.services.access.update_role(id, changes).await?;
    Ok(ok(Envelope::entity(&role, Audience::Admin)))
}

/// Soft-delete a role; users holding it lose its permissions at once
pub async fn delete_role<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let role = state.services.access.delete_role(id).await?;
    Ok(ok(Envelope::entity(&role, Audience::Admin).with_message("Role deleted")))
}

/// Grant a permission to a role; idempotent
pub async fn grant_permission<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
    Body(request): Body<GrantPermissionRequest>,
) -> ApiResult<Reply> {
    let grant = state
        .services
        .access
        .grant_permission(id, request.permission_id)
        .await?;
    Ok(created(Envelope::entity(&grant, Audience::Admin)))
}

pub async fn role_permissions<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    state.services.access.get_role(id).await?;
    let grants = state.services.access.role_permissions(id).await?;
    Ok(ok(Envelope::list(&grants, Audience::Admin)))
}

pub async fn revoke_permission<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let grant = state.services.access.revoke_permission(id).await?;
    Ok(ok(
        Envelope::entity(&grant, Audience::Admin).with_message("Permission revoked"),
    ))
}

pub async fn create_permission<S: Store>(
    State(state): State<AppState<S>>,
    Body(input): Body<NewPermission>,
) -> ApiResult<Reply> {
    let permission = state.services.access.create_permission(input).await?;
    Ok(created(Envelope::entity(&permission, Audience::Admin)))
}

pub async fn list_permissions<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Reply> {
    let permissions = state.services.access.list_permissions().await?;
    Ok(ok(Envelope::list(&permissions, Audience::Admin)))
}

pub async fn get_permission<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let permission = state.services.access.get_permission(id).await?;
    Ok(ok(Envelope::entity(&permission, Audience::Admin)))
}

pub async fn update_permission<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
    Body(changes): Body<PermissionChanges>,
) -> ApiResult<Reply> {
    let permission = state.services.access.update_permission(id, changes).await?;
    Ok(ok(Envelope::entity(&permission, Audience::Admin)))
}

pub async fn delete_permission<S: Store>(
    State(state): State<AppState<S>>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let permission = state.services.access.delete_permission(id).await?;
    Ok(ok(
        Envelope::entity(&permission, Audience::Admin).with_message("Permission deleted"),
    ))
}
