/// User endpoints
///
/// Users belong to the developer whose token authenticated the request.
/// Another developer's user answers 404, the same as a missing one.
///
/// # Endpoints
///
/// - `POST /v1/users` - Create user
/// - `GET /v1/users` - List the caller's live users
/// - `POST /v1/users/verify-credentials` - Check email/password
/// - `GET|PUT|DELETE /v1/users/:id` - Read, update, soft-delete
/// - `GET|POST|PUT|DELETE /v1/users/:id/profile` - Profile
/// - `GET /v1/users/:id/permissions` - Effective permissions
/// - `GET /v1/users/:id/permissions/:name` - Single permission check
/// - `GET /v1/users/:id/authorize/:name` - Permission gate (403 when missing)
/// - `GET|POST /v1/users/:id/roles` - Granted roles / grant a role
/// - `DELETE /v1/user-roles/:id` - Revoke a role grant

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
        user::{NewUser, UserChanges},
        user_profile::{NewUserProfile, UserProfileChanges},
        view::Audience,
    },
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Credential check request
#[derive(Debug, Deserialize)]
pub struct VerifyCredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Role grant request
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: Uuid,
}

/// Create user
///
/// ```text
/// POST /v1/users
/// { "email": "ada@example.com", "password": "correct horse", "is_staff": false }
/// ```
///
/// The password is stored as an Argon2id hash and never rendered.
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    Body(input): Body<NewUser>,
) -> ApiResult<Reply> {
    let user = state.services.users.create(ctx.developer_id(), input).await?;
    Ok(created(Envelope::entity(&user, Audience::Admin)))
}

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
) -> ApiResult<Reply> {
    let users = state.services.users.list_for_developer(ctx.developer_id()).await?;
    Ok(ok(Envelope::list(&users, Audience::Admin)))
}

pub async fn get<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let user = state.services.users.get(ctx.developer_id(), id).await?;
    Ok(ok(Envelope::entity(&user, Audience::Admin)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
    Body(changes): Body<UserChanges>,
) -> ApiResult<Reply> {
    let user = state.services.users.update(ctx.developer_id(), id, changes).await?;
    Ok(ok(Envelope::entity(&user, Audience::Admin)))
}

pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let user = state.services.users.delete(ctx.developer_id(), id).await?;
    Ok(ok(Envelope::entity(&user, Audience::Admin).with_message("User deleted")))
}

/// Verify user credentials
///
/// Answers 200 with the user when the pair is valid and 404 otherwise. No
/// session is created.
pub async fn verify_credentials<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    Body(request): Body<VerifyCredentialsRequest>,
) -> ApiResult<Reply> {
    let user = state
        .services
        .users
        .verify_credentials(ctx.developer_id(), &request.email, &request.password)
        .await?;
    Ok(ok(
        Envelope::entity(&user, Audience::Public).with_message("Credentials are valid"),
    ))
}

pub async fn get_profile<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let profile = state.services.users.profile(ctx.developer_id(), id).await?;
    Ok(ok(Envelope::entity(&profile, Audience::Admin)))
}

pub async fn create_profile<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
    Body(input): Body<NewUserProfile>,
) -> ApiResult<Reply> {
    let profile = state
        .services
        .users
        .create_profile(ctx.developer_id(), id, input)
        .await?;
    Ok(created(Envelope::entity(&profile, Audience::Admin)))
}

pub async fn update_profile<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
    Body(changes): Body<UserProfileChanges>,
) -> ApiResult<Reply> {
    let profile = state
        .services
        .users
        .update_profile(ctx.developer_id(), id, changes)
        .await?;
    Ok(ok(Envelope::entity(&profile, Audience::Admin)))
}

pub async fn delete_profile<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let profile = state.services.users.delete_profile(ctx.developer_id(), id).await?;
    Ok(ok(
        Envelope::entity(&profile, Audience::Admin).with_message("Profile deleted"),
    ))
}

/// Effective permissions of a user
///
/// The union of the permissions of every live role granted to the user,
/// skipping tombstoned grants, roles and permissions.
pub async fn permissions<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    state.services.users.get(ctx.developer_id(), id).await?;
    let permissions = state.services.authorizer.effective_permissions(id).await?;
    Ok(ok(Envelope::list(&permissions.permissions(), Audience::Admin)))
}

/// Single permission check
///
/// ```json
/// { "success": true, "permission": { "name": "manage_orgs", "granted": true } }
/// ```
pub async fn has_permission<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams((id, name)): PathParams<(Uuid, String)>,
) -> ApiResult<Reply> {
    state.services.users.get(ctx.developer_id(), id).await?;
    let granted = state.services.authorizer.has_permission(id, &name).await?;
    Ok(ok(Envelope::ok(
        "permission",
        json!({ "name": name, "granted": granted }),
    )))
}

/// Permission gate for application resources
///
/// 200 when the user holds the permission through a live path, 403 with
/// `Missing permission: <name>` otherwise.
pub async fn authorize<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams((id, name)): PathParams<(Uuid, String)>,
) -> ApiResult<Reply> {
    state.services.users.get(ctx.developer_id(), id).await?;
    state.services.authorizer.require_permission(id, &name).await?;
    Ok(ok(Envelope::acknowledged("Permission granted")))
}

pub async fn roles<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    state.services.users.get(ctx.developer_id(), id).await?;
    let roles = state.services.authorizer.roles_for_user(id).await?;
    Ok(ok(Envelope::list(&roles, Audience::Admin)))
}

/// Grant a role; granting an already-held role returns the existing grant
pub async fn assign_role<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
    Body(request): Body<AssignRoleRequest>,
) -> ApiResult<Reply> {
    state.services.users.get(ctx.developer_id(), id).await?;
    let grant = state.services.access.assign_role(id, request.role_id).await?;
    Ok(created(Envelope::entity(&grant, Audience::Admin)))
}

pub async fn revoke_role<S: Store>(
    State(state): State<AppState<S>>,
    Extension(ctx): Extension<DeveloperContext>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Reply> {
    let grant = state.services.access.get_user_role(id).await?;
    state.services.users.get(ctx.developer_id(), grant.user_id).await?;
    let revoked = state.services.access.revoke_role(id).await?;
    Ok(ok(
        Envelope::entity(&revoked, Audience::Admin).with_message("Role revoked"),
    ))
}
