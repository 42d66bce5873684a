/// Role, permission and grant operations
///
/// Grants are idempotent: assigning a role the user already holds (or
/// granting a permission the role already carries) returns the existing live
/// grant instead of adding a duplicate row. Revoking tombstones the grant
/// row only.

use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::crud;
use crate::db::filter::Filter;
use crate::db::store::{Store, Transaction};
use crate::error::{CoreError, CoreResult};
use crate::models::permission::{NewPermission, Permission, PermissionChanges};
use crate::models::role::{NewRole, Role, RoleChanges};
use crate::models::role_permission::RolePermission;
use crate::models::user::User;
use crate::models::user_role::UserRole;
use crate::models::EntityKind;

#[derive(Debug, Clone)]
pub struct Access<S: Store> {
    store: S,
}

impl<S: Store> Access<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create_role(&self, input: NewRole) -> CoreResult<Role> {
        input.validate()?;
        crud::create(&self.store, Role::new(input)).await
    }

    pub async fn get_role(&self, id: Uuid) -> CoreResult<Role> {
        crud::get(&self.store, id).await
    }

    pub async fn list_roles(&self) -> CoreResult<Vec<Role>> {
        crud::list(&self.store, &Filter::live()).await
    }

    pub async fn find_role_by_name(&self, name: &str) -> CoreResult<Role> {
        let mut tx = self.store.begin().await?;
        tx.select_one::<Role>(&Filter::live().eq("name", name))
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Role, name))
    }

    pub async fn update_role(&self, id: Uuid, changes: RoleChanges) -> CoreResult<Role> {
        changes.validate()?;
        crud::update_with(&self.store, id, |role: &mut Role| role.apply(changes)).await
    }

    /// Tombstones the role; its grants stay but stop contributing permissions
    pub async fn delete_role(&self, id: Uuid) -> CoreResult<Role> {
        crud::delete(&self.store, id).await
    }

    pub async fn create_permission(&self, input: NewPermission) -> CoreResult<Permission> {
        input.validate()?;
        crud::create(&self.store, Permission::new(input)).await
    }

    pub async fn get_permission(&self, id: Uuid) -> CoreResult<Permission> {
        crud::get(&self.store, id).await
    }

    pub async fn list_permissions(&self) -> CoreResult<Vec<Permission>> {
        crud::list(&self.store, &Filter::live()).await
    }

    pub async fn find_permission_by_name(&self, name: &str) -> CoreResult<Permission> {
        let mut tx = self.store.begin().await?;
        tx.select_one::<Permission>(&Filter::live().eq("name", name))
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Permission, name))
    }

    pub async fn update_permission(&self, id: Uuid, changes: PermissionChanges) -> CoreResult<Permission> {
        changes.validate()?;
        crud::update_with(&self.store, id, |permission: &mut Permission| permission.apply(changes)).await
    }

    pub async fn delete_permission(&self, id: Uuid) -> CoreResult<Permission> {
        crud::delete(&self.store, id).await
    }

    /// Grants a live role to a live user
    pub async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> CoreResult<UserRole> {
        let mut tx = self.store.begin().await?;
        tx.fetch_for_update::<User>(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::User, user_id))?;
        tx.fetch::<Role>(role_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Role, role_id))?;

        let existing = tx
            .select_one::<UserRole>(&Filter::live().eq("user_id", user_id).eq("role_id", role_id))
            .await?;
        if let Some(grant) = existing {
            debug!(entity = %EntityKind::UserRole, id = %grant.id, "Grant already present");
            return Ok(grant);
        }

        let grant = tx.insert(&UserRole::new(user_id, role_id)).await?;
        tx.commit().await?;

        info!(entity = %EntityKind::UserRole, id = %grant.id, user_id = %user_id, role_id = %role_id, "Created");
        Ok(grant)
    }

    /// Tombstones a user-role grant
    pub async fn revoke_role(&self, user_role_id: Uuid) -> CoreResult<UserRole> {
        crud::delete(&self.store, user_role_id).await
    }

    pub async fn get_user_role(&self, user_role_id: Uuid) -> CoreResult<UserRole> {
        crud::get(&self.store, user_role_id).await
    }

    /// Live grants of a user
    pub async fn user_roles(&self, user_id: Uuid) -> CoreResult<Vec<UserRole>> {
        crud::list(&self.store, &Filter::live().eq("user_id", user_id)).await
    }

    /// Adds a live permission to a live role
    pub async fn grant_permission(&self, role_id: Uuid, permission_id: Uuid) -> CoreResult<RolePermission> {
        let mut tx = self.store.begin().await?;
        tx.fetch_for_update::<Role>(role_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Role, role_id))?;
        tx.fetch::<Permission>(permission_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Permission, permission_id))?;

        let existing = tx
            .select_one::<RolePermission>(
                &Filter::live()
                    .eq("role_id", role_id)
                    .eq("permission_id", permission_id),
            )
            .await?;
        if let Some(grant) = existing {
            debug!(entity = %EntityKind::RolePermission, id = %grant.id, "Grant already present");
            return Ok(grant);
        }

        let grant = tx.insert(&RolePermission::new(role_id, permission_id)).await?;
        tx.commit().await?;

        info!(
            entity = %EntityKind::RolePermission,
            id = %grant.id,
            role_id = %role_id,
            permission_id = %permission_id,
            "Created"
        );
        Ok(grant)
    }

    /// Tombstones a role-permission grant
    pub async fn revoke_permission(&self, role_permission_id: Uuid) -> CoreResult<RolePermission> {
        crud::delete(&self.store, role_permission_id).await
    }

    /// Live grants of a role
    pub async fn role_permissions(&self, role_id: Uuid) -> CoreResult<Vec<RolePermission>> {
        crud::list(&self.store, &Filter::live().eq("role_id", role_id)).await
    }
}
