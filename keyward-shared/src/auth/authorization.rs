/// Authorization engine
///
/// A user's effective permissions are the union, over the user's live
/// [`UserRole`] grants, of the live [`Role`]s they point at, of those roles'
/// live [`RolePermission`] grants, of the live [`Permission`]s those point
/// at. A tombstone anywhere along a path cuts that path and nothing else.
///
/// The computation reads the current state only, so it is deterministic and
/// idempotent; adding a grant can only grow the set.
///
/// This tier gates application resources. The administrative API is gated
/// separately by developer API tokens (see [`TokenLifecycle`](super::tokens::TokenLifecycle))
/// and the two are never mixed: a developer token grants no user permission
/// and vice versa.
///
/// # Example
///
/// ```no_run
/// use keyward_shared::auth::authorization::Authorizer;
/// use keyward_shared::db::memory::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let authorizer = Authorizer::new(MemoryStore::new());
/// if authorizer.has_permission(user_id, "manage_orgs").await? {
///     println!("user may manage organizations");
/// }
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::filter::Filter;
use crate::db::store::{Store, Transaction};
use crate::error::{CoreError, CoreResult};
use crate::models::permission::Permission;
use crate::models::role::Role;
use crate::models::role_permission::RolePermission;
use crate::models::user::User;
use crate::models::user_role::UserRole;
use crate::models::EntityKind;

/// Error type for permission checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The user holds no live path to the permission
    #[error("User {user_id} lacks permission {permission}")]
    Forbidden { user_id: Uuid, permission: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// The set of permissions a user holds, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EffectivePermissions {
    by_name: BTreeMap<String, Permission>,
}

impl EffectivePermissions {
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Permission names in ascending order
    pub fn names(&self) -> Vec<&str> {
        self.by_name.keys().map(String::as_str).collect()
    }

    /// Permissions in ascending name order
    pub fn permissions(&self) -> Vec<Permission> {
        self.by_name.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Whether every permission here is also in `other`
    pub fn is_subset(&self, other: &EffectivePermissions) -> bool {
        self.by_name.keys().all(|name| other.contains(name))
    }
}

impl FromIterator<Permission> for EffectivePermissions {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            by_name: iter.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }
}

/// Evaluates user permissions against the store
#[derive(Debug, Clone)]
pub struct Authorizer<S: Store> {
    store: S,
}

impl<S: Store> Authorizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Live roles currently granted to a live user
    pub async fn roles_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Role>> {
        let mut tx = self.store.begin().await?;
        live_user(&mut tx, user_id).await?;
        live_roles(&mut tx, user_id).await
    }

    /// Union of the permissions reachable from a live user
    pub async fn effective_permissions(&self, user_id: Uuid) -> CoreResult<EffectivePermissions> {
        let mut tx = self.store.begin().await?;
        live_user(&mut tx, user_id).await?;

        let role_ids: Vec<Uuid> = live_roles(&mut tx, user_id)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        if role_ids.is_empty() {
            return Ok(EffectivePermissions::default());
        }

        let permission_ids: Vec<Uuid> = tx
            .select::<RolePermission>(&Filter::live().any_of("role_id", role_ids))
            .await?
            .into_iter()
            .map(|grant| grant.permission_id)
            .collect();
        if permission_ids.is_empty() {
            return Ok(EffectivePermissions::default());
        }

        let permissions: EffectivePermissions = tx
            .select::<Permission>(&Filter::live().any_of("id", permission_ids))
            .await?
            .into_iter()
            .collect();

        debug!(user_id = %user_id, count = permissions.len(), "Resolved effective permissions");
        Ok(permissions)
    }

    /// Whether the user holds the named permission
    pub async fn has_permission(&self, user_id: Uuid, permission: &str) -> CoreResult<bool> {
        Ok(self.effective_permissions(user_id).await?.contains(permission))
    }

    /// Like [`has_permission`](Self::has_permission) but fails with
    /// [`AuthzError::Forbidden`]
    pub async fn require_permission(&self, user_id: Uuid, permission: &str) -> Result<(), AuthzError> {
        if self.has_permission(user_id, permission).await? {
            return Ok(());
        }

        warn!(user_id = %user_id, permission, "Permission denied");
        Err(AuthzError::Forbidden {
            user_id,
            permission: permission.to_string(),
        })
    }
}

async fn live_user<T: Transaction>(tx: &mut T, user_id: Uuid) -> CoreResult<User> {
    tx.fetch::<User>(user_id)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::User, user_id))
}

async fn live_roles<T: Transaction>(tx: &mut T, user_id: Uuid) -> CoreResult<Vec<Role>> {
    let role_ids: Vec<Uuid> = tx
        .select::<UserRole>(&Filter::live().eq("user_id", user_id))
        .await?
        .into_iter()
        .map(|grant| grant.role_id)
        .collect();
    if role_ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(tx.select::<Role>(&Filter::live().any_of("id", role_ids)).await?)
}
