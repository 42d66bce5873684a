/// User and profile operations
///
/// Users are always addressed through the developer that owns them: a user
/// belonging to another developer is reported as not found, exactly like a
/// user that does not exist.

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::crud;
use crate::auth::password::{hash_password, verify_password, HashParams};
use crate::db::filter::Filter;
use crate::db::store::{Store, Transaction};
use crate::error::{CoreError, CoreResult};
use crate::models::developer::Developer;
use crate::models::user::{normalize_email, NewUser, User, UserChanges};
use crate::models::user_profile::{NewUserProfile, UserProfile, UserProfileChanges};
use crate::models::EntityKind;
use crate::soft_delete::tombstone;

#[derive(Debug, Clone)]
pub struct Users<S: Store> {
    store: S,
    hash_params: HashParams,
}

impl<S: Store> Users<S> {
    pub fn new(store: S, hash_params: HashParams) -> Self {
        Self { store, hash_params }
    }

    /// Creates a user owned by a live developer
    pub async fn create(&self, developer_id: Uuid, input: NewUser) -> CoreResult<User> {
        input.validate()?;
        let password_hash = self.hash(input.password.clone()).await?;

        let mut tx = self.store.begin().await?;
        tx.fetch::<Developer>(developer_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Developer, developer_id))?;

        let user = tx.insert(&User::new(developer_id, &input, password_hash)).await?;
        tx.commit().await?;

        info!(entity = %EntityKind::User, id = %user.id, developer_id = %developer_id, "Created");
        Ok(user)
    }

    pub async fn get(&self, developer_id: Uuid, id: Uuid) -> CoreResult<User> {
        let mut tx = self.store.begin().await?;
        owned_user(&mut tx, developer_id, id).await
    }

    /// User by id, tombstoned or not, still scoped to its developer
    pub async fn history(&self, developer_id: Uuid, id: Uuid) -> CoreResult<User> {
        let user: User = crud::history(&self.store, id).await?;
        if user.developer_id != developer_id {
            return Err(CoreError::not_found(EntityKind::User, id));
        }
        Ok(user)
    }

    pub async fn list_for_developer(&self, developer_id: Uuid) -> CoreResult<Vec<User>> {
        crud::list(&self.store, &Filter::live().eq("developer_id", developer_id)).await
    }

    pub async fn update(&self, developer_id: Uuid, id: Uuid, changes: UserChanges) -> CoreResult<User> {
        changes.validate()?;
        let password_hash = match changes.password.clone() {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };

        let mut tx = self.store.begin().await?;
        let mut user = tx
            .fetch_for_update::<User>(id)
            .await?
            .filter(|user| user.developer_id == developer_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::User, id))?;

        if let Some(email) = changes.email {
            user.email = normalize_email(&email);
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        if let Some(is_staff) = changes.is_staff {
            user.is_staff = is_staff;
        }
        user.updated_at = chrono::Utc::now();

        let updated = tx
            .update(&user)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::User, id))?;
        tx.commit().await?;

        info!(entity = %EntityKind::User, id = %id, "Updated");
        Ok(updated)
    }

    /// Tombstones the user; its profile and role grants are left untouched
    pub async fn delete(&self, developer_id: Uuid, id: Uuid) -> CoreResult<User> {
        let mut tx = self.store.begin().await?;
        owned_user(&mut tx, developer_id, id).await?;
        let deleted = tombstone::<User, _>(&mut tx, id).await?;
        tx.commit().await?;

        info!(entity = %EntityKind::User, id = %id, "Deleted");
        Ok(deleted)
    }

    /// Checks an email/password pair against a live, active user
    ///
    /// Only answers whether the credentials are valid; no session is created.
    /// Unknown email, wrong password and inactive user are indistinguishable.
    pub async fn verify_credentials(
        &self,
        developer_id: Uuid,
        email: &str,
        password: &str,
    ) -> CoreResult<User> {
        let email = normalize_email(email);
        let rejected = || CoreError::not_found(EntityKind::User, &email);

        let mut tx = self.store.begin().await?;
        let user = tx
            .select_one::<User>(
                &Filter::live()
                    .eq("email", email.as_str())
                    .eq("developer_id", developer_id),
            )
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(rejected)?;
        drop(tx);

        let hash = user.password_hash.clone();
        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| CoreError::Unexpected(e.to_string()))?
            .map_err(|e| CoreError::Unexpected(e.to_string()))?;

        if !valid {
            return Err(rejected());
        }
        Ok(user)
    }

    pub async fn profile(&self, developer_id: Uuid, user_id: Uuid) -> CoreResult<UserProfile> {
        let mut tx = self.store.begin().await?;
        owned_user(&mut tx, developer_id, user_id).await?;
        tx.fetch::<UserProfile>(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::UserProfile, user_id))
    }

    /// Creates the profile of a live user; a user has at most one
    pub async fn create_profile(
        &self,
        developer_id: Uuid,
        user_id: Uuid,
        input: NewUserProfile,
    ) -> CoreResult<UserProfile> {
        input.validate()?;

        let mut tx = self.store.begin().await?;
        owned_user(&mut tx, developer_id, user_id).await?;
        let profile = tx.insert(&UserProfile::new(user_id, input)).await?;
        tx.commit().await?;

        info!(entity = %EntityKind::UserProfile, id = %user_id, "Created");
        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        developer_id: Uuid,
        user_id: Uuid,
        changes: UserProfileChanges,
    ) -> CoreResult<UserProfile> {
        changes.validate()?;
        self.get(developer_id, user_id).await?;
        crud::update_with(&self.store, user_id, |profile: &mut UserProfile| profile.apply(changes)).await
    }

    pub async fn delete_profile(&self, developer_id: Uuid, user_id: Uuid) -> CoreResult<UserProfile> {
        let mut tx = self.store.begin().await?;
        owned_user(&mut tx, developer_id, user_id).await?;
        let deleted = tombstone::<UserProfile, _>(&mut tx, user_id).await?;
        tx.commit().await?;

        info!(entity = %EntityKind::UserProfile, id = %user_id, "Deleted");
        Ok(deleted)
    }

    async fn hash(&self, password: String) -> CoreResult<String> {
        let params = self.hash_params;
        tokio::task::spawn_blocking(move || hash_password(&password, &params))
            .await
            .map_err(|e| CoreError::Unexpected(e.to_string()))?
            .map_err(|e| CoreError::Unexpected(e.to_string()))
    }
}

/// Live user `id` if it belongs to `developer_id`
async fn owned_user<T: Transaction>(tx: &mut T, developer_id: Uuid, id: Uuid) -> CoreResult<User> {
    tx.fetch::<User>(id)
        .await?
        .filter(|user| user.developer_id == developer_id)
        .ok_or_else(|| CoreError::not_found(EntityKind::User, id))
}
