/// Developer and membership operations
///
/// Creating a developer also generates its API token and links it to the
/// organization it was created under, all in one transaction: either the
/// developer, its token and its membership exist together, or none of them
/// do.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::crud;
use crate::auth::credentials::generate_api_token;
use crate::auth::tokens::TokenPolicy;
use crate::db::filter::Filter;
use crate::db::store::{Store, Transaction};
use crate::error::{CoreError, CoreResult};
use crate::models::developer::{Developer, DeveloperChanges, NewDeveloper};
use crate::models::developer_organization::{DeveloperOrganization, NewDeveloperOrganization};
use crate::models::organization::Organization;
use crate::models::EntityKind;
use crate::soft_delete::tombstone;

#[derive(Debug, Clone)]
pub struct Developers<S: Store> {
    store: S,
    policy: TokenPolicy,
}

impl<S: Store> Developers<S> {
    pub fn new(store: S, policy: TokenPolicy) -> Self {
        Self { store, policy }
    }

    /// Creates a developer under a live organization
    pub async fn create(&self, input: NewDeveloper) -> CoreResult<Developer> {
        input.validate()?;

        let mut tx = self.store.begin().await?;
        tx.fetch::<Organization>(input.organization_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Organization, input.organization_id))?;

        let developer = tx
            .insert(&Developer::new(
                input.name,
                generate_api_token(),
                self.policy.expiry_from(Utc::now()),
            ))
            .await?;
        let membership = tx
            .insert(&DeveloperOrganization::new(NewDeveloperOrganization {
                developer_id: developer.id,
                organization_id: input.organization_id,
                role: input.role,
            }))
            .await?;
        tx.commit().await?;

        info!(
            entity = %EntityKind::Developer,
            id = %developer.id,
            organization_id = %membership.organization_id,
            "Created"
        );
        Ok(developer)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Developer> {
        crud::get(&self.store, id).await
    }

    pub async fn history(&self, id: Uuid) -> CoreResult<Developer> {
        crud::history(&self.store, id).await
    }

    pub async fn list(&self) -> CoreResult<Vec<Developer>> {
        crud::list(&self.store, &Filter::live()).await
    }

    pub async fn update(&self, id: Uuid, changes: DeveloperChanges) -> CoreResult<Developer> {
        changes.validate()?;
        crud::update_with(&self.store, id, |developer: &mut Developer| developer.apply(changes)).await
    }

    /// Tombstones the developer; its users, tokens and memberships stay as
    /// they are
    pub async fn delete(&self, id: Uuid) -> CoreResult<Developer> {
        crud::delete(&self.store, id).await
    }

    /// Live organizations the developer is a live member of
    pub async fn organizations(&self, developer_id: Uuid) -> CoreResult<Vec<Organization>> {
        let mut tx = self.store.begin().await?;
        tx.fetch::<Developer>(developer_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Developer, developer_id))?;

        let organization_ids: Vec<Uuid> = tx
            .select::<DeveloperOrganization>(&Filter::live().eq("developer_id", developer_id))
            .await?
            .into_iter()
            .map(|m| m.organization_id)
            .collect();
        if organization_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(tx
            .select::<Organization>(&Filter::live().any_of("id", organization_ids))
            .await?)
    }

    /// Live membership rows of a developer
    pub async fn memberships(&self, developer_id: Uuid) -> CoreResult<Vec<DeveloperOrganization>> {
        crud::list(&self.store, &Filter::live().eq("developer_id", developer_id)).await
    }

    /// Links a live developer to a live organization
    pub async fn attach(&self, input: NewDeveloperOrganization) -> CoreResult<DeveloperOrganization> {
        input.validate()?;

        let mut tx = self.store.begin().await?;
        tx.fetch::<Developer>(input.developer_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Developer, input.developer_id))?;
        tx.fetch::<Organization>(input.organization_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Organization, input.organization_id))?;

        let membership = tx.insert(&DeveloperOrganization::new(input)).await?;
        tx.commit().await?;

        info!(
            entity = %EntityKind::DeveloperOrganization,
            id = %membership.id,
            developer_id = %membership.developer_id,
            "Created"
        );
        Ok(membership)
    }

    /// Tombstones the live membership of a developer in an organization
    pub async fn detach(
        &self,
        developer_id: Uuid,
        organization_id: Uuid,
    ) -> CoreResult<DeveloperOrganization> {
        let mut tx = self.store.begin().await?;
        let membership = tx
            .select_one::<DeveloperOrganization>(
                &Filter::live()
                    .eq("developer_id", developer_id)
                    .eq("organization_id", organization_id),
            )
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::DeveloperOrganization, organization_id))?;

        let detached = tombstone::<DeveloperOrganization, _>(&mut tx, membership.id).await?;
        tx.commit().await?;

        info!(
            entity = %EntityKind::DeveloperOrganization,
            id = %detached.id,
            developer_id = %developer_id,
            "Deleted"
        );
        Ok(detached)
    }
}
