/// Organization operations

use uuid::Uuid;
use validator::Validate;

use super::crud;
use crate::db::filter::Filter;
use crate::db::store::Store;
use crate::error::CoreResult;
use crate::models::organization::{NewOrganization, Organization, OrganizationChanges};

#[derive(Debug, Clone)]
pub struct Organizations<S: Store> {
    store: S,
}

impl<S: Store> Organizations<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates an organization; a taken name (live or tombstoned) is a
    /// validation error
    pub async fn create(&self, input: NewOrganization) -> CoreResult<Organization> {
        input.validate()?;
        crud::create(&self.store, Organization::new(input)).await
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Organization> {
        crud::get(&self.store, id).await
    }

    pub async fn history(&self, id: Uuid) -> CoreResult<Organization> {
        crud::history(&self.store, id).await
    }

    pub async fn list(&self) -> CoreResult<Vec<Organization>> {
        crud::list(&self.store, &Filter::live()).await
    }

    pub async fn update(&self, id: Uuid, changes: OrganizationChanges) -> CoreResult<Organization> {
        changes.validate()?;
        crud::update_with(&self.store, id, |org: &mut Organization| org.apply(changes)).await
    }

    /// Tombstones the organization; its memberships are left untouched
    pub async fn delete(&self, id: Uuid) -> CoreResult<Organization> {
        crud::delete(&self.store, id).await
    }
}
