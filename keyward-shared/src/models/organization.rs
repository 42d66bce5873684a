/// Organization model
///
/// Organizations are the top-level tenant. Developers join organizations
/// through [`DeveloperOrganization`](super::developer_organization::DeveloperOrganization).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```
///
/// The UNIQUE constraint covers tombstoned rows: a deleted organization's
/// name stays taken.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::view::Render;
use super::EntityKind;
use crate::db::record::{ColumnValue, Record};

/// Organization model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID (UUID v4)
    pub id: Uuid,

    /// Organization name, unique across all rows
    pub name: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Tombstone (None while live)
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating an organization
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewOrganization {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
}

/// Input for updating an organization
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OrganizationChanges {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
}

impl Organization {
    /// Builds a new, not yet persisted organization
    pub fn new(input: NewOrganization) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Applies the fields present in `changes`
    pub fn apply(&mut self, changes: OrganizationChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
    }
}

impl Record for Organization {
    const KIND: EntityKind = EntityKind::Organization;
    const TABLE: &'static str = "organizations";
    const UNIQUE: &'static [&'static [&'static str]] = &[&["name"]];

    fn id(&self) -> Uuid {
        self.id
    }

    crate::db::record::record_timestamps!();

    fn columns(&self) -> Vec<(&'static str, ColumnValue)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
            ("deleted_at", self.deleted_at.into()),
        ]
    }
}

/// Organization as seen by administrators
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationAdminView {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationPublicView {
    pub id: Uuid,
    pub name: String,
}

impl Render for Organization {
    type Admin = OrganizationAdminView;
    type Public = OrganizationPublicView;

    fn admin_view(&self) -> OrganizationAdminView {
        OrganizationAdminView {
            id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }

    fn public_view(&self) -> OrganizationPublicView {
        OrganizationPublicView {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_organization_is_live() {
        let org = Organization::new(NewOrganization {
            name: "Acme".to_string(),
        });
        assert!(org.deleted_at.is_none());
        assert_eq!(org.created_at, org.updated_at);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let input = NewOrganization {
            name: String::new(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_columns_match_serde_fields() {
        let org = Organization::new(NewOrganization {
            name: "Acme".to_string(),
        });
        let row = serde_json::to_value(&org).unwrap();
        for (name, value) in org.columns() {
            assert_eq!(row[name], value.to_json(), "column {name}");
        }
    }
}
