/// Developer ↔ organization membership
///
/// At most one row per (developer, organization) pair ever exists; the pair
/// stays reserved after the membership is tombstoned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::view::Render;
use super::EntityKind;
use crate::db::record::{ColumnValue, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeveloperOrganization {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub organization_id: Uuid,

    /// Free-form role of the developer inside the organization
    pub role: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for attaching a developer to an organization
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewDeveloperOrganization {
    pub developer_id: Uuid,
    pub organization_id: Uuid,

    #[validate(length(max = 255, message = "Role must be at most 255 characters"))]
    pub role: Option<String>,
}

impl DeveloperOrganization {
    pub fn new(input: NewDeveloperOrganization) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            developer_id: input.developer_id,
            organization_id: input.organization_id,
            role: input.role,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Record for DeveloperOrganization {
    const KIND: EntityKind = EntityKind::DeveloperOrganization;
    const TABLE: &'static str = "developer_organizations";
    const UNIQUE: &'static [&'static [&'static str]] = &[&["developer_id", "organization_id"]];

    fn id(&self) -> Uuid {
        self.id
    }

    crate::db::record::record_timestamps!();

    fn columns(&self) -> Vec<(&'static str, ColumnValue)> {
        vec![
            ("id", self.id.into()),
            ("developer_id", self.developer_id.into()),
            ("organization_id", self.organization_id.into()),
            ("role", self.role.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
            ("deleted_at", self.deleted_at.into()),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeveloperOrganizationAdminView {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub organization_id: Uuid,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeveloperOrganizationPublicView {
    pub developer_id: Uuid,
    pub organization_id: Uuid,
    pub role: Option<String>,
}

impl Render for DeveloperOrganization {
    type Admin = DeveloperOrganizationAdminView;
    type Public = DeveloperOrganizationPublicView;

    fn admin_view(&self) -> DeveloperOrganizationAdminView {
        DeveloperOrganizationAdminView {
            id: self.id,
            developer_id: self.developer_id,
            organization_id: self.organization_id,
            role: self.role.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }

    fn public_view(&self) -> DeveloperOrganizationPublicView {
        DeveloperOrganizationPublicView {
            developer_id: self.developer_id,
            organization_id: self.organization_id,
            role: self.role.clone(),
        }
    }
}
