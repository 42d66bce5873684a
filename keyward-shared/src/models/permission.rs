/// Permission model
///
/// Permissions are identified by name in authorization checks
/// (`has_permission(user, "manage_orgs")`), so names are unique across all
/// rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::view::Render;
use super::EntityKind;
use crate::db::record::{ColumnValue, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPermission {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PermissionChanges {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

impl Permission {
    pub fn new(input: NewPermission) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, changes: PermissionChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
    }
}

impl Record for Permission {
    const KIND: EntityKind = EntityKind::Permission;
    const TABLE: &'static str = "permissions";
    const UNIQUE: &'static [&'static [&'static str]] = &[&["name"]];

    fn id(&self) -> Uuid {
        self.id
    }

    crate::db::record::record_timestamps!();

    fn columns(&self) -> Vec<(&'static str, ColumnValue)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.clone().into()),
            ("description", self.description.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
            ("deleted_at", self.deleted_at.into()),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionAdminView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionPublicView {
    pub name: String,
    pub description: String,
}

impl Render for Permission {
    type Admin = PermissionAdminView;
    type Public = PermissionPublicView;

    fn admin_view(&self) -> PermissionAdminView {
        PermissionAdminView {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }

    fn public_view(&self) -> PermissionPublicView {
        PermissionPublicView {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}
