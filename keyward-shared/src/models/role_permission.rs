/// Role ↔ permission grant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::view::Render;
use super::EntityKind;
use crate::db::record::{ColumnValue, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RolePermission {
    pub id: Uuid,
    pub role_id: Uuid,
    pub permission_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RolePermission {
    pub fn new(role_id: Uuid, permission_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            role_id,
            permission_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Record for RolePermission {
    const KIND: EntityKind = EntityKind::RolePermission;
    const TABLE: &'static str = "role_permissions";

    fn id(&self) -> Uuid {
        self.id
    }

    crate::db::record::record_timestamps!();

    fn columns(&self) -> Vec<(&'static str, ColumnValue)> {
        vec![
            ("id", self.id.into()),
            ("role_id", self.role_id.into()),
            ("permission_id", self.permission_id.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
            ("deleted_at", self.deleted_at.into()),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RolePermissionAdminView {
    pub id: Uuid,
    pub role_id: Uuid,
    pub permission_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RolePermissionPublicView {
    pub role_id: Uuid,
    pub permission_id: Uuid,
}

impl Render for RolePermission {
    type Admin = RolePermissionAdminView;
    type Public = RolePermissionPublicView;

    fn admin_view(&self) -> RolePermissionAdminView {
        RolePermissionAdminView {
            id: self.id,
            role_id: self.role_id,
            permission_id: self.permission_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }

    fn public_view(&self) -> RolePermissionPublicView {
        RolePermissionPublicView {
            role_id: self.role_id,
            permission_id: self.permission_id,
        }
    }
}
