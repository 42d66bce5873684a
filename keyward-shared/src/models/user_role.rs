/// User ↔ role grant
///
/// Each grant is soft-deletable on its own; revoking a role tombstones the
/// grant row and leaves the user and the role untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::view::Render;
use super::EntityKind;
use crate::db::record::{ColumnValue, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRole {
    pub fn new(user_id: Uuid, role_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            role_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Record for UserRole {
    const KIND: EntityKind = EntityKind::UserRole;
    const TABLE: &'static str = "user_roles";

    fn id(&self) -> Uuid {
        self.id
    }

    crate::db::record::record_timestamps!();

    fn columns(&self) -> Vec<(&'static str, ColumnValue)> {
        vec![
            ("id", self.id.into()),
            ("user_id", self.user_id.into()),
            ("role_id", self.role_id.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
            ("deleted_at", self.deleted_at.into()),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRoleAdminView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRolePublicView {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

impl Render for UserRole {
    type Admin = UserRoleAdminView;
    type Public = UserRolePublicView;

    fn admin_view(&self) -> UserRoleAdminView {
        UserRoleAdminView {
            id: self.id,
            user_id: self.user_id,
            role_id: self.role_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }

    fn public_view(&self) -> UserRolePublicView {
        UserRolePublicView {
            user_id: self.user_id,
            role_id: self.role_id,
        }
    }
}
