/// Developer model
///
/// A developer is the administrative principal: it owns end users and
/// authenticates with its `api_token`. The token is a random UUID generated at
/// creation and replaced wholesale on regeneration (see
/// [`TokenLifecycle`](crate::auth::tokens::TokenLifecycle)); holders never
/// set it themselves, so neither [`NewDeveloper`] nor [`DeveloperChanges`]
/// carries it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE developers (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL UNIQUE,
///     api_token UUID NOT NULL UNIQUE,
///     api_token_expires_at TIMESTAMPTZ,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::view::Render;
use super::EntityKind;
use crate::db::record::{ColumnValue, Record};

/// Developer model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Developer {
    pub id: Uuid,

    /// Developer name, unique across all rows
    pub name: String,

    /// Current API token (UUID v4)
    pub api_token: Uuid,

    /// When the current API token stops being accepted (None = never)
    pub api_token_expires_at: Option<DateTime<Utc>>,

    /// Inactive developers keep their rows but cannot authenticate
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a developer under an organization
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewDeveloper {
    /// Organization the developer is linked to on creation
    pub organization_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Optional role within the organization
    #[validate(length(max = 255, message = "Role must be at most 255 characters"))]
    pub role: Option<String>,
}

/// Input for updating a developer
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DeveloperChanges {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    pub is_active: Option<bool>,
}

impl Developer {
    /// Builds a new developer holding the given API token
    pub fn new(name: String, api_token: Uuid, api_token_expires_at: Option<DateTime<Utc>>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            api_token,
            api_token_expires_at,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, changes: DeveloperChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
    }

    /// Whether the API token is past its expiry at `now`
    pub fn token_expired(&self, now: DateTime<Utc>) -> bool {
        self.api_token_expires_at.map_or(false, |at| at <= now)
    }
}

impl Record for Developer {
    const KIND: EntityKind = EntityKind::Developer;
    const TABLE: &'static str = "developers";
    const UNIQUE: &'static [&'static [&'static str]] = &[&["name"], &["api_token"]];

    fn id(&self) -> Uuid {
        self.id
    }

    crate::db::record::record_timestamps!();

    fn columns(&self) -> Vec<(&'static str, ColumnValue)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.clone().into()),
            ("api_token", self.api_token.into()),
            ("api_token_expires_at", self.api_token_expires_at.into()),
            ("is_active", self.is_active.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
            ("deleted_at", self.deleted_at.into()),
        ]
    }
}

/// Developer as seen by administrators, token included
#[derive(Debug, Clone, Serialize)]
pub struct DeveloperAdminView {
    pub id: Uuid,
    pub name: String,
    pub api_token: Uuid,
    pub api_token_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Developer without any credential
#[derive(Debug, Clone, Serialize)]
pub struct DeveloperPublicView {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
}

impl Render for Developer {
    type Admin = DeveloperAdminView;
    type Public = DeveloperPublicView;

    fn admin_view(&self) -> DeveloperAdminView {
        DeveloperAdminView {
            id: self.id,
            name: self.name.clone(),
            api_token: self.api_token,
            api_token_expires_at: self.api_token_expires_at,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }

    fn public_view(&self) -> DeveloperPublicView {
        DeveloperPublicView {
            id: self.id,
            name: self.name.clone(),
            is_active: self.is_active,
        }
    }
}
