/// Session token
///
/// A secondary opaque credential. A developer holds at most one live token;
/// revoked tokens stay behind as tombstones, so the 1:1 rule applies to live
/// rows only. The value is 32 random bytes, hex encoded (see
/// [`generate_session_token`](crate::auth::credentials::generate_session_token)).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::view::Render;
use super::EntityKind;
use crate::db::record::{ColumnValue, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Token {
    pub fn new(developer_id: Uuid, token: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            developer_id,
            token,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Record for Token {
    const KIND: EntityKind = EntityKind::Token;
    const TABLE: &'static str = "tokens";
    const UNIQUE: &'static [&'static [&'static str]] = &[&["token"]];

    fn id(&self) -> Uuid {
        self.id
    }

    crate::db::record::record_timestamps!();

    fn columns(&self) -> Vec<(&'static str, ColumnValue)> {
        vec![
            ("id", self.id.into()),
            ("developer_id", self.developer_id.into()),
            ("token", self.token.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
            ("deleted_at", self.deleted_at.into()),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenAdminView {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPublicView {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Render for Token {
    type Admin = TokenAdminView;
    type Public = TokenPublicView;

    fn admin_view(&self) -> TokenAdminView {
        TokenAdminView {
            id: self.id,
            developer_id: self.developer_id,
            token: self.token.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }

    fn public_view(&self) -> TokenPublicView {
        TokenPublicView {
            id: self.id,
            developer_id: self.developer_id,
            created_at: self.created_at,
        }
    }
}
