/// User model
///
/// End-user accounts. Every user belongs to exactly one developer, and
/// emails are unique across all rows (tombstoned ones included). Passwords
/// are stored as Argon2id hashes, never in plaintext, and no view renders
/// the hash.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     developer_id UUID NOT NULL REFERENCES developers(id),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_staff BOOLEAN NOT NULL DEFAULT FALSE,
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

/// User model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Owning developer
    pub developer_id: Uuid,

    /// Email address, stored lowercase
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub is_active: bool,

    pub is_staff: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a user
///
/// The owning developer is not part of the input; it is the authenticated
/// caller.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext password, hashed before it reaches the store
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[serde(default)]
    pub is_staff: bool,
}

/// Input for updating a user
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UserChanges {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: Option<String>,

    pub is_active: Option<bool>,

    pub is_staff: Option<bool>,
}

impl User {
    /// Builds a new user from validated input and an already computed hash
    pub fn new(developer_id: Uuid, input: &NewUser, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            developer_id,
            email: normalize_email(&input.email),
            password_hash,
            is_active: true,
            is_staff: input.is_staff,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Canonical form of an email address (trimmed, lowercase)
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Record for User {
    const KIND: EntityKind = EntityKind::User;
    const TABLE: &'static str = "users";
    const UNIQUE: &'static [&'static [&'static str]] = &[&["email"]];

    fn id(&self) -> Uuid {
        self.id
    }

    crate::db::record::record_timestamps!();

    fn columns(&self) -> Vec<(&'static str, ColumnValue)> {
        vec![
            ("id", self.id.into()),
            ("developer_id", self.developer_id.into()),
            ("email", self.email.clone().into()),
            ("password_hash", self.password_hash.clone().into()),
            ("is_active", self.is_active.into()),
            ("is_staff", self.is_staff.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
            ("deleted_at", self.deleted_at.into()),
        ]
    }
}

/// User as seen by its developer
#[derive(Debug, Clone, Serialize)]
pub struct UserAdminView {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPublicView {
    pub id: Uuid,
    pub email: String,
}

impl Render for User {
    type Admin = UserAdminView;
    type Public = UserPublicView;

    fn admin_view(&self) -> UserAdminView {
        UserAdminView {
            id: self.id,
            developer_id: self.developer_id,
            email: self.email.clone(),
            is_active: self.is_active,
            is_staff: self.is_staff,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }

    fn public_view(&self) -> UserPublicView {
        UserPublicView {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "correct horse battery".to_string(),
            is_staff: false,
        }
    }

    #[test]
    fn test_email_is_normalized() {
        let user = User::new(Uuid::new_v4(), &input("  Alice@Example.COM "), "hash".to_string());
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        assert!(input("not-an-email").validate().is_err());
        assert!(input("alice@example.com").validate().is_ok());
    }

    #[test]
    fn test_short_password_is_rejected() {
        let mut short = input("alice@example.com");
        short.password = "short".to_string();
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_views_never_render_password_hash() {
        let user = User::new(Uuid::new_v4(), &input("alice@example.com"), "$argon2id$secret".to_string());
        let admin = serde_json::to_string(&user.admin_view()).unwrap();
        let public = serde_json::to_string(&user.public_view()).unwrap();
        assert!(!admin.contains("argon2id"));
        assert!(!public.contains("argon2id"));
    }
}
