/// User profile
///
/// Optional 1:1 extension of a [`User`](super::user::User), keyed by the
/// user's id. A tombstoned profile keeps its key, so a user whose profile
/// was deleted cannot create another one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::view::Render;
use super::EntityKind;
use crate::db::record::{ColumnValue, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    /// Primary key, equal to the owning user's id
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewUserProfile {
    #[validate(length(min = 1, max = 255, message = "First name must be 1-255 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 255, message = "Last name must be 1-255 characters"))]
    pub last_name: String,

    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<String>,

    pub address: Option<String>,

    #[validate(url(message = "Invalid picture URL"))]
    pub profile_picture_url: Option<String>,
}

/// Profile fields to overwrite; absent fields are left as they are
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UserProfileChanges {
    #[validate(length(min = 1, max = 255, message = "First name must be 1-255 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Last name must be 1-255 characters"))]
    pub last_name: Option<String>,

    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<String>,

    pub address: Option<String>,

    #[validate(url(message = "Invalid picture URL"))]
    pub profile_picture_url: Option<String>,
}

impl UserProfile {
    pub fn new(user_id: Uuid, input: NewUserProfile) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            first_name: input.first_name,
            last_name: input.last_name,
            phone_number: input.phone_number,
            address: input.address,
            profile_picture_url: input.profile_picture_url,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, changes: UserProfileChanges) {
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name;
        }
        if changes.phone_number.is_some() {
            self.phone_number = changes.phone_number;
        }
        if changes.address.is_some() {
            self.address = changes.address;
        }
        if changes.profile_picture_url.is_some() {
            self.profile_picture_url = changes.profile_picture_url;
        }
    }
}

impl Record for UserProfile {
    const KIND: EntityKind = EntityKind::UserProfile;
    const TABLE: &'static str = "user_profiles";
    const ID_COLUMN: &'static str = "user_id";

    fn id(&self) -> Uuid {
        self.user_id
    }

    crate::db::record::record_timestamps!();

    fn columns(&self) -> Vec<(&'static str, ColumnValue)> {
        vec![
            ("user_id", self.user_id.into()),
            ("first_name", self.first_name.clone().into()),
            ("last_name", self.last_name.clone().into()),
            ("phone_number", self.phone_number.clone().into()),
            ("address", self.address.clone().into()),
            ("profile_picture_url", self.profile_picture_url.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
            ("deleted_at", self.deleted_at.into()),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfileAdminView {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Contact details (phone, address) are admin-only
#[derive(Debug, Clone, Serialize)]
pub struct UserProfilePublicView {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture_url: Option<String>,
}

impl Render for UserProfile {
    type Admin = UserProfileAdminView;
    type Public = UserProfilePublicView;

    fn admin_view(&self) -> UserProfileAdminView {
        UserProfileAdminView {
            user_id: self.user_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone_number: self.phone_number.clone(),
            address: self.address.clone(),
            profile_picture_url: self.profile_picture_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }

    fn public_view(&self) -> UserProfilePublicView {
        UserProfilePublicView {
            user_id: self.user_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_picture_url: self.profile_picture_url.clone(),
        }
    }
}
