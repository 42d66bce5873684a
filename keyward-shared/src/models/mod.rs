/// Entity models
///
/// Every model is a plain struct that maps 1:1 onto its table and implements
/// [`Record`](crate::db::record::Record). Models carry no query code: all
/// persistence goes through a [`Store`](crate::db::store::Store), and all
/// rendering goes through the explicit views in [`view`].
///
/// # Models
///
/// - `organization`: tenant organizations
/// - `developer`: developers and their API token
/// - `developer_organization`: developer ↔ organization membership
/// - `user`: end-user accounts owned by a developer
/// - `user_profile`: optional 1:1 profile of a user
/// - `token`: secondary session credential of a developer
/// - `role` / `permission`: the authorization vocabulary
/// - `user_role` / `role_permission`: grants
///
/// # Example
///
/// ```
/// use keyward_shared::models::organization::{NewOrganization, Organization};
/// use keyward_shared::models::view::Render;
///
/// let org = Organization::new(NewOrganization { name: "Acme".to_string() });
/// assert_eq!(org.public_view().name, "Acme");
/// ```

use serde::Serialize;
use std::fmt;

pub mod developer;
pub mod developer_organization;
pub mod organization;
pub mod permission;
pub mod role;
pub mod role_permission;
pub mod token;
pub mod user;
pub mod user_profile;
pub mod user_role;
pub mod view;

/// The kinds of entity the core manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Organization,
    Developer,
    DeveloperOrganization,
    User,
    UserProfile,
    Token,
    Role,
    Permission,
    UserRole,
    RolePermission,
}

impl EntityKind {
    /// Envelope key for a single entity (`"developer"`)
    pub fn key(&self) -> &'static str {
        match self {
            EntityKind::Organization => "organization",
            EntityKind::Developer => "developer",
            EntityKind::DeveloperOrganization => "developer_organization",
            EntityKind::User => "user",
            EntityKind::UserProfile => "profile",
            EntityKind::Token => "token",
            EntityKind::Role => "role",
            EntityKind::Permission => "permission",
            EntityKind::UserRole => "user_role",
            EntityKind::RolePermission => "role_permission",
        }
    }

    /// Envelope key for a list of entities (`"developers"`)
    pub fn plural_key(&self) -> &'static str {
        match self {
            EntityKind::Organization => "organizations",
            EntityKind::Developer => "developers",
            EntityKind::DeveloperOrganization => "developer_organizations",
            EntityKind::User => "users",
            EntityKind::UserProfile => "profiles",
            EntityKind::Token => "tokens",
            EntityKind::Role => "roles",
            EntityKind::Permission => "permissions",
            EntityKind::UserRole => "user_roles",
            EntityKind::RolePermission => "role_permissions",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Organization => "Organization",
            EntityKind::Developer => "Developer",
            EntityKind::DeveloperOrganization => "DeveloperOrganization",
            EntityKind::User => "User",
            EntityKind::UserProfile => "UserProfile",
            EntityKind::Token => "Token",
            EntityKind::Role => "Role",
            EntityKind::Permission => "Permission",
            EntityKind::UserRole => "UserRole",
            EntityKind::RolePermission => "RolePermission",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::Organization.to_string(), "Organization");
        assert_eq!(EntityKind::UserRole.to_string(), "UserRole");
    }

    #[test]
    fn test_entity_kind_keys() {
        assert_eq!(EntityKind::Developer.key(), "developer");
        assert_eq!(EntityKind::Developer.plural_key(), "developers");
        assert_eq!(EntityKind::UserProfile.key(), "profile");
    }
}
