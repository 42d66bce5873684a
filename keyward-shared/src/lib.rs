//! # Keyward Shared Library
//!
//! Identity and access-control core: organizations, developers and their API
//! tokens, end users with profiles, and the role/permission authorization
//! model. Every entity is soft-deleted, every mutation is one transaction,
//! and every component receives its [`Store`](db::store::Store) explicitly.
//!
//! ## Module Organization
//!
//! - `db`: store traits, PostgreSQL and in-memory backends, migrations
//! - `models`: entities and their admin/public views
//! - `services`: CRUD and relationship operations per entity
//! - `auth`: token lifecycle, password hashing, authorization engine, middleware
//! - `soft_delete`: tombstone policy
//! - `error`: operation-boundary error kinds
//! - `envelope`: the `{success, <entity>, message}` response shape

pub mod auth;
pub mod db;
pub mod envelope;
pub mod error;
pub mod models;
pub mod services;
pub mod soft_delete;

/// Current version of the Keyward shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
