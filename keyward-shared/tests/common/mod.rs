//! Shared fixtures for the core integration tests

#![allow(dead_code)]

use keyward_shared::auth::password::HashParams;
use keyward_shared::auth::tokens::TokenPolicy;
use keyward_shared::db::memory::MemoryStore;
use keyward_shared::models::developer::{Developer, NewDeveloper};
use keyward_shared::models::organization::{NewOrganization, Organization};
use keyward_shared::models::user::{NewUser, User};
use keyward_shared::services::{CoreConfig, Services};

/// Services over a fresh in-memory store
pub fn services(policy: TokenPolicy) -> (MemoryStore, Services<MemoryStore>) {
    let store = MemoryStore::new();
    let services = Services::new(
        store.clone(),
        CoreConfig {
            token_policy: policy,
            hash_params: HashParams::light(),
        },
    );
    (store, services)
}

/// The "Acme" organization with developer "svc1"
pub async fn acme(services: &Services<MemoryStore>) -> (Organization, Developer) {
    let org = services
        .organizations
        .create(NewOrganization {
            name: "Acme".to_string(),
        })
        .await
        .unwrap();
    let developer = services
        .developers
        .create(NewDeveloper {
            organization_id: org.id,
            name: "svc1".to_string(),
            role: None,
        })
        .await
        .unwrap();
    (org, developer)
}

pub async fn user(services: &Services<MemoryStore>, developer: &Developer, email: &str) -> User {
    services
        .users
        .create(
            developer.id,
            NewUser {
                email: email.to_string(),
                password: "correct horse".to_string(),
                is_staff: false,
            },
        )
        .await
        .unwrap()
}
