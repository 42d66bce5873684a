/// Integration tests for entity CRUD and the soft-delete policy
///
/// Run with: cargo test -p keyward-shared --test entity_store_tests

mod common;

use keyward_shared::auth::tokens::TokenPolicy;
use keyward_shared::envelope::Envelope;
use keyward_shared::error::ErrorKind;
use keyward_shared::models::developer::NewDeveloper;
use keyward_shared::models::organization::{NewOrganization, OrganizationChanges};
use keyward_shared::models::user::{NewUser, UserChanges};
use keyward_shared::models::user_profile::{NewUserProfile, UserProfileChanges};
use keyward_shared::models::view::Audience;
use uuid::Uuid;

fn org(name: &str) -> NewOrganization {
    NewOrganization {
        name: name.to_string(),
    }
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let (_, services) = common::services(TokenPolicy::never_expires());
    let created = services.organizations.create(org("Acme")).await.unwrap();

    let deleted = services.organizations.delete(created.id).await.unwrap();
    assert!(deleted.deleted_at.is_some());

    let err = services.organizations.get(created.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        err.to_string(),
        format!("Organization with id {} does not exist or is deleted", created.id)
    );

    // Second delete, update of a tombstone: both NotFound
    let err = services.organizations.delete(created.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = services
        .organizations
        .update(created.id, OrganizationChanges { name: Some("Acme 2".to_string()) })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // History still sees the row
    let history = services.organizations.history(created.id).await.unwrap();
    assert_eq!(history.id, created.id);
    assert_eq!(history.name, "Acme");
    assert!(history.deleted_at.is_some());
}

#[tokio::test]
async fn test_list_excludes_tombstones() {
    let (store, services) = common::services(TokenPolicy::never_expires());
    let a = services.organizations.create(org("A")).await.unwrap();
    services.organizations.create(org("B")).await.unwrap();
    services.organizations.delete(a.id).await.unwrap();

    let names: Vec<String> = services
        .organizations
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.name)
        .collect();
    assert_eq!(names, vec!["B".to_string()]);
    assert_eq!(store.row_count("organizations").await, 2);
}

#[tokio::test]
async fn test_unique_names_include_tombstones() {
    let (_, services) = common::services(TokenPolicy::never_expires());
    let first = services.organizations.create(org("Acme")).await.unwrap();

    let err = services.organizations.create(org("Acme")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.to_string(), "Organization with this name already exists");

    services.organizations.delete(first.id).await.unwrap();
    let err = services.organizations.create(org("Acme")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_rejected_create_leaves_no_rows() {
    let (store, services) = common::services(TokenPolicy::never_expires());

    let err = services.organizations.create(org("")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = services
        .developers
        .create(NewDeveloper {
            organization_id: Uuid::new_v4(),
            name: "svc1".to_string(),
            role: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(store.row_count("organizations").await, 0);
    assert_eq!(store.row_count("developers").await, 0);
    assert_eq!(store.row_count("developer_organizations").await, 0);
}

#[tokio::test]
async fn test_get_is_repeatable() {
    let (_, services) = common::services(TokenPolicy::never_expires());
    let (org, _) = common::acme(&services).await;

    let first = Envelope::entity(&services.organizations.get(org.id).await.unwrap(), Audience::Admin);
    let second = Envelope::entity(&services.organizations.get(org.id).await.unwrap(), Audience::Admin);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[tokio::test]
async fn test_developer_organizations() {
    let (_, services) = common::services(TokenPolicy::never_expires());
    let (acme, developer) = common::acme(&services).await;
    let globex = services.organizations.create(org("Globex")).await.unwrap();

    services
        .developers
        .attach(keyward_shared::models::developer_organization::NewDeveloperOrganization {
            developer_id: developer.id,
            organization_id: globex.id,
            role: Some("member".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(services.developers.organizations(developer.id).await.unwrap().len(), 2);

    // A deleted organization drops out of the developer's list
    services.organizations.delete(acme.id).await.unwrap();
    let orgs = services.developers.organizations(developer.id).await.unwrap();
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0].id, globex.id);

    services.developers.detach(developer.id, globex.id).await.unwrap();
    assert!(services.developers.organizations(developer.id).await.unwrap().is_empty());

    let err = services.developers.detach(developer.id, globex.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_user_lifecycle() {
    let (_, services) = common::services(TokenPolicy::never_expires());
    let (_, developer) = common::acme(&services).await;

    let user = services
        .users
        .create(
            developer.id,
            NewUser {
                email: "Ada@Example.COM".to_string(),
                password: "correct horse".to_string(),
                is_staff: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_ne!(user.password_hash, "correct horse");
    assert!(user.password_hash.starts_with("$argon2id$"));

    let err = services
        .users
        .create(
            developer.id,
            NewUser {
                email: "ada@example.com".to_string(),
                password: "another one".to_string(),
                is_staff: false,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let verified = services
        .users
        .verify_credentials(developer.id, "ada@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(verified.id, user.id);

    let err = services
        .users
        .verify_credentials(developer.id, "ada@example.com", "wrong horse")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    services
        .users
        .update(
            developer.id,
            user.id,
            UserChanges {
                password: Some("battery staple".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(services
        .users
        .verify_credentials(developer.id, "ada@example.com", "battery staple")
        .await
        .is_ok());

    services.users.delete(developer.id, user.id).await.unwrap();
    let err = services
        .users
        .verify_credentials(developer.id, "ada@example.com", "battery staple")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(services.users.history(developer.id, user.id).await.unwrap().deleted_at.is_some());
}

#[tokio::test]
async fn test_users_scoped_to_developer() {
    let (_, services) = common::services(TokenPolicy::never_expires());
    let (org, developer) = common::acme(&services).await;
    let other = services
        .developers
        .create(NewDeveloper {
            organization_id: org.id,
            name: "svc2".to_string(),
            role: None,
        })
        .await
        .unwrap();

    let user = common::user(&services, &developer, "ada@example.com").await;

    let err = services.users.get(other.id, user.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = services.users.delete(other.id, user.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(services.users.list_for_developer(other.id).await.unwrap().is_empty());
    assert_eq!(services.users.list_for_developer(developer.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_profile_lifecycle() {
    let (_, services) = common::services(TokenPolicy::never_expires());
    let (_, developer) = common::acme(&services).await;
    let user = common::user(&services, &developer, "ada@example.com").await;

    let input = NewUserProfile {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        phone_number: None,
        address: None,
        profile_picture_url: None,
    };

    let profile = services
        .users
        .create_profile(developer.id, user.id, input.clone())
        .await
        .unwrap();
    assert_eq!(profile.user_id, user.id);

    let err = services
        .users
        .create_profile(developer.id, user.id, input.clone())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let updated = services
        .users
        .update_profile(
            developer.id,
            user.id,
            UserProfileChanges {
                address: Some("12 St James's Square".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.first_name, "Ada");
    assert_eq!(updated.address.as_deref(), Some("12 St James's Square"));

    services.users.delete_profile(developer.id, user.id).await.unwrap();
    let err = services.users.profile(developer.id, user.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unavailable_store_reports_generic_message() {
    let (store, services) = common::services(TokenPolicy::never_expires());
    store.set_unavailable(true);

    let result = services.organizations.create(org("Acme")).await;
    let err = result.as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);

    let envelope = Envelope::from_result("create organization", result, |o| {
        Envelope::entity(&o, Audience::Admin)
    });
    assert!(!envelope.is_success());
    assert_eq!(envelope.message(), Some("Internal Server Error"));

    let body = serde_json::to_value(&envelope).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Internal Server Error");
}
