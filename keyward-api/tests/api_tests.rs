/// Integration tests for the Keyward API
///
/// These tests drive the full router against the in-memory store:
/// - Health and authentication gates
/// - Entity CRUD with soft delete and the envelope shape
/// - Token validation and regeneration
/// - User scoping, credentials and profiles
/// - Role/permission grants, effective permissions and the permission gate

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.store.set_unavailable(true);
    let (status, body) = ctx.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_authentication_required() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send("GET", "/v1/organizations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Authentication token is missing");

    let (status, _) = ctx
        .send("GET", "/v1/organizations", Some("Token abc".to_string()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .send(
            "GET",
            "/v1/organizations",
            Some(format!("Bearer {}", Uuid::new_v4())),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication failed");
}

#[tokio::test]
async fn test_organization_lifecycle() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .call("POST", "/v1/organizations", Some(json!({ "name": "Globex" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["organization"]["name"], "Globex");
    let id = body["organization"]["id"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .call("POST", "/v1/organizations", Some(json!({ "name": "Globex" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Organization with this name already exists");

    let (status, body) = ctx
        .call(
            "PUT",
            &format!("/v1/organizations/{}", id),
            Some(json!({ "name": "Globex Corp" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["organization"]["name"], "Globex Corp");

    let (status, body) = ctx.call("GET", &format!("/v1/organizations/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, again) = ctx.call("GET", &format!("/v1/organizations/{}", id), None).await;
    assert_eq!(body, again);

    let (status, body) = ctx.call("DELETE", &format!("/v1/organizations/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["organization"]["deleted_at"].is_string());

    let (status, body) = ctx.call("GET", &format!("/v1/organizations/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        format!("Organization with id {} does not exist or is deleted", id)
    );

    let (status, body) = ctx.call("GET", "/v1/organizations", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["organizations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Acme"]);
}

#[tokio::test]
async fn test_malformed_input_uses_envelope() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .call("POST", "/v1/organizations", Some(json!({ "title": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = ctx.call("GET", "/v1/organizations/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = ctx
        .call("POST", "/v1/organizations", Some(json!({ "name": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validate_and_regenerate_token() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx.developer.id;
    let old_token = ctx.developer.api_token.to_string();
    let validate_uri = format!("/v1/developers/{}/validate-token", id);

    // Checking a token needs a developer token of its own
    let (status, body) = ctx
        .send("POST", &validate_uri, None, Some(json!({ "token": old_token })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("developer").is_none());

    let (status, body) = ctx
        .call("POST", &validate_uri, Some(json!({ "token": old_token })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["developer"]["name"], "svc1");
    assert!(body["developer"].get("api_token").is_none());

    let (status, _) = ctx
        .call(
            "POST",
            &validate_uri,
            Some(json!({ "token": Uuid::new_v4().to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .call("POST", &format!("/v1/developers/{}/regenerate-token", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_token = body["developer"]["api_token"].as_str().unwrap().to_string();
    assert_ne!(new_token, old_token);

    // The old token no longer authenticates
    let (status, _) = ctx.call("GET", "/v1/organizations", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let bearer = Some(format!("Bearer {}", new_token));
    let (status, _) = ctx
        .send("POST", &validate_uri, bearer.clone(), Some(json!({ "token": old_token })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send("POST", &validate_uri, bearer.clone(), Some(json!({ "token": new_token })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.send("GET", "/v1/organizations", bearer, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_developer_views_hide_other_tokens() {
    let ctx = TestContext::new().await.unwrap();

    let (_, body) = ctx
        .call(
            "POST",
            "/v1/developers",
            Some(json!({ "organization_id": ctx.organization.id, "name": "svc2" })),
        )
        .await;
    let other = body["developer"]["id"].as_str().unwrap().to_string();

    let (status, body) = ctx.call("GET", &format!("/v1/developers/{}", other), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["developer"]["name"], "svc2");
    assert!(body["developer"].get("api_token").is_none());

    let (_, body) = ctx
        .call("GET", &format!("/v1/developers/{}", ctx.developer.id), None)
        .await;
    assert_eq!(
        body["developer"]["api_token"],
        ctx.developer.api_token.to_string().as_str()
    );

    let (_, body) = ctx.call("GET", "/v1/developers", None).await;
    let developers = body["developers"].as_array().unwrap();
    assert_eq!(developers.len(), 2);
    for developer in developers {
        let is_caller = developer["id"] == ctx.developer.id.to_string().as_str();
        assert_eq!(developer.get("api_token").is_some(), is_caller);
    }
}

#[tokio::test]
async fn test_developer_create_links_organization() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .call(
            "POST",
            "/v1/developers",
            Some(json!({ "organization_id": ctx.organization.id, "name": "svc2" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["developer"]["api_token"].is_string());
    let id = body["developer"]["id"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .call("GET", &format!("/v1/developers/{}/organizations", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["organizations"][0]["name"], "Acme");

    let (status, _) = ctx
        .call(
            "POST",
            "/v1/developers",
            Some(json!({ "organization_id": Uuid::new_v4(), "name": "svc3" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_attach_and_detach() {
    let ctx = TestContext::new().await.unwrap();
    let dev = ctx.developer.id;

    let (_, body) = ctx
        .call("POST", "/v1/organizations", Some(json!({ "name": "Initech" })))
        .await;
    let org = body["organization"]["id"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .call(
            "POST",
            &format!("/v1/developers/{}/organizations", dev),
            Some(json!({ "organization_id": org, "role": "member" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["developer_organization"]["role"], "member");

    let (_, body) = ctx
        .call("GET", &format!("/v1/developers/{}/organizations", dev), None)
        .await;
    assert_eq!(body["organizations"].as_array().unwrap().len(), 2);

    let (status, _) = ctx
        .call(
            "DELETE",
            &format!("/v1/developers/{}/organizations/{}", dev, org),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx
        .call("GET", &format!("/v1/developers/{}/organizations", dev), None)
        .await;
    assert_eq!(body["organizations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_session_token_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let uri = format!("/v1/developers/{}/session-token", ctx.developer.id);

    let (status, body) = ctx.call("POST", &uri, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let first = body["token"]["token"].as_str().unwrap().to_string();
    assert_eq!(first.len(), 64);

    let (status, _) = ctx.call("POST", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx.call("POST", &format!("{}/rotate", uri), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["token"]["token"].as_str().unwrap(), first);

    let (status, _) = ctx.call("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.call("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.call("POST", &uri, None).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_users_are_scoped_to_developer() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .call(
            "POST",
            "/v1/users",
            Some(json!({ "email": "Ada@Example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());
    let user_id = body["user"]["id"].as_str().unwrap().to_string();

    let (status, _) = ctx.call("GET", &format!("/v1/users/{}", user_id), None).await;
    assert_eq!(status, StatusCode::OK);

    // A second developer cannot see the first developer's user
    let other = ctx
        .services
        .developers
        .create(keyward_shared::models::developer::NewDeveloper {
            organization_id: ctx.organization.id,
            name: "svc2".to_string(),
            role: None,
        })
        .await
        .unwrap();
    let other_auth = Some(format!("Bearer {}", other.api_token));

    let (status, _) = ctx
        .send("GET", &format!("/v1/users/{}", user_id), other_auth.clone(), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = ctx.send("GET", "/v1/users", other_auth, None).await;
    assert!(body["users"].as_array().unwrap().is_empty());

    let (status, _) = ctx
        .call(
            "POST",
            "/v1/users",
            Some(json!({ "email": "not-an-email", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_credentials() {
    let ctx = TestContext::new().await.unwrap();

    ctx.call(
        "POST",
        "/v1/users",
        Some(json!({ "email": "ada@example.com", "password": "correct horse" })),
    )
    .await;

    let (status, body) = ctx
        .call(
            "POST",
            "/v1/users/verify-credentials",
            Some(json!({ "email": "ADA@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@example.com");

    let (status, body) = ctx
        .call(
            "POST",
            "/v1/users/verify-credentials",
            Some(json!({ "email": "ada@example.com", "password": "wrong horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_profile_lifecycle() {
    let ctx = TestContext::new().await.unwrap();

    let (_, body) = ctx
        .call(
            "POST",
            "/v1/users",
            Some(json!({ "email": "ada@example.com", "password": "correct horse" })),
        )
        .await;
    let uri = format!("/v1/users/{}/profile", body["user"]["id"].as_str().unwrap());

    let (status, _) = ctx.call("GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .call(
            "POST",
            &uri,
            Some(json!({ "first_name": "Ada", "last_name": "Lovelace" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["profile"]["first_name"], "Ada");

    let (status, body) = ctx
        .call("PUT", &uri, Some(json!({ "phone_number": "555-0100" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["phone_number"], "555-0100");
    assert_eq!(body["profile"]["last_name"], "Lovelace");

    let (status, _) = ctx.call("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.call("GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_effective_permissions() {
    let ctx = TestContext::new().await.unwrap();

    let (_, body) = ctx
        .call(
            "POST",
            "/v1/users",
            Some(json!({ "email": "ada@example.com", "password": "correct horse" })),
        )
        .await;
    let user = body["user"]["id"].as_str().unwrap().to_string();

    let (_, body) = ctx
        .call("POST", "/v1/roles", Some(json!({ "name": "admin" })))
        .await;
    let role = body["role"]["id"].as_str().unwrap().to_string();

    let (_, body) = ctx
        .call("POST", "/v1/permissions", Some(json!({ "name": "manage_orgs" })))
        .await;
    let permission = body["permission"]["id"].as_str().unwrap().to_string();

    let check_uri = format!("/v1/users/{}/permissions/manage_orgs", user);
    let (status, body) = ctx.call("GET", &check_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permission"]["granted"], false);

    let (status, _) = ctx
        .call(
            "POST",
            &format!("/v1/roles/{}/permissions", role),
            Some(json!({ "permission_id": permission })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = ctx
        .call(
            "POST",
            &format!("/v1/users/{}/roles", user),
            Some(json!({ "role_id": role })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let grant = body["user_role"]["id"].as_str().unwrap().to_string();

    // Granting again returns the same grant
    let (_, body) = ctx
        .call(
            "POST",
            &format!("/v1/users/{}/roles", user),
            Some(json!({ "role_id": role })),
        )
        .await;
    assert_eq!(body["user_role"]["id"], grant.as_str());

    let (_, body) = ctx.call("GET", &check_uri, None).await;
    assert_eq!(body["permission"]["granted"], true);

    let (_, body) = ctx
        .call("GET", &format!("/v1/users/{}/permissions", user), None)
        .await;
    assert_eq!(body["permissions"][0]["name"], "manage_orgs");

    let (_, body) = ctx.call("GET", &format!("/v1/users/{}/roles", user), None).await;
    assert_eq!(body["roles"][0]["name"], "admin");

    let (status, _) = ctx.call("DELETE", &format!("/v1/user-roles/{}", grant), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx.call("GET", &check_uri, None).await;
    assert_eq!(body["permission"]["granted"], false);
}

#[tokio::test]
async fn test_authorize_answers_forbidden() {
    let ctx = TestContext::new().await.unwrap();

    let (_, body) = ctx
        .call(
            "POST",
            "/v1/users",
            Some(json!({ "email": "ada@example.com", "password": "correct horse" })),
        )
        .await;
    let user = body["user"]["id"].as_str().unwrap().to_string();
    let authorize_uri = format!("/v1/users/{}/authorize/manage_orgs", user);

    let (status, body) = ctx.call("GET", &authorize_uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing permission: manage_orgs");

    let (_, body) = ctx
        .call("POST", "/v1/roles", Some(json!({ "name": "admin" })))
        .await;
    let role = body["role"]["id"].as_str().unwrap().to_string();
    let (_, body) = ctx
        .call("POST", "/v1/permissions", Some(json!({ "name": "manage_orgs" })))
        .await;
    let permission = body["permission"]["id"].as_str().unwrap().to_string();
    ctx.call(
        "POST",
        &format!("/v1/roles/{}/permissions", role),
        Some(json!({ "permission_id": permission })),
    )
    .await;
    ctx.call(
        "POST",
        &format!("/v1/users/{}/roles", user),
        Some(json!({ "role_id": role })),
    )
    .await;

    let (status, body) = ctx.call("GET", &authorize_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Permission granted");

    // Unknown user stays 404, not 403
    let (status, _) = ctx
        .call("GET", &format!("/v1/users/{}/authorize/manage_orgs", Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_role_stops_contributing() {
    let ctx = TestContext::new().await.unwrap();

    let (_, body) = ctx
        .call(
            "POST",
            "/v1/users",
            Some(json!({ "email": "ada@example.com", "password": "correct horse" })),
        )
        .await;
    let user = body["user"]["id"].as_str().unwrap().to_string();
    let (_, body) = ctx.call("POST", "/v1/roles", Some(json!({ "name": "admin" }))).await;
    let role = body["role"]["id"].as_str().unwrap().to_string();
    let (_, body) = ctx
        .call("POST", "/v1/permissions", Some(json!({ "name": "manage_orgs" })))
        .await;
    let permission = body["permission"]["id"].as_str().unwrap().to_string();

    ctx.call(
        "POST",
        &format!("/v1/roles/{}/permissions", role),
        Some(json!({ "permission_id": permission })),
    )
    .await;
    ctx.call(
        "POST",
        &format!("/v1/users/{}/roles", user),
        Some(json!({ "role_id": role })),
    )
    .await;

    let (status, _) = ctx.call("DELETE", &format!("/v1/roles/{}", role), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx
        .call("GET", &format!("/v1/users/{}/permissions", user), None)
        .await;
    assert!(body["permissions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unavailable_store_hides_details() {
    let ctx = TestContext::new().await.unwrap();
    ctx.store.set_unavailable(true);

    let (status, body) = ctx.call("GET", "/v1/organizations", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Internal Server Error");
}
