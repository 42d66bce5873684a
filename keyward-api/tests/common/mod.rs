/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - In-memory store and services with cheap password hashing
/// - A seeded organization and developer
/// - Request helpers returning status and JSON body

use axum::body::Body;
use axum::http::{Request, StatusCode};
use keyward_api::app::{build_router, AppState};
use keyward_api::config::Config;
use keyward_shared::auth::password::HashParams;
use keyward_shared::db::memory::MemoryStore;
use keyward_shared::models::developer::{Developer, NewDeveloper};
use keyward_shared::models::organization::{NewOrganization, Organization};
use keyward_shared::services::{CoreConfig, Services};
use serde_json::Value;
use tower::Service as _;

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: MemoryStore,
    pub services: Services<MemoryStore>,
    pub app: axum::Router,
    pub organization: Organization,
    pub developer: Developer,
}

impl TestContext {
    /// Creates a context around a fresh in-memory store
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgresql://localhost/keyward_test".to_string()),
            _ => None,
        })?;

        let store = MemoryStore::new();
        let services = Services::new(
            store.clone(),
            CoreConfig {
                hash_params: HashParams::light(),
                ..config.core_config()
            },
        );

        let organization = services
            .organizations
            .create(NewOrganization {
                name: "Acme".to_string(),
            })
            .await?;
        let developer = services
            .developers
            .create(NewDeveloper {
                organization_id: organization.id,
                name: "svc1".to_string(),
                role: None,
            })
            .await?;

        let app = build_router(AppState::with_services(services.clone(), config));

        Ok(Self {
            store,
            services,
            app,
            organization,
            developer,
        })
    }

    /// Gets the authorization header for the seeded developer
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.developer.api_token)
    }

    /// Sends an authenticated request as the seeded developer
    pub async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, Some(self.auth_header()), body).await
    }

    /// Sends a request with an explicit (or no) Authorization header
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        authorization: Option<String>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}
