/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// The router is generic over the [`Store`] so the same routes run against
/// PostgreSQL in production and the in-memory store in tests.
///
/// # Example
///
/// ```no_run
/// use keyward_api::{app::AppState, config::Config};
/// use keyward_shared::db::{pool::create_pool, postgres::PgStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.clone()).await?;
/// let state = AppState::new(PgStore::new(pool), config);
/// let app = keyward_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use keyward_shared::auth::middleware::developer_auth;
use keyward_shared::db::store::Store;
use keyward_shared::services::Services;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; the
/// services only hold store handles, so cloning is cheap.
#[derive(Clone)]
pub struct AppState<S: Store> {
    /// Core services, all sharing one store
    pub services: Services<S>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl<S: Store> AppState<S> {
    /// Creates new application state
    pub fn new(store: S, config: Config) -> Self {
        Self {
            services: Services::new(store, config.core_config()),
            config: Arc::new(config),
        }
    }

    /// Creates state around already-built services
    pub fn with_services(services: Services<S>, config: Config) -> Self {
        Self {
            services,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                   # Health check (public)
/// └── /v1/
///     ├── /organizations[/:id]                  # developer token
///     ├── /developers[/:id[/...]]               # developer token
///     ├── /users[/:id[/...]]                    # developer token, caller's users only
///     ├── /user-roles/:id                       # developer token
///     ├── /roles[/:id[/permissions]]            # developer token
///     ├── /role-permissions/:id                 # developer token
///     └── /permissions[/:id]                    # developer token
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Developer authentication (protected routes only)
pub fn build_router<S: Store>(state: AppState<S>) -> Router {
    use crate::routes::{access, developers, health, organizations, users};

    let health_routes = Router::new().route("/health", get(health::health_check::<S>));

    let organization_routes = Router::new()
        .route(
            "/organizations",
            post(organizations::create::<S>).get(organizations::list::<S>),
        )
        .route(
            "/organizations/:id",
            get(organizations::get::<S>)
                .put(organizations::update::<S>)
                .delete(organizations::delete::<S>),
        );

    let developer_routes = Router::new()
        .route(
            "/developers",
            post(developers::create::<S>).get(developers::list::<S>),
        )
        .route(
            "/developers/:id",
            get(developers::get::<S>)
                .put(developers::update::<S>)
                .delete(developers::delete::<S>),
        )
        .route(
            "/developers/:id/validate-token",
            post(developers::validate_token::<S>),
        )
        .route(
            "/developers/:id/regenerate-token",
            post(developers::regenerate_token::<S>),
        )
        .route(
            "/developers/:id/session-token",
            post(developers::issue_session::<S>).delete(developers::revoke_session::<S>),
        )
        .route(
            "/developers/:id/session-token/rotate",
            post(developers::rotate_session::<S>),
        )
        .route(
            "/developers/:id/organizations",
            get(developers::organizations::<S>).post(developers::attach::<S>),
        )
        .route(
            "/developers/:id/organizations/:organization_id",
            delete(developers::detach::<S>),
        );

    let user_routes = Router::new()
        .route("/users", post(users::create::<S>).get(users::list::<S>))
        .route(
            "/users/verify-credentials",
            post(users::verify_credentials::<S>),
        )
        .route(
            "/users/:id",
            get(users::get::<S>)
                .put(users::update::<S>)
                .delete(users::delete::<S>),
        )
        .route(
            "/users/:id/profile",
            get(users::get_profile::<S>)
                .post(users::create_profile::<S>)
                .put(users::update_profile::<S>)
                .delete(users::delete_profile::<S>),
        )
        .route("/users/:id/permissions", get(users::permissions::<S>))
        .route(
            "/users/:id/permissions/:name",
            get(users::has_permission::<S>),
        )
        .route("/users/:id/authorize/:name", get(users::authorize::<S>))
        .route(
            "/users/:id/roles",
            post(users::assign_role::<S>).get(users::roles::<S>),
        )
        .route("/user-roles/:id", delete(users::revoke_role::<S>));

    let access_routes = Router::new()
        .route(
            "/roles",
            post(access::create_role::<S>).get(access::list_roles::<S>),
        )
        .route(
            "/roles/:id",
            get(access::get_role::<S>)
                .put(access::update_role::<S>)
                .delete(access::delete_role::<S>),
        )
        .route(
            "/roles/:id/permissions",
            post(access::grant_permission::<S>).get(access::role_permissions::<S>),
        )
        .route(
            "/role-permissions/:id",
            delete(access::revoke_permission::<S>),
        )
        .route(
            "/permissions",
            post(access::create_permission::<S>).get(access::list_permissions::<S>),
        )
        .route(
            "/permissions/:id",
            get(access::get_permission::<S>)
                .put(access::update_permission::<S>)
                .delete(access::delete_permission::<S>),
        );

    let protected_routes = Router::new()
        .merge(organization_routes)
        .merge(developer_routes)
        .merge(user_routes)
        .merge(access_routes)
        .layer(from_fn_with_state(
            state.services.tokens.clone(),
            developer_auth::<S>,
        ));

    // Configure CORS based on configured origins
    let cors = if state.config.cors_permissive() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
