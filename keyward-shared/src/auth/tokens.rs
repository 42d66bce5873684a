/// Token lifecycle
///
/// Two credentials exist per developer:
///
/// - the **API token**, a random UUID stored on the developer row. It is
///   generated at creation and replaced wholesale by [`TokenLifecycle::regenerate`];
///   the previous value stops validating the moment the regeneration commits.
/// - the optional **session token** ([`Token`]), an independent opaque value
///   that can be issued, rotated and revoked.
///
/// # Concurrency
///
/// `regenerate` locks the developer row before writing. Concurrent
/// regenerations of the same developer therefore run one after the other,
/// and each caller receives the token its own write persisted; the last
/// commit is the token that validates afterwards.
///
/// # Failure disclosure
///
/// A wrong token is always reported as NotFound, never as a distinct
/// "invalid token" error. [`CoreError::TokenExpired`] is only returned once
/// the presented token has matched, so expiry reveals nothing to a caller
/// who does not hold the token.
///
/// # Example
///
/// ```
/// use keyward_shared::db::memory::MemoryStore;
/// use keyward_shared::models::developer::NewDeveloper;
/// use keyward_shared::models::organization::NewOrganization;
/// use keyward_shared::services::{CoreConfig, Services};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let services = Services::new(MemoryStore::new(), CoreConfig::default());
/// let org = services.organizations.create(NewOrganization { name: "Acme".into() }).await?;
/// let developer = services
///     .developers
///     .create(NewDeveloper { organization_id: org.id, name: "svc1".into(), role: None })
///     .await?;
///
/// let old = developer.api_token;
/// let rotated = services.tokens.regenerate(developer.id).await?;
/// assert_ne!(rotated.api_token, old);
/// assert!(services.tokens.validate(developer.id, &old.to_string()).await.is_err());
/// assert!(services.tokens.validate(developer.id, &rotated.api_token.to_string()).await.is_ok());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::credentials::{generate_api_token, generate_session_token, parse_api_token};
use crate::db::filter::Filter;
use crate::db::store::{Store, Transaction};
use crate::error::{CoreError, CoreResult};
use crate::models::developer::Developer;
use crate::models::token::Token;
use crate::models::EntityKind;
use crate::soft_delete::tombstone;

/// Id reported when a presented credential matches nothing
const UNKNOWN_CREDENTIAL: &str = "matching the presented token";

/// How long issued API tokens stay valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenPolicy {
    /// None = tokens never expire
    pub ttl: Option<Duration>,
}

impl TokenPolicy {
    pub fn never_expires() -> Self {
        Self { ttl: None }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl) }
    }

    /// Expiry of a token issued at `issued_at`
    ///
    /// An expiry past the last representable instant is treated as none.
    pub fn expiry_from(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.ttl.and_then(|ttl| issued_at.checked_add_signed(ttl))
    }
}

/// Issues, rotates and checks developer credentials
#[derive(Debug, Clone)]
pub struct TokenLifecycle<S: Store> {
    store: S,
    policy: TokenPolicy,
}

impl<S: Store> TokenLifecycle<S> {
    pub fn new(store: S, policy: TokenPolicy) -> Self {
        Self { store, policy }
    }

    /// Replaces the developer's API token with a fresh random one
    ///
    /// No grace period: the old token is invalid as soon as this commits.
    pub async fn regenerate(&self, developer_id: Uuid) -> CoreResult<Developer> {
        let mut tx = self.store.begin().await?;
        let mut developer = tx
            .fetch_for_update::<Developer>(developer_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Developer, developer_id))?;

        let now = Utc::now();
        developer.api_token = generate_api_token();
        developer.api_token_expires_at = self.policy.expiry_from(now);
        developer.updated_at = now;

        let developer = tx
            .update(&developer)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Developer, developer_id))?;
        tx.commit().await?;

        info!(entity = %EntityKind::Developer, id = %developer_id, "API token regenerated");
        Ok(developer)
    }

    /// Succeeds only for a live developer with this id holding this token
    pub async fn validate(&self, developer_id: Uuid, presented: &str) -> CoreResult<Developer> {
        let mismatch = || CoreError::not_found(EntityKind::Developer, developer_id);
        let token = parse_api_token(presented).ok_or_else(mismatch)?;

        let mut tx = self.store.begin().await?;
        let developer = tx
            .fetch::<Developer>(developer_id)
            .await?
            .filter(|d| d.api_token == token)
            .ok_or_else(mismatch)?;

        self.check_expiry(&developer)?;
        debug!(entity = %EntityKind::Developer, id = %developer_id, "API token validated");
        Ok(developer)
    }

    /// Resolves a bearer API token to its live, active developer
    pub async fn authenticate(&self, presented: &str) -> CoreResult<Developer> {
        let unknown = || CoreError::not_found(EntityKind::Developer, UNKNOWN_CREDENTIAL);
        let token = parse_api_token(presented).ok_or_else(unknown)?;

        let mut tx = self.store.begin().await?;
        let developer = tx
            .select_one::<Developer>(&Filter::live().eq("api_token", token))
            .await?
            .filter(|d| d.is_active)
            .ok_or_else(unknown)?;

        self.check_expiry(&developer)?;
        Ok(developer)
    }

    /// Creates the developer's session token
    ///
    /// Fails with Validation while a live session token exists.
    pub async fn issue_session(&self, developer_id: Uuid) -> CoreResult<Token> {
        let mut tx = self.store.begin().await?;
        tx.fetch_for_update::<Developer>(developer_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Developer, developer_id))?;

        if live_session(&mut tx, developer_id).await?.is_some() {
            return Err(CoreError::Validation(format!(
                "Developer {developer_id} already has a session token"
            )));
        }

        let token = tx
            .insert(&Token::new(developer_id, generate_session_token()))
            .await?;
        tx.commit().await?;

        info!(entity = %EntityKind::Token, id = %token.id, developer_id = %developer_id, "Created");
        Ok(token)
    }

    /// Replaces the value of the developer's live session token
    pub async fn rotate_session(&self, developer_id: Uuid) -> CoreResult<Token> {
        let mut tx = self.store.begin().await?;
        tx.fetch_for_update::<Developer>(developer_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Developer, developer_id))?;

        let mut token = live_session(&mut tx, developer_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Token, developer_id))?;
        token.token = generate_session_token();
        token.updated_at = Utc::now();

        let token = tx
            .update(&token)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Token, developer_id))?;
        tx.commit().await?;

        info!(entity = %EntityKind::Token, id = %token.id, developer_id = %developer_id, "Session token rotated");
        Ok(token)
    }

    /// Tombstones the developer's live session token
    pub async fn revoke_session(&self, developer_id: Uuid) -> CoreResult<Token> {
        let mut tx = self.store.begin().await?;
        let token = live_session(&mut tx, developer_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Token, developer_id))?;

        let revoked = tombstone::<Token, _>(&mut tx, token.id).await?;
        tx.commit().await?;

        info!(entity = %EntityKind::Token, id = %revoked.id, developer_id = %developer_id, "Deleted");
        Ok(revoked)
    }

    /// Resolves a session token value to its live, active developer
    pub async fn validate_session(&self, presented: &str) -> CoreResult<Developer> {
        let unknown = || CoreError::not_found(EntityKind::Token, UNKNOWN_CREDENTIAL);

        let mut tx = self.store.begin().await?;
        let token = tx
            .select_one::<Token>(&Filter::live().eq("token", presented.trim()))
            .await?
            .ok_or_else(unknown)?;

        tx.fetch::<Developer>(token.developer_id)
            .await?
            .filter(|d| d.is_active)
            .ok_or_else(unknown)
    }

    fn check_expiry(&self, developer: &Developer) -> CoreResult<()> {
        if developer.token_expired(Utc::now()) {
            return Err(CoreError::TokenExpired {
                developer_id: developer.id,
            });
        }
        Ok(())
    }
}

async fn live_session<T: Transaction>(tx: &mut T, developer_id: Uuid) -> CoreResult<Option<Token>> {
    Ok(tx
        .select_one::<Token>(&Filter::live().eq("developer_id", developer_id))
        .await?)
}
