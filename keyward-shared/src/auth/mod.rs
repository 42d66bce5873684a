/// Authentication and authorization
///
/// # Modules
///
/// - [`credentials`]: API token and session token generation
/// - [`password`]: Argon2id password hashing
/// - [`tokens`]: developer token lifecycle (regenerate, validate, sessions)
/// - [`authorization`]: user → role → permission evaluation
/// - [`middleware`]: Axum middleware gating the administrative API
///
/// Developer API tokens and user permissions are two separate tiers and are
/// never mixed.

pub mod authorization;
pub mod credentials;
pub mod middleware;
pub mod password;
pub mod tokens;
