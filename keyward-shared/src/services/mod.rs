/// Core operations
///
/// [`Services`] bundles every component around one injected [`Store`].
/// There is no global registry: whoever builds `Services` decides which
/// backend all components share.
///
/// # Example
///
/// ```
/// use keyward_shared::db::memory::MemoryStore;
/// use keyward_shared::models::organization::NewOrganization;
/// use keyward_shared::services::{CoreConfig, Services};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let services = Services::new(MemoryStore::new(), CoreConfig::default());
/// let org = services.organizations.create(NewOrganization { name: "Acme".into() }).await?;
/// assert_eq!(services.organizations.get(org.id).await?, org);
/// # Ok(())
/// # }
/// ```

pub mod access;
pub mod crud;
pub mod developers;
pub mod organizations;
pub mod users;

use crate::auth::authorization::Authorizer;
use crate::auth::password::HashParams;
use crate::auth::tokens::{TokenLifecycle, TokenPolicy};
use crate::db::store::Store;

pub use access::Access;
pub use developers::Developers;
pub use organizations::Organizations;
pub use users::Users;

/// Tunables shared by the core components
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreConfig {
    pub token_policy: TokenPolicy,
    pub hash_params: HashParams,
}

/// Every core component, wired to the same store
#[derive(Debug, Clone)]
pub struct Services<S: Store> {
    pub organizations: Organizations<S>,
    pub developers: Developers<S>,
    pub users: Users<S>,
    pub access: Access<S>,
    pub tokens: TokenLifecycle<S>,
    pub authorizer: Authorizer<S>,
    store: S,
}

impl<S: Store> Services<S> {
    pub fn new(store: S, config: CoreConfig) -> Self {
        Self {
            organizations: Organizations::new(store.clone()),
            developers: Developers::new(store.clone(), config.token_policy),
            users: Users::new(store.clone(), config.hash_params),
            access: Access::new(store.clone()),
            tokens: TokenLifecycle::new(store.clone(), config.token_policy),
            authorizer: Authorizer::new(store.clone()),
            store,
        }
    }

    /// The shared store
    pub fn store(&self) -> &S {
        &self.store
    }
}
