/// First-run seeding
///
/// Every administrative route needs a developer token, so an empty
/// installation cannot create its first developer over HTTP. When
/// `BOOTSTRAP_ORGANIZATION` and `BOOTSTRAP_DEVELOPER` are set, startup
/// creates that organization and developer unless a developer with that
/// name already exists.
///
/// Deleted rows still reserve their names. A soft-deleted bootstrap
/// developer or organization is logged and left alone instead of failing
/// startup.

use crate::config::BootstrapConfig;
use keyward_shared::{
    db::{
        filter::Filter,
        record::Record,
        store::{Store, Transaction},
    },
    error::CoreResult,
    models::{
        developer::{Developer, NewDeveloper},
        organization::{NewOrganization, Organization},
    },
    services::Services,
};

/// Row with the given name, tombstones included
async fn find_by_name<S: Store, R: Record>(services: &Services<S>, name: &str) -> CoreResult<Option<R>> {
    let mut tx = services.store().begin().await?;
    Ok(tx
        .select_one::<R>(&Filter::with_deleted().eq("name", name))
        .await?)
}

/// Creates the configured organization and developer if missing
///
/// Returns the developer only when it was created by this call.
pub async fn seed<S: Store>(
    services: &Services<S>,
    config: &BootstrapConfig,
) -> CoreResult<Option<Developer>> {
    if let Some(existing) = find_by_name::<S, Developer>(services, &config.developer).await? {
        if existing.deleted_at.is_some() {
            tracing::warn!(
                developer = %config.developer,
                developer_id = %existing.id,
                "Bootstrap developer was deleted; skipping"
            );
        } else {
            tracing::debug!(developer = %config.developer, "Bootstrap developer already present");
        }
        return Ok(None);
    }

    let organization = match find_by_name::<S, Organization>(services, &config.organization).await? {
        Some(organization) if organization.deleted_at.is_some() => {
            tracing::warn!(
                organization = %config.organization,
                organization_id = %organization.id,
                "Bootstrap organization was deleted; skipping"
            );
            return Ok(None);
        }
        Some(organization) => organization,
        None => {
            services
                .organizations
                .create(NewOrganization {
                    name: config.organization.clone(),
                })
                .await?
        }
    };

    let developer = services
        .developers
        .create(NewDeveloper {
            organization_id: organization.id,
            name: config.developer.clone(),
            role: Some("owner".to_string()),
        })
        .await?;

    tracing::info!(
        developer_id = %developer.id,
        organization_id = %organization.id,
        api_token = %developer.api_token,
        "Bootstrap developer created"
    );
    Ok(Some(developer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_shared::db::memory::MemoryStore;
    use keyward_shared::services::CoreConfig;

    fn config() -> BootstrapConfig {
        BootstrapConfig {
            organization: "Acme".to_string(),
            developer: "svc1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_seed_creates_once() {
        let services = Services::new(MemoryStore::new(), CoreConfig::default());

        let created = seed(&services, &config()).await.unwrap().unwrap();
        assert_eq!(created.name, "svc1");
        assert!(services.tokens.authenticate(&created.api_token.to_string()).await.is_ok());

        assert!(seed(&services, &config()).await.unwrap().is_none());
        assert_eq!(services.organizations.list().await.unwrap().len(), 1);
        assert_eq!(services.developers.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_reuses_organization() {
        let services = Services::new(MemoryStore::new(), CoreConfig::default());
        let org = services
            .organizations
            .create(NewOrganization { name: "Acme".to_string() })
            .await
            .unwrap();

        let created = seed(&services, &config()).await.unwrap().unwrap();
        let orgs = services.developers.organizations(created.id).await.unwrap();
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].id, org.id);
    }

    #[tokio::test]
    async fn test_seed_skips_deleted_developer() {
        let services = Services::new(MemoryStore::new(), CoreConfig::default());
        let created = seed(&services, &config()).await.unwrap().unwrap();
        services.developers.delete(created.id).await.unwrap();

        assert!(seed(&services, &config()).await.unwrap().is_none());
        assert!(services.developers.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_skips_deleted_organization() {
        let services = Services::new(MemoryStore::new(), CoreConfig::default());
        let org = services
            .organizations
            .create(NewOrganization { name: "Acme".to_string() })
            .await
            .unwrap();
        services.organizations.delete(org.id).await.unwrap();

        assert!(seed(&services, &config()).await.unwrap().is_none());
        assert!(services.developers.list().await.unwrap().is_empty());
    }
}
