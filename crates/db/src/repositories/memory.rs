use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use fieldquote_core::domain::catalog::{CatalogData, TenantId};
use fieldquote_core::errors::CatalogLoadError;
use fieldquote_core::{CatalogProvider, CatalogSnapshot};

use super::{build_snapshot, CatalogRepository, CatalogWriter, RepositoryError};

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    catalogs: RwLock<HashMap<TenantId, CatalogData>>,
}

impl InMemoryCatalogRepository {
    pub fn with_catalog(tenant_id: TenantId, catalog: CatalogData) -> Self {
        Self { catalogs: RwLock::new(HashMap::from([(tenant_id, catalog)])) }
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn load_catalog(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<CatalogData>, RepositoryError> {
        let catalogs = self.catalogs.read().await;
        Ok(catalogs.get(tenant_id).cloned())
    }
}

#[async_trait]
impl CatalogWriter for InMemoryCatalogRepository {
    async fn save_catalog(
        &self,
        tenant_id: &TenantId,
        catalog: &CatalogData,
    ) -> Result<(), RepositoryError> {
        CatalogSnapshot::build(catalog.clone())?;
        let mut catalogs = self.catalogs.write().await;
        catalogs.insert(tenant_id.clone(), catalog.clone());
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalogRepository {
    async fn load_snapshot(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Arc<CatalogSnapshot>, CatalogLoadError> {
        let catalog = self.load_catalog(tenant_id).await?;
        build_snapshot(tenant_id, catalog)
    }
}

#[cfg(test)]
mod tests {
    use fieldquote_core::domain::catalog::TenantId;
    use fieldquote_core::errors::{CatalogLoadError, ConfigurationError};
    use fieldquote_core::fixtures::demo_catalog;
    use fieldquote_core::CatalogProvider;

    use crate::repositories::{
        CatalogRepository, CatalogWriter, InMemoryCatalogRepository, RepositoryError,
    };

    #[tokio::test]
    async fn in_memory_repository_round_trip() {
        let repository = InMemoryCatalogRepository::default();
        let tenant = TenantId("demo".to_string());

        repository.save_catalog(&tenant, &demo_catalog()).await.expect("save");
        let loaded = repository.load_catalog(&tenant).await.expect("load");
        assert_eq!(loaded, Some(demo_catalog()));

        let snapshot = repository.load_snapshot(&tenant).await.expect("snapshot");
        assert_eq!(snapshot.zones().len(), 3);
    }

    #[tokio::test]
    async fn in_memory_repository_rejects_invalid_catalogs() {
        let repository = InMemoryCatalogRepository::default();
        let mut broken = demo_catalog();
        broken.zones.iter_mut().for_each(|zone| zone.is_default = true);

        let error = repository
            .save_catalog(&TenantId("demo".to_string()), &broken)
            .await
            .expect_err("two default zones");
        assert!(matches!(
            error,
            RepositoryError::Integrity(ConfigurationError::MultipleDefaultZones { .. })
        ));
    }

    #[tokio::test]
    async fn preloaded_catalog_is_validated_on_load() {
        let mut broken = demo_catalog();
        broken.exceptions[0].zone_id.0 = "zone-gone".to_string();
        let repository =
            InMemoryCatalogRepository::with_catalog(TenantId("demo".to_string()), broken);

        let error =
            repository.load_snapshot(&TenantId("demo".to_string())).await.expect_err("invalid");
        assert!(matches!(
            error,
            CatalogLoadError::Integrity(ConfigurationError::UnknownExceptionZone { .. })
        ));

        let missing =
            repository.load_snapshot(&TenantId("acme".to_string())).await.expect_err("missing");
        assert_eq!(missing, CatalogLoadError::TenantNotFound("acme".to_string()));
    }
}
