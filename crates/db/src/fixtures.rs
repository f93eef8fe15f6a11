use serde::Serialize;

use fieldquote_core::domain::catalog::TenantId;
pub use fieldquote_core::fixtures::{demo_catalog, DEMO_TENANT};

use crate::connection::DbPool;
use crate::repositories::{CatalogWriter, RepositoryError, SqlCatalogRepository};

/// Deterministic demo catalog: tiered cleaning, bundled installs, three zones.
pub struct DemoSeed;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub tenant_id: String,
    pub services: usize,
    pub combos: usize,
    pub additionals: usize,
    pub zones: usize,
    pub exceptions: usize,
}

impl DemoSeed {
    /// Replaces `tenant_id`'s catalog with the demo catalog.
    pub async fn load(pool: &DbPool, tenant_id: &TenantId) -> Result<SeedResult, RepositoryError> {
        let catalog = demo_catalog();
        SqlCatalogRepository::new(pool.clone()).save_catalog(tenant_id, &catalog).await?;

        Ok(SeedResult {
            tenant_id: tenant_id.0.clone(),
            services: catalog.services.len(),
            combos: catalog.combos.len(),
            additionals: catalog.additionals.len(),
            zones: catalog.zones.len(),
            exceptions: catalog.exceptions.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use fieldquote_core::domain::catalog::TenantId;

    use super::DemoSeed;
    use crate::repositories::{CatalogRepository, SqlCatalogRepository};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let tenant = TenantId("demo".to_string());

        let first = DemoSeed::load(&pool, &tenant).await.expect("first seed");
        let second = DemoSeed::load(&pool, &tenant).await.expect("second seed");
        assert_eq!(first, second);
        assert_eq!(first.services, 4);

        let loaded = SqlCatalogRepository::new(pool)
            .load_catalog(&tenant)
            .await
            .expect("load")
            .expect("tenant seeded");
        assert_eq!(loaded.zones.len(), first.zones);
    }
}
