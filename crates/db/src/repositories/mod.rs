use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use fieldquote_core::domain::catalog::{CatalogData, TenantId};
use fieldquote_core::errors::{CatalogLoadError, ConfigurationError};
use fieldquote_core::{CatalogIssue, CatalogSnapshot};

pub mod catalog;
pub mod memory;

pub use catalog::SqlCatalogRepository;
pub use memory::InMemoryCatalogRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("catalog rejected: {0}")]
    Integrity(#[from] ConfigurationError),
}

impl From<RepositoryError> for CatalogLoadError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Integrity(error) => Self::Integrity(error),
            other => Self::Storage(other.to_string()),
        }
    }
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// `None` when the tenant has never been saved.
    async fn load_catalog(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<CatalogData>, RepositoryError>;
}

#[async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Replaces the tenant's whole catalog. Catalogs that fail snapshot
    /// validation are rejected before anything is written.
    async fn save_catalog(
        &self,
        tenant_id: &TenantId,
        catalog: &CatalogData,
    ) -> Result<(), RepositoryError>;
}

pub(crate) fn build_snapshot(
    tenant_id: &TenantId,
    catalog: Option<CatalogData>,
) -> Result<Arc<CatalogSnapshot>, CatalogLoadError> {
    let catalog = catalog.ok_or_else(|| CatalogLoadError::TenantNotFound(tenant_id.0.clone()))?;
    let snapshot = CatalogSnapshot::build(catalog)?;
    for issue in snapshot.issues() {
        match issue {
            CatalogIssue::AmbiguousNeighborhood { neighborhood, zone_ids } => warn!(
                event_name = "catalog.integrity.ambiguous_neighborhood",
                tenant_id = %tenant_id.0,
                neighborhood = %neighborhood,
                zones = zone_ids.len(),
                "neighborhood is claimed by more than one zone"
            ),
        }
    }
    Ok(Arc::new(snapshot))
}
