use fieldquote_core::config::LoadOptions;
use fieldquote_core::domain::catalog::TenantId;
use fieldquote_core::errors::{ApplicationError, CatalogLoadError};
use fieldquote_core::{CatalogIssue, CatalogSnapshot};
use fieldquote_db::{CatalogRepository, SqlCatalogRepository};
use serde::Serialize;

use crate::commands::{build_runtime, load_config, open_pool, CommandResult, EXIT_CATALOG};

#[derive(Debug, Serialize)]
struct CatalogReport {
    tenant_id: String,
    services: usize,
    combos: usize,
    active_combos: usize,
    additionals: usize,
    zones: usize,
    exceptions: usize,
    issues: Vec<CatalogIssue>,
}

/// Loads a tenant's catalog, builds the snapshot, and reports integrity findings.
pub fn check(options: &LoadOptions, tenant: &str) -> CommandResult {
    let config = match load_config("catalog", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let runtime = match build_runtime("catalog") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let tenant_id = TenantId(tenant.to_string());
    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let loaded = SqlCatalogRepository::new(pool.clone()).load_catalog(&tenant_id).await;
        pool.close().await;

        let data = match loaded {
            Ok(Some(data)) => data,
            Ok(None) => {
                let error = CatalogLoadError::TenantNotFound(tenant_id.0.clone());
                return Err((catalog_error_class(error.clone()), error.to_string(), EXIT_CATALOG));
            }
            Err(error) => {
                let error = CatalogLoadError::from(error);
                return Err((catalog_error_class(error.clone()), error.to_string(), EXIT_CATALOG));
            }
        };

        let snapshot = CatalogSnapshot::build(data)
            .map_err(|error| ("catalog_configuration", error.to_string(), EXIT_CATALOG))?;
        Ok(report(&tenant_id, &snapshot))
    });

    match result {
        Ok(report) => {
            for issue in &report.issues {
                tracing::warn!(
                    event_name = "catalog.check.issue",
                    tenant_id = %report.tenant_id,
                    issue = ?issue,
                    "catalog integrity issue"
                );
            }
            let message = if report.issues.is_empty() {
                format!("catalog for tenant `{}` is consistent", report.tenant_id)
            } else {
                format!(
                    "catalog for tenant `{}` is usable with {} integrity issue(s)",
                    report.tenant_id,
                    report.issues.len()
                )
            };
            CommandResult::success_with_data("catalog", message, report)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("catalog", error_class, message, exit_code)
        }
    }
}

fn catalog_error_class(error: CatalogLoadError) -> &'static str {
    ApplicationError::Catalog(error).error_class()
}

fn report(tenant_id: &TenantId, snapshot: &CatalogSnapshot) -> CatalogReport {
    let data = snapshot.data();
    CatalogReport {
        tenant_id: tenant_id.0.clone(),
        services: data.services.len(),
        combos: data.combos.len(),
        active_combos: snapshot.active_combos().count(),
        additionals: data.additionals.len(),
        zones: data.zones.len(),
        exceptions: data.exceptions.len(),
        issues: snapshot.issues().to_vec(),
    }
}
