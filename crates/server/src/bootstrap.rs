use std::sync::Arc;

use axum::Router;
use fieldquote_core::config::{AppConfig, ConfigError};
use fieldquote_core::{DeterministicQuoteResolver, QuoteService};
use fieldquote_db::{connect_with_settings, migrations, DbPool, SqlCatalogRepository};
use thiserror::Error;
use tracing::info;

use crate::{health, quotes};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub quote_service: Arc<QuoteService<SqlCatalogRepository>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

impl Application {
    pub fn router(&self) -> Router {
        Router::new()
            .merge(health::router(self.db_pool.clone()))
            .merge(quotes::router(Arc::clone(&self.quote_service)))
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let policy = config.pricing_policy();
    info!(
        event_name = "system.bootstrap.pricing_policy",
        correlation_id = "bootstrap",
        tier_modifiers = ?policy.tier_modifiers,
        line_rounding = ?policy.line_rounding,
        tier_overflow = ?policy.tier_overflow,
        "pricing policy loaded"
    );
    let quote_service = Arc::new(QuoteService::new(
        SqlCatalogRepository::new(db_pool.clone()),
        DeterministicQuoteResolver::new(policy),
    ));

    Ok(Application { config, db_pool, quote_service })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use fieldquote_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use fieldquote_core::domain::catalog::TenantId;
    use fieldquote_db::DemoSeed;
    use tower::ServiceExt;

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        let config = AppConfig::load(options)?;
        bootstrap_with_config(config).await
    }

    fn options(database_url: &str, log_level: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                log_level: Some(log_level.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_configuration() {
        let result = bootstrap(options("sqlite::memory:", "chatty")).await;

        let Err(error) = result else {
            panic!("invalid log level should fail bootstrap");
        };
        assert!(matches!(error, BootstrapError::Config(_)));
        assert!(error.to_string().contains("logging.level"));
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_serves_quotes_for_seeded_tenant() {
        let app = bootstrap(options("sqlite::memory:?cache=shared", "info"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('service', 'combo', 'zone', 'zone_exception')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("catalog tables should exist after bootstrap");
        assert_eq!(table_count, 4);

        DemoSeed::load(&app.db_pool, &TenantId("demo".to_string())).await.expect("seed");

        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/tenants/demo/quotes")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{
                            "neighborhood": "Centro",
                            "lines": [{"service_id": "install-9-12k", "quantity": 2}]
                        }"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1_000_000).await.expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["line_breakdown"][0]["kind"], "combo");

        app.db_pool.close().await;
    }
}
