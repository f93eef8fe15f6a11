use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use fieldquote_db::DbPool;
use serde::Serialize;

/// Tables the quote path reads on every request.
const CATALOG_TABLES: [&str; 4] = ["service", "combo", "zone", "zone_exception"];

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

impl HealthCheck {
    fn ready(detail: impl Into<String>) -> Self {
        Self { status: "ready", detail: detail.into() }
    }

    fn degraded(detail: impl Into<String>) -> Self {
        Self { status: "degraded", detail: detail.into() }
    }

    fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: HealthCheck,
    pub catalog_schema: HealthCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let catalog_schema = if database.is_ready() {
        catalog_schema_check(&state.db_pool).await
    } else {
        HealthCheck::degraded("skipped because the database is unreachable")
    };
    let ready = database.is_ready() && catalog_schema.is_ready();

    if !ready {
        tracing::warn!(
            event_name = "system.health.degraded",
            database = %database.detail,
            catalog_schema = %catalog_schema.detail,
            "health probe degraded"
        );
    }

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        database,
        catalog_schema,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck::ready("database query succeeded"),
        Err(error) => HealthCheck::degraded(format!("database query failed: {error}")),
    }
}

async fn catalog_schema_check(pool: &DbPool) -> HealthCheck {
    let placeholders = vec!["?"; CATALOG_TABLES.len()].join(", ");
    let sql = format!(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ({placeholders})"
    );
    let query = CATALOG_TABLES
        .iter()
        .fold(sqlx::query_scalar::<sqlx::Sqlite, i64>(&sql), |query, table| query.bind(*table));

    match query.fetch_one(pool).await {
        Ok(count) if count == CATALOG_TABLES.len() as i64 => {
            HealthCheck::ready("catalog tables present")
        }
        Ok(count) => HealthCheck::degraded(format!(
            "catalog schema incomplete: {count} of {} tables present; run migrations",
            CATALOG_TABLES.len()
        )),
        Err(error) => HealthCheck::degraded(format!("catalog schema probe failed: {error}")),
    }
}
