use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use tracing::info;

use fieldquote_core::domain::catalog::{
    Additional, AdditionalId, CatalogData, Combo, ComboId, ComboItem, ExceptionKind, OptionId,
    PricingTier, Service, ServiceId, TenantId, Variable, VariableId, VariableOption, Zone,
    ZoneException, ZoneId,
};
use fieldquote_core::errors::CatalogLoadError;
use fieldquote_core::{CatalogProvider, CatalogSnapshot};

use super::{build_snapshot, CatalogRepository, CatalogWriter, RepositoryError};
use crate::DbPool;

/// Children first so a replace never trips a foreign key.
const CLEAR_TENANT_CATALOG: &[&str] = &[
    "DELETE FROM zone_exception WHERE tenant_id = ?",
    "DELETE FROM zone_neighborhood WHERE tenant_id = ?",
    "DELETE FROM zone WHERE tenant_id = ?",
    "DELETE FROM additional_category WHERE tenant_id = ?",
    "DELETE FROM additional WHERE tenant_id = ?",
    "DELETE FROM combo_item WHERE tenant_id = ?",
    "DELETE FROM combo WHERE tenant_id = ?",
    "DELETE FROM variable_option WHERE tenant_id = ?",
    "DELETE FROM service_variable WHERE tenant_id = ?",
    "DELETE FROM service_tier WHERE tenant_id = ?",
    "DELETE FROM service WHERE tenant_id = ?",
];

/// SQLite-backed tenant catalog. Every record carries a `position` column so
/// catalog order survives storage; zone first-match and combo tie-breaks
/// depend on it.
pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn load_catalog(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<CatalogData>, RepositoryError> {
        let tenant = tenant_id.0.as_str();
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT id FROM tenant WHERE id = ?")
            .bind(tenant)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let services = load_services(&mut tx, tenant).await?;
        let combos = load_combos(&mut tx, tenant).await?;
        let additionals = load_additionals(&mut tx, tenant).await?;
        let zones = load_zones(&mut tx, tenant).await?;
        let exceptions = load_exceptions(&mut tx, tenant).await?;
        tx.commit().await?;

        Ok(Some(CatalogData { services, combos, additionals, zones, exceptions }))
    }
}

#[async_trait]
impl CatalogWriter for SqlCatalogRepository {
    async fn save_catalog(
        &self,
        tenant_id: &TenantId,
        catalog: &CatalogData,
    ) -> Result<(), RepositoryError> {
        CatalogSnapshot::build(catalog.clone())?;

        let tenant = tenant_id.0.as_str();
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO tenant (id) VALUES (?) ON CONFLICT(id) DO NOTHING")
            .bind(tenant)
            .execute(&mut *tx)
            .await?;
        for statement in CLEAR_TENANT_CATALOG {
            sqlx::query(*statement).bind(tenant).execute(&mut *tx).await?;
        }

        insert_services(&mut tx, tenant, &catalog.services).await?;
        insert_combos(&mut tx, tenant, &catalog.combos).await?;
        insert_additionals(&mut tx, tenant, &catalog.additionals).await?;
        insert_zones(&mut tx, tenant, &catalog.zones).await?;
        insert_exceptions(&mut tx, tenant, &catalog.exceptions).await?;

        tx.commit().await?;
        info!(
            event_name = "catalog.saved",
            tenant_id = %tenant,
            services = catalog.services.len(),
            combos = catalog.combos.len(),
            zones = catalog.zones.len(),
            "tenant catalog replaced"
        );
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for SqlCatalogRepository {
    async fn load_snapshot(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Arc<CatalogSnapshot>, CatalogLoadError> {
        let catalog = self.load_catalog(tenant_id).await?;
        build_snapshot(tenant_id, catalog)
    }
}

async fn load_services(
    conn: &mut SqliteConnection,
    tenant: &str,
) -> Result<Vec<Service>, RepositoryError> {
    let mut tiers: HashMap<String, Vec<PricingTier>> = HashMap::new();
    let rows = sqlx::query(
        "SELECT service_id, min_quantity, max_quantity, price_per_unit
         FROM service_tier WHERE tenant_id = ? ORDER BY service_id, position",
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        let max_quantity = match row.try_get::<Option<i64>, _>("max_quantity")? {
            Some(raw) => Some(to_quantity("max_quantity", raw)?),
            None => None,
        };
        tiers.entry(row.try_get("service_id")?).or_default().push(PricingTier {
            min_quantity: quantity(&row, "min_quantity")?,
            max_quantity,
            price_per_unit: decimal(&row, "price_per_unit")?,
        });
    }

    let mut options: HashMap<(String, String), Vec<VariableOption>> = HashMap::new();
    let rows = sqlx::query(
        "SELECT service_id, variable_id, id, label, price_modifier
         FROM variable_option WHERE tenant_id = ? ORDER BY service_id, variable_id, position",
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        let key = (row.try_get("service_id")?, row.try_get("variable_id")?);
        options.entry(key).or_default().push(VariableOption {
            id: OptionId(row.try_get("id")?),
            label: row.try_get("label")?,
            price_modifier: decimal(&row, "price_modifier")?,
        });
    }

    let mut variables: HashMap<String, Vec<Variable>> = HashMap::new();
    let rows = sqlx::query(
        "SELECT service_id, id, name, required
         FROM service_variable WHERE tenant_id = ? ORDER BY service_id, position",
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        let service_id: String = row.try_get("service_id")?;
        let id: String = row.try_get("id")?;
        let variable_options =
            options.remove(&(service_id.clone(), id.clone())).unwrap_or_default();
        variables.entry(service_id).or_default().push(Variable {
            id: VariableId(id),
            name: row.try_get("name")?,
            required: row.try_get("required")?,
            options: variable_options,
        });
    }

    let rows = sqlx::query(
        "SELECT id, name, category, base_price
         FROM service WHERE tenant_id = ? ORDER BY position",
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter()
        .map(|row| -> Result<Service, RepositoryError> {
            let id: String = row.try_get("id")?;
            Ok(Service {
                tiers: tiers.remove(&id).unwrap_or_default(),
                variables: variables.remove(&id).unwrap_or_default(),
                name: row.try_get("name")?,
                category: row.try_get("category")?,
                base_price: decimal(&row, "base_price")?,
                id: ServiceId(id),
            })
        })
        .collect()
}

async fn load_combos(
    conn: &mut SqliteConnection,
    tenant: &str,
) -> Result<Vec<Combo>, RepositoryError> {
    let mut items: HashMap<String, Vec<ComboItem>> = HashMap::new();
    let rows = sqlx::query(
        "SELECT combo_id, service_id, quantity
         FROM combo_item WHERE tenant_id = ? ORDER BY combo_id, position",
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        items.entry(row.try_get("combo_id")?).or_default().push(ComboItem {
            service_id: ServiceId(row.try_get("service_id")?),
            quantity: quantity(&row, "quantity")?,
        });
    }

    let rows = sqlx::query(
        "SELECT id, name, category, fixed_price, active
         FROM combo WHERE tenant_id = ? ORDER BY position",
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter()
        .map(|row| -> Result<Combo, RepositoryError> {
            let id: String = row.try_get("id")?;
            Ok(Combo {
                items: items.remove(&id).unwrap_or_default(),
                name: row.try_get("name")?,
                category: row.try_get("category")?,
                fixed_price: decimal(&row, "fixed_price")?,
                active: row.try_get("active")?,
                id: ComboId(id),
            })
        })
        .collect()
}

async fn load_additionals(
    conn: &mut SqliteConnection,
    tenant: &str,
) -> Result<Vec<Additional>, RepositoryError> {
    let mut categories: HashMap<String, Vec<String>> = HashMap::new();
    let rows = sqlx::query(
        "SELECT additional_id, category
         FROM additional_category WHERE tenant_id = ? ORDER BY additional_id, position",
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        let category: String = row.try_get("category")?;
        categories.entry(row.try_get("additional_id")?).or_default().push(category);
    }

    let rows = sqlx::query(
        "SELECT id, name, price FROM additional WHERE tenant_id = ? ORDER BY position",
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter()
        .map(|row| -> Result<Additional, RepositoryError> {
            let id: String = row.try_get("id")?;
            Ok(Additional {
                eligible_categories: categories.remove(&id).unwrap_or_default(),
                name: row.try_get("name")?,
                price: decimal(&row, "price")?,
                id: AdditionalId(id),
            })
        })
        .collect()
}

async fn load_zones(
    conn: &mut SqliteConnection,
    tenant: &str,
) -> Result<Vec<Zone>, RepositoryError> {
    let mut neighborhoods: HashMap<String, Vec<String>> = HashMap::new();
    let rows = sqlx::query(
        "SELECT zone_id, neighborhood
         FROM zone_neighborhood WHERE tenant_id = ? ORDER BY zone_id, position",
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        let neighborhood: String = row.try_get("neighborhood")?;
        neighborhoods.entry(row.try_get("zone_id")?).or_default().push(neighborhood);
    }

    let rows = sqlx::query(
        "SELECT id, name, surcharge, is_default, requires_quote
         FROM zone WHERE tenant_id = ? ORDER BY position",
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter()
        .map(|row| -> Result<Zone, RepositoryError> {
            let id: String = row.try_get("id")?;
            Ok(Zone {
                neighborhoods: neighborhoods.remove(&id).unwrap_or_default(),
                name: row.try_get("name")?,
                surcharge: decimal(&row, "surcharge")?,
                is_default: row.try_get("is_default")?,
                requires_quote: row.try_get("requires_quote")?,
                id: ZoneId(id),
            })
        })
        .collect()
}

async fn load_exceptions(
    conn: &mut SqliteConnection,
    tenant: &str,
) -> Result<Vec<ZoneException>, RepositoryError> {
    let rows = sqlx::query(
        "SELECT zone_id, category, min_quantity, kind
         FROM zone_exception WHERE tenant_id = ? ORDER BY position",
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter()
        .map(|row| -> Result<ZoneException, RepositoryError> {
            let kind: String = row.try_get("kind")?;
            Ok(ZoneException {
                zone_id: ZoneId(row.try_get("zone_id")?),
                category: row.try_get("category")?,
                min_quantity: quantity(&row, "min_quantity")?,
                kind: ExceptionKind::parse(&kind).ok_or_else(|| {
                    RepositoryError::Decode(format!("unknown zone exception kind `{kind}`"))
                })?,
            })
        })
        .collect()
}

async fn insert_services(
    conn: &mut SqliteConnection,
    tenant: &str,
    services: &[Service],
) -> Result<(), RepositoryError> {
    for (position, service) in services.iter().enumerate() {
        sqlx::query(
            "INSERT INTO service (tenant_id, id, position, name, category, base_price)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(tenant)
        .bind(&service.id.0)
        .bind(position as i64)
        .bind(&service.name)
        .bind(&service.category)
        .bind(service.base_price.to_string())
        .execute(&mut *conn)
        .await?;

        for (tier_position, tier) in service.tiers.iter().enumerate() {
            sqlx::query(
                "INSERT INTO service_tier
                 (tenant_id, service_id, position, min_quantity, max_quantity, price_per_unit)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(tenant)
            .bind(&service.id.0)
            .bind(tier_position as i64)
            .bind(i64::from(tier.min_quantity))
            .bind(tier.max_quantity.map(i64::from))
            .bind(tier.price_per_unit.to_string())
            .execute(&mut *conn)
            .await?;
        }

        for (variable_position, variable) in service.variables.iter().enumerate() {
            sqlx::query(
                "INSERT INTO service_variable (tenant_id, service_id, id, position, name, required)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(tenant)
            .bind(&service.id.0)
            .bind(&variable.id.0)
            .bind(variable_position as i64)
            .bind(&variable.name)
            .bind(variable.required)
            .execute(&mut *conn)
            .await?;

            for (option_position, option) in variable.options.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO variable_option
                     (tenant_id, service_id, variable_id, id, position, label, price_modifier)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(tenant)
                .bind(&service.id.0)
                .bind(&variable.id.0)
                .bind(&option.id.0)
                .bind(option_position as i64)
                .bind(&option.label)
                .bind(option.price_modifier.to_string())
                .execute(&mut *conn)
                .await?;
            }
        }
    }
    Ok(())
}

async fn insert_combos(
    conn: &mut SqliteConnection,
    tenant: &str,
    combos: &[Combo],
) -> Result<(), RepositoryError> {
    for (position, combo) in combos.iter().enumerate() {
        sqlx::query(
            "INSERT INTO combo (tenant_id, id, position, name, category, fixed_price, active)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(tenant)
        .bind(&combo.id.0)
        .bind(position as i64)
        .bind(&combo.name)
        .bind(&combo.category)
        .bind(combo.fixed_price.to_string())
        .bind(combo.active)
        .execute(&mut *conn)
        .await?;

        for (item_position, item) in combo.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO combo_item (tenant_id, combo_id, position, service_id, quantity)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(tenant)
            .bind(&combo.id.0)
            .bind(item_position as i64)
            .bind(&item.service_id.0)
            .bind(i64::from(item.quantity))
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

async fn insert_additionals(
    conn: &mut SqliteConnection,
    tenant: &str,
    additionals: &[Additional],
) -> Result<(), RepositoryError> {
    for (position, additional) in additionals.iter().enumerate() {
        sqlx::query(
            "INSERT INTO additional (tenant_id, id, position, name, price) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(tenant)
        .bind(&additional.id.0)
        .bind(position as i64)
        .bind(&additional.name)
        .bind(additional.price.to_string())
        .execute(&mut *conn)
        .await?;

        for (category_position, category) in additional.eligible_categories.iter().enumerate() {
            sqlx::query(
                "INSERT INTO additional_category (tenant_id, additional_id, position, category)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(tenant)
            .bind(&additional.id.0)
            .bind(category_position as i64)
            .bind(category)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

async fn insert_zones(
    conn: &mut SqliteConnection,
    tenant: &str,
    zones: &[Zone],
) -> Result<(), RepositoryError> {
    for (position, zone) in zones.iter().enumerate() {
        sqlx::query(
            "INSERT INTO zone (tenant_id, id, position, name, surcharge, is_default, requires_quote)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(tenant)
        .bind(&zone.id.0)
        .bind(position as i64)
        .bind(&zone.name)
        .bind(zone.surcharge.to_string())
        .bind(zone.is_default)
        .bind(zone.requires_quote)
        .execute(&mut *conn)
        .await?;

        for (neighborhood_position, neighborhood) in zone.neighborhoods.iter().enumerate() {
            sqlx::query(
                "INSERT INTO zone_neighborhood (tenant_id, zone_id, position, neighborhood)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(tenant)
            .bind(&zone.id.0)
            .bind(neighborhood_position as i64)
            .bind(neighborhood)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

async fn insert_exceptions(
    conn: &mut SqliteConnection,
    tenant: &str,
    exceptions: &[ZoneException],
) -> Result<(), RepositoryError> {
    for (position, exception) in exceptions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO zone_exception (tenant_id, position, zone_id, category, min_quantity, kind)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(tenant)
        .bind(position as i64)
        .bind(&exception.zone_id.0)
        .bind(&exception.category)
        .bind(i64::from(exception.min_quantity))
        .bind(exception.kind.as_str())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

fn decimal(row: &SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(raw.trim()).map_err(|error| {
        RepositoryError::Decode(format!("{column} `{raw}` is not a decimal: {error}"))
    })
}

fn quantity(row: &SqliteRow, column: &str) -> Result<u32, RepositoryError> {
    to_quantity(column, row.try_get(column)?)
}

fn to_quantity(column: &str, raw: i64) -> Result<u32, RepositoryError> {
    u32::try_from(raw)
        .map_err(|_| RepositoryError::Decode(format!("{column} `{raw}` is not a valid quantity")))
}
