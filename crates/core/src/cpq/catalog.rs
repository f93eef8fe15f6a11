use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::cpq::zones::find_ambiguous_neighborhoods;
use crate::domain::catalog::{
    Additional, AdditionalId, CatalogData, Combo, Service, ServiceId, Zone, ZoneException, ZoneId,
};
use crate::errors::ConfigurationError;

/// Non-fatal integrity findings surfaced alongside a usable snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum CatalogIssue {
    AmbiguousNeighborhood { neighborhood: String, zone_ids: Vec<ZoneId> },
}

/// Immutable, validated catalog. Records keep catalog order; lookups go
/// through id -> index maps built once at construction.
#[derive(Clone, Debug)]
pub struct CatalogSnapshot {
    data: CatalogData,
    services_by_id: HashMap<ServiceId, usize>,
    additionals_by_id: HashMap<AdditionalId, usize>,
    issues: Vec<CatalogIssue>,
}

impl CatalogSnapshot {
    pub fn build(data: CatalogData) -> Result<Self, ConfigurationError> {
        let services_by_id = index_unique(
            "service",
            data.services.iter().map(|service| (&service.id, service.id.0.as_str())),
        )?;
        let additionals_by_id = index_unique(
            "additional",
            data.additionals.iter().map(|additional| (&additional.id, additional.id.0.as_str())),
        )?;
        index_unique("combo", data.combos.iter().map(|combo| (&combo.id, combo.id.0.as_str())))?;
        let zones_by_id =
            index_unique("zone", data.zones.iter().map(|zone| (&zone.id, zone.id.0.as_str())))?;

        for service in &data.services {
            validate_options(service)?;
            validate_tiers(service)?;
        }
        for combo in &data.combos {
            validate_combo(combo, &services_by_id)?;
        }
        validate_default_zone(&data.zones)?;
        for exception in &data.exceptions {
            if !zones_by_id.contains_key(&exception.zone_id) {
                return Err(ConfigurationError::UnknownExceptionZone {
                    zone_id: exception.zone_id.0.clone(),
                });
            }
        }

        let issues = find_ambiguous_neighborhoods(&data.zones);
        Ok(Self { data, services_by_id, additionals_by_id, issues })
    }

    pub fn service(&self, id: &ServiceId) -> Option<&Service> {
        self.services_by_id.get(id).map(|index| &self.data.services[*index])
    }

    pub fn additional(&self, id: &AdditionalId) -> Option<&Additional> {
        self.additionals_by_id.get(id).map(|index| &self.data.additionals[*index])
    }

    pub fn zones(&self) -> &[Zone] {
        &self.data.zones
    }

    pub fn active_combos(&self) -> impl Iterator<Item = &Combo> {
        self.data.combos.iter().filter(|combo| combo.active)
    }

    pub fn exceptions_for_zone<'a>(
        &'a self,
        zone_id: &'a ZoneId,
    ) -> impl Iterator<Item = &'a ZoneException> + 'a {
        self.data.exceptions.iter().filter(move |exception| &exception.zone_id == zone_id)
    }

    pub fn issues(&self) -> &[CatalogIssue] {
        &self.issues
    }

    pub fn data(&self) -> &CatalogData {
        &self.data
    }
}

fn index_unique<'a, K>(
    kind: &'static str,
    ids: impl Iterator<Item = (&'a K, &'a str)>,
) -> Result<HashMap<K, usize>, ConfigurationError>
where
    K: Clone + Eq + std::hash::Hash + 'a,
{
    let mut index = HashMap::new();
    for (position, (key, raw)) in ids.enumerate() {
        if index.insert(key.clone(), position).is_some() {
            return Err(ConfigurationError::DuplicateId { kind, id: raw.to_string() });
        }
    }
    Ok(index)
}

fn validate_options(service: &Service) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for option in service.variables.iter().flat_map(|variable| variable.options.iter()) {
        if !seen.insert(&option.id) {
            return Err(ConfigurationError::DuplicateOption {
                service_id: service.id.0.clone(),
                option_id: option.id.0.clone(),
            });
        }
    }
    Ok(())
}

/// Tiers must start at 1 or above, ascend without gaps or overlaps, and
/// only the last one may be unbounded.
pub fn validate_tiers(service: &Service) -> Result<(), ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidTiers {
        service_id: service.id.0.clone(),
        reason,
    };

    let mut expected_min: Option<u32> = None;
    let last = service.tiers.len().saturating_sub(1);
    for (position, tier) in service.tiers.iter().enumerate() {
        if tier.min_quantity == 0 {
            return Err(invalid(format!("tier {position} starts at quantity 0")));
        }
        if let Some(expected) = expected_min {
            if tier.min_quantity != expected {
                return Err(invalid(format!(
                    "tier {position} starts at {} but the previous tier ends at {}",
                    tier.min_quantity,
                    expected - 1
                )));
            }
        }

        match tier.max_quantity {
            Some(max) if max < tier.min_quantity => {
                return Err(invalid(format!(
                    "tier {position} has max {max} below min {}",
                    tier.min_quantity
                )));
            }
            Some(max) => {
                expected_min = Some(max.checked_add(1).ok_or_else(|| {
                    invalid(format!("tier {position} max quantity overflows"))
                })?);
            }
            None if position != last => {
                return Err(invalid(format!("unbounded tier {position} is not the last tier")));
            }
            None => {}
        }
    }

    Ok(())
}

fn validate_combo(
    combo: &Combo,
    services_by_id: &HashMap<ServiceId, usize>,
) -> Result<(), ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidCombo {
        combo_id: combo.id.0.clone(),
        reason,
    };

    if combo.items.is_empty() {
        return Err(invalid("combo has no items".to_string()));
    }
    for item in &combo.items {
        if item.quantity == 0 {
            return Err(invalid(format!("item `{}` has quantity 0", item.service_id.0)));
        }
        if !services_by_id.contains_key(&item.service_id) {
            return Err(invalid(format!("item references unknown service `{}`", item.service_id.0)));
        }
    }
    Ok(())
}

fn validate_default_zone(zones: &[Zone]) -> Result<(), ConfigurationError> {
    let defaults: Vec<&str> =
        zones.iter().filter(|zone| zone.is_default).map(|zone| zone.id.0.as_str()).collect();
    match defaults.len() {
        0 => Err(ConfigurationError::NoDefaultZone),
        1 => Ok(()),
        _ => Err(ConfigurationError::MultipleDefaultZones { zone_ids: defaults.join(", ") }),
    }
}
