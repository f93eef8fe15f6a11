use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cpq::catalog::CatalogIssue;
use crate::domain::catalog::{Zone, ZoneId};
use crate::errors::ConfigurationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneMatch {
    Neighborhood,
    DefaultFallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneResolution<'a> {
    pub zone: &'a Zone,
    pub matched_by: ZoneMatch,
    /// Other zones that also claim the neighborhood; non-empty only for a
    /// malformed catalog, in which case the first zone by catalog order wins.
    pub conflicting_zone_ids: Vec<ZoneId>,
}

/// Trims, collapses inner whitespace runs, and lowercases.
pub fn normalize_neighborhood(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn claims(zone: &Zone, normalized: &str) -> bool {
    zone.neighborhoods.iter().any(|candidate| normalize_neighborhood(candidate) == normalized)
}

pub fn resolve_zone<'a>(
    neighborhood: &str,
    zones: &'a [Zone],
) -> Result<ZoneResolution<'a>, ConfigurationError> {
    let normalized = normalize_neighborhood(neighborhood);
    let mut claimants =
        zones.iter().filter(|zone| !normalized.is_empty() && claims(zone, &normalized));

    if let Some(zone) = claimants.next() {
        let conflicting_zone_ids: Vec<ZoneId> = claimants.map(|zone| zone.id.clone()).collect();
        if !conflicting_zone_ids.is_empty() {
            warn!(
                event_name = "quote.zone.ambiguous_neighborhood",
                neighborhood = %normalized,
                selected_zone = %zone.id.0,
                conflicting_zones = conflicting_zone_ids.len(),
                "neighborhood claimed by more than one zone; using first by catalog order"
            );
        }
        return Ok(ZoneResolution {
            zone,
            matched_by: ZoneMatch::Neighborhood,
            conflicting_zone_ids,
        });
    }

    let zone =
        zones.iter().find(|zone| zone.is_default).ok_or(ConfigurationError::NoDefaultZone)?;
    debug!(
        event_name = "quote.zone.default_fallback",
        neighborhood = %normalized,
        zone_id = %zone.id.0,
        "neighborhood not claimed by any zone; using default zone"
    );
    Ok(ZoneResolution {
        zone,
        matched_by: ZoneMatch::DefaultFallback,
        conflicting_zone_ids: Vec::new(),
    })
}

pub fn find_ambiguous_neighborhoods(zones: &[Zone]) -> Vec<CatalogIssue> {
    let mut owners: BTreeMap<String, Vec<ZoneId>> = BTreeMap::new();
    for zone in zones {
        for neighborhood in &zone.neighborhoods {
            let normalized = normalize_neighborhood(neighborhood);
            let entry = owners.entry(normalized).or_default();
            if !entry.contains(&zone.id) {
                entry.push(zone.id.clone());
            }
        }
    }

    owners
        .into_iter()
        .filter(|(_, zone_ids)| zone_ids.len() > 1)
        .map(|(neighborhood, zone_ids)| CatalogIssue::AmbiguousNeighborhood {
            neighborhood,
            zone_ids,
        })
        .collect()
}
