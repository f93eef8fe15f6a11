//! Deterministic demo catalog: an air-conditioning field-services shop with
//! tiered cleaning, bundled installations, and three service zones.

use rust_decimal::Decimal;

use crate::domain::catalog::{
    Additional, AdditionalId, CatalogData, Combo, ComboId, ComboItem, ExceptionKind, OptionId,
    PricingTier, Service, ServiceId, Variable, VariableId, VariableOption, Zone, ZoneException,
    ZoneId,
};
use crate::domain::quote::{QuoteRequest, RequestLine};

pub const DEMO_TENANT: &str = "demo";

/// Tier with a whole-unit price.
pub fn tier(min_quantity: u32, max_quantity: Option<u32>, price_per_unit: i64) -> PricingTier {
    PricingTier { min_quantity, max_quantity, price_per_unit: Decimal::from(price_per_unit) }
}

fn option(id: &str, label: &str, price_modifier: Decimal) -> VariableOption {
    VariableOption { id: OptionId(id.to_string()), label: label.to_string(), price_modifier }
}

fn combo(id: &str, name: &str, fixed_price: Decimal, items: &[(&str, u32)]) -> Combo {
    Combo {
        id: ComboId(id.to_string()),
        name: name.to_string(),
        category: "Installation".to_string(),
        fixed_price,
        active: true,
        items: items
            .iter()
            .map(|(service_id, quantity)| ComboItem {
                service_id: ServiceId(service_id.to_string()),
                quantity: *quantity,
            })
            .collect(),
    }
}

fn zone(
    id: &str,
    name: &str,
    neighborhoods: &[&str],
    surcharge: Decimal,
    is_default: bool,
    requires_quote: bool,
) -> Zone {
    Zone {
        id: ZoneId(id.to_string()),
        name: name.to_string(),
        neighborhoods: neighborhoods.iter().map(|value| value.to_string()).collect(),
        surcharge,
        is_default,
        requires_quote,
    }
}

pub fn demo_catalog() -> CatalogData {
    let cleaning = Service {
        id: ServiceId("cleaning".to_string()),
        name: "Split AC cleaning".to_string(),
        category: "Cleaning".to_string(),
        base_price: Decimal::new(25_000, 2),
        tiers: vec![
            tier(1, Some(1), 250),
            tier(2, Some(2), 225),
            PricingTier {
                min_quantity: 3,
                max_quantity: Some(3),
                price_per_unit: Decimal::new(19_833, 2),
            },
            PricingTier {
                min_quantity: 4,
                max_quantity: Some(4),
                price_per_unit: Decimal::new(19_875, 2),
            },
            tier(5, None, 190),
        ],
        variables: vec![Variable {
            id: VariableId("access".to_string()),
            name: "Unit access".to_string(),
            required: false,
            options: vec![
                option("access-ground", "Ground level", Decimal::ZERO),
                option("access-height", "Work at height", Decimal::new(4_000, 2)),
            ],
        }],
    };

    let install_small = Service {
        id: ServiceId("install-9-12k".to_string()),
        name: "Install 9-12K".to_string(),
        category: "Installation".to_string(),
        base_price: Decimal::new(79_500, 2),
        tiers: Vec::new(),
        variables: vec![Variable {
            id: VariableId("mounting".to_string()),
            name: "Mounting".to_string(),
            required: false,
            options: vec![
                option("mounting-wall", "Wall", Decimal::ZERO),
                option("mounting-ceiling", "Ceiling", Decimal::new(6_000, 2)),
            ],
        }],
    };

    let install_large = Service {
        id: ServiceId("install-18k".to_string()),
        name: "Install 18K".to_string(),
        category: "Installation".to_string(),
        base_price: Decimal::new(115_000, 2),
        tiers: Vec::new(),
        variables: vec![Variable {
            id: VariableId("line-set".to_string()),
            name: "Line set length".to_string(),
            required: true,
            options: vec![
                option("line-set-3m", "Up to 3 m", Decimal::ZERO),
                option("line-set-5m", "Up to 5 m", Decimal::new(15_000, 2)),
            ],
        }],
    };

    let maintenance = Service {
        id: ServiceId("maintenance".to_string()),
        name: "Preventive maintenance".to_string(),
        category: "Maintenance".to_string(),
        base_price: Decimal::new(18_000, 2),
        tiers: vec![tier(1, Some(2), 180), tier(3, None, 160)],
        variables: Vec::new(),
    };

    CatalogData {
        services: vec![cleaning, install_small, install_large, maintenance],
        combos: vec![
            combo("combo-2x-9-12k", "Two 9-12K installs", Decimal::new(149_500, 2), &[(
                "install-9-12k",
                2,
            )]),
            combo("combo-9-12k-18k", "9-12K plus 18K installs", Decimal::new(185_000, 2), &[
                ("install-9-12k", 1),
                ("install-18k", 1),
            ]),
        ],
        additionals: vec![
            Additional {
                id: AdditionalId("wall-bracket".to_string()),
                name: "Outdoor unit wall bracket".to_string(),
                price: Decimal::new(8_500, 2),
                eligible_categories: vec!["Installation".to_string()],
            },
            Additional {
                id: AdditionalId("disinfection".to_string()),
                name: "Coil disinfection".to_string(),
                price: Decimal::new(4_500, 2),
                eligible_categories: Vec::new(),
            },
        ],
        zones: vec![
            zone(
                "zone-central",
                "Central",
                &["Centro", "Jardim América"],
                Decimal::ZERO,
                true,
                false,
            ),
            zone(
                "zone-north",
                "North",
                &["Vila Nova", "Santa Mônica"],
                Decimal::new(5_500, 2),
                false,
                false,
            ),
            zone(
                "zone-remote",
                "Remote",
                &["Ilha Verde", "Serra Alta"],
                Decimal::new(12_000, 2),
                false,
                true,
            ),
        ],
        exceptions: vec![
            ZoneException {
                zone_id: ZoneId("zone-north".to_string()),
                category: "Cleaning".to_string(),
                min_quantity: 3,
                kind: ExceptionKind::NoFee,
            },
            ZoneException {
                zone_id: ZoneId("zone-remote".to_string()),
                category: "Maintenance".to_string(),
                min_quantity: 3,
                kind: ExceptionKind::NoQuoteRequired,
            },
        ],
    }
}

/// Single-line request with no option selections or additionals.
pub fn single_line_request(neighborhood: &str, service_id: &str, quantity: u32) -> QuoteRequest {
    QuoteRequest {
        neighborhood: neighborhood.to_string(),
        lines: vec![RequestLine {
            service_id: ServiceId(service_id.to_string()),
            quantity,
            selected_option_ids: Vec::new(),
        }],
        additional_ids: Vec::new(),
    }
}
