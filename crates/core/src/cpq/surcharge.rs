use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{ExceptionKind, Zone, ZoneException};

/// Total requested quantity per category, keyed in sorted order.
pub type CategoryProfile = BTreeMap<String, u64>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeDecision {
    pub quote_required: bool,
    pub surcharge_applies: bool,
    /// Categories whose `NO_FEE` exception waived the surcharge.
    pub fee_waived_by: Vec<String>,
    /// Categories still forcing a manual quote.
    pub blocking_categories: Vec<String>,
}

pub fn resolve_surcharge<'a>(
    zone: &Zone,
    profile: &CategoryProfile,
    exceptions: impl IntoIterator<Item = &'a ZoneException>,
) -> SurchargeDecision {
    let exceptions: Vec<&ZoneException> = exceptions.into_iter().collect();
    let has_exception = |category: &str, quantity: u64, kind: ExceptionKind| {
        exceptions.iter().any(|exception| {
            exception.kind == kind && exception.applies_to(&zone.id, category, quantity)
        })
    };

    let mut fee_waived_by = Vec::new();
    let mut blocking_categories = Vec::new();
    for (category, quantity) in profile {
        if has_exception(category, *quantity, ExceptionKind::NoFee) {
            fee_waived_by.push(category.clone());
        }
        if zone.requires_quote
            && !has_exception(category, *quantity, ExceptionKind::NoQuoteRequired)
        {
            blocking_categories.push(category.clone());
        }
    }

    SurchargeDecision {
        quote_required: !blocking_categories.is_empty(),
        surcharge_applies: fee_waived_by.is_empty(),
        fee_waived_by,
        blocking_categories,
    }
}
