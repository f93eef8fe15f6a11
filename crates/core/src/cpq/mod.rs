pub mod additionals;
pub mod catalog;
pub mod combos;
pub mod policy;
pub mod pricing;
pub mod surcharge;
pub mod zones;

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::catalog::{Service, Zone};
use crate::domain::quote::{
    ComboLine, ManualQuoteReason, PricedLine, PricedQuote, Quote, QuoteRequest,
};
use crate::errors::{ResolutionError, ValidationError};

use self::{
    additionals::validate_additionals,
    catalog::CatalogSnapshot,
    combos::match_combo,
    policy::PricingPolicy,
    pricing::{price_validated_line, validate_line},
    surcharge::{resolve_surcharge, CategoryProfile, SurchargeDecision},
    zones::resolve_zone,
};

/// The single entry point of the engine: a pure function of catalog and request.
pub trait QuoteResolver: Send + Sync {
    fn resolve(
        &self,
        catalog: &CatalogSnapshot,
        request: &QuoteRequest,
    ) -> Result<Quote, ResolutionError>;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicQuoteResolver {
    policy: PricingPolicy,
}

impl DeterministicQuoteResolver {
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }
}

impl QuoteResolver for DeterministicQuoteResolver {
    fn resolve(
        &self,
        catalog: &CatalogSnapshot,
        request: &QuoteRequest,
    ) -> Result<Quote, ResolutionError> {
        resolve_quote(catalog, request, &self.policy)
    }
}

struct ValidatedLine<'a> {
    service: &'a Service,
    modifier_sum: Decimal,
}

pub fn resolve_quote(
    catalog: &CatalogSnapshot,
    request: &QuoteRequest,
    policy: &PricingPolicy,
) -> Result<Quote, ResolutionError> {
    debug!(
        event_name = "quote.resolve.start",
        lines = request.lines.len(),
        additionals = request.additional_ids.len(),
        "resolving quote"
    );

    if request.lines.is_empty() {
        return Err(ValidationError::EmptyRequest.into());
    }
    let validated = request
        .lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let service = catalog.service(&line.service_id).ok_or_else(|| {
                ValidationError::UnknownService {
                    line: index,
                    service_id: line.service_id.0.clone(),
                }
            })?;
            let modifier_sum = validate_line(index, service, line)?;
            Ok(ValidatedLine { service, modifier_sum })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let zone = resolve_zone(&request.neighborhood, catalog.zones())?.zone;

    let mut line_breakdown = Vec::new();
    let mut consumed = vec![false; request.lines.len()];
    if let Some(combo_match) = match_combo(&request.lines, catalog.active_combos()) {
        for index in &combo_match.consumed_lines {
            consumed[*index] = true;
        }
        line_breakdown.push(PricedLine::Combo(ComboLine {
            combo_id: combo_match.combo.id.clone(),
            category: combo_match.combo.category.clone(),
            request_lines: combo_match.consumed_lines,
            fixed_price: combo_match.combo.fixed_price,
        }));
    }

    for (index, (line, resolved)) in request.lines.iter().zip(&validated).enumerate() {
        if consumed[index] {
            continue;
        }
        let itemized =
            price_validated_line(index, resolved.service, line, resolved.modifier_sum, policy)?;
        line_breakdown.push(PricedLine::Itemized(itemized));
    }

    // Combo-consumed lines still count toward category quantities.
    let mut profile = CategoryProfile::new();
    for (line, resolved) in request.lines.iter().zip(&validated) {
        *profile.entry(resolved.service.category.clone()).or_insert(0) += u64::from(line.quantity);
    }
    let categories: BTreeSet<&str> = profile.keys().map(String::as_str).collect();
    let additionals = validate_additionals(catalog, &request.additional_ids, &categories)?;

    let decision = resolve_surcharge(zone, &profile, catalog.exceptions_for_zone(&zone.id));
    if decision.quote_required {
        debug!(
            event_name = "quote.resolve.manual_required",
            zone_id = %zone.id.0,
            blocking_categories = decision.blocking_categories.len(),
            "zone requires a manual quote"
        );
        return Ok(Quote::RequiresManualQuote(manual_reason(zone, &decision)));
    }

    let surcharge = if decision.surcharge_applies { zone.surcharge } else { Decimal::ZERO };
    let lines_total: Decimal = line_breakdown.iter().map(PricedLine::total).sum();
    let total = lines_total + additionals.total + surcharge;

    debug!(
        event_name = "quote.resolve.priced",
        zone_id = %zone.id.0,
        total = %total,
        "quote priced"
    );
    Ok(Quote::Priced(PricedQuote {
        zone_id: zone.id.clone(),
        line_breakdown,
        surcharge,
        additionals: additionals.charges,
        additionals_total: additionals.total,
        total,
    }))
}

fn manual_reason(zone: &Zone, decision: &SurchargeDecision) -> ManualQuoteReason {
    let message = format!(
        "zone `{}` requires a manual quote for: {}",
        zone.name,
        decision.blocking_categories.join(", ")
    );
    ManualQuoteReason {
        zone_id: zone.id.clone(),
        zone_name: zone.name.clone(),
        blocking_categories: decision.blocking_categories.clone(),
        message,
    }
}
