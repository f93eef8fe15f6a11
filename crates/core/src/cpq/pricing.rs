use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::warn;

use crate::cpq::policy::{PricingPolicy, TierModifierPolicy, TierOverflowPolicy};
use crate::domain::catalog::{PricingTier, Service};
use crate::domain::quote::{ItemizedLine, ItemizedRule, RequestLine};
use crate::errors::{ConfigurationError, ValidationError};

pub fn find_tier(tiers: &[PricingTier], quantity: u32) -> Option<&PricingTier> {
    tiers.iter().find(|tier| tier.contains(quantity))
}

/// Checks quantity and option selections for one request line and returns
/// the summed per-unit modifier of the selected options.
pub fn validate_line(
    line_index: usize,
    service: &Service,
    line: &RequestLine,
) -> Result<Decimal, ValidationError> {
    if line.quantity == 0 {
        return Err(ValidationError::NonPositiveQuantity { line: line_index });
    }

    let mut selected_variables = HashSet::new();
    let mut modifier_sum = Decimal::ZERO;
    for option_id in &line.selected_option_ids {
        let (variable, option) =
            service.find_option(option_id).ok_or_else(|| ValidationError::UnknownOption {
                line: line_index,
                service_id: service.id.0.clone(),
                option_id: option_id.0.clone(),
            })?;
        if !selected_variables.insert(&variable.id) {
            return Err(ValidationError::ConflictingSelections {
                line: line_index,
                service_id: service.id.0.clone(),
                variable_id: variable.id.0.clone(),
            });
        }
        modifier_sum += option.price_modifier;
    }

    if let Some(missing) = service
        .variables
        .iter()
        .find(|variable| variable.required && !selected_variables.contains(&variable.id))
    {
        return Err(ValidationError::MissingRequiredSelection {
            line: line_index,
            service_id: service.id.0.clone(),
            variable_id: missing.id.0.clone(),
        });
    }

    Ok(modifier_sum)
}

/// Prices an already validated line: tier match first, base fallback second.
pub fn price_validated_line(
    line_index: usize,
    service: &Service,
    line: &RequestLine,
    modifier_sum: Decimal,
    policy: &PricingPolicy,
) -> Result<ItemizedLine, ConfigurationError> {
    let quantity = Decimal::from(line.quantity);
    let tier = find_tier(&service.tiers, line.quantity);

    let (rule, base_contribution, modifier_contribution) = match tier {
        Some(tier) => {
            let modifiers = match policy.tier_modifiers {
                TierModifierPolicy::TierOnly => Decimal::ZERO,
                TierModifierPolicy::TierPlusModifiers => modifier_sum * quantity,
            };
            (ItemizedRule::Tier, tier.price_per_unit * quantity, modifiers)
        }
        None => {
            if !service.tiers.is_empty() {
                if policy.tier_overflow == TierOverflowPolicy::Reject {
                    return Err(ConfigurationError::TierNotFound {
                        service_id: service.id.0.clone(),
                        quantity: line.quantity,
                    });
                }
                warn!(
                    event_name = "quote.tier.overflow_fallback",
                    service_id = %service.id.0,
                    quantity = line.quantity,
                    "no tier covers quantity; pricing from base price"
                );
            }
            (ItemizedRule::BaseFallback, service.base_price * quantity, modifier_sum * quantity)
        }
    };

    Ok(ItemizedLine {
        request_line: line_index,
        service_id: service.id.clone(),
        category: service.category.clone(),
        quantity: line.quantity,
        rule,
        tier: tier.cloned(),
        base_contribution,
        modifier_contribution,
        total: policy.line_rounding.apply(base_contribution + modifier_contribution),
    })
}
