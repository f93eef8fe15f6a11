use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Whether variable modifiers are added on top of a matched tier price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierModifierPolicy {
    /// A tier is a fully-priced bracket; modifiers only apply to the base fallback.
    #[default]
    TierOnly,
    TierPlusModifiers,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRounding {
    Exact,
    #[default]
    Cents,
    /// Rounds line totals to whole currency units, e.g. `198.33 * 3 = 594.99` becomes `595`.
    WholeUnits,
}

impl LineRounding {
    pub fn apply(self, amount: Decimal) -> Decimal {
        match self {
            Self::Exact => amount,
            Self::Cents => amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            Self::WholeUnits => {
                amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            }
        }
    }
}

/// What to do when a service has tiers but none of them covers the quantity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierOverflowPolicy {
    #[default]
    BaseFallback,
    Reject,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub tier_modifiers: TierModifierPolicy,
    pub line_rounding: LineRounding,
    pub tier_overflow: TierOverflowPolicy,
}
