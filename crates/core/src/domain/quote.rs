use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{AdditionalId, ComboId, OptionId, PricingTier, ServiceId, ZoneId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLine {
    pub service_id: ServiceId,
    pub quantity: u32,
    #[serde(default)]
    pub selected_option_ids: Vec<OptionId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub neighborhood: String,
    pub lines: Vec<RequestLine>,
    #[serde(default)]
    pub additional_ids: Vec<AdditionalId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemizedRule {
    Tier,
    BaseFallback,
}

/// One request line priced on its own, either from a matching tier or from
/// the base price plus variable modifiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemizedLine {
    pub request_line: usize,
    pub service_id: ServiceId,
    pub category: String,
    pub quantity: u32,
    pub rule: ItemizedRule,
    pub tier: Option<PricingTier>,
    pub base_contribution: Decimal,
    pub modifier_contribution: Decimal,
    pub total: Decimal,
}

/// A fixed-price bundle standing in for the request lines it consumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboLine {
    pub combo_id: ComboId,
    pub category: String,
    pub request_lines: Vec<usize>,
    pub fixed_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricedLine {
    Combo(ComboLine),
    Itemized(ItemizedLine),
}

impl PricedLine {
    pub fn total(&self) -> Decimal {
        match self {
            Self::Combo(line) => line.fixed_price,
            Self::Itemized(line) => line.total,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalCharge {
    pub additional_id: AdditionalId,
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedQuote {
    pub zone_id: ZoneId,
    pub line_breakdown: Vec<PricedLine>,
    pub surcharge: Decimal,
    pub additionals: Vec<AdditionalCharge>,
    pub additionals_total: Decimal,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualQuoteReason {
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub blocking_categories: Vec<String>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Quote {
    Priced(PricedQuote),
    RequiresManualQuote(ManualQuoteReason),
}

impl Quote {
    pub fn total(&self) -> Option<Decimal> {
        match self {
            Self::Priced(priced) => Some(priced.total),
            Self::RequiresManualQuote(_) => None,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Self::RequiresManualQuote(_))
    }
}
