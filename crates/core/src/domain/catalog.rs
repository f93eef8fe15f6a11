use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComboId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdditionalId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub String);

/// A quantity bracket. `price_per_unit` is the bracket total divided by the
/// quantity, so the line total for a matching quantity is `price_per_unit * quantity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTier {
    pub min_quantity: u32,
    /// `None` means unbounded; only the last tier of a service may be unbounded.
    pub max_quantity: Option<u32>,
    pub price_per_unit: Decimal,
}

impl PricingTier {
    pub fn contains(&self, quantity: u32) -> bool {
        quantity >= self.min_quantity && self.max_quantity.map_or(true, |max| quantity <= max)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableOption {
    pub id: OptionId,
    pub label: String,
    /// Signed, additive per-unit modifier.
    pub price_modifier: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: VariableId,
    pub name: String,
    pub required: bool,
    pub options: Vec<VariableOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub category: String,
    pub base_price: Decimal,
    #[serde(default)]
    pub tiers: Vec<PricingTier>,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl Service {
    /// Finds the variable owning `option_id` together with the option itself.
    pub fn find_option(&self, option_id: &OptionId) -> Option<(&Variable, &VariableOption)> {
        self.variables.iter().find_map(|variable| {
            variable.options.iter().find(|option| &option.id == option_id).map(|o| (variable, o))
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboItem {
    pub service_id: ServiceId,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combo {
    pub id: ComboId,
    pub name: String,
    pub category: String,
    pub fixed_price: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
    pub items: Vec<ComboItem>,
}

fn default_active() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Additional {
    pub id: AdditionalId,
    pub name: String,
    pub price: Decimal,
    /// Empty means eligible for every category.
    #[serde(default)]
    pub eligible_categories: Vec<String>,
}

impl Additional {
    pub fn is_eligible_for(&self, category: &str) -> bool {
        self.eligible_categories.is_empty()
            || self.eligible_categories.iter().any(|eligible| eligible == category)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    #[serde(default)]
    pub neighborhoods: Vec<String>,
    pub surcharge: Decimal,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub requires_quote: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionKind {
    /// Waives the zone's flat surcharge.
    NoFee,
    /// Lifts the zone's manual-quote requirement for the category.
    NoQuoteRequired,
}

impl ExceptionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoFee => "NO_FEE",
            Self::NoQuoteRequired => "NO_QUOTE_REQUIRED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NO_FEE" => Some(Self::NoFee),
            "NO_QUOTE_REQUIRED" => Some(Self::NoQuoteRequired),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneException {
    pub zone_id: ZoneId,
    pub category: String,
    pub min_quantity: u32,
    pub kind: ExceptionKind,
}

impl ZoneException {
    pub fn applies_to(&self, zone_id: &ZoneId, category: &str, quantity: u64) -> bool {
        &self.zone_id == zone_id
            && self.category == category
            && quantity >= u64::from(self.min_quantity)
    }
}

/// Raw catalog records as handed over by a catalog provider, in catalog order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub combos: Vec<Combo>,
    #[serde(default)]
    pub additionals: Vec<Additional>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub exceptions: Vec<ZoneException>,
}
