use std::collections::{BTreeSet, HashSet};

use rust_decimal::Decimal;

use crate::cpq::catalog::CatalogSnapshot;
use crate::domain::catalog::AdditionalId;
use crate::domain::quote::AdditionalCharge;
use crate::errors::ValidationError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdditionalsResult {
    pub charges: Vec<AdditionalCharge>,
    pub total: Decimal,
}

/// Each selected add-on must exist, appear once, and be eligible for at
/// least one category present in the request.
pub fn validate_additionals(
    catalog: &CatalogSnapshot,
    selected: &[AdditionalId],
    categories: &BTreeSet<&str>,
) -> Result<AdditionalsResult, ValidationError> {
    let mut seen = HashSet::new();
    let mut result = AdditionalsResult::default();

    for additional_id in selected {
        if !seen.insert(additional_id) {
            return Err(ValidationError::DuplicateAdditional {
                additional_id: additional_id.0.clone(),
            });
        }

        let additional = catalog.additional(additional_id).ok_or_else(|| {
            ValidationError::UnknownAdditional { additional_id: additional_id.0.clone() }
        })?;

        if !categories.iter().any(|category| additional.is_eligible_for(category)) {
            return Err(ValidationError::IneligibleAdditional {
                additional_id: additional_id.0.clone(),
                eligible: additional.eligible_categories.join(", "),
            });
        }

        result.total += additional.price;
        result.charges.push(AdditionalCharge {
            additional_id: additional.id.clone(),
            price: additional.price,
        });
    }

    Ok(result)
}
