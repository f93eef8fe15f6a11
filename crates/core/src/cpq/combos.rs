use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::catalog::{Combo, ServiceId};
use crate::domain::quote::RequestLine;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComboMatch<'a> {
    pub combo: &'a Combo,
    /// Request line indices consumed by the combo, ascending.
    pub consumed_lines: Vec<usize>,
}

/// Returns the request lines `combo` would consume, or `None` when it is not
/// a candidate. Each combo item must pair with its own line of the same
/// service and exactly the same quantity, and no line of a bundled service
/// may be left over.
pub fn combo_candidate_lines(lines: &[RequestLine], combo: &Combo) -> Option<Vec<usize>> {
    let mut consumed = vec![false; lines.len()];
    for item in &combo.items {
        let index = (0..lines.len()).find(|&index| {
            !consumed[index]
                && lines[index].service_id == item.service_id
                && lines[index].quantity == item.quantity
        })?;
        consumed[index] = true;
    }

    let bundled: BTreeSet<&ServiceId> = combo.items.iter().map(|item| &item.service_id).collect();
    let leftover = lines
        .iter()
        .zip(&consumed)
        .any(|(line, used)| !used && bundled.contains(&line.service_id));
    if leftover {
        return None;
    }

    Some(consumed.iter().enumerate().filter_map(|(index, used)| used.then_some(index)).collect())
}

/// Picks at most one combo for the whole request. Ranking: most lines
/// covered, then lowest fixed price, then catalog order.
pub fn match_combo<'a>(
    lines: &[RequestLine],
    combos: impl IntoIterator<Item = &'a Combo>,
) -> Option<ComboMatch<'a>> {
    let mut best: Option<ComboMatch<'a>> = None;

    for combo in combos {
        let Some(consumed_lines) = combo_candidate_lines(lines, combo) else {
            continue;
        };
        let candidate = ComboMatch { combo, consumed_lines };

        let better = match &best {
            None => true,
            Some(current) => {
                let (covered, current_covered) =
                    (candidate.consumed_lines.len(), current.consumed_lines.len());
                covered > current_covered
                    || (covered == current_covered
                        && candidate.combo.fixed_price < current.combo.fixed_price)
            }
        };
        if better {
            best = Some(candidate);
        }
    }

    if let Some(selected) = &best {
        debug!(
            event_name = "quote.combo.matched",
            combo_id = %selected.combo.id.0,
            consumed_lines = selected.consumed_lines.len(),
            "combo selected for request"
        );
    }
    best
}
