//! Diff between the orders believed open and the quotes the strategy wants.

use rust_decimal::Decimal;

use super::order::{Order, OrderId, TargetQuote};

/// How far a live order may drift from a target and still count as it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tolerance {
    /// Absolute price distance.
    pub price: Decimal,
    /// Size distance as a fraction of the target size.
    pub size_fraction: Decimal,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            price: Decimal::ZERO,
            size_fraction: Decimal::ZERO,
        }
    }
}

impl Tolerance {
    pub fn matches(&self, live: &Order, target: &TargetQuote) -> bool {
        live.side == target.side
            && live.outcome == target.outcome
            && (live.price - target.price).abs() <= self.price
            && (live.size - target.size).abs() <= target.size * self.size_fraction
    }
}

/// Operations that bring the live set in line with the targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub to_cancel: Vec<OrderId>,
    pub to_place: Vec<TargetQuote>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.to_cancel.is_empty() && self.to_place.is_empty()
    }
}

/// Pair each live order with at most one unmatched target.
///
/// Live orders left without a target are cancelled, except orders without
/// an id: those are placements still in flight and are left alone. Targets
/// left without a live order are placed.
pub fn reconcile(live: &[Order], targets: &[TargetQuote], tolerance: &Tolerance) -> Reconciliation {
    let mut matched = vec![false; targets.len()];
    let mut to_cancel = Vec::new();

    for order in live {
        let hit = targets
            .iter()
            .enumerate()
            .find(|(i, target)| !matched[*i] && tolerance.matches(order, target))
            .map(|(i, _)| i);

        match (hit, &order.id) {
            (Some(i), _) => matched[i] = true,
            (None, Some(id)) => to_cancel.push(id.clone()),
            (None, None) => {}
        }
    }

    let to_place = targets
        .iter()
        .zip(&matched)
        .filter(|(_, taken)| !**taken)
        .map(|(target, _)| target.clone())
        .collect();

    Reconciliation { to_cancel, to_place }
}
