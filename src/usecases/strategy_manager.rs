//! Strategy Manager Use Case - Per-market Reconciliation Cycle
//!
//! Each cycle reads the working view of the order book manager and the
//! fair price, asks the quoting policy for targets, diffs them against the
//! live orders and submits the resulting cancels and placements. Nothing
//! here waits for the exchange: operations settle in the background and
//! the next cycle sees them through the working view.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::{
  Market, OrderId, QuoteContext, QuotePolicy, QuoteSlot, Tolerance, reconcile,
};
use crate::ports::{MarketGateway, PriceFeed};

use super::order_book_manager::{OrderBookManager, PendingHandle};

/// What one `synchronize` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
  pub cancels_requested: usize,
  pub places_requested: usize,
  /// Placements dropped because the same key was already pending.
  pub places_suppressed: usize,
  /// No snapshot or no price: nothing was evaluated.
  pub skipped: bool,
}

impl SyncReport {
  const fn skipped() -> Self {
    Self {
      cancels_requested: 0,
      places_requested: 0,
      places_suppressed: 0,
      skipped: true,
    }
  }

  pub const fn operations(&self) -> usize {
    self.cancels_requested + self.places_requested
  }
}

/// Keeps one market's resting orders aligned with its quoting policy.
pub struct StrategyManager<G: MarketGateway, F: PriceFeed> {
  market: Market,
  price_feed: Arc<F>,
  order_book: Arc<OrderBookManager<G>>,
  policy: Arc<dyn QuotePolicy>,
  tolerance: Tolerance,
}

impl<G: MarketGateway, F: PriceFeed> StrategyManager<G, F> {
  pub fn new(
    market: Market,
    price_feed: Arc<F>,
    order_book: Arc<OrderBookManager<G>>,
    policy: Arc<dyn QuotePolicy>,
    tolerance: Tolerance,
  ) -> Self {
    Self {
      market,
      price_feed,
      order_book,
      policy,
      tolerance,
    }
  }

  /// Run one reconciliation cycle.
  #[instrument(skip(self), fields(condition_id = %self.market.condition_id()))]
  pub async fn synchronize(&self) -> SyncReport {
    if self.order_book.snapshot().is_none() {
      debug!("No order book snapshot yet, skipping cycle");
      return SyncReport::skipped();
    }

    let fair_price = match self.price_feed.fair_price().await {
      Ok(Some(price)) => price,
      Ok(None) => {
        debug!("No fair price available, skipping cycle");
        return SyncReport::skipped();
      }
      Err(e) => {
        warn!(error = %format!("{e:#}"), "Price feed failed, skipping cycle");
        return SyncReport::skipped();
      }
    };

    // read after the price so the view is as fresh as possible
    let Some(view) = self.order_book.working_view() else {
      return SyncReport::skipped();
    };

    let targets = self.policy.target_quotes(&QuoteContext {
      market: &self.market,
      fair_price,
      balances: &view.balances,
    });
    let plan = reconcile(&view.orders, &targets, &self.tolerance);

    let mut report = SyncReport::default();
    if plan.is_empty() {
      debug!(%fair_price, targets = targets.len(), "Orders in line with targets");
      return report;
    }

    let slots: HashMap<&OrderId, QuoteSlot> = view
      .orders
      .iter()
      .filter_map(|o| o.id.as_ref().map(|id| (id, o.slot())))
      .collect();

    let mut cancels_by_slot: HashMap<QuoteSlot, Vec<PendingHandle>> = HashMap::new();
    for order_id in &plan.to_cancel {
      let handle = self.order_book.request_cancel(order_id);
      if let Some(slot) = slots.get(order_id) {
        cancels_by_slot.entry(*slot).or_default().push(handle);
      }
      report.cancels_requested += 1;
    }

    for quote in plan.to_place {
      let after = cancels_by_slot
        .get(&quote.slot())
        .cloned()
        .unwrap_or_default();
      if self.order_book.request_place(quote, after).is_some() {
        report.places_requested += 1;
      } else {
        report.places_suppressed += 1;
      }
    }

    info!(
      %fair_price,
      policy = self.policy.name(),
      cancels = report.cancels_requested,
      places = report.places_requested,
      suppressed = report.places_suppressed,
      "Reconciliation submitted"
    );
    report
  }
}
