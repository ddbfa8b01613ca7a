//! Order Book Manager Use Case - Per-market Order and Balance Cache
//!
//! The only component allowed to place or cancel orders for its market.
//! A background task refreshes orders and balances on a fixed interval and
//! publishes each result as an immutable snapshot; place/cancel requests
//! run on a bounded worker pool and are tracked as pending operations
//! until a later refresh supersedes them.
//!
//! Consistency rules:
//! - At most one placement per (side, outcome, price) key is outstanding.
//! - A timed-out place/cancel is indeterminate: it is never retried and
//!   its key stays reserved until a refresh that started after it settled.
//! - Only an explicit exchange rejection frees a key immediately.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, timeout};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::OrderBookConfig;
use crate::domain::{BalanceSnapshot, Order, OrderId, OrderKey, TargetQuote};
use crate::error::OperationError;
use crate::ports::MarketGateway;

/// One confirmed view of the exchange, replaced wholesale on every refresh.
#[derive(Debug, Clone)]
pub struct BookSnapshot {
  pub orders: Vec<Order>,
  pub balances: BalanceSnapshot,
  pub refreshed_at: DateTime<Utc>,
}

/// Confirmed snapshot overlaid with pending operations.
#[derive(Debug, Clone)]
pub struct WorkingView {
  pub orders: Vec<Order>,
  pub balances: BalanceSnapshot,
}

/// Final state of a place or cancel request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
  Placed(OrderId),
  Cancelled,
  /// The exchange definitely rejected the request.
  Failed(String),
  /// Timed out or failed in transit; may or may not have been applied.
  Indeterminate,
}

/// Handle to a request submitted to the worker pool.
#[derive(Debug, Clone)]
pub struct PendingHandle {
  id: Uuid,
  rx: watch::Receiver<Option<OperationOutcome>>,
}

impl PendingHandle {
  fn new() -> (Self, watch::Sender<Option<OperationOutcome>>) {
    let (tx, rx) = watch::channel(None);
    (
      Self {
        id: Uuid::new_v4(),
        rx,
      },
      tx,
    )
  }

  pub const fn id(&self) -> Uuid {
    self.id
  }

  /// Outcome if the request has already settled.
  pub fn outcome(&self) -> Option<OperationOutcome> {
    self.rx.borrow().clone()
  }

  /// Wait for the request to settle.
  ///
  /// A request whose task vanished without reporting is indeterminate.
  pub async fn settled(&self) -> OperationOutcome {
    let mut rx = self.rx.clone();
    let outcome = rx
      .wait_for(Option::is_some)
      .await
      .ok()
      .and_then(|value| value.clone());
    outcome.unwrap_or(OperationOutcome::Indeterminate)
  }
}

/// Result of a best-effort cancel of everything on one market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelAllReport {
  pub attempted: usize,
  pub failed: usize,
}

struct PendingPlace {
  quote: TargetQuote,
  handle: PendingHandle,
  order_id: Option<OrderId>,
  settled_at: Option<Instant>,
}

struct PendingCancel {
  handle: PendingHandle,
  settled_at: Option<Instant>,
}

#[derive(Default)]
struct PendingOps {
  places: HashMap<OrderKey, PendingPlace>,
  cancels: HashMap<OrderId, PendingCancel>,
}

impl PendingOps {
  /// Drop operations whose effect the refresh starting at `fetch_started`
  /// is guaranteed to observe.
  fn prune_settled_before(&mut self, fetch_started: Instant) {
    let superseded = |settled_at: Option<Instant>| settled_at.is_some_and(|t| t < fetch_started);
    self.places.retain(|_, p| !superseded(p.settled_at));
    self.cancels.retain(|_, c| !superseded(c.settled_at));
  }
}

struct Inner<G: MarketGateway> {
  market: String,
  gateway: Arc<G>,
  config: OrderBookConfig,
  workers: Arc<Semaphore>,
  snapshot_tx: watch::Sender<Option<Arc<BookSnapshot>>>,
  pending: Mutex<PendingOps>,
}

/// Authoritative order and balance cache for one market.
pub struct OrderBookManager<G: MarketGateway> {
  inner: Arc<Inner<G>>,
  started: AtomicBool,
  refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl<G: MarketGateway> OrderBookManager<G> {
  /// Create a manager for `market` (a condition id, used for logging).
  pub fn new(market: impl Into<String>, gateway: Arc<G>, config: &OrderBookConfig) -> Self {
    let (snapshot_tx, _) = watch::channel(None);
    Self {
      inner: Arc::new(Inner {
        market: market.into(),
        gateway,
        config: config.clone(),
        workers: Arc::new(Semaphore::new(config.max_workers.max(1))),
        snapshot_tx,
        pending: Mutex::new(PendingOps::default()),
      }),
      started: AtomicBool::new(false),
      refresh_task: Mutex::new(None),
    }
  }

  /// Start the background refresh loop. Calling it again has no effect.
  pub fn start(&self) {
    if self.started.swap(true, Ordering::SeqCst) {
      return;
    }
    let inner = Arc::clone(&self.inner);
    let task = tokio::spawn(async move { inner.refresh_loop().await });
    *lock_or_recover(&self.refresh_task) = Some(task);
    info!(market = %self.inner.market, "Order book manager started");
  }

  /// Abort the refresh loop. In-flight operations are left to finish.
  pub fn stop(&self) {
    if let Some(task) = lock_or_recover(&self.refresh_task).take() {
      task.abort();
      debug!(market = %self.inner.market, "Order book refresh stopped");
    }
  }

  /// Run one refresh pass.
  ///
  /// # Errors
  /// Fails when either fetch fails or times out; the previous snapshot is
  /// kept in that case.
  pub async fn refresh(&self) -> Result<()> {
    self.inner.refresh().await
  }

  /// Latest confirmed snapshot, if any refresh has succeeded yet.
  pub fn snapshot(&self) -> Option<Arc<BookSnapshot>> {
    self.inner.snapshot_tx.borrow().clone()
  }

  pub fn get_orders(&self) -> Option<Vec<Order>> {
    self.snapshot().map(|s| s.orders.clone())
  }

  pub fn get_balances(&self) -> Option<BalanceSnapshot> {
    self.snapshot().map(|s| s.balances)
  }

  /// Receiver notified on every snapshot replacement.
  pub fn subscribe(&self) -> watch::Receiver<Option<Arc<BookSnapshot>>> {
    self.inner.snapshot_tx.subscribe()
  }

  /// Wait until the first snapshot exists, up to `limit`.
  pub async fn wait_until_ready(&self, limit: Duration) -> bool {
    let mut rx = self.subscribe();
    let ready = timeout(limit, rx.wait_for(Option::is_some))
      .await
      .is_ok_and(|r| r.is_ok());
    ready
  }

  /// Confirmed orders with pending effects applied: orders being cancelled
  /// are hidden, placements in flight or settled since the last refresh are
  /// shown.
  ///
  /// Computed under the same lock that guards snapshot replacement, so a
  /// refresh can never be observed half-applied.
  pub fn working_view(&self) -> Option<WorkingView> {
    let pending = self.inner.lock_pending();
    let snapshot = self.inner.snapshot_tx.borrow().clone()?;

    let mut orders: Vec<Order> = snapshot
      .orders
      .iter()
      .filter(|o| o.id.as_ref().is_none_or(|id| !pending.cancels.contains_key(id)))
      .cloned()
      .collect();

    let confirmed: HashSet<&OrderId> = snapshot.orders.iter().filter_map(|o| o.id.as_ref()).collect();
    for place in pending.places.values() {
      if let Some(id) = &place.order_id {
        if confirmed.contains(id) || pending.cancels.contains_key(id) {
          continue;
        }
      }
      orders.push(place.quote.clone().into_order(place.order_id.clone()));
    }

    Some(WorkingView {
      orders,
      balances: snapshot.balances,
    })
  }

  /// Submit a placement.
  ///
  /// Returns `None` when a placement with the same key is already pending.
  /// The placement is sent only after every handle in `after` has settled.
  pub fn request_place(&self, quote: TargetQuote, after: Vec<PendingHandle>) -> Option<PendingHandle> {
    let key = quote.key();
    let (handle, tx) = PendingHandle::new();
    {
      let mut pending = self.inner.lock_pending();
      if pending.places.contains_key(&key) {
        debug!(
          market = %self.inner.market,
          side = %quote.side,
          outcome = %quote.outcome,
          price = %quote.price,
          "Placement already pending, suppressed"
        );
        return None;
      }
      pending.places.insert(
        key.clone(),
        PendingPlace {
          quote: quote.clone(),
          handle: handle.clone(),
          order_id: None,
          settled_at: None,
        },
      );
    }

    let inner = Arc::clone(&self.inner);
    let handle_id = handle.id;
    tokio::spawn(async move { inner.run_place(key, handle_id, quote, after, tx).await });
    Some(handle)
  }

  /// Submit a cancellation. Repeated requests for an id that is already
  /// being cancelled return the existing handle.
  pub fn request_cancel(&self, order_id: &str) -> PendingHandle {
    let (handle, tx) = PendingHandle::new();
    {
      let mut pending = self.inner.lock_pending();
      if let Some(existing) = pending.cancels.get(order_id) {
        return existing.handle.clone();
      }
      pending.cancels.insert(
        order_id.to_string(),
        PendingCancel {
          handle: handle.clone(),
          settled_at: None,
        },
      );
    }

    let inner = Arc::clone(&self.inner);
    let order_id = order_id.to_string();
    let handle_id = handle.id;
    tokio::spawn(async move { inner.run_cancel(order_id, handle_id, tx).await });
    handle
  }

  /// Cancel every order believed open, including placements made since the
  /// last refresh. Failures are counted, never propagated.
  ///
  /// Without any snapshot there is nothing to enumerate, so the exchange's
  /// cancel-all is used instead.
  #[instrument(skip(self), fields(market = %self.inner.market))]
  pub async fn cancel_all(&self) -> CancelAllReport {
    let in_flight: Vec<PendingHandle> = {
      let pending = self.inner.lock_pending();
      pending
        .places
        .values()
        .filter(|p| p.settled_at.is_none())
        .map(|p| p.handle.clone())
        .collect()
    };
    join_all(in_flight.iter().map(PendingHandle::settled)).await;

    let ids: Option<BTreeSet<OrderId>> = {
      let mut pending = self.inner.lock_pending();
      // a settled cancel may have been indeterminate, so only in-flight ones are reused
      pending.cancels.retain(|_, c| c.settled_at.is_none());
      let snapshot = self.inner.snapshot_tx.borrow().clone();
      snapshot.map(|s| {
        s.orders
          .iter()
          .filter_map(|o| o.id.clone())
          .chain(pending.places.values().filter_map(|p| p.order_id.clone()))
          .collect()
      })
    };

    let Some(ids) = ids else {
      warn!("No snapshot yet, falling back to exchange cancel-all");
      let result = timeout(self.inner.config.operation_timeout(), self.inner.gateway.cancel_all())
        .await
        .unwrap_or(Err(OperationError::Timeout));
      return match result {
        Ok(()) => CancelAllReport {
          attempted: 1,
          failed: 0,
        },
        Err(e) => {
          warn!(error = %e, "Exchange cancel-all failed");
          CancelAllReport {
            attempted: 1,
            failed: 1,
          }
        }
      };
    };

    let handles: Vec<PendingHandle> = ids.iter().map(|id| self.request_cancel(id)).collect();
    let outcomes = join_all(handles.iter().map(PendingHandle::settled)).await;
    let failed = outcomes
      .iter()
      .filter(|o| !matches!(o, OperationOutcome::Cancelled))
      .count();

    info!(attempted = ids.len(), failed, "Cancel-all finished");
    CancelAllReport {
      attempted: ids.len(),
      failed,
    }
  }
}

impl<G: MarketGateway> Drop for OrderBookManager<G> {
  fn drop(&mut self) {
    self.stop();
  }
}

impl<G: MarketGateway> Inner<G> {
  fn lock_pending(&self) -> MutexGuard<'_, PendingOps> {
    lock_or_recover(&self.pending)
  }

  async fn refresh_loop(self: Arc<Self>) {
    let mut ticker = interval(self.config.refresh_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
      ticker.tick().await;
      if let Err(e) = self.refresh().await {
        warn!(market = %self.market, error = %format!("{e:#}"), "Refresh failed, keeping previous snapshot");
      }
    }
  }

  #[instrument(skip(self), fields(market = %self.market))]
  async fn refresh(&self) -> Result<()> {
    let fetch_started = Instant::now();
    let limit = self.config.operation_timeout();

    let (orders, balances) = tokio::join!(
      timeout(limit, self.gateway.get_orders()),
      timeout(limit, self.gateway.get_balances()),
    );
    let orders = orders.context("order fetch timed out")?.context("order fetch failed")?;
    let balances = balances
      .context("balance fetch timed out")?
      .context("balance fetch failed")?;

    let order_count = orders.len();
    let snapshot = Arc::new(BookSnapshot {
      orders,
      balances,
      refreshed_at: Utc::now(),
    });

    {
      let mut pending = self.lock_pending();
      pending.prune_settled_before(fetch_started);
      self.snapshot_tx.send_replace(Some(snapshot));
    }

    debug!(
      orders = order_count,
      collateral = %balances.collateral,
      "Order book refreshed"
    );
    Ok(())
  }

  async fn run_place(
    self: Arc<Self>,
    key: OrderKey,
    handle_id: Uuid,
    quote: TargetQuote,
    after: Vec<PendingHandle>,
    tx: watch::Sender<Option<OperationOutcome>>,
  ) {
    for prerequisite in &after {
      prerequisite.settled().await;
    }

    let result = match Arc::clone(&self.workers).acquire_owned().await {
      Ok(_permit) => timeout(self.config.operation_timeout(), self.gateway.place_order(&quote))
        .await
        .unwrap_or(Err(OperationError::Timeout)),
      Err(e) => Err(OperationError::Other(e.into())),
    };

    let outcome = match result {
      Ok(id) => OperationOutcome::Placed(id),
      Err(OperationError::Rejected(reason)) => OperationOutcome::Failed(reason),
      Err(_) => OperationOutcome::Indeterminate,
    };

    {
      let mut pending = self.lock_pending();
      let owned = pending.places.get(&key).is_some_and(|p| p.handle.id == handle_id);
      if owned {
        if let OperationOutcome::Failed(_) = outcome {
          pending.places.remove(&key);
        } else if let Some(entry) = pending.places.get_mut(&key) {
          if let OperationOutcome::Placed(id) = &outcome {
            entry.order_id = Some(id.clone());
          }
          entry.settled_at = Some(Instant::now());
        }
      }
    }

    match &outcome {
      OperationOutcome::Placed(id) => info!(
        market = %self.market,
        order_id = %id,
        side = %quote.side,
        outcome = %quote.outcome,
        price = %quote.price,
        size = %quote.size,
        "Order placed"
      ),
      OperationOutcome::Failed(reason) => warn!(
        market = %self.market,
        side = %quote.side,
        price = %quote.price,
        reason = %reason,
        "Order rejected"
      ),
      _ => warn!(
        market = %self.market,
        side = %quote.side,
        price = %quote.price,
        "Placement outcome unknown, key held until next refresh"
      ),
    }
    tx.send_replace(Some(outcome));
  }

  async fn run_cancel(
    self: Arc<Self>,
    order_id: OrderId,
    handle_id: Uuid,
    tx: watch::Sender<Option<OperationOutcome>>,
  ) {
    let result = match Arc::clone(&self.workers).acquire_owned().await {
      Ok(_permit) => timeout(self.config.operation_timeout(), self.gateway.cancel_order(&order_id))
        .await
        .unwrap_or(Err(OperationError::Timeout)),
      Err(e) => Err(OperationError::Other(e.into())),
    };

    let outcome = match result {
      Ok(()) => OperationOutcome::Cancelled,
      Err(OperationError::Rejected(reason)) => OperationOutcome::Failed(reason),
      Err(_) => OperationOutcome::Indeterminate,
    };

    {
      let mut pending = self.lock_pending();
      let owned = pending.cancels.get(&order_id).is_some_and(|c| c.handle.id == handle_id);
      if owned {
        if let OperationOutcome::Failed(_) = outcome {
          pending.cancels.remove(&order_id);
        } else if let Some(entry) = pending.cancels.get_mut(&order_id) {
          entry.settled_at = Some(Instant::now());
        }
      }
    }

    match &outcome {
      OperationOutcome::Cancelled => info!(market = %self.market, order_id = %order_id, "Order cancelled"),
      OperationOutcome::Failed(reason) => {
        warn!(market = %self.market, order_id = %order_id, reason = %reason, "Cancel rejected");
      }
      _ => warn!(market = %self.market, order_id = %order_id, "Cancel outcome unknown"),
    }
    tx.send_replace(Some(outcome));
  }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
