//! Shared fakes for the integration tests.
//!
//! `FakeGateway` behaves like a tiny exchange: placements add an order,
//! cancels remove it, and every call is recorded in arrival order so tests
//! can assert sequencing. Delays and failures are configured per instance.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use poly_market_maker::config::OrderBookConfig;
use poly_market_maker::domain::{
    BalanceSnapshot, Market, Order, OrderId, Outcome, QuoteContext, QuotePolicy, Side,
    TargetQuote,
};
use poly_market_maker::error::OperationError;
use poly_market_maker::ports::{MarketGateway, PriceFeed};

/// How the fake answers placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceMode {
    Accept,
    Reject,
    /// Sleep far past any operation timeout.
    Hang,
}

pub struct FakeGateway {
    orders: Mutex<Vec<Order>>,
    balances: Mutex<BalanceSnapshot>,
    place_mode: Mutex<PlaceMode>,
    place_delay: Duration,
    cancel_delay: Duration,
    failing_cancels: Mutex<HashSet<OrderId>>,
    rejected_cancels: Mutex<HashSet<OrderId>>,
    fail_fetch: AtomicBool,
    next_id: AtomicUsize,
    /// Placements, recorded once the call has been answered.
    pub place_calls: Mutex<Vec<TargetQuote>>,
    /// Cancels, recorded on arrival.
    pub cancel_calls: Mutex<Vec<OrderId>>,
    pub cancel_all_calls: AtomicUsize,
    /// `place:<side>:<outcome>:<price>` at call start, `cancel:<id>` at
    /// call completion.
    pub events: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            balances: Mutex::new(BalanceSnapshot::new(dec!(1000), dec!(0), dec!(0), dec!(1))),
            place_mode: Mutex::new(PlaceMode::Accept),
            place_delay: Duration::ZERO,
            cancel_delay: Duration::ZERO,
            failing_cancels: Mutex::new(HashSet::new()),
            rejected_cancels: Mutex::new(HashSet::new()),
            fail_fetch: AtomicBool::new(false),
            next_id: AtomicUsize::new(1),
            place_calls: Mutex::new(Vec::new()),
            cancel_calls: Mutex::new(Vec::new()),
            cancel_all_calls: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delays(mut self, place: Duration, cancel: Duration) -> Self {
        self.place_delay = place;
        self.cancel_delay = cancel;
        self
    }

    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        *self.orders.lock().unwrap() = orders;
        self
    }

    pub fn set_orders(&self, orders: Vec<Order>) {
        *self.orders.lock().unwrap() = orders;
    }

    pub fn set_balances(&self, balances: BalanceSnapshot) {
        *self.balances.lock().unwrap() = balances;
    }

    pub fn set_place_mode(&self, mode: PlaceMode) {
        *self.place_mode.lock().unwrap() = mode;
    }

    /// Cancels of `id` fail with a transport-style error.
    pub fn fail_cancel(&self, id: &str) {
        self.failing_cancels.lock().unwrap().insert(id.to_string());
    }

    /// Cancels of `id` go through again.
    pub fn heal_cancel(&self, id: &str) {
        self.failing_cancels.lock().unwrap().remove(id);
    }

    /// Cancels of `id` are definitively rejected.
    pub fn reject_cancel(&self, id: &str) {
        self.rejected_cancels.lock().unwrap().insert(id.to_string());
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn open_orders(&self) -> Vec<Order> {
        self.orders.lock().unwrap().clone()
    }

    pub fn place_count(&self) -> usize {
        self.place_calls.lock().unwrap().len()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_calls.lock().unwrap().len()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketGateway for FakeGateway {
    async fn get_orders(&self) -> anyhow::Result<Vec<Order>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            anyhow::bail!("order fetch unavailable");
        }
        Ok(self.open_orders())
    }

    async fn get_balances(&self) -> anyhow::Result<BalanceSnapshot> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            anyhow::bail!("balance fetch unavailable");
        }
        Ok(*self.balances.lock().unwrap())
    }

    async fn place_order(&self, quote: &TargetQuote) -> Result<OrderId, OperationError> {
        self.events.lock().unwrap().push(format!(
            "place:{}:{}:{}",
            quote.side, quote.outcome, quote.price
        ));
        let mode = *self.place_mode.lock().unwrap();
        match mode {
            PlaceMode::Hang => {
                self.place_calls.lock().unwrap().push(quote.clone());
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(OperationError::Timeout)
            }
            PlaceMode::Reject => {
                tokio::time::sleep(self.place_delay).await;
                self.place_calls.lock().unwrap().push(quote.clone());
                Err(OperationError::Rejected("not enough balance".into()))
            }
            PlaceMode::Accept => {
                tokio::time::sleep(self.place_delay).await;
                let id = format!("ord-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
                self.orders
                    .lock()
                    .unwrap()
                    .push(quote.clone().into_order(Some(id.clone())));
                self.place_calls.lock().unwrap().push(quote.clone());
                Ok(id)
            }
        }
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), OperationError> {
        self.cancel_calls.lock().unwrap().push(order_id.to_string());
        tokio::time::sleep(self.cancel_delay).await;
        self.events.lock().unwrap().push(format!("cancel:{order_id}"));

        if self.failing_cancels.lock().unwrap().contains(order_id) {
            return Err(anyhow::anyhow!("connection reset").into());
        }
        if self.rejected_cancels.lock().unwrap().contains(order_id) {
            return Err(OperationError::Rejected("order is locked".into()));
        }
        self.orders
            .lock()
            .unwrap()
            .retain(|o| o.id.as_deref() != Some(order_id));
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), OperationError> {
        self.cancel_all_calls.fetch_add(1, Ordering::SeqCst);
        self.orders.lock().unwrap().clear();
        Ok(())
    }
}

/// Price feed returning whatever the test last set.
pub struct FakePriceFeed {
    price: Mutex<Option<Decimal>>,
}

impl FakePriceFeed {
    pub fn new(price: Option<Decimal>) -> Self {
        Self {
            price: Mutex::new(price),
        }
    }

    pub fn set(&self, price: Option<Decimal>) {
        *self.price.lock().unwrap() = price;
    }
}

#[async_trait]
impl PriceFeed for FakePriceFeed {
    async fn fair_price(&self) -> anyhow::Result<Option<Decimal>> {
        Ok(*self.price.lock().unwrap())
    }
}

/// Policy that always wants the same quotes.
pub struct FixedQuotes(pub Vec<TargetQuote>);

impl QuotePolicy for FixedQuotes {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn target_quotes(&self, _ctx: &QuoteContext<'_>) -> Vec<TargetQuote> {
        self.0.clone()
    }
}

pub fn market(condition_id: &str) -> Market {
    Market::new(condition_id, "0xusdc", "111", "222").unwrap()
}

pub fn book_config() -> OrderBookConfig {
    OrderBookConfig {
        refresh_interval_secs: 3600,
        max_workers: 4,
        operation_timeout_ms: 500,
    }
}

pub fn live(id: &str, side: Side, outcome: Outcome, price: Decimal, size: Decimal) -> Order {
    Order {
        id: Some(id.to_string()),
        side,
        outcome,
        price,
        size,
    }
}

/// Poll `condition` until it holds, yielding to spawned tasks in between.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}
