//! Prometheus Metrics Registry - Keeper Observability
//!
//! Balance gauges set on every balance fetch, plus counters for confirmed
//! placements, cancels and rejections. Metric and label names match the
//! dashboards of the original keeper (`keeper_balance_amount`).

use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Token id label used for fungible assets (collateral, gas).
pub const FUNGIBLE_TOKEN_ID: &str = "-1";

/// Asset address label of the native gas token.
pub const GAS_ASSET: &str = "0x0";

/// Centralized Prometheus metrics for the keeper.
pub struct KeeperMetrics {
    registry: Registry,
    /// Wallet balance per asset.
    pub balance_amount: GaugeVec,
    /// Orders confirmed placed.
    pub orders_placed: IntCounterVec,
    /// Orders confirmed cancelled.
    pub orders_cancelled: IntCounterVec,
    /// Placements definitively rejected by the exchange.
    pub orders_rejected: IntCounterVec,
}

impl KeeperMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let balance_amount = GaugeVec::new(
            Opts::new("keeper_balance_amount", "Keeper wallet balance per asset"),
            &["accountaddress", "assetaddress", "tokenid"],
        )?;

        let orders_placed = IntCounterVec::new(
            Opts::new("keeper_orders_placed_total", "Orders placed"),
            &["market", "side"],
        )?;

        let orders_cancelled = IntCounterVec::new(
            Opts::new("keeper_orders_cancelled_total", "Orders cancelled"),
            &["market"],
        )?;

        let orders_rejected = IntCounterVec::new(
            Opts::new(
                "keeper_orders_rejected_total",
                "Orders rejected by the CLOB",
            ),
            &["market"],
        )?;

        registry.register(Box::new(balance_amount.clone()))?;
        registry.register(Box::new(orders_placed.clone()))?;
        registry.register(Box::new(orders_cancelled.clone()))?;
        registry.register(Box::new(orders_rejected.clone()))?;

        Ok(Self {
            registry,
            balance_amount,
            orders_placed,
            orders_cancelled,
            orders_rejected,
        })
    }

    pub fn set_balance(&self, account: &str, asset: &str, token_id: &str, amount: Decimal) {
        self.balance_amount
            .with_label_values(&[account, asset, token_id])
            .set(amount.to_f64().unwrap_or_default());
    }

    pub fn order_placed(&self, market: &str, side: &str) {
        self.orders_placed.with_label_values(&[market, side]).inc();
    }

    pub fn order_cancelled(&self, market: &str) {
        self.orders_cancelled.with_label_values(&[market]).inc();
    }

    pub fn order_rejected(&self, market: &str) {
        self.orders_rejected.with_label_values(&[market]).inc();
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
