//! Market Gateway Port - Per-market Capability
//!
//! The order book manager of one market talks to the outside world only
//! through this trait. An implementation is bound to a single market, so
//! calls carry no market index.

use async_trait::async_trait;

use crate::domain::{BalanceSnapshot, Order, OrderId, TargetQuote};
use crate::error::OperationError;

#[async_trait]
pub trait MarketGateway: Send + Sync + 'static {
  /// Open orders of the keeper on this market.
  async fn get_orders(&self) -> anyhow::Result<Vec<Order>>;

  /// Collateral, outcome token and gas balances of the keeper.
  async fn get_balances(&self) -> anyhow::Result<BalanceSnapshot>;

  async fn place_order(&self, quote: &TargetQuote) -> Result<OrderId, OperationError>;

  /// Cancel one order. Already filled or cancelled orders count as success.
  async fn cancel_order(&self, order_id: &str) -> Result<(), OperationError>;

  /// Exchange-side cancel of everything the keeper has open.
  async fn cancel_all(&self) -> Result<(), OperationError>;
}
