//! Exchange Port - CLOB REST Interface
//!
//! Everything the keeper needs from the order book exchange: market
//! listings, public books, the keeper's own open orders and the three
//! mutating calls. Mutations return `OperationError` so callers can tell a
//! definite rejection from an indeterminate failure.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{ListedMarket, MarketsPage, OrderBook, OrderId, Side, TokenId};
use crate::error::OperationError;

/// One of the keeper's orders as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOrder {
  pub id: OrderId,
  pub token_id: TokenId,
  pub side: Side,
  pub price: Decimal,
  /// Remaining (unfilled) size.
  pub size: Decimal,
}

/// Trait for CLOB access.
///
/// Implementations must bound every call with a timeout.
#[async_trait]
pub trait ExchangeApi: Send + Sync + 'static {
  /// Fetch a single market by condition id.
  async fn get_market(&self, condition_id: &str) -> anyhow::Result<ListedMarket>;

  /// Fetch one page of the market listing.
  async fn get_markets(&self, cursor: &str) -> anyhow::Result<MarketsPage>;

  /// Fetch the public order book of a token.
  async fn get_order_book(&self, token_id: &str) -> anyhow::Result<OrderBook>;

  /// Fetch the keeper's open orders on a market.
  async fn get_orders(&self, condition_id: &str) -> anyhow::Result<Vec<OpenOrder>>;

  /// Place a limit order and return the exchange-assigned id.
  async fn place_order(
    &self,
    price: Decimal,
    size: Decimal,
    side: Side,
    token_id: &str,
  ) -> Result<OrderId, OperationError>;

  /// Cancel one order. Orders already filled or cancelled count as success.
  async fn cancel_order(&self, order_id: &str) -> Result<(), OperationError>;

  /// Cancel every open order of the keeper, on every market.
  async fn cancel_all_orders(&self) -> Result<(), OperationError>;
}
