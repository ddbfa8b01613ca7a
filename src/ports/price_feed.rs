//! Price Feed Port - Fair Price Source

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Supplies the fair price of a market's outcome A token.
#[async_trait]
pub trait PriceFeed: Send + Sync + 'static {
  /// `Ok(None)` when no price can be derived right now (e.g. one-sided book).
  async fn fair_price(&self) -> anyhow::Result<Option<Decimal>>;
}
