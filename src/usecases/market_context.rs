//! Everything the keeper holds for one quoted market.

use std::sync::Arc;

use crate::config::OrderBookConfig;
use crate::domain::{Market, QuotePolicy, Tolerance};
use crate::ports::{MarketGateway, PriceFeed};

use super::order_book_manager::OrderBookManager;
use super::strategy_manager::StrategyManager;

pub struct MarketContext<G: MarketGateway, F: PriceFeed> {
  pub market: Market,
  pub price_feed: Arc<F>,
  pub order_book: Arc<OrderBookManager<G>>,
  pub strategy: StrategyManager<G, F>,
}

impl<G: MarketGateway, F: PriceFeed> MarketContext<G, F> {
  /// Wire a market's order book manager and strategy around its gateway.
  pub fn new(
    market: Market,
    gateway: Arc<G>,
    price_feed: Arc<F>,
    policy: Arc<dyn QuotePolicy>,
    book_config: &OrderBookConfig,
    tolerance: Tolerance,
  ) -> Self {
    let order_book = Arc::new(OrderBookManager::new(
      market.condition_id(),
      gateway,
      book_config,
    ));
    let strategy = StrategyManager::new(
      market.clone(),
      Arc::clone(&price_feed),
      Arc::clone(&order_book),
      policy,
      tolerance,
    );
    Self {
      market,
      price_feed,
      order_book,
      strategy,
    }
  }
}
