//! CLOB Midpoint Price Feed
//!
//! Fair price of a market is the midpoint of outcome A's public order
//! book, polled on demand at every reconciliation cycle.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::domain::{Market, Outcome, TokenId};
use crate::ports::{ExchangeApi, PriceFeed};

pub struct ClobPriceFeed<X: ExchangeApi> {
    exchange: Arc<X>,
    token_id: TokenId,
}

impl<X: ExchangeApi> ClobPriceFeed<X> {
    pub fn new(exchange: Arc<X>, market: &Market) -> Self {
        Self {
            exchange,
            token_id: market.token_id(Outcome::A).to_string(),
        }
    }
}

#[async_trait]
impl<X: ExchangeApi> PriceFeed for ClobPriceFeed<X> {
    #[instrument(skip(self), fields(token_id = %self.token_id))]
    async fn fair_price(&self) -> anyhow::Result<Option<Decimal>> {
        let book = self.exchange.get_order_book(&self.token_id).await?;
        let mid = book.midpoint();
        debug!(
            bid = ?book.best_bid(),
            ask = ?book.best_ask(),
            mid = ?mid,
            "Fair price"
        );
        Ok(mid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookLevel, ListedMarket, MarketsPage, OrderBook, OrderId, Side};
    use crate::error::OperationError;
    use crate::ports::OpenOrder;
    use mockall::mock;
    use rust_decimal_macros::dec;

    mock! {
        Exchange {}

        #[async_trait]
        impl ExchangeApi for Exchange {
            async fn get_market(&self, condition_id: &str) -> anyhow::Result<ListedMarket>;
            async fn get_markets(&self, cursor: &str) -> anyhow::Result<MarketsPage>;
            async fn get_order_book(&self, token_id: &str) -> anyhow::Result<OrderBook>;
            async fn get_orders(&self, condition_id: &str) -> anyhow::Result<Vec<OpenOrder>>;
            async fn place_order(&self, price: Decimal, size: Decimal, side: Side, token_id: &str) -> Result<OrderId, OperationError>;
            async fn cancel_order(&self, order_id: &str) -> Result<(), OperationError>;
            async fn cancel_all_orders(&self) -> Result<(), OperationError>;
        }
    }

    fn market() -> Market {
        Market::new("0xcond", "0xusdc", "111", "222").unwrap()
    }

    #[tokio::test]
    async fn test_fair_price_is_outcome_a_midpoint() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_get_order_book()
            .withf(|token| token == "111")
            .returning(|_| {
                Ok(OrderBook::new(
                    vec![BookLevel::new(dec!(0.40), dec!(10)), BookLevel::new(dec!(0.44), dec!(5))],
                    vec![BookLevel::new(dec!(0.50), dec!(10)), BookLevel::new(dec!(0.48), dec!(5))],
                ))
            });

        let feed = ClobPriceFeed::new(Arc::new(exchange), &market());
        assert_eq!(feed.fair_price().await.unwrap(), Some(dec!(0.46)));
    }

    #[tokio::test]
    async fn test_one_sided_book_has_no_price() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_get_order_book()
            .returning(|_| Ok(OrderBook::new(vec![BookLevel::new(dec!(0.40), dec!(10))], vec![])));

        let feed = ClobPriceFeed::new(Arc::new(exchange), &market());
        assert_eq!(feed.fair_price().await.unwrap(), None);
    }
}
