//! CLOB Market Gateway - Per-market Exchange and Chain Access
//!
//! Binds the shared `ExchangeApi` and `ChainClient` to one market so the
//! order book manager can call them without a market index. Translates
//! exchange token ids to outcomes, reads the four balances concurrently and
//! records balance gauges and order counters.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::warn;

use crate::adapters::metrics::KeeperMetrics;
use crate::adapters::metrics::prometheus::{FUNGIBLE_TOKEN_ID, GAS_ASSET};
use crate::domain::{BalanceSnapshot, Market, Order, OrderId, Outcome, TargetQuote};
use crate::error::OperationError;
use crate::ports::{ChainClient, ExchangeApi, MarketGateway};

/// Token contracts the balances are read from.
#[derive(Debug, Clone, Copy)]
pub struct TokenContracts {
    pub collateral: Address,
    pub conditional: Address,
}

pub struct ClobMarketGateway<X: ExchangeApi, C: ChainClient> {
    market: Market,
    exchange: Arc<X>,
    chain: Arc<C>,
    /// Address whose balances are tracked.
    owner: Address,
    contracts: TokenContracts,
    /// ERC-1155 position ids of outcome A and B.
    positions: [U256; 2],
    metrics: Option<Arc<KeeperMetrics>>,
}

impl<X: ExchangeApi, C: ChainClient> ClobMarketGateway<X, C> {
    /// # Errors
    /// Fails if an outcome token id is not a decimal integer.
    pub fn new(
        market: Market,
        exchange: Arc<X>,
        chain: Arc<C>,
        owner: Address,
        contracts: TokenContracts,
        metrics: Option<Arc<KeeperMetrics>>,
    ) -> Result<Self> {
        let position = |outcome: Outcome| {
            let id = market.token_id(outcome);
            U256::from_str_radix(id, 10).with_context(|| format!("invalid token id {id}"))
        };
        let positions = [position(Outcome::A)?, position(Outcome::B)?];

        Ok(Self {
            market,
            exchange,
            chain,
            owner,
            contracts,
            positions,
            metrics,
        })
    }

    fn record_balances(&self, balances: &BalanceSnapshot) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        let account = self.owner.to_string();
        metrics.set_balance(
            &account,
            &self.contracts.collateral.to_string(),
            FUNGIBLE_TOKEN_ID,
            balances.collateral,
        );
        let conditional = self.contracts.conditional.to_string();
        for outcome in [Outcome::A, Outcome::B] {
            metrics.set_balance(
                &account,
                &conditional,
                self.market.token_id(outcome),
                balances.token(outcome),
            );
        }
        metrics.set_balance(&account, GAS_ASSET, FUNGIBLE_TOKEN_ID, balances.gas);
    }
}

#[async_trait]
impl<X: ExchangeApi, C: ChainClient> MarketGateway for ClobMarketGateway<X, C> {
    async fn get_orders(&self) -> Result<Vec<Order>> {
        let open = self.exchange.get_orders(self.market.condition_id()).await?;

        let orders = open
            .into_iter()
            .filter_map(|o| match self.market.outcome_of(&o.token_id) {
                Some(outcome) => Some(Order {
                    id: Some(o.id),
                    side: o.side,
                    outcome,
                    price: o.price,
                    size: o.size,
                }),
                None => {
                    warn!(
                        market = %self.market,
                        order_id = %o.id,
                        token_id = %o.token_id,
                        "Open order on an unknown token, ignoring"
                    );
                    None
                }
            })
            .collect();
        Ok(orders)
    }

    async fn get_balances(&self) -> Result<BalanceSnapshot> {
        let (collateral, token_a, token_b, gas) = tokio::try_join!(
            self.chain.erc20_balance(self.contracts.collateral, self.owner),
            self.chain
                .erc1155_balance(self.contracts.conditional, self.owner, self.positions[0]),
            self.chain
                .erc1155_balance(self.contracts.conditional, self.owner, self.positions[1]),
            self.chain.gas_balance(self.owner),
        )?;

        let balances = BalanceSnapshot::new(collateral, token_a, token_b, gas);
        self.record_balances(&balances);
        Ok(balances)
    }

    async fn place_order(&self, quote: &TargetQuote) -> Result<OrderId, OperationError> {
        let token_id = self.market.token_id(quote.outcome);
        let result = self
            .exchange
            .place_order(quote.price, quote.size, quote.side, token_id)
            .await;

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(_) => metrics.order_placed(self.market.condition_id(), quote.side.as_str()),
                Err(e) if e.is_definite() => metrics.order_rejected(self.market.condition_id()),
                Err(_) => {}
            }
        }
        result
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), OperationError> {
        let result = self.exchange.cancel_order(order_id).await;
        if let (Ok(()), Some(metrics)) = (&result, &self.metrics) {
            metrics.order_cancelled(self.market.condition_id());
        }
        result
    }

    async fn cancel_all(&self) -> Result<(), OperationError> {
        self.exchange.cancel_all_orders().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ListedMarket, MarketsPage, OrderBook, Side};
    use crate::ports::OpenOrder;
    use mockall::mock;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    mock! {
        Exchange {}

        #[async_trait]
        impl ExchangeApi for Exchange {
            async fn get_market(&self, condition_id: &str) -> Result<ListedMarket>;
            async fn get_markets(&self, cursor: &str) -> Result<MarketsPage>;
            async fn get_order_book(&self, token_id: &str) -> Result<OrderBook>;
            async fn get_orders(&self, condition_id: &str) -> Result<Vec<OpenOrder>>;
            async fn place_order(&self, price: Decimal, size: Decimal, side: Side, token_id: &str) -> Result<OrderId, OperationError>;
            async fn cancel_order(&self, order_id: &str) -> Result<(), OperationError>;
            async fn cancel_all_orders(&self) -> Result<(), OperationError>;
        }
    }

    mock! {
        Chain {}

        #[async_trait]
        impl ChainClient for Chain {
            async fn erc20_balance(&self, token: Address, owner: Address) -> Result<Decimal>;
            async fn erc1155_balance(&self, token: Address, owner: Address, id: U256) -> Result<Decimal>;
            async fn gas_balance(&self, owner: Address) -> Result<Decimal>;
            async fn ensure_erc20_max_approval(&self, token: Address, owner: Address, spender: Address) -> Result<()>;
            async fn ensure_erc1155_approval_for_all(&self, token: Address, owner: Address, operator: Address) -> Result<()>;
        }
    }

    const OWNER: Address = Address::repeat_byte(0xaa);
    const CONTRACTS: TokenContracts = TokenContracts {
        collateral: Address::repeat_byte(1),
        conditional: Address::repeat_byte(2),
    };

    fn market() -> Market {
        Market::new("0xcond", "0xusdc", "111", "222").unwrap()
    }

    fn gateway(
        exchange: MockExchange,
        chain: MockChain,
        metrics: Option<Arc<KeeperMetrics>>,
    ) -> ClobMarketGateway<MockExchange, MockChain> {
        ClobMarketGateway::new(
            market(),
            Arc::new(exchange),
            Arc::new(chain),
            OWNER,
            CONTRACTS,
            metrics,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_orders_mapped_to_outcomes_and_foreign_tokens_dropped() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_get_orders()
            .withf(|cond| cond == "0xcond")
            .returning(|_| {
                Ok(vec![
                    OpenOrder {
                        id: "1".into(),
                        token_id: "222".into(),
                        side: Side::Buy,
                        price: dec!(0.4),
                        size: dec!(10),
                    },
                    OpenOrder {
                        id: "2".into(),
                        token_id: "999".into(),
                        side: Side::Sell,
                        price: dec!(0.6),
                        size: dec!(10),
                    },
                ])
            });

        let orders = gateway(exchange, MockChain::new(), None)
            .get_orders()
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id.as_deref(), Some("1"));
        assert_eq!(orders[0].outcome, Outcome::B);
    }

    #[tokio::test]
    async fn test_balances_read_per_position_and_recorded() {
        let mut chain = MockChain::new();
        chain.expect_erc20_balance().returning(|_, _| Ok(dec!(100)));
        chain
            .expect_erc1155_balance()
            .returning(|_, _, id| Ok(if id == U256::from(111u64) { dec!(5) } else { dec!(7) }));
        chain.expect_gas_balance().returning(|_| Ok(dec!(1.25)));

        let metrics = Arc::new(KeeperMetrics::new().unwrap());
        let balances = gateway(MockExchange::new(), chain, Some(Arc::clone(&metrics)))
            .get_balances()
            .await
            .unwrap();

        assert_eq!(balances, BalanceSnapshot::new(dec!(100), dec!(5), dec!(7), dec!(1.25)));
        let rendered = metrics.render();
        assert!(rendered.contains(r#"tokenid="222"} 7"#));
        assert!(rendered.contains(r#"assetaddress="0x0""#));
    }

    #[tokio::test]
    async fn test_balance_failure_propagates() {
        let mut chain = MockChain::new();
        chain.expect_erc20_balance().returning(|_, _| Err(anyhow::anyhow!("rpc down")));
        chain.expect_erc1155_balance().returning(|_, _, _| Ok(dec!(0)));
        chain.expect_gas_balance().returning(|_| Ok(dec!(0)));

        let result = gateway(MockExchange::new(), chain, None).get_balances().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_place_uses_outcome_token_and_counts() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_place_order()
            .withf(|price, size, side, token| {
                *price == dec!(0.45) && *size == dec!(10) && *side == Side::Buy && token == "222"
            })
            .returning(|_, _, _, _| Ok("0xnew".to_string()));

        let metrics = Arc::new(KeeperMetrics::new().unwrap());
        let gw = gateway(exchange, MockChain::new(), Some(Arc::clone(&metrics)));
        let quote = TargetQuote::new(Side::Buy, Outcome::B, dec!(0.45), dec!(10));
        assert_eq!(gw.place_order(&quote).await.unwrap(), "0xnew");
        assert_eq!(
            metrics.orders_placed.with_label_values(&["0xcond", "BUY"]).get(),
            1
        );
    }

    #[test]
    fn test_rejects_non_numeric_token_ids() {
        let market = Market::new("0xcond", "0xusdc", "abc", "222").unwrap();
        let result = ClobMarketGateway::new(
            market,
            Arc::new(MockExchange::new()),
            Arc::new(MockChain::new()),
            OWNER,
            CONTRACTS,
            None,
        );
        assert!(result.is_err());
    }
}
