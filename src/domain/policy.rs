//! Quoting policies: turn a fair price and balances into target quotes.
//!
//! The reconciliation machinery does not care how targets are sized; any
//! `QuotePolicy` can be plugged into the strategy manager.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::balances::BalanceSnapshot;
use super::market::{Market, Outcome};
use super::order::{Side, TargetQuote};

/// Inputs available to a policy for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct QuoteContext<'a> {
    pub market: &'a Market,
    /// Fair price of outcome A.
    pub fair_price: Decimal,
    pub balances: &'a BalanceSnapshot,
}

/// Computes the quotes that should be resting this cycle.
pub trait QuotePolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn target_quotes(&self, ctx: &QuoteContext<'_>) -> Vec<TargetQuote>;
}

/// Parameters of the symmetric spread policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadParams {
    /// Distance from fair to each side, in price units.
    pub spread: Decimal,
    /// Maximum size of each quote.
    pub order_size: Decimal,
    /// Quotes smaller than this are not sent.
    pub min_size: Decimal,
    pub tick_size: Decimal,
}

/// Quotes a bid and an ask around fair on both outcome tokens.
///
/// Buying B at `1 - ask` is economically the same as selling A at `ask`, so
/// the policy rests both legs and lets whichever inventory exists back the
/// sell side.
#[derive(Debug, Clone)]
pub struct SymmetricSpreadPolicy {
    params: SpreadParams,
}

impl SymmetricSpreadPolicy {
    pub const fn new(params: SpreadParams) -> Self {
        Self { params }
    }

    fn floor_tick(&self, price: Decimal) -> Decimal {
        (price / self.params.tick_size).floor() * self.params.tick_size
    }

    fn ceil_tick(&self, price: Decimal) -> Decimal {
        (price / self.params.tick_size).ceil() * self.params.tick_size
    }

    fn clamp(&self, price: Decimal) -> Decimal {
        price.clamp(self.params.tick_size, Decimal::ONE - self.params.tick_size)
    }

    fn truncate(size: Decimal) -> Decimal {
        size.round_dp_with_strategy(2, RoundingStrategy::ToZero)
    }

    fn buy_size(&self, price: Decimal, collateral: Decimal) -> Decimal {
        // each BUY leg may use half the collateral
        let affordable = (collateral / dec!(2)) / price;
        Self::truncate(self.params.order_size.min(affordable))
    }

    fn sell_size(&self, held: Decimal) -> Decimal {
        Self::truncate(self.params.order_size.min(held))
    }
}

impl QuotePolicy for SymmetricSpreadPolicy {
    fn name(&self) -> &'static str {
        "symmetric_spread"
    }

    fn target_quotes(&self, ctx: &QuoteContext<'_>) -> Vec<TargetQuote> {
        let bid = self.clamp(self.floor_tick(ctx.fair_price - self.params.spread));
        let ask = self.clamp(self.ceil_tick(ctx.fair_price + self.params.spread));
        let complement_bid = Decimal::ONE - ask;
        let complement_ask = Decimal::ONE - bid;
        let balances = ctx.balances;

        let quotes = [
            TargetQuote::new(
                Side::Buy,
                Outcome::A,
                bid,
                self.buy_size(bid, balances.collateral),
            ),
            TargetQuote::new(
                Side::Buy,
                Outcome::B,
                complement_bid,
                self.buy_size(complement_bid, balances.collateral),
            ),
            TargetQuote::new(
                Side::Sell,
                Outcome::A,
                ask,
                self.sell_size(balances.token(Outcome::A)),
            ),
            TargetQuote::new(
                Side::Sell,
                Outcome::B,
                complement_ask,
                self.sell_size(balances.token(Outcome::B)),
            ),
        ];

        quotes
            .into_iter()
            .filter(|q| q.size > Decimal::ZERO && q.size >= self.params.min_size)
            .collect()
    }
}
