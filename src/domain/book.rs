//! Public order book snapshot for a single outcome token.
//!
//! The CLOB `/book` endpoint lists bids by ascending price and asks by
//! descending price, so the best level of each side is the *last* entry.
//! Nothing here relies on that: best bid/ask are taken as the max/min over
//! all levels, which agrees with "last element" for that layout and stays
//! correct if the ordering ever changes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One aggregated price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub size: Decimal,
}

impl BookLevel {
    pub const fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }

    /// Resting value of the level in collateral units.
    pub fn notional(&self) -> Decimal {
        self.price * self.size
    }
}

/// Bid and ask levels for one token, in whatever order the exchange sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub bids: Vec<BookLevel>,
    #[serde(default)]
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub const fn new(bids: Vec<BookLevel>, asks: Vec<BookLevel>) -> Self {
        Self { bids, asks }
    }

    /// Highest resting bid price.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.iter().map(|l| l.price).max()
    }

    /// Lowest resting ask price.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.iter().map(|l| l.price).min()
    }

    /// Midpoint of the best bid and ask, if both sides are populated.
    pub fn midpoint(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }
}
