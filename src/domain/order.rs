//! Orders, target quotes and the keys used to deduplicate them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::market::Outcome;

/// Lightweight order identifier used at the ports boundary.
pub type OrderId = String;

/// Order side on the CLOB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            other => anyhow::bail!("unknown order side: {other}"),
        }
    }
}

/// A (side, outcome) pair. Cancels in a slot are sequenced before
/// placements in the same slot because they share the same capital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuoteSlot {
    pub side: Side,
    pub outcome: Outcome,
}

/// Identity of a resting price level: at most one placement per key may be
/// in flight at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderKey {
    pub side: Side,
    pub outcome: Outcome,
    price: Decimal,
}

impl OrderKey {
    pub fn new(side: Side, outcome: Outcome, price: Decimal) -> Self {
        // 0.50 and 0.5 must collide
        Self {
            side,
            outcome,
            price: price.normalize(),
        }
    }
}

/// An order believed to be open on the exchange, or a quote that is on its
/// way there (`id == None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<OrderId>,
    pub side: Side,
    pub outcome: Outcome,
    pub price: Decimal,
    pub size: Decimal,
}

impl Order {
    pub const fn slot(&self) -> QuoteSlot {
        QuoteSlot {
            side: self.side,
            outcome: self.outcome,
        }
    }
}

/// A quote the strategy wants resting on the book this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetQuote {
    pub side: Side,
    pub outcome: Outcome,
    pub price: Decimal,
    pub size: Decimal,
}

impl TargetQuote {
    pub const fn new(side: Side, outcome: Outcome, price: Decimal, size: Decimal) -> Self {
        Self {
            side,
            outcome,
            price,
            size,
        }
    }

    pub fn key(&self) -> OrderKey {
        OrderKey::new(self.side, self.outcome, self.price)
    }

    pub const fn slot(&self) -> QuoteSlot {
        QuoteSlot {
            side: self.side,
            outcome: self.outcome,
        }
    }

    /// The order this quote becomes once the exchange assigns an id.
    pub fn into_order(self, id: Option<OrderId>) -> Order {
        Order {
            id,
            side: self.side,
            outcome: self.outcome,
            price: self.price,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_key_ignores_price_scale() {
        let a = OrderKey::new(Side::Buy, Outcome::A, dec!(0.50));
        let b = OrderKey::new(Side::Buy, Outcome::A, dec!(0.5));
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_side_parse_and_display() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!("SELL".parse::<Side>().unwrap(), Side::Sell);
        assert!("hold".parse::<Side>().is_err());
        assert_eq!(Side::Buy.to_string(), "BUY");
    }
}
