//! Wallet balances for one market, always read as a unit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::market::Outcome;

/// Collateral, both outcome tokens and native gas, captured at one refresh.
///
/// Never mutated in place: the refresh task builds a new snapshot and
/// replaces the old one wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub collateral: Decimal,
    pub token_a: Decimal,
    pub token_b: Decimal,
    pub gas: Decimal,
}

impl BalanceSnapshot {
    /// Build a snapshot, clamping negative readings to zero.
    pub fn new(collateral: Decimal, token_a: Decimal, token_b: Decimal, gas: Decimal) -> Self {
        Self {
            collateral: collateral.max(Decimal::ZERO),
            token_a: token_a.max(Decimal::ZERO),
            token_b: token_b.max(Decimal::ZERO),
            gas: gas.max(Decimal::ZERO),
        }
    }

    pub const fn token(&self, outcome: Outcome) -> Decimal {
        match outcome {
            Outcome::A => self.token_a,
            Outcome::B => self.token_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_negative_readings_clamped() {
        let b = BalanceSnapshot::new(dec!(-1), dec!(2), dec!(3), dec!(0.5));
        assert_eq!(b.collateral, Decimal::ZERO);
        assert_eq!(b.token(Outcome::A), dec!(2));
        assert_eq!(b.token(Outcome::B), dec!(3));
    }
}
