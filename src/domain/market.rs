//! Binary market definitions.
//!
//! A `Market` pins a condition id to its collateral and its two outcome
//! tokens for the whole run. Everything downstream refers to tokens by
//! `Outcome` and resolves the exchange token id through the market.

use serde::{Deserialize, Serialize};

/// Lightweight token identifier used at the ports boundary.
pub type TokenId = String;

/// Lightweight market / condition identifier used at the ports boundary.
pub type ConditionId = String;

/// One of the two complementary outcome tokens of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    A,
    B,
}

impl Outcome {
    /// The complementary outcome.
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// A binary prediction market quoted by the keeper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    condition_id: ConditionId,
    collateral_address: String,
    token_a: TokenId,
    token_b: TokenId,
}

impl Market {
    /// Build a market from its condition id, collateral and the two token ids.
    ///
    /// # Errors
    /// Fails if either token id is empty or both ids are identical.
    pub fn new(
        condition_id: impl Into<ConditionId>,
        collateral_address: impl Into<String>,
        token_a: impl Into<TokenId>,
        token_b: impl Into<TokenId>,
    ) -> anyhow::Result<Self> {
        let token_a = token_a.into();
        let token_b = token_b.into();
        anyhow::ensure!(
            !token_a.is_empty() && !token_b.is_empty(),
            "market outcome token ids must not be empty"
        );
        anyhow::ensure!(token_a != token_b, "market outcome tokens must differ");

        Ok(Self {
            condition_id: condition_id.into(),
            collateral_address: collateral_address.into(),
            token_a,
            token_b,
        })
    }

    pub fn condition_id(&self) -> &str {
        &self.condition_id
    }

    pub fn collateral_address(&self) -> &str {
        &self.collateral_address
    }

    /// Exchange token id for an outcome.
    pub fn token_id(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::A => &self.token_a,
            Outcome::B => &self.token_b,
        }
    }

    /// Resolve an exchange token id back to its outcome.
    ///
    /// Returns `None` for tokens that do not belong to this market.
    pub fn outcome_of(&self, token_id: &str) -> Option<Outcome> {
        if token_id == self.token_a {
            Some(Outcome::A)
        } else if token_id == self.token_b {
            Some(Outcome::B)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.condition_id)
    }
}
