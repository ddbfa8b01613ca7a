//! Market listing entries as published by the CLOB `/markets` endpoint.
//!
//! Every field the keeper does not strictly need is optional so one odd
//! entry cannot poison a whole page; whether an entry is usable is decided
//! later, per candidate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cursor value the CLOB returns after the last page.
pub const END_CURSOR: &str = "LTE=";

/// Cursor value that starts a listing scan from the first page.
pub const START_CURSOR: &str = "MA==";

/// One market entry from the listing (or from `/markets/{condition_id}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedMarket {
    pub condition_id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub enable_order_book: bool,
    #[serde(default)]
    pub neg_risk: bool,
    #[serde(default)]
    pub rewards: Option<ListedRewards>,
    #[serde(default)]
    pub tokens: Vec<ListedToken>,
}

/// Liquidity reward parameters attached to a market.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedRewards {
    #[serde(default)]
    pub rates: Option<Vec<RewardRate>>,
    #[serde(default)]
    pub min_size: Decimal,
    /// Maximum reward-eligible distance from mid, in cents.
    #[serde(default)]
    pub max_spread: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRate {
    #[serde(default)]
    pub asset_address: String,
    pub rewards_daily_rate: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedToken {
    pub token_id: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub price: Decimal,
}

/// One page of the paginated listing.
#[derive(Debug, Clone, Default)]
pub struct MarketsPage {
    pub markets: Vec<ListedMarket>,
    pub next_cursor: String,
}

impl MarketsPage {
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_empty() || self.next_cursor == END_CURSOR
    }
}

impl ListedMarket {
    /// Reward-eligible, order-book-enabled and not a neg-risk market.
    pub fn is_reward_eligible(&self) -> bool {
        self.enable_order_book
            && !self.neg_risk
            && self
                .rewards
                .as_ref()
                .is_some_and(|r| !r.min_size.is_zero())
    }
}
