//! Reward-per-dollar scoring for candidate markets.
//!
//! A market pays a fixed daily reward to makers resting inside a band around
//! mid. The score approximates how much of that reward one dollar of quotes
//! would earn given the capital already competing in the band, then zeroes
//! out markets that are too wide or too close to resolution and discounts
//! small reward budgets.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;

use super::book::OrderBook;
use super::listing::ListedMarket;
use super::order::Side;

/// Token prices strictly below this are treated as near-resolved.
pub const MIN_TOKEN_PRICE: Decimal = dec!(0.10);
/// Token prices strictly above this are treated as near-resolved.
pub const MAX_TOKEN_PRICE: Decimal = dec!(0.90);
/// Books wider than this multiple of the reward spread are not quotable.
pub const SPREAD_EXCLUSION_FACTOR: Decimal = dec!(1.5);
/// Daily rates below this are divided by 10.
pub const SMALL_BUDGET_RATE: Decimal = dec!(50);
/// Daily rates below this (and at least `SMALL_BUDGET_RATE`) are halved.
pub const MEDIUM_BUDGET_RATE: Decimal = dec!(100);

/// Why a candidate could not be scored.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CandidateError {
    #[error("market has no reward configuration")]
    MissingRewards,
    #[error("market has no daily reward rate")]
    MissingRate,
    #[error("market lists no outcome tokens")]
    MissingToken,
    #[error("unparsable listing entry: {0}")]
    Malformed(String),
    #[error("order book has no {0} levels")]
    EmptyBookSide(Side),
    #[error("order book unavailable: {0}")]
    BookUnavailable(String),
}

/// Reward parameters of one market, normalized to price units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardCandidate {
    pub question: String,
    pub condition_id: String,
    pub daily_reward_rate: Decimal,
    /// Reward-eligible distance from mid in price units (listing cents / 100).
    pub max_spread: Decimal,
    /// Reference token (first listed outcome).
    pub token_id: String,
    pub token_price: Decimal,
}

impl TryFrom<&ListedMarket> for RewardCandidate {
    type Error = CandidateError;

    fn try_from(market: &ListedMarket) -> Result<Self, Self::Error> {
        let rewards = market.rewards.as_ref().ok_or(CandidateError::MissingRewards)?;
        let rate = rewards
            .rates
            .as_ref()
            .and_then(|rates| rates.first())
            .ok_or(CandidateError::MissingRate)?;
        let token = market.tokens.first().ok_or(CandidateError::MissingToken)?;

        Ok(Self {
            question: market.question.clone(),
            condition_id: market.condition_id.clone(),
            daily_reward_rate: rate.rewards_daily_rate,
            max_spread: rewards.max_spread / dec!(100),
            token_id: token.token_id.clone(),
            token_price: token.price,
        })
    }
}

/// A scored candidate, produced once per ranking pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateMarketScore {
    pub question: String,
    pub condition_id: String,
    pub daily_reward_rate: Decimal,
    pub max_spread: Decimal,
    pub token_id: String,
    pub token_price: Decimal,
    pub reward_per_dollar: Decimal,
}

impl CandidateMarketScore {
    pub fn new(candidate: RewardCandidate, reward_per_dollar: Decimal) -> Self {
        Self {
            question: candidate.question,
            condition_id: candidate.condition_id,
            daily_reward_rate: candidate.daily_reward_rate,
            max_spread: candidate.max_spread,
            token_id: candidate.token_id,
            token_price: candidate.token_price,
            reward_per_dollar,
        }
    }
}

/// Resting value competing for the same reward band.
///
/// Bids priced at or above `price - max_spread` plus asks priced at or
/// below `price + max_spread`.
pub fn in_band_liquidity(candidate: &RewardCandidate, book: &OrderBook) -> Decimal {
    let floor = candidate.token_price - candidate.max_spread;
    let ceiling = candidate.token_price + candidate.max_spread;

    let bids: Decimal = book
        .bids
        .iter()
        .filter(|l| l.price >= floor)
        .map(|l| l.notional())
        .sum();
    let asks: Decimal = book
        .asks
        .iter()
        .filter(|l| l.price <= ceiling)
        .map(|l| l.notional())
        .sum();

    bids + asks
}

/// Divisor applied to a score by reward budget tier.
pub fn budget_divisor(daily_reward_rate: Decimal) -> Decimal {
    if daily_reward_rate < SMALL_BUDGET_RATE {
        dec!(10)
    } else if daily_reward_rate < MEDIUM_BUDGET_RATE {
        dec!(2)
    } else {
        Decimal::ONE
    }
}

/// True when the token price is outside `[0.10, 0.90]`.
pub fn is_near_resolved(token_price: Decimal) -> bool {
    token_price < MIN_TOKEN_PRICE || token_price > MAX_TOKEN_PRICE
}

/// True when `best_ask - best_bid` exceeds 1.5 × the reward spread.
pub fn is_too_wide(best_bid: Decimal, best_ask: Decimal, max_spread: Decimal) -> bool {
    best_ask - best_bid > max_spread * SPREAD_EXCLUSION_FACTOR
}

/// Reward-per-dollar score of a candidate against its live book.
///
/// An empty band scores zero rather than infinity: an empty book is as
/// likely to mean "nobody can fill here" as "free rewards".
///
/// # Errors
/// `EmptyBookSide` when either side of the book has no levels, since the
/// spread check cannot be evaluated.
pub fn score(candidate: &RewardCandidate, book: &OrderBook) -> Result<Decimal, CandidateError> {
    let liquidity = in_band_liquidity(candidate, book);
    let mut score = if liquidity.is_zero() {
        Decimal::ZERO
    } else {
        candidate.daily_reward_rate / liquidity
    };

    let best_bid = book.best_bid().ok_or(CandidateError::EmptyBookSide(Side::Buy))?;
    let best_ask = book.best_ask().ok_or(CandidateError::EmptyBookSide(Side::Sell))?;

    if is_too_wide(best_bid, best_ask, candidate.max_spread) {
        score = Decimal::ZERO;
    }
    if is_near_resolved(candidate.token_price) {
        score = Decimal::ZERO;
    }

    Ok(score / budget_divisor(candidate.daily_reward_rate))
}

/// Sort scored candidates by descending reward-per-dollar.
///
/// Stable, so equal scores keep listing order.
pub fn sort_by_score(scores: &mut [CandidateMarketScore]) {
    scores.sort_by(|a, b| b.reward_per_dollar.cmp(&a.reward_per_dollar));
}
