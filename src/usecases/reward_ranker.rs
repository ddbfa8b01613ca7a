//! Reward Ranker Use Case - Market Selection by Reward Yield
//!
//! Pages through the exchange's market listing, keeps reward-eligible
//! entries, fetches each candidate's reference order book with bounded
//! concurrency and ranks candidates by reward-per-dollar. A candidate
//! that cannot be parsed or scored is logged and dropped; it never fails
//! the ranking.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::config::MarketsConfig;
use crate::domain::listing::START_CURSOR;
use crate::domain::reward::{self, CandidateError, CandidateMarketScore, RewardCandidate};
use crate::domain::{ConditionId, ListedMarket};
use crate::ports::ExchangeApi;

/// Ranks candidate markets by expected reward yield.
pub struct RewardRanker<X: ExchangeApi> {
  exchange: Arc<X>,
  max_candidates: usize,
  concurrency: usize,
}

impl<X: ExchangeApi> RewardRanker<X> {
  pub fn new(exchange: Arc<X>, config: &MarketsConfig) -> Self {
    Self {
      exchange,
      max_candidates: config.max_candidates,
      concurrency: config.ranking_concurrency.max(1),
    }
  }

  /// Page through the listing until the end cursor, or until at least
  /// `max_candidates` eligible entries have been collected.
  #[instrument(skip(self))]
  pub async fn collect_candidates(&self) -> Result<Vec<ListedMarket>> {
    let mut cursor = START_CURSOR.to_string();
    let mut eligible = Vec::new();
    let mut pages = 0usize;

    loop {
      let page = self
        .exchange
        .get_markets(&cursor)
        .await
        .with_context(|| format!("Failed to fetch market listing page at cursor {cursor}"))?;
      pages += 1;

      let last = page.is_last();
      eligible.extend(page.markets.into_iter().filter(ListedMarket::is_reward_eligible));

      if last || eligible.len() >= self.max_candidates {
        break;
      }
      cursor = page.next_cursor;
    }

    debug!(pages, eligible = eligible.len(), "Listing scan finished");
    Ok(eligible)
  }

  /// Score one listing entry against its live order book.
  pub async fn score_candidate(
    &self,
    listing: &ListedMarket,
  ) -> Result<CandidateMarketScore, CandidateError> {
    let candidate = RewardCandidate::try_from(listing)?;
    let book = self
      .exchange
      .get_order_book(&candidate.token_id)
      .await
      .map_err(|e| CandidateError::BookUnavailable(format!("{e:#}")))?;
    let score = reward::score(&candidate, &book)?;
    Ok(CandidateMarketScore::new(candidate, score))
  }

  /// Score every eligible candidate, best first.
  ///
  /// Equal scores keep listing order.
  #[instrument(skip(self))]
  pub async fn rank(&self) -> Result<Vec<CandidateMarketScore>> {
    let listings = self.collect_candidates().await?;
    let total = listings.len();

    let mut results: Vec<(usize, ConditionId, Result<CandidateMarketScore, CandidateError>)> =
      stream::iter(listings.into_iter().enumerate())
        .map(|(i, listing)| async move {
          let result = self.score_candidate(&listing).await;
          (i, listing.condition_id, result)
        })
        .buffer_unordered(self.concurrency)
        .collect()
        .await;
    results.sort_by_key(|(i, _, _)| *i);

    let mut scored = Vec::with_capacity(results.len());
    for (_, condition_id, result) in results {
      match result {
        Ok(score) => scored.push(score),
        Err(e) => warn!(condition_id = %condition_id, error = %e, "Dropping candidate"),
      }
    }
    reward::sort_by_score(&mut scored);

    info!(candidates = total, scored = scored.len(), "Ranking complete");
    Ok(scored)
  }
}

/// Condition ids of the `count` best candidates.
pub fn select_top(ranked: &[CandidateMarketScore], count: usize) -> Vec<ConditionId> {
  if ranked.len() < count {
    warn!(requested = count, available = ranked.len(), "Fewer ranked markets than requested");
  }
  ranked
    .iter()
    .take(count)
    .map(|c| {
      info!(condition_id = %c.condition_id, question = %c.question, reward_per_dollar = %c.reward_per_dollar, "Selected market");
      c.condition_id.clone()
    })
    .collect()
}
