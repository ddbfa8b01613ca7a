//! Domain layer - Core keeper models and pure logic.
//!
//! Markets, orders, balances, order books, reward scoring, reconciliation
//! and quoting policies. Nothing in here performs I/O; every function is
//! testable in isolation.

pub mod balances;
pub mod book;
pub mod listing;
pub mod market;
pub mod order;
pub mod policy;
pub mod reconcile;
pub mod reward;

// Re-export core types for convenience
pub use balances::BalanceSnapshot;
pub use book::{BookLevel, OrderBook};
pub use listing::{ListedMarket, MarketsPage};
pub use market::{ConditionId, Market, Outcome, TokenId};
pub use order::{Order, OrderId, OrderKey, QuoteSlot, Side, TargetQuote};
pub use policy::{QuoteContext, QuotePolicy, SpreadParams, SymmetricSpreadPolicy};
pub use reconcile::{Reconciliation, Tolerance, reconcile};
pub use reward::{CandidateError, CandidateMarketScore, RewardCandidate};
