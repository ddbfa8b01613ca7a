//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the keeper's workflows.
//!
//! Use cases:
//! - `OrderBookManager`: Per-market order/balance cache and worker pool
//! - `StrategyManager`: Per-market reconciliation cycle
//! - `Lifecycle`: Startup, periodic ticks, bounded shutdown
//! - `RewardRanker`: Market selection by reward yield
//! - `MarketMakerKeeper`: Lifecycle hooks over all quoted markets

pub mod keeper;
pub mod lifecycle;
pub mod market_context;
pub mod order_book_manager;
pub mod reward_ranker;
pub mod strategy_manager;

pub use keeper::MarketMakerKeeper;
pub use lifecycle::{Keeper, Lifecycle, LifecycleState};
pub use market_context::MarketContext;
pub use order_book_manager::{
  BookSnapshot, CancelAllReport, OperationOutcome, OrderBookManager, PendingHandle, WorkingView,
};
pub use reward_ranker::RewardRanker;
pub use strategy_manager::{StrategyManager, SyncReport};
