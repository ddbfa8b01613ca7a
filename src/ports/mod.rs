//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ExchangeApi`: CLOB listings, books, orders and mutations
//! - `ChainClient`: Token balances and allowances on Polygon
//! - `MarketGateway`: Per-market capability used by the order book manager
//! - `PriceFeed`: Fair price of a market

pub mod chain;
pub mod exchange;
pub mod gateway;
pub mod price_feed;

pub use chain::{AllowanceProvisioner, ChainClient};
pub use exchange::{ExchangeApi, OpenOrder};
pub use gateway::MarketGateway;
pub use price_feed::PriceFeed;
