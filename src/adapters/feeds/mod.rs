//! Market Data Feed Adapters - Fair Price Sources
//!
//! - `ClobPriceFeed`: midpoint of the outcome A order book on the CLOB

pub mod clob_price;

pub use clob_price::ClobPriceFeed;
