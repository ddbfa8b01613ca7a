//! Polymarket CLOB API Adapter
//!
//! HTTP access to the Polymarket Central Limit Order Book (CLOB) REST API:
//! listings, order books, open orders, order placement and cancellation.
//!
//! Sub-modules:
//! - `auth`: L2 HMAC request signing
//! - `client`: HTTP client with retries and a mutation rate limiter
//! - `exchange`: `ExchangeApi` implementation
//! - `signing`: EIP-712 order signatures
//! - `types`: API request/response type definitions

pub mod auth;
pub mod client;
pub mod exchange;
pub mod signing;
pub mod types;

pub use auth::ClobAuth;
pub use client::{ApiError, ClobClient, ClobClientConfig};
pub use exchange::ClobExchange;
pub use signing::OrderSigner;
