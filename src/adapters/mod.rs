//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, blockchain RPC, metrics server).
//! Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `api`: Polymarket CLOB REST API client, auth and order signing
//! - `chain`: Polygon blockchain interaction via alloy-rs
//! - `feeds`: Fair price sources
//! - `gateway`: Per-market binding of exchange and chain access
//! - `metrics`: Prometheus metrics export and health checks

pub mod api;
pub mod chain;
pub mod feeds;
pub mod gateway;
pub mod metrics;
