//! Metrics and Monitoring Adapters
//!
//! Prometheus metrics export plus liveness/readiness probes, served by a
//! single axum server on `[metrics].bind_address`.

pub mod health;
pub mod prometheus;

pub use health::MetricsServer;
pub use prometheus::KeeperMetrics;
