//! Configuration Module - TOML-based Keeper Configuration
//!
//! Loads and validates configuration from `config.toml`. Secrets (private
//! key and CLOB API credentials) never live in the file; they are read
//! from the environment by `loader::load_secrets`.
//! Contract addresses are externalized here - nothing is hardcoded in the
//! domain layer.

pub mod loader;

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Top-level keeper configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the keeper begins operation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Keeper identity and scheduling.
  pub keeper: KeeperConfig,
  /// Which markets to quote.
  #[serde(default)]
  pub markets: MarketsConfig,
  /// Per-market order book manager settings.
  #[serde(default)]
  pub order_book: OrderBookConfig,
  /// Reference quoting policy parameters.
  pub strategy: StrategyConfig,
  /// Polymarket and RPC endpoints.
  pub api: ApiConfig,
  /// On-chain contract addresses.
  pub contracts: ContractsConfig,
  /// Signing wallet options.
  #[serde(default)]
  pub wallet: WalletConfig,
  /// Gas price strategy.
  #[serde(default)]
  pub gas: GasConfig,
  /// Rate limiting configuration.
  #[serde(default)]
  pub rate_limits: RateLimitConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Keeper identity and lifecycle timing.
#[derive(Debug, Clone, Deserialize)]
pub struct KeeperConfig {
  /// Human-readable keeper name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Seconds between reconciliation cycles.
  #[serde(default = "default_sync_interval")]
  pub sync_interval_secs: u64,
  /// Upper bound on the shutdown cancel-all.
  #[serde(default = "default_shutdown_timeout")]
  pub shutdown_timeout_secs: u64,
  /// How long startup waits for the first book snapshots.
  #[serde(default = "default_warmup")]
  pub warmup_secs: u64,
}

impl KeeperConfig {
  pub const fn sync_interval(&self) -> Duration {
    Duration::from_secs(self.sync_interval_secs)
  }

  pub const fn shutdown_timeout(&self) -> Duration {
    Duration::from_secs(self.shutdown_timeout_secs)
  }

  pub const fn warmup(&self) -> Duration {
    Duration::from_secs(self.warmup_secs)
  }
}

/// Market selection.
///
/// An empty `condition_ids` list means the markets are picked by the
/// reward ranker at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketsConfig {
  #[serde(default)]
  pub condition_ids: Vec<String>,
  /// Number of top-ranked markets to quote when auto-selecting.
  #[serde(default = "default_auto_select")]
  pub auto_select_count: usize,
  /// Stop paging the listing once this many eligible entries are collected.
  #[serde(default = "default_max_candidates")]
  pub max_candidates: usize,
  /// Concurrent book fetches while ranking.
  #[serde(default = "default_ranking_concurrency")]
  pub ranking_concurrency: usize,
}

impl Default for MarketsConfig {
  fn default() -> Self {
    Self {
      condition_ids: Vec::new(),
      auto_select_count: default_auto_select(),
      max_candidates: default_max_candidates(),
      ranking_concurrency: default_ranking_concurrency(),
    }
  }
}

/// Order book manager settings, applied to every market.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderBookConfig {
  /// Seconds between background refreshes.
  #[serde(default = "default_refresh_interval")]
  pub refresh_interval_secs: u64,
  /// Width of the worker pool for place/cancel calls.
  #[serde(default = "default_max_workers")]
  pub max_workers: usize,
  /// Timeout for each gateway call.
  #[serde(default = "default_operation_timeout")]
  pub operation_timeout_ms: u64,
}

impl Default for OrderBookConfig {
  fn default() -> Self {
    Self {
      refresh_interval_secs: default_refresh_interval(),
      max_workers: default_max_workers(),
      operation_timeout_ms: default_operation_timeout(),
    }
  }
}

impl OrderBookConfig {
  pub const fn refresh_interval(&self) -> Duration {
    Duration::from_secs(self.refresh_interval_secs)
  }

  pub const fn operation_timeout(&self) -> Duration {
    Duration::from_millis(self.operation_timeout_ms)
  }
}

/// Symmetric spread policy and reconciliation tolerances.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
  /// Distance from fair price to each quote.
  pub spread: Decimal,
  /// Maximum size of each quote.
  pub order_size: Decimal,
  /// Quotes below this size are not placed.
  #[serde(default = "default_min_size")]
  pub min_size: Decimal,
  #[serde(default = "default_tick_size")]
  pub tick_size: Decimal,
  /// Absolute price drift tolerated before a quote is replaced.
  #[serde(default)]
  pub price_tolerance: Decimal,
  /// Relative size drift tolerated before a quote is replaced.
  #[serde(default = "default_size_tolerance")]
  pub size_tolerance: Decimal,
}

/// API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// CLOB REST API base URL.
  pub clob_url: String,
  /// Polygon RPC endpoint.
  pub rpc_url: String,
  /// Expected chain id of the RPC endpoint.
  #[serde(default = "default_chain_id")]
  pub chain_id: u64,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
}

/// Contract addresses, as hex strings.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
  /// Collateral ERC-20 (USDC).
  pub collateral: String,
  /// Conditional tokens ERC-1155.
  pub conditional: String,
  /// CLOB exchange (approval spender).
  pub exchange: String,
}

impl ContractsConfig {
  pub fn collateral_address(&self) -> anyhow::Result<Address> {
    parse_address("collateral", &self.collateral)
  }

  pub fn conditional_address(&self) -> anyhow::Result<Address> {
    parse_address("conditional", &self.conditional)
  }

  pub fn exchange_address(&self) -> anyhow::Result<Address> {
    parse_address("exchange", &self.exchange)
  }
}

fn parse_address(name: &str, value: &str) -> anyhow::Result<Address> {
  Address::from_str(value).with_context(|| format!("invalid {name} contract address: {value}"))
}

/// Wallet options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
  /// Address whose balances and orders are tracked, when it differs from
  /// the signer (e.g. a proxy wallet).
  #[serde(default)]
  pub address_override: Option<String>,
}

/// How the gas price for approval transactions is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasStrategy {
  Fixed,
  #[default]
  Web3,
  Station,
}

/// Gas price configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
  #[serde(default)]
  pub strategy: GasStrategy,
  /// Price used by the `fixed` strategy.
  #[serde(default = "default_fixed_gas_price")]
  pub fixed_gas_price_gwei: u64,
  /// Gas station endpoint used by the `station` strategy.
  #[serde(default)]
  pub station_url: Option<String>,
}

impl Default for GasConfig {
  fn default() -> Self {
    Self {
      strategy: GasStrategy::default(),
      fixed_gas_price_gwei: default_fixed_gas_price(),
      station_url: None,
    }
  }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
  /// Maximum place/cancel calls per minute.
  #[serde(default = "default_max_orders")]
  pub max_orders_per_minute: u32,
  /// Base delay for GET retries (milliseconds).
  #[serde(default = "default_min_interval")]
  pub min_interval_ms: u64,
}

impl Default for RateLimitConfig {
  fn default() -> Self {
    Self {
      max_orders_per_minute: default_max_orders(),
      min_interval_ms: default_min_interval(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Serve `/metrics`, `/live` and `/ready`.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
    }
  }
}

/// Credentials read from the environment.
#[derive(Clone)]
pub struct Secrets {
  pub private_key: String,
  pub api_key: String,
  pub api_secret: String,
  pub api_passphrase: String,
}

impl std::fmt::Debug for Secrets {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Secrets")
      .field("api_key", &self.api_key)
      .finish_non_exhaustive()
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

const fn default_sync_interval() -> u64 {
  30
}

const fn default_shutdown_timeout() -> u64 {
  10
}

const fn default_warmup() -> u64 {
  5
}

const fn default_auto_select() -> usize {
  1
}

const fn default_max_candidates() -> usize {
  150
}

const fn default_ranking_concurrency() -> usize {
  8
}

const fn default_refresh_interval() -> u64 {
  5
}

const fn default_max_workers() -> usize {
  1
}

const fn default_operation_timeout() -> u64 {
  10_000
}

fn default_min_size() -> Decimal {
  dec!(5)
}

fn default_tick_size() -> Decimal {
  dec!(0.01)
}

fn default_size_tolerance() -> Decimal {
  dec!(0.1)
}

const fn default_chain_id() -> u64 {
  137
}

const fn default_timeout() -> u64 {
  30
}

const fn default_fixed_gas_price() -> u64 {
  100
}

const fn default_max_orders() -> u32 {
  50
}

const fn default_min_interval() -> u64 {
  100
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9008".to_string()
}
