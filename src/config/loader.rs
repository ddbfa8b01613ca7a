//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! reading secrets from the environment and providing clear error
//! messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use super::{AppConfig, GasStrategy, Secrets};

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    keeper = %config.keeper.name,
    markets = config.markets.condition_ids.len(),
    auto_select = config.markets.condition_ids.is_empty(),
    sync_interval_secs = config.keeper.sync_interval_secs,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  Ok(config)
}

/// Read the private key and CLOB API credentials from the environment.
pub fn load_secrets() -> Result<Secrets> {
  load_secrets_with(|name| std::env::var(name).ok())
}

/// Same as `load_secrets`, with an injectable variable lookup.
pub fn load_secrets_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Secrets> {
  let required = |name: &str| -> Result<String> {
    lookup(name)
      .filter(|v| !v.trim().is_empty())
      .with_context(|| format!("Environment variable {name} is not set"))
  };

  Ok(Secrets {
    private_key: required("PRIVATE_KEY")?,
    api_key: required("POLY_API_KEY")?,
    api_secret: required("POLY_API_SECRET")?,
    api_passphrase: required("POLY_PASSPHRASE")?,
  })
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  // Scheduling
  anyhow::ensure!(
    config.keeper.sync_interval_secs > 0,
    "keeper.sync_interval_secs must be positive"
  );
  anyhow::ensure!(
    config.keeper.shutdown_timeout_secs > 0,
    "keeper.shutdown_timeout_secs must be positive"
  );

  // Market selection
  if config.markets.condition_ids.is_empty() {
    anyhow::ensure!(
      config.markets.auto_select_count >= 1,
      "markets.auto_select_count must be at least 1 when no condition_ids are given"
    );
  }
  for (i, id) in config.markets.condition_ids.iter().enumerate() {
    anyhow::ensure!(!id.trim().is_empty(), "Market {i} has empty condition_id");
  }
  anyhow::ensure!(
    config.markets.ranking_concurrency >= 1,
    "markets.ranking_concurrency must be at least 1"
  );

  // Order book manager
  anyhow::ensure!(
    config.order_book.refresh_interval_secs > 0,
    "order_book.refresh_interval_secs must be positive"
  );
  anyhow::ensure!(
    config.order_book.max_workers >= 1,
    "order_book.max_workers must be at least 1"
  );
  anyhow::ensure!(
    config.order_book.operation_timeout_ms > 0,
    "order_book.operation_timeout_ms must be positive"
  );

  // Strategy
  let strategy = &config.strategy;
  anyhow::ensure!(
    strategy.spread > Decimal::ZERO && strategy.spread < dec!(0.5),
    "strategy.spread must be in (0, 0.5), got {}",
    strategy.spread
  );
  anyhow::ensure!(
    strategy.tick_size > Decimal::ZERO && strategy.tick_size < Decimal::ONE,
    "strategy.tick_size must be in (0, 1), got {}",
    strategy.tick_size
  );
  anyhow::ensure!(
    strategy.order_size > Decimal::ZERO,
    "strategy.order_size must be positive"
  );
  anyhow::ensure!(
    strategy.min_size >= Decimal::ZERO,
    "strategy.min_size must not be negative"
  );
  anyhow::ensure!(
    strategy.price_tolerance >= Decimal::ZERO && strategy.size_tolerance >= Decimal::ZERO,
    "strategy tolerances must not be negative"
  );

  // API
  anyhow::ensure!(!config.api.clob_url.is_empty(), "CLOB API URL must not be empty");
  anyhow::ensure!(!config.api.rpc_url.is_empty(), "RPC URL must not be empty");

  // Contracts
  config.contracts.collateral_address()?;
  config.contracts.conditional_address()?;
  config.contracts.exchange_address()?;

  // Gas
  if config.gas.strategy == GasStrategy::Station {
    anyhow::ensure!(
      config.gas.station_url.as_deref().is_some_and(|u| !u.is_empty()),
      "gas.station_url is required for the station gas strategy"
    );
  }

  // Rate limits
  anyhow::ensure!(
    config.rate_limits.max_orders_per_minute > 0,
    "rate_limits.max_orders_per_minute must be positive"
  );

  Ok(())
}
