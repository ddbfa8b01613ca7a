//! Gas Station - Gas Price Selection for Approval Transactions
//!
//! Three strategies, chosen in `config.toml`:
//! - `fixed`: a constant price in gwei
//! - `web3`: whatever the RPC node suggests (`eth_gasPrice`)
//! - `station`: the `fast.maxFee` of a Polygon gas station endpoint

use std::time::Duration;

use alloy::providers::Provider;
use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::{GasConfig, GasStrategy};

use super::provider::PolygonProvider;

const WEI_PER_GWEI: u128 = 1_000_000_000;

#[derive(Debug, Deserialize)]
struct StationResponse {
    fast: StationTier,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationTier {
    /// Gwei, fractional.
    max_fee: Decimal,
}

enum Source {
    Fixed(u128),
    Web3,
    Station { http: reqwest::Client, url: String },
}

/// Chooses the gas price for keeper transactions.
pub struct GasStation {
    provider: PolygonProvider,
    source: Source,
}

impl GasStation {
    pub fn new(provider: PolygonProvider, config: &GasConfig) -> Result<Self> {
        let source = match config.strategy {
            GasStrategy::Fixed => Source::Fixed(u128::from(config.fixed_gas_price_gwei) * WEI_PER_GWEI),
            GasStrategy::Web3 => Source::Web3,
            GasStrategy::Station => {
                let url = config
                    .station_url
                    .clone()
                    .context("gas.station_url is required for the station strategy")?;
                let http = reqwest::Client::builder()
                    .timeout(Duration::from_secs(10))
                    .build()
                    .context("Failed to build gas station HTTP client")?;
                Source::Station { http, url }
            }
        };
        Ok(Self { provider, source })
    }

    /// Gas price in wei.
    #[instrument(skip(self))]
    pub async fn gas_price(&self) -> Result<u128> {
        let wei = match &self.source {
            Source::Fixed(wei) => *wei,
            Source::Web3 => self
                .provider
                .inner()
                .get_gas_price()
                .await
                .context("Failed to query gas price")?,
            Source::Station { http, url } => {
                let response: StationResponse = http
                    .get(url)
                    .send()
                    .await
                    .context("Gas station request failed")?
                    .error_for_status()
                    .context("Gas station returned an error")?
                    .json()
                    .await
                    .context("Unexpected gas station response")?;
                gwei_to_wei(response.fast.max_fee)?
            }
        };

        debug!(gas_price_wei = wei, "Gas price selected");
        Ok(wei)
    }
}

fn gwei_to_wei(gwei: Decimal) -> Result<u128> {
    if gwei.is_sign_negative() {
        bail!("negative gas price: {gwei}");
    }
    (gwei * Decimal::from(WEI_PER_GWEI as u64))
        .trunc()
        .to_u128()
        .with_context(|| format!("gas price out of range: {gwei}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_gwei_to_wei() {
        assert_eq!(gwei_to_wei(dec!(30)).unwrap(), 30_000_000_000);
        assert_eq!(gwei_to_wei(dec!(31.5)).unwrap(), 31_500_000_000);
        assert!(gwei_to_wei(dec!(-1)).is_err());
    }

    #[test]
    fn test_station_response_shape() {
        let json = r#"{
            "safeLow": {"maxPriorityFee": 30, "maxFee": 31.2},
            "standard": {"maxPriorityFee": 32, "maxFee": 33.1},
            "fast": {"maxPriorityFee": 40.5, "maxFee": 41.75},
            "estimatedBaseFee": 1.2,
            "blockNumber": 1
        }"#;
        let response: StationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(gwei_to_wei(response.fast.max_fee).unwrap(), 41_750_000_000);
    }
}
