//! Polygon RPC Provider - alloy-rs Connection Management
//!
//! Manages the connection to the Polygon PoS chain via alloy-rs.
//! Validates the chain id at startup and exposes a shared, wallet-enabled
//! provider for balance reads and approval transactions.
//!
//! `ProviderBuilder` returns a deeply nested filler type; it is stored as a
//! type-erased `DynProvider` to keep the adapter layer readable.

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result, bail};
use tracing::{info, instrument};

use crate::config::ApiConfig;

/// Shared Polygon RPC provider.
///
/// All chain adapters share a single provider instance so they share one
/// connection pool and one nonce manager.
#[derive(Clone)]
pub struct PolygonProvider {
    provider: DynProvider,
    /// Address transactions are signed with.
    signer: Address,
}

impl PolygonProvider {
    /// Connect to the configured RPC endpoint and validate the chain id.
    #[instrument(skip_all)]
    pub async fn connect(config: &ApiConfig, signer: PrivateKeySigner) -> Result<Self> {
        let url = config.rpc_url.parse().context("Invalid RPC URL")?;
        let address = signer.address();

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        if chain_id != config.chain_id {
            bail!(
                "RPC endpoint serves chain_id={chain_id}, expected {}",
                config.chain_id
            );
        }

        info!(chain_id, signer = %address, "Connected to Polygon RPC");

        Ok(Self {
            provider,
            signer: address,
        })
    }

    /// Shared handle to the type-erased provider.
    pub fn inner(&self) -> DynProvider {
        self.provider.clone()
    }

    pub const fn signer(&self) -> Address {
        self.signer
    }

    /// Check if the RPC connection is healthy via a lightweight call.
    pub async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}
