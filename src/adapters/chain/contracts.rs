//! Token Contract Interactions - Collateral (ERC-20) and Conditional (ERC-1155)
//!
//! Implements the `ChainClient` port: balance reads, native gas balance and
//! idempotent approvals. Approval transactions are priced by the
//! `GasStation` and awaited until mined.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::sol;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::ports::ChainClient;

use super::gas::GasStation;
use super::provider::PolygonProvider;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[sol(rpc)]
    interface IERC1155 {
        function balanceOf(address owner, uint256 id) external view returns (uint256);
        function isApprovedForAll(address owner, address operator) external view returns (bool);
        function setApprovalForAll(address operator, bool approved) external;
    }
}

/// Collateral and conditional tokens both use 6 decimals.
pub const TOKEN_DECIMALS: u32 = 6;

/// Native token (POL) decimals.
pub const GAS_DECIMALS: u32 = 18;

/// On-chain token access via alloy-rs.
pub struct Contracts {
    provider: PolygonProvider,
    gas: Arc<GasStation>,
}

impl Contracts {
    pub fn new(provider: PolygonProvider, gas: Arc<GasStation>) -> Self {
        Self { provider, gas }
    }

    fn ensure_signer(&self, owner: Address) -> Result<()> {
        if owner != self.provider.signer() {
            bail!(
                "cannot approve on behalf of {owner}: transactions are signed by {}",
                self.provider.signer()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for Contracts {
    #[instrument(skip(self))]
    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<Decimal> {
        let balance = IERC20::new(token, self.provider.inner())
            .balanceOf(owner)
            .call()
            .await
            .with_context(|| format!("ERC-20 balanceOf({owner}) failed on {token}"))?;
        scale(balance, TOKEN_DECIMALS)
    }

    #[instrument(skip(self))]
    async fn erc1155_balance(&self, token: Address, owner: Address, id: U256) -> Result<Decimal> {
        let balance = IERC1155::new(token, self.provider.inner())
            .balanceOf(owner, id)
            .call()
            .await
            .with_context(|| format!("ERC-1155 balanceOf({owner}, {id}) failed on {token}"))?;
        scale(balance, TOKEN_DECIMALS)
    }

    #[instrument(skip(self))]
    async fn gas_balance(&self, owner: Address) -> Result<Decimal> {
        let balance = self
            .provider
            .inner()
            .get_balance(owner)
            .await
            .with_context(|| format!("eth_getBalance({owner}) failed"))?;
        scale(balance, GAS_DECIMALS)
    }

    #[instrument(skip(self))]
    async fn ensure_erc20_max_approval(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<()> {
        let erc20 = IERC20::new(token, self.provider.inner());
        let allowance = erc20
            .allowance(owner, spender)
            .call()
            .await
            .context("ERC-20 allowance query failed")?;

        // Anything below half of MAX has been spent down from a max approval
        // or was never granted.
        if allowance >= U256::MAX >> 1 {
            info!(token = %token, spender = %spender, "ERC-20 allowance already granted");
            return Ok(());
        }

        self.ensure_signer(owner)?;
        let gas_price = self.gas.gas_price().await?;
        info!(token = %token, spender = %spender, gas_price, "Submitting ERC-20 max approval");
        let receipt = erc20
            .approve(spender, U256::MAX)
            .gas_price(gas_price)
            .send()
            .await
            .context("ERC-20 approve submission failed")?
            .get_receipt()
            .await
            .context("ERC-20 approve was not mined")?;

        if !receipt.status() {
            bail!("ERC-20 approve reverted (tx {})", receipt.transaction_hash);
        }
        info!(tx = %receipt.transaction_hash, "ERC-20 approval mined");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn ensure_erc1155_approval_for_all(
        &self,
        token: Address,
        owner: Address,
        operator: Address,
    ) -> Result<()> {
        let erc1155 = IERC1155::new(token, self.provider.inner());
        let approved = erc1155
            .isApprovedForAll(owner, operator)
            .call()
            .await
            .context("ERC-1155 isApprovedForAll query failed")?;

        if approved {
            info!(token = %token, operator = %operator, "ERC-1155 approval already granted");
            return Ok(());
        }

        self.ensure_signer(owner)?;
        let gas_price = self.gas.gas_price().await?;
        info!(token = %token, operator = %operator, gas_price, "Submitting ERC-1155 approval");
        let receipt = erc1155
            .setApprovalForAll(operator, true)
            .gas_price(gas_price)
            .send()
            .await
            .context("ERC-1155 setApprovalForAll submission failed")?
            .get_receipt()
            .await
            .context("ERC-1155 setApprovalForAll was not mined")?;

        if !receipt.status() {
            bail!("ERC-1155 setApprovalForAll reverted (tx {})", receipt.transaction_hash);
        }
        info!(tx = %receipt.transaction_hash, "ERC-1155 approval mined");
        Ok(())
    }
}

/// Convert a raw on-chain amount into human units.
pub fn scale(raw: U256, decimals: u32) -> Result<Decimal> {
    let raw = i128::try_from(raw).with_context(|| format!("balance out of range: {raw}"))?;
    Decimal::try_from_i128_with_scale(raw, decimals)
        .or_else(|_| {
            // Too many digits for 96 bits: drop precision before scaling.
            let whole = raw / 10i128.pow(decimals);
            Decimal::try_from_i128_with_scale(whole, 0)
        })
        .with_context(|| format!("balance out of range: {raw}"))
}
