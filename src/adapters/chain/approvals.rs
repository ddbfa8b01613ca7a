//! Exchange Approvals - Token Spend Allowances
//!
//! Handles the one-time approvals the exchange needs to settle the
//! keeper's orders:
//! - Collateral (ERC-20) → exchange, max uint256
//! - Conditional tokens (ERC-1155) → exchange, approval-for-all
//!
//! Both checks are read first; a transaction is only sent when missing.

use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, instrument};

use crate::ports::{AllowanceProvisioner, ChainClient};

pub struct ExchangeApprovals {
    chain: Arc<dyn ChainClient>,
    owner: Address,
    collateral: Address,
    conditional: Address,
    exchange: Address,
}

impl ExchangeApprovals {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        owner: Address,
        collateral: Address,
        conditional: Address,
        exchange: Address,
    ) -> Self {
        Self {
            chain,
            owner,
            collateral,
            conditional,
            exchange,
        }
    }
}

#[async_trait]
impl AllowanceProvisioner for ExchangeApprovals {
    #[instrument(skip(self), fields(owner = %self.owner, exchange = %self.exchange))]
    async fn ensure_allowances(&self) -> Result<()> {
        self.chain
            .ensure_erc20_max_approval(self.collateral, self.owner, self.exchange)
            .await
            .context("collateral approval")?;

        self.chain
            .ensure_erc1155_approval_for_all(self.conditional, self.owner, self.exchange)
            .await
            .context("conditional token approval")?;

        info!("Exchange allowances in place");
        Ok(())
    }
}
