//! Chain Client Port - On-chain Interaction Interface
//!
//! Balance reads and allowance setup against the collateral (ERC-20) and
//! conditional token (ERC-1155) contracts. Amounts are returned already
//! scaled to human units.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for on-chain interactions via alloy-rs.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
  /// ERC-20 balance of `owner`, scaled by the token decimals.
  async fn erc20_balance(&self, token: Address, owner: Address) -> anyhow::Result<Decimal>;

  /// ERC-1155 balance of `owner` for one position id.
  async fn erc1155_balance(
    &self,
    token: Address,
    owner: Address,
    id: U256,
  ) -> anyhow::Result<Decimal>;

  /// Native gas balance of `owner`.
  async fn gas_balance(&self, owner: Address) -> anyhow::Result<Decimal>;

  /// Approve `spender` for the maximum ERC-20 amount unless already done.
  async fn ensure_erc20_max_approval(
    &self,
    token: Address,
    owner: Address,
    spender: Address,
  ) -> anyhow::Result<()>;

  /// Set ERC-1155 approval-for-all for `operator` unless already set.
  async fn ensure_erc1155_approval_for_all(
    &self,
    token: Address,
    owner: Address,
    operator: Address,
  ) -> anyhow::Result<()>;
}

/// Grants the exchange the allowances it needs to settle the keeper's orders.
#[async_trait]
pub trait AllowanceProvisioner: Send + Sync + 'static {
  async fn ensure_allowances(&self) -> anyhow::Result<()>;
}
