//! Chain Adapters - Polygon Blockchain Interaction Layer
//!
//! Provides on-chain access via alloy-rs for:
//! - RPC provider management with chain id validation
//! - Collateral (ERC-20) and conditional token (ERC-1155) balances
//! - Exchange approvals (collateral allowance, ERC-1155 approval-for-all)
//! - Gas price selection (fixed, node, gas station)

pub mod approvals;
pub mod contracts;
pub mod gas;
pub mod provider;

pub use approvals::ExchangeApprovals;
pub use contracts::Contracts;
pub use gas::GasStation;
pub use provider::PolygonProvider;
