//! Order Signing - EIP-712 Limit Orders for the CTF Exchange
//!
//! Every order posted to the CLOB carries an EIP-712 signature over the
//! exchange's `Order` struct. Amounts are in base units (6 decimals for
//! both collateral and outcome tokens).

use alloy::hex;
use alloy::primitives::{Address, B256, U256};
use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::{Eip712Domain, SolStruct, eip712_domain};
use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;

use crate::domain::Side;

use super::types::SignedOrder;

mod eip712 {
    alloy::sol! {
        #[derive(Debug)]
        struct Order {
            uint256 salt;
            address maker;
            address signer;
            address taker;
            uint256 tokenId;
            uint256 makerAmount;
            uint256 takerAmount;
            uint256 expiration;
            uint256 nonce;
            uint256 feeRateBps;
            uint8 side;
            uint8 signatureType;
        }
    }
}

pub use eip712::Order as Eip712Order;

/// Base units per whole collateral or outcome token.
const AMOUNT_SCALE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Plain EOA signature.
const SIGNATURE_TYPE_EOA: u8 = 0;

/// Signs CLOB orders with the keeper's private key.
pub struct OrderSigner {
    signer: PrivateKeySigner,
    domain: Eip712Domain,
}

impl OrderSigner {
    pub fn new(signer: PrivateKeySigner, chain_id: u64, exchange: Address) -> Self {
        let domain = eip712_domain! {
            name: "Polymarket CTF Exchange",
            version: "1",
            chain_id: chain_id,
            verifying_contract: exchange,
        };
        Self { signer, domain }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Build the unsigned order for a GTC limit quote.
    ///
    /// BUY gives `price * size` collateral for `size` tokens; SELL the
    /// reverse.
    pub fn build_order(
        &self,
        price: Decimal,
        size: Decimal,
        side: Side,
        token_id: &str,
        salt: u64,
    ) -> Result<Eip712Order> {
        if price <= Decimal::ZERO || size <= Decimal::ZERO {
            bail!("order price and size must be positive (price={price}, size={size})");
        }
        let token = U256::from_str_radix(token_id, 10)
            .with_context(|| format!("token id is not a decimal integer: {token_id}"))?;

        let tokens = to_base_units(size)?;
        let collateral = to_base_units(price * size)?;
        let (maker_amount, taker_amount, side_code) = match side {
            Side::Buy => (collateral, tokens, 0u8),
            Side::Sell => (tokens, collateral, 1u8),
        };

        let maker = self.signer.address();
        Ok(Eip712Order {
            salt: U256::from(salt),
            maker,
            signer: maker,
            taker: Address::ZERO,
            tokenId: token,
            makerAmount: maker_amount,
            takerAmount: taker_amount,
            expiration: U256::ZERO,
            nonce: U256::ZERO,
            feeRateBps: U256::ZERO,
            side: side_code,
            signatureType: SIGNATURE_TYPE_EOA,
        })
    }

    pub fn signing_hash(&self, order: &Eip712Order) -> B256 {
        order.eip712_signing_hash(&self.domain)
    }

    /// Build and sign an order, ready for `POST /order`.
    pub fn sign_order(
        &self,
        price: Decimal,
        size: Decimal,
        side: Side,
        token_id: &str,
    ) -> Result<SignedOrder> {
        let salt = u64::from(Uuid::new_v4().as_fields().0);
        let order = self.build_order(price, size, side, token_id, salt)?;
        let hash = self.signing_hash(&order);
        let signature = self
            .signer
            .sign_hash_sync(&hash)
            .context("Failed to sign order")?;

        Ok(SignedOrder {
            salt,
            maker: order.maker.to_checksum(None),
            signer: order.signer.to_checksum(None),
            taker: order.taker.to_checksum(None),
            token_id: order.tokenId.to_string(),
            maker_amount: order.makerAmount.to_string(),
            taker_amount: order.takerAmount.to_string(),
            expiration: order.expiration.to_string(),
            nonce: order.nonce.to_string(),
            fee_rate_bps: order.feeRateBps.to_string(),
            side: side.as_str().to_string(),
            signature_type: order.signatureType,
            signature: hex::encode_prefixed(signature.as_bytes()),
        })
    }
}

impl std::fmt::Debug for OrderSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSigner")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

fn to_base_units(amount: Decimal) -> Result<U256> {
    let units = (amount * AMOUNT_SCALE)
        .trunc()
        .to_u128()
        .with_context(|| format!("amount out of range: {amount}"))?;
    Ok(U256::from(units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // Well-known development key (anvil account 0).
    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn signer() -> OrderSigner {
        let key: PrivateKeySigner = TEST_KEY.parse().unwrap();
        let exchange: Address = "0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E"
            .parse()
            .unwrap();
        OrderSigner::new(key, 137, exchange)
    }

    #[test]
    fn test_buy_amounts() {
        let s = signer();
        let order = s
            .build_order(dec!(0.45), dec!(10), Side::Buy, "123", 7)
            .unwrap();
        assert_eq!(order.makerAmount, U256::from(4_500_000u64));
        assert_eq!(order.takerAmount, U256::from(10_000_000u64));
        assert_eq!(order.side, 0);
        assert_eq!(order.tokenId, U256::from(123u64));
        assert_eq!(order.maker, s.address());
    }

    #[test]
    fn test_sell_amounts() {
        let order = signer()
            .build_order(dec!(0.55), dec!(12.5), Side::Sell, "9", 7)
            .unwrap();
        assert_eq!(order.makerAmount, U256::from(12_500_000u64));
        assert_eq!(order.takerAmount, U256::from(6_875_000u64));
        assert_eq!(order.side, 1);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let s = signer();
        assert!(s.build_order(dec!(0), dec!(10), Side::Buy, "1", 1).is_err());
        assert!(s.build_order(dec!(0.5), dec!(10), Side::Buy, "0xabc", 1).is_err());
    }

    #[test]
    fn test_signature_recovers_signer() {
        let s = signer();
        let signed = s.sign_order(dec!(0.5), dec!(20), Side::Buy, "42").unwrap();
        assert_eq!(signed.maker, s.address().to_checksum(None));
        assert_eq!(signed.side, "BUY");

        let order = s
            .build_order(dec!(0.5), dec!(20), Side::Buy, "42", signed.salt)
            .unwrap();
        let hash = s.signing_hash(&order);
        let sig = s.signer.sign_hash_sync(&hash).unwrap();
        assert_eq!(sig.recover_address_from_prehash(&hash).unwrap(), s.address());
        assert_eq!(hex::encode_prefixed(sig.as_bytes()), signed.signature);
    }
}
