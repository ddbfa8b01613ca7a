//! CLOB API Request/Response Types
//!
//! Wire types for the Polymarket CLOB REST API. Numeric fields arrive as
//! strings and are decoded straight into `Decimal`. Listing entries and
//! order books decode into domain types directly (`domain::listing`,
//! `domain::book`); only shapes the domain never sees live here.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Signed limit order as accepted by `POST /order`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrder {
  pub salt: u64,
  pub maker: String,
  pub signer: String,
  pub taker: String,
  pub token_id: String,
  pub maker_amount: String,
  pub taker_amount: String,
  pub expiration: String,
  pub nonce: String,
  pub fee_rate_bps: String,
  /// "BUY" or "SELL".
  pub side: String,
  pub signature_type: u8,
  pub signature: String,
}

/// Order placement payload.
#[derive(Debug, Clone, Serialize)]
pub struct PostOrderRequest {
  pub order: SignedOrder,
  /// API key of the order owner.
  pub owner: String,
  /// "GTC" for resting quotes.
  #[serde(rename = "orderType")]
  pub order_type: String,
}

/// Response from order creation.
#[derive(Debug, Clone, Deserialize)]
pub struct PostOrderResponse {
  #[serde(default)]
  pub success: bool,
  #[serde(rename = "orderID", default)]
  pub order_id: Option<String>,
  #[serde(rename = "errorMsg", default)]
  pub error_msg: Option<String>,
}

/// Cancel order request.
#[derive(Debug, Clone, Serialize)]
pub struct CancelOrderRequest {
  #[serde(rename = "orderID")]
  pub order_id: String,
}

/// Response to single and bulk cancels.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelResponse {
  #[serde(default)]
  pub canceled: Vec<String>,
  /// Order id -> reason it was not cancelled.
  #[serde(default)]
  pub not_canceled: HashMap<String, String>,
}

/// One of the keeper's open orders from `GET /data/orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenOrderInfo {
  pub id: String,
  /// Token ID.
  pub asset_id: String,
  /// "BUY" or "SELL".
  pub side: String,
  pub price: Decimal,
  pub original_size: Decimal,
  #[serde(default)]
  pub size_matched: Decimal,
  #[serde(default)]
  pub status: Option<String>,
}

impl OpenOrderInfo {
  /// Unfilled size.
  pub fn remaining_size(&self) -> Decimal {
    (self.original_size - self.size_matched).max(Decimal::ZERO)
  }
}

/// Cursor-paginated envelope used by `/data/orders` and `/markets`.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
  #[serde(default = "Vec::new")]
  pub data: Vec<T>,
  #[serde(default)]
  pub next_cursor: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn test_post_order_request_serialization() {
    let req = PostOrderRequest {
      order: SignedOrder {
        salt: 42,
        maker: "0xmaker".to_string(),
        signer: "0xmaker".to_string(),
        taker: "0x0000000000000000000000000000000000000000".to_string(),
        token_id: "token_123".to_string(),
        maker_amount: "5000000".to_string(),
        taker_amount: "10000000".to_string(),
        expiration: "0".to_string(),
        nonce: "0".to_string(),
        fee_rate_bps: "0".to_string(),
        side: "BUY".to_string(),
        signature_type: 0,
        signature: "0xsig".to_string(),
      },
      owner: "api-key".to_string(),
      order_type: "GTC".to_string(),
    };

    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["order"]["tokenId"], "token_123");
    assert_eq!(json["order"]["makerAmount"], "5000000");
    assert_eq!(json["order"]["signatureType"], 0);
    assert_eq!(json["orderType"], "GTC");
  }

  #[test]
  fn test_post_order_response_deserialization() {
    let json = r#"{"success": true, "orderID": "order_abc", "errorMsg": ""}"#;
    let resp: PostOrderResponse = serde_json::from_str(json).unwrap();
    assert!(resp.success);
    assert_eq!(resp.order_id.unwrap(), "order_abc");

    let rejected: PostOrderResponse =
      serde_json::from_str(r#"{"success": false, "errorMsg": "not enough balance"}"#).unwrap();
    assert!(!rejected.success);
    assert!(rejected.order_id.is_none());
  }

  #[test]
  fn test_open_order_remaining_size() {
    let json = r#"{
      "data": [{"id": "0x1", "asset_id": "111", "side": "BUY", "price": "0.45",
                "original_size": "100", "size_matched": "40.5", "status": "LIVE"}],
      "next_cursor": "LTE="
    }"#;
    let page: Paginated<OpenOrderInfo> = serde_json::from_str(json).unwrap();
    assert_eq!(page.data[0].remaining_size(), dec!(59.5));
    assert_eq!(page.next_cursor, "LTE=");
  }

  #[test]
  fn test_cancel_response_deserialization() {
    let json = r#"{"canceled": ["0x1"], "not_canceled": {"0x2": "order not found"}}"#;
    let resp: CancelResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.canceled, vec!["0x1".to_string()]);
    assert_eq!(resp.not_canceled["0x2"], "order not found");
  }
}
