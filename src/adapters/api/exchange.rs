//! CLOB Exchange Adapter
//!
//! Implements `ExchangeApi` on top of `ClobClient`: listings and books are
//! public reads, open orders are an authenticated paginated read, and
//! place/cancel are signed, rate-limited mutations.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::listing::{END_CURSOR, START_CURSOR};
use crate::domain::{CandidateError, ListedMarket, MarketsPage, OrderBook, OrderId, Side};
use crate::error::OperationError;
use crate::ports::{ExchangeApi, OpenOrder};

use super::client::{ApiError, ClobClient};
use super::signing::OrderSigner;
use super::types::{
  CancelOrderRequest, CancelResponse, OpenOrderInfo, Paginated, PostOrderRequest,
  PostOrderResponse,
};

/// Cancel failure reasons meaning the order is already gone.
const GONE_REASONS: [&str; 4] = ["not found", "already", "matched", "canceled"];

/// Polymarket CLOB behind the `ExchangeApi` port.
pub struct ClobExchange {
  client: Arc<ClobClient>,
  /// Absent in read-only mode.
  signer: Option<OrderSigner>,
}

impl ClobExchange {
  pub fn new(client: Arc<ClobClient>, signer: Option<OrderSigner>) -> Self {
    Self { client, signer }
  }

  /// Read-only exchange for listing and book queries.
  pub fn read_only(client: Arc<ClobClient>) -> Self {
    Self::new(client, None)
  }

  fn owner(&self) -> Result<String, OperationError> {
    self
      .client
      .auth()
      .map(|auth| auth.api_key().to_string())
      .ok_or_else(|| OperationError::Other(anyhow!("API credentials required to trade")))
  }
}

#[async_trait]
impl ExchangeApi for ClobExchange {
  async fn get_market(&self, condition_id: &str) -> anyhow::Result<ListedMarket> {
    self
      .client
      .get_public(&format!("/markets/{condition_id}"), &[])
      .await
      .with_context(|| format!("Failed to fetch market {condition_id}"))
  }

  async fn get_markets(&self, cursor: &str) -> anyhow::Result<MarketsPage> {
    let page: Paginated<serde_json::Value> = self
      .client
      .get_public("/markets", &[("next_cursor", cursor)])
      .await
      .context("Failed to fetch market listing")?;

    let mut markets = Vec::with_capacity(page.data.len());
    for entry in page.data {
      match serde_json::from_value::<ListedMarket>(entry) {
        Ok(market) => markets.push(market),
        Err(e) => {
          let reason = CandidateError::Malformed(e.to_string());
          warn!(cursor, error = %reason, "Skipping listing entry");
        }
      }
    }

    Ok(MarketsPage {
      markets,
      next_cursor: page.next_cursor,
    })
  }

  async fn get_order_book(&self, token_id: &str) -> anyhow::Result<OrderBook> {
    self
      .client
      .get_public("/book", &[("token_id", token_id)])
      .await
      .with_context(|| format!("Failed to fetch order book for token {token_id}"))
  }

  async fn get_orders(&self, condition_id: &str) -> anyhow::Result<Vec<OpenOrder>> {
    let mut orders = Vec::new();
    let mut cursor = START_CURSOR.to_string();

    loop {
      let page: Paginated<OpenOrderInfo> = self
        .client
        .get_private(
          "/data/orders",
          &[("market", condition_id), ("next_cursor", cursor.as_str())],
        )
        .await
        .with_context(|| format!("Failed to fetch open orders for {condition_id}"))?;

      for info in page.data {
        orders.push(open_order(info)?);
      }

      if page.next_cursor.is_empty() || page.next_cursor == END_CURSOR {
        break;
      }
      cursor = page.next_cursor;
    }

    debug!(condition_id, count = orders.len(), "Fetched open orders");
    Ok(orders)
  }

  async fn place_order(
    &self,
    price: Decimal,
    size: Decimal,
    side: Side,
    token_id: &str,
  ) -> Result<OrderId, OperationError> {
    let signer = self
      .signer
      .as_ref()
      .ok_or_else(|| OperationError::Other(anyhow!("no order signer configured")))?;
    let order = signer.sign_order(price, size, side, token_id)?;
    let request = PostOrderRequest {
      order,
      owner: self.owner()?,
      order_type: "GTC".to_string(),
    };

    let response: PostOrderResponse = self
      .client
      .post("/order", &request)
      .await
      .map_err(operation_error)?;

    match response.order_id {
      Some(id) if response.success && !id.is_empty() => Ok(id),
      _ => Err(OperationError::Rejected(
        response
          .error_msg
          .filter(|msg| !msg.is_empty())
          .unwrap_or_else(|| "order not accepted".to_string()),
      )),
    }
  }

  async fn cancel_order(&self, order_id: &str) -> Result<(), OperationError> {
    let request = CancelOrderRequest {
      order_id: order_id.to_string(),
    };

    let response: CancelResponse = match self.client.delete("/order", &request).await {
      Ok(response) => response,
      Err(ApiError::Status { body, .. }) if is_gone(&body) => {
        debug!(order_id, reason = %body, "Order already gone");
        return Ok(());
      }
      Err(e) => return Err(operation_error(e)),
    };

    if response.canceled.iter().any(|id| id == order_id) {
      return Ok(());
    }
    match response.not_canceled.get(order_id) {
      Some(reason) if is_gone(reason) => {
        debug!(order_id, reason = %reason, "Order already gone");
        Ok(())
      }
      Some(reason) => Err(OperationError::Rejected(reason.clone())),
      // Empty response: nothing left to cancel under this id.
      None => Ok(()),
    }
  }

  async fn cancel_all_orders(&self) -> Result<(), OperationError> {
    let response: CancelResponse = self
      .client
      .delete("/cancel-all", &serde_json::json!({}))
      .await
      .map_err(operation_error)?;

    if !response.not_canceled.is_empty() {
      warn!(
        cancelled = response.canceled.len(),
        not_cancelled = response.not_canceled.len(),
        "Cancel-all left some orders"
      );
    }
    Ok(())
  }
}

fn open_order(info: OpenOrderInfo) -> anyhow::Result<OpenOrder> {
  let side = info
    .side
    .parse::<Side>()
    .with_context(|| format!("order {} has an invalid side", info.id))?;
  let size = info.remaining_size();
  Ok(OpenOrder {
    id: info.id,
    token_id: info.asset_id,
    side,
    price: info.price,
    size,
  })
}

fn is_gone(reason: &str) -> bool {
  let reason = reason.to_ascii_lowercase();
  GONE_REASONS.iter().any(|needle| reason.contains(needle))
}

fn operation_error(e: ApiError) -> OperationError {
  match e {
    ApiError::Timeout => OperationError::Timeout,
    e if e.is_client_rejection() => OperationError::Rejected(e.to_string()),
    e => OperationError::Other(e.into()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use reqwest::StatusCode;
  use rust_decimal_macros::dec;

  #[test]
  fn test_gone_reasons() {
    assert!(is_gone("Order not found"));
    assert!(is_gone("order already canceled"));
    assert!(is_gone("MATCHED"));
    assert!(!is_gone("rate limited"));
  }

  #[test]
  fn test_operation_error_mapping() {
    assert!(matches!(operation_error(ApiError::Timeout), OperationError::Timeout));

    let rejected = operation_error(ApiError::Status {
      status: StatusCode::BAD_REQUEST,
      body: "invalid tick size".into(),
    });
    assert!(rejected.is_definite());

    let server = operation_error(ApiError::Status {
      status: StatusCode::BAD_GATEWAY,
      body: String::new(),
    });
    assert!(!server.is_definite());
  }

  #[test]
  fn test_open_order_uses_remaining_size() {
    let info = OpenOrderInfo {
      id: "0x1".into(),
      asset_id: "111".into(),
      side: "sell".into(),
      price: dec!(0.6),
      original_size: dec!(50),
      size_matched: dec!(20),
      status: None,
    };
    let order = open_order(info).unwrap();
    assert_eq!(order.side, Side::Sell);
    assert_eq!(order.size, dec!(30));
    assert_eq!(order.token_id, "111");
  }
}
