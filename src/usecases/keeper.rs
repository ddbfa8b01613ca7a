//! Market Maker Keeper - Lifecycle Hooks over All Quoted Markets
//!
//! Startup grants allowances (fatal on failure), starts every order book
//! manager and waits for first snapshots. Each tick reconciles every
//! market concurrently. Shutdown cancels everything on every market and
//! stops the refresh loops.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::ports::{AllowanceProvisioner, MarketGateway, PriceFeed};

use super::lifecycle::Keeper;
use super::market_context::MarketContext;

pub struct MarketMakerKeeper<G: MarketGateway, F: PriceFeed> {
  contexts: Vec<MarketContext<G, F>>,
  allowances: Arc<dyn AllowanceProvisioner>,
  warmup: Duration,
}

impl<G: MarketGateway, F: PriceFeed> MarketMakerKeeper<G, F> {
  pub fn new(
    contexts: Vec<MarketContext<G, F>>,
    allowances: Arc<dyn AllowanceProvisioner>,
    warmup: Duration,
  ) -> Self {
    Self {
      contexts,
      allowances,
      warmup,
    }
  }

  pub fn contexts(&self) -> &[MarketContext<G, F>] {
    &self.contexts
  }
}

#[async_trait]
impl<G: MarketGateway, F: PriceFeed> Keeper for MarketMakerKeeper<G, F> {
  async fn startup(&self) -> Result<()> {
    info!(markets = self.contexts.len(), "Running startup callback");

    self
      .allowances
      .ensure_allowances()
      .await
      .context("Failed to approve exchange allowances")?;

    for ctx in &self.contexts {
      ctx.order_book.start();
    }

    let ready = join_all(
      self
        .contexts
        .iter()
        .map(|ctx| ctx.order_book.wait_until_ready(self.warmup)),
    )
    .await;
    for (ctx, ready) in self.contexts.iter().zip(ready) {
      if !ready {
        warn!(
          condition_id = %ctx.market.condition_id(),
          warmup_secs = self.warmup.as_secs(),
          "No order book snapshot after warm-up, cycles skip until one arrives"
        );
      }
    }

    info!("Startup complete");
    Ok(())
  }

  async fn tick(&self) {
    debug!("Synchronizing order books");
    let reports = join_all(self.contexts.iter().map(|ctx| ctx.strategy.synchronize())).await;
    let operations: usize = reports.iter().map(|r| r.operations()).sum();
    debug!(operations, "Synchronized order books");
  }

  async fn shutdown(&self) {
    info!("Keeper shutting down, cancelling all orders");
    let reports = join_all(self.contexts.iter().map(|ctx| ctx.order_book.cancel_all())).await;
    for ctx in &self.contexts {
      ctx.order_book.stop();
    }

    let attempted: usize = reports.iter().map(|r| r.attempted).sum();
    let failed: usize = reports.iter().map(|r| r.failed).sum();
    if failed > 0 {
      warn!(attempted, failed, "Some cancels did not confirm");
    }
    info!(attempted, "Keeper is shut down");
  }
}
