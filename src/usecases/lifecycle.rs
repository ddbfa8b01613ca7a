//! Lifecycle Use Case - Startup, Periodic Ticks and Bounded Shutdown
//!
//! `Init -> Running -> ShuttingDown -> Stopped`. The startup hook runs once
//! and must succeed before the first tick. Ticks run one at a time; ticks
//! missed while one is running are skipped. Once the termination signal
//! resolves, the shutdown hook runs under a timeout and the lifecycle
//! ends whether or not it finished.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};

/// Phase of the keeper process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
  Init,
  Running,
  ShuttingDown,
  Stopped,
}

impl LifecycleState {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Init => "init",
      Self::Running => "running",
      Self::ShuttingDown => "shutting_down",
      Self::Stopped => "stopped",
    }
  }
}

/// Hooks driven by the lifecycle.
#[async_trait]
pub trait Keeper: Send + Sync {
  /// Runs once before the first tick. An error aborts the process.
  async fn startup(&self) -> Result<()>;

  /// One periodic unit of work.
  async fn tick(&self);

  /// Runs once after the termination signal.
  async fn shutdown(&self);
}

/// Fixed-period scheduler with startup/shutdown hooks.
pub struct Lifecycle {
  period: Duration,
  shutdown_timeout: Duration,
  state_tx: watch::Sender<LifecycleState>,
}

impl Lifecycle {
  pub fn new(period: Duration, shutdown_timeout: Duration) -> Self {
    let (state_tx, _) = watch::channel(LifecycleState::Init);
    Self {
      period,
      shutdown_timeout,
      state_tx,
    }
  }

  /// Receiver tracking the current state.
  pub fn state(&self) -> watch::Receiver<LifecycleState> {
    self.state_tx.subscribe()
  }

  fn transition(&self, next: LifecycleState) {
    let previous = self.state_tx.send_replace(next);
    debug!(from = previous.as_str(), to = next.as_str(), "Lifecycle transition");
  }

  /// Drive `keeper` until `shutdown_signal` resolves.
  ///
  /// # Errors
  /// Only a failed startup hook is an error.
  pub async fn run<K, S>(&self, keeper: &K, shutdown_signal: S) -> Result<()>
  where
    K: Keeper + ?Sized,
    S: Future<Output = ()>,
  {
    info!("Running startup hook");
    if let Err(e) = keeper.startup().await {
      self.transition(LifecycleState::Stopped);
      return Err(e).context("Keeper startup failed");
    }
    self.transition(LifecycleState::Running);
    info!(period_ms = self.period.as_millis() as u64, "Startup complete, ticking");

    let mut ticker = interval(self.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown_signal);

    loop {
      tokio::select! {
        biased;
        () = &mut shutdown_signal => break,
        _ = ticker.tick() => {}
      }
      tokio::select! {
        biased;
        () = &mut shutdown_signal => break,
        () = keeper.tick() => {}
      }
    }

    self.transition(LifecycleState::ShuttingDown);
    info!("Termination requested, running shutdown hook");
    if timeout(self.shutdown_timeout, keeper.shutdown()).await.is_err() {
      warn!(
        timeout_secs = self.shutdown_timeout.as_secs(),
        "Shutdown hook timed out, exiting without confirmed cancel-all"
      );
    }
    self.transition(LifecycleState::Stopped);
    info!("Keeper stopped");
    Ok(())
  }
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn termination_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      warn!(error = %e, "Failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut signal) => {
        signal.recv().await;
      }
      Err(e) => {
        warn!(error = %e, "Failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    () = ctrl_c => info!("Received Ctrl-C"),
    () = terminate => info!("Received SIGTERM"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use tokio::time::{Instant, sleep};

  #[derive(Default)]
  struct SlowKeeper {
    fail_startup: bool,
    tick_duration: Duration,
    shutdown_duration: Duration,
    ticks: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    shutdowns: AtomicUsize,
  }

  #[async_trait]
  impl Keeper for SlowKeeper {
    async fn startup(&self) -> Result<()> {
      anyhow::ensure!(!self.fail_startup, "approvals failed");
      Ok(())
    }

    async fn tick(&self) {
      self.ticks.fetch_add(1, Ordering::SeqCst);
      let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
      self.max_in_flight.fetch_max(now, Ordering::SeqCst);
      sleep(self.tick_duration).await;
      self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    async fn shutdown(&self) {
      self.shutdowns.fetch_add(1, Ordering::SeqCst);
      sleep(self.shutdown_duration).await;
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_ticks_never_overlap() {
    let keeper = SlowKeeper {
      tick_duration: Duration::from_secs(25),
      ..SlowKeeper::default()
    };
    let lifecycle = Lifecycle::new(Duration::from_secs(10), Duration::from_secs(5));

    lifecycle
      .run(&keeper, sleep(Duration::from_secs(100)))
      .await
      .unwrap();

    assert!(keeper.ticks.load(Ordering::SeqCst) >= 2);
    assert_eq!(keeper.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(keeper.shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(*lifecycle.state().borrow(), LifecycleState::Stopped);
  }

  #[tokio::test(start_paused = true)]
  async fn test_shutdown_bounded_by_timeout() {
    let keeper = SlowKeeper {
      shutdown_duration: Duration::from_secs(600),
      ..SlowKeeper::default()
    };
    let lifecycle = Lifecycle::new(Duration::from_secs(1), Duration::from_secs(5));
    let started = Instant::now();

    lifecycle
      .run(&keeper, sleep(Duration::from_secs(3)))
      .await
      .unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(8), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(600), "{elapsed:?}");
    assert_eq!(*lifecycle.state().borrow(), LifecycleState::Stopped);
  }

  #[tokio::test(start_paused = true)]
  async fn test_startup_failure_is_fatal_and_skips_ticks() {
    let keeper = SlowKeeper {
      fail_startup: true,
      ..SlowKeeper::default()
    };
    let lifecycle = Lifecycle::new(Duration::from_secs(1), Duration::from_secs(5));

    let result = lifecycle.run(&keeper, sleep(Duration::from_secs(3))).await;

    assert!(result.is_err());
    assert_eq!(keeper.ticks.load(Ordering::SeqCst), 0);
    assert_eq!(keeper.shutdowns.load(Ordering::SeqCst), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_state_published_while_running() {
    let keeper = SlowKeeper::default();
    let lifecycle = Lifecycle::new(Duration::from_secs(1), Duration::from_secs(5));
    let mut state = lifecycle.state();
    assert_eq!(*state.borrow(), LifecycleState::Init);

    let run = lifecycle.run(&keeper, sleep(Duration::from_secs(3)));
    let observe = async {
      state
        .wait_for(|s| *s == LifecycleState::Running)
        .await
        .map(|s| *s)
    };
    let (result, observed) = tokio::join!(run, observe);
    result.unwrap();
    assert_eq!(observed.unwrap(), LifecycleState::Running);
  }
}
