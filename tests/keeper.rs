//! Keeper lifecycle over several markets: startup approvals, ticking and the
//! best-effort cancel-all on shutdown.

mod common;

use std::sync::Arc;
use std::time::Duration;

use mockall::mock;
use rust_decimal_macros::dec;

use common::{FakeGateway, FakePriceFeed, FixedQuotes, book_config, live, market};
use poly_market_maker::domain::{Outcome, QuotePolicy, Side, TargetQuote, Tolerance};
use poly_market_maker::ports::AllowanceProvisioner;
use poly_market_maker::usecases::{Keeper, Lifecycle, LifecycleState, MarketContext, MarketMakerKeeper};

mock! {
    pub Allowances {}

    #[async_trait::async_trait]
    impl AllowanceProvisioner for Allowances {
        async fn ensure_allowances(&self) -> anyhow::Result<()>;
    }
}

fn bid_a() -> Arc<dyn QuotePolicy> {
    Arc::new(FixedQuotes(vec![TargetQuote::new(
        Side::Buy,
        Outcome::A,
        dec!(0.45),
        dec!(10),
    )]))
}

fn context(
    condition_id: &str,
    gateway: &Arc<FakeGateway>,
) -> MarketContext<FakeGateway, FakePriceFeed> {
    MarketContext::new(
        market(condition_id),
        Arc::clone(gateway),
        Arc::new(FakePriceFeed::new(Some(dec!(0.5)))),
        bid_a(),
        &book_config(),
        Tolerance::default(),
    )
}

fn approving() -> Arc<dyn AllowanceProvisioner> {
    let mut allowances = MockAllowances::new();
    allowances.expect_ensure_allowances().times(1).returning(|| Ok(()));
    Arc::new(allowances)
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_attempts_every_cancel_despite_failures() {
    let first = Arc::new(FakeGateway::new().with_orders(vec![
        live("o1", Side::Buy, Outcome::A, dec!(0.40), dec!(10)),
        live("o2", Side::Sell, Outcome::B, dec!(0.65), dec!(10)),
    ]));
    first.fail_cancel("o1");
    let second = Arc::new(
        FakeGateway::new().with_orders(vec![live("o3", Side::Buy, Outcome::B, dec!(0.30), dec!(5))]),
    );

    let contexts = vec![context("0xfirst", &first), context("0xsecond", &second)];
    for ctx in &contexts {
        ctx.order_book.refresh().await.unwrap();
    }
    let keeper = MarketMakerKeeper::new(contexts, Arc::new(MockAllowances::new()), Duration::from_secs(1));

    keeper.shutdown().await;

    let mut attempted = first.cancel_calls.lock().unwrap().clone();
    attempted.sort();
    assert_eq!(attempted, vec!["o1".to_string(), "o2".to_string()]);
    assert_eq!(second.cancel_calls.lock().unwrap().as_slice(), ["o3".to_string()]);

    let left: Vec<_> = first.open_orders().into_iter().filter_map(|o| o.id).collect();
    assert_eq!(left, vec!["o1".to_string()]);
    assert!(second.open_orders().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_full_lifecycle_quotes_then_cancels_everything() {
    let first = Arc::new(FakeGateway::new());
    let second = Arc::new(FakeGateway::new());
    let keeper = MarketMakerKeeper::new(
        vec![context("0xfirst", &first), context("0xsecond", &second)],
        approving(),
        Duration::from_secs(5),
    );
    let lifecycle = Lifecycle::new(Duration::from_secs(1), Duration::from_secs(5));
    let state = lifecycle.state();

    lifecycle
        .run(&keeper, tokio::time::sleep(Duration::from_secs(10)))
        .await
        .unwrap();

    assert_eq!(*state.borrow(), LifecycleState::Stopped);
    for gateway in [&first, &second] {
        assert_eq!(gateway.place_count(), 1, "target placed once across all ticks");
        assert_eq!(gateway.cancel_count(), 1);
        assert!(gateway.open_orders().is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_approval_aborts_before_quoting() {
    let gateway = Arc::new(FakeGateway::new());
    let mut allowances = MockAllowances::new();
    allowances
        .expect_ensure_allowances()
        .returning(|| Err(anyhow::anyhow!("approval transaction reverted")));
    let keeper = MarketMakerKeeper::new(
        vec![context("0xcond", &gateway)],
        Arc::new(allowances),
        Duration::from_secs(5),
    );
    let lifecycle = Lifecycle::new(Duration::from_secs(1), Duration::from_secs(5));

    let result = lifecycle
        .run(&keeper, tokio::time::sleep(Duration::from_secs(10)))
        .await;

    assert!(result.is_err());
    assert_eq!(gateway.place_count(), 0);
    assert!(keeper.contexts()[0].order_book.snapshot().is_none());
}
