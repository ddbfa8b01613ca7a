//! Ranking and Reconciliation Benchmarks - Per-cycle Hot Paths
//!
//! Scores a full listing's worth of candidates and reconciles a busy
//! market's order set, the two pure computations the keeper repeats.
//!
//! Run with: cargo bench --bench ranking_bench

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use poly_market_maker::domain::reward::{self, CandidateMarketScore, RewardCandidate};
use poly_market_maker::domain::{
    BookLevel, Order, OrderBook, Outcome, Side, TargetQuote, Tolerance, reconcile,
};

fn deep_book(levels: i64) -> OrderBook {
    let bids = (1..=levels)
        .map(|i| BookLevel::new(dec!(0.50) - Decimal::new(i, 2), Decimal::from(100 * i)))
        .collect();
    let asks = (1..=levels)
        .map(|i| BookLevel::new(dec!(0.50) + Decimal::new(i, 2), Decimal::from(100 * i)))
        .collect();
    OrderBook::new(bids, asks)
}

fn candidate(i: i64) -> RewardCandidate {
    RewardCandidate {
        question: format!("market {i}"),
        condition_id: format!("0x{i:064x}"),
        daily_reward_rate: Decimal::from(25 + i % 400),
        max_spread: dec!(0.03),
        token_id: i.to_string(),
        token_price: dec!(0.50),
    }
}

/// Benchmark scoring one candidate against a 40-level book.
fn bench_score_candidate(c: &mut Criterion) {
    let book = deep_book(40);
    let cand = candidate(7);

    c.bench_function("score_candidate_40_levels", |b| {
        b.iter(|| {
            let _score = reward::score(black_box(&cand), black_box(&book));
        });
    });
}

/// Benchmark scoring and sorting 150 candidates (one listing scan).
fn bench_rank_listing(c: &mut Criterion) {
    let book = deep_book(20);
    let candidates: Vec<RewardCandidate> = (0..150).map(candidate).collect();

    c.bench_function("rank_150_candidates", |b| {
        b.iter(|| {
            let mut scored: Vec<CandidateMarketScore> = candidates
                .iter()
                .filter_map(|cand| {
                    reward::score(cand, black_box(&book))
                        .ok()
                        .map(|s| CandidateMarketScore::new(cand.clone(), s))
                })
                .collect();
            reward::sort_by_score(&mut scored);
            scored
        });
    });
}

/// Benchmark reconciling 40 live orders against 40 shifted targets.
fn bench_reconcile(c: &mut Criterion) {
    let live: Vec<Order> = (0..40)
        .map(|i| Order {
            id: Some(format!("ord-{i}")),
            side: if i % 2 == 0 { Side::Buy } else { Side::Sell },
            outcome: if i % 4 < 2 { Outcome::A } else { Outcome::B },
            price: Decimal::new(10 + i, 2),
            size: dec!(10),
        })
        .collect();
    let targets: Vec<TargetQuote> = live
        .iter()
        .map(|o| TargetQuote::new(o.side, o.outcome, o.price + dec!(0.01), o.size))
        .collect();
    let tolerance = Tolerance::default();

    c.bench_function("reconcile_40_orders", |b| {
        b.iter(|| {
            let _plan = reconcile(black_box(&live), black_box(&targets), &tolerance);
        });
    });
}

criterion_group!(
    benches,
    bench_score_candidate,
    bench_rank_listing,
    bench_reconcile,
);
criterion_main!(benches);
