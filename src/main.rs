//! Poly Market Maker - Entry Point
//!
//! Market making keeper for the Polymarket CLOB. Runs until SIGINT/SIGTERM.
//!
//! Wiring sequence (`run`):
//! 1. Load config.toml + validate, init JSON tracing
//! 2. Load secrets from env (PRIVATE_KEY, POLY_API_KEY, POLY_API_SECRET, POLY_PASSPHRASE)
//! 3. Connect Polygon RPC, gas station, token contracts
//! 4. Create ClobClient (HTTP + L2 auth + retry + rate limit) and ClobExchange
//! 5. Pick markets: configured condition ids or top reward-ranked
//! 6. Build one gateway, price feed, order book manager and strategy per market
//! 7. Spawn the metrics server (/metrics, /live, /ready)
//! 8. Drive the keeper lifecycle until a termination signal
//!
//! `rank` prints the reward ranking and exits without trading.

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use poly_market_maker::adapters::api::{
    ClobAuth, ClobClient, ClobClientConfig, ClobExchange, OrderSigner,
};
use poly_market_maker::adapters::chain::{Contracts, ExchangeApprovals, GasStation, PolygonProvider};
use poly_market_maker::adapters::feeds::ClobPriceFeed;
use poly_market_maker::adapters::gateway::{ClobMarketGateway, TokenContracts};
use poly_market_maker::adapters::metrics::{KeeperMetrics, MetricsServer};
use poly_market_maker::config::{self, AppConfig, StrategyConfig};
use poly_market_maker::domain::{
    ListedMarket, Market, QuotePolicy, SpreadParams, SymmetricSpreadPolicy, Tolerance,
};
use poly_market_maker::ports::{AllowanceProvisioner, ChainClient, ExchangeApi};
use poly_market_maker::usecases::lifecycle::termination_signal;
use poly_market_maker::usecases::reward_ranker::select_top;
use poly_market_maker::usecases::{Lifecycle, MarketContext, MarketMakerKeeper, RewardRanker};

type Gateway = ClobMarketGateway<ClobExchange, Contracts>;
type Feed = ClobPriceFeed<ClobExchange>;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "poly-market-maker")]
#[command(about = "Reward-aware market making keeper for the Polymarket CLOB")]
#[command(version)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml", env = "KEEPER_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the keeper (default)
    Run,
    /// Print reward-ranked candidate markets and exit
    Rank {
        /// Only print the first N candidates
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ── 1. Load configuration ─────────────────────────────────
    let config = config::loader::load_config(&args.config.to_string_lossy())
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.keeper.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.keeper.name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting Poly Market Maker"
    );

    let result = match args.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Rank { limit } => rank(&config, limit).await,
    };
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Keeper exited with an error");
    }
    result
}

/// Print the ranking table to stdout.
async fn rank(config: &AppConfig, limit: Option<usize>) -> Result<()> {
    let client = ClobClient::new(
        None,
        ClobClientConfig::from_config(&config.api, &config.rate_limits),
    )
    .context("Failed to create CLOB client")?;
    let exchange = Arc::new(ClobExchange::read_only(Arc::new(client)));

    let ranked = RewardRanker::new(exchange, &config.markets).rank().await?;
    for candidate in ranked.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{} | {} | {}",
            candidate.question, candidate.reward_per_dollar, candidate.condition_id
        );
    }
    Ok(())
}

async fn run(config: AppConfig) -> Result<()> {
    // ── 3. Secrets and signer ─────────────────────────────────
    let secrets = config::loader::load_secrets()?;
    let signer = PrivateKeySigner::from_str(secrets.private_key.trim())
        .context("PRIVATE_KEY is not a valid secp256k1 private key")?;
    let signer_address = signer.address();

    let owner = match &config.wallet.address_override {
        Some(address) => {
            let address = Address::from_str(address).context("Invalid wallet.address_override")?;
            warn!(
                signer = %signer_address,
                tracked = %address,
                "Tracking balances and approvals of an address other than the signer"
            );
            address
        }
        None => signer_address,
    };

    let collateral = config.contracts.collateral_address()?;
    let conditional = config.contracts.conditional_address()?;
    let exchange_address = config.contracts.exchange_address()?;

    // ── 4. Chain adapters ─────────────────────────────────────
    let provider = PolygonProvider::connect(&config.api, signer.clone())
        .await
        .context("Failed to connect to Polygon RPC")?;
    let gas = Arc::new(GasStation::new(provider.clone(), &config.gas)?);
    let chain = Arc::new(Contracts::new(provider, gas));

    // ── 5. CLOB client and exchange ───────────────────────────
    let auth = Arc::new(ClobAuth::new(&secrets, signer_address.to_checksum(None))?);
    let client = Arc::new(
        ClobClient::new(
            Some(auth),
            ClobClientConfig::from_config(&config.api, &config.rate_limits),
        )
        .context("Failed to create CLOB client")?,
    );
    let order_signer = OrderSigner::new(signer, config.api.chain_id, exchange_address);
    let exchange = Arc::new(ClobExchange::new(client, Some(order_signer)));

    // ── 6. Markets ────────────────────────────────────────────
    let condition_ids = if config.markets.condition_ids.is_empty() {
        let ranked = RewardRanker::new(Arc::clone(&exchange), &config.markets)
            .rank()
            .await
            .context("Failed to rank reward markets")?;
        select_top(&ranked, config.markets.auto_select_count)
    } else {
        config.markets.condition_ids.clone()
    };
    ensure!(!condition_ids.is_empty(), "No markets to quote");

    let metrics = Arc::new(KeeperMetrics::new()?);
    let policy: Arc<dyn QuotePolicy> =
        Arc::new(SymmetricSpreadPolicy::new(spread_params(&config.strategy)));
    let tokens = TokenContracts {
        collateral,
        conditional,
    };

    let mut contexts: Vec<MarketContext<Gateway, Feed>> = Vec::with_capacity(condition_ids.len());
    for condition_id in &condition_ids {
        let listed = exchange.get_market(condition_id).await?;
        let market = market_from_listing(&listed, &config.contracts.collateral)?;
        let gateway = Arc::new(ClobMarketGateway::new(
            market.clone(),
            Arc::clone(&exchange),
            Arc::clone(&chain),
            owner,
            tokens,
            Some(Arc::clone(&metrics)),
        )?);
        let feed = Arc::new(ClobPriceFeed::new(Arc::clone(&exchange), &market));

        info!(condition_id = %market, question = %listed.question, "Quoting market");
        contexts.push(MarketContext::new(
            market,
            gateway,
            feed,
            Arc::clone(&policy),
            &config.order_book,
            tolerance(&config.strategy),
        ));
    }

    let chain: Arc<dyn ChainClient> = chain;
    let approvals: Arc<dyn AllowanceProvisioner> = Arc::new(ExchangeApprovals::new(
        chain,
        owner,
        collateral,
        conditional,
        exchange_address,
    ));
    let keeper = MarketMakerKeeper::new(contexts, approvals, config.keeper.warmup());
    let lifecycle = Lifecycle::new(config.keeper.sync_interval(), config.keeper.shutdown_timeout());

    // ── 7. Metrics server ─────────────────────────────────────
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = config.metrics.enabled.then(|| {
        let server = MetricsServer::new(Arc::clone(&metrics), lifecycle.state());
        let bind = config.metrics.bind_address.clone();
        tokio::spawn(async move {
            let shutdown = async {
                let _ = stop_rx.await;
            };
            if let Err(e) = server.serve(bind, shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        })
    });

    // ── 8. Lifecycle ──────────────────────────────────────────
    let result = lifecycle.run(&keeper, termination_signal()).await;

    let _ = stop_tx.send(());
    if let Some(handle) = server {
        let _ = handle.await;
    }
    result
}

/// Outcome A is the first listed token, B the second.
fn market_from_listing(listed: &ListedMarket, collateral: &str) -> Result<Market> {
    let [token_a, token_b, ..] = listed.tokens.as_slice() else {
        anyhow::bail!(
            "market {} lists {} tokens, expected two",
            listed.condition_id,
            listed.tokens.len()
        );
    };
    Market::new(
        listed.condition_id.clone(),
        collateral,
        token_a.token_id.clone(),
        token_b.token_id.clone(),
    )
}

fn spread_params(strategy: &StrategyConfig) -> SpreadParams {
    SpreadParams {
        spread: strategy.spread,
        order_size: strategy.order_size,
        min_size: strategy.min_size,
        tick_size: strategy.tick_size,
    }
}

const fn tolerance(strategy: &StrategyConfig) -> Tolerance {
    Tolerance {
        price: strategy.price_tolerance,
        size_fraction: strategy.size_tolerance,
    }
}
