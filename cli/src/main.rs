mod config;
mod live_source;
mod pools;
mod signer;
mod submitter;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use api::EventFeed;
use chain::{ChainClient, ChainClientPool, JsonRpcChainClient};
use core_model::execution::Execution;
use core_model::{ChainId, Token, TokenPair, Venue};
use planner::{FlashLoanProvider, assemble_and_simulate, select_provider};
use scanner::poller::collect_quotes;
use scanner::{Admission, LiveOpportunityMap, QuoteSource, ScanContext, check_admission, rank, scan_tick};
use store::{KvStore, LiveViewCache, Repository};
use venues::{GenericAdapter, QuoteCache, VenueAdapter};

use crate::config::AppConfig;
use crate::live_source::ChainPoolQuoteSource;
use crate::pools::PoolConfig;
use crate::signer::UnwiredSigner;
use crate::submitter::MultiChainSubmitter;

type Router = executor::ExecutorRouter<MultiChainSubmitter<UnwiredSigner>>;

/// One (chain, pair) scanning target: the pair definition and one
/// `QuoteSource` plus one flash-loan candidate per venue pool quoting it.
struct ScanTarget {
    chain: ChainId,
    pair: TokenPair,
    pair_id: String,
    sources: Vec<Arc<dyn QuoteSource>>,
    providers: Vec<FlashLoanProvider>,
}

fn group_pools_into_targets(pools: Vec<PoolConfig>, clients: &HashMap<ChainId, Arc<JsonRpcChainClient>>) -> Vec<ScanTarget> {
    let mut grouped: HashMap<(ChainId, String), Vec<PoolConfig>> = HashMap::new();
    for pool in pools {
        grouped.entry((pool.chain, pool.pair_id.clone())).or_default().push(pool);
    }

    let mut targets = Vec::new();
    for ((chain, pair_id), entries) in grouped {
        let Some(client) = clients.get(&chain).cloned() else {
            warn!(?chain, pair_id, "no chain client wired; skipping pool group");
            continue;
        };
        let Some(first) = entries.first() else { continue };
        let pair = TokenPair::new(
            Token::new(&first.base_address, first.base_decimals, &first.base_symbol),
            Token::new(&first.quote_address, first.quote_decimals, &first.quote_symbol),
        );

        let sources: Vec<Arc<dyn QuoteSource>> = entries
            .iter()
            .map(|p| {
                let adapter: Arc<dyn VenueAdapter> = Arc::new(GenericAdapter::new(Venue::new(chain, p.venue_name.clone(), p.pricing_model)));
                Arc::new(ChainPoolQuoteSource {
                    client: client.clone(),
                    adapter,
                    pool_address: p.pool_address.clone(),
                    fee_bps: p.fee_bps,
                    cache: Arc::new(QuoteCache::new(1)),
                }) as Arc<dyn QuoteSource>
            })
            .collect();

        // Each quoted pool doubles as a flash-loan candidate at its own fee
        // tier; the planner still runs its normal zero-fee-first selection
        // over this set (§4.E step 1).
        let providers = entries
            .iter()
            .map(|p| FlashLoanProvider { name: format!("{}:{}", p.venue_name, p.pool_address), fee_bps: p.fee_bps, available_liquidity: rust_decimal::Decimal::from(1_000_000) })
            .collect();

        targets.push(ScanTarget { chain, pair, pair_id, sources, providers });
    }
    targets
}

async fn connect_store(cfg: &AppConfig) -> anyhow::Result<sqlx::SqlitePool> {
    let pool = SqlitePoolOptions::new().max_connections(8).connect(&cfg.database_url).await?;
    store::migrate(&pool).await?;
    Ok(pool)
}

/// Builds one `ChainClientPool`-backed `JsonRpcChainClient` per configured
/// chain and probes it once via `block_number`. Chains with zero configured
/// endpoints, or whose probe fails outright, are dropped rather than
/// aborting startup - the process still runs on whatever chains are healthy.
async fn build_chain_clients(cfg: &AppConfig) -> HashMap<ChainId, Arc<JsonRpcChainClient>> {
    let mut clients = HashMap::new();
    for chain in ChainId::ALL {
        let Some(endpoints) = cfg.rpc_endpoints.get(&chain) else { continue };
        if endpoints.is_empty() {
            continue;
        }
        let pool = match ChainClientPool::new(chain, endpoints, cfg.rpc_timeout) {
            Ok(p) => p,
            Err(e) => {
                warn!(?chain, error = %e, "failed to construct chain client pool");
                continue;
            }
        };
        let client = Arc::new(JsonRpcChainClient::new(pool));
        match client.block_number().await {
            Ok(block) => {
                info!(?chain, block, "chain endpoint healthy");
                clients.insert(chain, client);
            }
            Err(e) => warn!(?chain, error = %e, "startup health probe failed"),
        }
    }
    clients
}

/// One tick of one scan target (§4.C-§4.E): collect quotes, rank candidates,
/// check admission, update the live view, and (if armed) hand admitted
/// candidates to the executor.
#[allow(clippy::too_many_arguments)]
async fn run_scan_tick(
    target: &ScanTarget,
    client: &Arc<JsonRpcChainClient>,
    cfg: &AppConfig,
    live_map: &LiveOpportunityMap,
    repo: &Repository,
    cache: &LiveViewCache,
    kv: &KvStore,
    feed: &EventFeed,
    executor: &Router,
    cooldowns: &RwLock<HashMap<String, u64>>,
) {
    let now_ms = common::now_ms();
    let quotes = collect_quotes(&target.sources, target.sources.len().max(1), target.chain.scan_cadence()).await;

    let gas_price = client.gas_price().await.unwrap_or(rust_decimal::Decimal::ZERO);
    cache.put_gas_price(target.chain, gas_price, now_ms);
    let gas_cost_usd = cfg.gas_cost_usd(target.chain, gas_price);

    let risk = cfg.risk_config(target.chain);
    let ctx = ScanContext {
        gas_cost_usd,
        slippage_reserve_fraction: cfg.slippage_tolerance,
        flash_fee_fraction: rust_decimal::Decimal::new(5, 4),
        flash_loan_min_notional: rust_decimal::Decimal::from(1_000),
        quote_ttl_ms: target.chain.scan_cadence().as_millis() as u64 * 3,
        trend_bucket_ms: 1_000,
        now_ms,
        risk: &risk,
    };

    let prior_trends = live_map.snapshot().await.into_iter().map(|o| (o.id, o.trend)).collect();

    let reference_notional = rust_decimal::Decimal::from(10_000);
    let mut candidates = scan_tick(&target.pair, target.chain, &quotes, reference_notional, &ctx, &prior_trends);
    rank(&mut candidates);

    let admission_cfg = cfg.admission_config(target.chain);
    let armed = kv.is_auto_execute_armed().await.unwrap_or(false);

    for opp in candidates {
        live_map.upsert(opp.clone()).await;
        if let Err(e) = repo.insert_opportunity_revision(&opp, now_ms).await {
            error!(error = %e, "failed to persist opportunity revision");
        }
        feed.opportunity_upsert(opp.clone());

        let last_attempt = cooldowns.read().await.get(&target.pair_id).copied();
        let admission = check_admission(&opp, gas_price, &admission_cfg, last_attempt, now_ms);
        if admission != Admission::Admitted {
            continue;
        }
        if !armed || cfg.dry_run_mode {
            continue;
        }

        cooldowns.write().await.insert(target.pair_id.clone(), now_ms);

        let Some(provider) = select_provider(&target.providers, opp.reference_notional) else {
            warn!(pair_id = %target.pair_id, "no flash-loan provider has enough liquidity; skipping");
            continue;
        };

        let buy_adapter = GenericAdapter::new(opp.buy_venue.clone());
        let sell_adapter = GenericAdapter::new(opp.sell_venue.clone());
        let min_out = opp.reference_notional * (rust_decimal::Decimal::ONE - cfg.slippage_tolerance);
        let buy_call = buy_adapter.build_swap(&opp.buy_venue.name.0, opp.reference_notional, min_out);
        let sell_call = sell_adapter.build_swap(&opp.sell_venue.name.0, opp.reference_notional, opp.reference_notional);

        let plan = match assemble_and_simulate(client.as_ref(), provider, buy_call, sell_call, opp.reference_notional, cfg.min_profit_usd).await {
            Ok(p) => p,
            Err(e) => {
                warn!(pair_id = %target.pair_id, error = %e, "plan simulation rejected");
                continue;
            }
        };

        let mut execution = Execution::new(format!("{}-{}", opp.id, now_ms), opp.id.clone(), target.chain, now_ms);
        execution.transition(core_model::ExecutionStatus::Planned, now_ms);
        execution.transition(core_model::ExecutionStatus::Simulated, now_ms);
        execution.plan = Some(plan.clone());
        if let Err(e) = repo.insert_execution(&execution).await {
            error!(error = %e, "failed to persist execution");
        }
        feed.execution_transition(execution.clone());
        cache.invalidate_on_execution_transition();

        let pending = executor::PendingExecution { execution, plan, signer: "default".to_string(), base_gas_price: gas_price };
        if executor.dispatch(target.chain, &target.pair_id, pending).await.is_err() {
            error!(pair_id = %target.pair_id, "executor queue full or worker unavailable; dropping execution");
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_scan_loop(
    target: ScanTarget,
    client: Arc<JsonRpcChainClient>,
    cfg: Arc<AppConfig>,
    live_map: LiveOpportunityMap,
    repo: Arc<Repository>,
    cache: Arc<LiveViewCache>,
    kv: Arc<KvStore>,
    feed: Arc<EventFeed>,
    executor: Arc<Router>,
) {
    tokio::spawn(async move {
        let cooldowns = RwLock::new(HashMap::new());
        let mut ticker = tokio::time::interval(target.chain.scan_cadence());
        loop {
            ticker.tick().await;
            run_scan_tick(&target, &client, cfg.as_ref(), &live_map, repo.as_ref(), cache.as_ref(), kv.as_ref(), feed.as_ref(), executor.as_ref(), &cooldowns).await;
        }
    });
}

fn spawn_retention_sweeper(pool: sqlx::SqlitePool, policy: store::RetentionPolicy) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(300));
        loop {
            ticker.tick().await;
            if let Err(e) = store::sweep(&pool, &policy, common::now_ms()).await {
                error!(error = %e, "retention sweep failed");
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqlx::any::install_default_drivers();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    common::init_tracing(is_production);

    let cfg = AppConfig::from_env();
    if let Err(e) = cfg.validate() {
        error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }
    info!("configuration loaded and validated");

    let pool = match connect_store(&cfg).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "failed to connect to store or run migrations");
            std::process::exit(2);
        }
    };

    let startup_repo = Repository::new(pool.clone());
    match startup_repo.non_terminal_executions().await {
        Ok(stuck) if !stuck.is_empty() => {
            error!(count = stuck.len(), "unreconciled non-terminal executions from a prior run; refusing to start until an operator resolves them");
            std::process::exit(4);
        }
        Err(e) => {
            error!(error = %e, "failed to check for unreconciled executions");
            std::process::exit(2);
        }
        _ => {}
    }

    let clients = build_chain_clients(&cfg).await;
    if clients.is_empty() {
        error!("no chain endpoint responded to the startup health probe");
        std::process::exit(3);
    }

    let repo = Arc::new(Repository::new(pool.clone()));
    let kv = Arc::new(KvStore::new(pool.clone()));
    let cache = Arc::new(LiveViewCache::new(cfg.live_view_ttl));
    let live_map = LiveOpportunityMap::new();
    let feed = EventFeed::new(1_024);

    kv.set_bot_running(true).await.ok();

    let signer = Arc::new(UnwiredSigner);
    let dyn_clients: HashMap<ChainId, Arc<dyn ChainClient>> = clients.iter().map(|(c, cl)| (*c, cl.clone() as Arc<dyn ChainClient>)).collect();
    let submitter = Arc::new(MultiChainSubmitter::new(dyn_clients, signer));
    let executor_cfg = executor::ExecutorConfig { execution_deadline: cfg.execution_deadline, max_replacements: cfg.max_replacements, gas_bump_factor: cfg.gas_bump_factor };
    let executor = Arc::new(executor::ExecutorRouter::new(submitter, executor_cfg, cfg.global_execution_concurrency, cfg.executor_queue_capacity));

    let pools_path = std::env::var("POOLS_CONFIG_PATH").unwrap_or_else(|_| "pools.json".to_string());
    let pool_configs = pools::load(&pools_path);
    let targets = group_pools_into_targets(pool_configs, &clients);
    if targets.is_empty() {
        warn!("no scan targets configured; the engine is up but will never emit opportunities");
    }

    let cfg = Arc::new(cfg);
    for target in targets {
        let Some(client) = clients.get(&target.chain).cloned() else { continue };
        spawn_scan_loop(target, client, cfg.clone(), live_map.clone(), repo.clone(), cache.clone(), kv.clone(), feed.clone(), executor.clone());
    }

    spawn_retention_sweeper(pool.clone(), cfg.retention.clone());

    info!("arbengine started; waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    kv.set_bot_running(false).await.ok();
    info!("shutdown signal received");

    Ok(())
}
