use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_model::{ChainId, Opportunity, RiskClass};
use store::{OpportunityFilter, Repository, StatsSnapshot};

/// Optional filters on `GET /opportunities` (§6). Mirrors `OpportunityFilter`
/// one-for-one; kept as a separate type so the read surface doesn't leak the
/// store's internal filter shape to callers.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OpportunityQuery {
    pub chain: Option<ChainId>,
    pub min_profit: Option<Decimal>,
    pub risk: Option<RiskClass>,
}

impl From<OpportunityQuery> for OpportunityFilter {
    fn from(q: OpportunityQuery) -> Self {
        OpportunityFilter { chain: q.chain, min_profit: q.min_profit, risk: q.risk }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PortfolioStats {
    pub pnl_total: Decimal,
    pub pnl_today: Decimal,
    pub win_rate: f64,
    pub avg_profit: Decimal,
    pub sharpe: f64,
    pub max_drawdown: Decimal,
    pub active_capital: Decimal,
}

impl From<StatsSnapshot> for PortfolioStats {
    fn from(s: StatsSnapshot) -> Self {
        Self {
            pnl_total: s.pnl_total,
            pnl_today: s.pnl_today,
            win_rate: s.win_rate,
            avg_profit: s.avg_profit,
            sharpe: s.sharpe,
            max_drawdown: s.max_drawdown,
            active_capital: s.active_capital,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ChainHealthView {
    pub chain: ChainId,
    pub healthy_endpoint_count: u32,
    pub block_number: u64,
    pub gas_price: Option<Decimal>,
}

/// `GET /opportunities`, reading through `cache` first and falling back to
/// `repo` on a miss, the way `backend/src/market_view` serves scheduler/
/// executor reads out of its in-memory snapshot rather than the database.
pub async fn list_opportunities(
    repo: &Repository,
    cache: &store::LiveViewCache,
    query: OpportunityQuery,
    now_ms: u64,
) -> Result<Vec<Opportunity>, sqlx::Error> {
    if query.chain.is_none() && query.min_profit.is_none() && query.risk.is_none() {
        if let Some(cached) = cache.get_opportunities(now_ms) {
            return Ok(cached);
        }
    }

    let filter: OpportunityFilter = query.clone().into();
    let results = repo.query_opportunities(&filter).await?;

    if query.chain.is_none() && query.min_profit.is_none() && query.risk.is_none() {
        cache.put_opportunities(results.clone(), now_ms);
    }
    Ok(results)
}

/// `GET /stats`.
pub async fn portfolio_stats(
    repo: &Repository,
    cache: &store::LiveViewCache,
    now_ms: u64,
) -> Result<Option<PortfolioStats>, sqlx::Error> {
    if let Some(cached) = cache.get_stats(now_ms) {
        return Ok(Some(cached.into()));
    }
    let snapshot = repo.latest_stats_snapshot().await?;
    if let Some(s) = &snapshot {
        cache.put_stats(s.clone(), now_ms);
    }
    Ok(snapshot.map(Into::into))
}

/// `GET /chains`: one entry per configured chain, combining the latest
/// durable `chain_metrics` row with the cached live gas price.
pub async fn chain_health(
    repo: &Repository,
    cache: &store::LiveViewCache,
    chains: &[ChainId],
    now_ms: u64,
) -> Result<Vec<ChainHealthView>, sqlx::Error> {
    let mut out = Vec::with_capacity(chains.len());
    for &chain in chains {
        let metric = repo.latest_chain_metric(chain).await?;
        let gas_price = cache.get_gas_price(chain, now_ms);
        out.push(ChainHealthView {
            chain,
            healthy_endpoint_count: metric.as_ref().map(|m| m.healthy_endpoint_count).unwrap_or(0),
            block_number: metric.as_ref().map(|m| m.block_number).unwrap_or(0),
            gas_price,
        });
    }
    Ok(out)
}
