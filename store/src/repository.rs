use sqlx::{Row, SqlitePool};

use core_model::{ChainId, Execution, Opportunity, RiskClass};

use crate::models::{Alert, AlertSeverity, ChainMetric, GasSample, StatsSnapshot};

fn chain_to_str(chain: ChainId) -> &'static str {
    match chain {
        ChainId::Ethereum => "Ethereum",
        ChainId::Polygon => "Polygon",
        ChainId::Arbitrum => "Arbitrum",
        ChainId::Bsc => "Bsc",
        ChainId::Avalanche => "Avalanche",
        ChainId::Base => "Base",
    }
}

fn chain_from_str(s: &str) -> Option<ChainId> {
    ChainId::ALL.iter().copied().find(|c| chain_to_str(*c) == s)
}

fn risk_to_str(risk: RiskClass) -> &'static str {
    match risk {
        RiskClass::Low => "Low",
        RiskClass::Medium => "Medium",
        RiskClass::High => "High",
    }
}

/// Durable persistence for the six time-series (§4.G), keyed as
/// `(chain, pair_id)` for opportunities and `id` for everything else.
/// Row mapping follows `session/src/store/sqlite_store.rs`'s shape:
/// typed columns for what's queried, a JSON blob for the rest.
pub struct Repository {
    pool: SqlitePool,
}

#[derive(Clone, Debug, Default)]
pub struct OpportunityFilter {
    pub chain: Option<ChainId>,
    pub min_profit: Option<rust_decimal::Decimal>,
    pub risk: Option<RiskClass>,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_opportunity_revision(&self, opp: &Opportunity, revision_ts_ms: u64) -> Result<(), sqlx::Error> {
        let payload = serde_json::to_string(opp).expect("Opportunity always serializes");
        sqlx::query(
            "INSERT OR REPLACE INTO opportunities (id, revision_ts_ms, chain, pair_id, net_profit, confidence, risk_class, payload_json)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&opp.id)
        .bind(revision_ts_ms as i64)
        .bind(chain_to_str(opp.chain))
        .bind(opp.pair.id())
        .bind(opp.net_profit.to_string())
        .bind(opp.confidence as i64)
        .bind(risk_to_str(opp.risk_class))
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Latest revision of every opportunity matching `filter` (§4.H
    /// read-model snapshot).
    pub async fn query_opportunities(&self, filter: &OpportunityFilter) -> Result<Vec<Opportunity>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT o.payload_json FROM opportunities o
             INNER JOIN (SELECT id, MAX(revision_ts_ms) AS latest FROM opportunities GROUP BY id) m
             ON o.id = m.id AND o.revision_ts_ms = m.latest
             WHERE (?1 IS NULL OR o.chain = ?1)
               AND (?2 IS NULL OR CAST(o.net_profit AS REAL) >= ?2)
               AND (?3 IS NULL OR o.risk_class = ?3)",
        )
        .bind(filter.chain.map(chain_to_str))
        .bind(filter.min_profit.map(|d| d.to_string().parse::<f64>().unwrap_or(0.0)))
        .bind(filter.risk.map(risk_to_str))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let json: String = r.get("payload_json");
                serde_json::from_str(&json).ok()
            })
            .collect())
    }

    pub async fn insert_execution(&self, exec: &Execution) -> Result<(), sqlx::Error> {
        let payload = serde_json::to_string(exec).expect("Execution always serializes");
        sqlx::query(
            "INSERT INTO executions (id, opportunity_id, chain, status, realized_profit, started_at_ms, ended_at_ms, payload_json)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
               status = excluded.status,
               realized_profit = excluded.realized_profit,
               ended_at_ms = excluded.ended_at_ms,
               payload_json = excluded.payload_json",
        )
        .bind(&exec.id)
        .bind(&exec.opportunity_id)
        .bind(chain_to_str(exec.chain))
        .bind(format!("{:?}", exec.status))
        .bind(exec.realized_profit.map(|d| d.to_string()))
        .bind(exec.started_at_ms as i64)
        .bind(exec.ended_at_ms.map(|v| v as i64))
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Non-terminal executions left over from a prior process (§9 open
    /// question 2): the engine refuses to proceed while any of these exist
    /// rather than silently resuming or re-simulating them.
    pub async fn non_terminal_executions(&self) -> Result<Vec<Execution>, sqlx::Error> {
        let rows = sqlx::query("SELECT payload_json FROM executions WHERE status IN ('Simulated', 'Submitted', 'Pending')").fetch_all(&self.pool).await?;
        Ok(rows.into_iter().filter_map(|r| serde_json::from_str(&r.get::<String, _>("payload_json")).ok()).collect())
    }

    pub async fn get_execution(&self, id: &str) -> Result<Option<Execution>, sqlx::Error> {
        let row = sqlx::query("SELECT payload_json FROM executions WHERE id = ?").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.and_then(|r| serde_json::from_str(&r.get::<String, _>("payload_json")).ok()))
    }

    pub async fn insert_stats_snapshot(&self, s: &StatsSnapshot) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT OR REPLACE INTO stats_snapshots (ts_ms, downsampled, pnl_total, pnl_today, win_rate, avg_profit, sharpe, max_drawdown, active_capital)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(s.ts_ms as i64)
        .bind(s.downsampled as i64)
        .bind(s.pnl_total.to_string())
        .bind(s.pnl_today.to_string())
        .bind(s.win_rate)
        .bind(s.avg_profit.to_string())
        .bind(s.sharpe)
        .bind(s.max_drawdown.to_string())
        .bind(s.active_capital.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn latest_stats_snapshot(&self) -> Result<Option<StatsSnapshot>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM stats_snapshots ORDER BY ts_ms DESC LIMIT 1").fetch_optional(&self.pool).await?;
        Ok(row.map(|r| StatsSnapshot {
            ts_ms: r.get::<i64, _>("ts_ms") as u64,
            downsampled: r.get::<i64, _>("downsampled") != 0,
            pnl_total: r.get::<String, _>("pnl_total").parse().unwrap_or_default(),
            pnl_today: r.get::<String, _>("pnl_today").parse().unwrap_or_default(),
            win_rate: r.get("win_rate"),
            avg_profit: r.get::<String, _>("avg_profit").parse().unwrap_or_default(),
            sharpe: r.get("sharpe"),
            max_drawdown: r.get::<String, _>("max_drawdown").parse().unwrap_or_default(),
            active_capital: r.get::<String, _>("active_capital").parse().unwrap_or_default(),
        }))
    }

    pub async fn insert_gas_sample(&self, s: &GasSample) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR REPLACE INTO gas_samples (ts_ms, chain, downsampled, gas_price) VALUES (?, ?, ?, ?)")
            .bind(s.ts_ms as i64)
            .bind(chain_to_str(s.chain))
            .bind(s.downsampled as i64)
            .bind(s.gas_price.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_chain_metric(&self, m: &ChainMetric) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR REPLACE INTO chain_metrics (ts_ms, chain, downsampled, healthy_endpoint_count, block_number) VALUES (?, ?, ?, ?, ?)")
            .bind(m.ts_ms as i64)
            .bind(chain_to_str(m.chain))
            .bind(m.downsampled as i64)
            .bind(m.healthy_endpoint_count as i64)
            .bind(m.block_number as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn latest_chain_metric(&self, chain: ChainId) -> Result<Option<ChainMetric>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM chain_metrics WHERE chain = ? ORDER BY ts_ms DESC LIMIT 1")
            .bind(chain_to_str(chain))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| ChainMetric {
            ts_ms: r.get::<i64, _>("ts_ms") as u64,
            chain: chain_from_str(&r.get::<String, _>("chain")).unwrap_or(chain),
            downsampled: r.get::<i64, _>("downsampled") != 0,
            healthy_endpoint_count: r.get::<i64, _>("healthy_endpoint_count") as u32,
            block_number: r.get::<i64, _>("block_number") as u64,
        }))
    }

    pub async fn insert_alert(&self, a: &Alert) -> Result<(), sqlx::Error> {
        let severity = match a.severity {
            AlertSeverity::Info => "Info",
            AlertSeverity::Warning => "Warning",
            AlertSeverity::Critical => "Critical",
        };
        sqlx::query("INSERT OR REPLACE INTO alerts (id, ts_ms, severity, message) VALUES (?, ?, ?, ?)")
            .bind(&a.id)
            .bind(a.ts_ms as i64)
            .bind(severity)
            .bind(&a.message)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn recent_alerts(&self, limit: i64) -> Result<Vec<Alert>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM alerts ORDER BY ts_ms DESC LIMIT ?").bind(limit).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| {
                let severity = match r.get::<String, _>("severity").as_str() {
                    "Warning" => AlertSeverity::Warning,
                    "Critical" => AlertSeverity::Critical,
                    _ => AlertSeverity::Info,
                };
                Alert { id: r.get("id"), ts_ms: r.get::<i64, _>("ts_ms") as u64, severity, message: r.get("message") }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::migrate;
    use core_model::{ExecutionStatus, PricingModel, Token, TokenPair, Venue};
    use rust_decimal_macros::dec;

    async fn repo() -> Repository {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        migrate(&pool).await.unwrap();
        Repository::new(pool)
    }

    fn opp(id: &str, chain: ChainId, net_profit: rust_decimal::Decimal, risk: RiskClass) -> Opportunity {
        let venue = Venue::new(chain, "V", PricingModel::ConstantProductV2);
        Opportunity {
            id: id.into(),
            pair: TokenPair::new(Token::new("0xa", 18, "MATIC"), Token::new("0xb", 18, "USDT")),
            chain,
            buy_venue: venue.clone(),
            buy_price: dec!(1),
            sell_venue: venue,
            sell_price: dec!(1),
            gross_spread_bps: dec!(10),
            reference_notional: dec!(1000),
            gross_profit: dec!(50),
            gas_cost_usd: dec!(5),
            slippage_reserve: dec!(2),
            flash_fee: dec!(0),
            net_profit,
            confidence: 80,
            risk_class: risk,
            flash_loan_eligible: true,
            trend: core_model::opportunity::TrendSample::new(1),
            volatility: 0.01,
            market_impact: 0.01,
            freshness_ms: 0,
        }
    }

    #[tokio::test]
    async fn insert_and_query_latest_revision_only() {
        let repo = repo().await;
        let mut o = opp("o1", ChainId::Polygon, dec!(10), RiskClass::Low);
        repo.insert_opportunity_revision(&o, 1_000).await.unwrap();
        o.net_profit = dec!(20);
        repo.insert_opportunity_revision(&o, 2_000).await.unwrap();

        let results = repo.query_opportunities(&OpportunityFilter::default()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].net_profit, dec!(20));
    }

    #[tokio::test]
    async fn filters_by_chain_and_min_profit() {
        let repo = repo().await;
        repo.insert_opportunity_revision(&opp("o1", ChainId::Polygon, dec!(10), RiskClass::Low), 1_000).await.unwrap();
        repo.insert_opportunity_revision(&opp("o2", ChainId::Ethereum, dec!(100), RiskClass::Low), 1_000).await.unwrap();

        let filter = OpportunityFilter { chain: Some(ChainId::Ethereum), min_profit: Some(dec!(50)), risk: None };
        let results = repo.query_opportunities(&filter).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "o2");
    }

    #[tokio::test]
    async fn non_terminal_executions_excludes_confirmed_and_new() {
        let repo = repo().await;
        let mut pending = Execution::new("e1", "o1", ChainId::Polygon, 0);
        pending.transition(ExecutionStatus::Planned, 1);
        pending.transition(ExecutionStatus::Simulated, 1);
        pending.transition(ExecutionStatus::Submitted, 1);
        pending.transition(ExecutionStatus::Pending, 1);
        repo.insert_execution(&pending).await.unwrap();

        let fresh = Execution::new("e2", "o2", ChainId::Polygon, 0);
        repo.insert_execution(&fresh).await.unwrap();

        let mut done = Execution::new("e3", "o3", ChainId::Polygon, 0);
        done.transition(ExecutionStatus::Planned, 1);
        done.transition(ExecutionStatus::Simulated, 1);
        done.transition(ExecutionStatus::Submitted, 1);
        done.transition(ExecutionStatus::Pending, 1);
        done.transition(ExecutionStatus::Confirmed, 2);
        repo.insert_execution(&done).await.unwrap();

        let stuck = repo.non_terminal_executions().await.unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].id, "e1");
    }

    #[tokio::test]
    async fn execution_upsert_updates_status_in_place() {
        let repo = repo().await;
        let mut exec = Execution::new("e1", "o1", ChainId::Polygon, 0);
        repo.insert_execution(&exec).await.unwrap();
        exec.transition(ExecutionStatus::Planned, 1);
        repo.insert_execution(&exec).await.unwrap();

        let loaded = repo.get_execution("e1").await.unwrap().unwrap();
        assert_eq!(loaded.status, ExecutionStatus::Planned);
    }
}
