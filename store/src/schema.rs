use sqlx::SqlitePool;

/// Creates the six time-series tables plus the key-value region (§4.G).
/// Idempotent: safe to call on every startup, the way `backend/src/db/
/// schema.rs::migrate` is invoked once per process before anything else
/// touches the pool.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS opportunities (
  id TEXT NOT NULL,
  revision_ts_ms INTEGER NOT NULL,
  chain TEXT NOT NULL,
  pair_id TEXT NOT NULL,
  net_profit TEXT NOT NULL,
  confidence INTEGER NOT NULL,
  risk_class TEXT NOT NULL,
  payload_json TEXT NOT NULL,
  PRIMARY KEY (id, revision_ts_ms)
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS executions (
  id TEXT PRIMARY KEY,
  opportunity_id TEXT NOT NULL,
  chain TEXT NOT NULL,
  status TEXT NOT NULL,
  realized_profit TEXT,
  started_at_ms INTEGER NOT NULL,
  ended_at_ms INTEGER,
  payload_json TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS stats_snapshots (
  ts_ms INTEGER PRIMARY KEY,
  downsampled INTEGER NOT NULL DEFAULT 0,
  pnl_total TEXT NOT NULL,
  pnl_today TEXT NOT NULL,
  win_rate REAL NOT NULL,
  avg_profit TEXT NOT NULL,
  sharpe REAL NOT NULL,
  max_drawdown TEXT NOT NULL,
  active_capital TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS gas_samples (
  ts_ms INTEGER NOT NULL,
  chain TEXT NOT NULL,
  downsampled INTEGER NOT NULL DEFAULT 0,
  gas_price TEXT NOT NULL,
  PRIMARY KEY (ts_ms, chain, downsampled)
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS chain_metrics (
  ts_ms INTEGER NOT NULL,
  chain TEXT NOT NULL,
  downsampled INTEGER NOT NULL DEFAULT 0,
  healthy_endpoint_count INTEGER NOT NULL,
  block_number INTEGER NOT NULL,
  PRIMARY KEY (ts_ms, chain, downsampled)
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS alerts (
  id TEXT PRIMARY KEY,
  ts_ms INTEGER NOT NULL,
  severity TEXT NOT NULL,
  message TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS kv_state (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_opportunities_pair ON opportunities(pair_id);"#).execute(pool).await?;
    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_executions_opportunity ON executions(opportunity_id);"#).execute(pool).await?;
    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_gas_samples_chain ON gas_samples(chain);"#).execute(pool).await?;
    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_chain_metrics_chain ON chain_metrics(chain);"#).execute(pool).await?;

    Ok(())
}
