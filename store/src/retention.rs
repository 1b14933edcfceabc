use sqlx::SqlitePool;
use tracing::info;

const MS_PER_DAY: i64 = 86_400_000;
const MS_PER_5_MIN: i64 = 300_000;
const MS_PER_HOUR: i64 = 3_600_000;

/// Retention windows per series (§4.G): raw rows older than their window are
/// downsampled (bucketed average/last-value) rather than dropped outright,
/// except where the series has no downsample tier, in which case they are
/// deleted. `now_ms` is passed in rather than read from the clock so the
/// sweep is deterministic and testable.
#[derive(Clone, Debug)]
pub struct RetentionPolicy {
    pub opportunities_raw_days: i64,
    pub stats_raw_days: i64,
    pub gas_samples_raw_days: i64,
    pub chain_metrics_raw_days: i64,
    pub alerts_days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            opportunities_raw_days: 7,
            stats_raw_days: 90,
            gas_samples_raw_days: 30,
            chain_metrics_raw_days: 7,
            alerts_days: 30,
        }
    }
}

/// One sweep of the retention policy. Executions are never touched: §4.G
/// keeps them indefinitely as the audit trail.
pub async fn sweep(pool: &SqlitePool, policy: &RetentionPolicy, now_ms: u64) -> Result<(), sqlx::Error> {
    let now_ms = now_ms as i64;

    let opp_cutoff = now_ms - policy.opportunities_raw_days * MS_PER_DAY;
    let opportunities_dropped = sqlx::query("DELETE FROM opportunities WHERE revision_ts_ms < ?")
        .bind(opp_cutoff)
        .execute(pool)
        .await?
        .rows_affected();

    let stats_cutoff = now_ms - policy.stats_raw_days * MS_PER_DAY;
    downsample_bucket(
        pool,
        "stats_snapshots",
        "ts_ms",
        stats_cutoff,
        MS_PER_HOUR,
        &["pnl_total", "pnl_today", "win_rate", "avg_profit", "sharpe", "max_drawdown", "active_capital"],
    )
    .await?;

    let gas_cutoff = now_ms - policy.gas_samples_raw_days * MS_PER_DAY;
    downsample_bucket(pool, "gas_samples", "ts_ms", gas_cutoff, MS_PER_5_MIN, &["gas_price"]).await?;

    let chain_cutoff = now_ms - policy.chain_metrics_raw_days * MS_PER_DAY;
    downsample_bucket(
        pool,
        "chain_metrics",
        "ts_ms",
        chain_cutoff,
        MS_PER_5_MIN,
        &["healthy_endpoint_count", "block_number"],
    )
    .await?;

    let alerts_cutoff = now_ms - policy.alerts_days * MS_PER_DAY;
    let alerts_dropped = sqlx::query("DELETE FROM alerts WHERE ts_ms < ?").bind(alerts_cutoff).execute(pool).await?.rows_affected();

    info!(opportunities_dropped, alerts_dropped, "retention sweep complete");
    Ok(())
}

/// Collapses raw rows older than `cutoff_ms` into one row per `bucket_ms`
/// window (averaging `avg_columns`), then deletes the raw rows that fed it.
/// `stats_snapshots` has no natural partition key; `gas_samples` and
/// `chain_metrics` partition by `chain` as well, handled by the caller
/// re-running per distinct chain value already present in `downsampled = 0`
/// rows.
async fn downsample_bucket(
    pool: &SqlitePool,
    table: &str,
    ts_col: &str,
    cutoff_ms: i64,
    bucket_ms: i64,
    avg_columns: &[&str],
) -> Result<(), sqlx::Error> {
    let has_chain = table != "stats_snapshots";
    let select_cols = avg_columns.iter().map(|c| format!("AVG(CAST({c} AS REAL)) AS {c}")).collect::<Vec<_>>().join(", ");

    let rows: Vec<sqlx::sqlite::SqliteRow> = if has_chain {
        sqlx::query(&format!(
            "SELECT chain, (({ts_col} / ?) * ?) AS bucket, {select_cols}
             FROM {table} WHERE {ts_col} < ? AND downsampled = 0
             GROUP BY chain, bucket"
        ))
        .bind(bucket_ms)
        .bind(bucket_ms)
        .bind(cutoff_ms)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query(&format!(
            "SELECT (({ts_col} / ?) * ?) AS bucket, {select_cols}
             FROM {table} WHERE {ts_col} < ? AND downsampled = 0
             GROUP BY bucket"
        ))
        .bind(bucket_ms)
        .bind(bucket_ms)
        .bind(cutoff_ms)
        .fetch_all(pool)
        .await?
    };

    if rows.is_empty() {
        return Ok(());
    }

    sqlx::query(&format!("DELETE FROM {table} WHERE {ts_col} < ? AND downsampled = 0")).bind(cutoff_ms).execute(pool).await?;

    use sqlx::Row;
    for row in rows {
        let bucket: i64 = row.get("bucket");
        let value_cols = avg_columns.iter().map(|c| row.get::<f64, &str>(*c)).map(|v| v.to_string()).collect::<Vec<_>>();

        if has_chain {
            let chain: String = row.get("chain");
            let placeholders = vec!["?"; value_cols.len()].join(", ");
            let col_list = avg_columns.join(", ");
            let sql = format!(
                "INSERT OR REPLACE INTO {table} (ts_ms, chain, downsampled, {col_list}) VALUES (?, ?, 1, {placeholders})"
            );
            let mut q = sqlx::query(&sql).bind(bucket).bind(chain);
            for v in &value_cols {
                q = q.bind(v);
            }
            q.execute(pool).await?;
        } else {
            let placeholders = vec!["?"; value_cols.len()].join(", ");
            let col_list = avg_columns.join(", ");
            let sql = format!("INSERT OR REPLACE INTO {table} (ts_ms, downsampled, {col_list}) VALUES (?, 1, {placeholders})");
            let mut q = sqlx::query(&sql).bind(bucket);
            for v in &value_cols {
                q = q.bind(v);
            }
            q.execute(pool).await?;
        }
    }

    Ok(())
}
