use sqlx::{Row, SqlitePool};

use core_model::ChainId;

/// The key-value region of the store: durable checkpoints that don't fit a
/// time series — nonce high-water marks, control flags, the active config
/// revision (§4.G). One row per key, last-write-wins.
pub struct KvStore {
    pool: SqlitePool,
}

fn nonce_key(chain: ChainId, signer: &str) -> String {
    format!("nonce:{:?}:{}", chain, signer)
}

const KEY_BOT_RUNNING: &str = "bot_running";
const KEY_AUTO_EXECUTE_ARMED: &str = "auto_execute_armed";
const KEY_CONFIG_REVISION: &str = "config_revision";
const KEY_CONFIG_DOCUMENT: &str = "config_document";

impl KvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT value FROM kv_state WHERE key = ?").bind(key).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO kv_state (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Last nonce known to have been durably checkpointed for `(chain,
    /// signer)`. `executor::NonceAllocator` seeds from this at startup rather
    /// than restarting every signer sequence at zero.
    pub async fn get_nonce_checkpoint(&self, chain: ChainId, signer: &str) -> Result<Option<u64>, sqlx::Error> {
        Ok(self.get(&nonce_key(chain, signer)).await?.and_then(|v| v.parse().ok()))
    }

    pub async fn set_nonce_checkpoint(&self, chain: ChainId, signer: &str, nonce: u64) -> Result<(), sqlx::Error> {
        self.set(&nonce_key(chain, signer), &nonce.to_string()).await
    }

    pub async fn is_bot_running(&self) -> Result<bool, sqlx::Error> {
        Ok(self.get(KEY_BOT_RUNNING).await?.as_deref() == Some("true"))
    }

    pub async fn set_bot_running(&self, running: bool) -> Result<(), sqlx::Error> {
        self.set(KEY_BOT_RUNNING, if running { "true" } else { "false" }).await
    }

    pub async fn is_auto_execute_armed(&self) -> Result<bool, sqlx::Error> {
        Ok(self.get(KEY_AUTO_EXECUTE_ARMED).await?.as_deref() == Some("true"))
    }

    pub async fn set_auto_execute_armed(&self, armed: bool) -> Result<(), sqlx::Error> {
        self.set(KEY_AUTO_EXECUTE_ARMED, if armed { "true" } else { "false" }).await
    }

    pub async fn config_revision(&self) -> Result<Option<String>, sqlx::Error> {
        self.get(KEY_CONFIG_REVISION).await
    }

    pub async fn set_config_revision(&self, revision: &str) -> Result<(), sqlx::Error> {
        self.set(KEY_CONFIG_REVISION, revision).await
    }

    pub async fn get_config_document(&self) -> Result<Option<String>, sqlx::Error> {
        self.get(KEY_CONFIG_DOCUMENT).await
    }

    pub async fn set_config_document(&self, json: &str) -> Result<(), sqlx::Error> {
        self.set(KEY_CONFIG_DOCUMENT, json).await
    }
}
