use std::collections::HashSet;

use serde_json::Value;
use store::KvStore;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unrecognized configuration key: {0}")]
    UnknownKey(String),
    #[error("configuration document must be a JSON object")]
    NotAnObject,
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// `GET /config` / `PUT /config` (§6). Validation here is limited to the
/// shape every config surface in the corpus already rejects at startup —
/// unrecognized keys — the same role `backend/src/config.rs` plays for
/// `AppConfig::from_env`, exposed at runtime instead of only at process
/// start. `cli::AppConfig::validate` still governs range/type checks at
/// boot; this guards the live document the API hands out and accepts back.
pub struct ConfigSchema {
    allowed_keys: HashSet<&'static str>,
}

impl ConfigSchema {
    pub fn new(allowed_keys: &[&'static str]) -> Self {
        Self { allowed_keys: allowed_keys.iter().copied().collect() }
    }

    fn validate(&self, doc: &Value) -> Result<(), ConfigError> {
        let obj = doc.as_object().ok_or(ConfigError::NotAnObject)?;
        for key in obj.keys() {
            if !self.allowed_keys.contains(key.as_str()) {
                return Err(ConfigError::UnknownKey(key.clone()));
            }
        }
        Ok(())
    }
}

/// `GET /config`: the stored document if one has ever been written, else
/// `fallback` (the process's startup defaults).
pub async fn get_config(kv: &KvStore, fallback: &Value) -> Result<Value, ConfigError> {
    match kv.get_config_document().await? {
        Some(json) => Ok(serde_json::from_str(&json).unwrap_or_else(|_| fallback.clone())),
        None => Ok(fallback.clone()),
    }
}

/// Replaces the active config document, rejecting any key not in `schema`,
/// and stamps a new revision id derived from `now_ms` so readers can tell a
/// document changed without diffing it.
pub async fn put_config(kv: &KvStore, schema: &ConfigSchema, doc: Value, now_ms: u64) -> Result<String, ConfigError> {
    schema.validate(&doc)?;
    let revision = now_ms.to_string();
    kv.set_config_document(&doc.to_string()).await?;
    kv.set_config_revision(&revision).await?;
    Ok(revision)
}
