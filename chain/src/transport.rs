use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::RpcError;

/// JSON-RPC 2.0 client over a single HTTP endpoint. Deliberately thin: retry,
/// health tracking, and endpoint selection all live in `pool.rs` so this type
/// stays a pure wire-format adapter.
#[derive(Clone)]
pub struct JsonRpcTransport {
    http: reqwest::Client,
    url: String,
}

impl JsonRpcTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[instrument(skip(self, params), fields(method = %method), level = "debug")]
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { RpcError::Timeout(Duration::from_secs(0)) } else { RpcError::Http(e) })?
            .error_for_status()?;

        let envelope: Value = resp.json().await?;

        if let Some(err) = envelope.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(-1);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown json-rpc error")
                .to_string();
            return Err(RpcError::JsonRpc { code, message });
        }

        let result = envelope
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::MalformedResponse("missing result field".into()))?;

        debug!(method = %method, "rpc call succeeded");
        Ok(result)
    }
}
