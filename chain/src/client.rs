use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::RpcError;
use crate::pool::ChainClientPool;
use core_model::ChainId;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallRequest {
    pub to: String,
    pub data: String,
    pub value: Option<Decimal>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub tx_hash: String,
    pub status: bool,
    pub gas_used: u64,
    pub logs: Vec<LogEntry>,
}

/// Typed view over the RPC surface every venue adapter and the planner and
/// executor rely on (§4.A). Kept as a trait so the planner's simulation path
/// and the executor's submission path can both be exercised against an
/// in-memory fake in tests without a live endpoint.
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn chain(&self) -> ChainId;
    async fn block_number(&self) -> Result<u64, RpcError>;
    async fn gas_price(&self) -> Result<Decimal, RpcError>;
    async fn call(&self, req: &CallRequest) -> Result<String, RpcError>;
    async fn estimate_gas(&self, req: &CallRequest) -> Result<u64, RpcError>;
    async fn send_raw_transaction(&self, signed_tx_hex: &str) -> Result<String, RpcError>;
    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<TransactionReceipt>, RpcError>;
    async fn get_logs(&self, address: &str, from_block: u64, to_block: u64) -> Result<Vec<LogEntry>, RpcError>;
    /// Batches independent read calls into one multicall-style round trip.
    async fn multicall(&self, reqs: &[CallRequest]) -> Result<Vec<String>, RpcError>;
}

pub struct JsonRpcChainClient {
    pool: ChainClientPool,
}

impl JsonRpcChainClient {
    pub fn new(pool: ChainClientPool) -> Self {
        Self { pool }
    }
}

fn hex_to_u64(hex: &str) -> Result<u64, RpcError> {
    u64::from_str_radix(hex.trim_start_matches("0x"), 16)
        .map_err(|e| RpcError::MalformedResponse(e.to_string()))
}

fn hex_to_decimal_wei(hex: &str) -> Result<Decimal, RpcError> {
    let wei = u128::from_str_radix(hex.trim_start_matches("0x"), 16)
        .map_err(|e| RpcError::MalformedResponse(e.to_string()))?;
    Ok(Decimal::from(wei) / Decimal::from(1_000_000_000u64))
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    fn chain(&self) -> ChainId {
        self.pool.chain()
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        let v = self
            .pool
            .call_with_retry("eth_blockNumber", |t| async move { t.call("eth_blockNumber", json!([])).await })
            .await?;
        let hex = v.as_str().ok_or_else(|| RpcError::MalformedResponse("blockNumber not a string".into()))?;
        hex_to_u64(hex)
    }

    async fn gas_price(&self) -> Result<Decimal, RpcError> {
        let v = self
            .pool
            .call_with_retry("eth_gasPrice", |t| async move { t.call("eth_gasPrice", json!([])).await })
            .await?;
        let hex = v.as_str().ok_or_else(|| RpcError::MalformedResponse("gasPrice not a string".into()))?;
        let sampled = hex_to_decimal_wei(hex)?;
        Ok(self.pool.record_gas_sample(sampled))
    }

    async fn call(&self, req: &CallRequest) -> Result<String, RpcError> {
        let params = json!([{ "to": req.to, "data": req.data }, "latest"]);
        let v = self
            .pool
            .call_with_retry("eth_call", move |t| {
                let params = params.clone();
                async move { t.call("eth_call", params).await }
            })
            .await?;
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcError::MalformedResponse("eth_call result not a string".into()))
    }

    async fn estimate_gas(&self, req: &CallRequest) -> Result<u64, RpcError> {
        let params = json!([{ "to": req.to, "data": req.data }]);
        let v = self
            .pool
            .call_with_retry("eth_estimateGas", move |t| {
                let params = params.clone();
                async move { t.call("eth_estimateGas", params).await }
            })
            .await?;
        let hex = v.as_str().ok_or_else(|| RpcError::MalformedResponse("estimateGas not a string".into()))?;
        hex_to_u64(hex)
    }

    async fn send_raw_transaction(&self, signed_tx_hex: &str) -> Result<String, RpcError> {
        let params = json!([signed_tx_hex]);
        let v = self
            .pool
            .call_with_retry("eth_sendRawTransaction", move |t| {
                let params = params.clone();
                async move { t.call("eth_sendRawTransaction", params).await }
            })
            .await?;
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcError::MalformedResponse("sendRawTransaction result not a string".into()))
    }

    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<TransactionReceipt>, RpcError> {
        let params = json!([tx_hash]);
        let v = self
            .pool
            .call_with_retry("eth_getTransactionReceipt", move |t| {
                let params = params.clone();
                async move { t.call("eth_getTransactionReceipt", params).await }
            })
            .await?;
        if v.is_null() {
            return Ok(None);
        }
        parse_receipt(&v).map(Some)
    }

    async fn get_logs(&self, address: &str, from_block: u64, to_block: u64) -> Result<Vec<LogEntry>, RpcError> {
        let params = json!([{
            "address": address,
            "fromBlock": format!("0x{:x}", from_block),
            "toBlock": format!("0x{:x}", to_block),
        }]);
        let v = self
            .pool
            .call_with_retry("eth_getLogs", move |t| {
                let params = params.clone();
                async move { t.call("eth_getLogs", params).await }
            })
            .await?;
        parse_logs(&v)
    }

    async fn multicall(&self, reqs: &[CallRequest]) -> Result<Vec<String>, RpcError> {
        let mut results = Vec::with_capacity(reqs.len());
        for req in reqs {
            results.push(self.call(req).await?);
        }
        Ok(results)
    }
}

fn parse_logs(v: &Value) -> Result<Vec<LogEntry>, RpcError> {
    let arr = v.as_array().ok_or_else(|| RpcError::MalformedResponse("logs not an array".into()))?;
    arr.iter()
        .map(|entry| {
            let address = entry.get("address").and_then(Value::as_str).unwrap_or_default().to_string();
            let data = entry.get("data").and_then(Value::as_str).unwrap_or_default().to_string();
            let topics = entry
                .get("topics")
                .and_then(Value::as_array)
                .map(|t| t.iter().filter_map(|x| x.as_str().map(str::to_string)).collect())
                .unwrap_or_default();
            Ok(LogEntry { address, topics, data })
        })
        .collect()
}

fn parse_receipt(v: &Value) -> Result<TransactionReceipt, RpcError> {
    let tx_hash = v
        .get("transactionHash")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::MalformedResponse("receipt missing transactionHash".into()))?
        .to_string();
    let status_hex = v.get("status").and_then(Value::as_str).unwrap_or("0x1");
    let status = hex_to_u64(status_hex)? == 1;
    let gas_used = v
        .get("gasUsed")
        .and_then(Value::as_str)
        .map(hex_to_u64)
        .transpose()?
        .unwrap_or(0);
    let logs = v.get("logs").map(parse_logs).transpose()?.unwrap_or_default();

    Ok(TransactionReceipt { tx_hash, status, gas_used, logs })
}
