use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::warn;

use crate::error::RpcError;
use crate::gas::GasPriceEma;
use crate::health::{HealthState, HealthTracker};
use crate::rate_limit::TokenBucket;
use crate::transport::JsonRpcTransport;
use core_model::ChainId;

struct Endpoint {
    transport: JsonRpcTransport,
    health: Mutex<HealthTracker>,
    limiter: Mutex<TokenBucket>,
}

/// Multiplexes several RPC endpoints for one chain (§4.A). Selection is
/// round-robin over endpoints that are not `Down`, skipping any that are
/// currently rate-limited; a call's result feeds back into the chosen
/// endpoint's health tracker.
pub struct ChainClientPool {
    chain: ChainId,
    endpoints: Vec<Arc<Endpoint>>,
    next: AtomicUsize,
    gas_ema: Mutex<GasPriceEma>,
}

impl ChainClientPool {
    pub fn new(chain: ChainId, endpoint_urls: &[String], rpc_timeout: Duration) -> Result<Self, RpcError> {
        let endpoints = endpoint_urls
            .iter()
            .map(|url| {
                Ok(Arc::new(Endpoint {
                    transport: JsonRpcTransport::new(url.clone(), rpc_timeout)?,
                    health: Mutex::new(HealthTracker::default()),
                    limiter: Mutex::new(TokenBucket::new(20, 10)),
                }))
            })
            .collect::<Result<Vec<_>, RpcError>>()?;

        Ok(Self {
            chain,
            endpoints,
            next: AtomicUsize::new(0),
            gas_ema: Mutex::new(GasPriceEma::new(5)),
        })
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn healthy_endpoint_count(&self) -> usize {
        self.endpoints
            .iter()
            .filter(|e| e.health.lock().state() != HealthState::Down)
            .count()
    }

    fn candidates(&self) -> Vec<Arc<Endpoint>> {
        let n = self.endpoints.len();
        if n == 0 {
            return Vec::new();
        }
        let start = self.next.fetch_add(1, Ordering::Relaxed) % n;
        (0..n)
            .map(|i| self.endpoints[(start + i) % n].clone())
            .filter(|e| e.health.lock().state() != HealthState::Down)
            .collect()
    }

    /// Runs `f` against endpoints in rotation until one succeeds or every
    /// healthy endpoint has been tried and failed with a retryable error.
    pub async fn call_with_retry<F, Fut, T>(&self, method: &str, f: F) -> Result<T, RpcError>
    where
        F: Fn(JsonRpcTransport) -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Err(RpcError::NoHealthyEndpoint);
        }

        let mut last_err = RpcError::NoHealthyEndpoint;
        for endpoint in candidates {
            if !endpoint.limiter.lock().try_take() {
                continue;
            }

            match f(endpoint.transport.clone()).await {
                Ok(v) => {
                    endpoint.health.lock().record_success();
                    return Ok(v);
                }
                Err(e) => {
                    endpoint.health.lock().record_failure();
                    warn!(chain = ?self.chain, method, endpoint = endpoint.transport.url(), error = %e, "rpc call failed");
                    let retryable = e.is_retryable();
                    last_err = e;
                    if !retryable {
                        return Err(last_err);
                    }
                }
            }
        }

        Err(last_err)
    }

    pub fn record_gas_sample(&self, price: Decimal) -> Decimal {
        self.gas_ema.lock().sample(price)
    }

    pub fn current_gas_price(&self) -> Option<Decimal> {
        self.gas_ema.lock().current()
    }
}
