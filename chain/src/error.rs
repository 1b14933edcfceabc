use thiserror::Error;

/// Transport-level error taxonomy for RPC calls (§4.A/§7). The pool and
/// callers both branch on `is_retryable` rather than matching variants
/// directly, so adding a new failure mode never silently changes retry
/// behavior at a call site that forgot to handle it.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("rate limited by endpoint")]
    RateLimited,

    #[error("no healthy endpoint available for this chain")]
    NoHealthyEndpoint,

    #[error("json-rpc error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    #[error("malformed json-rpc response: {0}")]
    MalformedResponse(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("nonce already used")]
    NonceTooLow,
}

impl RpcError {
    /// Whether the chain client pool should retry this call against a
    /// different endpoint rather than surfacing it to the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Http(_) | RpcError::Timeout(_) | RpcError::RateLimited | RpcError::NoHealthyEndpoint => true,
            RpcError::JsonRpc { .. } | RpcError::MalformedResponse(_) => true,
            RpcError::Reverted(_) | RpcError::NonceTooLow => false,
        }
    }
}
