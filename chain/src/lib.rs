pub mod client;
pub mod error;
pub mod gas;
pub mod health;
pub mod pool;
pub mod rate_limit;
pub mod transport;

pub use client::{CallRequest, ChainClient, JsonRpcChainClient, LogEntry, TransactionReceipt};
pub use error::RpcError;
pub use gas::GasPriceEma;
pub use health::{HealthState, HealthTracker};
pub use pool::ChainClientPool;
pub use rate_limit::TokenBucket;
pub use transport::JsonRpcTransport;
