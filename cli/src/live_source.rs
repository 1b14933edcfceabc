use std::sync::Arc;

use async_trait::async_trait;

use chain::{CallRequest, ChainClient};
use core_model::Quote;
use scanner::{QuoteSource, ScanError};
use venues::{PoolState, QuoteCache, VenueAdapter};

/// Bridges one on-chain pool to the scanner's `QuoteSource` trait (§4.C step
/// 1-2): fetch the pool's reserves, decode into the pricing model's
/// `PoolState`, hand it to the venue adapter to quote. Decoding here covers
/// `ConstantProductV2` only — the reserve pair packed as two left-padded
/// 32-byte words, the same `getReserves()` ABI shape every constant-product
/// AMM on every chain in §3 exposes. `cache` holds the quote at the block it
/// was produced (§4.B, TTL = one block), checked before any reserve read.
pub struct ChainPoolQuoteSource<C: ChainClient> {
    pub client: Arc<C>,
    pub adapter: Arc<dyn VenueAdapter>,
    pub pool_address: String,
    pub fee_bps: u32,
    pub cache: Arc<QuoteCache>,
}

fn decode_two_reserves(hex: &str) -> Result<(u128, u128), ScanError> {
    let hex = hex.trim_start_matches("0x");
    if hex.len() < 128 {
        return Err(ScanError::Venue("getReserves response too short".into()));
    }
    let reserve0 = u128::from_str_radix(&hex[32..64], 16).map_err(|e| ScanError::Venue(e.to_string()))?;
    let reserve1 = u128::from_str_radix(&hex[96..128], 16).map_err(|e| ScanError::Venue(e.to_string()))?;
    Ok((reserve0, reserve1))
}

#[async_trait]
impl<C: ChainClient> QuoteSource for ChainPoolQuoteSource<C> {
    async fn sample(&self) -> Result<Quote, ScanError> {
        let block = self.client.block_number().await.map_err(|e| ScanError::Venue(e.to_string()))?;
        if let Some(cached) = self.cache.get(&self.pool_address, block) {
            return Ok(cached);
        }

        let req = CallRequest { to: self.pool_address.clone(), data: "0x0902f1ac".to_string(), value: None };
        let raw = self.client.call(&req).await.map_err(|e| ScanError::Venue(e.to_string()))?;
        let (reserve0, reserve1) = decode_two_reserves(&raw)?;
        let pool = PoolState::ConstantProductV2 { reserve0, reserve1, fee_bps: self.fee_bps };

        let now_ms = common::now_ms();
        let quote = self.adapter.quote_pair(&pool, block, now_ms).map_err(|e| ScanError::Venue(e.to_string()))?;
        self.cache.insert(self.pool_address.clone(), block, quote.clone());
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chain::{LogEntry, RpcError, TransactionReceipt};
    use core_model::{ChainId, PricingModel, Venue};
    use venues::GenericAdapter;

    struct FakeClient {
        reserves_hex: String,
    }

    #[async_trait]
    impl ChainClient for FakeClient {
        fn chain(&self) -> ChainId {
            ChainId::Polygon
        }
        async fn block_number(&self) -> Result<u64, RpcError> {
            Ok(100)
        }
        async fn gas_price(&self) -> Result<rust_decimal::Decimal, RpcError> {
            unimplemented!()
        }
        async fn call(&self, _req: &CallRequest) -> Result<String, RpcError> {
            Ok(self.reserves_hex.clone())
        }
        async fn estimate_gas(&self, _req: &CallRequest) -> Result<u64, RpcError> {
            unimplemented!()
        }
        async fn send_raw_transaction(&self, _signed_tx_hex: &str) -> Result<String, RpcError> {
            unimplemented!()
        }
        async fn get_transaction_receipt(&self, _tx_hash: &str) -> Result<Option<TransactionReceipt>, RpcError> {
            unimplemented!()
        }
        async fn get_logs(&self, _address: &str, _from: u64, _to: u64) -> Result<Vec<LogEntry>, RpcError> {
            unimplemented!()
        }
        async fn multicall(&self, _reqs: &[CallRequest]) -> Result<Vec<String>, RpcError> {
            unimplemented!()
        }
    }

    fn reserves_hex(reserve0: u128, reserve1: u128) -> String {
        format!("0x{:064x}{:064x}{:032x}", reserve0, reserve1, 0u128)
    }

    #[tokio::test]
    async fn decodes_reserves_and_produces_a_quote() {
        let client = Arc::new(FakeClient { reserves_hex: reserves_hex(1_000_000, 1_000_000) });
        let adapter: Arc<dyn VenueAdapter> = Arc::new(GenericAdapter::new(Venue::new(ChainId::Polygon, "TestAmm", PricingModel::ConstantProductV2)));
        let source = ChainPoolQuoteSource { client, adapter, pool_address: "0xpool".into(), fee_bps: 30, cache: Arc::new(QuoteCache::new(16)) };

        let quote = source.sample().await.unwrap();
        assert!(quote.mid_price > rust_decimal::Decimal::ZERO);
    }

    #[tokio::test]
    async fn malformed_response_is_rejected() {
        let client = Arc::new(FakeClient { reserves_hex: "0x1234".into() });
        let adapter: Arc<dyn VenueAdapter> = Arc::new(GenericAdapter::new(Venue::new(ChainId::Polygon, "TestAmm", PricingModel::ConstantProductV2)));
        let source = ChainPoolQuoteSource { client, adapter, pool_address: "0xpool".into(), fee_bps: 30, cache: Arc::new(QuoteCache::new(16)) };

        assert!(source.sample().await.is_err());
    }

    #[tokio::test]
    async fn repeated_sample_within_the_same_block_hits_the_cache() {
        struct CountingClient {
            inner: FakeClient,
            calls: std::sync::atomic::AtomicU32,
        }

        #[async_trait]
        impl ChainClient for CountingClient {
            fn chain(&self) -> ChainId {
                self.inner.chain()
            }
            async fn block_number(&self) -> Result<u64, RpcError> {
                self.inner.block_number().await
            }
            async fn gas_price(&self) -> Result<rust_decimal::Decimal, RpcError> {
                unimplemented!()
            }
            async fn call(&self, req: &CallRequest) -> Result<String, RpcError> {
                self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                self.inner.call(req).await
            }
            async fn estimate_gas(&self, _req: &CallRequest) -> Result<u64, RpcError> {
                unimplemented!()
            }
            async fn send_raw_transaction(&self, _signed_tx_hex: &str) -> Result<String, RpcError> {
                unimplemented!()
            }
            async fn get_transaction_receipt(&self, _tx_hash: &str) -> Result<Option<TransactionReceipt>, RpcError> {
                unimplemented!()
            }
            async fn get_logs(&self, _address: &str, _from: u64, _to: u64) -> Result<Vec<LogEntry>, RpcError> {
                unimplemented!()
            }
            async fn multicall(&self, _reqs: &[CallRequest]) -> Result<Vec<String>, RpcError> {
                unimplemented!()
            }
        }

        let client = Arc::new(CountingClient {
            inner: FakeClient { reserves_hex: reserves_hex(1_000_000, 1_000_000) },
            calls: std::sync::atomic::AtomicU32::new(0),
        });
        let adapter: Arc<dyn VenueAdapter> = Arc::new(GenericAdapter::new(Venue::new(ChainId::Polygon, "TestAmm", PricingModel::ConstantProductV2)));
        let source = ChainPoolQuoteSource { client: client.clone(), adapter, pool_address: "0xpool".into(), fee_bps: 30, cache: Arc::new(QuoteCache::new(16)) };

        source.sample().await.unwrap();
        source.sample().await.unwrap();

        assert_eq!(client.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
