use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Closed enumeration of supported chains (§3). New chains require a code
/// change, not configuration, since the static metadata below is load-bearing
/// for gas accounting and finality waits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainId {
    Ethereum,
    Polygon,
    Arbitrum,
    Bsc,
    Avalanche,
    Base,
}

impl ChainId {
    pub const ALL: [ChainId; 6] = [
        ChainId::Ethereum,
        ChainId::Polygon,
        ChainId::Arbitrum,
        ChainId::Bsc,
        ChainId::Avalanche,
        ChainId::Base,
    ];

    /// Static, hard-coded metadata. EIP-1559 support and finality depth feed
    /// directly into the gas model (§9 open question 1) and the execution
    /// engine's Confirmed transition.
    pub fn meta(self) -> ChainMeta {
        match self {
            ChainId::Ethereum => ChainMeta {
                gas_symbol: "ETH",
                block_time_hint: Duration::from_secs(12),
                finality_depth: 12,
                eip1559: true,
            },
            ChainId::Polygon => ChainMeta {
                gas_symbol: "MATIC",
                block_time_hint: Duration::from_millis(2_000),
                finality_depth: 128,
                eip1559: true,
            },
            ChainId::Arbitrum => ChainMeta {
                gas_symbol: "ETH",
                block_time_hint: Duration::from_millis(250),
                finality_depth: 20,
                eip1559: false,
            },
            ChainId::Bsc => ChainMeta {
                gas_symbol: "BNB",
                block_time_hint: Duration::from_secs(3),
                finality_depth: 15,
                eip1559: false,
            },
            ChainId::Avalanche => ChainMeta {
                gas_symbol: "AVAX",
                block_time_hint: Duration::from_millis(2_000),
                finality_depth: 1,
                eip1559: true,
            },
            ChainId::Base => ChainMeta {
                gas_symbol: "ETH",
                block_time_hint: Duration::from_millis(2_000),
                finality_depth: 12,
                eip1559: true,
            },
        }
    }

    /// Scanner cadence for this chain (§4.C: fast chains 0.5-2s, Ethereum 4-6s).
    pub fn scan_cadence(self) -> Duration {
        match self {
            ChainId::Ethereum => Duration::from_secs(5),
            _ => Duration::from_millis(1_000),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ChainMeta {
    pub gas_symbol: &'static str,
    pub block_time_hint: Duration,
    pub finality_depth: u64,
    pub eip1559: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_chains_have_distinct_metadata_entries() {
        for c in ChainId::ALL {
            let m = c.meta();
            assert!(m.finality_depth > 0);
        }
    }

    #[test]
    fn ethereum_is_slower_cadence_than_polygon() {
        assert!(ChainId::Ethereum.scan_cadence() > ChainId::Polygon.scan_cadence());
    }
}
