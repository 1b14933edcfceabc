use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

/// Opaque venue tag (UniswapV3, SushiSwap, QuickSwap, ...). Kept as a string
/// newtype rather than a closed enum because venues are configuration-pinned
/// per deployment, not a fixed set the engine needs to reason about by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueName(pub String);

impl VenueName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Display for VenueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pricing model class, fixed per §4.B. Determines which formula the venue
/// adapter applies when quoting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PricingModel {
    ConstantProductV2,
    ConcentratedV3,
    StableCurve,
    WeightedPool,
}

/// A venue is identified by (chain, name) and declares its pricing model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Venue {
    pub chain: ChainId,
    pub name: VenueName,
    pub model: PricingModel,
}

impl Venue {
    pub fn new(chain: ChainId, name: impl Into<String>, model: PricingModel) -> Self {
        Self {
            chain,
            name: VenueName::new(name),
            model,
        }
    }

    pub fn id(&self) -> String {
        format!("{:?}:{}", self.chain, self.name)
    }
}
