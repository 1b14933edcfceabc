use thiserror::Error;

#[derive(Error, Debug)]
pub enum VenueError {
    #[error("pool has insufficient liquidity to quote")]
    InsufficientLiquidity,

    #[error("pricing model mismatch: venue declares {declared:?}, pool state is a different variant")]
    ModelMismatch { declared: core_model::PricingModel },

    #[error("pricing formula did not converge within its iteration bound")]
    DidNotConverge,

    #[error("computed price is not finite")]
    NonFinitePrice,
}
