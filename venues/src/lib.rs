pub mod adapter;
pub mod cache;
pub mod error;
pub mod formulas;
pub mod pools;

pub use adapter::{GenericAdapter, VenueAdapter};
pub use cache::QuoteCache;
pub use error::VenueError;
pub use pools::PoolState;
