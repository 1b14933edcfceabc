pub mod concentrated_v3;
pub mod constant_product;
pub mod stable_curve;
pub mod weighted_pool;
