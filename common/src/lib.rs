pub mod decimal;
pub mod logger;
pub mod time;

pub use logger::{TraceId, child_span, init_tracing, root_span, warn_if_slow};
pub use time::now_ms;
