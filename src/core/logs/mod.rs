//! System-log querying, aggregation and retention.

mod filter;
mod retention;
mod stats;
pub mod types;

pub use filter::{DEFAULT_LOG_LIMIT, LogFilter, MAX_LOG_LIMIT};
pub use retention::RetentionPolicy;
pub use stats::{LogStats, summarize};
pub use types::{LogLevel, Severity};
