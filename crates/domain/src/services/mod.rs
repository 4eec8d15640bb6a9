//! Shared service helpers: telemetry wiring and the user lookup cache.

pub mod telemetry;
pub mod user_cache;

pub use telemetry::*;
pub use user_cache::*;
