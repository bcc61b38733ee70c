//! # abx-core
//!
//! Core crate for the ABX feed client, providing:
//!
//! - **Types** (`types`): the decoded `Record`, its `Side`, and the fixed `Symbol`
//! - **Configuration** (`config`): JSON config deserialization with defaults
//! - **Error types** (`error`): domain-specific `AbxError` via thiserror
//! - **Latency** (`latency`): histogram-based round-trip statistics
//! - **Logging** (`logging`): tracing-based structured logging

pub mod config;
pub mod error;
pub mod latency;
pub mod logging;
pub mod types;

// Re-export types at crate root for convenience.
pub use error::AbxError;
pub use types::*;
