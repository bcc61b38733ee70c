//! Core data types for the ABX wire protocol.
//!
//! A [`Record`] is only ever built by the wire codec from a complete frame,
//! so every field is populated and there is no default record.

pub mod record;
pub mod symbol;

pub use record::*;
pub use symbol::*;
