//! # abx-client
//!
//! Client for the ABX binary market-data feed.
//!
//! ## Architecture
//!
//! ```text
//! collector ──► reconciler ──► assembler ──► sink
//!     │              │
//!     └── codec ◄────┘   (over channel::Connector)
//! ```
//!
//! - [`codec`]: request encoding and 17-byte response decoding
//! - [`channel`]: `Connector`/`Channel` traits and the TCP implementation
//! - [`collector`]: primary "stream all" phase
//! - [`reconciler`]: per-gap resend requests
//! - [`assembler`]: final ordering by sequence
//! - [`sink`]: JSON file and in-memory output
//! - [`pipeline`]: runs the phases in order and reports the outcome

pub mod assembler;
pub mod channel;
pub mod codec;
pub mod collector;
pub mod pipeline;
pub mod reconciler;
pub mod sink;

pub use channel::{Channel, Connector, TcpConnector};
pub use pipeline::{RunReport, run};
pub use sink::{JsonFileSink, MemorySink, RecordSink};
