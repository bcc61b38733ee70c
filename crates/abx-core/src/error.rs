//! Typed error definitions for the ABX feed client.
//!
//! [`AbxError`] separates the failure kinds the pipeline reacts to
//! differently: a primary-stream failure aborts the run, while the same
//! kinds raised during gap recovery only mark one sequence as unrecovered.
//! All variants implement `std::error::Error` via `thiserror`, so they travel
//! inside `anyhow::Error` and can be recovered with `downcast_ref`.

use thiserror::Error;

/// Domain-specific errors for the ABX feed client.
#[derive(Debug, Error)]
pub enum AbxError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Transport failure other than an orderly close by the peer.
    #[error("channel error: {0}")]
    Channel(String),

    /// A connect or receive did not complete within the configured bound.
    #[error("channel timeout: {0}")]
    Timeout(String),

    /// A response frame could not be decoded into a record.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// The primary stream closed without delivering a single record.
    #[error("no data received from the primary stream")]
    NoDataReceived,

    /// The output sink rejected the final batch.
    #[error("sink error: {0}")]
    Sink(String),
}

impl AbxError {
    /// Whether this error came from the transport rather than the payload.
    pub fn is_channel(&self) -> bool {
        matches!(self, Self::Channel(_) | Self::Timeout(_))
    }
}

impl From<std::io::Error> for AbxError {
    fn from(e: std::io::Error) -> Self {
        Self::Channel(e.to_string())
    }
}
