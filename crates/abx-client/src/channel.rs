//! Channel adapter: the transport contract the pipeline runs on.
//!
//! A [`Connector`] opens one fresh [`Channel`] per request; the protocol never
//! reuses a connection across requests. A channel is released when it is
//! dropped, so every exit path (including decode failures) closes it.
//!
//! [`TcpConnector`] is the production implementation over `tokio::net`.

use std::future::Future;
use std::time::Duration;

use abx_core::AbxError;
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::codec::FRAME_LEN;

/// One open connection to the feed server.
#[async_trait]
pub trait Channel: Send {
    /// Write the whole request.
    async fn send(&mut self, bytes: &[u8]) -> Result<(), AbxError>;

    /// Receive one response frame.
    ///
    /// `Ok(None)` signals an orderly close by the peer. Any other transport
    /// failure is an error; the returned bytes are not validated here.
    async fn receive(&mut self) -> Result<Option<Vec<u8>>, AbxError>;

    /// Release the channel after a completed cycle. Dropping also releases it.
    async fn close(&mut self) {}
}

/// Factory for fresh channels.
#[async_trait]
pub trait Connector: Send + Sync {
    type Channel: Channel;

    async fn open(&self) -> Result<Self::Channel, AbxError>;
}

/// Await `fut`, bounded by `limit` when one is configured.
async fn bounded<T, F>(limit: Option<Duration>, what: &str, fut: F) -> Result<T, AbxError>
where
    F: Future<Output = std::io::Result<T>>,
{
    match limit {
        Some(d) => match tokio::time::timeout(d, fut).await {
            Ok(res) => res.map_err(AbxError::from),
            Err(_) => Err(AbxError::Timeout(format!("{what} exceeded {}ms", d.as_millis()))),
        },
        None => fut.await.map_err(AbxError::from),
    }
}

// ---------------------------------------------------------------------------
// TCP
// ---------------------------------------------------------------------------

/// Opens TCP connections to a fixed `host:port`.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    connect_timeout: Option<Duration>,
    recv_timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), connect_timeout: None, recv_timeout: None }
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_recv_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.recv_timeout = timeout;
        self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Channel = TcpChannel;

    async fn open(&self) -> Result<TcpChannel, AbxError> {
        let stream = bounded(self.connect_timeout, "connect", TcpStream::connect(&self.addr))
            .await
            .map_err(|e| match e {
                AbxError::Channel(msg) => AbxError::Channel(format!("connect {}: {msg}", self.addr)),
                other => other,
            })?;
        stream.set_nodelay(true)?;
        debug!("connected to {}", self.addr);
        Ok(TcpChannel { stream, recv_timeout: self.recv_timeout })
    }
}

/// A single TCP connection carrying one request/response cycle.
pub struct TcpChannel {
    stream: TcpStream,
    recv_timeout: Option<Duration>,
}

/// Fill one frame, tolerating a frame split across several TCP reads.
async fn read_frame(stream: &mut TcpStream) -> std::io::Result<Option<Vec<u8>>> {
    let mut buf = vec![0u8; FRAME_LEN];
    let mut filled = 0;
    while filled < FRAME_LEN {
        let n = stream.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("peer closed after {filled} of {FRAME_LEN} frame bytes"),
            ));
        }
        filled += n;
    }
    Ok(Some(buf))
}

#[async_trait]
impl Channel for TcpChannel {
    async fn send(&mut self, bytes: &[u8]) -> Result<(), AbxError> {
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<Vec<u8>>, AbxError> {
        let limit = self.recv_timeout;
        let frame = bounded(limit, "receive", read_frame(&mut self.stream)).await?;
        if frame.is_none() {
            debug!("connection closed by server");
        }
        Ok(frame)
    }

    async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}

// ---------------------------------------------------------------------------
// Scripted connector for unit tests
// ---------------------------------------------------------------------------
