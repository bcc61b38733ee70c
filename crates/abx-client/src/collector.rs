//! Stream collector: the primary "stream all" phase.
//!
//! ```text
//! Idle ──open──► Connected ──send(StreamAll)──► Streaming ──EOF──► Done
//!                                                  │  ▲
//!                                                  └──┘ decode + accumulate
//! ```
//!
//! Every failure in this phase is fatal for the run: a channel error, a
//! malformed frame, or a stream that closes before delivering any record.

use abx_core::{AbxError, Record};
use ahash::AHashSet;
use tracing::{debug, info};

use crate::channel::{Channel, Connector};
use crate::codec::{Request, decode_record};

/// Records and the set of sequences seen so far.
///
/// Owned by the orchestration flow and handed to each phase in turn.
#[derive(Debug, Default)]
pub struct Accumulation {
    records: Vec<Record>,
    seen: AHashSet<u32>,
}

impl Accumulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record in arrival order and mark its sequence as seen.
    pub fn push(&mut self, record: Record) {
        self.seen.insert(record.sequence);
        self.records.push(record);
    }

    pub fn contains(&self, sequence: u32) -> bool {
        self.seen.contains(&sequence)
    }

    pub fn seen(&self) -> &AHashSet<u32> {
        &self.seen
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Collector state, logged on each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Connected,
    Streaming,
    Done,
}

/// Terminal output of the streaming phase.
#[derive(Debug)]
pub struct StreamOutcome {
    pub accumulation: Accumulation,
    /// Sequence of the last record received, in arrival order.
    pub max_sequence: u32,
}

fn transition(state: &mut StreamState, next: StreamState) {
    debug!("stream collector {:?} -> {:?}", state, next);
    *state = next;
}

/// Request the full packet stream and read it until the server closes.
///
/// Fails with [`AbxError::NoDataReceived`] when the stream is empty.
pub async fn collect_stream<C: Connector>(connector: &C) -> Result<StreamOutcome, AbxError> {
    let mut state = StreamState::Idle;

    let mut channel = connector.open().await?;
    transition(&mut state, StreamState::Connected);

    let request = Request::StreamAll.encode();
    channel.send(&request).await?;
    debug!("sent request: call_type={} sequence={}", request[0], request[1]);
    transition(&mut state, StreamState::Streaming);

    let mut accumulation = Accumulation::new();
    let mut last_sequence = None;
    while let Some(bytes) = channel.receive().await? {
        let record = decode_record(&bytes)?;
        debug!("parsed packet: {record}");
        last_sequence = Some(record.sequence);
        accumulation.push(record);
    }
    channel.close().await;
    transition(&mut state, StreamState::Done);

    let max_sequence = last_sequence.ok_or(AbxError::NoDataReceived)?;
    info!("stream complete: {} packet(s), last sequence {max_sequence}", accumulation.len());

    Ok(StreamOutcome { accumulation, max_sequence })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::{Reply, ScriptedConnector, Session, frame, stream_of};

    #[tokio::test]
    async fn collects_in_arrival_order() {
        let connector = ScriptedConnector::new(vec![stream_of(&[1, 2, 4, 5])]);
        let out = collect_stream(&connector).await.unwrap();

        let seqs: Vec<u32> = out.accumulation.records().iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 4, 5]);
        assert_eq!(out.max_sequence, 5);
        assert!(out.accumulation.contains(4));
        assert!(!out.accumulation.contains(3));
        assert_eq!(connector.sent(), vec![vec![1, 0]]);
        assert_eq!(connector.opens(), 1);
    }

    #[tokio::test]
    async fn max_sequence_is_last_arrival_not_largest() {
        let connector = ScriptedConnector::new(vec![stream_of(&[1, 7, 3])]);
        let out = collect_stream(&connector).await.unwrap();
        assert_eq!(out.max_sequence, 3);
    }

    #[tokio::test]
    async fn empty_stream_is_no_data() {
        let connector = ScriptedConnector::new(vec![stream_of(&[])]);
        let err = collect_stream(&connector).await.unwrap_err();
        assert!(matches!(err, AbxError::NoDataReceived));
    }

    #[tokio::test]
    async fn malformed_frame_aborts() {
        let mut bad = match frame(2) {
            Reply::Frame(bytes) => bytes,
            _ => unreachable!(),
        };
        bad[4] = b'Q';
        let connector = ScriptedConnector::new(vec![Session::Replies(vec![frame(1), Reply::Frame(bad), frame(3)])]);
        let err = collect_stream(&connector).await.unwrap_err();
        assert!(matches!(err, AbxError::MalformedPacket(_)));
    }

    #[tokio::test]
    async fn short_frame_aborts() {
        let connector =
            ScriptedConnector::new(vec![Session::Replies(vec![frame(1), Reply::Frame(vec![b'A'; 9])])]);
        let err = collect_stream(&connector).await.unwrap_err();
        assert!(matches!(err, AbxError::MalformedPacket(_)));
    }

    #[tokio::test]
    async fn channel_failure_aborts() {
        let connector = ScriptedConnector::new(vec![Session::Replies(vec![frame(1), Reply::Fail("reset by peer")])]);
        let err = collect_stream(&connector).await.unwrap_err();
        assert!(err.is_channel());
    }

    #[tokio::test]
    async fn refused_connection_aborts() {
        let connector = ScriptedConnector::new(vec![Session::Refuse]);
        let err = collect_stream(&connector).await.unwrap_err();
        assert!(matches!(err, AbxError::Channel(_)));
    }
}
