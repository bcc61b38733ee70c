//! End-to-end orchestration: stream, reconcile, assemble, emit.
//!
//! ```text
//! collect_stream ──► (Accumulation, M) ──► reconcile ──► assemble ──► RecordSink
//! ```
//!
//! The accumulation is owned here and lent to each phase in turn. Any
//! error from the streaming phase aborts the run before the sink is touched;
//! recovery failures only show up in the [`RunReport`].

use abx_core::AbxError;
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::assembler::{assemble, covers_range};
use crate::channel::Connector;
use crate::collector::collect_stream;
use crate::reconciler::{RecoveryReport, reconcile};
use crate::sink::RecordSink;

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Records received by the primary stream.
    pub streamed: usize,
    /// Sequence of the last streamed record.
    pub max_sequence: u32,
    pub recovery: RecoveryReport,
    /// Records handed to the sink.
    pub emitted: usize,
    /// Whether the output is exactly `1..=max_sequence`.
    pub complete: bool,
}

/// Run the full pipeline against `connector`, writing the result to `sink`.
pub async fn run<C, S>(connector: &C, sink: &mut S) -> Result<RunReport>
where
    C: Connector,
    S: RecordSink + ?Sized,
{
    let stream = collect_stream(connector).await.context("primary stream")?;
    let mut accumulation = stream.accumulation;
    let streamed = accumulation.len();

    let recovery = reconcile(connector, &mut accumulation, stream.max_sequence).await;
    if !recovery.is_complete() {
        warn!(
            "{} sequence(s) unrecovered: {:?}",
            recovery.unrecovered.len(),
            recovery.unrecovered
        );
    }

    let records = assemble(accumulation.into_records());
    let complete = covers_range(&records, stream.max_sequence);
    sink.write_batch(&records).map_err(|e| match e.downcast::<AbxError>() {
        Ok(abx) => anyhow::Error::new(abx),
        Err(other) => anyhow::Error::new(AbxError::Sink(format!("{other:#}"))),
    })?;

    info!("run complete: {} streamed, {} emitted, complete={complete}", streamed, records.len());
    Ok(RunReport { streamed, max_sequence: stream.max_sequence, recovery, emitted: records.len(), complete })
}
