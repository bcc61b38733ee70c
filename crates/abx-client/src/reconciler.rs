//! Gap reconciler: re-request every sequence the primary stream skipped.
//!
//! The missing set is `{i : 1 <= i < M, i not seen}` where `M` is the last
//! sequence streamed. `M` itself is excluded because it was, by construction,
//! received.
//!
//! Each missing sequence gets exactly one attempt, in ascending order, on its
//! own fresh channel: open, send `Resend(seq)`, receive once, close. Any
//! failure in that cycle is contained to the sequence and leaves it
//! unrecovered; the pass itself never fails.

use std::time::Instant;

use abx_core::latency::{LatencyCollector, LatencyStats};
use abx_core::{AbxError, Record};
use ahash::AHashSet;
use tracing::{debug, info, warn};

use crate::channel::{Channel, Connector};
use crate::codec::{Request, decode_record};
use crate::collector::Accumulation;

/// Largest sequence a resend request can address without aliasing.
pub const MAX_WIRE_SEQUENCE: u32 = u8::MAX as u32;

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct RecoveryReport {
    /// Number of resend cycles performed.
    pub attempted: usize,
    /// Sequences folded into the accumulation, ascending.
    pub recovered: Vec<u32>,
    /// Sequences still missing, ascending.
    pub unrecovered: Vec<u32>,
    /// Per-cycle round-trip statistics, if any cycle ran.
    pub round_trips: Option<LatencyStats>,
}

impl RecoveryReport {
    pub fn is_complete(&self) -> bool {
        self.unrecovered.is_empty()
    }
}

/// Sequences in `[1, max_sequence)` absent from `seen`, ascending.
///
/// Lazy: a single frame with a huge sequence must not allocate the range.
pub fn missing_sequences(seen: &AHashSet<u32>, max_sequence: u32) -> impl Iterator<Item = u32> + '_ {
    (1..max_sequence).filter(move |seq| !seen.contains(seq))
}

/// Size of [`missing_sequences`] without walking the range.
pub fn gap_count(seen: &AHashSet<u32>, max_sequence: u32) -> usize {
    let present = seen.iter().filter(|&&seq| seq >= 1 && seq < max_sequence).count();
    (max_sequence.saturating_sub(1) as usize).saturating_sub(present)
}

/// Whether resend requests for this session can alias on the wire.
#[inline]
pub fn resend_may_alias(max_sequence: u32) -> bool {
    max_sequence > MAX_WIRE_SEQUENCE
}

/// One open/send/receive/close cycle for `sequence`.
///
/// `Ok(None)` means the server answered with an immediate close.
async fn recover_one<C: Connector>(connector: &C, sequence: u32) -> Result<Option<Record>, AbxError> {
    let mut channel = connector.open().await?;

    let request = Request::Resend(sequence).encode();
    channel.send(&request).await?;
    debug!("sent request: call_type={} sequence={}", request[0], request[1]);

    let Some(bytes) = channel.receive().await? else {
        return Ok(None);
    };
    channel.close().await;

    let record = decode_record(&bytes)?;
    if record.sequence != sequence {
        return Err(AbxError::MalformedPacket(format!(
            "requested sequence {sequence}, server sent {}",
            record.sequence
        )));
    }
    Ok(Some(record))
}

/// Recover every gap below `max_sequence`, folding results into `acc`.
pub async fn reconcile<C: Connector>(connector: &C, acc: &mut Accumulation, max_sequence: u32) -> RecoveryReport {
    let gaps = gap_count(acc.seen(), max_sequence);
    info!("missing sequences detected: {gaps}");

    let mut report = RecoveryReport::default();
    if gaps == 0 {
        return report;
    }

    if resend_may_alias(max_sequence) {
        warn!(
            "last sequence {max_sequence} exceeds {MAX_WIRE_SEQUENCE}: resend requests carry only the low byte \
             and may alias earlier sequences"
        );
    }

    // Folded in after the pass; the missing set borrows the seen set.
    let mut recovered_records = Vec::new();
    let mut round_trips = LatencyCollector::new();
    for sequence in missing_sequences(acc.seen(), max_sequence) {
        report.attempted += 1;
        let started = Instant::now();
        let outcome = recover_one(connector, sequence).await;
        round_trips.record_duration(started.elapsed());

        match outcome {
            Ok(Some(record)) => {
                debug!("recovered packet: {record}");
                recovered_records.push(record);
                report.recovered.push(sequence);
            }
            Ok(None) => {
                warn!("sequence {sequence}: server closed without resending");
                report.unrecovered.push(sequence);
            }
            Err(e) => {
                warn!("sequence {sequence}: recovery failed: {e}");
                report.unrecovered.push(sequence);
            }
        }
    }
    report.round_trips = round_trips.stats();
    for record in recovered_records {
        acc.push(record);
    }

    info!(
        "recovery complete: {} attempted, {} recovered, {} unrecovered",
        report.attempted,
        report.recovered.len(),
        report.unrecovered.len(),
    );
    if let Some(stats) = &report.round_trips {
        info!("recovery round-trips: {stats}");
    }
    report
}
