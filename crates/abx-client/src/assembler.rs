//! Assembler: order the accumulated records for the sink.

use abx_core::Record;

/// Sort records ascending by sequence.
///
/// The sort is stable, so if a sequence appears more than once the copy that
/// arrived first stays first.
pub fn assemble(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_key(|r| r.sequence);
    records
}

/// Whether `records` (already assembled) are exactly `1..=max_sequence`.
pub fn covers_range(records: &[Record], max_sequence: u32) -> bool {
    records.len() == max_sequence as usize
        && records.iter().zip(1u32..).all(|(r, expected)| r.sequence == expected)
}
