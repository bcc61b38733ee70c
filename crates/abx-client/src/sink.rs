//! Output sinks for the assembled dataset.
//!
//! A sink receives the final, sorted batch exactly once per successful run.
//! Fatal runs never reach the sink, so no partial output is written.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use abx_core::{AbxError, Record};
use anyhow::{Context, Result};
use serde_json::ser::PrettyFormatter;
use tracing::info;

/// Destination for the assembled records.
pub trait RecordSink {
    fn write_batch(&mut self, records: &[Record]) -> Result<()>;
}

/// Writes the batch as a pretty-printed JSON array (4-space indent).
///
/// ```json
/// [
///     { "symbol": "ABCD", "side": "B", "quantity": 50, "price": 100, "sequence": 1 }
/// ]
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Serialize `records` as a JSON array with 4-space indentation.
pub fn write_json<W: Write>(writer: W, records: &[Record]) -> Result<()> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    serde::Serialize::serialize(records, &mut ser).map_err(|e| AbxError::Sink(e.to_string()))?;
    Ok(())
}

/// Run `body` against a fresh file at `tmp`, then rename it onto `dest`.
///
/// On any failure `tmp` is removed, so neither path holds partial output.
fn persist<F>(tmp: &Path, dest: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let write = || -> Result<()> {
        let file = File::create(tmp).with_context(|| format!("create {}", tmp.display()))?;
        let mut w = BufWriter::new(file);
        body(&mut w)?;
        w.flush()?;
        drop(w);
        fs::rename(tmp, dest).with_context(|| format!("rename into {}", dest.display()))
    };
    write().inspect_err(|_| {
        let _ = fs::remove_file(tmp);
    })
}

impl RecordSink for JsonFileSink {
    fn write_batch(&mut self, records: &[Record]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }

        persist(&self.temp_path(), &self.path, |w| {
            write_json(&mut *w, records)?;
            w.write_all(b"\n")?;
            Ok(())
        })?;

        info!("data saved to {} ({} record(s))", self.path.display(), records.len());
        Ok(())
    }
}

/// Keeps every batch in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: Vec<Vec<Record>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of the most recent batch, if any was written.
    pub fn last_batch(&self) -> Option<&[Record]> {
        self.batches.last().map(Vec::as_slice)
    }
}

impl RecordSink for MemorySink {
    fn write_batch(&mut self, records: &[Record]) -> Result<()> {
        self.batches.push(records.to_vec());
        Ok(())
    }
}
