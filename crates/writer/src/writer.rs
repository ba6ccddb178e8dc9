use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use trace_synth_common::{OutputShape, TimestampPolicy, TraceError, TraceEvent};
use tracing::info;

/// Run description written alongside the events in the object shape.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceMetadata {
    /// RFC 3339 generation time.
    pub generated_at: String,
    pub event_count: usize,
    pub seed: u64,
    pub timestamp_policy: TimestampPolicy,
}

impl TraceMetadata {
    pub fn new(
        event_count: usize,
        seed: u64,
        timestamp_policy: TimestampPolicy,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            event_count,
            seed,
            timestamp_policy,
        }
    }

    /// Metadata stamped with the current wall-clock time.
    pub fn now(event_count: usize, seed: u64, timestamp_policy: TimestampPolicy) -> Self {
        Self::new(event_count, seed, timestamp_policy, Utc::now())
    }

    /// Metadata stamped with the Unix epoch instead of the wall clock, so
    /// seeded runs serialize to identical bytes.
    pub fn pinned(event_count: usize, seed: u64, timestamp_policy: TimestampPolicy) -> Self {
        Self::new(event_count, seed, timestamp_policy, DateTime::<Utc>::default())
    }
}

/// Array-shape record: every value is a string, as older viewers expect.
#[derive(Serialize)]
struct StringifiedEvent<'a> {
    name: &'a str,
    cat: &'a str,
    ph: &'static str,
    pid: String,
    tid: String,
    dur: String,
    ts: String,
}

impl<'a> From<&'a TraceEvent> for StringifiedEvent<'a> {
    fn from(event: &'a TraceEvent) -> Self {
        Self {
            name: &event.name,
            cat: &event.category,
            ph: event.phase.code(),
            pid: event.pid.to_string(),
            tid: event.tid.to_string(),
            dur: event.dur.to_string(),
            ts: event.ts.to_string(),
        }
    }
}

#[derive(Serialize)]
struct TraceDocument<'a> {
    #[serde(rename = "traceEvents")]
    trace_events: &'a [TraceEvent],
    metadata: &'a TraceMetadata,
}

/// Serialize `events` in the requested shape.
///
/// The array shape puts one compact object per line and always closes the
/// array; the object shape is a single compact document. Both end with a
/// newline.
pub fn encode_trace<W: Write>(
    out: &mut W,
    events: &[TraceEvent],
    shape: OutputShape,
    metadata: &TraceMetadata,
) -> Result<(), TraceError> {
    match shape {
        OutputShape::Array => {
            out.write_all(b"[")?;
            for (i, event) in events.iter().enumerate() {
                if i > 0 {
                    out.write_all(b",\n")?;
                }
                serde_json::to_writer(&mut *out, &StringifiedEvent::from(event))?;
            }
            out.write_all(b"]\n")?;
        }
        OutputShape::Object => {
            let document = TraceDocument {
                trace_events: events,
                metadata,
            };
            serde_json::to_writer(&mut *out, &document)?;
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Buffered writer for a single trace output file.
pub struct TraceWriter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl TraceWriter {
    /// Create the output file, truncating any existing one.
    pub fn create(path: &Path) -> Result<Self, TraceError> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    /// Encode the whole trace, fsync, and return the resulting file size.
    pub fn write(
        mut self,
        events: &[TraceEvent],
        shape: OutputShape,
        metadata: &TraceMetadata,
    ) -> Result<u64, TraceError> {
        encode_trace(&mut self.writer, events, shape, metadata)?;
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;

        let bytes = std::fs::metadata(&self.path)?.len();
        info!(path = %self.path.display(), bytes, %shape, "trace written");
        Ok(bytes)
    }
}

/// Write a trace file in one call. Returns the file size in bytes.
pub fn write_trace(
    path: &Path,
    events: &[TraceEvent],
    shape: OutputShape,
    metadata: &TraceMetadata,
) -> Result<u64, TraceError> {
    TraceWriter::create(path)?.write(events, shape, metadata)
}

/// Bytes to mebibytes, for the console size report.
pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
