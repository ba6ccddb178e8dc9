use std::path::Path;

use serde::Deserialize;
use trace_synth_common::{OutputShape, Phase, TraceError, TraceEvent};
use tracing::debug;

use crate::writer::TraceMetadata;

/// A trace file loaded back into memory.
#[derive(Debug, Default)]
pub struct LoadedTrace {
    pub events: Vec<TraceEvent>,
    /// Present only for the object shape, and only if it has our fields.
    pub metadata: Option<TraceMetadata>,
    pub shape: OutputShape,
    /// Events dropped because their phase is not a complete event.
    pub skipped: usize,
    /// Complete events dropped because they carry no `dur`.
    pub untimed: usize,
    /// The file was an unterminated legacy array and was patched before
    /// parsing.
    pub repaired: bool,
}

/// A numeric field written either natively or as a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Int(u64),
    Float(f64),
    Text(String),
}

#[derive(Deserialize)]
struct RawEvent {
    name: String,
    #[serde(default)]
    cat: String,
    #[serde(default = "complete_phase")]
    ph: String,
    pid: Lenient,
    tid: Lenient,
    ts: Lenient,
    #[serde(default)]
    dur: Option<Lenient>,
}

fn complete_phase() -> String {
    Phase::Complete.code().to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTrace {
    Document {
        #[serde(rename = "traceEvents")]
        trace_events: Vec<RawEvent>,
        #[serde(default)]
        metadata: Option<serde_json::Value>,
    },
    Array(Vec<RawEvent>),
}

/// Read and parse a trace file from disk.
pub fn read_trace(path: &Path) -> Result<LoadedTrace, TraceError> {
    let text = std::fs::read_to_string(path)?;
    parse_trace(&text)
}

/// Parse trace JSON in either the array or the object shape.
pub fn parse_trace(text: &str) -> Result<LoadedTrace, TraceError> {
    let (raw, repaired) = match serde_json::from_str::<RawTrace>(text) {
        Ok(raw) => (raw, false),
        Err(err) => match repair_legacy_array(text) {
            Some(patched) => {
                debug!("patched unterminated array before parsing");
                (serde_json::from_str::<RawTrace>(&patched)?, true)
            }
            None => return Err(err.into()),
        },
    };

    let (raw_events, metadata, shape) = match raw {
        RawTrace::Document {
            trace_events,
            metadata,
        } => {
            let metadata = metadata.and_then(|m| serde_json::from_value(m).ok());
            (trace_events, metadata, OutputShape::Object)
        }
        RawTrace::Array(events) => (events, None, OutputShape::Array),
    };

    let mut loaded = LoadedTrace {
        events: Vec::with_capacity(raw_events.len()),
        metadata,
        shape,
        skipped: 0,
        untimed: 0,
        repaired,
    };
    for raw in raw_events {
        let Some(phase) = Phase::from_code(&raw.ph) else {
            loaded.skipped += 1;
            continue;
        };
        let Some(dur) = raw.dur else {
            loaded.untimed += 1;
            continue;
        };
        let ts = number("ts", raw.ts)?;
        let dur = number("dur", dur)?;
        if ts.checked_add(dur).is_none() {
            return Err(TraceError::InvalidField {
                field: "dur",
                value: format!("{dur} (ts {ts} + dur overflows)"),
            });
        }
        loaded.events.push(TraceEvent {
            name: raw.name,
            category: raw.cat,
            phase,
            pid: narrow("pid", raw.pid)?,
            tid: narrow("tid", raw.tid)?,
            ts,
            dur,
        });
    }
    if loaded.skipped + loaded.untimed > 0 {
        debug!(
            skipped = loaded.skipped,
            untimed = loaded.untimed,
            "dropped events while loading"
        );
    }
    Ok(loaded)
}

/// Patch the output of the old generator, which wrote `[`, then every event
/// followed by `,\n`, and never closed the array.
///
/// Returns `None` if the text does not look like that format.
pub fn repair_legacy_array(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if !trimmed.starts_with('[') || trimmed.ends_with(']') {
        return None;
    }
    let body = trimmed.strip_suffix(',').unwrap_or(trimmed);
    Some(format!("{body}]"))
}

fn number(field: &'static str, value: Lenient) -> Result<u64, TraceError> {
    match value {
        Lenient::Int(n) => Ok(n),
        Lenient::Float(f) if f.is_finite() && f >= 0.0 => Ok(f as u64),
        Lenient::Float(f) => Err(TraceError::InvalidField {
            field,
            value: f.to_string(),
        }),
        Lenient::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| TraceError::InvalidField { field, value: s }),
    }
}

fn narrow(field: &'static str, value: Lenient) -> Result<u32, TraceError> {
    let n = number(field, value)?;
    u32::try_from(n).map_err(|_| TraceError::InvalidField {
        field,
        value: n.to_string(),
    })
}
