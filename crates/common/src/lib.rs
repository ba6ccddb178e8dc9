use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Simulated process identifier (`pid` in the trace format).
pub type ProcessId = u32;

/// Simulated thread identifier (`tid` in the trace format).
pub type ThreadId = u32;

/// Start time or length of an event, in arbitrary time units.
pub type Micros = u64;

/// Shortest duration a generated event may have.
pub const MIN_DURATION: Micros = 10;

/// Longest duration a generated event may have.
pub const MAX_DURATION: Micros = 100;

/// Process id stamped on every generated event unless configured otherwise.
pub const DEFAULT_PROCESS_ID: ProcessId = 1;

/// Event phase marker. Only complete ("duration") events are produced.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    #[serde(rename = "X")]
    Complete,
}

impl Phase {
    /// The single-letter code used by the trace-event format.
    pub fn code(&self) -> &'static str {
        match self {
            Phase::Complete => "X",
        }
    }

    /// Parse a phase code; `None` for phases this tool does not model.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "X" => Some(Phase::Complete),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trace event: one synthetic unit of work
// ---------------------------------------------------------------------------

/// A complete trace event. Field names on the wire follow the Chrome
/// trace-event format so the output loads directly into trace viewers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceEvent {
    pub name: String,
    #[serde(rename = "cat")]
    pub category: String,
    #[serde(rename = "ph")]
    pub phase: Phase,
    pub pid: ProcessId,
    pub tid: ThreadId,
    /// Start time.
    pub ts: Micros,
    /// Length of the event's interval.
    pub dur: Micros,
}

impl TraceEvent {
    /// Exclusive end of the event's interval `[ts, ts + dur)`, saturating at
    /// `Micros::MAX`.
    pub fn end(&self) -> Micros {
        self.ts.saturating_add(self.dur)
    }

    /// True when `other` lies entirely within this event's interval.
    pub fn contains(&self, other: &TraceEvent) -> bool {
        self.ts <= other.ts && other.end() <= self.end()
    }
}

// ---------------------------------------------------------------------------
// Run-level choices shared by the generator, the writer and the CLI
// ---------------------------------------------------------------------------

/// How start times are assigned to events.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPolicy {
    /// Per-thread cursor with random jitter; output grouped by thread.
    #[default]
    Offset,
    /// Nest only inside the immediately preceding event; output time-sorted.
    Nesting,
    /// Nest inside any open ancestor; siblings never overlap.
    Stacked,
}

impl fmt::Display for TimestampPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampPolicy::Offset => write!(f, "offset"),
            TimestampPolicy::Nesting => write!(f, "nesting"),
            TimestampPolicy::Stacked => write!(f, "stacked"),
        }
    }
}

/// JSON layout of the output file.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputShape {
    /// Bare array of events, every field value stringified.
    #[default]
    Array,
    /// `{"traceEvents": [...], "metadata": {...}}` with numeric fields.
    Object,
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputShape::Array => write!(f, "array"),
            OutputShape::Object => write!(f, "object"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid generation parameters: {0}")]
    InvalidParams(String),

    #[error("field `{field}` has non-numeric value {value:?}")]
    InvalidField { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, TraceError>;
