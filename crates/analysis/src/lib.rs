//! Post-hoc checks over a generated trace. Nothing here modifies the events.

pub mod overlap;
pub mod summary;

pub use overlap::{validate_overlaps, OverlapKind, OverlapWarning};
pub use summary::{summarize, EventExtreme, TraceSummary};
