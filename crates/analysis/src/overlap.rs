use std::collections::BTreeMap;
use std::fmt;

use trace_synth_common::{Micros, ThreadId, TraceEvent};
use tracing::debug;

/// How two adjacent events on a thread overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapKind {
    /// The later event ends inside the earlier one (a parent/child pair).
    Nested,
    /// The later event starts inside the earlier one but ends after it.
    Crossing,
}

impl fmt::Display for OverlapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapKind::Nested => write!(f, "nested"),
            OverlapKind::Crossing => write!(f, "crossing"),
        }
    }
}

/// One adjacent pair on a thread where the first event runs past the start of
/// the second.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlapWarning {
    pub tid: ThreadId,
    pub previous: String,
    pub next: String,
    pub previous_end: Micros,
    pub next_start: Micros,
    pub kind: OverlapKind,
}

impl fmt::Display for OverlapWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "thread {}: '{}' ends at {} but '{}' starts at {} ({})",
            self.tid, self.previous, self.previous_end, self.next, self.next_start, self.kind
        )
    }
}

/// Check every thread for adjacent events whose intervals overlap.
///
/// Events are grouped by `tid` and sorted by start time; on equal starts the
/// longer event comes first so a parent sorts before its child, and full ties
/// keep their input order. Each pair with `prev.ts + prev.dur > next.ts` is
/// reported. The input is not modified.
pub fn validate_overlaps(events: &[TraceEvent]) -> Vec<OverlapWarning> {
    let mut threads: BTreeMap<ThreadId, Vec<&TraceEvent>> = BTreeMap::new();
    for event in events {
        threads.entry(event.tid).or_default().push(event);
    }

    let mut warnings = Vec::new();
    for (tid, mut timeline) in threads {
        timeline.sort_by(|a, b| a.ts.cmp(&b.ts).then(b.dur.cmp(&a.dur)));

        let before = warnings.len();
        for pair in timeline.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if prev.end() <= next.ts {
                continue;
            }
            let kind = if next.end() <= prev.end() {
                OverlapKind::Nested
            } else {
                OverlapKind::Crossing
            };
            warnings.push(OverlapWarning {
                tid,
                previous: prev.name.clone(),
                next: next.name.clone(),
                previous_end: prev.end(),
                next_start: next.ts,
                kind,
            });
        }
        debug!(tid, events = timeline.len(), overlaps = warnings.len() - before, "thread checked");
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_synth_common::Phase;

    fn event(name: &str, tid: ThreadId, ts: Micros, dur: Micros) -> TraceEvent {
        TraceEvent {
            name: name.to_string(),
            category: "rendering".to_string(),
            phase: Phase::Complete,
            pid: 1,
            tid,
            ts,
            dur,
        }
    }

    #[test]
    fn test_disjoint_events_are_clean() {
        let events = vec![
            event("a", 1, 0, 10),
            event("b", 1, 10, 10),
            event("c", 1, 25, 10),
        ];
        assert!(validate_overlaps(&events).is_empty());
    }

    #[test]
    fn test_crossing_pair_reported() {
        // Input order is deliberately unsorted.
        let events = vec![event("late", 3, 40, 20), event("early", 3, 0, 50)];
        let warnings = validate_overlaps(&events);
        assert_eq!(
            warnings,
            vec![OverlapWarning {
                tid: 3,
                previous: "early".to_string(),
                next: "late".to_string(),
                previous_end: 50,
                next_start: 40,
                kind: OverlapKind::Crossing,
            }]
        );
        assert_eq!(
            warnings[0].to_string(),
            "thread 3: 'early' ends at 50 but 'late' starts at 40 (crossing)"
        );
    }

    #[test]
    fn test_nested_pair_classified() {
        let events = vec![event("child", 2, 0, 10), event("parent", 2, 0, 40)];
        let warnings = validate_overlaps(&events);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].previous, "parent");
        assert_eq!(warnings[0].kind, OverlapKind::Nested);
    }

    #[test]
    fn test_threads_checked_independently() {
        let events = vec![event("a", 1, 0, 50), event("b", 2, 10, 50)];
        assert!(validate_overlaps(&events).is_empty());
    }

    #[test]
    fn test_events_ending_at_max() {
        let events = vec![
            event("early", 1, 0, 10),
            event("outer", 1, u64::MAX - 20, 100),
            event("inner", 1, u64::MAX - 10, 5),
        ];
        let warnings = validate_overlaps(&events);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].previous_end, u64::MAX);
        assert_eq!(warnings[0].kind, OverlapKind::Nested);
    }

    #[test]
    fn test_input_left_untouched() {
        let events = vec![event("x", 1, 30, 50), event("y", 1, 0, 50)];
        let copy = events.clone();
        validate_overlaps(&events);
        assert_eq!(events, copy);
    }
}
