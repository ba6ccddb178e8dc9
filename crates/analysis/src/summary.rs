use std::collections::{HashMap, HashSet};
use std::fmt;

use trace_synth_common::{Micros, ProcessId, TraceEvent};

/// Name and duration of a notable event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventExtreme {
    pub name: String,
    pub dur: Micros,
}

impl From<&TraceEvent> for EventExtreme {
    fn from(event: &TraceEvent) -> Self {
        Self {
            name: event.name.clone(),
            dur: event.dur,
        }
    }
}

/// Aggregate statistics over a set of events.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TraceSummary {
    pub total_events: usize,
    pub average_duration: f64,
    pub longest: Option<EventExtreme>,
    pub shortest: Option<EventExtreme>,
    /// Earliest start.
    pub start: Micros,
    /// Latest end.
    pub end: Micros,
    pub thread_count: usize,
    /// Events per category, most frequent first (ties by name).
    pub categories: Vec<(String, usize)>,
    /// Events per process, most frequent first (ties by pid).
    pub processes: Vec<(ProcessId, usize)>,
}

impl TraceSummary {
    pub fn span(&self) -> Micros {
        self.end - self.start
    }
}

/// Compute a [`TraceSummary`]. Empty input yields the zero summary.
pub fn summarize(events: &[TraceEvent]) -> TraceSummary {
    if events.is_empty() {
        return TraceSummary::default();
    }

    let total_dur: u128 = events.iter().map(|e| e.dur as u128).sum();
    let start = events.iter().map(|e| e.ts).min().unwrap_or(0);
    let end = events.iter().map(TraceEvent::end).max().unwrap_or(0);
    let threads: HashSet<_> = events.iter().map(|e| e.tid).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for event in events {
        *counts.entry(event.category.as_str()).or_default() += 1;
    }
    let mut categories: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut per_process: HashMap<ProcessId, usize> = HashMap::new();
    for event in events {
        *per_process.entry(event.pid).or_default() += 1;
    }
    let mut processes: Vec<(ProcessId, usize)> = per_process.into_iter().collect();
    processes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    TraceSummary {
        total_events: events.len(),
        average_duration: total_dur as f64 / events.len() as f64,
        longest: events.iter().max_by_key(|e| e.dur).map(EventExtreme::from),
        shortest: events.iter().min_by_key(|e| e.dur).map(EventExtreme::from),
        start,
        end,
        thread_count: threads.len(),
        categories,
        processes,
    }
}

impl fmt::Display for TraceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Events: {} | Threads: {} | Time: {}..{} (span {})\n\
             Duration avg: {:.1}",
            self.total_events,
            self.thread_count,
            self.start,
            self.end,
            self.span(),
            self.average_duration,
        )?;
        if let (Some(longest), Some(shortest)) = (&self.longest, &self.shortest) {
            write!(
                f,
                " | longest: {} ({}) | shortest: {} ({})",
                longest.name, longest.dur, shortest.name, shortest.dur
            )?;
        }
        if !self.categories.is_empty() {
            let parts: Vec<String> = self
                .categories
                .iter()
                .map(|(name, count)| format!("{name}={count}"))
                .collect();
            write!(f, "\nCategories: {}", parts.join(", "))?;
        }
        if !self.processes.is_empty() {
            let parts: Vec<String> = self
                .processes
                .iter()
                .map(|(pid, count)| format!("pid {pid}={count}"))
                .collect();
            write!(f, "\nProcesses: {}", parts.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_synth_common::{Phase, DEFAULT_PROCESS_ID};

    fn event(name: &str, cat: &str, tid: u32, ts: Micros, dur: Micros) -> TraceEvent {
        TraceEvent {
            name: name.to_string(),
            category: cat.to_string(),
            phase: Phase::Complete,
            pid: DEFAULT_PROCESS_ID,
            tid,
            ts,
            dur,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary, TraceSummary::default());
        assert_eq!(summary.span(), 0);
        assert_eq!(summary.to_string(), "Events: 0 | Threads: 0 | Time: 0..0 (span 0)\nDuration avg: 0.0");
    }

    #[test]
    fn test_summary_counts() {
        let events = vec![
            event("a", "gc", 1, 100, 10),
            event("b", "io", 2, 50, 90),
            event("c", "gc", 1, 200, 40),
        ];
        let summary = summarize(&events);

        assert_eq!(summary.total_events, 3);
        assert_eq!(summary.thread_count, 2);
        assert_eq!(summary.start, 50);
        assert_eq!(summary.end, 240);
        assert_eq!(summary.span(), 190);
        assert!((summary.average_duration - 140.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.longest.as_ref().map(|e| e.name.as_str()), Some("b"));
        assert_eq!(summary.shortest.as_ref().map(|e| e.dur), Some(10));
        assert_eq!(
            summary.categories,
            vec![("gc".to_string(), 2), ("io".to_string(), 1)]
        );
        assert!(summary.to_string().contains("Categories: gc=2, io=1"));
        assert_eq!(summary.processes, vec![(1, 3)]);
    }

    #[test]
    fn test_process_distribution() {
        let mut events = vec![
            event("a", "gc", 1, 0, 10),
            event("b", "gc", 1, 20, 10),
            event("c", "gc", 2, 0, 10),
            event("d", "gc", 2, 40, 10),
        ];
        events[1].pid = 7;
        events[2].pid = 7;
        events[3].pid = 3;

        let summary = summarize(&events);
        assert_eq!(summary.processes, vec![(7, 2), (1, 1), (3, 1)]);
        assert!(summary
            .to_string()
            .ends_with("\nProcesses: pid 7=2, pid 1=1, pid 3=1"));
    }

    #[test]
    fn test_end_at_max_does_not_overflow() {
        let events = vec![event("a", "gc", 1, u64::MAX - 5, 10), event("b", "gc", 1, 0, 10)];
        let summary = summarize(&events);
        assert_eq!(summary.end, u64::MAX);
        assert_eq!(summary.span(), u64::MAX);
    }
}
