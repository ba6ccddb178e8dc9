use std::collections::HashSet;
use std::ops::RangeInclusive;

use rand::Rng;
use trace_synth_common::{
    Micros, ProcessId, ThreadId, TimestampPolicy, TraceError, DEFAULT_PROCESS_ID, MAX_DURATION,
    MIN_DURATION,
};

/// Default number of events in a generated trace.
pub const DEFAULT_EVENT_COUNT: usize = 500_000;

/// Default size of the simulated thread pool (ids `1..=30`).
pub const DEFAULT_THREAD_COUNT: u32 = 30;

/// Chance that an event is nested inside an earlier one.
pub const DEFAULT_NEST_PROBABILITY: f64 = 0.3;

const PREFIXES: [&str; 10] = [
    "PUC", "PUS", "DC", "DU", "CON", "ORA", "SYS", "SR", "PRA", "RI",
];

const SUFFIXES: [&str; 10] = [
    "Process", "Request", "Operation", "Task", "Handler", "Stream", "Buffer", "Queue", "Event",
    "Worker",
];

const CATEGORIES: [&str; 6] = ["rendering", "computing", "io", "network", "painting", "gc"];

/// Where event names come from.
#[derive(Clone, Debug, PartialEq)]
pub enum NameVocabulary {
    /// `"<prefix> <suffix>"`, each token drawn independently.
    Composite {
        prefixes: Vec<String>,
        suffixes: Vec<String>,
    },
    /// One name drawn from a fixed list.
    Fixed(Vec<String>),
}

impl Default for NameVocabulary {
    fn default() -> Self {
        NameVocabulary::Composite {
            prefixes: Self::default_prefixes(),
            suffixes: Self::default_suffixes(),
        }
    }
}

impl NameVocabulary {
    pub fn default_prefixes() -> Vec<String> {
        PREFIXES.iter().map(|s| s.to_string()).collect()
    }

    pub fn default_suffixes() -> Vec<String> {
        SUFFIXES.iter().map(|s| s.to_string()).collect()
    }

    /// Draw one event name.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        match self {
            NameVocabulary::Composite { prefixes, suffixes } => {
                let prefix = pick(prefixes, rng);
                let suffix = pick(suffixes, rng);
                format!("{prefix} {suffix}")
            }
            NameVocabulary::Fixed(names) => pick(names, rng).clone(),
        }
    }

    fn validate(&self) -> Result<(), TraceError> {
        let empty = match self {
            NameVocabulary::Composite { prefixes, suffixes } => {
                prefixes.is_empty() || suffixes.is_empty()
            }
            NameVocabulary::Fixed(names) => names.is_empty(),
        };
        if empty {
            return Err(TraceError::InvalidParams(
                "name vocabulary has an empty token list".to_string(),
            ));
        }
        Ok(())
    }
}

/// Uniform choice from a non-empty slice.
pub(crate) fn pick<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

/// Everything `generate` needs to know about one run.
#[derive(Clone, Debug)]
pub struct GeneratorParams {
    pub event_count: usize,
    pub process_id: ProcessId,
    /// Distinct thread ids events are spread across, in output order.
    pub thread_pool: Vec<ThreadId>,
    pub categories: Vec<String>,
    pub names: NameVocabulary,
    pub policy: TimestampPolicy,
    /// Probability that the nesting policies place an event inside another.
    pub nest_probability: f64,
    pub duration: RangeInclusive<Micros>,
    /// Start window for the first event on a thread (nesting policies).
    pub first_start: RangeInclusive<Micros>,
    /// Offset policy: random lead added to the cursor for each start time.
    pub jitter: RangeInclusive<Micros>,
    /// Idle time inserted after an event before the next one.
    pub gap: RangeInclusive<Micros>,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            event_count: DEFAULT_EVENT_COUNT,
            process_id: DEFAULT_PROCESS_ID,
            thread_pool: (1..=DEFAULT_THREAD_COUNT).collect(),
            categories: CATEGORIES.iter().map(|s| s.to_string()).collect(),
            names: NameVocabulary::default(),
            policy: TimestampPolicy::default(),
            nest_probability: DEFAULT_NEST_PROBABILITY,
            duration: MIN_DURATION..=MAX_DURATION,
            first_start: 0..=1000,
            jitter: 0..=50,
            gap: 1..=20,
        }
    }
}

impl GeneratorParams {
    /// Shortest duration an event can be given.
    pub fn min_duration(&self) -> Micros {
        *self.duration.start()
    }

    /// Reject parameter sets that would make generation panic or loop.
    pub fn validate(&self) -> Result<(), TraceError> {
        if self.thread_pool.is_empty() {
            return Err(TraceError::InvalidParams("thread pool is empty".to_string()));
        }
        let mut seen = HashSet::with_capacity(self.thread_pool.len());
        if let Some(dup) = self.thread_pool.iter().find(|tid| !seen.insert(**tid)) {
            return Err(TraceError::InvalidParams(format!(
                "thread id {dup} appears more than once in the pool"
            )));
        }
        if self.categories.is_empty() {
            return Err(TraceError::InvalidParams("category list is empty".to_string()));
        }
        self.names.validate()?;

        for (label, range) in [
            ("duration", &self.duration),
            ("first_start", &self.first_start),
            ("jitter", &self.jitter),
            ("gap", &self.gap),
        ] {
            if range.is_empty() {
                return Err(TraceError::InvalidParams(format!(
                    "{label} range {}..={} is empty",
                    range.start(),
                    range.end()
                )));
            }
        }
        if self.min_duration() == 0 {
            return Err(TraceError::InvalidParams(
                "minimum duration must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.nest_probability) {
            return Err(TraceError::InvalidParams(format!(
                "nest probability {} is outside [0, 1]",
                self.nest_probability
            )));
        }
        Ok(())
    }
}
