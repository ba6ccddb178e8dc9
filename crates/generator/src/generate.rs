use rand::Rng;
use trace_synth_common::{Phase, TimestampPolicy, TraceError, TraceEvent};
use tracing::{debug, info};

use crate::params::{pick, GeneratorParams};
use crate::timeline::ThreadTimeline;

/// Output of one generation run.
#[derive(Clone, Debug, Default)]
pub struct GeneratedTrace {
    /// Events in output order.
    pub events: Vec<TraceEvent>,
    /// `parents[i]` is the index in `events` of the event that `events[i]`
    /// was nested into, if any.
    pub parents: Vec<Option<usize>>,
}

impl GeneratedTrace {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// `(parent, child)` pairs for every nested event.
    pub fn nested_pairs(&self) -> impl Iterator<Item = (&TraceEvent, &TraceEvent)> {
        self.parents
            .iter()
            .enumerate()
            .filter_map(|(child, parent)| parent.map(|p| (&self.events[p], &self.events[child])))
    }
}

/// Generate a synthetic trace.
///
/// Every event gets a random thread from the pool, a random duration, name
/// and category. Start times are then assigned by `params.policy`:
/// - `Offset`: per-thread cursor pass after all events exist; output grouped
///   by thread in pool order.
/// - `Nesting` / `Stacked`: placed as they arrive; output sorted by start
///   time (stable, so ties keep generation order).
pub fn generate<R: Rng + ?Sized>(
    params: &GeneratorParams,
    rng: &mut R,
) -> Result<GeneratedTrace, TraceError> {
    params.validate()?;

    let mut timelines: Vec<ThreadTimeline> = params
        .thread_pool
        .iter()
        .map(|_| ThreadTimeline::new())
        .collect();
    let mut events = Vec::with_capacity(params.event_count);
    let mut parents = Vec::with_capacity(params.event_count);

    for index in 0..params.event_count {
        let name = params.names.pick(rng);
        let slot = rng.random_range(0..params.thread_pool.len());
        let dur = rng.random_range(params.duration.clone());
        let category = pick(&params.categories, rng).clone();

        let timeline = &mut timelines[slot];
        let placement = match params.policy {
            TimestampPolicy::Offset => {
                timeline.push(index);
                None
            }
            TimestampPolicy::Nesting => Some(timeline.place_nested(index, dur, params, rng)),
            TimestampPolicy::Stacked => Some(timeline.place_stacked(index, dur, params, rng)),
        };

        let (ts, dur, parent) = match placement {
            Some(p) => (p.ts, p.dur, p.parent),
            None => (0, dur, None),
        };
        events.push(TraceEvent {
            name,
            category,
            phase: Phase::Complete,
            pid: params.process_id,
            tid: params.thread_pool[slot],
            ts,
            dur,
        });
        parents.push(parent);
    }

    for (timeline, tid) in timelines.iter().zip(&params.thread_pool) {
        debug!(tid, events = timeline.len(), "thread timeline built");
    }

    let order: Vec<usize> = match params.policy {
        TimestampPolicy::Offset => {
            for timeline in &timelines {
                timeline.assign_offsets(&mut events, params, rng);
            }
            timelines
                .iter()
                .flat_map(|t| t.members().iter().copied())
                .collect()
        }
        TimestampPolicy::Nesting | TimestampPolicy::Stacked => {
            let mut order: Vec<usize> = (0..events.len()).collect();
            order.sort_by_key(|&i| events[i].ts);
            order
        }
    };

    info!(
        events = events.len(),
        threads = params.thread_pool.len(),
        policy = %params.policy,
        "trace generated"
    );
    Ok(reorder(events, parents, &order))
}

/// Permute events into `order`, rewriting parent links to the new indices.
fn reorder(
    events: Vec<TraceEvent>,
    parents: Vec<Option<usize>>,
    order: &[usize],
) -> GeneratedTrace {
    let mut position = vec![0; order.len()];
    for (new, &old) in order.iter().enumerate() {
        position[old] = new;
    }

    let mut slots: Vec<Option<TraceEvent>> = events.into_iter().map(Some).collect();
    let mut out = GeneratedTrace {
        events: Vec::with_capacity(order.len()),
        parents: Vec::with_capacity(order.len()),
    };
    for &old in order {
        if let Some(event) = slots[old].take() {
            out.events.push(event);
            out.parents.push(parents[old].map(|p| position[p]));
        }
    }
    out
}
