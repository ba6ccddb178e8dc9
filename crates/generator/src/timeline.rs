use rand::Rng;
use trace_synth_common::{Micros, TraceEvent};

use crate::params::GeneratorParams;

/// Where a newly generated event lands on its thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub ts: Micros,
    /// Duration after clamping to fit a parent.
    pub dur: Micros,
    /// Index (generation order) of the event this one was nested into.
    pub parent: Option<usize>,
}

/// The event most recently placed on a thread.
#[derive(Clone, Copy, Debug)]
struct Placed {
    index: usize,
    ts: Micros,
    dur: Micros,
}

impl Placed {
    fn end(&self) -> Micros {
        self.ts + self.dur
    }
}

/// An ancestor interval that can still receive children.
#[derive(Clone, Copy, Debug)]
struct OpenInterval {
    index: usize,
    end: Micros,
    /// Earliest start still free after the last child placed inside.
    fill: Micros,
}

/// Generation-time state for one simulated thread.
///
/// Holds the indices of the events assigned to the thread in creation order,
/// plus whatever each timestamp policy needs to place the next event.
#[derive(Debug, Default)]
pub struct ThreadTimeline {
    members: Vec<usize>,
    previous: Option<Placed>,
    open: Vec<OpenInterval>,
    root_end: Option<Micros>,
}

impl ThreadTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event indices assigned to this thread, in creation order.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Assign an event to this thread without placing it yet (offset policy).
    pub fn push(&mut self, index: usize) {
        self.members.push(index);
    }

    /// Offset policy: walk the thread's events in creation order with a cursor
    /// starting at zero. Each start is `cursor + jitter`, and the cursor then
    /// advances by `dur + gap` from its own position, not from the start.
    pub fn assign_offsets<R: Rng + ?Sized>(
        &self,
        events: &mut [TraceEvent],
        params: &GeneratorParams,
        rng: &mut R,
    ) {
        let mut cursor: Micros = 0;
        for &index in &self.members {
            let event = &mut events[index];
            event.ts = cursor + rng.random_range(params.jitter.clone());
            cursor += event.dur + rng.random_range(params.gap.clone());
        }
    }

    /// Nesting policy: only the immediately preceding event on the thread is
    /// considered as a parent. A non-nested event follows the preceding one's
    /// end, which may still cut into an older ancestor.
    pub fn place_nested<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        dur: Micros,
        params: &GeneratorParams,
        rng: &mut R,
    ) -> Placement {
        let placement = match self.previous {
            None => Placement {
                ts: rng.random_range(params.first_start.clone()),
                dur,
                parent: None,
            },
            Some(prev) if rng.random_bool(params.nest_probability) => {
                let dur = dur.min(prev.dur);
                Placement {
                    ts: rng.random_range(prev.ts..=prev.end() - dur),
                    dur,
                    parent: Some(prev.index),
                }
            }
            Some(prev) => Placement {
                ts: prev.end() + rng.random_range(params.gap.clone()),
                dur,
                parent: None,
            },
        };

        self.previous = Some(Placed {
            index,
            ts: placement.ts,
            dur: placement.dur,
        });
        self.members.push(index);
        placement
    }

    /// Stacked policy: the open intervals form a call stack. A nesting draw
    /// places the event inside the innermost open interval; otherwise the
    /// innermost interval is closed first and the event becomes its sibling.
    /// Intervals without room for the shortest duration are closed on the way
    /// out. With nothing left open the event starts a new root after the last
    /// one. Children are placed after their earlier siblings, so every pair of
    /// events on the thread is either disjoint or nested.
    pub fn place_stacked<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        dur: Micros,
        params: &GeneratorParams,
        rng: &mut R,
    ) -> Placement {
        if !self.open.is_empty() && !rng.random_bool(params.nest_probability) {
            self.open.pop();
        }

        let mut nested = None;
        while let Some(top) = self.open.last_mut() {
            let room = top.end - top.fill;
            if room >= params.min_duration() {
                let dur = dur.min(room);
                let ts = rng.random_range(top.fill..=top.end - dur);
                top.fill = ts + dur;
                nested = Some(Placement {
                    ts,
                    dur,
                    parent: Some(top.index),
                });
                break;
            }
            self.open.pop();
        }

        let placement = match nested {
            Some(placement) => placement,
            None => {
                self.open.clear();
                let ts = match self.root_end {
                    None => rng.random_range(params.first_start.clone()),
                    Some(end) => end + rng.random_range(params.gap.clone()),
                };
                self.root_end = Some(ts + dur);
                Placement {
                    ts,
                    dur,
                    parent: None,
                }
            }
        };

        self.open.push(OpenInterval {
            index,
            end: placement.ts + placement.dur,
            fill: placement.ts,
        });
        self.members.push(index);
        placement
    }
}
