use std::collections::BTreeMap;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;
use trace_synth_analysis::{validate_overlaps, OverlapKind};
use trace_synth_common::{OutputShape, TimestampPolicy};
use trace_synth_generator::{generate, GeneratedTrace, GeneratorParams};
use trace_synth_writer::{write_trace, TraceMetadata};

fn params(policy: TimestampPolicy, event_count: usize) -> GeneratorParams {
    GeneratorParams {
        event_count,
        policy,
        thread_pool: (1..=10).collect(),
        ..GeneratorParams::default()
    }
}

fn run(params: &GeneratorParams, seed: u64) -> GeneratedTrace {
    generate(params, &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn write(
    path: &Path,
    trace: &GeneratedTrace,
    shape: OutputShape,
    policy: TimestampPolicy,
    seed: u64,
) -> u64 {
    let metadata = TraceMetadata::pinned(trace.len(), seed, policy);
    write_trace(path, &trace.events, shape, &metadata).unwrap()
}

// =========================================================================
// Test: three events on a single thread with the offset policy
// =========================================================================
#[test]
fn test_three_events_single_thread_offset() {
    let params = GeneratorParams {
        event_count: 3,
        thread_pool: vec![1],
        policy: TimestampPolicy::Offset,
        ..GeneratorParams::default()
    };
    let trace = run(&params, 17);

    assert_eq!(trace.len(), 3);
    let mut min_cursor = 0;
    let mut max_cursor = 0;
    for event in &trace.events {
        assert_eq!(event.tid, 1);
        assert!((10..=100).contains(&event.dur));
        // Start = cursor + [0, 50]; cursor grows by dur + [1, 20].
        assert!(event.ts >= min_cursor && event.ts <= max_cursor + 50);
        min_cursor += event.dur + 1;
        max_cursor += event.dur + 20;
    }
}

// =========================================================================
// Test: durations and thread ids stay in range for every policy
// =========================================================================
#[test]
fn test_ranges_hold_for_every_policy() {
    for policy in [
        TimestampPolicy::Offset,
        TimestampPolicy::Nesting,
        TimestampPolicy::Stacked,
    ] {
        let params = params(policy, 5_000);
        let trace = run(&params, 1234);
        assert_eq!(trace.len(), 5_000);
        for event in &trace.events {
            assert!((10..=100).contains(&event.dur), "{policy}: dur {}", event.dur);
            assert!(params.thread_pool.contains(&event.tid), "{policy}: tid {}", event.tid);
        }
    }
}

// =========================================================================
// Test: array output parses as N stringified event objects
// =========================================================================
#[test]
fn test_array_file_parses() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trace.json");
    let trace = run(&params(TimestampPolicy::Offset, 250), 3);
    write(&path, &trace, OutputShape::Array, TimestampPolicy::Offset, 3);

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let events = parsed.as_array().unwrap();
    assert_eq!(events.len(), 250);
    assert_eq!(events[0]["ph"], "X");
    assert_eq!(events[0]["pid"], "1");
    assert!(events[0]["ts"].is_string());
}

// =========================================================================
// Test: object output carries traceEvents and a matching event_count
// =========================================================================
#[test]
fn test_object_file_parses() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trace.json");
    let trace = run(&params(TimestampPolicy::Nesting, 400), 8);
    write(&path, &trace, OutputShape::Object, TimestampPolicy::Nesting, 8);

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed["traceEvents"].as_array().unwrap().len(), 400);
    assert_eq!(parsed["metadata"]["event_count"], 400);
    assert_eq!(parsed["metadata"]["seed"], 8);
    assert!(parsed["traceEvents"][0]["ts"].is_u64());
}

// =========================================================================
// Test: same seed, five events, identical bytes on disk
// =========================================================================
#[test]
fn test_seeded_runs_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    for shape in [OutputShape::Array, OutputShape::Object] {
        for policy in [TimestampPolicy::Offset, TimestampPolicy::Nesting] {
            let first = dir.path().join(format!("a-{shape}-{policy}.json"));
            let second = dir.path().join(format!("b-{shape}-{policy}.json"));
            let params = params(policy, 5);

            write(&first, &run(&params, 2024), shape, policy, 2024);
            write(&second, &run(&params, 2024), shape, policy, 2024);

            let a = std::fs::read(&first).unwrap();
            let b = std::fs::read(&second).unwrap();
            assert_eq!(a, b, "{shape}/{policy} differs");
        }
    }
}

// =========================================================================
// Test: nesting policy keeps each child inside its parent
// =========================================================================
#[test]
fn test_nesting_children_within_parents() {
    let trace = run(&params(TimestampPolicy::Nesting, 10_000), 77);

    let mut nested = 0;
    for (parent, child) in trace.nested_pairs() {
        assert_eq!(parent.tid, child.tid);
        assert!(parent.ts <= child.ts);
        assert!(child.ts + child.dur <= parent.ts + parent.dur);
        nested += 1;
    }
    assert!(nested > 1_000, "only {nested} nested events");
    assert!(trace.events.windows(2).all(|w| w[0].ts <= w[1].ts));
}

// =========================================================================
// Test: offset policy gives per-thread starts ordered by cursor
// =========================================================================
#[test]
fn test_offset_per_thread_starts_sorted() {
    let trace = run(&params(TimestampPolicy::Offset, 3_000), 55);

    let mut by_thread: BTreeMap<u32, Vec<u64>> = BTreeMap::new();
    for event in &trace.events {
        by_thread.entry(event.tid).or_default().push(event.ts);
    }
    // Output is grouped by thread, so each tid forms one contiguous run.
    let mut runs: Vec<u32> = trace.events.iter().map(|e| e.tid).collect();
    runs.dedup();
    assert_eq!(runs.len(), by_thread.len());

    for starts in by_thread.values_mut() {
        starts.sort();
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    }
}

// =========================================================================
// Test: stacked policy produces no crossing overlaps
// =========================================================================
#[test]
fn test_stacked_has_no_crossing_overlaps() {
    let trace = run(&params(TimestampPolicy::Stacked, 20_000), 9);
    let warnings = validate_overlaps(&trace.events);

    assert!(warnings.iter().all(|w| w.kind == OverlapKind::Nested));
    assert!(!warnings.is_empty());
}

// =========================================================================
// Test: validation reports but never alters the generated events
// =========================================================================
#[test]
fn test_validation_is_advisory() {
    let trace = run(&params(TimestampPolicy::Offset, 5_000), 31);
    let before = trace.events.clone();

    let warnings = validate_overlaps(&trace.events);
    assert_eq!(trace.events, before);
    for warning in &warnings {
        assert!(warning.previous_end > warning.next_start);
    }
}
