use trace_synth_analysis::{OverlapKind, OverlapWarning, TraceSummary};
use trace_synth_writer::{megabytes, LoadedTrace};

/// Counts of each overlap kind found by the validation pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct OverlapCounts {
    pub nested: usize,
    pub crossing: usize,
}

impl OverlapCounts {
    pub fn tally(warnings: &[OverlapWarning]) -> Self {
        let mut counts = Self::default();
        for warning in warnings {
            match warning.kind {
                OverlapKind::Nested => counts.nested += 1,
                OverlapKind::Crossing => counts.crossing += 1,
            }
        }
        counts
    }
}

/// Console lines for the overlap check: one per flagged pair, in the order
/// found, then a line of totals.
pub fn overlap_lines(warnings: &[OverlapWarning]) -> Vec<String> {
    let counts = OverlapCounts::tally(warnings);
    warnings
        .iter()
        .map(|warning| format!("Overlap detected on {warning}"))
        .chain(std::iter::once(format!(
            "Overlap check: {} crossing, {} nested (parent/child) adjacent pairs",
            counts.crossing, counts.nested
        )))
        .collect()
}

pub fn print_overlaps(warnings: &[OverlapWarning]) {
    for line in overlap_lines(warnings) {
        println!("{line}");
    }
}

/// The file size line printed after a trace is written.
pub fn size_line(bytes: u64) -> String {
    format!("Generated trace data file size: {:.2}MB", megabytes(bytes))
}

pub fn print_summary(summary: &TraceSummary) {
    println!("\n=== Summary ===");
    println!("{summary}");
}

/// Header for `check`: what kind of file was loaded.
pub fn print_loaded(path: &str, loaded: &LoadedTrace) {
    println!("=== Trace: {path} ({} shape) ===", loaded.shape);
    if loaded.repaired {
        println!("File was an unterminated array; closed it before parsing.");
    }
    if loaded.skipped > 0 {
        println!("Skipped {} events that are not complete ('X') events.", loaded.skipped);
    }
    if loaded.untimed > 0 {
        println!("Skipped {} complete events with no duration.", loaded.untimed);
    }
    if let Some(meta) = &loaded.metadata {
        println!(
            "Metadata: generated_at={} event_count={} seed={} policy={}",
            meta.generated_at, meta.event_count, meta.seed, meta.timestamp_policy
        );
        if meta.event_count != loaded.events.len() {
            println!(
                "Metadata event_count {} does not match {} events in file",
                meta.event_count,
                loaded.events.len()
            );
        }
    }
}
