use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use trace_synth_analysis::{summarize, validate_overlaps};
use trace_synth_common::{OutputShape, TimestampPolicy};
use trace_synth_generator::generate;
use trace_synth_writer::{read_trace, write_trace};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod report;

use config::TraceConfig;

#[derive(Parser, Debug)]
#[command(
    name = "trace-synth",
    about = "Generate synthetic trace-event JSON for exercising trace viewers",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Defaults to `generate` with built-in settings.
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Generate a trace file, then check it for overlapping events.
    Generate(GenerateArgs),

    /// Load an existing trace file and report overlaps and statistics.
    Check {
        /// Trace JSON (array or object shape)
        path: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct GenerateArgs {
    /// TOML config file; flags given here override its keys
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of events to generate
    #[arg(long)]
    event_count: Option<usize>,

    /// Destination file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Timestamp assignment policy
    #[arg(long, value_enum)]
    policy: Option<PolicyOpt>,

    /// JSON layout of the output
    #[arg(long, value_enum)]
    shape: Option<ShapeOpt>,

    /// Thread pool size (ids 1..=N)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    threads: Option<u32>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum PolicyOpt {
    /// Per-thread cursor with jitter, grouped by thread
    Offset,
    /// Nest inside the immediately preceding event, sorted by time
    Nesting,
    /// Call-stack nesting with no crossing overlaps, sorted by time
    Stacked,
}

impl From<PolicyOpt> for TimestampPolicy {
    fn from(opt: PolicyOpt) -> Self {
        match opt {
            PolicyOpt::Offset => TimestampPolicy::Offset,
            PolicyOpt::Nesting => TimestampPolicy::Nesting,
            PolicyOpt::Stacked => TimestampPolicy::Stacked,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum ShapeOpt {
    /// Bare array, stringified fields
    Array,
    /// traceEvents + metadata object, numeric fields
    Object,
}

impl From<ShapeOpt> for OutputShape {
    fn from(opt: ShapeOpt) -> Self {
        match opt {
            ShapeOpt::Array => OutputShape::Array,
            ShapeOpt::Object => OutputShape::Object,
        }
    }
}

impl GenerateArgs {
    fn overrides(&self) -> TraceConfig {
        TraceConfig {
            event_count: self.event_count,
            output_path: self.output.clone(),
            seed: self.seed,
            policy: self.policy.map(Into::into),
            shape: self.shape.map(Into::into),
            thread_count: self.threads,
            ..TraceConfig::default()
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        None => run_generate(GenerateArgs::default()),
        Some(Cmd::Generate(args)) => run_generate(args),
        Some(Cmd::Check { path }) => run_check(path),
    }
}

/// Initialize tracing on stderr with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => config::load(path)?,
        None => TraceConfig::default(),
    };
    let plan = file_config.merge(args.overrides()).into_plan()?;

    let seed = match plan.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::random();
            info!(seed, "no seed configured, drew one");
            seed
        }
    };
    let mut rng = StdRng::seed_from_u64(seed);

    let trace = generate(&plan.params, &mut rng).context("generating trace")?;

    let metadata = plan.metadata(seed, trace.len());
    let bytes = write_trace(&plan.output_path, &trace.events, plan.shape, &metadata)
        .with_context(|| format!("writing {}", plan.output_path.display()))?;
    println!("{}", report::size_line(bytes));

    report::print_overlaps(&validate_overlaps(&trace.events));
    report::print_summary(&summarize(&trace.events));
    Ok(())
}

fn run_check(path: PathBuf) -> Result<()> {
    let loaded = read_trace(&path).with_context(|| format!("reading {}", path.display()))?;

    report::print_loaded(&path.display().to_string(), &loaded);
    report::print_overlaps(&validate_overlaps(&loaded.events));
    report::print_summary(&summarize(&loaded.events));
    Ok(())
}
