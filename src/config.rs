use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;
use trace_synth_common::{OutputShape, TimestampPolicy};
use trace_synth_generator::{GeneratorParams, NameVocabulary};
use trace_synth_writer::TraceMetadata;

/// Output file used when neither the config file nor the CLI names one.
pub const DEFAULT_OUTPUT_PATH: &str = "test-data.json";

/// Generation settings from a TOML file or the command line. Every key is
/// optional; unset keys fall back to the built-in defaults.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    pub event_count: Option<usize>,
    pub output_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub policy: Option<TimestampPolicy>,
    pub shape: Option<OutputShape>,
    pub process_id: Option<u32>,
    /// Explicit thread id pool.
    pub threads: Option<Vec<u32>>,
    /// Shorthand for a pool of `1..=thread_count`.
    pub thread_count: Option<u32>,
    pub categories: Option<Vec<String>>,
    pub nest_probability: Option<f64>,
    pub names: Option<NamesConfig>,
}

/// `[names]` table: either `prefixes` + `suffixes`, or `fixed`.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NamesConfig {
    pub prefixes: Option<Vec<String>>,
    pub suffixes: Option<Vec<String>>,
    pub fixed: Option<Vec<String>>,
}

/// Fully resolved settings for one `generate` run.
#[derive(Debug)]
pub struct RunPlan {
    pub params: GeneratorParams,
    pub output_path: PathBuf,
    pub seed: Option<u64>,
    pub shape: OutputShape,
}

impl RunPlan {
    /// Metadata for a run that used `seed`. A configured seed pins
    /// `generated_at` to the epoch so repeated runs write identical bytes; a
    /// drawn seed gets the wall-clock time.
    pub fn metadata(&self, seed: u64, event_count: usize) -> TraceMetadata {
        match self.seed {
            Some(_) => TraceMetadata::pinned(event_count, seed, self.params.policy),
            None => TraceMetadata::now(event_count, seed, self.params.policy),
        }
    }
}

/// Load a config file.
pub fn load(path: &Path) -> anyhow::Result<TraceConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: TraceConfig =
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

impl TraceConfig {
    /// Layer `over` on top of `self`; keys set in `over` win.
    pub fn merge(self, over: TraceConfig) -> TraceConfig {
        let pool_overridden = over.threads.is_some() || over.thread_count.is_some();
        let (threads, thread_count) = if pool_overridden {
            (over.threads, over.thread_count)
        } else {
            (self.threads, self.thread_count)
        };

        TraceConfig {
            event_count: over.event_count.or(self.event_count),
            output_path: over.output_path.or(self.output_path),
            seed: over.seed.or(self.seed),
            policy: over.policy.or(self.policy),
            shape: over.shape.or(self.shape),
            process_id: over.process_id.or(self.process_id),
            threads,
            thread_count,
            categories: over.categories.or(self.categories),
            nest_probability: over.nest_probability.or(self.nest_probability),
            names: over.names.or(self.names),
        }
    }

    /// Fill in defaults and produce the run plan.
    pub fn into_plan(self) -> anyhow::Result<RunPlan> {
        let mut params = GeneratorParams::default();

        if let Some(n) = self.event_count {
            params.event_count = n;
        }
        if let Some(pid) = self.process_id {
            params.process_id = pid;
        }
        match (self.threads, self.thread_count) {
            (Some(_), Some(_)) => bail!("set either `threads` or `thread_count`, not both"),
            (Some(threads), None) => params.thread_pool = threads,
            (None, Some(count)) => params.thread_pool = (1..=count).collect(),
            (None, None) => {}
        }
        if let Some(categories) = self.categories {
            params.categories = categories;
        }
        if let Some(p) = self.nest_probability {
            params.nest_probability = p;
        }
        if let Some(policy) = self.policy {
            params.policy = policy;
        }
        if let Some(names) = self.names {
            params.names = names.into_vocabulary()?;
        }
        params.validate()?;

        Ok(RunPlan {
            params,
            output_path: self
                .output_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            seed: self.seed,
            shape: self.shape.unwrap_or_default(),
        })
    }
}

impl NamesConfig {
    fn into_vocabulary(self) -> anyhow::Result<NameVocabulary> {
        match (self.fixed, self.prefixes, self.suffixes) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                bail!("[names] takes either `fixed` or `prefixes`/`suffixes`, not both")
            }
            (Some(fixed), None, None) => Ok(NameVocabulary::Fixed(fixed)),
            (None, prefixes, suffixes) => Ok(NameVocabulary::Composite {
                prefixes: prefixes.unwrap_or_else(NameVocabulary::default_prefixes),
                suffixes: suffixes.unwrap_or_else(NameVocabulary::default_suffixes),
            }),
        }
    }
}
