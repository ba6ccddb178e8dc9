//! Synthetic trace generation: random events spread over a thread pool, with
//! start times assigned by one of the timestamp policies.

pub mod generate;
pub mod params;
pub mod timeline;

pub use generate::{generate, GeneratedTrace};
pub use params::{GeneratorParams, NameVocabulary};
pub use timeline::{Placement, ThreadTimeline};
