pub mod reader;
pub mod writer;

pub use reader::{parse_trace, read_trace, repair_legacy_array, LoadedTrace};
pub use writer::{encode_trace, megabytes, write_trace, TraceMetadata, TraceWriter};
