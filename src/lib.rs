pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod source;
pub mod types;

pub use error::{CleanerError, Result};
pub use pipeline::{clean, CleanOutcome, CleanReport, CleaningPipeline, PipelineOptions};
pub use types::{Cell, ColumnKind, Table};
