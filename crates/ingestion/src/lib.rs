//! # Ingestion
//!
//! Already-decoded telemetry into a [`Scenario`](vehicle::Scenario).
//!
//! Responsibilities:
//! - Read JSON-lines `IngestEvent`s with line-numbered parse errors
//! - Route each event to its system (time, references, link, track)
//! - Count what was applied, skipped and rejected
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{Ingestor, RecordReader};
//!
//! let mut ingestor = Ingestor::new(EngineConfig::default());
//! ingestor.ingest(RecordReader::open(Path::new("flight.jsonl"))?)?;
//! let (mut scenario, stats) = ingestor.finish();
//! scenario.process(true);
//! ```

mod error;
mod ingestor;
mod reader;
mod stats;

// Re-exports
pub use error::{IngestionError, Result};
pub use ingestor::{load_path, Ingestor};
pub use reader::RecordReader;
pub use stats::{IngestionStats, StatsSnapshot};
