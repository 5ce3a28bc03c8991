pub mod aggregation;
pub mod deletion;
pub mod ingestion;
pub mod windows;

pub use aggregation::AggregationService;
pub use deletion::{DeletionReport, DeletionService};
pub use ingestion::{IngestionPipeline, SyncReport, WindowOutcome};
