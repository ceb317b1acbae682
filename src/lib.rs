// Building Reconcile - Core Library
// Lease transactions + building register → one summary per building and room type

pub mod lenient;
pub mod parser;
pub mod classifier;
pub mod registry;
pub mod aggregator;
pub mod report;

pub mod error;
pub mod source;
pub mod config;
pub mod export;
pub mod db;
pub mod pipeline;
pub mod logging;

// Re-export commonly used types
pub use parser::{
    BuildingType, RawRow, TransactionFields, RowExtractor, Malformed,
    extractor_for, extract_registry_record,
};
pub use classifier::{classify, RoomType};
pub use registry::{
    RegistryIndex, RegistryRecord, RegistryAttributes, MatchTier, Resolution,
};
pub use aggregator::{Batch, BatchStats, BuildingKey, BuildingRecord, RowOutcome, SkipReason};
pub use report::{
    assemble, BuildingSummary, Report, ReportStats, SummaryFilter, FilterStats,
};
pub use error::{ConfigError, SourceError};
pub use config::PipelineConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
