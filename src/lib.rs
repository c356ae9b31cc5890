//! Borehole Combine: depth-interval assembly for geotechnical group data
//!
//! Takes AGS-style group tables (CORE, GEOL, WETH, FRAC, ...) and produces a
//! single depth-indexed table per borehole, recording every data-quality
//! issue on the way instead of dropping records silently.
//!
//! ## Architecture
//!
//! - **Collector**: run-scoped warning log and metrics (`quality`)
//! - **Depth Extractor**: depth breakpoints from one group for one borehole
//! - **Interval Builder**: sorted, de-duplicated, non-degenerate intervals
//! - **Borehole Assembler**: union of breakpoints plus per-group row joins
//! - **Combiner**: every borehole in a project, with a summary at the end

pub mod config;
pub mod types;
pub mod quality;
pub mod depth;
pub mod assembly;

// Re-export configuration
pub use config::{CombineConfig, ConfigError};

// Re-export commonly used types
pub use types::{
    CellValue, ColumnKey, CombinedRecord, CombinedTable, Counter, DepthInterval, GroupSet,
    GroupTable, GroupValues, Metrics, Severity, TableError, Warning, WarningCategory,
};

// Re-export pipeline components
pub use assembly::{BoreholeAssembler, BoreholeOutcome, Combiner, ProjectSource};
pub use depth::{DepthExtraction, DepthExtractor, GroupView, IntervalBuild, IntervalBuilder};
pub use quality::{Collector, QualitySummary, WarningFilter, Warnings};
