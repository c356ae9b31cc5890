//! Shared data structures for borehole depth-interval assembly
//!
//! This module defines the types that flow through the combine pipeline:
//! - Input: GroupTable / GroupSet (per-group rows from an upstream parser)
//! - Output: DepthInterval, CombinedRecord, CombinedTable
//! - Quality: Severity, WarningCategory, Warning, Metrics

mod table;
mod interval;
mod quality;

pub use table::*;
pub use interval::*;
pub use quality::*;
