//! Depth handling: breakpoint extraction per group and interval construction.

mod extractor;
mod intervals;

pub use extractor::{DepthExtraction, DepthExtractor, GroupView, RowSpan};
pub use intervals::{IntervalBuild, IntervalBuilder, MIN_DEPTH_POINTS};
