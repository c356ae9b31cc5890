//! Interval Builder
//!
//! Turns a bag of depth breakpoints into ascending, contiguous,
//! non-degenerate intervals:
//!
//! 1. Flag the first out-of-order pair (recoverable, the points are re-sorted)
//! 2. Sort ascending and drop duplicates (within `tolerance`)
//! 3. Require at least two distinct points
//! 4. Pair consecutive points, discarding zero-length pairs
//!
//! Nothing fails hard: every rejection is a collector entry plus `ok = false`.

use crate::context;
use crate::quality::Collector;
use crate::types::{DepthInterval, WarningCategory};
use tracing::debug;

/// Distinct points needed to form one interval.
pub const MIN_DEPTH_POINTS: usize = 2;

/// Output of [`IntervalBuilder::build`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalBuild {
    pub intervals: Vec<DepthInterval>,
    pub ok: bool,
}

impl IntervalBuild {
    fn rejected() -> Self {
        Self::default()
    }
}

/// Builds depth intervals for one borehole at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntervalBuilder {
    tolerance: f64,
}

impl IntervalBuilder {
    /// Builder that only merges exactly equal points.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that also merges points closer than `tolerance`.
    ///
    /// Negative or non-finite tolerances are treated as zero.
    pub fn with_tolerance(tolerance: f64) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance
        } else {
            0.0
        };
        Self { tolerance }
    }

    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Record a `DEPTH_ORDERING_ERROR` for the first strictly decreasing
    /// adjacent pair in `points`. Returns `true` if the sequence was already
    /// non-decreasing.
    pub fn check_ordering(
        points: &[f64],
        borehole_id: &str,
        group: Option<&str>,
        collector: &mut Collector,
    ) -> bool {
        let Some(pos) = points.windows(2).position(|w| w[0] > w[1]) else {
            return true;
        };
        let (prev, next) = (points[pos], points[pos + 1]);
        let source = group.map_or_else(String::new, |g| format!(" in {g}"));
        let mut ctx = context! {
            "previous" => prev,
            "next" => next,
            "position" => pos,
        };
        if let Some(g) = group {
            ctx.insert("group".into(), g.to_string());
        }
        collector.warning(
            WarningCategory::DepthOrderingError,
            format!("Depths out of order{source} for borehole {borehole_id}: {prev} > {next}; re-sorted"),
            Some(borehole_id),
            ctx,
        );
        false
    }

    /// Sorted, de-duplicated finite points.
    pub fn normalize(&self, points: &[f64]) -> Vec<f64> {
        let mut sorted: Vec<f64> = points.iter().copied().filter(|p| p.is_finite()).collect();
        let dropped = points.len() - sorted.len();
        if dropped > 0 {
            debug!(dropped, "Ignored non-finite depth points");
        }
        sorted.sort_by(f64::total_cmp);

        let before = sorted.len();
        let mut unique: Vec<f64> = Vec::with_capacity(sorted.len());
        for p in sorted {
            match unique.last() {
                Some(&last) if p - last <= self.tolerance => {}
                _ => unique.push(p),
            }
        }
        if unique.len() < before {
            debug!(removed = before - unique.len(), tolerance = self.tolerance, "Merged duplicate depth points");
        }
        unique
    }

    /// Build intervals for `borehole_id` from `points`.
    pub fn build(&self, points: &[f64], borehole_id: &str, collector: &mut Collector) -> IntervalBuild {
        Self::check_ordering(points, borehole_id, None, collector);

        let unique = self.normalize(points);
        if unique.len() < MIN_DEPTH_POINTS {
            Self::insufficient(unique.len(), borehole_id, collector);
            return IntervalBuild::rejected();
        }

        let (intervals, zero_length) = pair_intervals(&unique);
        if zero_length > 0 {
            collector.warning(
                WarningCategory::ZeroLengthIntervals,
                format!("Excluded {zero_length} zero-length intervals for borehole {borehole_id}"),
                Some(borehole_id),
                context! { "count" => zero_length },
            );
        }

        if intervals.is_empty() {
            Self::insufficient(unique.len(), borehole_id, collector);
            return IntervalBuild::rejected();
        }

        IntervalBuild {
            intervals,
            ok: true,
        }
    }

    fn insufficient(found: usize, borehole_id: &str, collector: &mut Collector) {
        collector.warning(
            WarningCategory::InsufficientDepthPoints,
            format!(
                "Borehole {borehole_id} has {found} distinct depth points, need at least {MIN_DEPTH_POINTS}"
            ),
            Some(borehole_id),
            context! { "found" => found, "minimum" => MIN_DEPTH_POINTS },
        );
    }
}

/// Pair consecutive points. Returns the surviving intervals and the number
/// of zero-length (or inverted) pairs that were excluded.
pub(crate) fn pair_intervals(points: &[f64]) -> (Vec<DepthInterval>, usize) {
    let mut intervals = Vec::with_capacity(points.len().saturating_sub(1));
    let mut degenerate = 0;
    for w in points.windows(2) {
        match DepthInterval::new(w[0], w[1]) {
            Some(iv) => intervals.push(iv),
            None => degenerate += 1,
        }
    }
    (intervals, degenerate)
}
