//! Borehole Assembler
//!
//! Builds the combined depth-interval rows for a single borehole:
//! extract depths from every group, build one interval set from the union,
//! then join each group's covering row onto each interval.
//!
//! A borehole whose intervals cannot be built is skipped as a whole. No
//! partial rows are emitted for it.

use crate::context;
use crate::depth::{DepthExtraction, DepthExtractor, GroupView, IntervalBuilder, RowSpan};
use crate::quality::Collector;
use crate::types::{CellValue, CombinedRecord, Counter, DepthInterval, GroupValues, WarningCategory};
use std::collections::BTreeSet;
use tracing::debug;

/// Tagged result of assembling one borehole.
#[derive(Debug, Clone, PartialEq)]
pub enum BoreholeOutcome {
    Assembled {
        records: Vec<CombinedRecord>,
        /// Groups that supplied at least one non-empty join.
        contributed_groups: BTreeSet<String>,
    },
    Skipped {
        reason: String,
    },
}

impl BoreholeOutcome {
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// `(records, contributed_groups)`; both empty for a skipped borehole.
    pub fn into_parts(self) -> (Vec<CombinedRecord>, BTreeSet<String>) {
        match self {
            Self::Assembled {
                records,
                contributed_groups,
            } => (records, contributed_groups),
            Self::Skipped { .. } => (Vec::new(), BTreeSet::new()),
        }
    }
}

/// Assembles boreholes against a fixed set of indexed groups.
pub struct BoreholeAssembler<'v, 'a> {
    groups: &'v [GroupView<'a>],
    builder: IntervalBuilder,
}

impl<'v, 'a> BoreholeAssembler<'v, 'a> {
    pub const fn new(groups: &'v [GroupView<'a>], builder: IntervalBuilder) -> Self {
        Self { groups, builder }
    }

    pub fn assemble(&self, borehole_id: &str, collector: &mut Collector) -> BoreholeOutcome {
        let mut sources: Vec<(&GroupView<'a>, DepthExtraction)> = Vec::new();
        let mut union: Vec<f64> = Vec::new();

        for view in self.groups {
            let extraction = DepthExtractor::extract(view, borehole_id, collector);
            if !extraction.has_data {
                continue;
            }
            IntervalBuilder::check_ordering(&extraction.depths, borehole_id, Some(view.name()), collector);
            union.extend_from_slice(&extraction.depths);
            sources.push((view, extraction));
        }

        union.sort_by(f64::total_cmp);
        union.dedup();

        let build = self.builder.build(&union, borehole_id, collector);
        if !build.ok {
            let reason = if sources.is_empty() {
                "no group holds depth data".to_string()
            } else {
                format!("only {} distinct depth point(s) across {} group(s)", union.len(), sources.len())
            };
            collector.warning(
                WarningCategory::BoreholeProcessing,
                format!("Skipped borehole {borehole_id}: {reason}"),
                Some(borehole_id),
                context! {
                    "reason" => reason,
                    "groups_with_depths" => sources.len(),
                },
            );
            collector.increment(Counter::BoreholesSkipped);
            return BoreholeOutcome::Skipped { reason };
        }

        let tolerance = self.builder.tolerance();
        let mut contributed_groups = BTreeSet::new();
        let last = build.intervals.len().saturating_sub(1);
        let records: Vec<CombinedRecord> = build
            .intervals
            .iter()
            .enumerate()
            .map(|(i, interval)| {
                let mut record = CombinedRecord::new(borehole_id, *interval);
                for (view, extraction) in &sources {
                    let Some(values) = join_row(view, &extraction.spans, interval, tolerance, i == last) else {
                        continue;
                    };
                    if values.has_data() {
                        contributed_groups.insert(view.name().to_string());
                    }
                    record.groups.insert(view.name().to_string(), values);
                }
                record
            })
            .collect();

        report_unjoined(borehole_id, &sources, &records, collector);

        let joined = if contributed_groups.is_empty() {
            "none".to_string()
        } else {
            contributed_groups.iter().cloned().collect::<Vec<_>>().join(",")
        };
        collector.info(
            WarningCategory::BoreholeDataSource,
            format!("Borehole {borehole_id} combined from groups: {joined}"),
            Some(borehole_id),
            context! { "groups" => joined, "intervals" => records.len() },
        );
        collector.increment(Counter::BoreholesProcessed);
        collector.increment_by(Counter::IntervalsCreated, records.len() as u64);
        debug!(borehole = borehole_id, intervals = records.len(), "Assembled borehole");

        BoreholeOutcome::Assembled {
            records,
            contributed_groups,
        }
    }
}

/// Attribute values from the first row of `view` that covers `interval`.
///
/// Span rows cover an interval lying inside `[top, base]`; point rows match
/// the interval that starts at (or just above) their depth. The deepest
/// interval of a borehole also takes a point row sitting on its base when
/// no other row covers it.
fn join_row(
    view: &GroupView<'_>,
    spans: &[RowSpan],
    interval: &DepthInterval,
    tolerance: f64,
    deepest: bool,
) -> Option<GroupValues> {
    let covers = |span: &&RowSpan| {
        if span.base.is_some() {
            let (top, base) = span.bounds();
            interval.within(top - tolerance, base + tolerance)
        } else {
            interval.contains(span.top + tolerance) || interval.contains(span.top)
        }
    };
    let on_base = |span: &&RowSpan| {
        deepest && span.base.is_none() && (span.top - interval.depth_to).abs() <= tolerance
    };
    let span = spans
        .iter()
        .find(covers)
        .or_else(|| spans.iter().find(on_base))?;

    let table = view.table();
    let values = view
        .attribute_columns()
        .map(|(col, heading)| {
            let value = table.cell(span.row, col).cloned().unwrap_or(CellValue::Empty);
            (heading.to_string(), value)
        })
        .collect();
    Some(GroupValues {
        row: span.row,
        values,
    })
}

/// Record one `UNJOINED_ROWS` warning per group whose depth rows never
/// reached the output (shadowed by an earlier row, or outside every interval).
fn report_unjoined(
    borehole_id: &str,
    sources: &[(&GroupView<'_>, DepthExtraction)],
    records: &[CombinedRecord],
    collector: &mut Collector,
) {
    for (view, extraction) in sources {
        let group = view.name();
        let used: BTreeSet<usize> = records
            .iter()
            .filter_map(|r| r.groups.get(group))
            .map(|values| values.row)
            .collect();
        let unjoined: Vec<usize> = extraction
            .spans
            .iter()
            .map(|span| span.row)
            .filter(|row| !used.contains(row))
            .collect();
        let Some(first) = unjoined.first() else {
            continue;
        };
        collector.warning(
            WarningCategory::UnjoinedRows,
            format!(
                "{} {group} rows for borehole {borehole_id} matched no interval; their values are not in the output",
                unjoined.len()
            ),
            Some(borehole_id),
            context! { "group" => group, "rows" => unjoined.len(), "first_row" => first },
        );
        collector.increment_by(Counter::RowsUnjoined, unjoined.len() as u64);
    }
}
