//! Combine Orchestrator
//!
//! Runs the borehole assembler over every borehole in a project and
//! concatenates the results into one depth-indexed table.
//!
//! Flow for one run:
//! 1. Screen each included group (structure, emptiness, depth columns)
//! 2. Index the surviving groups by borehole
//! 3. Assemble each borehole in first-seen order (optionally on rayon)
//! 4. Record a DATA_LOSS_SUMMARY and hand back table + collector

use super::borehole::{BoreholeAssembler, BoreholeOutcome};
use crate::config::CombineConfig;
use crate::context;
use crate::depth::{GroupView, IntervalBuilder};
use crate::quality::Collector;
use crate::types::{ColumnKey, CombinedTable, Counter, GroupSet, GroupTable, WarningCategory};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Groups parsed from one input file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSource {
    pub name: String,
    pub groups: GroupSet,
}

impl ProjectSource {
    pub fn new(name: impl Into<String>, groups: GroupSet) -> Self {
        Self {
            name: name.into(),
            groups,
        }
    }
}

/// Combines group tables into one interval table per run.
#[derive(Debug, Clone, Default)]
pub struct Combiner {
    config: CombineConfig,
}

impl Combiner {
    pub const fn new(config: CombineConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &CombineConfig {
        &self.config
    }

    /// Combine with a fresh collector.
    pub fn run(&self, groups: &GroupSet) -> (CombinedTable, Collector) {
        self.combine(groups, Collector::new())
    }

    /// Combine several parsed files.
    ///
    /// Same-named groups across sources are merged before combining. A
    /// source with no groups is skipped and reported.
    pub fn combine_sources(&self, sources: &[ProjectSource], mut collector: Collector) -> (CombinedTable, Collector) {
        let mut merged = GroupSet::new();
        for source in sources {
            collector.increment(Counter::FilesSeen);
            if source.groups.is_empty() {
                collector.warning(
                    WarningCategory::FileProcessingError,
                    format!("Source {} contains no groups", source.name),
                    None,
                    context! { "source" => source.name },
                );
                collector.increment(Counter::FilesSkipped);
                continue;
            }
            for table in &source.groups {
                merged.insert(table.clone());
            }
            collector.increment(Counter::FilesProcessed);
        }
        info!(
            sources = sources.len(),
            groups = merged.len(),
            "Merged source groups"
        );
        self.combine(&merged, collector)
    }

    /// Combine every included group in `groups`.
    ///
    /// Never fails: data problems end up in the returned collector.
    pub fn combine(&self, groups: &GroupSet, mut collector: Collector) -> (CombinedTable, Collector) {
        let views = self.screen_groups(groups, &mut collector);
        if views.is_empty() {
            collector.error(
                WarningCategory::MissingGroups,
                "No usable groups to combine",
                None,
                context! { "groups_in_input" => groups.len() },
            );
            Self::record_summary(&mut collector, 0);
            return (CombinedTable::default(), collector);
        }

        let boreholes = Self::borehole_order(&views);
        collector.increment_by(Counter::BoreholesSeen, boreholes.len() as u64);
        info!(
            groups = views.len(),
            boreholes = boreholes.len(),
            parallel = self.config.parallel,
            "Combining boreholes"
        );

        let assembler =
            BoreholeAssembler::new(&views, IntervalBuilder::with_tolerance(self.config.depth_tolerance));
        let outcomes = if self.config.parallel {
            Self::assemble_parallel(&assembler, &boreholes, &mut collector)
        } else {
            boreholes
                .iter()
                .map(|id| assembler.assemble(id, &mut collector))
                .collect()
        };

        let columns = views
            .iter()
            .flat_map(|view| {
                view.attribute_columns().map(|(_, heading)| ColumnKey {
                    group: view.name().to_string(),
                    heading: heading.to_string(),
                })
            })
            .collect();
        let records = outcomes
            .into_iter()
            .flat_map(|outcome| outcome.into_parts().0)
            .collect();
        let table = CombinedTable { columns, records };

        Self::record_summary(&mut collector, table.len());
        (table, collector)
    }

    /// Each borehole gets a private collector; they are folded back in
    /// borehole order so warning order matches a sequential run.
    fn assemble_parallel(
        assembler: &BoreholeAssembler<'_, '_>,
        boreholes: &[String],
        collector: &mut Collector,
    ) -> Vec<BoreholeOutcome> {
        let results: Vec<(BoreholeOutcome, Collector)> = boreholes
            .par_iter()
            .map(|id| {
                let mut local = Collector::new();
                let outcome = assembler.assemble(id, &mut local);
                (outcome, local)
            })
            .collect();

        results
            .into_iter()
            .map(|(outcome, local)| {
                collector.absorb(local);
                outcome
            })
            .collect()
    }

    /// Apply group selection and structural checks. Returns one view per
    /// usable group, in input order.
    fn screen_groups<'a>(&self, groups: &'a GroupSet, collector: &mut Collector) -> Vec<GroupView<'a>> {
        if let Some(requested) = &self.config.included_groups {
            for name in requested.iter().filter(|n| !groups.contains(n)) {
                collector.warning(
                    WarningCategory::MissingGroups,
                    format!("Requested group {name} is not in the input"),
                    None,
                    context! { "group" => name },
                );
            }
        }

        let mut views = Vec::new();
        for table in groups {
            if !self.config.is_included(&table.name) {
                debug!(group = %table.name, "Group not selected, ignoring");
                continue;
            }
            collector.increment(Counter::GroupsSeen);
            if !self.config.is_standard(&table.name) {
                collector.info(
                    WarningCategory::NonStandardGroup,
                    format!("Group {} is not a standard group", table.name),
                    None,
                    context! { "group" => table.name },
                );
            }
            match self.view_for(table, collector) {
                Some(view) => {
                    collector.increment(Counter::GroupsProcessed);
                    views.push(view);
                }
                None => collector.increment(Counter::GroupsSkipped),
            }
        }
        views
    }

    /// Structural checks for one group. Records exactly one entry when the
    /// group is rejected.
    fn view_for<'a>(&self, table: &'a GroupTable, collector: &mut Collector) -> Option<GroupView<'a>> {
        let group = table.name.as_str();
        let id_column = self.config.borehole_id_column.as_str();

        if !table.has_column(id_column) {
            collector.error(
                WarningCategory::MissingColumn,
                format!("Group {group} has no {id_column} column; group skipped"),
                None,
                context! { "group" => group, "column" => id_column },
            );
            return None;
        }

        let ragged = table.ragged_rows();
        if let Some(first) = ragged.first() {
            collector.error(
                WarningCategory::FileProcessingError,
                format!(
                    "Group {group} has {} rows whose width does not match its {} headings; group skipped",
                    ragged.len(),
                    table.headings.len()
                ),
                None,
                context! { "group" => group, "rows" => ragged.len(), "first_row" => first },
            );
            return None;
        }

        if table.is_empty() {
            collector.warning(
                WarningCategory::EmptyGroups,
                format!("Group {group} has no rows; group skipped"),
                None,
                context! { "group" => group },
            );
            return None;
        }

        let depth_columns = self.config.depth_columns_for(group, &table.headings);
        if depth_columns.is_empty() {
            collector.warning(
                WarningCategory::MissingColumn,
                format!("No depth columns identified for group {group}; group skipped"),
                None,
                context! { "group" => group },
            );
            return None;
        }

        let view = GroupView::new(table, id_column, depth_columns)?;
        let blank = view.blank_id_rows();
        if !blank.is_empty() {
            collector.warning(
                WarningCategory::MissingHoleData,
                format!("Dropped {} {group} rows with a blank {id_column}", blank.len()),
                None,
                context! { "group" => group, "rows" => blank.len() },
            );
        }
        debug!(group, depth_columns = ?view.depth_headings(), "Group ready");
        Some(view)
    }

    /// Distinct borehole ids across all views, first-seen order.
    fn borehole_order(views: &[GroupView<'_>]) -> Vec<String> {
        let mut seen = HashSet::new();
        views
            .iter()
            .flat_map(GroupView::boreholes)
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }

    fn record_summary(collector: &mut Collector, intervals: usize) {
        let m = collector.get_metrics();
        collector.info(
            WarningCategory::DataLossSummary,
            format!(
                "Boreholes: {} seen, {} processed, {} skipped; {} intervals created; {} rows unjoined",
                m.boreholes_seen, m.boreholes_processed, m.boreholes_skipped, intervals, m.rows_unjoined
            ),
            None,
            context! {
                "boreholes_seen" => m.boreholes_seen,
                "boreholes_processed" => m.boreholes_processed,
                "boreholes_skipped" => m.boreholes_skipped,
                "intervals_created" => intervals,
                "rows_unjoined" => m.rows_unjoined,
                "groups_processed" => m.groups_processed,
                "groups_skipped" => m.groups_skipped,
            },
        );
        info!(
            boreholes_seen = m.boreholes_seen,
            boreholes_processed = m.boreholes_processed,
            boreholes_skipped = m.boreholes_skipped,
            intervals,
            rows_unjoined = m.rows_unjoined,
            "Combine complete"
        );
    }
}
