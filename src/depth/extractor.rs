//! Depth Extractor
//!
//! Pulls candidate depth breakpoints for one borehole out of one group.
//! Every failure path degrades to `has_data = false` plus a collector entry;
//! nothing here returns an error.

use crate::context;
use crate::quality::Collector;
use crate::types::{CellValue, GroupTable, WarningCategory};
use std::collections::HashMap;
use tracing::trace;

/// Depth span of one source row, after coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSpan {
    pub row: usize,
    pub top: f64,
    /// `None` for point rows (no base column, or blank base).
    pub base: Option<f64>,
}

impl RowSpan {
    /// `(upper, lower)` with the two ends in ascending order.
    pub fn bounds(&self) -> (f64, f64) {
        match self.base {
            Some(base) if base < self.top => (base, self.top),
            Some(base) => (self.top, base),
            None => (self.top, self.top),
        }
    }
}

/// Result of extracting one group for one borehole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthExtraction {
    /// Depth values in row order, top before base within a row.
    pub depths: Vec<f64>,
    pub spans: Vec<RowSpan>,
    pub has_data: bool,
}

impl DepthExtraction {
    fn none() -> Self {
        Self::default()
    }
}

/// A group table indexed by borehole, with its depth columns resolved.
#[derive(Debug)]
pub struct GroupView<'a> {
    table: &'a GroupTable,
    id_col: usize,
    depth_columns: Vec<String>,
    top_col: Option<usize>,
    base_col: Option<usize>,
    rows_by_hole: HashMap<String, Vec<usize>>,
    hole_order: Vec<String>,
    blank_id_rows: Vec<usize>,
}

impl<'a> GroupView<'a> {
    /// Index `table` by `id_column`.
    ///
    /// `depth_columns` is the ordered candidate list: the first entry is the
    /// primary (top) depth column, the first present entry after it is the
    /// base. Returns `None` if the id column is absent.
    pub fn new(table: &'a GroupTable, id_column: &str, depth_columns: Vec<String>) -> Option<Self> {
        let id_col = table.column_index(id_column)?;

        let top_col = depth_columns.first().and_then(|c| table.column_index(c));
        let base_col = depth_columns
            .iter()
            .skip(1)
            .find_map(|c| table.column_index(c));

        let mut rows_by_hole: HashMap<String, Vec<usize>> = HashMap::new();
        let mut hole_order = Vec::new();
        let mut blank_id_rows = Vec::new();
        for (i, row) in table.rows.iter().enumerate() {
            match row.get(id_col).and_then(CellValue::as_key) {
                Some(id) => {
                    let rows = rows_by_hole.entry(id.clone()).or_default();
                    if rows.is_empty() {
                        hole_order.push(id);
                    }
                    rows.push(i);
                }
                None => blank_id_rows.push(i),
            }
        }

        Some(Self {
            table,
            id_col,
            depth_columns,
            top_col,
            base_col,
            rows_by_hole,
            hole_order,
            blank_id_rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.table.name
    }

    pub const fn table(&self) -> &'a GroupTable {
        self.table
    }

    /// Headings that hold depth values for this group.
    pub fn depth_headings(&self) -> Vec<&str> {
        [self.top_col, self.base_col]
            .into_iter()
            .flatten()
            .map(|i| self.table.headings[i].as_str())
            .collect()
    }

    /// Every heading except the borehole id, with its column index.
    pub fn attribute_columns(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.table
            .headings
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.id_col)
            .map(|(i, h)| (i, h.as_str()))
    }

    /// Borehole ids in first-seen row order.
    pub fn boreholes(&self) -> &[String] {
        &self.hole_order
    }

    pub fn rows_for(&self, borehole_id: &str) -> &[usize] {
        self.rows_by_hole
            .get(borehole_id)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Rows dropped because their borehole id was blank.
    pub fn blank_id_rows(&self) -> &[usize] {
        &self.blank_id_rows
    }
}

/// Stateless depth extraction.
pub struct DepthExtractor;

impl DepthExtractor {
    /// Collect depth points for `borehole_id` from `view`.
    pub fn extract(view: &GroupView<'_>, borehole_id: &str, collector: &mut Collector) -> DepthExtraction {
        let group = view.name();
        let rows = view.rows_for(borehole_id);

        if rows.is_empty() {
            collector.info(
                WarningCategory::MissingHoleData,
                format!("No {group} rows for borehole {borehole_id}"),
                Some(borehole_id),
                context! { "group" => group },
            );
            return DepthExtraction::none();
        }

        let Some(top_col) = view.top_col else {
            let missing = view
                .depth_columns
                .first()
                .map_or("<unset>", String::as_str);
            collector.warning(
                WarningCategory::MissingColumn,
                format!("Group {group} has no {missing} column for borehole {borehole_id}"),
                Some(borehole_id),
                context! {
                    "group" => group,
                    "column" => missing,
                    "rows" => rows.len(),
                },
            );
            return DepthExtraction::none();
        };

        let mut out = DepthExtraction::none();
        for &row in rows {
            let top = Self::coerce(view, row, top_col, borehole_id, collector);
            let base = view
                .base_col
                .and_then(|col| Self::coerce(view, row, col, borehole_id, collector));

            out.depths.extend(top);
            out.depths.extend(base);
            let span = match (top, base) {
                (Some(top), base) => Some(RowSpan { row, top, base }),
                (None, Some(base)) => Some(RowSpan { row, top: base, base: None }),
                (None, None) => None,
            };
            out.spans.extend(span);
        }

        if out.depths.is_empty() {
            collector.warning(
                WarningCategory::MissingHoleData,
                format!(
                    "{} {group} rows for borehole {borehole_id} hold no usable depth values",
                    rows.len()
                ),
                Some(borehole_id),
                context! { "group" => group, "rows" => rows.len() },
            );
            return out;
        }

        trace!(group, borehole = borehole_id, points = out.depths.len(), "Extracted depths");
        out.has_data = true;
        out
    }

    /// Read one depth cell. Non-numeric values are recorded and dropped.
    fn coerce(
        view: &GroupView<'_>,
        row: usize,
        col: usize,
        borehole_id: &str,
        collector: &mut Collector,
    ) -> Option<f64> {
        match view.table.cell(row, col)?.to_depth()? {
            Ok(depth) => Some(depth),
            Err(raw) => {
                let column = &view.table.headings[col];
                collector.warning(
                    WarningCategory::NonNumericDepth,
                    format!(
                        "Dropped non-numeric {column} value '{raw}' in {} row {row}",
                        view.name()
                    ),
                    Some(borehole_id),
                    context! {
                        "group" => view.name(),
                        "column" => column,
                        "row" => row,
                        "value" => raw,
                    },
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Severity, Warning};

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn core_table() -> GroupTable {
        let mut t = GroupTable::new("CORE", ["HOLE_ID", "CORE_TOP", "CORE_BOT", "CORE_PREC"]).unwrap();
        t.push_row(["B1", "0.0", "1.5", "80"]).unwrap();
        t.push_row(["B1", "1.5", "3.0", "95"]).unwrap();
        t.push_row(["B2", "0.0", "2.0", "60"]).unwrap();
        t
    }

    #[test]
    fn extracts_top_and_base_in_row_order() {
        let table = core_table();
        let view = GroupView::new(&table, "HOLE_ID", cols(&["CORE_TOP", "CORE_BOT"])).unwrap();
        let mut c = Collector::new();

        let ex = DepthExtractor::extract(&view, "B1", &mut c);
        assert!(ex.has_data);
        assert_eq!(ex.depths, vec![0.0, 1.5, 1.5, 3.0]);
        assert_eq!(ex.spans.len(), 2);
        assert_eq!(ex.spans[1].bounds(), (1.5, 3.0));
        assert!(c.is_empty());
        assert_eq!(view.boreholes(), &["B1".to_string(), "B2".to_string()]);
    }

    #[test]
    fn absent_borehole_is_info_only() {
        let table = core_table();
        let view = GroupView::new(&table, "HOLE_ID", cols(&["CORE_TOP", "CORE_BOT"])).unwrap();
        let mut c = Collector::new();

        let ex = DepthExtractor::extract(&view, "B7", &mut c);
        assert!(!ex.has_data);
        assert!(!c.has_warnings(Severity::Warning));
        assert_eq!(c.count(WarningCategory::MissingHoleData), 1);
    }

    #[test]
    fn missing_primary_column_names_column_and_borehole() {
        let mut table = GroupTable::new("CORE", ["HOLE_ID", "CORE_PREC"]).unwrap();
        table.push_row(["B1", "80"]).unwrap();
        let view = GroupView::new(&table, "HOLE_ID", cols(&["CORE_TOP", "CORE_BOT"])).unwrap();
        let mut c = Collector::new();

        let ex = DepthExtractor::extract(&view, "B1", &mut c);
        assert!(!ex.has_data);
        let w: Vec<&Warning> = c.get_warnings(None).collect();
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].category(), WarningCategory::MissingColumn);
        assert_eq!(w[0].severity(), Severity::Warning);
        assert_eq!(w[0].borehole_id(), Some("B1"));
        assert_eq!(w[0].context_value("column"), Some("CORE_TOP"));
    }

    #[test]
    fn bad_values_are_dropped_and_reported() {
        let mut table = GroupTable::new("GEOL", ["HOLE_ID", "GEOL_TOP", "GEOL_BASE"]).unwrap();
        table.push_row(["B1", "0", "2"]).unwrap();
        table.push_row(["B1", "two", "4"]).unwrap();
        table.push_row(["B1", "4", ""]).unwrap();
        let view = GroupView::new(&table, "HOLE_ID", cols(&["GEOL_TOP", "GEOL_BASE"])).unwrap();
        let mut c = Collector::new();

        let ex = DepthExtractor::extract(&view, "B1", &mut c);
        assert!(ex.has_data);
        assert_eq!(ex.depths, vec![0.0, 2.0, 4.0, 4.0]);
        let bad: Vec<&Warning> = c
            .get_warnings(Some(crate::quality::WarningFilter::category(
                WarningCategory::NonNumericDepth,
            )))
            .collect();
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].context_value("row"), Some("1"));
        assert_eq!(bad[0].context_value("value"), Some("two"));
        // blank base: point row
        assert_eq!(ex.spans[2].base, None);
    }

    #[test]
    fn all_blank_depths_degrade_to_no_data() {
        let mut table = GroupTable::new("WETH", ["HOLE_ID", "WETH_TOP"]).unwrap();
        table.push_row(["B1", ""]).unwrap();
        let view = GroupView::new(&table, "HOLE_ID", cols(&["WETH_TOP", "WETH_BASE"])).unwrap();
        let mut c = Collector::new();

        let ex = DepthExtractor::extract(&view, "B1", &mut c);
        assert!(!ex.has_data);
        assert!(c.has_warnings(Severity::Warning));
    }

    #[test]
    fn blank_ids_are_tracked() {
        let mut table = GroupTable::new("GEOL", ["HOLE_ID", "GEOL_TOP"]).unwrap();
        table.push_row(["", "0"]).unwrap();
        table.push_row(["B1", "1"]).unwrap();
        let view = GroupView::new(&table, "HOLE_ID", cols(&["GEOL_TOP"])).unwrap();
        assert_eq!(view.blank_id_rows(), &[0]);
        assert_eq!(view.rows_for("B1"), &[1]);
        assert!(GroupView::new(&table, "LOCA_ID", cols(&["GEOL_TOP"])).is_none());
    }
}
