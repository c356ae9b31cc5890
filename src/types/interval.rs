//! Depth intervals and the combined output table

use super::table::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Half-open depth range `[depth_from, depth_to)` with `depth_to > depth_from`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthInterval {
    pub depth_from: f64,
    pub depth_to: f64,
}

impl DepthInterval {
    /// Build an interval, returning `None` for zero-length or inverted pairs.
    pub fn new(depth_from: f64, depth_to: f64) -> Option<Self> {
        (depth_to - depth_from > 0.0).then_some(Self {
            depth_from,
            depth_to,
        })
    }

    pub fn thickness(&self) -> f64 {
        self.depth_to - self.depth_from
    }

    /// True if `[top, base]` fully contains this interval.
    pub fn within(&self, top: f64, base: f64) -> bool {
        top <= self.depth_from && self.depth_to <= base
    }

    /// True if `depth` falls in `[depth_from, depth_to)`.
    pub fn contains(&self, depth: f64) -> bool {
        self.depth_from <= depth && depth < self.depth_to
    }
}

impl fmt::Display for DepthInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.depth_from, self.depth_to)
    }
}

/// Values joined from a single group row onto an interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupValues {
    /// Index of the source row in its group table.
    pub row: usize,
    /// `(heading, value)` pairs in the group's heading order.
    pub values: Vec<(String, CellValue)>,
}

impl GroupValues {
    pub fn get(&self, heading: &str) -> Option<&CellValue> {
        self.values
            .iter()
            .find(|(h, _)| h == heading)
            .map(|(_, v)| v)
    }

    /// A join counts as contributing data if at least one value is non-empty.
    pub fn has_data(&self) -> bool {
        self.values.iter().any(|(_, v)| !v.is_empty())
    }
}

/// One output row: a borehole interval plus every group's joined values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRecord {
    pub borehole_id: String,
    #[serde(flatten)]
    pub interval: DepthInterval,
    /// Group name -> joined row. Groups with no covering row are absent.
    pub groups: BTreeMap<String, GroupValues>,
}

impl CombinedRecord {
    pub fn new(borehole_id: impl Into<String>, interval: DepthInterval) -> Self {
        Self {
            borehole_id: borehole_id.into(),
            interval,
            groups: BTreeMap::new(),
        }
    }

    /// Joined value for `group.heading`, `None` if unset.
    pub fn value(&self, group: &str, heading: &str) -> Option<&CellValue> {
        self.groups.get(group).and_then(|g| g.get(heading))
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }
}

/// Key of one joined output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnKey {
    pub group: String,
    pub heading: String,
}

/// Concatenated output of a combine run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedTable {
    /// Joined columns in group order, then heading order.
    pub columns: Vec<ColumnKey>,
    pub records: Vec<CombinedRecord>,
}

impl CombinedTable {
    pub const FIXED_HEADERS: [&'static str; 3] = ["borehole_id", "depth_from", "depth_to"];

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct borehole ids in output order.
    pub fn borehole_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for r in &self.records {
            if !ids.contains(&r.borehole_id.as_str()) {
                ids.push(&r.borehole_id);
            }
        }
        ids
    }

    /// Records for one borehole, in depth order.
    pub fn records_for<'a>(&'a self, borehole_id: &'a str) -> impl Iterator<Item = &'a CombinedRecord> {
        self.records.iter().filter(move |r| r.borehole_id == borehole_id)
    }

    /// Intervals for one borehole as `(from, to)` pairs.
    pub fn intervals_for(&self, borehole_id: &str) -> Vec<(f64, f64)> {
        self.records_for(borehole_id)
            .map(|r| (r.interval.depth_from, r.interval.depth_to))
            .collect()
    }

    /// Flat header row: fixed columns then joined columns.
    ///
    /// A heading that appears in more than one group is written as
    /// `GROUP.HEADING` so columns stay unique.
    pub fn headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = Self::FIXED_HEADERS.iter().map(|h| (*h).to_string()).collect();
        for key in &self.columns {
            let clashes = self
                .columns
                .iter()
                .filter(|k| k.heading == key.heading)
                .count()
                > 1;
            if clashes {
                headers.push(format!("{}.{}", key.group, key.heading));
            } else {
                headers.push(key.heading.clone());
            }
        }
        headers
    }

    /// Flat rows aligned with `headers()`. Unset joins are `Empty`.
    pub fn rows(&self) -> Vec<Vec<CellValue>> {
        self.records
            .iter()
            .map(|r| {
                let mut row = vec![
                    CellValue::Text(r.borehole_id.clone()),
                    CellValue::Number(r.interval.depth_from),
                    CellValue::Number(r.interval.depth_to),
                ];
                row.extend(self.columns.iter().map(|k| {
                    r.value(&k.group, &k.heading)
                        .cloned()
                        .unwrap_or(CellValue::Empty)
                }));
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_interval_rejected() {
        assert!(DepthInterval::new(2.0, 2.0).is_none());
        assert!(DepthInterval::new(3.0, 2.0).is_none());
        let iv = DepthInterval::new(1.0, 2.5).unwrap();
        assert!((iv.thickness() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn coverage_checks() {
        let iv = DepthInterval::new(2.0, 4.0).unwrap();
        assert!(iv.within(0.0, 4.0));
        assert!(!iv.within(2.5, 6.0));
        assert!(iv.contains(2.0));
        assert!(!iv.contains(4.0));
    }

    #[test]
    fn headers_qualify_clashing_columns() {
        let table = CombinedTable {
            columns: vec![
                ColumnKey { group: "CORE".into(), heading: "REMARKS".into() },
                ColumnKey { group: "GEOL".into(), heading: "GEOL_DESC".into() },
                ColumnKey { group: "GEOL".into(), heading: "REMARKS".into() },
            ],
            records: Vec::new(),
        };
        assert_eq!(
            table.headers(),
            vec![
                "borehole_id",
                "depth_from",
                "depth_to",
                "CORE.REMARKS",
                "GEOL_DESC",
                "GEOL.REMARKS"
            ]
        );
    }

    #[test]
    fn rows_fill_unset_groups_with_empty() {
        let mut rec = CombinedRecord::new("B1", DepthInterval::new(0.0, 2.0).unwrap());
        rec.groups.insert(
            "GEOL".into(),
            GroupValues { row: 0, values: vec![("GEOL_DESC".into(), "Clay".into())] },
        );
        let table = CombinedTable {
            columns: vec![
                ColumnKey { group: "CORE".into(), heading: "CORE_PREC".into() },
                ColumnKey { group: "GEOL".into(), heading: "GEOL_DESC".into() },
            ],
            records: vec![rec],
        };
        let rows = table.rows();
        assert_eq!(rows[0][3], CellValue::Empty);
        assert_eq!(rows[0][4], CellValue::from("Clay"));
        assert_eq!(table.borehole_ids(), vec!["B1"]);
    }
}
