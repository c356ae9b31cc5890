//! Group table input model
//!
//! A `GroupTable` is one named AGS-style group (CORE, GEOL, WETH, ...) as
//! produced by an upstream parser: an ordered list of headings plus rows of
//! cells. Tables are read-only to the combine pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single cell value.
///
/// Upstream parsers hand over a mix of typed numbers and raw strings, so
/// numeric coercion happens lazily where a value is used as a depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// True for `Empty` and for whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Coerce to a finite `f64`.
    ///
    /// Returns `None` for empty cells and `Some(Err(raw))` when a non-empty
    /// value cannot be read as a finite number.
    pub fn to_depth(&self) -> Option<Result<f64, String>> {
        match self {
            Self::Empty => None,
            Self::Number(v) if v.is_finite() => Some(Ok(*v)),
            Self::Number(v) => Some(Err(v.to_string())),
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<f64>() {
                    Ok(v) if v.is_finite() => Some(Ok(v)),
                    _ => Some(Err(s.clone())),
                }
            }
        }
    }

    /// Borehole identifier form of this cell (trimmed text, or the number
    /// rendered as text). `None` when blank.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Number(v) => Some(v.to_string()),
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Empty => Ok(()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Empty, Into::into)
    }
}

/// Errors raised while building a table programmatically.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("row has {found} cells but group {group} has {expected} headings")]
    RowWidth {
        group: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate heading {heading} in group {group}")]
    DuplicateHeading { group: String, heading: String },
}

/// One named group of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTable {
    pub name: String,
    pub headings: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<CellValue>>,
}

impl GroupTable {
    /// Create an empty table with the given headings.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        headings: impl IntoIterator<Item = S>,
    ) -> Result<Self, TableError> {
        let name = name.into();
        let headings: Vec<String> = headings.into_iter().map(Into::into).collect();
        for (i, h) in headings.iter().enumerate() {
            if headings[..i].contains(h) {
                return Err(TableError::DuplicateHeading {
                    group: name,
                    heading: h.clone(),
                });
            }
        }
        Ok(Self {
            name,
            headings,
            rows: Vec::new(),
        })
    }

    /// Append a row, checking its width against the headings.
    pub fn push_row<V: Into<CellValue>>(
        &mut self,
        row: impl IntoIterator<Item = V>,
    ) -> Result<(), TableError> {
        let row: Vec<CellValue> = row.into_iter().map(Into::into).collect();
        if row.len() != self.headings.len() {
            return Err(TableError::RowWidth {
                group: self.name.clone(),
                expected: self.headings.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder-style `push_row`.
    pub fn with_row<V: Into<CellValue>>(
        mut self,
        row: impl IntoIterator<Item = V>,
    ) -> Result<Self, TableError> {
        self.push_row(row)?;
        Ok(self)
    }

    pub fn column_index(&self, heading: &str) -> Option<usize> {
        self.headings.iter().position(|h| h == heading)
    }

    pub fn has_column(&self, heading: &str) -> bool {
        self.column_index(heading).is_some()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (`row`, `col`), `None` if either index is out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Indices of rows whose width disagrees with the heading count.
    pub fn ragged_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.len() != self.headings.len())
            .map(|(i, _)| i)
            .collect()
    }

    /// Append `other`'s rows, taking the union of headings.
    ///
    /// Headings missing on either side are filled with `Empty`.
    pub fn merge(&mut self, other: &GroupTable) {
        for h in &other.headings {
            if !self.has_column(h) {
                self.headings.push(h.clone());
                for row in &mut self.rows {
                    row.push(CellValue::Empty);
                }
            }
        }
        let mapping: Vec<Option<usize>> = self
            .headings
            .iter()
            .map(|h| other.column_index(h))
            .collect();
        for row in &other.rows {
            let merged = mapping
                .iter()
                .map(|idx| {
                    idx.and_then(|i| row.get(i))
                        .cloned()
                        .unwrap_or(CellValue::Empty)
                })
                .collect();
            self.rows.push(merged);
        }
    }
}

/// An ordered collection of group tables keyed by group name.
///
/// Inserting a group whose name already exists merges the rows into the
/// existing table rather than replacing it. Deserialization goes through
/// the same merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<GroupTable>", into = "Vec<GroupTable>")]
pub struct GroupSet {
    tables: Vec<GroupTable>,
}

impl GroupSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: GroupTable) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => existing.merge(&table),
            None => self.tables.push(table),
        }
    }

    pub fn get(&self, name: &str) -> Option<&GroupTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupTable> {
        self.tables.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<GroupTable> for GroupSet {
    fn from_iter<I: IntoIterator<Item = GroupTable>>(iter: I) -> Self {
        let mut set = Self::new();
        for table in iter {
            set.insert(table);
        }
        set
    }
}

impl From<Vec<GroupTable>> for GroupSet {
    fn from(tables: Vec<GroupTable>) -> Self {
        tables.into_iter().collect()
    }
}

impl From<GroupSet> for Vec<GroupTable> {
    fn from(set: GroupSet) -> Self {
        set.tables
    }
}

impl<'a> IntoIterator for &'a GroupSet {
    type Item = &'a GroupTable;
    type IntoIter = std::slice::Iter<'a, GroupTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_depths_are_coerced() {
        assert_eq!(CellValue::from(" 2.50 ").to_depth(), Some(Ok(2.5)));
        assert_eq!(CellValue::Number(3.0).to_depth(), Some(Ok(3.0)));
        assert_eq!(CellValue::from("").to_depth(), None);
        assert_eq!(CellValue::Empty.to_depth(), None);
        assert_eq!(
            CellValue::from("1.2m").to_depth(),
            Some(Err("1.2m".to_string()))
        );
        assert!(matches!(
            CellValue::Number(f64::NAN).to_depth(),
            Some(Err(_))
        ));
    }

    #[test]
    fn push_row_rejects_wrong_width() {
        let mut table = GroupTable::new("CORE", ["HOLE_ID", "CORE_TOP"]).unwrap();
        let err = table.push_row(["B1"]).unwrap_err();
        assert_eq!(
            err,
            TableError::RowWidth {
                group: "CORE".into(),
                expected: 2,
                found: 1
            }
        );
        assert!(table.is_empty());
    }

    #[test]
    fn duplicate_headings_rejected() {
        let err = GroupTable::new("GEOL", ["HOLE_ID", "HOLE_ID"]).unwrap_err();
        assert!(matches!(err, TableError::DuplicateHeading { .. }));
    }

    #[test]
    fn merge_takes_heading_union() {
        let mut a = GroupTable::new("GEOL", ["HOLE_ID", "GEOL_TOP"])
            .unwrap()
            .with_row(["B1", "0"])
            .unwrap();
        let b = GroupTable::new("GEOL", ["HOLE_ID", "GEOL_DESC"])
            .unwrap()
            .with_row(["B2", "Clay"])
            .unwrap();
        a.merge(&b);

        assert_eq!(a.headings, vec!["HOLE_ID", "GEOL_TOP", "GEOL_DESC"]);
        assert_eq!(a.rows[0][2], CellValue::Empty);
        assert_eq!(a.rows[1][0], CellValue::from("B2"));
        assert_eq!(a.rows[1][1], CellValue::Empty);
        assert_eq!(a.rows[1][2], CellValue::from("Clay"));
    }

    #[test]
    fn group_set_merges_same_name() {
        let mut set = GroupSet::new();
        set.insert(GroupTable::new("CORE", ["HOLE_ID"]).unwrap().with_row(["B1"]).unwrap());
        set.insert(GroupTable::new("CORE", ["HOLE_ID"]).unwrap().with_row(["B2"]).unwrap());
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("CORE").map(GroupTable::row_count), Some(2));
    }

    #[test]
    fn deserialized_set_merges_repeated_names() {
        let set: GroupSet = serde_json::from_str(
            r#"[{"name":"GEOL","headings":["HOLE_ID","GEOL_TOP"],"rows":[["B1",0]]},
                {"name":"CORE","headings":["HOLE_ID"],"rows":[["B1"]]},
                {"name":"GEOL","headings":["HOLE_ID","GEOL_DESC"],"rows":[["B2","Clay"]]}]"#,
        )
        .unwrap();
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["GEOL", "CORE"]);
        let geol = set.get("GEOL").unwrap();
        assert_eq!(geol.row_count(), 2);
        assert_eq!(geol.headings, vec!["HOLE_ID", "GEOL_TOP", "GEOL_DESC"]);

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn cells_deserialize_untagged() {
        let table: GroupTable = serde_json::from_str(
            r#"{"name":"CORE","headings":["HOLE_ID","CORE_TOP","CORE_REM"],
                "rows":[["B1", 1.5, null]]}"#,
        )
        .unwrap();
        assert_eq!(table.rows[0][1], CellValue::Number(1.5));
        assert_eq!(table.rows[0][2], CellValue::Empty);
    }
}
