//! Data-quality record types
//!
//! Warnings are immutable once recorded; metrics are plain counters that the
//! collector increments during a run and snapshots on request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Severity
// ============================================================================

/// Severity of a recorded issue. Ordered so `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub const ALL: [Self; 3] = [Self::Info, Self::Warning, Self::Error];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

// ============================================================================
// Category
// ============================================================================

/// Kind of data-quality issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCategory {
    FileProcessingError,
    MissingGroups,
    MissingHoleData,
    MissingColumn,
    NonNumericDepth,
    InsufficientDepthPoints,
    DepthOrderingError,
    ZeroLengthIntervals,
    BoreholeProcessing,
    BoreholeDataSource,
    /// Rows with depths that no output interval took their values from.
    UnjoinedRows,
    EmptyGroups,
    NonStandardGroup,
    DataLossSummary,
    /// Raised by the collector itself, e.g. for an unrecognized category name.
    CollectorInternal,
}

impl WarningCategory {
    pub const ALL: [Self; 15] = [
        Self::FileProcessingError,
        Self::MissingGroups,
        Self::MissingHoleData,
        Self::MissingColumn,
        Self::NonNumericDepth,
        Self::InsufficientDepthPoints,
        Self::DepthOrderingError,
        Self::ZeroLengthIntervals,
        Self::BoreholeProcessing,
        Self::BoreholeDataSource,
        Self::UnjoinedRows,
        Self::EmptyGroups,
        Self::NonStandardGroup,
        Self::DataLossSummary,
        Self::CollectorInternal,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileProcessingError => "FILE_PROCESSING_ERROR",
            Self::MissingGroups => "MISSING_GROUPS",
            Self::MissingHoleData => "MISSING_HOLE_DATA",
            Self::MissingColumn => "MISSING_COLUMN",
            Self::NonNumericDepth => "NON_NUMERIC_DEPTH",
            Self::InsufficientDepthPoints => "INSUFFICIENT_DEPTH_POINTS",
            Self::DepthOrderingError => "DEPTH_ORDERING_ERROR",
            Self::ZeroLengthIntervals => "ZERO_LENGTH_INTERVALS",
            Self::BoreholeProcessing => "BOREHOLE_PROCESSING",
            Self::BoreholeDataSource => "BOREHOLE_DATA_SOURCE",
            Self::UnjoinedRows => "UNJOINED_ROWS",
            Self::EmptyGroups => "EMPTY_GROUPS",
            Self::NonStandardGroup => "NON_STANDARD_GROUP",
            Self::DataLossSummary => "DATA_LOSS_SUMMARY",
            Self::CollectorInternal => "COLLECTOR_INTERNAL",
        }
    }
}

impl fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WarningCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

// ============================================================================
// Warning
// ============================================================================

/// One recorded data-quality issue.
///
/// Fields are private so a recorded warning cannot be altered after the
/// collector hands out a reference to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    severity: Severity,
    category: WarningCategory,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    borehole_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    context: BTreeMap<String, String>,
}

impl Warning {
    pub fn new(
        severity: Severity,
        category: WarningCategory,
        message: impl Into<String>,
        borehole_id: Option<String>,
        context: BTreeMap<String, String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            borehole_id,
            context,
        }
    }

    pub const fn severity(&self) -> Severity {
        self.severity
    }

    pub const fn category(&self) -> WarningCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn borehole_id(&self) -> Option<&str> {
        self.borehole_id.as_deref()
    }

    pub const fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// Look up one context entry.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.category)?;
        if let Some(ref id) = self.borehole_id {
            write!(f, " ({id})")?;
        }
        write!(f, ": {}", self.message)
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// Named run counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    FilesSeen,
    FilesProcessed,
    FilesSkipped,
    GroupsSeen,
    GroupsProcessed,
    GroupsSkipped,
    BoreholesSeen,
    BoreholesProcessed,
    BoreholesSkipped,
    IntervalsCreated,
    RowsUnjoined,
}

/// Counter snapshot for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub files_seen: u64,
    pub files_processed: u64,
    pub files_skipped: u64,
    pub groups_seen: u64,
    pub groups_processed: u64,
    pub groups_skipped: u64,
    pub boreholes_seen: u64,
    pub boreholes_processed: u64,
    pub boreholes_skipped: u64,
    pub intervals_created: u64,
    pub rows_unjoined: u64,
    pub warnings_by_category: BTreeMap<WarningCategory, u64>,
    pub warnings_by_severity: BTreeMap<Severity, u64>,
}

impl Metrics {
    pub(crate) fn bump(&mut self, counter: Counter, by: u64) {
        let slot = match counter {
            Counter::FilesSeen => &mut self.files_seen,
            Counter::FilesProcessed => &mut self.files_processed,
            Counter::FilesSkipped => &mut self.files_skipped,
            Counter::GroupsSeen => &mut self.groups_seen,
            Counter::GroupsProcessed => &mut self.groups_processed,
            Counter::GroupsSkipped => &mut self.groups_skipped,
            Counter::BoreholesSeen => &mut self.boreholes_seen,
            Counter::BoreholesProcessed => &mut self.boreholes_processed,
            Counter::BoreholesSkipped => &mut self.boreholes_skipped,
            Counter::IntervalsCreated => &mut self.intervals_created,
            Counter::RowsUnjoined => &mut self.rows_unjoined,
        };
        *slot += by;
    }

    pub(crate) fn count_warning(&mut self, severity: Severity, category: WarningCategory) {
        *self.warnings_by_category.entry(category).or_insert(0) += 1;
        *self.warnings_by_severity.entry(severity).or_insert(0) += 1;
    }

    /// Fold another run's counters into this one.
    pub(crate) fn add(&mut self, other: &Self) {
        self.files_seen += other.files_seen;
        self.files_processed += other.files_processed;
        self.files_skipped += other.files_skipped;
        self.groups_seen += other.groups_seen;
        self.groups_processed += other.groups_processed;
        self.groups_skipped += other.groups_skipped;
        self.boreholes_seen += other.boreholes_seen;
        self.boreholes_processed += other.boreholes_processed;
        self.boreholes_skipped += other.boreholes_skipped;
        self.intervals_created += other.intervals_created;
        self.rows_unjoined += other.rows_unjoined;
        for (cat, n) in &other.warnings_by_category {
            *self.warnings_by_category.entry(*cat).or_insert(0) += n;
        }
        for (sev, n) in &other.warnings_by_severity {
            *self.warnings_by_severity.entry(*sev).or_insert(0) += n;
        }
    }

    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::FilesSeen => self.files_seen,
            Counter::FilesProcessed => self.files_processed,
            Counter::FilesSkipped => self.files_skipped,
            Counter::GroupsSeen => self.groups_seen,
            Counter::GroupsProcessed => self.groups_processed,
            Counter::GroupsSkipped => self.groups_skipped,
            Counter::BoreholesSeen => self.boreholes_seen,
            Counter::BoreholesProcessed => self.boreholes_processed,
            Counter::BoreholesSkipped => self.boreholes_skipped,
            Counter::IntervalsCreated => self.intervals_created,
            Counter::RowsUnjoined => self.rows_unjoined,
        }
    }

    pub fn category_count(&self, category: WarningCategory) -> u64 {
        self.warnings_by_category.get(&category).copied().unwrap_or(0)
    }

    pub fn severity_count(&self, severity: Severity) -> u64 {
        self.warnings_by_severity.get(&severity).copied().unwrap_or(0)
    }
}
