//! Warning/Metrics Collector
//!
//! Run-scoped sink for every data-quality issue the combine pipeline meets.
//! Nothing in the pipeline drops a record silently: a skipped value, group,
//! or borehole always lands here as a `Warning`, and the run counters live
//! alongside.
//!
//! One `Collector` belongs to one run. It is not synchronized; parallel
//! assembly gives each worker its own collector and folds them back with
//! [`Collector::absorb`] in a fixed order.

use crate::types::{Counter, Metrics, Severity, Warning, WarningCategory};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, warn};

/// Build a warning context map from `key => value` pairs.
///
/// ```ignore
/// let ctx = context! { "group" => "CORE", "row" => 3 };
/// ```
#[macro_export]
macro_rules! context {
    () => { ::std::collections::BTreeMap::<String, String>::new() };
    ($($k:expr => $v:expr),+ $(,)?) => {{
        let mut map = ::std::collections::BTreeMap::<String, String>::new();
        $( map.insert(($k).to_string(), ($v).to_string()); )+
        map
    }};
}

// ============================================================================
// Filter
// ============================================================================

/// Selection criteria for [`Collector::get_warnings`]. Empty filter = all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningFilter {
    pub min_severity: Option<Severity>,
    pub category: Option<WarningCategory>,
    pub borehole_id: Option<String>,
}

impl WarningFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: WarningCategory) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn at_least(severity: Severity) -> Self {
        Self {
            min_severity: Some(severity),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_borehole(mut self, borehole_id: impl Into<String>) -> Self {
        self.borehole_id = Some(borehole_id.into());
        self
    }

    pub fn matches(&self, w: &Warning) -> bool {
        self.min_severity.map_or(true, |min| w.severity() >= min)
            && self.category.map_or(true, |c| w.category() == c)
            && self
                .borehole_id
                .as_deref()
                .map_or(true, |id| w.borehole_id() == Some(id))
    }
}

/// Lazy iterator over matching warnings in insertion order.
///
/// Clone it before consuming to walk the same selection again.
#[derive(Debug, Clone)]
pub struct Warnings<'a> {
    inner: std::slice::Iter<'a, Warning>,
    filter: WarningFilter,
}

impl<'a> Iterator for Warnings<'a> {
    type Item = &'a Warning;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = &self.filter;
        self.inner.by_ref().find(|w| filter.matches(w))
    }
}

// ============================================================================
// Collector
// ============================================================================

/// Append-only warning log plus run metrics.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    warnings: Vec<Warning>,
    metrics: Metrics,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a warning and bump its category/severity counts.
    pub fn record(
        &mut self,
        severity: Severity,
        category: WarningCategory,
        message: impl Into<String>,
        borehole_id: Option<&str>,
        context: BTreeMap<String, String>,
    ) {
        let warning = Warning::new(
            severity,
            category,
            message,
            borehole_id.map(str::to_string),
            context,
        );
        Self::trace(&warning);
        self.metrics.count_warning(severity, category);
        self.warnings.push(warning);
    }

    pub fn info(
        &mut self,
        category: WarningCategory,
        message: impl Into<String>,
        borehole_id: Option<&str>,
        context: BTreeMap<String, String>,
    ) {
        self.record(Severity::Info, category, message, borehole_id, context);
    }

    pub fn warning(
        &mut self,
        category: WarningCategory,
        message: impl Into<String>,
        borehole_id: Option<&str>,
        context: BTreeMap<String, String>,
    ) {
        self.record(Severity::Warning, category, message, borehole_id, context);
    }

    pub fn error(
        &mut self,
        category: WarningCategory,
        message: impl Into<String>,
        borehole_id: Option<&str>,
        context: BTreeMap<String, String>,
    ) {
        self.record(Severity::Error, category, message, borehole_id, context);
    }

    /// Record using string names for severity and category.
    ///
    /// An unknown severity falls back to WARNING. An unknown category is
    /// stored as `COLLECTOR_INTERNAL` at WARNING, keeping the caller's text
    /// and the raw category name in the context. Never fails.
    pub fn record_named(
        &mut self,
        severity: &str,
        category: &str,
        message: impl Into<String>,
        borehole_id: Option<&str>,
        mut context: BTreeMap<String, String>,
    ) {
        let parsed_severity = severity.parse::<Severity>();
        if parsed_severity.is_err() {
            context.insert("unknown_severity".into(), severity.to_string());
        }
        match category.parse::<WarningCategory>() {
            Ok(cat) => {
                self.record(
                    parsed_severity.unwrap_or(Severity::Warning),
                    cat,
                    message,
                    borehole_id,
                    context,
                );
            }
            Err(raw) => {
                context.insert("unknown_category".into(), raw.clone());
                context.insert(
                    "requested_severity".into(),
                    parsed_severity.map_or_else(|_| severity.to_string(), |s| s.to_string()),
                );
                let message = format!("unrecognized category {raw}: {}", message.into());
                self.record(
                    Severity::Warning,
                    WarningCategory::CollectorInternal,
                    message,
                    borehole_id,
                    context,
                );
            }
        }
    }

    /// Increment a run counter.
    pub fn increment(&mut self, counter: Counter) {
        self.metrics.bump(counter, 1);
    }

    pub fn increment_by(&mut self, counter: Counter, by: u64) {
        self.metrics.bump(counter, by);
    }

    /// True if any warning at or above `min_severity` was recorded.
    pub fn has_warnings(&self, min_severity: Severity) -> bool {
        self.warnings.iter().any(|w| w.severity() >= min_severity)
    }

    /// True if anything at all was recorded.
    pub fn has_any(&self) -> bool {
        self.has_warnings(Severity::Info)
    }

    /// Matching warnings, oldest first.
    pub fn get_warnings(&self, filter: Option<WarningFilter>) -> Warnings<'_> {
        Warnings {
            inner: self.warnings.iter(),
            filter: filter.unwrap_or_default(),
        }
    }

    pub fn count(&self, category: WarningCategory) -> usize {
        self.get_warnings(Some(WarningFilter::category(category))).count()
    }

    /// All warnings, oldest first.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Snapshot of the counters at call time.
    pub fn get_metrics(&self) -> Metrics {
        self.metrics.clone()
    }

    /// Append `other`'s warnings after ours and add its counters.
    ///
    /// Used to fold per-worker collectors back into the run collector.
    pub fn absorb(&mut self, other: Self) {
        self.metrics.add(&other.metrics);
        self.warnings.extend(other.warnings);
    }

    pub fn summary(&self) -> QualitySummary {
        let mut by_category = BTreeMap::new();
        for w in &self.warnings {
            *by_category.entry(w.category()).or_insert(0usize) += 1;
        }
        let by_severity = |sev| self.warnings.iter().filter(|w| w.severity() == sev).count();
        QualitySummary {
            total: self.warnings.len(),
            info: by_severity(Severity::Info),
            warnings: by_severity(Severity::Warning),
            errors: by_severity(Severity::Error),
            by_category,
        }
    }

    fn trace(w: &Warning) {
        let borehole = w.borehole_id().unwrap_or("-");
        match w.severity() {
            Severity::Info => {
                debug!(category = %w.category(), borehole, "{}", w.message());
            }
            Severity::Warning => {
                warn!(category = %w.category(), borehole, "{}", w.message());
            }
            Severity::Error => {
                error!(category = %w.category(), borehole, "{}", w.message());
            }
        }
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Severity totals and per-category counts for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualitySummary {
    pub total: usize,
    pub info: usize,
    pub warnings: usize,
    pub errors: usize,
    pub by_category: BTreeMap<WarningCategory, usize>,
}

impl fmt::Display for QualitySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} issues recorded ({} info, {} warnings, {} errors)",
            self.total, self.info, self.warnings, self.errors
        )?;
        for (cat, n) in &self.by_category {
            writeln!(f, "  {cat:<26} {n}")?;
        }
        Ok(())
    }
}
