//! Config validation: unknown-key detection with Levenshtein suggestions
//! and value checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Tables whose children are free-form (group names), not fixed fields.
const OPEN_TABLES: &[&str] = &["depth_columns"];

/// Returns the set of valid dotted key paths for `CombineConfig`.
///
/// Must be kept in step with the struct in `combine_config.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        "borehole_id_column",
        "included_groups",
        "standard_groups",
        "depth_columns",
        "depth_tolerance",
        "infer_depth_columns",
        "parallel",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() && !OPEN_TABLES.contains(&path.as_str()) {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties go to the alphabetically first key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut candidates: Vec<&str> = known.iter().copied().collect();
    candidates.sort_unstable();
    candidates
        .into_iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns. Parse errors are left
/// for serde to report.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Value Validation
// ============================================================================

/// Check a parsed config for impossible and suspicious values.
///
/// Returns (errors, warnings): errors must prevent the config from being
/// used; warnings are logged.
pub fn validate_values(config: &super::CombineConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if config.borehole_id_column.trim().is_empty() {
        errors.push("borehole_id_column must not be empty".to_string());
    }

    let tol = config.depth_tolerance;
    if !tol.is_finite() || tol < 0.0 {
        errors.push(format!("depth_tolerance = {tol} must be a finite value >= 0"));
    } else if tol > 1.0 {
        warnings.push(ValidationWarning {
            field: "depth_tolerance".into(),
            message: format!("depth_tolerance = {tol} will merge breakpoints more than 1 unit apart"),
            suggestion: None,
        });
    }

    for (group, columns) in &config.depth_columns {
        if group.trim().is_empty() {
            errors.push("depth_columns has an entry with a blank group name".to_string());
        }
        if columns.is_empty() {
            errors.push(format!("depth_columns.{group} must list at least one column"));
        }
        if columns.iter().any(|c| c.trim().is_empty()) {
            errors.push(format!("depth_columns.{group} contains a blank column name"));
        }
    }

    for (field, names) in [
        ("standard_groups", Some(&config.standard_groups)),
        ("included_groups", config.included_groups.as_ref()),
    ] {
        if names.is_some_and(|n| n.iter().any(|g| g.trim().is_empty())) {
            errors.push(format!("{field} contains a blank group name"));
        }
    }

    if let Some(included) = &config.included_groups {
        if included.is_empty() {
            warnings.push(ValidationWarning {
                field: "included_groups".into(),
                message: "included_groups is empty; no group will be combined".into(),
                suggestion: Some("remove the key to include every group".into()),
            });
        }
    }

    (errors, warnings)
}
