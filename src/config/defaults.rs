//! Built-in defaults for the combine pipeline.
//!
//! The standard group mapping follows AGS naming: each group prefixes its
//! headings with the group name, and depth ranges are `<GROUP>_TOP` plus a
//! base heading whose suffix varies by group.

use std::collections::BTreeMap;

// ============================================================================
// Identification
// ============================================================================

/// Heading that carries the borehole identifier in every group.
pub const BOREHOLE_ID_COLUMN: &str = "HOLE_ID";

/// Environment variable pointing at a combine config file.
pub const CONFIG_ENV_VAR: &str = "BOREHOLE_COMBINE_CONFIG";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "combine_config.toml";

// ============================================================================
// Depth Columns
// ============================================================================

/// Standard groups with their ordered depth-column candidates.
///
/// First entry is the top (required), the rest are base candidates.
/// Point groups (ISPT, SAMP) only carry a top depth.
pub const STANDARD_DEPTH_COLUMNS: &[(&str, &[&str])] = &[
    ("CORE", &["CORE_TOP", "CORE_BOT", "CORE_BASE"]),
    ("DETL", &["DETL_TOP", "DETL_BASE"]),
    ("DISC", &["DISC_TOP", "DISC_BASE"]),
    ("FRAC", &["FRAC_FROM", "FRAC_TO"]),
    ("GEOL", &["GEOL_TOP", "GEOL_BASE"]),
    ("ISPT", &["ISPT_TOP"]),
    ("SAMP", &["SAMP_TOP", "SAMP_BASE"]),
    ("WETH", &["WETH_TOP", "WETH_BASE"]),
];

/// The standard mapping as owned data.
pub fn standard_depth_columns() -> BTreeMap<String, Vec<String>> {
    STANDARD_DEPTH_COLUMNS
        .iter()
        .map(|(group, cols)| {
            (
                (*group).to_string(),
                cols.iter().map(|c| (*c).to_string()).collect(),
            )
        })
        .collect()
}

/// Names of the standard groups.
pub fn standard_groups() -> Vec<String> {
    STANDARD_DEPTH_COLUMNS
        .iter()
        .map(|(group, _)| (*group).to_string())
        .collect()
}

// ============================================================================
// Inference
// ============================================================================

/// Heading suffixes that mark a top depth, most specific first.
const TOP_SUFFIXES: &[&str] = &["_TOP", "_FROM", "_DEPTH"];

/// Heading suffixes that mark a base depth.
const BASE_SUFFIXES: &[&str] = &["_BASE", "_BOT", "_TO"];

/// Guess depth-column candidates from a group's headings.
///
/// Returns an empty list when no top-like heading exists. A bare `DEPTH`
/// heading counts as a top.
pub fn infer_depth_columns(headings: &[String]) -> Vec<String> {
    let find = |suffixes: &[&str]| {
        suffixes.iter().find_map(|suffix| {
            headings
                .iter()
                .find(|h| h.to_ascii_uppercase().ends_with(suffix))
                .cloned()
        })
    };

    let Some(top) = find(TOP_SUFFIXES).or_else(|| {
        headings
            .iter()
            .find(|h| h.eq_ignore_ascii_case("DEPTH"))
            .cloned()
    }) else {
        return Vec::new();
    };

    let mut columns = vec![top];
    columns.extend(find(BASE_SUFFIXES));
    columns
}
