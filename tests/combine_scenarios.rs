//! End-to-end combine scenarios
//!
//! Drives the full pipeline through `Combiner` and checks the combined table
//! together with the exact collector contents.

use borehole_combine::{
    CellValue, CombineConfig, CombinedTable, Combiner, GroupSet, GroupTable, Severity, WarningCategory, WarningFilter,
};
use proptest::prelude::*;

// ============================================================================
// Fixtures
// ============================================================================

fn ispt(rows: &[(&str, &str, &str)]) -> GroupTable {
    let mut t = GroupTable::new("ISPT", ["HOLE_ID", "ISPT_TOP", "ISPT_NVAL"]).unwrap();
    for &(hole, top, nval) in rows {
        t.push_row([hole, top, nval]).unwrap();
    }
    t
}

fn geol(rows: &[(&str, &str, &str, &str)]) -> GroupTable {
    let mut t = GroupTable::new("GEOL", ["HOLE_ID", "GEOL_TOP", "GEOL_BASE", "GEOL_DESC"]).unwrap();
    for &(hole, top, base, desc) in rows {
        t.push_row([hole, top, base, desc]).unwrap();
    }
    t
}

fn categories(collector: &borehole_combine::Collector, min: Severity) -> Vec<WarningCategory> {
    collector
        .get_warnings(Some(WarningFilter::at_least(min)))
        .map(borehole_combine::Warning::category)
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn out_of_order_depths_are_resorted_and_reported() {
    let groups: GroupSet = [ispt(&[
        ("B1", "0", "5"),
        ("B1", "5", "12"),
        ("B1", "3", "9"),
        ("B1", "8", "30"),
    ])]
    .into_iter()
    .collect();
    let (table, collector) = Combiner::default().run(&groups);

    assert_eq!(table.intervals_for("B1"), vec![(0.0, 3.0), (3.0, 5.0), (5.0, 8.0)]);
    assert_eq!(
        categories(&collector, Severity::Warning),
        vec![WarningCategory::DepthOrderingError, WarningCategory::UnjoinedRows]
    );
    let ordering = collector
        .get_warnings(Some(WarningFilter::category(WarningCategory::DepthOrderingError)))
        .next()
        .unwrap();
    assert!(ordering.message().contains("5 > 3"), "{}", ordering.message());
    assert_eq!(ordering.borehole_id(), Some("B1"));

    // point rows land in the interval starting at their depth
    assert_eq!(table.records[0].value("ISPT", "ISPT_NVAL"), Some(&CellValue::from("5")));
    assert_eq!(table.records[1].value("ISPT", "ISPT_NVAL"), Some(&CellValue::from("9")));
    assert_eq!(table.records[2].value("ISPT", "ISPT_NVAL"), Some(&CellValue::from("12")));

    // the row at 8 loses (5, 8) to the row at 5 and is reported
    let unjoined = collector
        .get_warnings(Some(WarningFilter::category(WarningCategory::UnjoinedRows)))
        .next()
        .unwrap();
    assert_eq!(unjoined.context_value("first_row"), Some("3"));
    assert_eq!(collector.get_metrics().rows_unjoined, 1);
}

#[test]
fn single_depth_point_skips_the_borehole() {
    let groups: GroupSet = [ispt(&[("B1", "2.0", "7")])].into_iter().collect();
    let (table, collector) = Combiner::default().run(&groups);

    assert!(table.is_empty());
    let insufficient: Vec<_> = collector
        .get_warnings(Some(WarningFilter::category(WarningCategory::InsufficientDepthPoints)))
        .collect();
    assert_eq!(insufficient.len(), 1);
    assert_eq!(insufficient[0].context_value("found"), Some("1"));
    assert_eq!(insufficient[0].context_value("minimum"), Some("2"));
    assert_eq!(collector.count(WarningCategory::BoreholeProcessing), 1);

    let m = collector.get_metrics();
    assert_eq!((m.boreholes_seen, m.boreholes_processed, m.boreholes_skipped), (1, 0, 1));
}

#[test]
fn duplicate_depth_is_not_a_zero_length_interval() {
    let groups: GroupSet = [ispt(&[("B1", "0", "1"), ("B1", "0", "2"), ("B1", "4", "3")])]
        .into_iter()
        .collect();
    let (table, collector) = Combiner::default().run(&groups);

    assert_eq!(table.intervals_for("B1"), vec![(0.0, 4.0)]);
    assert_eq!(collector.count(WarningCategory::ZeroLengthIntervals), 0);
    // first matching row wins; the other two are reported, not dropped
    assert_eq!(table.records[0].value("ISPT", "ISPT_NVAL"), Some(&CellValue::from("1")));
    assert_eq!(
        categories(&collector, Severity::Warning),
        vec![WarningCategory::UnjoinedRows]
    );
    assert_eq!(collector.get_metrics().rows_unjoined, 2);
}

#[test]
fn deepest_point_row_is_joined_or_reported() {
    // a sample at the base of a logged stratum joins the deepest interval
    let groups: GroupSet = [
        geol(&[("B1", "1", "3", "Clay")]),
        ispt(&[("B1", "3", "50")]),
    ]
    .into_iter()
    .collect();
    let (table, collector) = Combiner::default().run(&groups);
    assert_eq!(table.intervals_for("B1"), vec![(1.0, 3.0)]);
    assert_eq!(table.records[0].value("ISPT", "ISPT_NVAL"), Some(&CellValue::from("50")));
    assert!(!collector.has_warnings(Severity::Warning));

    // with a shallower test already on the interval, the deeper one is reported
    let groups: GroupSet = [ispt(&[("B1", "1", "10"), ("B1", "3", "50")])].into_iter().collect();
    let (table, collector) = Combiner::default().run(&groups);
    assert_eq!(table.intervals_for("B1"), vec![(1.0, 3.0)]);
    assert_eq!(table.records[0].value("ISPT", "ISPT_NVAL"), Some(&CellValue::from("10")));
    assert_eq!(collector.count(WarningCategory::UnjoinedRows), 1);

    let summary = collector
        .get_warnings(Some(WarningFilter::category(WarningCategory::DataLossSummary)))
        .next()
        .unwrap();
    assert_eq!(summary.context_value("rows_unjoined"), Some("1"));
}

#[test]
fn repeated_group_in_json_is_merged() {
    let groups: GroupSet = serde_json::from_str(
        r#"[
            {"name": "CORE", "headings": ["HOLE_ID", "CORE_TOP", "CORE_BOT", "CORE_PREC"],
             "rows": [["B1", 0, 1, "80"]]},
            {"name": "CORE", "headings": ["HOLE_ID", "CORE_TOP", "CORE_BOT", "CORE_PREC"],
             "rows": [["B1", 1, 2, "95"]]}
        ]"#,
    )
    .unwrap();
    let (table, collector) = Combiner::default().run(&groups);

    assert_eq!(collector.get_metrics().groups_seen, 1);
    assert_eq!(table.intervals_for("B1"), vec![(0.0, 1.0), (1.0, 2.0)]);
    assert_eq!(table.records[0].value("CORE", "CORE_PREC"), Some(&CellValue::from("80")));
    assert_eq!(table.records[1].value("CORE", "CORE_PREC"), Some(&CellValue::from("95")));
    assert!(table.headers().iter().all(|h| !h.starts_with("CORE.")));
    assert!(!collector.has_warnings(Severity::Warning));
}

#[test]
fn missing_primary_column_leaves_group_unset() {
    let mut core = GroupTable::new("CORE", ["HOLE_ID", "CORE_BOT", "CORE_PREC"]).unwrap();
    core.push_row(["B1", "4", "95"]).unwrap();
    let groups: GroupSet = [
        geol(&[("B1", "0", "2", "Clay"), ("B1", "2", "4", "Sand")]),
        core,
    ]
    .into_iter()
    .collect();
    let (table, collector) = Combiner::default().run(&groups);

    assert_eq!(table.intervals_for("B1"), vec![(0.0, 2.0), (2.0, 4.0)]);
    for record in table.records_for("B1") {
        assert!(record.has_group("GEOL"));
        assert!(!record.has_group("CORE"));
        assert_eq!(record.value("CORE", "CORE_PREC"), None);
    }
    assert_eq!(table.records[1].value("GEOL", "GEOL_DESC"), Some(&CellValue::from("Sand")));

    let missing: Vec<_> = collector
        .get_warnings(Some(WarningFilter::category(WarningCategory::MissingColumn)))
        .collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].context_value("column"), Some("CORE_TOP"));
    assert_eq!(missing[0].borehole_id(), Some("B1"));

    // CORE attribute columns are still part of the output layout
    assert!(table.headers().iter().any(|h| h == "CORE_PREC"));
    let source = collector
        .get_warnings(Some(WarningFilter::category(WarningCategory::BoreholeDataSource)))
        .next()
        .unwrap();
    assert_eq!(source.context_value("groups"), Some("GEOL"));
}

#[test]
fn shared_breakpoint_appears_once() {
    let mut core = GroupTable::new("CORE", ["HOLE_ID", "CORE_TOP", "CORE_BOT", "CORE_PREC"]).unwrap();
    core.push_row(["B1", "1", "3", "80"]).unwrap();
    let groups: GroupSet = [
        geol(&[("B1", "0", "3", "Clay"), ("B1", "3", "6", "Sand")]),
        core,
    ]
    .into_iter()
    .collect();
    let (table, collector) = Combiner::default().run(&groups);

    assert_eq!(table.intervals_for("B1"), vec![(0.0, 1.0), (1.0, 3.0), (3.0, 6.0)]);
    assert_eq!(collector.count(WarningCategory::ZeroLengthIntervals), 0);
    assert_eq!(table.records[1].value("CORE", "CORE_PREC"), Some(&CellValue::from("80")));
    assert_eq!(table.records[1].value("GEOL", "GEOL_DESC"), Some(&CellValue::from("Clay")));
    assert!(!table.records[2].has_group("CORE"));
}

#[test]
fn rerun_is_deterministic() {
    let groups: GroupSet = [
        geol(&[("B2", "0", "1", "Fill"), ("B1", "0", "2", "Clay"), ("B2", "1", "x", "Peat")]),
        ispt(&[("B1", "1.5", "10"), ("B3", "4", "22")]),
    ]
    .into_iter()
    .collect();
    let combiner = Combiner::default();
    let (first_table, first) = combiner.run(&groups);
    let (second_table, second) = combiner.run(&groups);

    assert_eq!(first_table, second_table);
    assert_eq!(first.warnings(), second.warnings());
    assert_eq!(first.get_metrics(), second.get_metrics());
    assert_eq!(first.count(WarningCategory::NonNumericDepth), 1);
}

#[test]
fn every_borehole_is_accounted_for() {
    let groups: GroupSet = [
        geol(&[("B1", "0", "2", "Clay"), ("B2", "x", "y", "?")]),
        ispt(&[("B3", "5", "1")]),
    ]
    .into_iter()
    .collect();
    let (table, collector) = Combiner::default().run(&groups);

    for id in ["B1", "B2", "B3"] {
        let in_table = table.borehole_ids().contains(&id);
        let skipped = collector
            .get_warnings(Some(WarningFilter::category(WarningCategory::BoreholeProcessing).for_borehole(id)))
            .count()
            == 1;
        assert!(in_table ^ skipped, "{id} must be either combined or reported");
    }
    let m = collector.get_metrics();
    assert_eq!(m.boreholes_seen, m.boreholes_processed + m.boreholes_skipped);
}

#[test]
fn tolerance_merges_near_breakpoints() {
    let mut core = GroupTable::new("CORE", ["HOLE_ID", "CORE_TOP", "CORE_BOT"]).unwrap();
    core.push_row(["B1", "0", "2.004"]).unwrap();
    let groups: GroupSet = [geol(&[("B1", "0", "2", "Clay"), ("B1", "2", "5", "Sand")]), core]
        .into_iter()
        .collect();

    let (exact, _) = Combiner::default().run(&groups);
    assert_eq!(exact.len(), 3);

    let (merged, _) = Combiner::new(CombineConfig::default().with_tolerance(0.01)).run(&groups);
    assert_eq!(merged.intervals_for("B1"), vec![(0.0, 2.0), (2.0, 5.0)]);
}

#[test]
fn report_serializes_to_json() {
    let groups: GroupSet = [geol(&[("B1", "0", "2", "Clay")])].into_iter().collect();
    let (table, collector) = Combiner::default().run(&groups);

    let json = serde_json::to_value(collector.warnings()).unwrap();
    assert_eq!(json[0]["severity"], "INFO");
    assert_eq!(json[0]["category"], "BOREHOLE_DATA_SOURCE");
    assert_eq!(table.headers()[..3], CombinedTable::FIXED_HEADERS);
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn intervals_are_contiguous_and_positive(depths in prop::collection::vec(0u16..500, 0..40)) {
        let mut group = GroupTable::new("ISPT", ["HOLE_ID", "ISPT_TOP"]).unwrap();
        for d in &depths {
            group
                .push_row([CellValue::from("B1"), CellValue::from(f64::from(*d) / 10.0)])
                .unwrap();
        }
        let groups: GroupSet = [group].into_iter().collect();
        let (table, collector) = Combiner::default().run(&groups);

        let mut distinct = depths.clone();
        distinct.sort_unstable();
        distinct.dedup();

        let intervals = table.intervals_for("B1");
        if distinct.len() < 2 {
            prop_assert!(intervals.is_empty());
            if !depths.is_empty() {
                prop_assert_eq!(collector.count(WarningCategory::InsufficientDepthPoints), 1);
            }
        } else {
            prop_assert_eq!(intervals.len(), distinct.len() - 1);
            for (from, to) in &intervals {
                prop_assert!(from < to);
            }
            for pair in intervals.windows(2) {
                prop_assert_eq!(pair[0].1, pair[1].0);
            }
            prop_assert_eq!(collector.count(WarningCategory::ZeroLengthIntervals), 0);

            // every row either reaches the output or is counted as unjoined
            let joined = table.records.iter().filter(|r| r.has_group("ISPT")).count() as u64;
            prop_assert_eq!(joined + collector.get_metrics().rows_unjoined, depths.len() as u64);
        }
        prop_assert!(collector.count(WarningCategory::DepthOrderingError) <= 1);
    }
}
