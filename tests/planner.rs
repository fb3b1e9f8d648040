//! Integration tests for correction planning.

use approx::assert_relative_eq;
use fdr_planner::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn rec(model: &str, term: &str, p: f64) -> TestRecord {
    TestRecord::new(model, "y", term, p)
}

/// Dependency judgment keyed on model membership: terms of the same model
/// are positively dependent, everything else independent.
fn same_model_positive(a: &TestRecord, b: &TestRecord) -> Option<Dependence> {
    if a.model == b.model {
        Some(Dependence::Positive)
    } else {
        Some(Dependence::Independent)
    }
}

#[test]
fn singleton_groups_return_raw_pvalues() {
    let records = vec![rec("m1", "A", 0.01), rec("m2", "B", 0.04), rec("m3", "C", 0.2)];
    let deps = |_: &TestRecord, _: &TestRecord| Some(Dependence::Independent);

    let result = Planner::new().plan(&records, &deps).unwrap();

    assert_eq!(result.groups.len(), 3);
    assert!(result.groups.iter().all(|g| g.len() == 1));
    for (q, r) in result.iter().zip(records.iter()) {
        assert_relative_eq!(q.q_value, r.p_value, epsilon = 1e-12);
    }
}

#[test]
fn worked_three_record_scenario() {
    // A and B dependent within m1, C independent of both.
    let records = vec![rec("m1", "A", 0.01), rec("m1", "B", 0.04), rec("m2", "C", 0.20)];

    let result = Planner::new()
        .plan(&records, &same_model_positive)
        .unwrap();

    assert_eq!(result.groups.len(), 2);

    // {A, B} under BH: q_(2) = 0.04 * 2/2 = 0.04; q_(1) = min(0.04, 0.02) = 0.02
    let a = result.get(&records[0].key()).unwrap();
    let b = result.get(&records[1].key()).unwrap();
    assert_eq!(a.method, CorrectionMethod::BenjaminiHochberg);
    assert_eq!(a.group, b.group);
    assert_relative_eq!(a.q_value, 0.02, epsilon = 1e-12);
    assert_relative_eq!(b.q_value, 0.04, epsilon = 1e-12);

    // Singleton C unchanged
    let c = result.get(&records[2].key()).unwrap();
    assert_relative_eq!(c.q_value, 0.20, epsilon = 1e-12);
    assert_ne!(c.group, a.group);
}

#[test]
fn bonferroni_scenario() {
    let records = vec![rec("m1", "A", 0.01), rec("m1", "B", 0.04), rec("m1", "C", 0.20)];

    let result = Planner::new()
        .method_override(CorrectionMethod::Bonferroni)
        .plan(&records, &same_model_positive)
        .unwrap();

    assert_relative_eq!(result.q_values[0].q_value, 0.03, epsilon = 1e-12);
    assert_relative_eq!(result.q_values[1].q_value, 0.12, epsilon = 1e-12);
    assert_relative_eq!(result.q_values[2].q_value, 0.60, epsilon = 1e-12);
}

#[test]
fn bonferroni_qvalues_grow_with_family_size() {
    // Same p-value, larger family: q must not decrease.
    let mut previous = 0.0;
    for n in 1..=6 {
        let records: Vec<TestRecord> = (0..n)
            .map(|i| rec("m1", &format!("t{}", i), 0.01))
            .collect();
        let result = Planner::new()
            .method_override(CorrectionMethod::Bonferroni)
            .plan(&records, &same_model_positive)
            .unwrap();
        let q = result.q_values[0].q_value;
        assert!(q >= previous);
        previous = q;
    }
}

#[test]
fn step_up_monotonicity_within_group() {
    let p = [0.002, 0.011, 0.03, 0.06, 0.2, 0.44, 0.9];
    let records: Vec<TestRecord> = p
        .iter()
        .enumerate()
        .map(|(i, &p)| rec("m1", &format!("t{}", i), p))
        .collect();

    for method in [
        CorrectionMethod::BenjaminiHochberg,
        CorrectionMethod::BenjaminiYekutieli,
    ] {
        let result = Planner::new()
            .method_override(method)
            .plan(&records, &same_model_positive)
            .unwrap();
        // Input is already sorted by raw p; q-values must be non-decreasing.
        let qs: Vec<f64> = result.iter().map(|q| q.q_value).collect();
        for w in qs.windows(2) {
            assert!(w[1] >= w[0] - 1e-12);
        }
    }
}

#[test]
fn by_at_least_as_conservative_as_bh() {
    let p = [0.004, 0.02, 0.05, 0.13, 0.7];
    let records: Vec<TestRecord> = p
        .iter()
        .enumerate()
        .map(|(i, &p)| rec("m1", &format!("t{}", i), p))
        .collect();

    let bh = Planner::new()
        .method_override(CorrectionMethod::BenjaminiHochberg)
        .plan(&records, &same_model_positive)
        .unwrap();
    let by = Planner::new()
        .method_override(CorrectionMethod::BenjaminiYekutieli)
        .plan(&records, &same_model_positive)
        .unwrap();

    for (b, y) in bh.iter().zip(by.iter()) {
        assert!(y.q_value >= b.q_value);
    }
}

#[test]
fn general_dependence_anywhere_in_component_forces_by() {
    // A-B general, B-C positive: one component, BY for all three.
    let records = vec![rec("m1", "A", 0.01), rec("m1", "B", 0.02), rec("m1", "C", 0.03)];
    let deps = |a: &TestRecord, b: &TestRecord| {
        let pair = (a.term.as_str(), b.term.as_str());
        match pair {
            ("A", "B") | ("B", "A") => Some(Dependence::General),
            ("B", "C") | ("C", "B") => Some(Dependence::Positive),
            _ => Some(Dependence::Independent),
        }
    };

    let result = Planner::new().plan(&records, &deps).unwrap();

    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].method, CorrectionMethod::BenjaminiYekutieli);
    assert!(result.groups[0].has_general_dependence);
}

#[test]
fn dependency_edges_imply_co_membership() {
    // Chain A-B-C dependent, D isolated: {A,B,C} together, D alone, even
    // though A and C share no direct edge.
    let records = vec![
        rec("m1", "A", 0.01),
        rec("m1", "B", 0.02),
        rec("m1", "C", 0.03),
        rec("m1", "D", 0.5),
    ];
    let deps = |a: &TestRecord, b: &TestRecord| {
        let linked = matches!(
            (a.term.as_str(), b.term.as_str()),
            ("A", "B") | ("B", "A") | ("B", "C") | ("C", "B")
        );
        Some(if linked {
            Dependence::Positive
        } else {
            Dependence::Independent
        })
    };

    let result = Planner::new().plan(&records, &deps).unwrap();

    let group_of = |term: &str| {
        result
            .iter()
            .find(|q| q.term == term)
            .map(|q| q.group)
            .unwrap()
    };
    assert_eq!(group_of("A"), group_of("B"));
    assert_eq!(group_of("B"), group_of("C"));
    assert_ne!(group_of("A"), group_of("D"));
}

#[test]
fn empty_input_yields_empty_output() {
    let deps = |_: &TestRecord, _: &TestRecord| Some(Dependence::Independent);
    let result = Planner::new().plan(&[], &deps).unwrap();
    assert!(result.is_empty());
    assert!(result.groups.is_empty());
    assert!(result.gated_out.is_empty());
}

#[test]
fn duplicate_records_rejected() {
    let records = vec![rec("m1", "A", 0.01), rec("m1", "A", 0.03)];
    let err = Planner::new()
        .plan(&records, &same_model_positive)
        .unwrap_err();
    assert!(matches!(err, PlanError::DuplicateTestRecord { .. }));
}

#[test]
fn out_of_range_pvalue_rejected_not_clamped() {
    for bad in [-0.1, 1.1] {
        let records = vec![rec("m1", "A", bad)];
        let err = Planner::new()
            .plan(&records, &same_model_positive)
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidPValue { .. }));
    }
}

#[test]
fn cyclic_nesting_rejected() {
    let records = vec![rec("m1", "A", 0.01)];
    let nesting = ModelNesting::new().refine("m1", "m2").refine("m2", "m1");
    let err = Planner::new()
        .nesting(nesting)
        .plan(&records, &same_model_positive)
        .unwrap_err();
    assert!(matches!(err, PlanError::CyclicNesting { .. }));
}

#[test]
fn unresolved_dependency_aborts_plan() {
    let records = vec![rec("m1", "A", 0.01), rec("m1", "B", 0.04)];
    let deps = |_: &TestRecord, _: &TestRecord| -> Option<Dependence> { None };
    let err = Planner::new().plan(&records, &deps).unwrap_err();
    assert!(matches!(err, PlanError::UnresolvedDependency { .. }));
}

#[test]
fn gate_on_adjusted_vs_raw() {
    // Stage 0 (m1): A at 0.03 and B at 0.9, positively dependent.
    // BH gives q_A = min(0.9, 0.03 * 2) = 0.06, so A fails an adjusted
    // gate at 0.05 but passes a raw gate.
    let records = vec![
        rec("m1", "A", 0.03),
        rec("m1", "B", 0.9),
        rec("m2", "AB", 0.01),
    ];
    let nesting = ModelNesting::new().refine("m1", "m2");

    let gated = Planner::new()
        .nesting(nesting.clone())
        .gate(GatePolicy::adjusted(0.05))
        .plan(&records, &same_model_positive)
        .unwrap();
    assert_eq!(gated.len(), 2);
    assert_eq!(gated.gated_out, vec![records[2].key()]);

    let admitted = Planner::new()
        .nesting(nesting)
        .gate(GatePolicy::raw(0.05))
        .plan(&records, &same_model_positive)
        .unwrap();
    assert_eq!(admitted.len(), 3);
    assert!(admitted.gated_out.is_empty());

    // The refined test is a stage-1 singleton with its raw p-value.
    let ab = admitted.get(&records[2].key()).unwrap();
    assert_eq!(ab.stage, 1);
    assert_relative_eq!(ab.q_value, 0.01, epsilon = 1e-12);
}

#[test]
fn gate_matches_on_outcome() {
    // m1 shows a signal for outcome y only; the refined model's test on
    // outcome z has no passing parent and is gated out.
    let records = vec![
        TestRecord::new("m1", "y", "A", 0.001),
        TestRecord::new("m2", "y", "AB", 0.02),
        TestRecord::new("m2", "z", "AB", 0.02),
    ];
    let deps = |_: &TestRecord, _: &TestRecord| Some(Dependence::Independent);
    let nesting = ModelNesting::new().refine("m1", "m2");

    let result = Planner::new().nesting(nesting).plan(&records, &deps).unwrap();

    assert!(result.get(&records[1].key()).is_some());
    assert_eq!(result.gated_out, vec![records[2].key()]);
}

#[test]
fn dependency_table_drives_grouping() {
    let records = vec![rec("m1", "A", 0.01), rec("m1", "B", 0.04), rec("m2", "C", 0.20)];

    let mut table = DependencyTable::new().with_default(Dependence::Independent);
    table.insert(records[0].key(), records[1].key(), Dependence::General);

    let result = Planner::new().plan(&records, &table).unwrap();

    assert_eq!(result.groups.len(), 2);
    let a = result.get(&records[0].key()).unwrap();
    assert_eq!(a.method, CorrectionMethod::BenjaminiYekutieli);
    let c = result.get(&records[2].key()).unwrap();
    assert_relative_eq!(c.q_value, 0.20, epsilon = 1e-12);
}

#[test]
fn tsv_round_trip() {
    let mut records_file = NamedTempFile::new().unwrap();
    writeln!(records_file, "model\toutcome\tterm\tp_value").unwrap();
    writeln!(records_file, "m1\ty\tA\t0.01").unwrap();
    writeln!(records_file, "m1\ty\tB\t0.04").unwrap();
    writeln!(records_file, "m2\ty\tC\t0.20").unwrap();
    records_file.flush().unwrap();

    let mut deps_file = NamedTempFile::new().unwrap();
    writeln!(
        deps_file,
        "model_a\toutcome_a\tterm_a\tmodel_b\toutcome_b\tterm_b\tdependence"
    )
    .unwrap();
    writeln!(deps_file, "m1\ty\tA\tm1\ty\tB\tpositive").unwrap();
    deps_file.flush().unwrap();

    let records = TestRecord::from_tsv(records_file.path()).unwrap();
    let table = DependencyTable::from_tsv(deps_file.path())
        .unwrap()
        .with_default(Dependence::Independent);

    let result = Planner::new().plan(&records, &table).unwrap();

    let out = NamedTempFile::new().unwrap();
    result.to_tsv(out.path()).unwrap();
    let written = std::fs::read_to_string(out.path()).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("model\toutcome\tterm"));
    assert!(lines[1].contains("\tbh\t"));
    assert!(lines[3].contains("\tC\t"));
}

#[test]
fn plan_config_yaml_round_trip() {
    let config = PlanConfig {
        name: "staged".to_string(),
        description: Some("two-stage nested analysis".to_string()),
        nesting: ModelNesting::new().refine("m1", "m2"),
        gate: GatePolicy::raw(0.1),
        method_override: Some(CorrectionMethod::BenjaminiYekutieli),
    };

    let yaml = config.to_yaml().unwrap();
    let restored = PlanConfig::from_yaml(&yaml).unwrap();

    assert_eq!(restored.name, "staged");
    assert_eq!(restored.gate, GatePolicy::raw(0.1));
    assert_eq!(
        restored.method_override,
        Some(CorrectionMethod::BenjaminiYekutieli)
    );
    assert!(!restored.nesting.is_empty());
}
