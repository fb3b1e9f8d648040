//! The correction planner: grouping, method selection, and adjustment.

use crate::correct::CorrectionMethod;
use crate::data::{GroupSummary, PlanResult, QValue, TestKey, TestRecord};
use crate::dependency::{Dependence, DependencySource};
use crate::error::{PlanError, Result};
use crate::nesting::{GatePolicy, GateStatistic, ModelNesting};
use crate::planner::components::connected_components;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Serializable planner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Name of the analysis plan.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Model nesting structure.
    #[serde(default)]
    pub nesting: ModelNesting,
    /// Stage gating policy.
    #[serde(default)]
    pub gate: GatePolicy,
    /// Explicit method override for all multi-member groups.
    #[serde(default)]
    pub method_override: Option<CorrectionMethod>,
}

impl PlanConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(PlanError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(PlanError::from)
    }
}

/// Builder for configuring and running a correction plan.
///
/// Planning is a pure function of the records, the dependency source, and
/// these settings; the planner holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    nesting: ModelNesting,
    gate: GatePolicy,
    method_override: Option<CorrectionMethod>,
}

impl Planner {
    /// Create a planner with default settings: no nesting, gate on
    /// adjusted q-values at 0.05, method inferred per group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a config.
    pub fn from_config(config: &PlanConfig) -> Self {
        Self {
            nesting: config.nesting.clone(),
            gate: config.gate,
            method_override: config.method_override,
        }
    }

    /// Set the model nesting structure.
    pub fn nesting(mut self, nesting: ModelNesting) -> Self {
        self.nesting = nesting;
        self
    }

    /// Set the stage gating policy.
    pub fn gate(mut self, gate: GatePolicy) -> Self {
        self.gate = gate;
        self
    }

    /// Force one correction method for every multi-member group.
    ///
    /// The inferred choice (BY when a group contains a general-dependence
    /// edge, BH otherwise) is a default, not a verdict; an analyst with
    /// stronger prior knowledge overrides it here.
    pub fn method_override(mut self, method: CorrectionMethod) -> Self {
        self.method_override = Some(method);
        self
    }

    /// Plan the correction: validate, stage, group, and adjust.
    ///
    /// # Arguments
    /// * `records` - Hypothesis tests from the upstream modeling step
    /// * `deps` - Analyst-supplied dependency judgments
    ///
    /// # Returns
    /// A [`PlanResult`] with q-values in input order, group summaries, and
    /// any tests excluded by stage gating.
    pub fn plan<D: DependencySource>(
        &self,
        records: &[TestRecord],
        deps: &D,
    ) -> Result<PlanResult> {
        self.gate.validate()?;
        validate_records(records)?;
        let stages = self.nesting.stages()?;

        if records.is_empty() {
            return Ok(PlanResult {
                q_values: vec![],
                groups: vec![],
                gated_out: vec![],
            });
        }

        // Partition record indices by nesting stage; unlisted models are
        // stage 0.
        let mut by_stage: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, r) in records.iter().enumerate() {
            let stage = stages.get(&r.model).copied().unwrap_or(0);
            by_stage.entry(stage).or_default().push(i);
        }

        let mut slots: Vec<Option<QValue>> = vec![None; records.len()];
        let mut groups: Vec<GroupSummary> = Vec::new();
        let mut gated_out_mask = vec![false; records.len()];

        for (&stage, indices) in &by_stage {
            // Gate: a later-stage test enters planning only if some test
            // for the same outcome in a parent model passed at its stage.
            let admitted: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| {
                    if stage == 0 {
                        return true;
                    }
                    let passed = self.passes_gate(&records[i], &slots);
                    if !passed {
                        gated_out_mask[i] = true;
                    }
                    passed
                })
                .collect();

            log::debug!(
                "stage {}: {} of {} tests admitted",
                stage,
                admitted.len(),
                indices.len()
            );

            self.plan_stage(records, deps, stage, &admitted, &mut slots, &mut groups)?;
        }

        let q_values: Vec<QValue> = slots.into_iter().flatten().collect();
        let gated_out: Vec<TestKey> = records
            .iter()
            .enumerate()
            .filter(|(i, _)| gated_out_mask[*i])
            .map(|(_, r)| r.key())
            .collect();

        Ok(PlanResult {
            q_values,
            groups,
            gated_out,
        })
    }

    /// Group and adjust the admitted tests of one stage.
    fn plan_stage<D: DependencySource>(
        &self,
        records: &[TestRecord],
        deps: &D,
        stage: usize,
        admitted: &[usize],
        slots: &mut Vec<Option<QValue>>,
        groups: &mut Vec<GroupSummary>,
    ) -> Result<()> {
        let n = admitted.len();

        // Pairwise dependency edges within the stage, O(n^2) assessments.
        let mut edges: Vec<(usize, usize)> = Vec::new();
        let mut general_edges: Vec<(usize, usize)> = Vec::new();
        for a in 0..n {
            for b in (a + 1)..n {
                let judgment = deps.assess(&records[admitted[a]], &records[admitted[b]])?;
                if judgment.is_dependent() {
                    edges.push((a, b));
                    if judgment == Dependence::General {
                        general_edges.push((a, b));
                    }
                }
            }
        }

        let components = connected_components(n, &edges);

        // Mark components containing a general-dependence edge.
        let mut component_of = vec![0usize; n];
        for (c, members) in components.iter().enumerate() {
            for &m in members {
                component_of[m] = c;
            }
        }
        let mut has_general = vec![false; components.len()];
        for &(a, _) in &general_edges {
            has_general[component_of[a]] = true;
        }

        for (c, members) in components.iter().enumerate() {
            let group_id = groups.len();
            let method = match self.method_override {
                Some(m) => m,
                None if has_general[c] => CorrectionMethod::BenjaminiYekutieli,
                None => CorrectionMethod::BenjaminiHochberg,
            };

            let p_values: Vec<f64> = members
                .iter()
                .map(|&m| records[admitted[m]].p_value)
                .collect();
            let q_values = method.adjust(&p_values);

            log::debug!(
                "stage {}: group {} of size {} corrected with {}",
                stage,
                group_id,
                members.len(),
                method
            );

            let mut member_keys = Vec::with_capacity(members.len());
            for (&m, &q) in members.iter().zip(q_values.iter()) {
                let record = &records[admitted[m]];
                member_keys.push(record.key());
                slots[admitted[m]] = Some(QValue {
                    model: record.model.clone(),
                    outcome: record.outcome.clone(),
                    term: record.term.clone(),
                    p_value: record.p_value,
                    q_value: q,
                    method,
                    group: group_id,
                    stage,
                });
            }

            groups.push(GroupSummary {
                id: group_id,
                stage,
                method,
                members: member_keys,
                has_general_dependence: has_general[c],
            });
        }

        Ok(())
    }

    /// Check whether a later-stage record passes the gate: some test for
    /// the same outcome in a direct parent model beat the threshold.
    fn passes_gate(&self, record: &TestRecord, slots: &[Option<QValue>]) -> bool {
        let parents = self.nesting.parents_of(&record.model);
        if parents.is_empty() {
            // Model is a nesting root despite its stage; nothing gates it.
            return true;
        }
        slots.iter().flatten().any(|q| {
            q.outcome == record.outcome
                && parents.iter().any(|&p| p == q.model)
                && self.gate_statistic(q) < self.gate.threshold
        })
    }

    fn gate_statistic(&self, q: &QValue) -> f64 {
        match self.gate.statistic {
            GateStatistic::Adjusted => q.q_value,
            GateStatistic::Raw => q.p_value,
        }
    }
}

/// Validate raw p-values and record identity up front: out-of-range
/// p-values and duplicate submissions indicate an upstream error the
/// analyst must fix, so nothing is clamped or deduplicated.
fn validate_records(records: &[TestRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for r in records {
        if r.p_value.is_nan() || !(0.0..=1.0).contains(&r.p_value) {
            return Err(PlanError::InvalidPValue {
                key: r.key().to_string(),
                value: r.p_value,
            });
        }
        if !seen.insert(r.key_ref()) {
            return Err(PlanError::DuplicateTestRecord {
                key: r.key().to_string(),
            });
        }
    }
    Ok(())
}
