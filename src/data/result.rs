//! Output types for a planning run.

use crate::correct::CorrectionMethod;
use crate::data::TestKey;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Adjusted p-value for a single test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QValue {
    /// Model identifier.
    pub model: String,
    /// Outcome variable name.
    pub outcome: String,
    /// Term or contrast name.
    pub term: String,
    /// Raw p-value.
    pub p_value: f64,
    /// Adjusted p-value (q-value) after multiple testing correction.
    pub q_value: f64,
    /// Correction method applied to this test's group.
    pub method: CorrectionMethod,
    /// Correction group this test was assigned to.
    pub group: usize,
    /// Nesting stage the test was planned in.
    pub stage: usize,
}

impl QValue {
    /// Identity key of the underlying test.
    pub fn key(&self) -> TestKey {
        TestKey {
            model: self.model.clone(),
            outcome: self.outcome.clone(),
            term: self.term.clone(),
        }
    }

    /// Check if significant at a threshold.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.q_value < alpha
    }
}

/// Summary of one correction group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group identifier, unique within the plan.
    pub id: usize,
    /// Nesting stage the group belongs to.
    pub stage: usize,
    /// Correction method applied.
    pub method: CorrectionMethod,
    /// Member test keys.
    pub members: Vec<TestKey>,
    /// Whether any internal dependency edge was of general/unknown form.
    pub has_general_dependence: bool,
}

impl GroupSummary {
    /// Number of tests corrected jointly in this group.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Full output of one planning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    /// Adjusted p-values, in the input record order (gated-out records
    /// excluded).
    pub q_values: Vec<QValue>,
    /// Correction groups formed during planning.
    pub groups: Vec<GroupSummary>,
    /// Tests excluded by stage gating, in input order.
    pub gated_out: Vec<TestKey>,
}

impl PlanResult {
    /// Number of corrected tests.
    pub fn len(&self) -> usize {
        self.q_values.len()
    }

    /// Check if no tests were corrected.
    pub fn is_empty(&self) -> bool {
        self.q_values.is_empty()
    }

    /// Get the q-value entry for a specific test.
    pub fn get(&self, key: &TestKey) -> Option<&QValue> {
        self.q_values
            .iter()
            .find(|q| q.model == key.model && q.outcome == key.outcome && q.term == key.term)
    }

    /// Q-value entries sorted by ascending q-value.
    pub fn sorted_by_qvalue(&self) -> Vec<&QValue> {
        let mut sorted: Vec<_> = self.q_values.iter().collect();
        sorted.sort_by(|a, b| a.q_value.partial_cmp(&b.q_value).unwrap());
        sorted
    }

    /// Tests significant at a threshold.
    pub fn significant_at(&self, alpha: f64) -> Vec<&QValue> {
        self.q_values
            .iter()
            .filter(|q| q.is_significant_at(alpha))
            .collect()
    }

    /// Summary counters for reporting.
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            total: self.len(),
            n_groups: self.groups.len(),
            n_gated_out: self.gated_out.len(),
            significant_01: self.q_values.iter().filter(|q| q.q_value < 0.01).count(),
            significant_05: self.q_values.iter().filter(|q| q.q_value < 0.05).count(),
            significant_10: self.q_values.iter().filter(|q| q.q_value < 0.10).count(),
        }
    }

    /// Write the q-value table to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "model\toutcome\tterm\tp_value\tq_value\tmethod\tgroup\tstage"
        )?;
        for q in &self.q_values {
            writeln!(
                writer,
                "{}\t{}\t{}\t{:.6e}\t{:.6e}\t{}\t{}\t{}",
                q.model, q.outcome, q.term, q.p_value, q.q_value, q.method, q.group, q.stage
            )?;
        }

        Ok(())
    }

    /// Iterate over q-value entries.
    pub fn iter(&self) -> impl Iterator<Item = &QValue> {
        self.q_values.iter()
    }
}

/// Summary counters for a planning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total: usize,
    pub n_groups: usize,
    pub n_gated_out: usize,
    pub significant_01: usize,
    pub significant_05: usize,
    pub significant_10: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tests corrected:          {}", self.total)?;
        writeln!(f, "Correction groups:        {}", self.n_groups)?;
        writeln!(f, "Gated out by nesting:     {}", self.n_gated_out)?;
        writeln!(f, "Significant at q < 0.01:  {}", self.significant_01)?;
        writeln!(f, "Significant at q < 0.05:  {}", self.significant_05)?;
        writeln!(f, "Significant at q < 0.10:  {}", self.significant_10)?;
        Ok(())
    }
}
