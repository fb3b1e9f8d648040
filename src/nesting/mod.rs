//! Model nesting structure and staged-planning gate policy.
//!
//! A nested analysis fits a coarse model first (say `y ~ A`) and a refined
//! model second (`y ~ A*B`), carrying forward only outcomes that showed a
//! signal in the first stage. The nesting structure is a partial order over
//! model identifiers; each chain depth becomes one correction stage planned
//! on its own.

use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Partial order over model identifiers, as refinement edges.
///
/// An edge `parent -> child` states that `child` refines `parent` and its
/// tests are only planned for outcomes that passed the gate in `parent`'s
/// stage. Models never mentioned here sit at stage 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelNesting {
    edges: Vec<(String, String)>,
}

impl ModelNesting {
    /// Create an empty nesting (every model at stage 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `child` refines `parent`.
    pub fn refine(mut self, parent: &str, child: &str) -> Self {
        self.edges.push((parent.to_string(), child.to_string()));
        self
    }

    /// Check if no refinement edges are declared.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Direct parents of a model.
    pub fn parents_of(&self, model: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, c)| c == model)
            .map(|(p, _)| p.as_str())
            .collect()
    }

    /// Compute the stage of every model mentioned in the nesting.
    ///
    /// Stage = length of the longest refinement chain above the model
    /// (roots are stage 0). Fails with [`PlanError::CyclicNesting`] if the
    /// declared edges are not a valid partial order.
    pub fn stages(&self) -> Result<HashMap<String, usize>> {
        let mut models: HashSet<&str> = HashSet::new();
        for (p, c) in &self.edges {
            models.insert(p);
            models.insert(c);
        }

        // Kahn's algorithm; anything left with in-degree > 0 is on a cycle.
        let mut in_degree: HashMap<&str, usize> =
            models.iter().map(|&m| (m, 0)).collect();
        for (_, c) in &self.edges {
            *in_degree.get_mut(c.as_str()).unwrap() += 1;
        }

        let mut stage: HashMap<String, usize> =
            models.iter().map(|&m| (m.to_string(), 0)).collect();
        let mut queue: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&m, _)| m)
            .collect();
        let mut visited = 0;

        while let Some(model) = queue.pop() {
            visited += 1;
            let s = stage[model];
            for (p, c) in &self.edges {
                if p == model {
                    let child_stage = stage.get_mut(c.as_str()).unwrap();
                    *child_stage = (*child_stage).max(s + 1);
                    let d = in_degree.get_mut(c.as_str()).unwrap();
                    *d -= 1;
                    if *d == 0 {
                        queue.push(c.as_str());
                    }
                }
            }
        }

        if visited < models.len() {
            let offender = in_degree
                .iter()
                .filter(|(_, &d)| d > 0)
                .map(|(&m, _)| m)
                .min()
                .unwrap_or_default();
            return Err(PlanError::CyclicNesting {
                model: offender.to_string(),
            });
        }

        Ok(stage)
    }

    /// Validate the nesting without computing stages.
    pub fn validate(&self) -> Result<()> {
        self.stages().map(|_| ())
    }
}

/// Which statistic of the earlier stage a gate compares to its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatistic {
    /// Gate on the earlier stage's own q-value (the earlier stage is
    /// corrected before gating).
    Adjusted,
    /// Gate on the raw p-value (the earlier stage is left uncorrected;
    /// the position that only the refined stage deserves correction).
    Raw,
}

/// Policy for admitting later-stage tests into planning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Significance threshold a parent-stage test must beat.
    pub threshold: f64,
    /// Statistic compared against the threshold.
    pub statistic: GateStatistic,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            statistic: GateStatistic::Adjusted,
        }
    }
}

impl GatePolicy {
    /// Create a policy gating on adjusted q-values at the given threshold.
    pub fn adjusted(threshold: f64) -> Self {
        Self {
            threshold,
            statistic: GateStatistic::Adjusted,
        }
    }

    /// Create a policy gating on raw p-values at the given threshold.
    pub fn raw(threshold: f64) -> Self {
        Self {
            threshold,
            statistic: GateStatistic::Raw,
        }
    }

    /// Validate the threshold range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) || self.threshold.is_nan() {
            return Err(PlanError::InvalidParameter(format!(
                "Gate threshold {} must be in [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }
}
