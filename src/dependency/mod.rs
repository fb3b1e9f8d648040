//! Analyst-supplied dependency knowledge between hypothesis tests.
//!
//! Whether two tests' underlying variables are statistically dependent is
//! domain knowledge, not something inferable from the p-values themselves.
//! The planner therefore takes dependency assessments as an injected
//! capability: a callback or a precomputed lookup table, never a heuristic.

use crate::data::{TestKey, TestRecord};
use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Analyst judgment of the dependence between two tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependence {
    /// The tests are independent; no joint correction required between them.
    Independent,
    /// Dependent with a known positive structure. Benjamini-Hochberg remains
    /// valid for a family connected only by such edges.
    Positive,
    /// Dependent with general or unknown structure. Any family containing
    /// such an edge must use Benjamini-Yekutieli unless overridden.
    General,
}

impl Dependence {
    /// Whether this judgment links the two tests into one correction family.
    pub fn is_dependent(&self) -> bool {
        !matches!(self, Dependence::Independent)
    }
}

impl std::str::FromStr for Dependence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "independent" => Ok(Dependence::Independent),
            "positive" => Ok(Dependence::Positive),
            "general" | "unknown" => Ok(Dependence::General),
            other => Err(format!("Unknown dependence judgment '{}'", other)),
        }
    }
}

/// Source of pairwise dependency judgments.
///
/// Implementations must be symmetric: `assess(a, b)` and `assess(b, a)`
/// are expected to agree. The planner queries each unordered pair once.
pub trait DependencySource {
    /// Assess the dependence between two test records.
    ///
    /// Returning an error (or, for the closure impl, `None`) aborts the
    /// whole plan with [`PlanError::UnresolvedDependency`]: a pair the
    /// analyst cannot classify means the analysis plan is incomplete.
    fn assess(&self, a: &TestRecord, b: &TestRecord) -> Result<Dependence>;
}

impl<F> DependencySource for F
where
    F: Fn(&TestRecord, &TestRecord) -> Option<Dependence>,
{
    fn assess(&self, a: &TestRecord, b: &TestRecord) -> Result<Dependence> {
        self(a, b).ok_or_else(|| PlanError::UnresolvedDependency {
            a: a.key().to_string(),
            b: b.key().to_string(),
            reason: "dependency callback returned no judgment".to_string(),
        })
    }
}

/// Precomputed symmetric lookup table of dependency judgments.
///
/// Pairs are stored under a canonical (sorted) key order, so inserting
/// (a, b) also answers queries for (b, a). Pairs absent from the table
/// fall back to `default` when one is set; otherwise lookup fails.
#[derive(Debug, Clone, Default)]
pub struct DependencyTable {
    entries: HashMap<(TestKey, TestKey), Dependence>,
    default: Option<Dependence>,
}

impl DependencyTable {
    /// Create an empty table with no default judgment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the judgment used for pairs not listed in the table.
    pub fn with_default(mut self, default: Dependence) -> Self {
        self.default = Some(default);
        self
    }

    /// Record a judgment for a pair of tests (order-insensitive).
    pub fn insert(&mut self, a: TestKey, b: TestKey, dependence: Dependence) {
        self.entries.insert(Self::canonical(a, b), dependence);
    }

    /// Number of explicit pair judgments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table holds no explicit judgments.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the judgment for a pair, if known.
    pub fn get(&self, a: &TestKey, b: &TestKey) -> Option<Dependence> {
        self.entries
            .get(&Self::canonical(a.clone(), b.clone()))
            .copied()
            .or(self.default)
    }

    /// Load a table from a TSV file.
    ///
    /// Expected columns: `model_a`, `outcome_a`, `term_a`, `model_b`,
    /// `outcome_b`, `term_b`, `dependence` (one of `independent`,
    /// `positive`, `general`).
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        for required in [
            "model_a", "outcome_a", "term_a", "model_b", "outcome_b", "term_b", "dependence",
        ] {
            if !headers.iter().any(|h| h == required) {
                return Err(PlanError::MissingColumn(required.to_string()));
            }
        }

        let mut table = DependencyTable::new();
        for row in reader.deserialize() {
            let row: DependencyRow = row?;
            let dependence = row.dependence.parse().map_err(PlanError::InvalidParameter)?;
            table.insert(
                TestKey {
                    model: row.model_a,
                    outcome: row.outcome_a,
                    term: row.term_a,
                },
                TestKey {
                    model: row.model_b,
                    outcome: row.outcome_b,
                    term: row.term_b,
                },
                dependence,
            );
        }

        Ok(table)
    }

    fn canonical(a: TestKey, b: TestKey) -> (TestKey, TestKey) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl DependencySource for DependencyTable {
    fn assess(&self, a: &TestRecord, b: &TestRecord) -> Result<Dependence> {
        self.get(&a.key(), &b.key())
            .ok_or_else(|| PlanError::UnresolvedDependency {
                a: a.key().to_string(),
                b: b.key().to_string(),
                reason: "pair not present in dependency table and no default set".to_string(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct DependencyRow {
    model_a: String,
    outcome_a: String,
    term_a: String,
    model_b: String,
    outcome_b: String,
    term_b: String,
    dependence: String,
}
