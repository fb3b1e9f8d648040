//! Hypothesis-test records produced by an external model-fitting step.

use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Identity of a single hypothesis test: which model, which outcome
/// variable, which term or contrast.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestKey {
    /// Model identifier (e.g. "m1" or "y ~ A*B").
    pub model: String,
    /// Outcome variable name.
    pub outcome: String,
    /// Term or contrast name within the model.
    pub term: String,
}

impl fmt::Display for TestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.model, self.outcome, self.term)
    }
}

/// One hypothesis test as emitted by the upstream modeling step.
///
/// Records are immutable inputs: the planner never rewrites a raw p-value,
/// it only attaches an adjusted one in the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Model identifier.
    pub model: String,
    /// Outcome variable name.
    pub outcome: String,
    /// Term or contrast name.
    pub term: String,
    /// Raw p-value in [0, 1].
    pub p_value: f64,
}

impl TestRecord {
    /// Create a new test record.
    pub fn new(model: &str, outcome: &str, term: &str, p_value: f64) -> Self {
        Self {
            model: model.to_string(),
            outcome: outcome.to_string(),
            term: term.to_string(),
            p_value,
        }
    }

    /// Identity key of this record.
    pub fn key(&self) -> TestKey {
        TestKey {
            model: self.model.clone(),
            outcome: self.outcome.clone(),
            term: self.term.clone(),
        }
    }

    /// Borrowed identity triple, for cheap map lookups.
    pub(crate) fn key_ref(&self) -> (&str, &str, &str) {
        (&self.model, &self.outcome, &self.term)
    }

    /// Load test records from a TSV file.
    ///
    /// Expected columns: `model`, `outcome`, `term`, `p_value`, in a
    /// header row. Extra columns are ignored.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Vec<TestRecord>> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        for required in ["model", "outcome", "term", "p_value"] {
            if !headers.iter().any(|h| h == required) {
                return Err(PlanError::MissingColumn(required.to_string()));
            }
        }

        let mut records = Vec::new();
        for row in reader.deserialize() {
            let record: TestRecord = row?;
            records.push(record);
        }

        if records.is_empty() {
            return Err(PlanError::EmptyData(
                "No test records in input file".to_string(),
            ));
        }

        Ok(records)
    }
}
