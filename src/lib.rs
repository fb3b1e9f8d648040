//! Multiple-comparison correction planner.
//!
//! Given hypothesis-test records produced by an external model-fitting step,
//! an analyst-supplied dependency classification between tests, and a
//! model-nesting structure, this library partitions the tests into
//! correction groups and applies the appropriate correction method to each
//! group, returning adjusted p-values (q-values).
//!
//! # Overview
//!
//! The library is organized into small composable modules:
//!
//! - **data**: Core data structures (TestRecord, QValue, PlanResult)
//! - **dependency**: Analyst-supplied dependency judgments (table or callback)
//! - **nesting**: Model nesting structure and staged-planning gate policy
//! - **correct**: Correction procedures (Bonferroni, BH, BY)
//! - **planner**: Grouping, method selection, and plan execution
//!
//! # Example
//!
//! ```
//! use fdr_planner::prelude::*;
//!
//! let records = vec![
//!     TestRecord::new("m1", "y", "A", 0.01),
//!     TestRecord::new("m1", "y", "B", 0.04),
//!     TestRecord::new("m2", "y", "C", 0.20),
//! ];
//!
//! // Analyst judgment: A and B share an outcome structure, C stands alone.
//! let deps = |a: &TestRecord, b: &TestRecord| {
//!     if a.model == "m1" && b.model == "m1" {
//!         Some(Dependence::Positive)
//!     } else {
//!         Some(Dependence::Independent)
//!     }
//! };
//!
//! let result = Planner::new().plan(&records, &deps).unwrap();
//! assert_eq!(result.groups.len(), 2);
//! ```
//!
//! Planning is pure and synchronous: no I/O, no shared state, the same
//! inputs always produce the same plan.

pub mod correct;
pub mod data;
pub mod dependency;
pub mod error;
pub mod nesting;
pub mod planner;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::correct::{
        benjamini_hochberg, benjamini_yekutieli, bonferroni, CorrectionMethod,
    };
    pub use crate::data::{GroupSummary, PlanResult, PlanSummary, QValue, TestKey, TestRecord};
    pub use crate::dependency::{Dependence, DependencySource, DependencyTable};
    pub use crate::error::{PlanError, Result};
    pub use crate::nesting::{GatePolicy, GateStatistic, ModelNesting};
    pub use crate::planner::{PlanConfig, Planner};
}
