//! Data structures for correction planning.

mod record;
mod result;

pub use record::{TestKey, TestRecord};
pub use result::{GroupSummary, PlanResult, PlanSummary, QValue};
