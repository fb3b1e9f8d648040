//! Multiple testing correction procedures.

mod adjust;

pub use adjust::{benjamini_hochberg, benjamini_yekutieli, bonferroni};

use serde::{Deserialize, Serialize};

/// A multiple-comparison correction procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionMethod {
    /// Family-wise error rate control: multiply each p-value by the family
    /// size, cap at 1. Conservative, rank-invariant.
    Bonferroni,
    /// Step-up FDR control under independence or positive dependence.
    BenjaminiHochberg,
    /// Step-up FDR control under arbitrary dependence. Always at least as
    /// conservative as Benjamini-Hochberg.
    BenjaminiYekutieli,
}

impl CorrectionMethod {
    /// Apply this method to a family of p-values, returning adjusted
    /// p-values (q-values) in the input order.
    pub fn adjust(&self, p_values: &[f64]) -> Vec<f64> {
        match self {
            CorrectionMethod::Bonferroni => bonferroni(p_values),
            CorrectionMethod::BenjaminiHochberg => benjamini_hochberg(p_values),
            CorrectionMethod::BenjaminiYekutieli => benjamini_yekutieli(p_values),
        }
    }

    /// Short name used in output tables.
    pub fn name(&self) -> &'static str {
        match self {
            CorrectionMethod::Bonferroni => "bonferroni",
            CorrectionMethod::BenjaminiHochberg => "bh",
            CorrectionMethod::BenjaminiYekutieli => "by",
        }
    }
}

impl std::fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CorrectionMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bonferroni" => Ok(CorrectionMethod::Bonferroni),
            "bh" | "benjamini-hochberg" => Ok(CorrectionMethod::BenjaminiHochberg),
            "by" | "benjamini-yekutieli" => Ok(CorrectionMethod::BenjaminiYekutieli),
            other => Err(format!("Unknown correction method '{}'", other)),
        }
    }
}
