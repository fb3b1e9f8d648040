//! fdrplan - Correction planning CLI
//!
//! Command-line interface for dependency-aware multiple-comparison
//! correction planning.

use clap::{Parser, Subcommand, ValueEnum};
use fdr_planner::correct::CorrectionMethod;
use fdr_planner::data::TestRecord;
use fdr_planner::dependency::{Dependence, DependencyTable};
use fdr_planner::error::{PlanError, Result};
use fdr_planner::planner::{PlanConfig, Planner};
use std::path::PathBuf;

/// CLI-friendly correction method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMethod {
    /// Bonferroni family-wise correction
    Bonferroni,
    /// Benjamini-Hochberg FDR correction (independence / positive dependence)
    Bh,
    /// Benjamini-Yekutieli FDR correction (arbitrary dependence)
    By,
}

impl From<CliMethod> for CorrectionMethod {
    fn from(method: CliMethod) -> Self {
        match method {
            CliMethod::Bonferroni => CorrectionMethod::Bonferroni,
            CliMethod::Bh => CorrectionMethod::BenjaminiHochberg,
            CliMethod::By => CorrectionMethod::BenjaminiYekutieli,
        }
    }
}

/// CLI-friendly dependence judgment enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDependence {
    /// Tests are independent
    Independent,
    /// Dependent with known positive structure
    Positive,
    /// Dependent with general or unknown structure
    General,
}

impl From<CliDependence> for Dependence {
    fn from(dependence: CliDependence) -> Self {
        match dependence {
            CliDependence::Independent => Dependence::Independent,
            CliDependence::Positive => Dependence::Positive,
            CliDependence::General => Dependence::General,
        }
    }
}

/// Dependency-aware multiple-comparison correction planner
#[derive(Parser)]
#[command(name = "fdrplan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan corrections: group tests by dependency, pick a method per group
    Plan {
        /// Path to test record TSV (model, outcome, term, p_value)
        #[arg(short, long)]
        records: PathBuf,

        /// Path to dependency judgment TSV
        #[arg(short, long)]
        deps: Option<PathBuf>,

        /// Judgment assumed for pairs not listed in the dependency table
        #[arg(long)]
        assume: Option<CliDependence>,

        /// Path to planner configuration YAML (nesting, gate policy)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the inferred method for every multi-member group
        #[arg(short, long)]
        method: Option<CliMethod>,

        /// Output path for the q-value TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Adjust all tests as one family with an explicit method (no grouping)
    Adjust {
        /// Path to test record TSV (model, outcome, term, p_value)
        #[arg(short, long)]
        records: PathBuf,

        /// Correction method for the single family
        #[arg(short, long)]
        method: CliMethod,

        /// Output path for the q-value TSV
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            records,
            deps,
            assume,
            config,
            method,
            output,
        } => {
            let records = TestRecord::from_tsv(&records)?;

            let mut table = match deps {
                Some(path) => DependencyTable::from_tsv(path)?,
                None => DependencyTable::new(),
            };
            match assume {
                Some(judgment) => table = table.with_default(judgment.into()),
                None if table.is_empty() => {
                    return Err(PlanError::InvalidParameter(
                        "No dependency table given; pass --deps or --assume".to_string(),
                    ));
                }
                None => {}
            }

            let mut planner = match config {
                Some(path) => {
                    let yaml = std::fs::read_to_string(path)?;
                    Planner::from_config(&PlanConfig::from_yaml(&yaml)?)
                }
                None => Planner::new(),
            };
            if let Some(method) = method {
                planner = planner.method_override(method.into());
            }

            let result = planner.plan(&records, &table)?;
            result.to_tsv(&output)?;

            println!("{}", result.summary());
            if !result.gated_out.is_empty() {
                println!("Gated out by nesting:");
                for key in &result.gated_out {
                    println!("  {}", key);
                }
            }
            println!("Results written to {}", output.display());
        }

        Commands::Adjust {
            records,
            method,
            output,
        } => {
            let records = TestRecord::from_tsv(&records)?;

            // One family: every pair is treated as dependent so grouping
            // collapses to a single component, and the explicit method
            // applies to it.
            let one_family =
                |_: &TestRecord, _: &TestRecord| -> Option<Dependence> { Some(Dependence::General) };
            let result = Planner::new()
                .method_override(method.into())
                .plan(&records, &one_family)?;
            result.to_tsv(&output)?;

            println!("{}", result.summary());
            println!("Results written to {}", output.display());
        }
    }

    Ok(())
}
