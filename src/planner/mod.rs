//! Correction plan construction and execution.

mod components;
mod runner;

pub use runner::{PlanConfig, Planner};
