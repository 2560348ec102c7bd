//! Genetic operators and the fitness abstraction.
//!
//! Each sub-module covers one step of the search so implementations stay
//! small and can be swapped through the optimizer builder.

use crate::catalog::PanelTemplate;
use crate::constraints::PlacementConstraints;
use crate::geometry::Surface;
use thiserror::Error;

pub mod crossover;
pub mod fitness;
pub mod mutation;
pub mod selection;

pub use crossover::{CrossoverOperator, SinglePointCrossover};
pub use fitness::{Evaluation, FitnessError, FitnessResult, LayoutFitness, WeightedFitness};
pub use mutation::{JitterMutation, MutationOperator};
pub use selection::{SelectionOperator, TournamentSelection};

/// Everything an operator needs to build valid placements.
#[derive(Debug, Clone, Copy)]
pub struct PlacementContext<'a> {
    /// Surface panels are placed on.
    pub surface: &'a Surface,
    /// Template every panel uses.
    pub template: &'a PanelTemplate,
    /// Resolved constraints.
    pub constraints: &'a PlacementConstraints,
}

impl PlacementContext<'_> {
    /// Tilt range allowed by both the template and the constraints.
    #[must_use]
    pub fn tilt_range(&self) -> (f64, f64) {
        let upper = self
            .template
            .mounting
            .max_tilt
            .min(self.constraints.physical.max_tilt);
        let lower = self.template.mounting.min_tilt.min(upper);
        (lower, upper)
    }
}

/// Errors raised when an operator is configured with invalid parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperatorError {
    /// Tournament size must be at least one.
    #[error("tournament size must be at least one (received {0})")]
    InvalidTournamentSize(usize),
    /// A probability lies outside `[0, 1]`.
    #[error("{operator} probability must be within [0, 1] (received {value})")]
    InvalidProbability {
        /// Operator reporting the error.
        operator: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A jitter amplitude is negative or not finite.
    #[error("{operator} {parameter} must be finite and non-negative (received {value})")]
    InvalidParameter {
        /// Operator reporting the error.
        operator: &'static str,
        /// Parameter name.
        parameter: &'static str,
        /// Offending value.
        value: f64,
    },
}
