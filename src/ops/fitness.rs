//! Fitness abstraction evaluated for every candidate layout.

use crate::catalog::{CatalogError, PanelCatalog};
use crate::core::{Metrics, PanelPlacement};
use crate::metrics::{compute_metrics, score};
use crate::options::ObjectiveWeights;
use thiserror::Error;

/// Convenience alias used by the fitness traits.
pub type FitnessResult<T> = Result<T, FitnessError>;

/// Errors produced while scoring a candidate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitnessError {
    /// A panel referenced an unknown template.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// The fitness function produced NaN or an infinite score.
    #[error("fitness produced a non-finite score ({0})")]
    NonFiniteScore(f64),
}

/// Metrics and score of one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Aggregate measurements.
    pub metrics: Metrics,
    /// Scalar score; higher is better.
    pub score: f64,
}

/// Scores a panel list.
///
/// Implementations must be pure: the optimizer may evaluate candidates on
/// several threads at once and in any order.
///
/// # Examples
/// ```
/// use roofplan::core::PanelPlacement;
/// use roofplan::ops::{Evaluation, FitnessResult, LayoutFitness};
/// use roofplan::Metrics;
///
/// struct PanelCount;
///
/// impl LayoutFitness for PanelCount {
///     fn evaluate(&self, panels: &[PanelPlacement]) -> FitnessResult<Evaluation> {
///         Ok(Evaluation {
///             metrics: Metrics::default(),
///             score: panels.len() as f64,
///         })
///     }
/// }
///
/// assert_eq!(PanelCount.evaluate(&[]).unwrap().score, 0.0);
/// ```
pub trait LayoutFitness: Send + Sync {
    /// Evaluates a candidate.
    ///
    /// # Errors
    /// Returns [`FitnessError`] when the candidate cannot be scored.
    fn evaluate(&self, panels: &[PanelPlacement]) -> FitnessResult<Evaluation>;
}

impl<T: LayoutFitness + ?Sized> LayoutFitness for &T {
    fn evaluate(&self, panels: &[PanelPlacement]) -> FitnessResult<Evaluation> {
        (**self).evaluate(panels)
    }
}

impl<T: LayoutFitness + ?Sized> LayoutFitness for Box<T> {
    fn evaluate(&self, panels: &[PanelPlacement]) -> FitnessResult<Evaluation> {
        (**self).evaluate(panels)
    }
}

/// Default fitness: metrics from the catalog blended with objective weights.
///
/// No violations are known during the search, so the compliance term is
/// counted as clean here; the ranker applies the real penalty afterwards.
#[derive(Debug, Clone)]
pub struct WeightedFitness<'a> {
    catalog: &'a PanelCatalog,
    weights: ObjectiveWeights,
    max_panel_count: usize,
}

impl<'a> WeightedFitness<'a> {
    /// Creates the fitness function.
    #[must_use]
    pub fn new(catalog: &'a PanelCatalog, weights: ObjectiveWeights, max_panel_count: usize) -> Self {
        Self {
            catalog,
            weights,
            max_panel_count,
        }
    }
}

impl LayoutFitness for WeightedFitness<'_> {
    fn evaluate(&self, panels: &[PanelPlacement]) -> FitnessResult<Evaluation> {
        let metrics = compute_metrics(panels, self.catalog, self.max_panel_count)?;
        Ok(Evaluation {
            score: score(&metrics, &[], &self.weights),
            metrics,
        })
    }
}
