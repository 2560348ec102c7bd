//! Run statistics recorded by the optimizer.
//!
//! These types capture the per-generation history of a search and the reason
//! it stopped. They carry no references into the population.

use super::PlacementSolution;

/// Why a search stopped.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The best score exceeded the target.
    TargetReached,
    /// The best score stopped improving.
    Stagnation,
    /// The generation budget ran out.
    GenerationLimit,
    /// The caller cancelled the run.
    Cancelled,
}

/// Time-series metrics captured during an optimization run.
///
/// # Examples
/// ```
/// use roofplan::RunStats;
/// let stats = RunStats::new();
/// assert_eq!(stats.generations(), 0);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Best score in each evaluated generation.
    pub best_score: Vec<f64>,
    /// Mean score in each evaluated generation.
    pub mean_score: Vec<f64>,
    /// Spread of panel centers across the population per generation.
    pub population_diversity: Vec<f64>,
}

impl RunStats {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of evaluated generations.
    #[must_use]
    pub fn generations(&self) -> usize {
        self.best_score.len()
    }

    pub(crate) fn record(&mut self, population: &[PlacementSolution]) {
        self.best_score
            .push(super::best_score(population).unwrap_or(0.0));
        self.mean_score.push(super::mean_score(population));
        self.population_diversity
            .push(population_diversity(population));
    }
}

/// Final population and history of one optimizer run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Final population, best first.
    pub population: Vec<PlacementSolution>,
    /// Number of evaluated generations, the initial one included.
    pub generations: usize,
    /// Why the run stopped.
    pub termination: TerminationReason,
    /// Per-generation history.
    pub stats: RunStats,
}

impl RunReport {
    /// Best solution of the final population.
    #[must_use]
    pub fn best(&self) -> Option<&PlacementSolution> {
        self.population.first()
    }
}

/// Standard deviation of the mean panel center of each candidate.
pub(crate) fn population_diversity(population: &[PlacementSolution]) -> f64 {
    let centroids: Vec<(f64, f64)> = population
        .iter()
        .filter(|solution| !solution.panels().is_empty())
        .map(|solution| {
            #[allow(clippy::cast_precision_loss)]
            let count = solution.panels().len() as f64;
            let (sx, sy) = solution
                .panels()
                .iter()
                .fold((0.0, 0.0), |(sx, sy), panel| {
                    (sx + panel.position.x, sy + panel.position.y)
                });
            (sx / count, sy / count)
        })
        .collect();
    if centroids.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let size = centroids.len() as f64;
    let (mx, my) = centroids
        .iter()
        .fold((0.0, 0.0), |(mx, my), (x, y)| (mx + x / size, my + y / size));
    let variance: f64 = centroids
        .iter()
        .map(|(x, y)| ((x - mx).powi(2) + (y - my).powi(2)) / size)
        .sum();
    variance.sqrt()
}
