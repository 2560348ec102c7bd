//! Search options and objective weights.

/// Search strategy used by the planner.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SearchAlgorithm {
    /// Population-based genetic search.
    #[default]
    Genetic,
}

/// Relative importance of each objective.
///
/// Weights are meant to sum to one, but any non-negative values are accepted
/// and treated as relative; see [`ObjectiveWeights::normalized`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveWeights {
    /// Weight of estimated production.
    pub production: f64,
    /// Weight of installed cost.
    pub cost: f64,
    /// Weight of visual uniformity.
    pub aesthetics: f64,
    /// Weight of serviceability.
    pub maintenance: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            production: 0.4,
            cost: 0.3,
            aesthetics: 0.15,
            maintenance: 0.15,
        }
    }
}

impl ObjectiveWeights {
    /// Rescales the weights so they sum to one.
    ///
    /// Negative or non-finite entries count as zero. When nothing positive
    /// remains the four objectives are weighted equally.
    ///
    /// # Examples
    /// ```
    /// use roofplan::options::ObjectiveWeights;
    ///
    /// let weights = ObjectiveWeights { production: 2.0, cost: 2.0, aesthetics: 0.0, maintenance: 0.0 };
    /// let normalized = weights.normalized();
    /// assert_eq!(normalized.production, 0.5);
    /// assert_eq!(normalized.cost, 0.5);
    /// ```
    #[must_use]
    pub fn normalized(&self) -> Self {
        let clean = |value: f64| if value.is_finite() && value > 0.0 { value } else { 0.0 };
        let raw = [
            clean(self.production),
            clean(self.cost),
            clean(self.aesthetics),
            clean(self.maintenance),
        ];
        let total: f64 = raw.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Self {
                production: 0.25,
                cost: 0.25,
                aesthetics: 0.25,
                maintenance: 0.25,
            };
        }
        Self {
            production: raw[0] / total,
            cost: raw[1] / total,
            aesthetics: raw[2] / total,
            maintenance: raw[3] / total,
        }
    }
}

/// Fully resolved options for one optimization call.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizationOptions {
    /// Search strategy.
    pub algorithm: SearchAlgorithm,
    /// Objective weights.
    pub weights: ObjectiveWeights,
    /// Candidates per generation.
    pub population_size: usize,
    /// Generation budget.
    pub generations: usize,
    /// Probability that an offspring is mutated.
    pub mutation_rate: f64,
    /// Probability that two parents are recombined.
    pub crossover_rate: f64,
    /// Smallest best-score gain that counts as an improvement.
    pub convergence_threshold: f64,
    /// Hard ceiling on generations regardless of `generations`.
    pub max_iterations: usize,
    /// Score candidates in parallel.
    pub parallel: bool,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self {
            algorithm: SearchAlgorithm::Genetic,
            weights: ObjectiveWeights::default(),
            population_size: 50,
            generations: 100,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            convergence_threshold: 0.001,
            max_iterations: 1000,
            parallel: true,
        }
    }
}

impl OptimizationOptions {
    /// Effective generation limit.
    #[must_use]
    pub fn generation_limit(&self) -> usize {
        self.generations.min(self.max_iterations)
    }
}

/// Caller-supplied partial options.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[allow(missing_docs)]
pub struct OptionOverrides {
    pub algorithm: Option<SearchAlgorithm>,
    pub weights: Option<ObjectiveWeights>,
    pub population_size: Option<usize>,
    pub generations: Option<usize>,
    pub mutation_rate: Option<f64>,
    pub crossover_rate: Option<f64>,
    pub convergence_threshold: Option<f64>,
    pub max_iterations: Option<usize>,
    pub parallel: Option<bool>,
}

/// Merges `overrides` over [`OptimizationOptions::default`].
#[must_use]
pub fn resolve(overrides: &OptionOverrides) -> OptimizationOptions {
    let base = OptimizationOptions::default();
    OptimizationOptions {
        algorithm: overrides.algorithm.unwrap_or(base.algorithm),
        weights: overrides.weights.unwrap_or(base.weights),
        population_size: overrides.population_size.unwrap_or(base.population_size),
        generations: overrides.generations.unwrap_or(base.generations),
        mutation_rate: overrides.mutation_rate.unwrap_or(base.mutation_rate),
        crossover_rate: overrides.crossover_rate.unwrap_or(base.crossover_rate),
        convergence_threshold: overrides
            .convergence_threshold
            .unwrap_or(base.convergence_threshold),
        max_iterations: overrides.max_iterations.unwrap_or(base.max_iterations),
        parallel: overrides.parallel.unwrap_or(base.parallel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let weights = ObjectiveWeights::default().normalized();
        let sum = weights.production + weights.cost + weights.aesthetics + weights.maintenance;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unnormalized_weights_are_relative() {
        let weights = ObjectiveWeights {
            production: 4.0,
            cost: 3.0,
            aesthetics: 1.5,
            maintenance: 1.5,
        }
        .normalized();
        let reference = ObjectiveWeights::default().normalized();
        assert!((weights.production - reference.production).abs() < 1e-12);
        assert!((weights.maintenance - reference.maintenance).abs() < 1e-12);
    }

    #[test]
    fn degenerate_weights_fall_back_to_equal() {
        let weights = ObjectiveWeights {
            production: -1.0,
            cost: f64::NAN,
            aesthetics: 0.0,
            maintenance: 0.0,
        }
        .normalized();
        assert_eq!(weights.production, 0.25);
        assert_eq!(weights.cost, 0.25);
    }

    #[test]
    fn overrides_merge_over_defaults() {
        let options = resolve(&OptionOverrides {
            generations: Some(50),
            population_size: Some(20),
            ..OptionOverrides::default()
        });
        assert_eq!(options.generations, 50);
        assert_eq!(options.population_size, 20);
        assert_eq!(options.crossover_rate, 0.8);
        assert_eq!(options.generation_limit(), 50);
    }

    #[test]
    fn iteration_ceiling_caps_generations() {
        let options = resolve(&OptionOverrides {
            generations: Some(500),
            max_iterations: Some(40),
            ..OptionOverrides::default()
        });
        assert_eq!(options.generation_limit(), 40);
    }
}
