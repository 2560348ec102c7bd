//! Genetic search over panel layouts.
//!
//! The [`GeneticOptimizer`] builder wires the operators from [`crate::ops`]
//! together. A run moves through initialization, evaluation and a
//! convergence check, then loops evolve, evaluate and check until a
//! [`StopCondition`] fires or the caller cancels.
//!
//! Only the sequential steps draw from the random number generator. Fitness
//! evaluation may run on the rayon pool and results are collected in
//! population order, so a seeded run gives the same report whether or not
//! evaluation is parallel.

use crate::catalog::PanelTemplate;
use crate::constraints::PlacementConstraints;
use crate::core::experiment::{RunReport, RunStats, TerminationReason};
use crate::core::{
    best_score, mean_score, sort_descending, IdGenerator, IdKind, PanelPlacement,
    PlacementSolution, Position, SequentialIds,
};
use crate::geometry::{largest_surface, BoundingBox, Surface, SurfaceError};
use crate::metrics::place_panel;
use crate::ops::mutation::random_orientation;
use crate::ops::{
    CrossoverOperator, Evaluation, FitnessError, FitnessResult, JitterMutation, LayoutFitness,
    MutationOperator, PlacementContext, SelectionOperator, SinglePointCrossover,
    TournamentSelection,
};
use crate::options::OptimizationOptions;
use rand::distributions::Uniform;
use rand::Rng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Best score above which a run stops early.
pub const TARGET_SCORE: f64 = 95.0;
/// Generations without improvement after which a run stops.
pub const STAGNATION_LIMIT: usize = 20;
/// Most panels placed in one initial candidate.
pub const MAX_INITIAL_PANELS: usize = 30;

/// Errors produced by the optimizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizerError {
    /// The configured population size was zero.
    #[error("population size must be greater than zero (received {0})")]
    InvalidPopulationSize(usize),
    /// A rate lies outside `[0, 1]`.
    #[error("{parameter} must be within [0, 1] (received {value})")]
    InvalidProbability {
        /// Option name.
        parameter: &'static str,
        /// Offending value.
        value: f64,
    },
    /// The convergence threshold is negative or not finite.
    #[error("convergence threshold must be finite and non-negative (received {0})")]
    InvalidConvergenceThreshold(f64),
    /// The panel ceiling was zero.
    #[error("max panel count must be greater than zero")]
    InvalidMaxPanelCount,
    /// Selection operator failed to return parents.
    #[error("selection operator failed to provide parents")]
    SelectionFailed,
    /// The roof surfaces cannot host a layout.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    /// A candidate could not be scored.
    #[error(transparent)]
    Fitness(#[from] FitnessError),
}

/// Shared flag that asks a running search to stop.
///
/// Cloning is cheap; every clone observes the same flag.
///
/// # Examples
/// ```
/// use roofplan::optimizer::CancellationToken;
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// State of a run as seen by a [`StopCondition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Evaluated generations, the initial one included.
    pub generation: usize,
    /// Best score seen so far.
    pub best_score: f64,
    /// Consecutive generations without a meaningful improvement.
    pub stale_generations: usize,
}

/// Combines primitive stop conditions.
#[derive(Debug, Clone, PartialEq)]
pub enum StopCondition {
    /// Stop when the generation counter reaches this limit.
    MaxGenerations {
        /// Maximum number of evaluated generations.
        limit: usize,
    },
    /// Stop when the best score rises above the threshold.
    TargetScoreAbove {
        /// Score that ends the run when exceeded.
        threshold: f64,
    },
    /// Stop after this many generations without improvement.
    Stagnation {
        /// Allowed stale generations.
        generations: usize,
    },
    /// Triggers when either child condition does; the left one reports first.
    Or(Box<StopCondition>, Box<StopCondition>),
}

impl StopCondition {
    /// Limits the number of evaluated generations.
    #[must_use]
    pub fn max_generations(limit: usize) -> Self {
        Self::MaxGenerations { limit }
    }

    /// Stops once the best score exceeds `threshold`.
    #[must_use]
    pub fn target_score_above(threshold: f64) -> Self {
        Self::TargetScoreAbove { threshold }
    }

    /// Stops after `generations` stale generations.
    #[must_use]
    pub fn stagnation(generations: usize) -> Self {
        Self::Stagnation { generations }
    }

    /// Combines two stop conditions using logical OR semantics.
    #[must_use]
    pub fn or(self, other: StopCondition) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Target score, stagnation window and generation limit, in that order.
    #[must_use]
    pub fn standard(limit: usize) -> Self {
        Self::target_score_above(TARGET_SCORE)
            .or(Self::stagnation(STAGNATION_LIMIT))
            .or(Self::max_generations(limit))
    }

    /// Reason the run should stop, if any.
    #[must_use]
    pub fn triggered(&self, progress: &Progress) -> Option<TerminationReason> {
        match self {
            Self::MaxGenerations { limit } => (progress.generation >= *limit)
                .then_some(TerminationReason::GenerationLimit),
            Self::TargetScoreAbove { threshold } => (progress.best_score > *threshold)
                .then_some(TerminationReason::TargetReached),
            Self::Stagnation { generations } => (progress.stale_generations >= *generations)
                .then_some(TerminationReason::Stagnation),
            Self::Or(left, right) => left
                .triggered(progress)
                .or_else(|| right.triggered(progress)),
        }
    }
}

/// Tracks the best score and how long it has gone without improving.
#[derive(Debug, Clone)]
struct ConvergenceTracker {
    threshold: f64,
    best: Option<f64>,
    stale: usize,
}

impl ConvergenceTracker {
    fn new(threshold: f64) -> Self {
        Self {
            threshold,
            best: None,
            stale: 0,
        }
    }

    fn observe(&mut self, score: f64) {
        match self.best {
            Some(best) if score <= best + self.threshold => {
                self.stale += 1;
                self.best = Some(best.max(score));
            }
            _ => {
                self.best = Some(score);
                self.stale = 0;
            }
        }
    }

    fn progress(&self, generation: usize) -> Progress {
        Progress {
            generation,
            best_score: self.best.unwrap_or(0.0),
            stale_generations: self.stale,
        }
    }
}

/// Number of candidates copied unchanged into the next generation.
#[must_use]
pub fn elite_count(population_size: usize) -> usize {
    population_size.div_ceil(10).max(1).min(population_size)
}

/// Builder returned by [`GeneticOptimizer::builder`].
pub struct GeneticOptimizerBuilder<'a, F> {
    fitness: F,
    surfaces: &'a [Surface],
    template: &'a PanelTemplate,
    constraints: PlacementConstraints,
    options: OptimizationOptions,
    max_panel_count: usize,
    selection: Option<Box<dyn SelectionOperator + 'a>>,
    crossover: Option<Box<dyn CrossoverOperator + 'a>>,
    mutation: Option<Box<dyn MutationOperator + 'a>>,
    ids: Option<Box<dyn IdGenerator + 'a>>,
    stop_condition: Option<StopCondition>,
    cancellation: CancellationToken,
}

impl<'a, F> GeneticOptimizerBuilder<'a, F>
where
    F: LayoutFitness,
{
    /// Sets the resolved placement constraints.
    #[must_use]
    pub fn constraints(mut self, constraints: PlacementConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets the resolved search options.
    #[must_use]
    pub fn options(mut self, options: OptimizationOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the feasible panel count reported by the irradiance model.
    #[must_use]
    pub fn max_panel_count(mut self, count: usize) -> Self {
        self.max_panel_count = count;
        self
    }

    /// Replaces the selection operator.
    #[must_use]
    pub fn selection(mut self, operator: impl SelectionOperator + 'a) -> Self {
        self.selection = Some(Box::new(operator));
        self
    }

    /// Replaces the crossover operator.
    #[must_use]
    pub fn crossover(mut self, operator: impl CrossoverOperator + 'a) -> Self {
        self.crossover = Some(Box::new(operator));
        self
    }

    /// Replaces the mutation operator.
    #[must_use]
    pub fn mutation(mut self, operator: impl MutationOperator + 'a) -> Self {
        self.mutation = Some(Box::new(operator));
        self
    }

    /// Uses `ids` for every solution and panel identity.
    #[must_use]
    pub fn ids(mut self, ids: impl IdGenerator + 'a) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    /// Replaces the stop condition derived from the options.
    #[must_use]
    pub fn stop_condition(mut self, condition: StopCondition) -> Self {
        self.stop_condition = Some(condition);
        self
    }

    /// Observes `token` between generations.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Finalizes the builder into a [`GeneticOptimizer`].
    ///
    /// # Errors
    /// Returns [`OptimizerError`] when the surfaces are unusable or an option
    /// is out of range.
    pub fn build(self) -> Result<GeneticOptimizer<'a, F>, OptimizerError> {
        let options = self.options;
        if options.population_size == 0 {
            return Err(OptimizerError::InvalidPopulationSize(0));
        }
        for (parameter, value) in [
            ("mutation rate", options.mutation_rate),
            ("crossover rate", options.crossover_rate),
        ] {
            if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
                return Err(OptimizerError::InvalidProbability { parameter, value });
            }
        }
        let threshold = options.convergence_threshold;
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(OptimizerError::InvalidConvergenceThreshold(threshold));
        }
        if self.max_panel_count == 0 {
            return Err(OptimizerError::InvalidMaxPanelCount);
        }
        let surface = largest_surface(self.surfaces)?;
        let bounds = surface.bounds().ok_or_else(|| SurfaceError::TooFewVertices {
            surface: surface.id.clone(),
            vertices: surface.polygon.len(),
        })?;
        let stop_condition = self
            .stop_condition
            .unwrap_or_else(|| StopCondition::standard(options.generation_limit()));
        Ok(GeneticOptimizer {
            fitness: self.fitness,
            surface,
            bounds,
            template: self.template,
            constraints: self.constraints,
            options,
            max_panel_count: self.max_panel_count,
            selection: self
                .selection
                .unwrap_or_else(|| Box::new(TournamentSelection::default())),
            crossover: self
                .crossover
                .unwrap_or_else(|| Box::new(SinglePointCrossover)),
            mutation: self
                .mutation
                .unwrap_or_else(|| Box::new(JitterMutation::default())),
            ids: self.ids,
            stop_condition,
            cancellation: self.cancellation,
        })
    }
}

/// Genetic algorithm over panel layouts.
///
/// Panels are placed on the largest supplied surface. The optimizer keeps no
/// state between runs; without an injected [`IdGenerator`] each run numbers
/// its ids from one again.
///
/// # Examples
/// ```
/// use roofplan::catalog::PanelCatalog;
/// use roofplan::geometry::{Point, Surface};
/// use roofplan::optimizer::GeneticOptimizer;
/// use roofplan::ops::WeightedFitness;
/// use roofplan::options::OptimizationOptions;
/// use rand::SeedableRng;
///
/// let catalog = PanelCatalog::with_defaults();
/// let surfaces = vec![Surface::from_polygon(
///     "south",
///     vec![
///         Point::new(0.0, 0.0),
///         Point::new(0.0, 8.0),
///         Point::new(12.0, 8.0),
///         Point::new(12.0, 0.0),
///     ],
///     180.0,
///     25.0,
/// )];
/// let template = catalog.get("std-400").unwrap();
/// let options = OptimizationOptions {
///     population_size: 10,
///     generations: 5,
///     ..OptimizationOptions::default()
/// };
/// let fitness = WeightedFitness::new(&catalog, options.weights, 20);
/// let optimizer = GeneticOptimizer::builder(fitness, &surfaces, template)
///     .options(options)
///     .max_panel_count(20)
///     .build()
///     .unwrap();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let report = optimizer.run(&mut rng).unwrap();
/// assert_eq!(report.population.len(), 10);
/// assert!(report.generations <= 5);
/// ```
pub struct GeneticOptimizer<'a, F> {
    fitness: F,
    surface: &'a Surface,
    bounds: BoundingBox,
    template: &'a PanelTemplate,
    constraints: PlacementConstraints,
    options: OptimizationOptions,
    max_panel_count: usize,
    selection: Box<dyn SelectionOperator + 'a>,
    crossover: Box<dyn CrossoverOperator + 'a>,
    mutation: Box<dyn MutationOperator + 'a>,
    ids: Option<Box<dyn IdGenerator + 'a>>,
    stop_condition: StopCondition,
    cancellation: CancellationToken,
}

impl<'a, F> GeneticOptimizer<'a, F>
where
    F: LayoutFitness,
{
    /// Creates a builder placing `template` panels on `surfaces`.
    #[must_use]
    pub fn builder(
        fitness: F,
        surfaces: &'a [Surface],
        template: &'a PanelTemplate,
    ) -> GeneticOptimizerBuilder<'a, F> {
        GeneticOptimizerBuilder {
            fitness,
            surfaces,
            template,
            constraints: PlacementConstraints::default(),
            options: OptimizationOptions::default(),
            max_panel_count: MAX_INITIAL_PANELS,
            selection: None,
            crossover: None,
            mutation: None,
            ids: None,
            stop_condition: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Surface the layouts are placed on.
    #[must_use]
    pub fn surface(&self) -> &Surface {
        self.surface
    }

    /// Runs the search.
    ///
    /// Cancellation is not an error: the report carries the population
    /// reached so far and [`TerminationReason::Cancelled`].
    ///
    /// # Errors
    /// Returns [`OptimizerError`] when a candidate cannot be scored or the
    /// selection operator fails.
    pub fn run<R: Rng>(&self, rng: &mut R) -> Result<RunReport, OptimizerError> {
        info!(
            surface = %self.surface.id,
            template = %self.template.id,
            population = self.options.population_size,
            generation_limit = self.options.generation_limit(),
            "starting layout search"
        );
        let fallback;
        let ids: &dyn IdGenerator = match &self.ids {
            Some(ids) => ids.as_ref(),
            None => {
                fallback = SequentialIds::new();
                &fallback
            }
        };
        let layouts: Vec<Vec<PanelPlacement>> = (0..self.options.population_size)
            .map(|_| self.random_layout(ids, &mut *rng))
            .collect();
        let mut population = self.evaluate(layouts, ids)?;
        let mut stats = RunStats::new();
        let mut tracker = ConvergenceTracker::new(self.options.convergence_threshold);
        let mut generation = 1_usize;
        self.observe(&population, generation, &mut stats, &mut tracker);
        let termination = loop {
            if self.cancellation.is_cancelled() {
                warn!(generation, "layout search cancelled");
                break TerminationReason::Cancelled;
            }
            if let Some(reason) = self.stop_condition.triggered(&tracker.progress(generation)) {
                break reason;
            }
            population = self.evolve(&population, ids, &mut *rng)?;
            generation += 1;
            self.observe(&population, generation, &mut stats, &mut tracker);
        };
        info!(
            generations = generation,
            best_score = best_score(&population).unwrap_or(0.0),
            ?termination,
            "layout search finished"
        );
        Ok(RunReport {
            population,
            generations: generation,
            termination,
            stats,
        })
    }

    fn context(&self) -> PlacementContext<'_> {
        PlacementContext {
            surface: self.surface,
            template: self.template,
            constraints: &self.constraints,
        }
    }

    fn random_layout<R: Rng>(&self, ids: &dyn IdGenerator, rng: &mut R) -> Vec<PanelPlacement> {
        let context = self.context();
        let cap = self.max_panel_count.clamp(1, MAX_INITIAL_PANELS);
        let count = rng.gen_range(1..=cap);
        let xs = Uniform::new_inclusive(self.bounds.min_x, self.bounds.max_x);
        let ys = Uniform::new_inclusive(self.bounds.min_y, self.bounds.max_y);
        (0..count)
            .map(|_| {
                let position = Position::planar(rng.sample(&xs), rng.sample(&ys));
                let orientation = random_orientation(&context, &mut *rng);
                place_panel(
                    ids.next_id(IdKind::Panel),
                    position,
                    orientation,
                    self.surface,
                    self.template,
                    &self.constraints,
                )
            })
            .collect()
    }

    fn evaluate(
        &self,
        layouts: Vec<Vec<PanelPlacement>>,
        ids: &dyn IdGenerator,
    ) -> Result<Vec<PlacementSolution>, OptimizerError> {
        let fitness = &self.fitness;
        let evaluations: Vec<FitnessResult<Evaluation>> = if self.options.parallel {
            layouts
                .par_iter()
                .map(|panels| fitness.evaluate(panels))
                .collect()
        } else {
            layouts
                .iter()
                .map(|panels| fitness.evaluate(panels))
                .collect()
        };
        let mut population = Vec::with_capacity(layouts.len());
        for (panels, evaluation) in layouts.into_iter().zip(evaluations) {
            let evaluation = evaluation?;
            if !evaluation.score.is_finite() {
                return Err(FitnessError::NonFiniteScore(evaluation.score).into());
            }
            population.push(PlacementSolution::new(
                ids.next_id(IdKind::Solution),
                panels,
                evaluation.metrics,
                evaluation.score,
            ));
        }
        sort_descending(&mut population);
        Ok(population)
    }

    fn evolve<R: Rng>(
        &self,
        population: &[PlacementSolution],
        ids: &dyn IdGenerator,
        rng: &mut R,
    ) -> Result<Vec<PlacementSolution>, OptimizerError> {
        let context = self.context();
        let size = self.options.population_size;
        let elites = elite_count(population.len());
        let scores: Vec<f64> = population.iter().map(PlacementSolution::score).collect();
        let mut offspring = Vec::with_capacity(size.saturating_sub(elites));
        while elites + offspring.len() < size {
            let (first, second) = self
                .selection
                .select_pair(&scores, &mut *rng)
                .ok_or(OptimizerError::SelectionFailed)?;
            let parent_a = population[first].panels();
            let parent_b = population[second].panels();
            let mut child = if rng.gen_bool(self.options.crossover_rate) {
                self.crossover.crossover(parent_a, parent_b, &mut *rng)
            } else {
                parent_a.to_vec()
            };
            if rng.gen_bool(self.options.mutation_rate) {
                child = self.mutation.mutate(&child, &context, &mut *rng);
            }
            offspring.push(reissue_ids(child, ids));
        }
        let mut next = population[..elites].to_vec();
        next.extend(self.evaluate(offspring, ids)?);
        sort_descending(&mut next);
        Ok(next)
    }

    fn observe(
        &self,
        population: &[PlacementSolution],
        generation: usize,
        stats: &mut RunStats,
        tracker: &mut ConvergenceTracker,
    ) {
        let best = best_score(population).unwrap_or(0.0);
        tracker.observe(best);
        stats.record(population);
        debug!(
            generation,
            best_score = best,
            mean_score = mean_score(population),
            stale = tracker.stale,
            "generation evaluated"
        );
    }
}

fn reissue_ids(panels: Vec<PanelPlacement>, ids: &dyn IdGenerator) -> Vec<PanelPlacement> {
    panels
        .into_iter()
        .map(|mut panel| {
            panel.id = ids.next_id(IdKind::Panel);
            panel
        })
        .collect()
}
