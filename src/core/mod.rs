//! Candidate encoding shared by the optimizer, the validator and the ranker.
//!
//! A [`PlacementSolution`] is an immutable value: it is built already scored,
//! read through accessors, and replaced rather than edited. Offspring are new
//! values, so parents and children never alias each other's panel lists.

use crate::geometry::Point;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

pub mod experiment;

/// Position of a panel center in plan coordinates.
///
/// # Examples
/// ```
/// use roofplan::Position;
/// let position = Position::planar(1.0, 2.0);
/// assert_eq!(position.z, None);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// x coordinate in meters.
    pub x: f64,
    /// y coordinate in meters.
    pub y: f64,
    /// Optional height above the eave in meters.
    pub z: Option<f64>,
}

impl Position {
    /// Creates a 2-D position.
    #[must_use]
    pub const fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Projects onto the plan.
    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Facing of a panel.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    /// Compass direction in degrees.
    pub azimuth: f64,
    /// Tilt from horizontal in degrees.
    pub tilt: f64,
}

/// One placed panel inside a candidate layout.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PanelPlacement {
    /// Identity, unique within a run.
    pub id: String,
    /// Panel center.
    pub position: Position,
    /// Facing.
    pub orientation: Orientation,
    /// Catalog template used.
    pub template_id: String,
    /// Surface the panel sits on.
    pub surface_id: String,
    /// Estimated fraction of output lost to shading, in `[0, 1]`.
    pub shading_factor: f64,
    /// Whether the panel can be reached for service.
    pub maintenance_access: bool,
    /// Whether the center lies inside the surface outline.
    pub within_surface: bool,
}

/// Aggregate measurements of a layout.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    /// Number of placed panels.
    pub panel_count: usize,
    /// Sum of rated power in watts.
    pub total_wattage: f64,
    /// Estimated annual energy in kWh.
    pub annual_yield: f64,
    /// Share of the feasible panel count used, 0-100.
    pub coverage: f64,
    /// Visual uniformity, 0-100.
    pub aesthetic_score: f64,
    /// Serviceability, 0-100.
    pub maintenance_score: f64,
    /// Regulatory and structural standing, 0-100.
    pub compliance_score: f64,
    /// Estimated installed cost.
    pub cost_estimate: f64,
    /// Mean per-panel shading factor, in `[0, 1]`.
    pub shading_loss: f64,
}

/// Area a violation concerns.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationCategory {
    /// Fire code and setbacks.
    Regulatory,
    /// Roof load.
    Structural,
    /// Appearance.
    Aesthetic,
    /// Service access.
    Maintenance,
}

/// How serious a violation is.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Must be fixed before installation.
    Error,
    /// Should be reviewed.
    Warning,
    /// Advisory only.
    Info,
}

/// A constraint finding attached to a layout.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Area concerned.
    pub category: ViolationCategory,
    /// Seriousness.
    pub severity: Severity,
    /// Human readable description.
    pub description: String,
    /// Panels involved.
    pub affected_panels: Vec<String>,
    /// Suggested remediation.
    pub suggestion: String,
}

/// A scored candidate layout.
///
/// # Examples
/// ```
/// use roofplan::{Metrics, PlacementSolution};
/// let solution = PlacementSolution::new("solution-1", Vec::new(), Metrics::default(), 140.0);
/// assert_eq!(solution.score(), 100.0);
/// assert!(solution.violations().is_empty());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementSolution {
    id: String,
    score: f64,
    panels: Vec<PanelPlacement>,
    metrics: Metrics,
    violations: Vec<Violation>,
}

impl PlacementSolution {
    /// Creates a scored solution without violations.
    ///
    /// The score is clamped to `[0, 100]`; a NaN score becomes zero.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        panels: Vec<PanelPlacement>,
        metrics: Metrics,
        score: f64,
    ) -> Self {
        Self {
            id: id.into(),
            score: clamp_score(score),
            panels,
            metrics,
            violations: Vec::new(),
        }
    }

    /// Returns a copy carrying validation results and a recomputed score.
    #[must_use]
    pub fn with_validation(&self, metrics: Metrics, violations: Vec<Violation>, score: f64) -> Self {
        Self {
            id: self.id.clone(),
            score: clamp_score(score),
            panels: self.panels.clone(),
            metrics,
            violations,
        }
    }

    /// Identity.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Overall score in `[0, 100]`.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Placed panels in order.
    #[must_use]
    pub fn panels(&self) -> &[PanelPlacement] {
        &self.panels
    }

    /// Aggregate metrics.
    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Findings from the compliance validator.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Orders two solutions best first.
    #[must_use]
    pub fn rank_order(lhs: &Self, rhs: &Self) -> Ordering {
        rhs.score.total_cmp(&lhs.score)
    }
}

pub(crate) fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Best score in a population, or `None` when it is empty.
#[must_use]
pub fn best_score(population: &[PlacementSolution]) -> Option<f64> {
    population
        .iter()
        .map(PlacementSolution::score)
        .max_by(f64::total_cmp)
}

/// Mean score of a population; zero when empty.
#[must_use]
pub fn mean_score(population: &[PlacementSolution]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let sum: f64 = population.iter().map(PlacementSolution::score).sum();
    #[allow(clippy::cast_precision_loss)]
    {
        sum / population.len() as f64
    }
}

/// Sorts a population best first. Equal scores keep their relative order.
pub fn sort_descending(population: &mut [PlacementSolution]) {
    population.sort_by(PlacementSolution::rank_order);
}

/// Kind of identity requested from an [`IdGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// A whole candidate layout.
    Solution,
    /// A single placed panel.
    Panel,
}

impl IdKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Solution => "solution",
            Self::Panel => "panel",
        }
    }
}

/// Source of identities for solutions and panels.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identity.
    fn next_id(&self, kind: IdKind) -> String;
}

impl<T: IdGenerator + ?Sized> IdGenerator for &T {
    fn next_id(&self, kind: IdKind) -> String {
        (**self).next_id(kind)
    }
}

/// Monotonic counter producing `solution-1`, `panel-2`, ...
///
/// A single counter is shared by all kinds, so every identity issued by one
/// generator is unique.
///
/// # Examples
/// ```
/// use roofplan::{IdGenerator, IdKind, SequentialIds};
/// let ids = SequentialIds::new();
/// assert_eq!(ids.next_id(IdKind::Solution), "solution-1");
/// assert_eq!(ids.next_id(IdKind::Panel), "panel-2");
/// ```
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    /// Creates a counter starting at one.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, kind: IdKind) -> String {
        let value = self.counter.fetch_add(1, AtomicOrdering::Relaxed) + 1;
        format!("{}-{value}", kind.prefix())
    }
}
