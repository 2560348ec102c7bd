//! Metrics, per-panel annotation and scoring.
//!
//! Everything in this module is deterministic: the same panel list always
//! yields the same [`Metrics`] and the same score.

use crate::catalog::{CatalogError, PanelCatalog, PanelTemplate};
use crate::constraints::PlacementConstraints;
use crate::core::{
    clamp_score, Metrics, Orientation, PanelPlacement, Position, Severity, Violation,
};
use crate::geometry::{distance_to_boundary, Surface};
use crate::options::ObjectiveWeights;
use std::collections::HashMap;

/// Annual kWh produced per rated watt (1460 peak-sun hours at a 0.8 performance ratio).
pub const ANNUAL_YIELD_PER_WATT: f64 = 1.168;
/// Installed cost per rated watt.
pub const COST_PER_WATT: f64 = 2.75;
/// Annual yield of a large residential system; production scores 100 at this level.
pub const REFERENCE_ANNUAL_YIELD: f64 = 14_000.0;
/// Cost that removes one point from the cost score.
pub const COST_SCORE_DIVISOR: f64 = 500.0;
/// Share of the final score given to compliance.
pub const COMPLIANCE_WEIGHT: f64 = 0.2;
/// Compliance points lost per error-severity violation.
pub const ERROR_PENALTY: f64 = 20.0;
/// Compliance points lost per warning-severity violation.
pub const WARNING_PENALTY: f64 = 5.0;

const TILT_SPREAD_REFERENCE: f64 = 10.0;

/// Builds a [`PanelPlacement`] and derives its geometric annotations.
///
/// `within_surface` comes from the point-in-polygon test. The shading factor
/// grows with the panel's misalignment to the roof plane. A panel is
/// maintenance-accessible when it lies within one panel length (plus service
/// clearance) of the edge keep-out band, where the access pathway runs.
#[must_use]
pub fn place_panel(
    id: String,
    position: Position,
    orientation: Orientation,
    surface: &Surface,
    template: &PanelTemplate,
    constraints: &PlacementConstraints,
) -> PanelPlacement {
    let center = position.point();
    let within_surface = surface.contains(center);
    let azimuth_offset = angular_difference(orientation.azimuth, surface.azimuth) / 180.0;
    let tilt_offset = ((orientation.tilt - surface.tilt).abs() / 90.0).min(1.0);
    let shading_factor = (0.5 * azimuth_offset + 0.5 * tilt_offset).clamp(0.0, 1.0);
    let reach = constraints.edge_keep_out()
        + template.dimensions.width.max(template.dimensions.height)
        + constraints.maintenance.service_clearance;
    let maintenance_access =
        within_surface && distance_to_boundary(center, &surface.polygon) <= reach;
    PanelPlacement {
        id,
        position,
        orientation,
        template_id: template.id.clone(),
        surface_id: surface.id.clone(),
        shading_factor,
        maintenance_access,
        within_surface,
    }
}

/// Smallest absolute difference between two compass bearings, in `[0, 180]`.
#[must_use]
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Rounds an azimuth to a whole-degree bucket in `[0, 360)`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn azimuth_bucket(azimuth: f64) -> i64 {
    (azimuth.rem_euclid(360.0).round() as i64) % 360
}

/// Aggregates a panel list into [`Metrics`].
///
/// `max_panel_count` is the feasible panel count reported by the irradiance
/// model; coverage is zero when it is zero. The compliance score is left at
/// 100 because no violations are considered here.
///
/// # Errors
/// Returns [`CatalogError::UnknownTemplate`] when a panel references a
/// template missing from `catalog`.
pub fn compute_metrics(
    panels: &[PanelPlacement],
    catalog: &PanelCatalog,
    max_panel_count: usize,
) -> Result<Metrics, CatalogError> {
    let mut metrics = Metrics {
        compliance_score: 100.0,
        ..Metrics::default()
    };
    if panels.is_empty() {
        return Ok(metrics);
    }
    let mut total_wattage = 0.0;
    for panel in panels {
        total_wattage += catalog.get(&panel.template_id)?.electrical.rated_power;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = panels.len() as f64;
    metrics.panel_count = panels.len();
    metrics.total_wattage = total_wattage;
    metrics.annual_yield = total_wattage * ANNUAL_YIELD_PER_WATT;
    metrics.cost_estimate = total_wattage * COST_PER_WATT;
    metrics.coverage = if max_panel_count == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let ceiling = max_panel_count as f64;
        (count / ceiling * 100.0).clamp(0.0, 100.0)
    };
    metrics.aesthetic_score = aesthetic_score(panels);
    let accessible = panels.iter().filter(|panel| panel.maintenance_access).count();
    #[allow(clippy::cast_precision_loss)]
    {
        metrics.maintenance_score = accessible as f64 / count * 100.0;
    }
    metrics.shading_loss = panels.iter().map(|panel| panel.shading_factor).sum::<f64>() / count;
    Ok(metrics)
}

fn aesthetic_score(panels: &[PanelPlacement]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let count = panels.len() as f64;
    let mut buckets: HashMap<i64, usize> = HashMap::new();
    for panel in panels {
        *buckets.entry(azimuth_bucket(panel.orientation.azimuth)).or_default() += 1;
    }
    let modal = buckets.values().copied().max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let azimuth_uniformity = modal as f64 / count;
    let mean_tilt = panels.iter().map(|panel| panel.orientation.tilt).sum::<f64>() / count;
    let tilt_spread = (panels
        .iter()
        .map(|panel| (panel.orientation.tilt - mean_tilt).powi(2))
        .sum::<f64>()
        / count)
        .sqrt();
    let tilt_uniformity = 1.0 - (tilt_spread / TILT_SPREAD_REFERENCE).min(1.0);
    50.0 * (azimuth_uniformity + tilt_uniformity)
}

/// Compliance standing derived from violation counts.
///
/// `max(0, 100 - 20 * errors - 5 * warnings)`; info findings are free.
#[must_use]
pub fn compliance_score(violations: &[Violation]) -> f64 {
    let mut errors = 0_u32;
    let mut warnings = 0_u32;
    for violation in violations {
        match violation.severity {
            Severity::Error => errors += 1,
            Severity::Warning => warnings += 1,
            Severity::Info => {}
        }
    }
    (100.0 - ERROR_PENALTY * f64::from(errors) - WARNING_PENALTY * f64::from(warnings)).max(0.0)
}

/// Each objective normalized to `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveScores {
    /// Shading-adjusted yield against [`REFERENCE_ANNUAL_YIELD`].
    pub production: f64,
    /// `100 - cost / COST_SCORE_DIVISOR`.
    pub cost: f64,
    /// Aesthetic sub-score.
    pub aesthetics: f64,
    /// Maintenance sub-score.
    pub maintenance: f64,
}

impl ObjectiveScores {
    /// Normalizes the raw metrics.
    #[must_use]
    pub fn from_metrics(metrics: &Metrics) -> Self {
        let shading = metrics.shading_loss.clamp(0.0, 1.0);
        Self {
            production: unit_score(
                metrics.annual_yield * (1.0 - shading) / REFERENCE_ANNUAL_YIELD * 100.0,
            ),
            cost: unit_score(100.0 - metrics.cost_estimate / COST_SCORE_DIVISOR),
            aesthetics: unit_score(metrics.aesthetic_score),
            maintenance: unit_score(metrics.maintenance_score),
        }
    }

    /// Weighted blend using normalized weights.
    #[must_use]
    pub fn blend(&self, weights: &ObjectiveWeights) -> f64 {
        let weights = weights.normalized();
        weights.production * self.production
            + weights.cost * self.cost
            + weights.aesthetics * self.aesthetics
            + weights.maintenance * self.maintenance
    }
}

fn unit_score(value: f64) -> f64 {
    clamp_score(value)
}

/// Final score in `[0, 100]`.
///
/// The weighted objective blend takes `1 - COMPLIANCE_WEIGHT` of the score and
/// the compliance score derived from `violations` takes the rest. Violations
/// only lower the score; they never remove a candidate.
///
/// # Examples
/// ```
/// use roofplan::metrics::score;
/// use roofplan::options::ObjectiveWeights;
/// use roofplan::Metrics;
///
/// let value = score(&Metrics::default(), &[], &ObjectiveWeights::default());
/// assert!((0.0..=100.0).contains(&value));
/// ```
#[must_use]
pub fn score(metrics: &Metrics, violations: &[Violation], weights: &ObjectiveWeights) -> f64 {
    let blend = ObjectiveScores::from_metrics(metrics).blend(weights);
    let compliance = compliance_score(violations);
    clamp_score((1.0 - COMPLIANCE_WEIGHT) * blend + COMPLIANCE_WEIGHT * compliance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ViolationCategory;
    use crate::geometry::Point;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn roof() -> Surface {
        Surface::from_polygon(
            "roof",
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 10.0),
                Point::new(20.0, 10.0),
                Point::new(20.0, 0.0),
            ],
            180.0,
            20.0,
        )
    }

    fn panels(count: usize) -> Vec<PanelPlacement> {
        let catalog = PanelCatalog::with_defaults();
        let template = catalog.get("std-400").unwrap();
        let constraints = PlacementConstraints::default();
        (0..count)
            .map(|idx| {
                #[allow(clippy::cast_precision_loss)]
                let x = 1.0 + idx as f64;
                place_panel(
                    format!("panel-{idx}"),
                    Position::planar(x, 5.0),
                    Orientation {
                        azimuth: 180.0,
                        tilt: 20.0,
                    },
                    &roof(),
                    template,
                    &constraints,
                )
            })
            .collect()
    }

    fn violation(severity: Severity) -> Violation {
        Violation {
            category: ViolationCategory::Regulatory,
            severity,
            description: String::new(),
            affected_panels: Vec::new(),
            suggestion: String::new(),
        }
    }

    #[test]
    fn deep_interior_panels_lose_maintenance_access() {
        let catalog = PanelCatalog::with_defaults();
        let template = catalog.get("std-400").unwrap();
        let constraints = PlacementConstraints::default();
        let wide = Surface::from_polygon(
            "wide",
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 30.0),
                Point::new(30.0, 30.0),
                Point::new(30.0, 0.0),
            ],
            180.0,
            20.0,
        );
        let place = |id: &str, x: f64| {
            place_panel(
                id.to_owned(),
                Position::planar(x, 15.0),
                Orientation {
                    azimuth: 180.0,
                    tilt: 20.0,
                },
                &wide,
                template,
                &constraints,
            )
        };
        let edge = place("edge", 4.0);
        let middle = place("middle", 15.0);
        assert!(edge.within_surface && edge.maintenance_access);
        assert!(middle.within_surface && !middle.maintenance_access);

        let layout = vec![edge, middle];
        let metrics = compute_metrics(&layout, &catalog, 10).unwrap();
        assert!((metrics.maintenance_score - 50.0).abs() < 1e-9);
        let finding =
            crate::compliance::check_maintenance_access(&layout, &constraints).unwrap();
        assert_eq!(finding.severity, Severity::Warning);
        assert_eq!(finding.affected_panels, vec!["middle".to_owned()]);
    }

    #[test]
    fn wattage_yield_and_cost_follow_ratings() {
        let catalog = PanelCatalog::with_defaults();
        let metrics = compute_metrics(&panels(10), &catalog, 40).unwrap();
        assert_eq!(metrics.panel_count, 10);
        assert!((metrics.total_wattage - 4000.0).abs() < 1e-9);
        assert!((metrics.annual_yield - 4000.0 * ANNUAL_YIELD_PER_WATT).abs() < 1e-9);
        assert!((metrics.cost_estimate - 4000.0 * COST_PER_WATT).abs() < 1e-9);
        assert!((metrics.coverage - 25.0).abs() < 1e-9);
        assert_eq!(metrics.compliance_score, 100.0);
    }

    #[test]
    fn compute_metrics_is_deterministic() {
        let catalog = PanelCatalog::with_defaults();
        let layout = panels(7);
        assert_eq!(
            compute_metrics(&layout, &catalog, 30).unwrap(),
            compute_metrics(&layout, &catalog, 30).unwrap()
        );
    }

    #[test]
    fn empty_and_zero_ceiling_are_neutral() {
        let catalog = PanelCatalog::with_defaults();
        let empty = compute_metrics(&[], &catalog, 10).unwrap();
        assert_eq!(empty.panel_count, 0);
        assert_eq!(empty.coverage, 0.0);
        let no_ceiling = compute_metrics(&panels(3), &catalog, 0).unwrap();
        assert_eq!(no_ceiling.coverage, 0.0);
        assert!(no_ceiling.aesthetic_score.is_finite());
    }

    #[test]
    fn unknown_template_is_reported() {
        let mut layout = panels(1);
        layout[0].template_id = "ghost".to_owned();
        let catalog = PanelCatalog::with_defaults();
        assert_eq!(
            compute_metrics(&layout, &catalog, 10),
            Err(CatalogError::UnknownTemplate("ghost".to_owned()))
        );
    }

    #[test]
    fn aligned_panels_are_unshaded_and_uniform() {
        let catalog = PanelCatalog::with_defaults();
        let metrics = compute_metrics(&panels(4), &catalog, 10).unwrap();
        assert_eq!(metrics.shading_loss, 0.0);
        assert!((metrics.aesthetic_score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn mixed_azimuths_lower_aesthetics() {
        let catalog = PanelCatalog::with_defaults();
        let mut layout = panels(4);
        layout[0].orientation.azimuth = 170.0;
        layout[1].orientation.azimuth = 190.0;
        let metrics = compute_metrics(&layout, &catalog, 10).unwrap();
        assert!((metrics.aesthetic_score - 75.0).abs() < 1e-9);
    }

    #[test]
    fn misaligned_panel_is_shaded() {
        let catalog = PanelCatalog::with_defaults();
        let panel = place_panel(
            "p".to_owned(),
            Position::planar(10.0, 5.0),
            Orientation {
                azimuth: 0.0,
                tilt: 20.0,
            },
            &roof(),
            catalog.get("std-400").unwrap(),
            &PlacementConstraints::default(),
        );
        assert!((panel.shading_factor - 0.5).abs() < 1e-12);
        assert!(panel.within_surface);
    }

    #[test]
    fn out_of_surface_panels_lack_access() {
        let catalog = PanelCatalog::with_defaults();
        let panel = place_panel(
            "p".to_owned(),
            Position::planar(25.0, 5.0),
            Orientation {
                azimuth: 180.0,
                tilt: 20.0,
            },
            &roof(),
            catalog.get("std-400").unwrap(),
            &PlacementConstraints::default(),
        );
        assert!(!panel.within_surface);
        assert!(!panel.maintenance_access);
    }

    #[test]
    fn angular_difference_wraps() {
        assert_eq!(angular_difference(350.0, 10.0), 20.0);
        assert_eq!(angular_difference(10.0, 350.0), 20.0);
        assert_eq!(angular_difference(0.0, 180.0), 180.0);
    }

    #[test]
    fn compliance_penalties() {
        assert_eq!(compliance_score(&[]), 100.0);
        let mixed = vec![
            violation(Severity::Error),
            violation(Severity::Warning),
            violation(Severity::Info),
        ];
        assert_eq!(compliance_score(&mixed), 75.0);
        let many = vec![violation(Severity::Error); 8];
        assert_eq!(compliance_score(&many), 0.0);
    }

    #[test]
    fn score_is_bounded_for_arbitrary_inputs() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let metrics = Metrics {
                panel_count: rng.gen_range(0..200),
                total_wattage: rng.gen_range(-1e6..1e6),
                annual_yield: rng.gen_range(-1e6..1e7),
                coverage: rng.gen_range(-50.0..150.0),
                aesthetic_score: rng.gen_range(-500.0..500.0),
                maintenance_score: rng.gen_range(-500.0..500.0),
                compliance_score: rng.gen_range(-500.0..500.0),
                cost_estimate: rng.gen_range(-1e7..1e7),
                shading_loss: rng.gen_range(-2.0..2.0),
            };
            let violations = vec![violation(Severity::Error); rng.gen_range(0..10)];
            let weights = ObjectiveWeights {
                production: rng.gen_range(-1.0..5.0),
                cost: rng.gen_range(-1.0..5.0),
                aesthetics: rng.gen_range(-1.0..5.0),
                maintenance: rng.gen_range(-1.0..5.0),
            };
            let value = score(&metrics, &violations, &weights);
            assert!((0.0..=100.0).contains(&value), "score {value} out of range");
        }
        let nan = Metrics {
            annual_yield: f64::NAN,
            ..Metrics::default()
        };
        let value = score(&nan, &[], &ObjectiveWeights::default());
        assert!((0.0..=100.0).contains(&value));
    }

    #[test]
    fn errors_lower_the_score() {
        let catalog = PanelCatalog::with_defaults();
        let metrics = compute_metrics(&panels(10), &catalog, 20).unwrap();
        let weights = ObjectiveWeights::default();
        let clean = score(&metrics, &[], &weights);
        let flagged = score(&metrics, &[violation(Severity::Error)], &weights);
        assert!((clean - flagged - COMPLIANCE_WEIGHT * ERROR_PENALTY).abs() < 1e-9);
    }
}
