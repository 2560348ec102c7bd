//! Compliance validation of candidate layouts.
//!
//! The four checks are independent and pure; [`validate`] concatenates their
//! findings in a fixed order. Findings are data: they lower a candidate's
//! compliance score but never reject it.

use crate::catalog::PanelCatalog;
use crate::constraints::PlacementConstraints;
use crate::core::{PanelPlacement, PlacementSolution, Severity, Violation, ViolationCategory};
use crate::geometry::{distance_to_boundary, point_in_polygon, Surface};
use crate::metrics::azimuth_bucket;
use std::collections::BTreeSet;
use tracing::trace;

/// Runs every check against `solution`.
///
/// # Examples
/// ```
/// use roofplan::catalog::PanelCatalog;
/// use roofplan::compliance::validate;
/// use roofplan::constraints::PlacementConstraints;
/// use roofplan::{Metrics, PlacementSolution};
///
/// let empty = PlacementSolution::new("s", Vec::new(), Metrics::default(), 0.0);
/// let findings = validate(&empty, &[], &PanelCatalog::with_defaults(), &PlacementConstraints::default());
/// assert!(findings.is_empty());
/// ```
#[must_use]
pub fn validate(
    solution: &PlacementSolution,
    surfaces: &[Surface],
    catalog: &PanelCatalog,
    constraints: &PlacementConstraints,
) -> Vec<Violation> {
    let panels = solution.panels();
    let mut violations = check_setbacks(panels, surfaces, constraints);
    violations.extend(check_structural_load(panels, catalog, constraints));
    violations.extend(check_maintenance_access(panels, constraints));
    violations.extend(check_orientation_uniformity(panels, constraints));
    trace!(
        solution = solution.id(),
        violations = violations.len(),
        "validated layout"
    );
    violations
}

/// One regulatory error per panel that sits outside its surface or inside the
/// edge keep-out band.
#[must_use]
pub fn check_setbacks(
    panels: &[PanelPlacement],
    surfaces: &[Surface],
    constraints: &PlacementConstraints,
) -> Vec<Violation> {
    let keep_out = constraints.edge_keep_out();
    panels
        .iter()
        .filter_map(|panel| {
            let center = panel.position.point();
            let surface = surfaces.iter().find(|surface| surface.id == panel.surface_id);
            let description = match surface {
                None => format!(
                    "panel {} references unknown surface `{}`",
                    panel.id, panel.surface_id
                ),
                Some(surface) if !point_in_polygon(center, &surface.polygon) => {
                    format!("panel {} lies outside surface `{}`", panel.id, surface.id)
                }
                Some(surface) => {
                    let clearance = distance_to_boundary(center, &surface.polygon);
                    if clearance >= keep_out {
                        return None;
                    }
                    format!(
                        "panel {} is {clearance:.2} m from the roof edge; {keep_out:.2} m required",
                        panel.id
                    )
                }
            };
            Some(Violation {
                category: ViolationCategory::Regulatory,
                severity: Severity::Error,
                description,
                affected_panels: vec![panel.id.clone()],
                suggestion: format!("move the panel at least {keep_out:.2} m inside the roof edge"),
            })
        })
        .collect()
}

/// A single structural error when the mean panel load exceeds capacity.
///
/// Panels whose template is missing from `catalog` are left out of the mean.
#[must_use]
pub fn check_structural_load(
    panels: &[PanelPlacement],
    catalog: &PanelCatalog,
    constraints: &PlacementConstraints,
) -> Option<Violation> {
    let loads: Vec<f64> = panels
        .iter()
        .filter_map(|panel| catalog.get(&panel.template_id).ok())
        .map(|template| template.areal_load())
        .collect();
    if loads.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean_load = loads.iter().sum::<f64>() / loads.len() as f64;
    let capacity = constraints.physical.load_capacity;
    if mean_load <= capacity {
        return None;
    }
    Some(Violation {
        category: ViolationCategory::Structural,
        severity: Severity::Error,
        description: format!(
            "mean panel load {mean_load:.1} kg/m² exceeds roof capacity {capacity:.1} kg/m²"
        ),
        affected_panels: panels.iter().map(|panel| panel.id.clone()).collect(),
        suggestion: "use lighter modules or have the roof structure reinforced".to_owned(),
    })
}

/// A single maintenance warning listing panels without service access.
#[must_use]
pub fn check_maintenance_access(
    panels: &[PanelPlacement],
    constraints: &PlacementConstraints,
) -> Option<Violation> {
    if !constraints.maintenance.access_pathways_required {
        return None;
    }
    let blocked: Vec<String> = panels
        .iter()
        .filter(|panel| !panel.maintenance_access)
        .map(|panel| panel.id.clone())
        .collect();
    if blocked.is_empty() {
        return None;
    }
    Some(Violation {
        category: ViolationCategory::Maintenance,
        severity: Severity::Warning,
        description: format!("{} panel(s) cannot be reached for service", blocked.len()),
        affected_panels: blocked,
        suggestion: "add an access pathway or move panels closer to one".to_owned(),
    })
}

/// A single aesthetic note when more than two azimuths are in use.
#[must_use]
pub fn check_orientation_uniformity(
    panels: &[PanelPlacement],
    constraints: &PlacementConstraints,
) -> Option<Violation> {
    if !constraints.aesthetics.uniform_orientation {
        return None;
    }
    let azimuths: BTreeSet<i64> = panels
        .iter()
        .map(|panel| azimuth_bucket(panel.orientation.azimuth))
        .collect();
    if azimuths.len() <= 2 {
        return None;
    }
    Some(Violation {
        category: ViolationCategory::Aesthetic,
        severity: Severity::Info,
        description: format!("layout mixes {} panel azimuths", azimuths.len()),
        affected_panels: panels.iter().map(|panel| panel.id.clone()).collect(),
        suggestion: "align panels to a single azimuth".to_owned(),
    })
}
