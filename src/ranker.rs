//! Final validation and ordering of optimizer output.

use crate::catalog::{CatalogError, PanelCatalog};
use crate::compliance::validate;
use crate::constraints::PlacementConstraints;
use crate::core::{sort_descending, PlacementSolution};
use crate::geometry::Surface;
use crate::metrics::{compliance_score, compute_metrics, score};
use crate::options::ObjectiveWeights;

/// Number of solutions returned to callers of the planner.
pub const DEFAULT_TOP_N: usize = 5;

/// Validates every candidate, rescores it and returns the best `top_n`.
///
/// Each returned solution carries its violations and a score that includes
/// the compliance penalty. Candidates with errors are kept; they simply rank
/// lower. Ties keep their input order.
///
/// # Errors
/// Returns [`CatalogError::UnknownTemplate`] when a panel references a
/// template missing from `catalog`.
pub fn rank(
    population: &[PlacementSolution],
    surfaces: &[Surface],
    catalog: &PanelCatalog,
    constraints: &PlacementConstraints,
    weights: &ObjectiveWeights,
    max_panel_count: usize,
    top_n: usize,
) -> Result<Vec<PlacementSolution>, CatalogError> {
    let mut ranked = Vec::with_capacity(population.len());
    for solution in population {
        let violations = validate(solution, surfaces, catalog, constraints);
        let mut metrics = compute_metrics(solution.panels(), catalog, max_panel_count)?;
        metrics.compliance_score = compliance_score(&violations);
        let rescored = score(&metrics, &violations, weights);
        ranked.push(solution.with_validation(metrics, violations, rescored));
    }
    sort_descending(&mut ranked);
    ranked.truncate(top_n);
    Ok(ranked)
}
