//! Entry points that turn a layout request into ranked solutions.
//!
//! [`optimize`] validates the request, resolves constraints and options,
//! runs the search on the largest surface and hands the final population to
//! the ranker.

use crate::catalog::{CatalogError, PanelCatalog, PanelTemplate};
use crate::constraints::{self, ConstraintOverrides};
use crate::core::experiment::RunReport;
use crate::core::{IdGenerator, PlacementSolution};
use crate::error::LayoutResult;
use crate::geometry::{largest_surface, Point, Surface};
use crate::ops::WeightedFitness;
use crate::optimizer::{CancellationToken, GeneticOptimizer};
use crate::options::{self, OptionOverrides, SearchAlgorithm};
use crate::ranker::{rank, DEFAULT_TOP_N};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

/// Everything needed to lay out panels on one roof.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutRequest {
    /// Roof planes; panels go on the one with the largest area.
    pub surfaces: Vec<Surface>,
    /// Roof features such as vents and skylights. Kept for callers that
    /// forward them elsewhere; the search does not read them.
    pub obstacles: Vec<Vec<Point>>,
    /// Feasible panel count from the irradiance model.
    pub max_panel_count: usize,
    /// Template to use; the catalog's first entry when absent.
    pub template_id: Option<String>,
    /// Partial constraints merged over the defaults.
    pub constraints: ConstraintOverrides,
    /// Partial options merged over the defaults.
    pub options: OptionOverrides,
    /// Seed for a reproducible search; drawn from the OS when absent.
    pub seed: Option<u64>,
}

/// Ranked solutions and the history of the run that produced them.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOutcome {
    /// Best validated solutions, best first.
    pub solutions: Vec<PlacementSolution>,
    /// Raw optimizer report.
    pub report: RunReport,
}

/// Optimizes a layout for `request`.
///
/// # Errors
/// Returns [`crate::LayoutError`] for empty or malformed surfaces, an unknown
/// template, an empty catalog or out-of-range options.
///
/// # Examples
/// ```
/// use roofplan::catalog::PanelCatalog;
/// use roofplan::geometry::{Point, Surface};
/// use roofplan::options::OptionOverrides;
/// use roofplan::planner::{optimize, LayoutRequest};
/// use roofplan::SequentialIds;
///
/// let request = LayoutRequest {
///     surfaces: vec![Surface::from_polygon(
///         "south",
///         vec![
///             Point::new(0.0, 0.0),
///             Point::new(0.0, 8.0),
///             Point::new(12.0, 8.0),
///             Point::new(12.0, 0.0),
///         ],
///         180.0,
///         25.0,
///     )],
///     max_panel_count: 24,
///     options: OptionOverrides {
///         population_size: Some(16),
///         generations: Some(10),
///         ..OptionOverrides::default()
///     },
///     seed: Some(1),
///     ..LayoutRequest::default()
/// };
/// let outcome = optimize(&request, &PanelCatalog::with_defaults(), &SequentialIds::new()).unwrap();
/// assert_eq!(outcome.solutions.len(), 5);
/// ```
pub fn optimize(
    request: &LayoutRequest,
    catalog: &PanelCatalog,
    ids: &dyn IdGenerator,
) -> LayoutResult<LayoutOutcome> {
    optimize_with_cancellation(request, catalog, ids, &CancellationToken::new())
}

/// Like [`optimize`], stopping early once `token` is cancelled.
///
/// A cancelled run still ranks the population it reached.
///
/// # Errors
/// See [`optimize`].
pub fn optimize_with_cancellation(
    request: &LayoutRequest,
    catalog: &PanelCatalog,
    ids: &dyn IdGenerator,
    token: &CancellationToken,
) -> LayoutResult<LayoutOutcome> {
    let surface = largest_surface(&request.surfaces)?;
    let template = select_template(request, catalog)?;
    let constraints = constraints::resolve(&request.constraints);
    let options = options::resolve(&request.options);
    info!(
        surfaces = request.surfaces.len(),
        surface = %surface.id,
        template = %template.id,
        max_panel_count = request.max_panel_count,
        "optimizing layout"
    );
    if !request.obstacles.is_empty() {
        debug!(
            obstacles = request.obstacles.len(),
            "obstacles are not considered by the search"
        );
    }

    let report = match options.algorithm {
        SearchAlgorithm::Genetic => {
            let fitness = WeightedFitness::new(catalog, options.weights, request.max_panel_count);
            let optimizer = GeneticOptimizer::builder(fitness, &request.surfaces, template)
                .constraints(constraints)
                .options(options)
                .max_panel_count(request.max_panel_count)
                .ids(ids)
                .cancellation(token.clone())
                .build()?;
            let mut rng = request
                .seed
                .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
            optimizer.run(&mut rng)?
        }
    };

    let solutions = rank(
        &report.population,
        &request.surfaces,
        catalog,
        &constraints,
        &options.weights,
        request.max_panel_count,
        DEFAULT_TOP_N,
    )?;
    info!(
        solutions = solutions.len(),
        best_score = solutions.first().map_or(0.0, PlacementSolution::score),
        generations = report.generations,
        "layout ready"
    );
    Ok(LayoutOutcome { solutions, report })
}

fn select_template<'a>(
    request: &LayoutRequest,
    catalog: &'a PanelCatalog,
) -> Result<&'a PanelTemplate, CatalogError> {
    match &request.template_id {
        Some(id) => catalog.get(id),
        None => catalog.templates().first().ok_or(CatalogError::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SequentialIds;
    use crate::error::LayoutError;
    use crate::geometry::SurfaceError;
    use crate::optimizer::OptimizerError;

    fn request() -> LayoutRequest {
        LayoutRequest {
            surfaces: vec![Surface::from_polygon(
                "roof",
                vec![
                    Point::new(0.0, 0.0),
                    Point::new(0.0, 10.0),
                    Point::new(10.0, 10.0),
                    Point::new(10.0, 0.0),
                ],
                180.0,
                20.0,
            )],
            max_panel_count: 20,
            options: OptionOverrides {
                population_size: Some(10),
                generations: Some(4),
                ..OptionOverrides::default()
            },
            seed: Some(17),
            ..LayoutRequest::default()
        }
    }

    #[test]
    fn template_defaults_to_first_catalog_entry() {
        let catalog = PanelCatalog::with_defaults();
        let outcome = optimize(&request(), &catalog, &SequentialIds::new()).unwrap();
        let first = &catalog.templates()[0].id;
        assert!(outcome
            .solutions
            .iter()
            .flat_map(PlacementSolution::panels)
            .all(|panel| &panel.template_id == first));
    }

    #[test]
    fn explicit_template_is_used() {
        let catalog = PanelCatalog::with_defaults();
        let request = LayoutRequest {
            template_id: Some("compact-360".to_owned()),
            ..request()
        };
        let outcome = optimize(&request, &catalog, &SequentialIds::new()).unwrap();
        let best = &outcome.solutions[0];
        assert!(best.panels().iter().all(|p| p.template_id == "compact-360"));
        let expected = 360.0 * f64::from(u32::try_from(best.panels().len()).unwrap());
        assert!((best.metrics().total_wattage - expected).abs() < 1e-9);
    }

    #[test]
    fn input_errors_fail_fast() {
        let catalog = PanelCatalog::with_defaults();
        let ids = SequentialIds::new();
        let empty = LayoutRequest {
            surfaces: Vec::new(),
            ..request()
        };
        assert_eq!(
            optimize(&empty, &catalog, &ids).unwrap_err(),
            LayoutError::Surface(SurfaceError::Empty)
        );
        let unknown = LayoutRequest {
            template_id: Some("ghost".to_owned()),
            ..request()
        };
        assert_eq!(
            optimize(&unknown, &catalog, &ids).unwrap_err(),
            LayoutError::Catalog(CatalogError::UnknownTemplate("ghost".to_owned()))
        );
        assert_eq!(
            optimize(&request(), &PanelCatalog::new(), &ids).unwrap_err(),
            LayoutError::Catalog(CatalogError::Empty)
        );
        let no_ceiling = LayoutRequest {
            max_panel_count: 0,
            ..request()
        };
        assert_eq!(
            optimize(&no_ceiling, &catalog, &ids).unwrap_err(),
            LayoutError::Optimizer(OptimizerError::InvalidMaxPanelCount)
        );
    }

    #[test]
    fn seeded_requests_are_reproducible() {
        let catalog = PanelCatalog::with_defaults();
        let first = optimize(&request(), &catalog, &SequentialIds::new()).unwrap();
        let second = optimize(&request(), &catalog, &SequentialIds::new()).unwrap();
        assert_eq!(first, second);
    }
}
