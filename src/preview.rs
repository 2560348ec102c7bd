//! Quick grid packing used to show a layout before optimizing.
//!
//! The preview walks a regular grid over the surface's bounding box and keeps
//! every center that falls inside the outline. It is deterministic and shares
//! nothing with the optimizer.

use crate::catalog::{CatalogError, PanelTemplate};
use crate::core::Position;
use crate::error::LayoutError;
use crate::geometry::{Surface, SurfaceError};
use tracing::debug;

/// Gap between neighbouring panels in the preview grid, in meters.
pub const PREVIEW_SPACING: f64 = 0.1;

/// One grid position considered by the preview.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewAttempt {
    /// Panel center.
    pub position: Position,
    /// Whether the center lies inside the surface.
    pub valid: bool,
}

/// Outcome of [`preview`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewResult {
    /// Every position tried, in row-major order.
    pub attempts: Vec<PreviewAttempt>,
    /// Number of valid positions.
    pub panels_fit: usize,
    /// Share of the surface covered by fitted panels, 0-100.
    pub coverage: f64,
}

/// Packs `template` panels on `surface` row by row.
///
/// Rows and columns advance by the panel size plus [`PREVIEW_SPACING`],
/// starting at the lower-left corner of the bounding box. The walk stops once
/// `max_panels` positions fit or the grid is exhausted.
///
/// # Errors
/// Returns [`LayoutError::Surface`] for an invalid surface and
/// [`LayoutError::Catalog`] when the template has no usable size.
///
/// # Examples
/// ```
/// use roofplan::catalog::PanelCatalog;
/// use roofplan::geometry::{Point, Surface};
/// use roofplan::preview::preview;
///
/// let catalog = PanelCatalog::with_defaults();
/// let surface = Surface::from_polygon(
///     "garage",
///     vec![
///         Point::new(0.0, 0.0),
///         Point::new(0.0, 4.5),
///         Point::new(5.0, 4.5),
///         Point::new(5.0, 0.0),
///     ],
///     180.0,
///     15.0,
/// );
/// let result = preview(&surface, catalog.get("std-400").unwrap(), 100).unwrap();
/// assert_eq!(result.panels_fit, 8);
/// ```
pub fn preview(
    surface: &Surface,
    template: &PanelTemplate,
    max_panels: usize,
) -> Result<PreviewResult, LayoutError> {
    surface.validate()?;
    let width = template.dimensions.width;
    let height = template.dimensions.height;
    for (field, value) in [("width", width), ("height", height)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(CatalogError::InvalidTemplate {
                id: template.id.clone(),
                field,
                value,
            }
            .into());
        }
    }
    let bounds = surface.bounds().ok_or_else(|| SurfaceError::TooFewVertices {
        surface: surface.id.clone(),
        vertices: surface.polygon.len(),
    })?;

    let columns = grid_steps(bounds.width(), width);
    let rows = grid_steps(bounds.height(), height);
    let mut attempts = Vec::new();
    let mut panels_fit = 0;
    'rows: for row in 0..rows {
        if panels_fit >= max_panels {
            break;
        }
        #[allow(clippy::cast_precision_loss)]
        let y = bounds.min_y + height / 2.0 + row as f64 * (height + PREVIEW_SPACING);
        for column in 0..columns {
            #[allow(clippy::cast_precision_loss)]
            let x = bounds.min_x + width / 2.0 + column as f64 * (width + PREVIEW_SPACING);
            let position = Position::planar(x, y);
            let valid = surface.contains(position.point());
            attempts.push(PreviewAttempt { position, valid });
            if valid {
                panels_fit += 1;
                if panels_fit >= max_panels {
                    break 'rows;
                }
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let covered = panels_fit as f64 * template.dimensions.footprint();
    let coverage = (covered / surface.area * 100.0).clamp(0.0, 100.0);
    debug!(surface = %surface.id, panels_fit, coverage, "preview packed");
    Ok(PreviewResult {
        attempts,
        panels_fit,
        coverage,
    })
}

/// Number of panels of `size` that fit along `extent` with preview spacing.
fn grid_steps(extent: f64, size: f64) -> usize {
    let free = extent - size + f64::EPSILON;
    if free < 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = (free / (size + PREVIEW_SPACING)).floor() as usize;
    steps + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PanelCatalog;
    use crate::geometry::Point;

    fn rectangle(width: f64, height: f64) -> Surface {
        Surface::from_polygon(
            "rect",
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, height),
                Point::new(width, height),
                Point::new(width, 0.0),
            ],
            180.0,
            20.0,
        )
    }

    #[test]
    fn packs_a_rectangle() {
        let catalog = PanelCatalog::with_defaults();
        let template = catalog.get("std-400").unwrap();
        let result = preview(&rectangle(10.0, 10.0), template, 1000).unwrap();
        // 9 columns of 1.0 m and 4 rows of 2.0 m with 0.1 m gaps
        assert_eq!(result.panels_fit, 36);
        assert_eq!(result.attempts.len(), 36);
        assert!((result.coverage - 72.0).abs() < 1e-9);
    }

    #[test]
    fn stops_at_max_panels() {
        let catalog = PanelCatalog::with_defaults();
        let template = catalog.get("std-400").unwrap();
        let result = preview(&rectangle(10.0, 10.0), template, 5).unwrap();
        assert_eq!(result.panels_fit, 5);
        assert_eq!(result.attempts.len(), 5);
    }

    #[test]
    fn grid_is_counted_up_front() {
        assert_eq!(grid_steps(10.0, 1.0), 9);
        assert_eq!(grid_steps(10.0, 2.0), 4);
        assert_eq!(grid_steps(1.0, 1.0), 1);
        assert_eq!(grid_steps(0.5, 1.0), 0);
    }

    #[test]
    fn oversized_panel_tries_nothing() {
        let catalog = PanelCatalog::with_defaults();
        let template = catalog.get("std-400").unwrap();
        let result = preview(&rectangle(0.8, 10.0), template, 1000).unwrap();
        assert!(result.attempts.is_empty());
        assert_eq!(result.panels_fit, 0);
    }

    #[test]
    fn attempts_never_exceed_the_grid() {
        let catalog = PanelCatalog::with_defaults();
        let template = catalog.get("std-400").unwrap();
        let surface = Surface::from_polygon(
            "wedge",
            vec![Point::new(0.0, 0.0), Point::new(0.0, 12.0), Point::new(9.0, 0.0)],
            180.0,
            20.0,
        );
        let result = preview(&surface, template, usize::MAX).unwrap();
        let grid = grid_steps(9.0, 1.0) * grid_steps(12.0, 2.0);
        assert_eq!(result.attempts.len(), grid);
        assert!(result.panels_fit < grid);
    }

    #[test]
    fn zero_budget_tries_nothing() {
        let catalog = PanelCatalog::with_defaults();
        let template = catalog.get("std-400").unwrap();
        let result = preview(&rectangle(10.0, 10.0), template, 0).unwrap();
        assert!(result.attempts.is_empty());
        assert_eq!(result.coverage, 0.0);
    }

    #[test]
    fn l_shape_rejects_the_notch() {
        let catalog = PanelCatalog::with_defaults();
        let template = catalog.get("std-400").unwrap();
        let surface = Surface::from_polygon(
            "ell",
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 10.0),
                Point::new(5.0, 10.0),
                Point::new(5.0, 5.0),
                Point::new(10.0, 5.0),
                Point::new(10.0, 0.0),
            ],
            180.0,
            20.0,
        );
        let result = preview(&surface, template, 1000).unwrap();
        assert!(result.attempts.iter().any(|attempt| !attempt.valid));
        assert!(result.panels_fit < result.attempts.len());
        assert!(result
            .attempts
            .iter()
            .filter(|attempt| attempt.valid)
            .all(|attempt| surface.contains(attempt.position.point())));
    }

    #[test]
    fn preview_is_deterministic() {
        let catalog = PanelCatalog::with_defaults();
        let template = catalog.get("compact-360").unwrap();
        let surface = rectangle(7.3, 6.1);
        assert_eq!(
            preview(&surface, template, 50).unwrap(),
            preview(&surface, template, 50).unwrap()
        );
    }

    #[test]
    fn invalid_surface_fails() {
        let catalog = PanelCatalog::with_defaults();
        let template = catalog.get("std-400").unwrap();
        let flat = Surface::from_polygon(
            "flat",
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)],
            180.0,
            20.0,
        );
        assert!(matches!(
            preview(&flat, template, 10),
            Err(LayoutError::Surface(_))
        ));
    }
}
