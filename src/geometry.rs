//! Planar geometry helpers for roof surfaces.
//!
//! Everything here works in plan coordinates measured in meters. The functions
//! are pure so they can be shared freely between the optimizer, the compliance
//! checks and the grid preview.

use thiserror::Error;

const BOUNDARY_TOLERANCE: f64 = 1e-9;
const MIN_SURFACE_AREA: f64 = 1e-9;

/// A point in plan coordinates.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate in meters.
    pub x: f64,
    /// Vertical coordinate in meters.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned extent of a polygon.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Smallest x coordinate.
    pub min_x: f64,
    /// Largest x coordinate.
    pub max_x: f64,
    /// Smallest y coordinate.
    pub min_y: f64,
    /// Largest y coordinate.
    pub max_y: f64,
}

impl BoundingBox {
    /// Width of the box along x.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box along y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Computes the bounding box of a vertex list.
///
/// Returns `None` only when `polygon` is empty.
///
/// # Examples
/// ```
/// use roofplan::geometry::{bounding_box, Point};
///
/// let square = [
///     Point::new(0.0, 0.0),
///     Point::new(0.0, 10.0),
///     Point::new(10.0, 10.0),
///     Point::new(10.0, 0.0),
/// ];
/// let bounds = bounding_box(&square).unwrap();
/// assert_eq!((bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y), (0.0, 10.0, 0.0, 10.0));
/// ```
#[must_use]
pub fn bounding_box(polygon: &[Point]) -> Option<BoundingBox> {
    let first = polygon.first()?;
    let mut bounds = BoundingBox {
        min_x: first.x,
        max_x: first.x,
        min_y: first.y,
        max_y: first.y,
    };
    for vertex in &polygon[1..] {
        bounds.min_x = bounds.min_x.min(vertex.x);
        bounds.max_x = bounds.max_x.max(vertex.x);
        bounds.min_y = bounds.min_y.min(vertex.y);
        bounds.max_y = bounds.max_y.max(vertex.y);
    }
    Some(bounds)
}

/// Tests polygon membership with the even-odd ray casting rule.
///
/// Points lying on an edge or a vertex are treated as **outside**. Polygons
/// with fewer than three vertices contain no points.
///
/// # Examples
/// ```
/// use roofplan::geometry::{point_in_polygon, Point};
///
/// let square = [
///     Point::new(0.0, 0.0),
///     Point::new(0.0, 10.0),
///     Point::new(10.0, 10.0),
///     Point::new(10.0, 0.0),
/// ];
/// assert!(point_in_polygon(Point::new(5.0, 5.0), &square));
/// assert!(!point_in_polygon(Point::new(15.0, 5.0), &square));
/// assert!(!point_in_polygon(Point::new(10.0, 5.0), &square));
/// ```
#[must_use]
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    if edges(polygon).any(|(a, b)| segment_distance(point, a, b) <= BOUNDARY_TOLERANCE) {
        return false;
    }
    let mut inside = false;
    for (a, b) in edges(polygon) {
        let crosses = (a.y > point.y) != (b.y > point.y);
        if crosses {
            let x_at_y = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_at_y {
                inside = !inside;
            }
        }
    }
    inside
}

/// Absolute polygon area computed with the shoelace formula.
#[must_use]
pub fn polygon_area(polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let twice_area: f64 = edges(polygon).map(|(a, b)| a.x * b.y - b.x * a.y).sum();
    (twice_area / 2.0).abs()
}

/// Shortest distance from `point` to any edge of `polygon`.
///
/// Returns `f64::INFINITY` for an empty polygon.
#[must_use]
pub fn distance_to_boundary(point: Point, polygon: &[Point]) -> f64 {
    match polygon.len() {
        0 => f64::INFINITY,
        1 => distance(point, polygon[0]),
        _ => edges(polygon)
            .map(|(a, b)| segment_distance(point, a, b))
            .fold(f64::INFINITY, f64::min),
    }
}

fn edges(polygon: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let count = polygon.len();
    (0..count).map(move |idx| (polygon[idx], polygon[(idx + 1) % count]))
}

fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn segment_distance(point: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f64::EPSILON {
        return distance(point, a);
    }
    let t = (((point.x - a.x) * dx + (point.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    distance(point, Point::new(a.x + t * dx, a.y + t * dy))
}

/// Errors raised for roof surfaces that cannot be laid out.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    /// No surfaces were supplied.
    #[error("at least one roof surface is required")]
    Empty,
    /// The polygon has fewer than three vertices.
    #[error("surface `{surface}` has {vertices} vertices; at least 3 are required")]
    TooFewVertices {
        /// Offending surface.
        surface: String,
        /// Number of vertices supplied.
        vertices: usize,
    },
    /// A vertex, the azimuth or the tilt is NaN or infinite.
    #[error("surface `{surface}` contains non-finite geometry")]
    NonFinite {
        /// Offending surface.
        surface: String,
    },
    /// The declared or computed area is zero.
    #[error("surface `{surface}` is degenerate (area {area})")]
    ZeroArea {
        /// Offending surface.
        surface: String,
        /// Area that failed the check.
        area: f64,
    },
}

/// A roof plane supplied by the roof-analysis step.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    /// Caller-assigned identity.
    pub id: String,
    /// Outline in plan coordinates, in order.
    pub polygon: Vec<Point>,
    /// Usable area in square meters.
    pub area: f64,
    /// Compass direction the plane faces, in degrees (180 = south).
    pub azimuth: f64,
    /// Pitch of the plane in degrees.
    pub tilt: f64,
}

impl Surface {
    /// Creates a surface, taking its area from the polygon.
    #[must_use]
    pub fn from_polygon(
        id: impl Into<String>,
        polygon: Vec<Point>,
        azimuth: f64,
        tilt: f64,
    ) -> Self {
        let area = polygon_area(&polygon);
        Self {
            id: id.into(),
            polygon,
            area,
            azimuth,
            tilt,
        }
    }

    /// Checks that the surface can host a layout.
    ///
    /// # Errors
    /// Returns [`SurfaceError`] for malformed, non-finite or zero-area outlines.
    pub fn validate(&self) -> Result<(), SurfaceError> {
        if self.polygon.len() < 3 {
            return Err(SurfaceError::TooFewVertices {
                surface: self.id.clone(),
                vertices: self.polygon.len(),
            });
        }
        let finite = self.polygon.iter().all(|vertex| vertex.is_finite())
            && self.azimuth.is_finite()
            && self.tilt.is_finite();
        if !finite {
            return Err(SurfaceError::NonFinite {
                surface: self.id.clone(),
            });
        }
        let computed = polygon_area(&self.polygon);
        for area in [self.area, computed] {
            if !(area.is_finite() && area > MIN_SURFACE_AREA) {
                return Err(SurfaceError::ZeroArea {
                    surface: self.id.clone(),
                    area,
                });
            }
        }
        Ok(())
    }

    /// Bounding box of the outline.
    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        bounding_box(&self.polygon)
    }

    /// Whether `point` lies strictly inside the outline.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point_in_polygon(point, &self.polygon)
    }
}

/// Validates every surface and returns the one with the largest declared area.
///
/// # Errors
/// Returns [`SurfaceError::Empty`] for an empty list, otherwise the first
/// validation failure.
pub fn largest_surface(surfaces: &[Surface]) -> Result<&Surface, SurfaceError> {
    let mut largest: Option<&Surface> = None;
    for surface in surfaces {
        surface.validate()?;
        largest = match largest {
            Some(current) if current.area >= surface.area => Some(current),
            _ => Some(surface),
        };
    }
    largest.ok_or(SurfaceError::Empty)
}
