//! Perturbation of panel lists.

use crate::core::{Orientation, PanelPlacement, Position};
use crate::metrics::place_panel;
use crate::ops::{OperatorError, PlacementContext};
use rand::{Rng, RngCore};

/// Applies a mutation to a panel list and returns a new list.
///
/// Implementations must re-annotate every panel they move (through
/// [`place_panel`]) so the geometric flags stay truthful.
pub trait MutationOperator: Send + Sync {
    /// Mutates the provided panels.
    fn mutate(
        &self,
        parent: &[PanelPlacement],
        context: &PlacementContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Vec<PanelPlacement>;
}

impl<T: MutationOperator + ?Sized> MutationOperator for &T {
    fn mutate(
        &self,
        parent: &[PanelPlacement],
        context: &PlacementContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Vec<PanelPlacement> {
        (**self).mutate(parent, context, rng)
    }
}

impl<T: MutationOperator + ?Sized> MutationOperator for Box<T> {
    fn mutate(
        &self,
        parent: &[PanelPlacement],
        context: &PlacementContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Vec<PanelPlacement> {
        (**self).mutate(parent, context, rng)
    }
}

/// Azimuth increment, in degrees, used when re-rolling a panel's facing.
pub const AZIMUTH_STEP: f64 = 5.0;
/// Largest tilt change, in degrees, applied in one step.
pub const TILT_JITTER: f64 = 2.5;
/// Largest position change, in meters, applied along each axis in one step.
pub const POSITION_JITTER: f64 = 0.5;
/// Chance that a given panel is touched once a layout is selected for mutation.
pub const PANEL_MUTATION_PROBABILITY: f64 = 0.1;

/// Small random moves of individual panels.
///
/// Each panel is touched with `panel_probability`. A touched panel moves by
/// up to `position_jitter` meters along each axis, takes the surface azimuth
/// offset by -1, 0 or +1 azimuth steps, and changes tilt by up to
/// `tilt_jitter` degrees within the allowed tilt range.
#[derive(Debug, Clone)]
pub struct JitterMutation {
    panel_probability: f64,
    position_jitter: f64,
    tilt_jitter: f64,
}

impl JitterMutation {
    /// Creates a jitter operator.
    ///
    /// # Errors
    /// Returns [`OperatorError`] when the probability lies outside `[0, 1]`
    /// or a jitter amplitude is negative or not finite.
    pub fn new(
        panel_probability: f64,
        position_jitter: f64,
        tilt_jitter: f64,
    ) -> Result<Self, OperatorError> {
        if !(panel_probability.is_finite() && (0.0..=1.0).contains(&panel_probability)) {
            return Err(OperatorError::InvalidProbability {
                operator: "jitter mutation",
                value: panel_probability,
            });
        }
        for (parameter, value) in [
            ("position jitter", position_jitter),
            ("tilt jitter", tilt_jitter),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(OperatorError::InvalidParameter {
                    operator: "jitter mutation",
                    parameter,
                    value,
                });
            }
        }
        Ok(Self {
            panel_probability,
            position_jitter,
            tilt_jitter,
        })
    }
}

impl Default for JitterMutation {
    fn default() -> Self {
        Self {
            panel_probability: PANEL_MUTATION_PROBABILITY,
            position_jitter: POSITION_JITTER,
            tilt_jitter: TILT_JITTER,
        }
    }
}

impl MutationOperator for JitterMutation {
    fn mutate(
        &self,
        parent: &[PanelPlacement],
        context: &PlacementContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Vec<PanelPlacement> {
        parent
            .iter()
            .map(|panel| {
                if rng.gen::<f64>() >= self.panel_probability {
                    return panel.clone();
                }
                let position = Position {
                    x: panel.position.x + symmetric(rng, self.position_jitter),
                    y: panel.position.y + symmetric(rng, self.position_jitter),
                    z: panel.position.z,
                };
                let orientation =
                    jitter_orientation(panel.orientation.tilt, self.tilt_jitter, context, rng);
                place_panel(
                    panel.id.clone(),
                    position,
                    orientation,
                    context.surface,
                    context.template,
                    context.constraints,
                )
            })
            .collect()
    }
}

/// Random facing near the surface's own orientation.
///
/// Used to seed initial layouts.
pub fn random_orientation(context: &PlacementContext<'_>, rng: &mut dyn RngCore) -> Orientation {
    jitter_orientation(context.surface.tilt, TILT_JITTER, context, rng)
}

fn jitter_orientation(
    tilt: f64,
    tilt_jitter: f64,
    context: &PlacementContext<'_>,
    rng: &mut dyn RngCore,
) -> Orientation {
    let steps = f64::from(rng.gen_range(-1_i32..=1));
    let azimuth = (context.surface.azimuth + steps * AZIMUTH_STEP).rem_euclid(360.0);
    let (lower, upper) = context.tilt_range();
    let tilt = (tilt + symmetric(rng, tilt_jitter)).clamp(lower, upper);
    Orientation { azimuth, tilt }
}

fn symmetric(rng: &mut dyn RngCore, amplitude: f64) -> f64 {
    (rng.gen::<f64>() * 2.0 - 1.0) * amplitude
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PanelCatalog;
    use crate::constraints::PlacementConstraints;
    use crate::geometry::{Point, Surface};
    use crate::metrics::angular_difference;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn roof() -> Surface {
        Surface::from_polygon(
            "roof",
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 10.0),
                Point::new(10.0, 10.0),
                Point::new(10.0, 0.0),
            ],
            180.0,
            20.0,
        )
    }

    fn layout(context: &PlacementContext<'_>, count: usize) -> Vec<PanelPlacement> {
        (1..=count)
            .map(|idx| {
                let x = f64::from(u32::try_from(idx).unwrap());
                place_panel(
                    format!("panel-{idx}"),
                    Position::planar(x, 5.0),
                    Orientation {
                        azimuth: 180.0,
                        tilt: 20.0,
                    },
                    context.surface,
                    context.template,
                    context.constraints,
                )
            })
            .collect()
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            JitterMutation::new(1.5, 0.5, 2.5),
            Err(OperatorError::InvalidProbability { .. })
        ));
        assert!(matches!(
            JitterMutation::new(0.1, -0.5, 2.5),
            Err(OperatorError::InvalidParameter { .. })
        ));
        assert!(matches!(
            JitterMutation::new(0.1, 0.5, f64::NAN),
            Err(OperatorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn zero_probability_keeps_the_layout() {
        let catalog = PanelCatalog::with_defaults();
        let surface = roof();
        let constraints = PlacementConstraints::default();
        let context = PlacementContext {
            surface: &surface,
            template: catalog.get("std-400").unwrap(),
            constraints: &constraints,
        };
        let parent = layout(&context, 6);
        let operator = JitterMutation::new(0.0, 0.5, 2.5).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(operator.mutate(&parent, &context, &mut rng), parent);
    }

    #[test]
    fn moves_stay_within_jitter_bounds() {
        let catalog = PanelCatalog::with_defaults();
        let surface = roof();
        let constraints = PlacementConstraints::default();
        let context = PlacementContext {
            surface: &surface,
            template: catalog.get("std-400").unwrap(),
            constraints: &constraints,
        };
        let parent = layout(&context, 8);
        let operator = JitterMutation::new(1.0, 0.5, 2.5).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let child = operator.mutate(&parent, &context, &mut rng);
        assert_eq!(child.len(), parent.len());
        let (lower, upper) = context.tilt_range();
        for (before, after) in parent.iter().zip(&child) {
            assert_eq!(before.id, after.id);
            assert!((after.position.x - before.position.x).abs() <= 0.5);
            assert!((after.position.y - before.position.y).abs() <= 0.5);
            assert!(angular_difference(after.orientation.azimuth, 180.0) <= AZIMUTH_STEP + 1e-9);
            assert!((lower..=upper).contains(&after.orientation.tilt));
            assert_eq!(after.within_surface, surface.contains(after.position.point()));
        }
    }

    #[test]
    fn random_orientation_respects_tilt_limits() {
        let catalog = PanelCatalog::with_defaults();
        let surface = Surface::from_polygon(
            "steep",
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 5.0),
                Point::new(5.0, 5.0),
                Point::new(5.0, 0.0),
            ],
            90.0,
            45.0,
        );
        let constraints = PlacementConstraints::default();
        let context = PlacementContext {
            surface: &surface,
            template: catalog.get("std-400").unwrap(),
            constraints: &constraints,
        };
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..100 {
            let orientation = random_orientation(&context, &mut rng);
            assert!(orientation.tilt <= constraints.physical.max_tilt);
            assert!(angular_difference(orientation.azimuth, 90.0) <= AZIMUTH_STEP + 1e-9);
        }
    }
}
