//! Placement constraints and their resolution against engineering defaults.
//!
//! Callers describe only what they want to change through
//! [`ConstraintOverrides`]; [`resolve`] fills every remaining field from the
//! default table so downstream code never sees a missing value.

/// Default fire-code setback from the roof edge, in meters.
pub const DEFAULT_FIRE_SETBACK: f64 = 3.0;
/// Default access pathway width, in meters.
pub const DEFAULT_ACCESS_PATHWAY_WIDTH: f64 = 0.9;
/// Default clearance around vents, in meters.
pub const DEFAULT_VENT_CLEARANCE: f64 = 0.3;
/// Default clearance below the ridge, in meters.
pub const DEFAULT_RIDGE_CLEARANCE: f64 = 0.45;
/// Default minimum gap between panels, in meters.
pub const DEFAULT_MIN_PANEL_SPACING: f64 = 0.05;
/// Default maximum panel tilt, in degrees.
pub const DEFAULT_MAX_TILT: f64 = 30.0;
/// Default clearance to obstacles, in meters.
pub const DEFAULT_MIN_OBSTACLE_CLEARANCE: f64 = 0.3;
/// Default structural capacity, in kg/m².
pub const DEFAULT_LOAD_CAPACITY: f64 = 75.0;
/// Default service clearance in front of equipment, in meters.
pub const DEFAULT_SERVICE_CLEARANCE: f64 = 0.6;

/// Regulatory distances.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setbacks {
    /// Minimum distance between a panel and the roof edge.
    pub fire_setback: f64,
    /// Width of the access pathway firefighters need.
    pub access_pathway_width: f64,
    /// Clearance around vents.
    pub vent_clearance: f64,
    /// Clearance below the ridge.
    pub ridge_clearance: f64,
}

/// Physical and structural limits.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalLimits {
    /// Minimum gap between neighbouring panels.
    pub min_panel_spacing: f64,
    /// Largest permitted tilt in degrees.
    pub max_tilt: f64,
    /// Minimum distance to obstacles.
    pub min_obstacle_clearance: f64,
    /// Structural load capacity in kg/m².
    pub load_capacity: f64,
}

/// Appearance preferences.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AestheticPreferences {
    /// All panels should share one orientation.
    pub uniform_orientation: bool,
    /// Layout should be symmetric.
    pub symmetry: bool,
    /// Avoid street-facing planes.
    pub avoid_street_visibility: bool,
    /// Follow the roofline.
    pub match_roofline: bool,
}

/// Serviceability preferences.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaintenancePreferences {
    /// Every panel must be reachable from an access pathway.
    pub access_pathways_required: bool,
    /// Clearance kept in front of serviceable equipment, in meters.
    pub service_clearance: f64,
}

/// Production-related preferences.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentalPreferences {
    /// Penalize shaded positions.
    pub minimize_shading: bool,
    /// Favor output over other objectives.
    pub optimize_production: bool,
    /// Site sees severe weather.
    pub weather_sensitive: bool,
}

/// Fully resolved constraint set for one optimization call.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementConstraints {
    /// Regulatory distances.
    pub setbacks: Setbacks,
    /// Physical limits.
    pub physical: PhysicalLimits,
    /// Appearance preferences.
    pub aesthetics: AestheticPreferences,
    /// Serviceability preferences.
    pub maintenance: MaintenancePreferences,
    /// Production preferences.
    pub environment: EnvironmentalPreferences,
}

impl Default for PlacementConstraints {
    fn default() -> Self {
        Self {
            setbacks: Setbacks {
                fire_setback: DEFAULT_FIRE_SETBACK,
                access_pathway_width: DEFAULT_ACCESS_PATHWAY_WIDTH,
                vent_clearance: DEFAULT_VENT_CLEARANCE,
                ridge_clearance: DEFAULT_RIDGE_CLEARANCE,
            },
            physical: PhysicalLimits {
                min_panel_spacing: DEFAULT_MIN_PANEL_SPACING,
                max_tilt: DEFAULT_MAX_TILT,
                min_obstacle_clearance: DEFAULT_MIN_OBSTACLE_CLEARANCE,
                load_capacity: DEFAULT_LOAD_CAPACITY,
            },
            aesthetics: AestheticPreferences {
                uniform_orientation: true,
                symmetry: false,
                avoid_street_visibility: false,
                match_roofline: true,
            },
            maintenance: MaintenancePreferences {
                access_pathways_required: true,
                service_clearance: DEFAULT_SERVICE_CLEARANCE,
            },
            environment: EnvironmentalPreferences {
                minimize_shading: true,
                optimize_production: true,
                weather_sensitive: false,
            },
        }
    }
}

impl PlacementConstraints {
    /// Distance from the roof edge inside which no panel may sit.
    ///
    /// Access pathways widen the keep-out band when they are required.
    #[must_use]
    pub fn edge_keep_out(&self) -> f64 {
        if self.maintenance.access_pathways_required {
            self.setbacks
                .fire_setback
                .max(self.setbacks.access_pathway_width)
        } else {
            self.setbacks.fire_setback
        }
    }
}

/// Partial [`Setbacks`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[allow(missing_docs)]
pub struct SetbackOverrides {
    pub fire_setback: Option<f64>,
    pub access_pathway_width: Option<f64>,
    pub vent_clearance: Option<f64>,
    pub ridge_clearance: Option<f64>,
}

/// Partial [`PhysicalLimits`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[allow(missing_docs)]
pub struct PhysicalOverrides {
    pub min_panel_spacing: Option<f64>,
    pub max_tilt: Option<f64>,
    pub min_obstacle_clearance: Option<f64>,
    pub load_capacity: Option<f64>,
}

/// Partial [`AestheticPreferences`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct AestheticOverrides {
    pub uniform_orientation: Option<bool>,
    pub symmetry: Option<bool>,
    pub avoid_street_visibility: Option<bool>,
    pub match_roofline: Option<bool>,
}

/// Partial [`MaintenancePreferences`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[allow(missing_docs)]
pub struct MaintenanceOverrides {
    pub access_pathways_required: Option<bool>,
    pub service_clearance: Option<f64>,
}

/// Partial [`EnvironmentalPreferences`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct EnvironmentalOverrides {
    pub minimize_shading: Option<bool>,
    pub optimize_production: Option<bool>,
    pub weather_sensitive: Option<bool>,
}

/// Caller-supplied partial constraints. Every field is optional.
///
/// # Examples
/// ```
/// use roofplan::constraints::{resolve, ConstraintOverrides, DEFAULT_FIRE_SETBACK};
///
/// let mut overrides = ConstraintOverrides::default();
/// overrides.physical.load_capacity = Some(40.0);
/// let constraints = resolve(&overrides);
/// assert_eq!(constraints.physical.load_capacity, 40.0);
/// assert_eq!(constraints.setbacks.fire_setback, DEFAULT_FIRE_SETBACK);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[allow(missing_docs)]
pub struct ConstraintOverrides {
    pub setbacks: SetbackOverrides,
    pub physical: PhysicalOverrides,
    pub aesthetics: AestheticOverrides,
    pub maintenance: MaintenanceOverrides,
    pub environment: EnvironmentalOverrides,
}

/// Deep-merges `overrides` over [`PlacementConstraints::default`].
#[must_use]
pub fn resolve(overrides: &ConstraintOverrides) -> PlacementConstraints {
    let base = PlacementConstraints::default();
    let s = &overrides.setbacks;
    let p = &overrides.physical;
    let a = &overrides.aesthetics;
    let m = &overrides.maintenance;
    let e = &overrides.environment;
    PlacementConstraints {
        setbacks: Setbacks {
            fire_setback: s.fire_setback.unwrap_or(base.setbacks.fire_setback),
            access_pathway_width: s
                .access_pathway_width
                .unwrap_or(base.setbacks.access_pathway_width),
            vent_clearance: s.vent_clearance.unwrap_or(base.setbacks.vent_clearance),
            ridge_clearance: s.ridge_clearance.unwrap_or(base.setbacks.ridge_clearance),
        },
        physical: PhysicalLimits {
            min_panel_spacing: p
                .min_panel_spacing
                .unwrap_or(base.physical.min_panel_spacing),
            max_tilt: p.max_tilt.unwrap_or(base.physical.max_tilt),
            min_obstacle_clearance: p
                .min_obstacle_clearance
                .unwrap_or(base.physical.min_obstacle_clearance),
            load_capacity: p.load_capacity.unwrap_or(base.physical.load_capacity),
        },
        aesthetics: AestheticPreferences {
            uniform_orientation: a
                .uniform_orientation
                .unwrap_or(base.aesthetics.uniform_orientation),
            symmetry: a.symmetry.unwrap_or(base.aesthetics.symmetry),
            avoid_street_visibility: a
                .avoid_street_visibility
                .unwrap_or(base.aesthetics.avoid_street_visibility),
            match_roofline: a.match_roofline.unwrap_or(base.aesthetics.match_roofline),
        },
        maintenance: MaintenancePreferences {
            access_pathways_required: m
                .access_pathways_required
                .unwrap_or(base.maintenance.access_pathways_required),
            service_clearance: m
                .service_clearance
                .unwrap_or(base.maintenance.service_clearance),
        },
        environment: EnvironmentalPreferences {
            minimize_shading: e
                .minimize_shading
                .unwrap_or(base.environment.minimize_shading),
            optimize_production: e
                .optimize_production
                .unwrap_or(base.environment.optimize_production),
            weather_sensitive: e
                .weather_sensitive
                .unwrap_or(base.environment.weather_sensitive),
        },
    }
}
