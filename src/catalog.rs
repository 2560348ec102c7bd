//! Registry of placeable panel templates.
//!
//! A [`PanelCatalog`] is an explicit value handed to the optimizer, so
//! independent runs can use independent catalogs. Templates are append-only:
//! once registered they are never edited or removed.

use thiserror::Error;
use tracing::{debug, warn};

/// Physical size of a module in meters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    /// Short side, laid along x.
    pub width: f64,
    /// Long side, laid along y.
    pub height: f64,
    /// Frame depth.
    pub thickness: f64,
}

impl Dimensions {
    /// Footprint area in square meters.
    #[must_use]
    pub fn footprint(&self) -> f64 {
        self.width * self.height
    }
}

/// Electrical and mass ratings of a module.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectricalSpec {
    /// Rated power in watts.
    pub rated_power: f64,
    /// Conversion efficiency as a fraction.
    pub efficiency: f64,
    /// Power temperature coefficient in %/°C.
    pub temperature_coefficient: f64,
    /// Maximum-power voltage.
    pub voltage: f64,
    /// Maximum-power current.
    pub current: f64,
    /// Module mass in kilograms.
    pub weight: f64,
}

/// How a module attaches to the roof.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountingType {
    /// Parallel to the roof plane.
    Flush,
    /// Raised on tilt legs.
    Tilted,
    /// Weighted, non-penetrating racking.
    Ballasted,
}

/// Mounting limits of a module.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountingSpec {
    /// Racking style.
    pub mounting_type: MountingType,
    /// Lowest supported tilt in degrees.
    pub min_tilt: f64,
    /// Highest supported tilt in degrees.
    pub max_tilt: f64,
    /// Manufacturer's minimum distance to a roof edge in meters.
    pub edge_setback: f64,
}

/// A catalog entry describing one placeable module.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PanelTemplate {
    /// Unique identity within a catalog.
    pub id: String,
    /// Manufacturer label.
    pub manufacturer: String,
    /// Model label.
    pub model: String,
    /// Physical size.
    pub dimensions: Dimensions,
    /// Electrical ratings.
    pub electrical: ElectricalSpec,
    /// Mounting limits.
    pub mounting: MountingSpec,
}

impl PanelTemplate {
    /// Mass per footprint area in kg/m².
    #[must_use]
    pub fn areal_load(&self) -> f64 {
        let footprint = self.dimensions.footprint();
        if footprint > 0.0 {
            self.electrical.weight / footprint
        } else {
            0.0
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let checks = [
            ("width", self.dimensions.width),
            ("height", self.dimensions.height),
            ("rated_power", self.electrical.rated_power),
        ];
        for (field, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(CatalogError::InvalidTemplate {
                    id: self.id.clone(),
                    field,
                    value,
                });
            }
        }
        if !(self.electrical.weight.is_finite() && self.electrical.weight >= 0.0) {
            return Err(CatalogError::InvalidTemplate {
                id: self.id.clone(),
                field: "weight",
                value: self.electrical.weight,
            });
        }
        if self.mounting.min_tilt > self.mounting.max_tilt {
            return Err(CatalogError::InvalidTemplate {
                id: self.id.clone(),
                field: "min_tilt",
                value: self.mounting.min_tilt,
            });
        }
        Ok(())
    }
}

/// Errors produced by catalog operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    /// The catalog has no entry with this id.
    #[error("no panel template registered with id `{0}`")]
    UnknownTemplate(String),
    /// A template with this id already exists.
    #[error("panel template `{0}` is already registered")]
    DuplicateTemplate(String),
    /// A template field is out of range.
    #[error("panel template `{id}` has invalid {field} ({value})")]
    InvalidTemplate {
        /// Template identity.
        id: String,
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
    /// The catalog holds no templates at all.
    #[error("panel catalog is empty")]
    Empty,
}

/// Append-only registry of [`PanelTemplate`]s.
///
/// # Examples
/// ```
/// use roofplan::catalog::PanelCatalog;
///
/// let catalog = PanelCatalog::with_defaults();
/// assert!(!catalog.is_empty());
/// let first = &catalog.templates()[0];
/// assert_eq!(catalog.get(&first.id).unwrap(), first);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelCatalog {
    templates: Vec<PanelTemplate>,
}

impl PanelCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog seeded with common residential modules.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            templates: default_templates(),
        }
    }

    /// Registered templates in insertion order.
    #[must_use]
    pub fn templates(&self) -> &[PanelTemplate] {
        &self.templates
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalog holds no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Looks up a template by id.
    ///
    /// # Errors
    /// Returns [`CatalogError::UnknownTemplate`] when no entry matches.
    pub fn get(&self, id: &str) -> Result<&PanelTemplate, CatalogError> {
        self.templates
            .iter()
            .find(|template| template.id == id)
            .ok_or_else(|| CatalogError::UnknownTemplate(id.to_owned()))
    }

    /// Appends a new template.
    ///
    /// # Errors
    /// Returns [`CatalogError::DuplicateTemplate`] when the id is taken and
    /// [`CatalogError::InvalidTemplate`] for non-positive sizes or power.
    pub fn register(&mut self, template: PanelTemplate) -> Result<(), CatalogError> {
        if self.templates.iter().any(|existing| existing.id == template.id) {
            warn!(id = %template.id, "rejected duplicate panel template");
            return Err(CatalogError::DuplicateTemplate(template.id));
        }
        template.validate()?;
        debug!(id = %template.id, "registered panel template");
        self.templates.push(template);
        Ok(())
    }
}

fn default_templates() -> Vec<PanelTemplate> {
    let residential = |id: &str, manufacturer: &str, model: &str, power: f64, efficiency: f64| {
        PanelTemplate {
            id: id.to_owned(),
            manufacturer: manufacturer.to_owned(),
            model: model.to_owned(),
            dimensions: Dimensions {
                width: 1.0,
                height: 2.0,
                thickness: 0.035,
            },
            electrical: ElectricalSpec {
                rated_power: power,
                efficiency,
                temperature_coefficient: -0.35,
                voltage: 41.0,
                current: power / 41.0,
                weight: 22.0,
            },
            mounting: MountingSpec {
                mounting_type: MountingType::Flush,
                min_tilt: 0.0,
                max_tilt: 60.0,
                edge_setback: 0.3,
            },
        }
    };
    vec![
        residential("std-400", "Generic", "Mono 400", 400.0, 0.20),
        residential("hi-430", "Generic", "Mono HE 430", 430.0, 0.215),
        PanelTemplate {
            id: "compact-360".to_owned(),
            manufacturer: "Generic".to_owned(),
            model: "Compact 360".to_owned(),
            dimensions: Dimensions {
                width: 1.0,
                height: 1.75,
                thickness: 0.03,
            },
            electrical: ElectricalSpec {
                rated_power: 360.0,
                efficiency: 0.205,
                temperature_coefficient: -0.34,
                voltage: 37.5,
                current: 9.6,
                weight: 19.5,
            },
            mounting: MountingSpec {
                mounting_type: MountingType::Tilted,
                min_tilt: 5.0,
                max_tilt: 45.0,
                edge_setback: 0.3,
            },
        },
    ]
}
