//! Crate-level error type.

use crate::catalog::CatalogError;
use crate::geometry::SurfaceError;
use crate::optimizer::OptimizerError;
use thiserror::Error;

/// Convenience alias for results returned by the planner.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Any failure surfaced by the public entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// A roof surface is missing or malformed.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    /// A panel template is missing or malformed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// The search could not be configured or run.
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_pass_through() {
        let error = LayoutError::from(CatalogError::UnknownTemplate("ghost".to_owned()));
        assert_eq!(
            error.to_string(),
            "no panel template registered with id `ghost`"
        );
        let error = LayoutError::from(OptimizerError::InvalidMaxPanelCount);
        assert!(error.to_string().contains("max panel count"));
    }
}
