#![warn(missing_docs)]

/*! This is a crate for laying out solar panels on roofs. Given the roof planes of a building, a
catalog of panel modules and a set of placement constraints, it searches for panel layouts that
balance energy production, installed cost, appearance and serviceability, and reports how each
layout fares against fire-code setbacks, structural load and access rules.

The usual entry point is [`planner::optimize`]:
```
use roofplan::catalog::PanelCatalog;
use roofplan::geometry::{Point, Surface};
use roofplan::planner::{optimize, LayoutRequest};
use roofplan::options::OptionOverrides;
use roofplan::SequentialIds;

let request = LayoutRequest {
    surfaces: vec![Surface::from_polygon(
        "south",
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 9.0),
            Point::new(14.0, 9.0),
            Point::new(14.0, 0.0),
        ],
        180.0,
        30.0,
    )],
    max_panel_count: 30,
    options: OptionOverrides {
        population_size: Some(20),
        generations: Some(15),
        ..OptionOverrides::default()
    },
    seed: Some(3),
    ..LayoutRequest::default()
};
let outcome = optimize(&request, &PanelCatalog::with_defaults(), &SequentialIds::new()).unwrap();
let best = &outcome.solutions[0];
assert!(best.score() >= 0.0 && best.score() <= 100.0);
```

For a quick look before optimizing, [`preview::preview`] packs a plain grid.
!*/

pub mod catalog;
pub mod compliance;
pub mod constraints;
pub mod core;
pub mod error;
pub mod geometry;
pub mod metrics;
pub mod ops;
pub mod optimizer;
pub mod options;
pub mod planner;
pub mod preview;
pub mod ranker;

pub use crate::core::experiment::{RunReport, RunStats, TerminationReason};
pub use crate::core::{
    IdGenerator, IdKind, Metrics, Orientation, PanelPlacement, PlacementSolution, Position,
    SequentialIds, Severity, Violation, ViolationCategory,
};
pub use crate::error::{LayoutError, LayoutResult};
pub use crate::optimizer::{CancellationToken, GeneticOptimizer, StopCondition};
pub use crate::planner::{optimize, optimize_with_cancellation, LayoutOutcome, LayoutRequest};
