//! Recombination of panel lists.

use crate::core::PanelPlacement;
use rand::{Rng, RngCore};

/// Produces a child layout by mixing the panels of two parents.
///
/// Children are new values: implementations clone panels out of the parents
/// and never hand back shared storage.
///
/// # Examples
/// ```
/// use roofplan::core::PanelPlacement;
/// use roofplan::ops::CrossoverOperator;
///
/// struct KeepFirst;
///
/// impl CrossoverOperator for KeepFirst {
///     fn crossover(
///         &self,
///         parent_a: &[PanelPlacement],
///         _parent_b: &[PanelPlacement],
///         _rng: &mut dyn rand::RngCore,
///     ) -> Vec<PanelPlacement> {
///         parent_a.to_vec()
///     }
/// }
///
/// let mut rng = rand::thread_rng();
/// assert!(KeepFirst.crossover(&[], &[], &mut rng).is_empty());
/// ```
pub trait CrossoverOperator: Send + Sync {
    /// Combines two parent panel lists into one child.
    fn crossover(
        &self,
        parent_a: &[PanelPlacement],
        parent_b: &[PanelPlacement],
        rng: &mut dyn RngCore,
    ) -> Vec<PanelPlacement>;
}

impl<T: CrossoverOperator + ?Sized> CrossoverOperator for &T {
    fn crossover(
        &self,
        parent_a: &[PanelPlacement],
        parent_b: &[PanelPlacement],
        rng: &mut dyn RngCore,
    ) -> Vec<PanelPlacement> {
        (**self).crossover(parent_a, parent_b, rng)
    }
}

impl<T: CrossoverOperator + ?Sized> CrossoverOperator for Box<T> {
    fn crossover(
        &self,
        parent_a: &[PanelPlacement],
        parent_b: &[PanelPlacement],
        rng: &mut dyn RngCore,
    ) -> Vec<PanelPlacement> {
        (**self).crossover(parent_a, parent_b, rng)
    }
}

/// Single-point crossover on the panel sequence.
///
/// A cut is drawn in `[0, min(len_a, len_b)]`; the child takes the first
/// parent's panels before the cut and the second parent's panels after it,
/// so its length always equals `len_b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePointCrossover;

impl CrossoverOperator for SinglePointCrossover {
    fn crossover(
        &self,
        parent_a: &[PanelPlacement],
        parent_b: &[PanelPlacement],
        rng: &mut dyn RngCore,
    ) -> Vec<PanelPlacement> {
        let shortest = parent_a.len().min(parent_b.len());
        let cut = rng.gen_range(0..=shortest);
        parent_a[..cut]
            .iter()
            .chain(parent_b[cut..].iter())
            .cloned()
            .collect()
    }
}
