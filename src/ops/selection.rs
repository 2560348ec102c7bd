//! Parent selection over scored populations.

use crate::core::PlacementSolution;
use crate::ops::OperatorError;
use rand::{Rng, RngCore};

/// Picks parents from a population according to their scores.
///
/// # Examples
/// ```
/// use roofplan::ops::SelectionOperator;
/// use rand::thread_rng;
///
/// struct BestOnly;
///
/// impl SelectionOperator for BestOnly {
///     fn select_index(&self, scores: &[f64], _rng: &mut dyn rand::RngCore) -> Option<usize> {
///         scores
///             .iter()
///             .enumerate()
///             .max_by(|(_, a), (_, b)| a.total_cmp(b))
///             .map(|(idx, _)| idx)
///     }
/// }
///
/// let mut rng = thread_rng();
/// assert_eq!(BestOnly.select_index(&[10.0, 90.0, 40.0], &mut rng), Some(1));
/// ```
pub trait SelectionOperator: Send + Sync {
    /// Returns the index of the candidate to use as a parent.
    fn select_index(&self, scores: &[f64], rng: &mut dyn RngCore) -> Option<usize>;

    /// Picks a parent directly from the population.
    fn select<'a>(
        &self,
        population: &'a [PlacementSolution],
        rng: &mut dyn RngCore,
    ) -> Option<&'a PlacementSolution> {
        let scores: Vec<f64> = population.iter().map(PlacementSolution::score).collect();
        let idx = self.select_index(&scores, rng)?;
        population.get(idx)
    }

    /// Samples two parents independently.
    fn select_pair(&self, scores: &[f64], rng: &mut dyn RngCore) -> Option<(usize, usize)> {
        let first = self.select_index(scores, rng)?;
        let second = self.select_index(scores, rng)?;
        Some((first, second))
    }
}

impl<T: SelectionOperator + ?Sized> SelectionOperator for &T {
    fn select_index(&self, scores: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        (**self).select_index(scores, rng)
    }
}

impl<T: SelectionOperator + ?Sized> SelectionOperator for Box<T> {
    fn select_index(&self, scores: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        (**self).select_index(scores, rng)
    }
}

/// Tournament selection: draw `size` candidates uniformly with replacement
/// and keep the highest scoring one.
#[derive(Debug, Clone)]
pub struct TournamentSelection {
    size: usize,
}

impl TournamentSelection {
    /// Tournament size used by the default optimizer.
    pub const DEFAULT_SIZE: usize = 3;

    /// Creates a tournament of the given size.
    ///
    /// # Errors
    /// Returns [`OperatorError::InvalidTournamentSize`] when `size` is zero.
    pub fn new(size: usize) -> Result<Self, OperatorError> {
        if size == 0 {
            return Err(OperatorError::InvalidTournamentSize(size));
        }
        Ok(Self { size })
    }

    /// Number of contestants per tournament.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self {
            size: Self::DEFAULT_SIZE,
        }
    }
}

impl SelectionOperator for TournamentSelection {
    fn select_index(&self, scores: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        if scores.is_empty() {
            return None;
        }
        let mut winner = rng.gen_range(0..scores.len());
        for _ in 1..self.size {
            let challenger = rng.gen_range(0..scores.len());
            if scores[challenger] > scores[winner] {
                winner = challenger;
            }
        }
        Some(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Metrics;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn empty_population_has_no_parent() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(TournamentSelection::default().select_index(&[], &mut rng), None);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(
            TournamentSelection::new(0).unwrap_err(),
            OperatorError::InvalidTournamentSize(0)
        );
    }

    #[test]
    fn large_tournaments_favour_the_best() {
        let operator = TournamentSelection::new(64).unwrap();
        let scores = [5.0, 80.0, 20.0, 40.0];
        let mut rng = StdRng::seed_from_u64(7);
        let wins = (0..200)
            .filter(|_| operator.select_index(&scores, &mut rng) == Some(1))
            .count();
        assert!(wins > 190, "best candidate won only {wins} times");
    }

    #[test]
    fn indices_stay_in_bounds() {
        let operator = TournamentSelection::default();
        let scores = [1.0, 2.0, 3.0];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let (a, b) = operator.select_pair(&scores, &mut rng).unwrap();
            assert!(a < scores.len() && b < scores.len());
        }
    }

    #[test]
    fn select_returns_population_member() {
        let population = vec![
            PlacementSolution::new("a", Vec::new(), Metrics::default(), 10.0),
            PlacementSolution::new("b", Vec::new(), Metrics::default(), 90.0),
        ];
        let operator = TournamentSelection::new(32).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let parent = operator.select(&population, &mut rng).unwrap();
        assert_eq!(parent.id(), "b");
    }
}
