//! Train/test splitting
//!
//! Two strategies hold out a fraction of the rows for evaluation:
//! chronological keeps the trailing rows as the test set (no shuffling, so
//! the model is never evaluated on the past), shuffled draws a seeded random
//! permutation.

use crate::error::{ModelError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default seed for the shuffled split.
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// How rows are assigned to the test set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Trailing rows form the test set
    #[default]
    Chronological,
    /// Seeded random permutation
    Shuffled {
        /// RNG seed
        seed: u64,
    },
}

impl fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chronological => write!(f, "chronological"),
            Self::Shuffled { seed } => write!(f, "shuffled (seed {})", seed),
        }
    }
}

/// Row indices of a train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    /// Training rows
    pub train: Vec<usize>,
    /// Held-out rows
    pub test: Vec<usize>,
}

/// Number of held-out rows: `ceil(n * fraction)`, leaving at least one training row.
pub fn test_size(n_samples: usize, test_fraction: f64) -> usize {
    let raw = (n_samples as f64 * test_fraction).ceil() as usize;
    raw.clamp(1, n_samples.saturating_sub(1).max(1))
}

/// Split `n_samples` row indices.
///
/// Rows are assumed to be in chronological order for
/// [`SplitStrategy::Chronological`].
pub fn train_test_split(
    n_samples: usize,
    test_fraction: f64,
    strategy: SplitStrategy,
) -> Result<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ModelError::InvalidParameter(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    if n_samples < 2 {
        return Err(ModelError::InsufficientData {
            required: 2,
            actual: n_samples,
        });
    }

    let n_test = test_size(n_samples, test_fraction);
    let n_train = n_samples - n_test;

    let split = match strategy {
        SplitStrategy::Chronological => TrainTestSplit {
            train: (0..n_train).collect(),
            test: (n_train..n_samples).collect(),
        },
        SplitStrategy::Shuffled { seed } => {
            let mut indices: Vec<usize> = (0..n_samples).collect();
            let mut rng = StdRng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
            let train = indices.split_off(n_test);
            TrainTestSplit {
                train,
                test: indices,
            }
        }
    };

    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case(5, 0.2, 1)]
    #[case(10, 0.2, 2)]
    #[case(11, 0.2, 3)]
    #[case(2, 0.2, 1)]
    #[case(3, 0.9, 2)]
    fn test_test_size(#[case] n: usize, #[case] fraction: f64, #[case] expected: usize) {
        assert_eq!(test_size(n, fraction), expected);
    }

    #[test]
    fn test_chronological_keeps_tail() {
        let split = train_test_split(10, 0.2, SplitStrategy::Chronological).unwrap();
        assert_eq!(split.train, (0..8).collect::<Vec<_>>());
        assert_eq!(split.test, vec![8, 9]);
    }

    #[test]
    fn test_shuffled_is_partition_and_deterministic() {
        let strategy = SplitStrategy::Shuffled { seed: 42 };
        let a = train_test_split(50, 0.2, strategy).unwrap();
        let b = train_test_split(50, 0.2, strategy).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.test.len(), 10);
        assert_eq!(a.train.len(), 40);

        let all: HashSet<usize> = a.train.iter().chain(a.test.iter()).copied().collect();
        assert_eq!(all.len(), 50);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(train_test_split(10, 0.0, SplitStrategy::Chronological).is_err());
        assert!(train_test_split(10, 1.0, SplitStrategy::Chronological).is_err());
        assert!(matches!(
            train_test_split(1, 0.2, SplitStrategy::Chronological),
            Err(ModelError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(SplitStrategy::Chronological.to_string(), "chronological");
        assert_eq!(
            SplitStrategy::Shuffled { seed: 7 }.to_string(),
            "shuffled (seed 7)"
        );
    }
}
