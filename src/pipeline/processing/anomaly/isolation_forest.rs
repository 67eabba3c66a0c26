//! Isolation forest (Liu, Ting & Zhou, 2008).
//!
//! Anomalies are few and different, so random axis-aligned splits isolate
//! them in fewer steps than normal points. The score averages path lengths
//! over many trees built on small random sub-samples.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use super::AnomalyModel;
use crate::error::ComputationError;

const EULER_GAMMA: f64 = 0.577_215_664_9;

#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_samples: usize,
    pub seed: u64,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    config: ForestConfig,
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            sample_size: 0,
        }
    }

    /// Sub-sample size actually used by the fitted trees
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn build(data: &[Vec<f64>], rows: Vec<usize>, depth: usize, limit: usize, rng: &mut StdRng) -> Node {
        if depth >= limit || rows.len() <= 1 {
            return Node::Leaf { size: rows.len() };
        }

        let width = data[rows[0]].len();
        let mut candidates = Vec::with_capacity(width);
        for feature in 0..width {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = data[r][feature];
                (lo.min(v), hi.max(v))
            });
            if hi > lo {
                candidates.push((feature, lo, hi));
            }
        }
        if candidates.is_empty() {
            return Node::Leaf { size: rows.len() };
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        // threshold in [lo, hi): the minimum always goes left, the maximum right
        let threshold = rng.gen_range(lo..hi);
        let (left, right): (Vec<usize>, Vec<usize>) = rows.into_iter().partition(|&r| data[r][feature] <= threshold);

        Node::Split {
            feature,
            threshold,
            left: Box::new(Self::build(data, left, depth + 1, limit, rng)),
            right: Box::new(Self::build(data, right, depth + 1, limit, rng)),
        }
    }

    fn path_length(node: &Node, sample: &[f64], depth: usize) -> f64 {
        match node {
            Node::Leaf { size } => depth as f64 + average_path_length(*size),
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let next = if sample[*feature] <= *threshold { left } else { right };
                Self::path_length(next, sample, depth + 1)
            }
        }
    }
}

impl AnomalyModel for IsolationForest {
    fn fit(&mut self, data: &[Vec<f64>]) -> Result<(), ComputationError> {
        let n = data.len();
        if n < 2 {
            return Err(ComputationError::InsufficientRows { needed: 2, found: n });
        }

        let sample_size = self.config.max_samples.min(n).max(2);
        let limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        self.trees = (0..self.config.n_trees)
            .map(|_| {
                let rows = index::sample(&mut rng, n, sample_size).into_vec();
                Self::build(data, rows, 0, limit, &mut rng)
            })
            .collect();
        self.sample_size = sample_size;
        Ok(())
    }

    fn score(&self, sample: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let mean_path = self
            .trees
            .iter()
            .map(|t| Self::path_length(t, sample, 0))
            .sum::<f64>()
            / self.trees.len() as f64;
        2f64.powf(-mean_path / average_path_length(self.sample_size))
    }

    fn name(&self) -> &str {
        "isolation_forest"
    }

    fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }
}

/// Average path length of an unsuccessful BST search over `n` points,
/// used to normalise depths.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest(seed: u64) -> IsolationForest {
        IsolationForest::new(ForestConfig {
            n_trees: 100,
            max_samples: 256,
            seed,
        })
    }

    fn cluster_with_outlier() -> Vec<Vec<f64>> {
        let mut data: Vec<Vec<f64>> = (0..60)
            .map(|i| {
                let t = i as f64 / 60.0;
                vec![t.sin() * 0.5, t.cos() * 0.5]
            })
            .collect();
        data.push(vec![8.0, -8.0]);
        data
    }

    #[test]
    fn outlier_scores_highest() {
        let data = cluster_with_outlier();
        let mut model = forest(42);
        model.fit(&data).unwrap();
        let scores: Vec<f64> = data.iter().map(|r| model.score(r)).collect();
        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(best, data.len() - 1);
        assert!(scores.iter().all(|s| *s > 0.0 && *s <= 1.0));
    }

    #[test]
    fn same_seed_same_scores() {
        let data = cluster_with_outlier();
        let mut a = forest(7);
        let mut b = forest(7);
        a.fit(&data).unwrap();
        b.fit(&data).unwrap();
        for row in &data {
            assert_eq!(a.score(row), b.score(row));
        }
    }

    #[test]
    fn sample_size_is_capped_at_row_count() {
        let data = cluster_with_outlier();
        let mut model = forest(1);
        model.fit(&data).unwrap();
        assert_eq!(model.sample_size(), data.len());
    }

    #[test]
    fn single_row_cannot_be_fitted() {
        let mut model = forest(1);
        assert_eq!(
            model.fit(&[vec![1.0]]).unwrap_err(),
            ComputationError::InsufficientRows { needed: 2, found: 1 }
        );
    }

    #[test]
    fn average_path_length_matches_reference_values() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(256) is about 10.24
        assert!((average_path_length(256) - 10.24).abs() < 0.01);
    }
}
