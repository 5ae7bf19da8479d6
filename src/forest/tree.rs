//! CART decision tree
//!
//! Nodes live in a flat vector; the root is node 0. A sample goes left when
//! its feature value is `<=` the split threshold. Leaves store the mean
//! target of their training samples, which for 0/1 labels is the positive
//! class fraction.

use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::MaxFeatures;
use crate::types::EPSILON;

/// Split quality measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    /// Gini impurity, for 0/1 targets
    Gini,
    /// Squared error, for continuous targets
    SquaredError,
}

impl Criterion {
    /// Impurity of a node from its running sums
    pub fn impurity(self, count: f64, sum: f64, sum_sq: f64) -> f64 {
        if count <= 0.0 {
            return 0.0;
        }
        let mean = sum / count;
        match self {
            Criterion::Gini => 2.0 * mean * (1.0 - mean),
            Criterion::SquaredError => (sum_sq / count - mean * mean).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeParams {
    pub criterion: Criterion,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    /// Unnormalised weighted impurity decrease per feature
    importances: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// n_left * impurity_left + n_right * impurity_right
    weighted_impurity: f64,
}

struct GrowContext<'a, R: Rng> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    params: &'a TreeParams,
    rng: &'a mut R,
}

impl DecisionTree {
    /// Grow a tree over the rows named by `samples` (duplicates allowed).
    ///
    /// Inputs are assumed validated: non-empty, rectangular, finite.
    pub fn fit<R: Rng>(
        x: &[Vec<f64>],
        y: &[f64],
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let n_features = x.first().map(|row| row.len()).unwrap_or(0);
        let mut tree = Self {
            nodes: Vec::new(),
            n_features,
            importances: vec![0.0; n_features],
        };
        let mut ctx = GrowContext { x, y, params, rng };
        tree.grow(&mut ctx, samples, 0);
        tree
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    pub fn raw_importances(&self) -> &[f64] {
        &self.importances
    }

    fn depth_from(&self, idx: usize) -> usize {
        match self.nodes.get(idx) {
            Some(TreeNode::Split { left, right, .. }) => {
                1 + self.depth_from(*left).max(self.depth_from(*right))
            }
            _ => 0,
        }
    }

    fn grow<R: Rng>(&mut self, ctx: &mut GrowContext<'_, R>, samples: Vec<usize>, depth: usize) -> usize {
        let (count, sum, sum_sq) = Self::sums(ctx.y, &samples);
        let impurity = ctx.params.criterion.impurity(count, sum, sum_sq);

        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf { value: sum / count.max(1.0) });

        let depth_reached = ctx.params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || samples.len() < ctx.params.min_samples_split || impurity <= EPSILON {
            return idx;
        }

        let Some(split) = self.best_split(ctx, &samples, count * impurity) else {
            return idx;
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&i| ctx.x[i][split.feature] <= split.threshold);

        self.importances[split.feature] += count * impurity - split.weighted_impurity;

        let left = self.grow(ctx, left_samples, depth + 1);
        let right = self.grow(ctx, right_samples, depth + 1);
        self.nodes[idx] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    /// Best split over a random feature subset, if any strictly reduces impurity
    fn best_split<R: Rng>(
        &self,
        ctx: &mut GrowContext<'_, R>,
        samples: &[usize],
        parent_weighted: f64,
    ) -> Option<SplitCandidate> {
        let k = ctx.params.max_features.resolve(self.n_features);
        let features = sample(&mut *ctx.rng, self.n_features, k);
        let min_leaf = ctx.params.min_samples_leaf.max(1);
        let criterion = ctx.params.criterion;

        let (total_count, total_sum, total_sq) = Self::sums(ctx.y, samples);
        let mut best: Option<SplitCandidate> = None;

        for feature in features.into_iter() {
            let mut order = samples.to_vec();
            order.sort_by(|&a, &b| ctx.x[a][feature].total_cmp(&ctx.x[b][feature]));

            let (mut left_count, mut left_sum, mut left_sq) = (0.0, 0.0, 0.0);
            for pos in 0..order.len() - 1 {
                let yi = ctx.y[order[pos]];
                left_count += 1.0;
                left_sum += yi;
                left_sq += yi * yi;

                let here = ctx.x[order[pos]][feature];
                let next = ctx.x[order[pos + 1]][feature];
                if next <= here {
                    continue;
                }

                let right_count = total_count - left_count;
                if (left_count as usize) < min_leaf || (right_count as usize) < min_leaf {
                    continue;
                }

                let weighted = left_count * criterion.impurity(left_count, left_sum, left_sq)
                    + right_count
                        * criterion.impurity(right_count, total_sum - left_sum, total_sq - left_sq);

                if best.map_or(true, |b| weighted < b.weighted_impurity) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        weighted_impurity: weighted,
                    });
                }
            }
        }

        best.filter(|b| b.weighted_impurity < parent_weighted - EPSILON)
    }

    fn sums(y: &[f64], samples: &[usize]) -> (f64, f64, f64) {
        samples.iter().fold((0.0, 0.0, 0.0), |(c, s, sq), &i| {
            (c + 1.0, s + y[i], sq + y[i] * y[i])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params(criterion: Criterion) -> TreeParams {
        TreeParams {
            criterion,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
        }
    }

    #[test]
    fn test_gini_impurity() {
        assert!((Criterion::Gini.impurity(4.0, 2.0, 2.0) - 0.5).abs() < EPSILON);
        assert_eq!(Criterion::Gini.impurity(4.0, 4.0, 4.0), 0.0);
        assert_eq!(Criterion::Gini.impurity(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_squared_error_impurity() {
        // values 1, 3 → mean 2, variance 1
        assert!((Criterion::SquaredError.impurity(2.0, 4.0, 10.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_separable_classification() {
        let x = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![0.0, 0.0, 1.0, 1.0];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, (0..4).collect(), &params(Criterion::Gini), &mut rng);

        assert_eq!(tree.predict(&[0.5]), 0.0);
        assert_eq!(tree.predict(&[2.5]), 1.0);
        assert_eq!(tree.predict(&[1.5]), 0.0);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_nodes(), 3);
        assert!(tree.raw_importances()[0] > 0.0);
    }

    #[test]
    fn test_regression_means() {
        let x = vec![vec![0.0], vec![0.0], vec![5.0], vec![5.0]];
        let y = vec![1.0, 3.0, 10.0, 12.0];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, (0..4).collect(), &params(Criterion::SquaredError), &mut rng);

        assert!((tree.predict(&[0.0]) - 2.0).abs() < EPSILON);
        assert!((tree.predict(&[6.0]) - 11.0).abs() < EPSILON);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![1.0, 1.0];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, vec![0, 1], &params(Criterion::Gini), &mut rng);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict(&[42.0]), 1.0);
    }

    #[test]
    fn test_max_depth() {
        let x: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..8).map(|i| (i % 2) as f64).collect();
        let mut p = params(Criterion::Gini);
        p.max_depth = Some(2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, (0..8).collect(), &p, &mut rng);
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_constant_features_cannot_split() {
        let x = vec![vec![1.0], vec![1.0], vec![1.0]];
        let y = vec![0.0, 1.0, 1.0];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, vec![0, 1, 2], &params(Criterion::Gini), &mut rng);
        assert_eq!(tree.n_nodes(), 1);
        assert!((tree.predict(&[1.0]) - 2.0 / 3.0).abs() < EPSILON);
    }
}
