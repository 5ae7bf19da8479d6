//! Random Forest Estimators
//!
//! Bagged CART ensembles behind two small capability traits so the models
//! only depend on `fit` / `predict_proba` / `predict` semantics:
//! - [`ProbabilisticClassifier`] - binary classifier with positive-class probability
//! - [`Regressor`] - continuous regressor
//!
//! Each tree draws its bootstrap sample and its split features from its own
//! `ChaCha8Rng` seeded with `seed + tree_index`, so a forest is fully
//! determined by its parameters and training data, whether the trees are
//! built serially or on the rayon pool.

pub mod tree;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ForestParams;
use crate::error::EstimatorError;
use crate::sanitize::{validate_matrix, validate_targets};

pub use tree::{Criterion, DecisionTree, TreeNode, TreeParams};

// ==================== Capability Traits ====================

/// Binary classifier exposing the probability of the positive class
pub trait ProbabilisticClassifier: Send + Sync {
    fn fit(&mut self, x: &[Vec<f64>], y: &[bool]) -> Result<(), EstimatorError>;

    fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, EstimatorError>;

    /// Normalised feature importances; empty when not fitted
    fn feature_importances(&self) -> Vec<f64> {
        Vec::new()
    }
}

/// Continuous regressor
pub trait Regressor: Send + Sync {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), EstimatorError>;

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, EstimatorError>;

    fn feature_importances(&self) -> Vec<f64> {
        Vec::new()
    }
}

// ==================== Forest ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    criterion: Criterion,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn new(params: ForestParams, criterion: Criterion) -> Self {
        Self {
            params,
            criterion,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    /// Fit on validated data; previous trees are discarded even on failure
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), EstimatorError> {
        self.trees.clear();
        self.n_features = 0;

        let d = validate_matrix(x)?;
        validate_targets(x.len(), y)?;

        let tree_params = TreeParams {
            criterion: self.criterion,
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: self.params.max_features,
        };
        let n_trees = self.params.n_trees.max(1);
        let seed = self.params.seed;

        let build = |tree_index: usize| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(tree_index as u64));
            let n = x.len();
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            DecisionTree::fit(x, y, bootstrap, &tree_params, &mut rng)
        };

        self.trees = if self.params.parallel {
            (0..n_trees).into_par_iter().map(build).collect()
        } else {
            (0..n_trees).map(build).collect()
        };
        self.n_features = d;

        tracing::debug!(
            trees = self.trees.len(),
            rows = x.len(),
            features = d,
            criterion = ?self.criterion,
            "random forest fitted"
        );
        Ok(())
    }

    /// Mean of per-tree leaf values for each row
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, EstimatorError> {
        if self.trees.is_empty() {
            return Err(EstimatorError::NotFitted);
        }

        x.iter()
            .map(|row| {
                if row.len() != self.n_features {
                    return Err(EstimatorError::FeatureCountMismatch {
                        expected: self.n_features,
                        found: row.len(),
                    });
                }
                let total: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
                Ok(total / self.trees.len() as f64)
            })
            .collect()
    }

    /// Mean impurity decrease per feature, normalised to sum to 1
    pub fn feature_importances(&self) -> Vec<f64> {
        if self.trees.is_empty() {
            return Vec::new();
        }

        let mut importances = vec![0.0; self.n_features];
        for tree in &self.trees {
            let raw = tree.raw_importances();
            let total: f64 = raw.iter().sum();
            if total <= 0.0 {
                continue;
            }
            for (acc, imp) in importances.iter_mut().zip(raw) {
                *acc += imp / total;
            }
        }

        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut importances {
                *imp /= sum;
            }
        }
        importances
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

// ==================== Classifier / Regressor ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    forest: RandomForest,
}

impl RandomForestClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            forest: RandomForest::new(params, Criterion::Gini),
        }
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(ForestParams::classifier_default())
    }
}

impl ProbabilisticClassifier for RandomForestClassifier {
    fn fit(&mut self, x: &[Vec<f64>], y: &[bool]) -> Result<(), EstimatorError> {
        let labels: Vec<f64> = y.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
        self.forest.fit(x, &labels)
    }

    fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, EstimatorError> {
        self.forest.predict(x)
    }

    fn feature_importances(&self) -> Vec<f64> {
        self.forest.feature_importances()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    forest: RandomForest,
}

impl RandomForestRegressor {
    pub fn new(params: ForestParams) -> Self {
        Self {
            forest: RandomForest::new(params, Criterion::SquaredError),
        }
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(ForestParams::regressor_default())
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), EstimatorError> {
        self.forest.fit(x, y)
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, EstimatorError> {
        self.forest.predict(x)
    }

    fn feature_importances(&self) -> Vec<f64> {
        self.forest.feature_importances()
    }
}
