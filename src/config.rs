use serde::{Deserialize, Serialize};

use crate::types::FeatureVector;

/// How many features each split considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// floor(sqrt(d)), at least one
    Sqrt,
    All,
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
            MaxFeatures::All => n_features,
        }
        .min(n_features)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    /// None grows until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub seed: u64,
    /// Build trees on the rayon pool; output is identical to serial training
    pub parallel: bool,
}

impl ForestParams {
    pub fn classifier_default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            seed: 42,
            parallel: false,
        }
    }

    pub fn regressor_default() -> Self {
        Self {
            n_trees: 50,
            max_features: MaxFeatures::All,
            ..Self::classifier_default()
        }
    }
}

/// Heuristic label for "needs review now"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLabelRule {
    pub accuracy_threshold: f64,
    pub stale_after_days: i64,
}

impl Default for ReviewLabelRule {
    fn default() -> Self {
        Self {
            accuracy_threshold: 0.8,
            stale_after_days: 5,
        }
    }
}

impl ReviewLabelRule {
    pub fn needs_review(&self, features: &FeatureVector) -> bool {
        features.avg_accuracy < self.accuracy_threshold
            || features.days_since_last_review > self.stale_after_days
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommenderConfig {
    pub priority_forest: ForestParams,
    pub difficulty_forest: ForestParams,
    pub label_rule: ReviewLabelRule,
    pub priority_weight: f64,
    pub difficulty_weight: f64,
    /// Histories shorter than this never train or rank
    pub min_history_records: usize,
    pub default_count: usize,
    pub log_level: String,
    /// Also write logs to a daily rolling file under `log_dir`
    pub file_logs: bool,
    pub log_dir: String,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            priority_forest: ForestParams::classifier_default(),
            difficulty_forest: ForestParams::regressor_default(),
            label_rule: ReviewLabelRule::default(),
            priority_weight: 0.7,
            difficulty_weight: 0.3,
            min_history_records: 5,
            default_count: 10,
            log_level: "info".to_string(),
            file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl RecommenderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns; unparsable values are ignored
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(seed) = lookup("RECOMMENDER_SEED").and_then(|v| v.parse::<u64>().ok()) {
            config.priority_forest.seed = seed;
            config.difficulty_forest.seed = seed;
        }

        if let Some(n) = lookup("RECOMMENDER_PRIORITY_TREES")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
        {
            config.priority_forest.n_trees = n;
        }

        if let Some(n) = lookup("RECOMMENDER_DIFFICULTY_TREES")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
        {
            config.difficulty_forest.n_trees = n;
        }

        if let Some(n) = lookup("RECOMMENDER_MIN_HISTORY").and_then(|v| v.parse::<usize>().ok()) {
            config.min_history_records = n;
        }

        if let Some(n) = lookup("RECOMMENDER_DEFAULT_COUNT").and_then(|v| v.parse::<usize>().ok()) {
            config.default_count = n;
        }

        if let Some(parallel) = lookup("RECOMMENDER_PARALLEL").map(|v| v == "true" || v == "1") {
            config.priority_forest.parallel = parallel;
            config.difficulty_forest.parallel = parallel;
        }

        if let Some(level) = lookup("RUST_LOG") {
            config.log_level = level;
        }

        if let Some(file_logs) = lookup("RECOMMENDER_FILE_LOGS").map(|v| v == "true" || v == "1") {
            config.file_logs = file_logs;
        }

        if let Some(dir) = lookup("LOG_DIR").filter(|d| !d.is_empty()) {
            config.log_dir = dir;
        }

        config
    }
}
