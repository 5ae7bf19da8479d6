//! # danci-recommender - flashcard review recommendation
//!
//! Ranks flashcards for a study session from the user's review history:
//!
//! - **Feature extraction** - accuracy, volume, speed, recency, learning
//!   trend and forgetting rate per card
//! - **Priority model** - random-forest probability that a card needs review
//! - **Difficulty model** - random-forest estimate of how hard a card is
//! - **Ranking** - `0.7 * priority + 0.3 * difficulty`, best first
//! - **Orchestration** - when to train, and graceful degradation when the
//!   history is too short or a fit fails
//!
//! ## Module layout
//!
//! - [`types`] - session records, feature vectors, constants
//! - [`features`] - per-card feature extraction
//! - [`forest`] - CART trees, random forests, estimator traits
//! - [`models`] - scaler, priority and difficulty models
//! - [`ranker`] - combined scoring and top-n selection
//! - [`orchestrator`] - training state machine and shared handle
//! - [`config`] / [`logging`] / [`error`] / [`sanitize`] - support code
//!
//! ## Example
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use danci_recommender::{RecommenderConfig, StudySessionRecord, TrainingOrchestrator};
//!
//! let now = Utc::now();
//! let history: Vec<StudySessionRecord> = (0..12)
//!     .map(|i| StudySessionRecord::new(i % 4, i % 3 != 0, 1.5, now - Duration::days(i)))
//!     .collect();
//!
//! let mut engine = TrainingOrchestrator::new(RecommenderConfig::default());
//! let ranked = engine.ensure_trained_and_recommend(&history, 3);
//! assert_eq!(ranked.card_ids().len(), 3);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod features;
pub mod forest;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod ranker;
pub mod sanitize;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use config::{ForestParams, MaxFeatures, RecommenderConfig, ReviewLabelRule};
pub use error::{EstimatorError, RecommenderError};
pub use features::FeatureExtractor;
pub use forest::{
    ProbabilisticClassifier, RandomForest, RandomForestClassifier, RandomForestRegressor, Regressor,
};
pub use models::{DifficultyModel, PriorityModel, StandardScaler};
pub use orchestrator::{
    Recommendation, SharedRecommender, TrainingOrchestrator, TrainingState, UnavailableReason,
};
pub use ranker::{RecommendationRanker, ScoredCard};
