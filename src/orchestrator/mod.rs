//! Training orchestration
//!
//! Owns both models and decides when they are (re)fitted. Nothing in here
//! returns an error to the caller: failed fits and failed scoring are logged
//! and reported as `false`, an empty list, or
//! [`Recommendation::Unavailable`], so the caller can fall back to its own
//! selection strategy.
//!
//! State machine:
//! - `Untrained` -> `Trained` on a successful fit (lazy in
//!   [`TrainingOrchestrator::ensure_trained_and_recommend`], or explicit via
//!   [`TrainingOrchestrator::retrain`])
//! - any -> `Untrained` when a retrain fails
//! - histories shorter than `min_history_records` never train and never rank

pub mod shared;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RecommenderConfig;
use crate::error::RecommenderError;
use crate::features::FeatureExtractor;
use crate::forest::{ProbabilisticClassifier, RandomForestClassifier, RandomForestRegressor, Regressor};
use crate::models::{DifficultyModel, PriorityModel};
use crate::ranker::{RecommendationRanker, ScoredCard};
use crate::types::{CardId, FeatureTable, StudySessionRecord};

pub use shared::SharedRecommender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingState {
    Untrained,
    Trained,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnavailableReason {
    InsufficientHistory { records: usize, required: usize },
    TrainingFailed,
    NotTrained,
    ScoringFailed,
}

/// Outcome of a recommendation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Ranked(Vec<CardId>),
    Unavailable(UnavailableReason),
}

impl Recommendation {
    pub fn is_ranked(&self) -> bool {
        matches!(self, Recommendation::Ranked(_))
    }

    /// Ranked ids, or an empty slice when model ranking is unavailable
    pub fn card_ids(&self) -> &[CardId] {
        match self {
            Recommendation::Ranked(ids) => ids,
            Recommendation::Unavailable(_) => &[],
        }
    }

    pub fn into_card_ids(self) -> Vec<CardId> {
        match self {
            Recommendation::Ranked(ids) => ids,
            Recommendation::Unavailable(_) => Vec::new(),
        }
    }
}

pub struct TrainingOrchestrator<C = RandomForestClassifier, R = RandomForestRegressor> {
    config: RecommenderConfig,
    extractor: FeatureExtractor,
    priority: PriorityModel<C>,
    difficulty: DifficultyModel<R>,
    ranker: RecommendationRanker,
    state: TrainingState,
}

impl TrainingOrchestrator<RandomForestClassifier, RandomForestRegressor> {
    pub fn new(config: RecommenderConfig) -> Self {
        let priority = PriorityModel::new(config.priority_forest.clone(), config.label_rule.clone());
        let difficulty = DifficultyModel::new(config.difficulty_forest.clone());
        Self::with_models(config, priority, difficulty)
    }
}

impl Default for TrainingOrchestrator<RandomForestClassifier, RandomForestRegressor> {
    fn default() -> Self {
        Self::new(RecommenderConfig::default())
    }
}

impl<C: ProbabilisticClassifier, R: Regressor> TrainingOrchestrator<C, R> {
    /// Orchestrator over caller-supplied (untrained) models
    pub fn with_models(config: RecommenderConfig, priority: PriorityModel<C>, difficulty: DifficultyModel<R>) -> Self {
        let ranker = RecommendationRanker::new(config.priority_weight, config.difficulty_weight);
        Self {
            config,
            extractor: FeatureExtractor::new(),
            priority,
            difficulty,
            ranker,
            state: TrainingState::Untrained,
        }
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    pub fn is_trained(&self) -> bool {
        self.state == TrainingState::Trained
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn priority_model(&self) -> &PriorityModel<C> {
        &self.priority
    }

    pub fn difficulty_model(&self) -> &DifficultyModel<R> {
        &self.difficulty
    }

    // ==================== Training ====================

    /// Refit both models from the full cumulative history
    pub fn retrain(&mut self, history: &[StudySessionRecord]) -> bool {
        self.retrain_at(history, Utc::now())
    }

    pub fn retrain_at(&mut self, history: &[StudySessionRecord], now: DateTime<Utc>) -> bool {
        let features = self.extractor.extract_at(history, now);

        match self.fit_models(&features) {
            Ok(()) => {
                self.state = TrainingState::Trained;
                tracing::info!(records = history.len(), cards = features.len(), "recommender trained");
                true
            }
            Err(err) => {
                self.state = TrainingState::Untrained;
                tracing::warn!(
                    error = %err,
                    records = history.len(),
                    cards = features.len(),
                    "recommender training failed"
                );
                false
            }
        }
    }

    /// Both models or neither: a failure leaves both untrained
    fn fit_models(&mut self, features: &FeatureTable) -> Result<(), RecommenderError> {
        let result = self
            .priority
            .fit(features)
            .and_then(|()| self.difficulty.fit(features));
        if result.is_err() {
            self.priority.reset();
            self.difficulty.reset();
        }
        result
    }

    // ==================== Recommendation ====================

    /// Train on first use if the history allows it, then rank
    pub fn ensure_trained_and_recommend(&mut self, history: &[StudySessionRecord], n: usize) -> Recommendation {
        self.ensure_trained_and_recommend_at(history, n, Utc::now())
    }

    pub fn ensure_trained_and_recommend_at(
        &mut self,
        history: &[StudySessionRecord],
        n: usize,
        now: DateTime<Utc>,
    ) -> Recommendation {
        if history.len() >= self.config.min_history_records
            && !self.is_trained()
            && !self.retrain_at(history, now)
        {
            return Recommendation::Unavailable(UnavailableReason::TrainingFailed);
        }

        self.recommend_at(history, n, now)
    }

    /// Rank without training; `NotTrained` when no fit has succeeded yet
    pub fn recommend_at(&self, history: &[StudySessionRecord], n: usize, now: DateTime<Utc>) -> Recommendation {
        let required = self.config.min_history_records;
        if history.len() < required {
            tracing::debug!(records = history.len(), required, "history too short for model ranking");
            return Recommendation::Unavailable(UnavailableReason::InsufficientHistory {
                records: history.len(),
                required,
            });
        }

        if !self.is_trained() {
            return Recommendation::Unavailable(UnavailableReason::NotTrained);
        }

        match self.scored_recommendations_at(history, n, now) {
            Ok(cards) => Recommendation::Ranked(cards.into_iter().map(|c| c.card_id).collect()),
            Err(err) => {
                tracing::warn!(error = %err, records = history.len(), "recommendation scoring failed");
                Recommendation::Unavailable(UnavailableReason::ScoringFailed)
            }
        }
    }

    /// Ranked ids, empty when untrained or when scoring fails
    pub fn get_recommendations(&self, history: &[StudySessionRecord], n: usize) -> Vec<CardId> {
        self.get_recommendations_at(history, n, Utc::now())
    }

    pub fn get_recommendations_at(&self, history: &[StudySessionRecord], n: usize, now: DateTime<Utc>) -> Vec<CardId> {
        match self.scored_recommendations_at(history, n, now) {
            Ok(cards) => cards.into_iter().map(|c| c.card_id).collect(),
            Err(err) => {
                tracing::warn!(error = %err, records = history.len(), "recommendations unavailable");
                Vec::new()
            }
        }
    }

    /// `get_recommendations` with the configured default count
    pub fn get_default_recommendations(&self, history: &[StudySessionRecord]) -> Vec<CardId> {
        self.get_recommendations_at(history, self.config.default_count, Utc::now())
    }

    /// Ranked cards with their component scores
    pub fn scored_recommendations_at(
        &self,
        history: &[StudySessionRecord],
        n: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredCard>, RecommenderError> {
        if !self.is_trained() {
            return Err(RecommenderError::NotTrained("recommender"));
        }

        let features = self.extractor.extract_at(history, now);
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let priority = self.priority.predict_score(&features)?;
        let difficulty = self.difficulty.predict_score(&features)?;
        Ok(self.ranker.rank_scored(&priority, &difficulty, n))
    }

    /// Refit from the cumulative history after a new session, then rank
    pub fn update_recommendations(&mut self, history: &[StudySessionRecord], n: usize) -> Vec<CardId> {
        self.update_recommendations_at(history, n, Utc::now())
    }

    pub fn update_recommendations_at(
        &mut self,
        history: &[StudySessionRecord],
        n: usize,
        now: DateTime<Utc>,
    ) -> Vec<CardId> {
        if !self.retrain_at(history, now) {
            return Vec::new();
        }
        self.get_recommendations_at(history, n, now)
    }
}
