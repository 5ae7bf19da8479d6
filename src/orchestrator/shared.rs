use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{Recommendation, TrainingOrchestrator, UnavailableReason};
use crate::config::RecommenderConfig;
use crate::forest::{ProbabilisticClassifier, RandomForestClassifier, RandomForestRegressor, Regressor};
use crate::types::{CardId, StudySessionRecord};

/// Process-wide recommender handle for concurrent callers.
///
/// Fits run under the write lock; scoring an already trained engine only
/// takes the read lock, so requests do not serialise behind each other.
pub struct SharedRecommender<C = RandomForestClassifier, R = RandomForestRegressor> {
    inner: Arc<RwLock<TrainingOrchestrator<C, R>>>,
}

impl<C, R> Clone for SharedRecommender<C, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SharedRecommender<RandomForestClassifier, RandomForestRegressor> {
    pub fn new(config: RecommenderConfig) -> Self {
        Self::from_orchestrator(TrainingOrchestrator::new(config))
    }
}

impl<C: ProbabilisticClassifier, R: Regressor> SharedRecommender<C, R> {
    pub fn from_orchestrator(orchestrator: TrainingOrchestrator<C, R>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(orchestrator)),
        }
    }

    pub fn recommend(&self, history: &[StudySessionRecord], n: usize) -> Recommendation {
        self.recommend_at(history, n, Utc::now())
    }

    pub fn recommend_at(&self, history: &[StudySessionRecord], n: usize, now: DateTime<Utc>) -> Recommendation {
        {
            let guard = self.inner.read();
            let result = guard.recommend_at(history, n, now);
            if result != Recommendation::Unavailable(UnavailableReason::NotTrained) {
                return result;
            }
        }

        // Another caller may have trained in between; the orchestrator re-checks
        self.inner.write().ensure_trained_and_recommend_at(history, n, now)
    }

    pub fn retrain(&self, history: &[StudySessionRecord]) -> bool {
        self.inner.write().retrain(history)
    }

    pub fn retrain_at(&self, history: &[StudySessionRecord], now: DateTime<Utc>) -> bool {
        self.inner.write().retrain_at(history, now)
    }

    pub fn get_recommendations_at(&self, history: &[StudySessionRecord], n: usize, now: DateTime<Utc>) -> Vec<CardId> {
        self.inner.read().get_recommendations_at(history, n, now)
    }

    pub fn is_trained(&self) -> bool {
        self.inner.read().is_trained()
    }
}
