use serde::{Deserialize, Serialize};

use crate::config::ForestParams;
use crate::error::RecommenderError;
use crate::forest::{RandomForestRegressor, Regressor};
use crate::models::scaler::StandardScaler;
use crate::types::{FeatureTable, ScoreMap};

/// Predicts how hard a card is, on the `1 - avg_accuracy` scale.
///
/// Only `[avg_accuracy, avg_response_time]` is used as input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyModel<R = RandomForestRegressor> {
    regressor: R,
    scaler: StandardScaler,
    trained: bool,
}

impl DifficultyModel<RandomForestRegressor> {
    pub fn new(params: ForestParams) -> Self {
        Self::with_regressor(RandomForestRegressor::new(params))
    }
}

impl Default for DifficultyModel<RandomForestRegressor> {
    fn default() -> Self {
        Self::new(ForestParams::regressor_default())
    }
}

impl<R: Regressor> DifficultyModel<R> {
    pub fn with_regressor(regressor: R) -> Self {
        Self {
            regressor,
            scaler: StandardScaler::default(),
            trained: false,
        }
    }

    /// Fit from scratch; on failure the model is left untrained
    pub fn fit(&mut self, features: &FeatureTable) -> Result<(), RecommenderError> {
        self.trained = false;

        if features.is_empty() {
            return Err(RecommenderError::EmptyFeatureTable);
        }

        let rows: Vec<Vec<f64>> = features.values().map(|fv| fv.difficulty_row()).collect();
        let targets: Vec<f64> = features.values().map(|fv| 1.0 - fv.avg_accuracy).collect();

        let scaler = StandardScaler::fit(&rows)?;
        let scaled = scaler.transform(&rows)?;
        self.regressor.fit(&scaled, &targets)?;
        self.scaler = scaler;
        self.trained = true;

        tracing::info!(cards = rows.len(), "difficulty model trained");
        Ok(())
    }

    pub fn predict_score(&self, features: &FeatureTable) -> Result<ScoreMap, RecommenderError> {
        if !self.trained {
            return Err(RecommenderError::NotTrained("difficulty"));
        }
        if features.is_empty() {
            return Ok(ScoreMap::new());
        }

        let rows: Vec<Vec<f64>> = features.values().map(|fv| fv.difficulty_row()).collect();
        let scaled = self.scaler.transform(&rows)?;
        let predictions = self.regressor.predict(&scaled)?;

        Ok(features.keys().copied().zip(predictions).collect())
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Mark untrained; `predict_score` fails until the next successful fit
    pub fn reset(&mut self) {
        self.trained = false;
    }

    /// Importances in `DIFFICULTY_FEATURE_NAMES` order; empty before training
    pub fn feature_importances(&self) -> Vec<f64> {
        if !self.trained {
            return Vec::new();
        }
        self.regressor.feature_importances()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeatureVector, DIFFICULTY_DIMENSION};

    fn fv(avg_accuracy: f64, avg_response_time: f64) -> FeatureVector {
        FeatureVector {
            avg_accuracy,
            review_count: 4,
            avg_response_time,
            days_since_last_review: 1,
            learning_trend: 0.0,
            forgetting_param: 0.3,
        }
    }

    fn small_model() -> DifficultyModel {
        DifficultyModel::new(ForestParams {
            n_trees: 20,
            ..ForestParams::regressor_default()
        })
    }

    #[test]
    fn test_predict_before_fit() {
        let model: DifficultyModel = DifficultyModel::default();
        let features: FeatureTable = [(1, fv(0.5, 2.0))].into_iter().collect();
        assert!(matches!(
            model.predict_score(&features),
            Err(RecommenderError::NotTrained("difficulty"))
        ));
    }

    #[test]
    fn test_fit_empty_table() {
        let mut model = small_model();
        assert!(model.fit(&FeatureTable::new()).is_err());
        assert!(!model.is_trained());
    }

    #[test]
    fn test_harder_cards_score_higher() {
        let features: FeatureTable = (0..20)
            .map(|i| {
                let acc = i as f64 / 19.0;
                (i as i64, fv(acc, 5.0 - 4.0 * acc))
            })
            .collect();
        let mut model = small_model();
        model.fit(&features).unwrap();

        let scores = model.predict_score(&features).unwrap();
        assert!(scores[&0] > scores[&19]);
        assert!(scores.values().all(|s| (0.0..=1.0).contains(s)));
        assert_eq!(model.feature_importances().len(), DIFFICULTY_DIMENSION);
    }
}
