use serde::{Deserialize, Serialize};

use crate::config::{ForestParams, ReviewLabelRule};
use crate::error::RecommenderError;
use crate::forest::{ProbabilisticClassifier, RandomForestClassifier};
use crate::models::scaler::StandardScaler;
use crate::types::{FeatureTable, ScoreMap};

/// Predicts the probability that a card needs review now.
///
/// Labels are derived from the feature table through [`ReviewLabelRule`];
/// all six features are standardised before the classifier sees them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityModel<C = RandomForestClassifier> {
    classifier: C,
    scaler: StandardScaler,
    label_rule: ReviewLabelRule,
    trained: bool,
}

impl PriorityModel<RandomForestClassifier> {
    pub fn new(params: ForestParams, label_rule: ReviewLabelRule) -> Self {
        Self::with_classifier(RandomForestClassifier::new(params), label_rule)
    }
}

impl Default for PriorityModel<RandomForestClassifier> {
    fn default() -> Self {
        Self::new(ForestParams::classifier_default(), ReviewLabelRule::default())
    }
}

impl<C: ProbabilisticClassifier> PriorityModel<C> {
    pub fn with_classifier(classifier: C, label_rule: ReviewLabelRule) -> Self {
        Self {
            classifier,
            scaler: StandardScaler::default(),
            label_rule,
            trained: false,
        }
    }

    /// Fit from scratch; on failure the model is left untrained
    pub fn fit(&mut self, features: &FeatureTable) -> Result<(), RecommenderError> {
        self.trained = false;

        if features.is_empty() {
            return Err(RecommenderError::EmptyFeatureTable);
        }

        let rows: Vec<Vec<f64>> = features.values().map(|fv| fv.to_row()).collect();
        let labels: Vec<bool> = features
            .values()
            .map(|fv| self.label_rule.needs_review(fv))
            .collect();

        let scaler = StandardScaler::fit(&rows)?;
        let scaled = scaler.transform(&rows)?;
        self.classifier.fit(&scaled, &labels)?;
        self.scaler = scaler;
        self.trained = true;

        let positives = labels.iter().filter(|&&l| l).count();
        tracing::info!(cards = rows.len(), needs_review = positives, "priority model trained");
        Ok(())
    }

    /// Probability of the "needs review" class per card
    pub fn predict_score(&self, features: &FeatureTable) -> Result<ScoreMap, RecommenderError> {
        if !self.trained {
            return Err(RecommenderError::NotTrained("priority"));
        }
        if features.is_empty() {
            return Ok(ScoreMap::new());
        }

        let rows: Vec<Vec<f64>> = features.values().map(|fv| fv.to_row()).collect();
        let scaled = self.scaler.transform(&rows)?;
        let proba = self.classifier.predict_proba(&scaled)?;

        Ok(features.keys().copied().zip(proba).collect())
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Mark untrained; `predict_score` fails until the next successful fit
    pub fn reset(&mut self) {
        self.trained = false;
    }

    pub fn label_rule(&self) -> &ReviewLabelRule {
        &self.label_rule
    }

    /// Importances in `FEATURE_NAMES` order; empty before training
    pub fn feature_importances(&self) -> Vec<f64> {
        if !self.trained {
            return Vec::new();
        }
        self.classifier.feature_importances()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CardId, FeatureVector, FEATURE_DIMENSION};

    fn fv(avg_accuracy: f64, days: i64) -> FeatureVector {
        FeatureVector {
            avg_accuracy,
            review_count: 5,
            avg_response_time: 2.0,
            days_since_last_review: days,
            learning_trend: 0.0,
            forgetting_param: 0.3,
        }
    }

    fn table(entries: &[(CardId, f64, i64)]) -> FeatureTable {
        entries.iter().map(|&(id, acc, days)| (id, fv(acc, days))).collect()
    }

    fn small_model() -> PriorityModel {
        PriorityModel::new(
            ForestParams {
                n_trees: 20,
                ..ForestParams::classifier_default()
            },
            ReviewLabelRule::default(),
        )
    }

    #[test]
    fn test_predict_before_fit() {
        let model: PriorityModel = PriorityModel::default();
        assert!(matches!(
            model.predict_score(&table(&[(1, 0.5, 1)])),
            Err(RecommenderError::NotTrained("priority"))
        ));
    }

    #[test]
    fn test_fit_empty_table() {
        let mut model = small_model();
        assert!(matches!(model.fit(&FeatureTable::new()), Err(RecommenderError::EmptyFeatureTable)));
        assert!(!model.is_trained());
    }

    #[test]
    fn test_failed_refit_resets() {
        let mut model = small_model();
        model.fit(&table(&[(1, 0.5, 1), (2, 1.0, 1)])).unwrap();
        assert!(model.is_trained());
        assert!(model.fit(&FeatureTable::new()).is_err());
        assert!(!model.is_trained());
    }

    #[test]
    fn test_scores_are_probabilities() {
        let mut model = small_model();
        let features = table(&[
            (1, 0.2, 1),
            (2, 0.3, 2),
            (3, 1.0, 1),
            (4, 0.95, 0),
            (5, 1.0, 12),
            (6, 0.9, 9),
        ]);
        model.fit(&features).unwrap();

        let scores = model.predict_score(&features).unwrap();
        assert_eq!(scores.len(), features.len());
        assert!(scores.values().all(|p| (0.0..=1.0).contains(p)));
        // low accuracy needs review more than a fresh, well-known card
        assert!(scores[&1] > scores[&3]);
    }

    #[test]
    fn test_predict_empty_table() {
        let mut model = small_model();
        model.fit(&table(&[(1, 0.5, 1), (2, 1.0, 1)])).unwrap();
        assert!(model.predict_score(&FeatureTable::new()).unwrap().is_empty());
    }

    #[test]
    fn test_feature_importances_shape() {
        let mut model = small_model();
        assert!(model.feature_importances().is_empty());
        model
            .fit(&table(&[(1, 0.2, 1), (2, 1.0, 1), (3, 0.4, 3), (4, 1.0, 0)]))
            .unwrap();
        assert_eq!(model.feature_importances().len(), FEATURE_DIMENSION);
    }
}
