//! Common Types and Constants
//!
//! Session records consumed by the engine and the per-card feature table
//! shared by every model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RecommenderError;

// ==================== Constants ====================

/// Number of columns in a full feature row
pub const FEATURE_DIMENSION: usize = 6;

/// Number of columns in a difficulty row
pub const DIFFICULTY_DIMENSION: usize = 2;

/// Feature column names, in row order
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = [
    "avg_accuracy",
    "review_count",
    "avg_response_time",
    "days_since_last_review",
    "learning_trend",
    "forgetting_param",
];

/// Difficulty column names, in row order
pub const DIFFICULTY_FEATURE_NAMES: [&str; DIFFICULTY_DIMENSION] =
    ["avg_accuracy", "avg_response_time"];

/// Minimum records per card before trend and forgetting are estimated
pub const MIN_RECORDS_FOR_CURVE: usize = 3;

/// Minimum correct reviews needed for a forgetting interval
pub const MIN_CORRECT_FOR_FORGETTING: usize = 2;

/// Forgetting parameter used when it cannot be estimated
pub const DEFAULT_FORGETTING_PARAM: f64 = 0.3;

/// Learning trend used when it cannot be estimated
pub const DEFAULT_LEARNING_TREND: f64 = 0.0;

/// Average response time for a card with no usable response times
pub const DEFAULT_RESPONSE_TIME: f64 = 0.0;

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

/// Milliseconds in one day
pub const MS_PER_DAY: f64 = 86_400_000.0;

// ==================== Session Records ====================

/// Card identifier, as stored by the word table
pub type CardId = i64;

/// One observation of a user reviewing a card
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudySessionRecord {
    pub card_id: CardId,
    pub correct: bool,
    /// Seconds taken to answer
    pub response_time: f64,
    pub timestamp: DateTime<Utc>,
}

impl StudySessionRecord {
    pub fn new(card_id: CardId, correct: bool, response_time: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            card_id,
            correct,
            response_time,
            timestamp,
        }
    }
}

/// Session record as delivered by storage, before validation
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawSessionRecord {
    pub card_id: Option<CardId>,
    pub correct: Option<bool>,
    pub response_time: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawSessionRecord {
    /// Parse a JSON array of raw records
    pub fn parse_batch(json: &str) -> Result<Vec<RawSessionRecord>, RecommenderError> {
        serde_json::from_str(json)
            .map_err(|err| RecommenderError::Validation(format!("malformed session batch: {err}")))
    }

    /// Convert into a typed record; `index` is only used in the error message
    pub fn validate(&self, index: usize) -> Result<StudySessionRecord, RecommenderError> {
        let missing =
            |field: &str| RecommenderError::Validation(format!("record {index}: missing field `{field}`"));

        let card_id = self.card_id.ok_or_else(|| missing("card_id"))?;
        let correct = self.correct.ok_or_else(|| missing("correct"))?;
        let response_time = self.response_time.ok_or_else(|| missing("response_time"))?;
        let timestamp = self.timestamp.ok_or_else(|| missing("timestamp"))?;

        if !response_time.is_finite() || response_time < 0.0 {
            return Err(RecommenderError::Validation(format!(
                "record {index}: response_time must be a non-negative number, got {response_time}"
            )));
        }

        Ok(StudySessionRecord {
            card_id,
            correct,
            response_time,
            timestamp,
        })
    }
}

/// Validate a whole batch; the first malformed record fails the batch
pub fn validate_records(raw: &[RawSessionRecord]) -> Result<Vec<StudySessionRecord>, RecommenderError> {
    raw.iter()
        .enumerate()
        .map(|(index, record)| record.validate(index))
        .collect()
}

// ==================== Features ====================

/// Per-card features derived from the card's session history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Mean of `correct`, in [0, 1]
    pub avg_accuracy: f64,
    pub review_count: u32,
    /// Mean response time (seconds)
    pub avg_response_time: f64,
    pub days_since_last_review: i64,
    /// Slope of `correct` over review order
    pub learning_trend: f64,
    /// Mean interval between correct reviews in weeks
    pub forgetting_param: f64,
}

impl FeatureVector {
    /// Full row in `FEATURE_NAMES` order
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.avg_accuracy,
            self.review_count as f64,
            self.avg_response_time,
            self.days_since_last_review as f64,
            self.learning_trend,
            self.forgetting_param,
        ]
    }

    /// Row used by the difficulty model
    pub fn difficulty_row(&self) -> Vec<f64> {
        vec![self.avg_accuracy, self.avg_response_time]
    }
}

/// Feature table keyed by card, iterated in ascending card id order
pub type FeatureTable = BTreeMap<CardId, FeatureVector>;

/// Per-card model output
pub type ScoreMap = BTreeMap<CardId, f64>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_validate_complete_record() {
        let raw = RawSessionRecord {
            card_id: Some(7),
            correct: Some(true),
            response_time: Some(1.5),
            timestamp: Some(ts()),
        };
        let record = raw.validate(0).unwrap();
        assert_eq!(record, StudySessionRecord::new(7, true, 1.5, ts()));
    }

    #[test]
    fn test_validate_missing_field() {
        let raw = RawSessionRecord {
            card_id: Some(7),
            correct: None,
            response_time: Some(1.5),
            timestamp: Some(ts()),
        };
        match raw.validate(3) {
            Err(RecommenderError::Validation(msg)) => {
                assert!(msg.contains("record 3"));
                assert!(msg.contains("correct"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_negative_response_time() {
        let raw = RawSessionRecord {
            card_id: Some(1),
            correct: Some(false),
            response_time: Some(-0.1),
            timestamp: Some(ts()),
        };
        assert!(matches!(raw.validate(0), Err(RecommenderError::Validation(_))));
    }

    #[test]
    fn test_parse_batch() {
        let json = r#"[
            {"card_id": 1, "correct": true, "response_time": 1.2, "timestamp": "2024-03-01T00:00:00Z"},
            {"card_id": 2, "correct": false, "response_time": 3.4}
        ]"#;
        let raw = RawSessionRecord::parse_batch(json).unwrap();
        assert_eq!(raw.len(), 2);
        assert!(raw[1].timestamp.is_none());
        assert!(validate_records(&raw).is_err());
        assert!(validate_records(&raw[..1]).is_ok());
    }

    #[test]
    fn test_parse_batch_malformed() {
        assert!(matches!(
            RawSessionRecord::parse_batch("{not json"),
            Err(RecommenderError::Validation(_))
        ));
    }

    #[test]
    fn test_feature_rows() {
        let fv = FeatureVector {
            avg_accuracy: 0.5,
            review_count: 4,
            avg_response_time: 2.0,
            days_since_last_review: 3,
            learning_trend: 0.1,
            forgetting_param: 0.3,
        };
        assert_eq!(fv.to_row(), vec![0.5, 4.0, 2.0, 3.0, 0.1, 0.3]);
        assert_eq!(fv.difficulty_row(), vec![0.5, 2.0]);
        assert_eq!(fv.to_row().len(), FEATURE_DIMENSION);
    }
}
