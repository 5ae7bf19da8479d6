//! Feature Extraction
//!
//! Turns a flat list of study-session records into one [`FeatureVector`]
//! per card:
//! - accuracy, review count and response time come straight from the
//!   card's records; negative or non-finite response times are skipped
//!   for that card only
//! - recency is measured in whole days against the evaluation instant
//! - trend and forgetting are only estimated once a card has at least
//!   three records; below that, or when an estimate is not finite, the
//!   defaults (0 and 0.3) are used and the rest of the batch is unaffected
//!
//! Records are partitioned by card and each partition is sorted by
//! timestamp (stable, so equal timestamps keep input order) before any
//! sequence-dependent feature is computed.

pub mod forgetting;
pub mod trend;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::RecommenderError;
use crate::sanitize::finite_or;
use crate::types::{
    validate_records, CardId, FeatureTable, FeatureVector, RawSessionRecord, StudySessionRecord,
    DEFAULT_FORGETTING_PARAM, DEFAULT_LEARNING_TREND, DEFAULT_RESPONSE_TIME, MIN_RECORDS_FOR_CURVE,
};

pub use forgetting::forgetting_param;
pub use trend::{learning_trend, least_squares_slope};

fn saturating_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract features evaluated at the current instant
    pub fn extract(&self, records: &[StudySessionRecord]) -> FeatureTable {
        self.extract_at(records, Utc::now())
    }

    /// Validate raw records, then extract features at `now`
    pub fn extract_raw(
        &self,
        raw: &[RawSessionRecord],
        now: DateTime<Utc>,
    ) -> Result<FeatureTable, RecommenderError> {
        let records = validate_records(raw)?;
        Ok(self.extract_at(&records, now))
    }

    pub fn extract_at(&self, records: &[StudySessionRecord], now: DateTime<Utc>) -> FeatureTable {
        let mut partitions: BTreeMap<CardId, Vec<&StudySessionRecord>> = BTreeMap::new();
        for record in records {
            partitions.entry(record.card_id).or_default().push(record);
        }

        partitions
            .into_iter()
            .map(|(card_id, mut card_records)| {
                card_records.sort_by_key(|r| r.timestamp);
                (card_id, Self::card_features(card_id, &card_records, now))
            })
            .collect()
    }

    /// Features for a single card; `records` is non-empty and time-sorted
    fn card_features(card_id: CardId, records: &[&StudySessionRecord], now: DateTime<Utc>) -> FeatureVector {
        let n = records.len();
        let correct_count = records.iter().filter(|r| r.correct).count();
        let avg_accuracy = correct_count as f64 / n as f64;
        let avg_response_time = Self::card_response_time(card_id, records);

        // Sorted ascending, so the last record is the latest
        let days_since_last_review = records
            .last()
            .map(|r| (now - r.timestamp).num_days().max(0))
            .unwrap_or(0);

        FeatureVector {
            avg_accuracy,
            review_count: saturating_count(n),
            avg_response_time,
            days_since_last_review,
            learning_trend: Self::card_trend(card_id, records),
            forgetting_param: Self::card_forgetting(card_id, records),
        }
    }

    /// Mean over finite, non-negative response times; unusable ones are skipped
    fn card_response_time(card_id: CardId, records: &[&StudySessionRecord]) -> f64 {
        let usable: Vec<f64> = records
            .iter()
            .map(|r| r.response_time)
            .filter(|t| t.is_finite() && *t >= 0.0)
            .collect();

        if usable.len() < records.len() {
            tracing::warn!(
                card_id,
                skipped = records.len() - usable.len(),
                "invalid response times ignored"
            );
        }
        if usable.is_empty() {
            return DEFAULT_RESPONSE_TIME;
        }

        let mean = usable.iter().sum::<f64>() / usable.len() as f64;
        finite_or(mean, DEFAULT_RESPONSE_TIME)
    }

    fn card_trend(card_id: CardId, records: &[&StudySessionRecord]) -> f64 {
        if records.len() < MIN_RECORDS_FOR_CURVE {
            return DEFAULT_LEARNING_TREND;
        }

        let outcomes: Vec<bool> = records.iter().map(|r| r.correct).collect();
        match learning_trend(&outcomes) {
            Some(slope) => slope,
            None => {
                tracing::warn!(card_id, records = records.len(), "learning trend fit failed, using default");
                DEFAULT_LEARNING_TREND
            }
        }
    }

    fn card_forgetting(card_id: CardId, records: &[&StudySessionRecord]) -> f64 {
        if records.len() < MIN_RECORDS_FOR_CURVE {
            return DEFAULT_FORGETTING_PARAM;
        }

        let correct_times: Vec<DateTime<Utc>> = records
            .iter()
            .filter(|r| r.correct)
            .map(|r| r.timestamp)
            .collect();

        let param = forgetting_param(&correct_times);
        if !param.is_finite() || param < 0.0 {
            tracing::warn!(card_id, param, "forgetting parameter out of range, using default");
            return DEFAULT_FORGETTING_PARAM;
        }
        param
    }
}
