//! Recommendation ranking
//!
//! `combined = priority_weight * priority + difficulty_weight * difficulty`,
//! ordered by combined score descending with ties broken by ascending card
//! id. Candidates are the cards that have a priority score.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{CardId, ScoreMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCard {
    pub card_id: CardId,
    pub priority: f64,
    pub difficulty: f64,
    pub combined: f64,
}

fn ranked_order(a: &ScoredCard, b: &ScoredCard) -> Ordering {
    match (a.combined.is_nan(), b.combined.is_nan()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => b
            .combined
            .partial_cmp(&a.combined)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.card_id.cmp(&b.card_id)),
    }
}

fn retain_top_k(cards: &mut Vec<ScoredCard>, k: usize) {
    if k == 0 {
        cards.clear();
        return;
    }

    if cards.len() > k {
        cards.select_nth_unstable_by(k - 1, ranked_order);
        cards.truncate(k);
    }
    cards.sort_by(ranked_order);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRanker {
    priority_weight: f64,
    difficulty_weight: f64,
}

impl Default for RecommendationRanker {
    fn default() -> Self {
        Self::new(0.7, 0.3)
    }
}

impl RecommendationRanker {
    pub fn new(priority_weight: f64, difficulty_weight: f64) -> Self {
        Self {
            priority_weight,
            difficulty_weight,
        }
    }

    pub fn combined_score(&self, priority: f64, difficulty: f64) -> f64 {
        self.priority_weight * priority + self.difficulty_weight * difficulty
    }

    /// Top `n` cards with their component scores, best first
    pub fn rank_scored(&self, priority_scores: &ScoreMap, difficulty_scores: &ScoreMap, n: usize) -> Vec<ScoredCard> {
        let mut cards: Vec<ScoredCard> = priority_scores
            .iter()
            .map(|(&card_id, &priority)| {
                let difficulty = match difficulty_scores.get(&card_id) {
                    Some(&d) => d,
                    None => {
                        tracing::warn!(card_id, "missing difficulty score, treating as 0");
                        0.0
                    }
                };
                ScoredCard {
                    card_id,
                    priority,
                    difficulty,
                    combined: self.combined_score(priority, difficulty),
                }
            })
            .collect();

        retain_top_k(&mut cards, n);
        cards
    }

    /// Top `n` card ids, length `min(n, candidates)`
    pub fn rank(&self, priority_scores: &ScoreMap, difficulty_scores: &ScoreMap, n: usize) -> Vec<CardId> {
        self.rank_scored(priority_scores, difficulty_scores, n)
            .into_iter()
            .map(|card| card.card_id)
            .collect()
    }
}
