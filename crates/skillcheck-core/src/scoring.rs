//! Score tiers and the local threshold recommendation strategy.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::traits::{RecommendationProvider, RecommendationRequest};

/// Qualitative bucket derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Strong,
    Solid,
    Developing,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Strong => write!(f, "strong"),
            Tier::Solid => write!(f, "solid"),
            Tier::Developing => write!(f, "developing"),
        }
    }
}

/// Lower bounds (inclusive) for the strong and solid tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_strong")]
    pub strong: f64,
    #[serde(default = "default_solid")]
    pub solid: f64,
}

fn default_strong() -> f64 {
    0.8
}

fn default_solid() -> f64 {
    0.5
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            strong: default_strong(),
            solid: default_solid(),
        }
    }
}

impl TierThresholds {
    /// Classify a score in `[0, 1]`.
    pub fn classify(&self, score: f64) -> Tier {
        if score >= self.strong {
            Tier::Strong
        } else if score >= self.solid {
            Tier::Solid
        } else {
            Tier::Developing
        }
    }

    /// Classify `correct / total`. Zero-question sessions have no tier.
    pub fn tier_for(&self, correct: usize, total: usize) -> Option<Tier> {
        score(correct, total).map(|s| self.classify(s))
    }
}

/// `correct / total`, or `None` when there were no questions.
pub fn score(correct: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| correct as f64 / total as f64)
}

/// Career-path message for a tier.
pub fn tier_message(tier: Tier) -> &'static str {
    match tier {
        Tier::Strong => "Recommended AI Career Path: You have strong fundamentals and are on a great path to become an ML Engineer.",
        Tier::Solid => "Recommended AI Career Path: You have solid knowledge. Consider focusing on a specialized area like Data Science or Computer Vision.",
        Tier::Developing => "Recommended AI Career Path: Your foundational knowledge is developing. Start with a Data Analyst role and build from there.",
    }
}

/// Local recommendation strategy: classify the score and emit a fixed message.
#[derive(Debug, Clone, Default)]
pub struct ThresholdRecommender {
    thresholds: TierThresholds,
}

impl ThresholdRecommender {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }
}

#[async_trait]
impl RecommendationProvider for ThresholdRecommender {
    fn name(&self) -> &str {
        "thresholds"
    }

    async fn recommend(&self, request: &RecommendationRequest) -> anyhow::Result<String> {
        match self.thresholds.tier_for(request.correct, request.total) {
            Some(tier) => Ok(tier_message(tier).to_string()),
            None => anyhow::bail!("no questions were answered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Epoch;
    use crate::model::Difficulty;

    #[test]
    fn tier_boundaries() {
        let t = TierThresholds::default();
        assert_eq!(t.classify(1.0), Tier::Strong);
        assert_eq!(t.classify(0.8), Tier::Strong);
        assert_eq!(t.classify(0.79), Tier::Solid);
        assert_eq!(t.classify(0.5), Tier::Solid);
        assert_eq!(t.classify(0.49), Tier::Developing);
        assert_eq!(t.classify(0.0), Tier::Developing);
    }

    #[test]
    fn zero_questions_have_no_score() {
        assert_eq!(score(0, 0), None);
        assert_eq!(TierThresholds::default().tier_for(0, 0), None);
    }

    #[test]
    fn custom_thresholds() {
        let t = TierThresholds {
            strong: 0.9,
            solid: 0.6,
        };
        assert_eq!(t.tier_for(4, 5), Some(Tier::Solid));
        assert_eq!(t.tier_for(3, 6), Some(Tier::Developing));
    }

    #[tokio::test]
    async fn threshold_recommender_messages() {
        let rec = ThresholdRecommender::default();
        let mut request = RecommendationRequest {
            epoch: Epoch::default(),
            correct: 4,
            total: 6,
            score: 4.0 / 6.0,
            role: "Data Scientist".into(),
            difficulty: Difficulty::Intermediate,
        };
        let text = rec.recommend(&request).await.unwrap();
        assert!(text.contains("solid knowledge"));

        request.correct = 0;
        request.total = 0;
        assert!(rec.recommend(&request).await.is_err());
    }
}
