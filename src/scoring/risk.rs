use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{CreditScoreError, Result, RiskLevel, ScoreBand, ScoreBreakdown, ScoreResult},
    scoring::{algorithm::round2, ScoringWeights},
};

/// Inclusive lower bounds on the 0-100 scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskThresholds {
    pub low_min: f64,
    pub medium_min: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_min: 90.0,
            medium_min: 65.0,
        }
    }
}

impl RiskThresholds {
    pub fn new(low_min: f64, medium_min: f64) -> Result<Self> {
        let thresholds = Self { low_min, medium_min };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.low_min) || !in_range(self.medium_min) {
            return Err(CreditScoreError::Config(
                "Risk thresholds must lie within 0..=100".to_string(),
            ));
        }
        if self.low_min < self.medium_min {
            return Err(CreditScoreError::Config(format!(
                "Low-risk threshold {} is below medium-risk threshold {}",
                self.low_min, self.medium_min
            )));
        }
        Ok(())
    }

    pub fn classify(&self, score: f64) -> RiskLevel {
        match score {
            s if s >= self.low_min => RiskLevel::Low,
            s if s >= self.medium_min => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

/// Combines the five sub-scores into the final score and risk tier.
#[derive(Debug, Clone)]
pub struct Aggregator {
    weights: ScoringWeights,
    thresholds: RiskThresholds,
}

impl Aggregator {
    pub fn new(weights: ScoringWeights, thresholds: RiskThresholds) -> Result<Self> {
        weights.validate()?;
        thresholds.validate()?;
        Ok(Self { weights, thresholds })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    pub fn score(&self, breakdown: &ScoreBreakdown) -> f64 {
        round2(self.weights.weighted_sum(breakdown)).clamp(0.0, 100.0)
    }

    pub fn aggregate(
        &self,
        address: &str,
        breakdown: ScoreBreakdown,
        now: DateTime<Utc>,
    ) -> ScoreResult {
        let score = self.score(&breakdown);

        ScoreResult {
            address: address.to_string(),
            input: None,
            score,
            breakdown,
            risk_level: self.thresholds.classify(score),
            band: ScoreBand::from_score(score),
            last_updated: now,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            thresholds: RiskThresholds::default(),
        }
    }
}
