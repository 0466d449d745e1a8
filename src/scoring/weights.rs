use serde::{Deserialize, Serialize};

use crate::models::{CreditScoreError, Factor, Result, ScoreBreakdown};

/// 100% expressed in basis points.
pub const TOTAL_BASIS_POINTS: u32 = 10_000;

/// Aggregation weights in basis points, so the sum-to-one check is exact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoringWeights {
    payment_history: u32,
    amounts_owed: u32,
    credit_history: u32,
    credit_mix: u32,
    new_credit: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            payment_history: 3_500,
            amounts_owed: 3_000,
            credit_history: 1_500,
            credit_mix: 1_000,
            new_credit: 1_000,
        }
    }
}

impl ScoringWeights {
    pub fn new(
        payment_history: u32,
        amounts_owed: u32,
        credit_history: u32,
        credit_mix: u32,
        new_credit: u32,
    ) -> Result<Self> {
        let weights = Self {
            payment_history,
            amounts_owed,
            credit_history,
            credit_mix,
            new_credit,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn total(&self) -> u32 {
        self.payment_history
            + self.amounts_owed
            + self.credit_history
            + self.credit_mix
            + self.new_credit
    }

    pub fn validate(&self) -> Result<()> {
        let total = self.total();
        if total != TOTAL_BASIS_POINTS {
            return Err(CreditScoreError::InvalidWeights(format!(
                "weights must sum to {} basis points, got {}",
                TOTAL_BASIS_POINTS, total
            )));
        }
        Ok(())
    }

    pub fn basis_points(&self, factor: Factor) -> u32 {
        match factor {
            Factor::PaymentHistory => self.payment_history,
            Factor::AmountsOwed => self.amounts_owed,
            Factor::CreditHistory => self.credit_history,
            Factor::CreditMix => self.credit_mix,
            Factor::NewCredit => self.new_credit,
        }
    }

    /// Weight as a fraction of one.
    pub fn fraction(&self, factor: Factor) -> f64 {
        self.basis_points(factor) as f64 / TOTAL_BASIS_POINTS as f64
    }

    pub fn weighted_sum(&self, breakdown: &ScoreBreakdown) -> f64 {
        let sum: f64 = breakdown
            .factors()
            .map(|(factor, value)| self.basis_points(factor) as f64 * value)
            .sum();
        sum / TOTAL_BASIS_POINTS as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = ScoringWeights::default();
        assert_eq!(weights.total(), TOTAL_BASIS_POINTS);
        assert!(weights.validate().is_ok());
        assert_eq!(weights.fraction(Factor::PaymentHistory), 0.35);
        assert_eq!(weights.fraction(Factor::AmountsOwed), 0.30);
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let err = ScoringWeights::new(3_500, 3_000, 1_500, 1_000, 999).unwrap_err();
        assert!(matches!(err, CreditScoreError::InvalidWeights(_)));
    }

    #[test]
    fn test_weighted_sum_of_uniform_breakdown() {
        let weights = ScoringWeights::default();
        let breakdown = ScoreBreakdown {
            payment_history: 50.0,
            amounts_owed: 50.0,
            credit_history: 50.0,
            credit_mix: 50.0,
            new_credit: 50.0,
        };
        assert!((weights.weighted_sum(&breakdown) - 50.0).abs() < 1e-9);
    }
}
