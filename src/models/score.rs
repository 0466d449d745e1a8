use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Factor {
    PaymentHistory,
    AmountsOwed,
    CreditHistory,
    CreditMix,
    NewCredit,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::PaymentHistory,
        Factor::AmountsOwed,
        Factor::CreditHistory,
        Factor::CreditMix,
        Factor::NewCredit,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Factor::PaymentHistory => "Payment History",
            Factor::AmountsOwed => "Amounts Owed",
            Factor::CreditHistory => "Credit History",
            Factor::CreditMix => "Credit Mix",
            Factor::NewCredit => "New Credit",
        }
    }

    /// Advice shown when the factor scores below `TIP_THRESHOLD`.
    pub fn tip(&self) -> &'static str {
        match self {
            Factor::PaymentHistory => "Repay borrowed positions on time to build a repayment record.",
            Factor::AmountsOwed => "Reduce outstanding debt relative to the value of your holdings.",
            Factor::CreditHistory => "Keep the wallet active over time; age and steady activity both count.",
            Factor::CreditMix => "Diversify across lending, DEX, NFT and derivatives protocols.",
            Factor::NewCredit => "Avoid touching many new protocols in a short period.",
        }
    }
}

/// Sub-scores below this value get an improvement tip.
pub const TIP_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub payment_history: f64,
    pub amounts_owed: f64,
    pub credit_history: f64,
    pub credit_mix: f64,
    pub new_credit: f64,
}

impl ScoreBreakdown {
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::PaymentHistory => self.payment_history,
            Factor::AmountsOwed => self.amounts_owed,
            Factor::CreditHistory => self.credit_history,
            Factor::CreditMix => self.credit_mix,
            Factor::NewCredit => self.new_credit,
        }
    }

    pub fn factors(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        Factor::ALL.iter().map(move |f| (*f, self.get(*f)))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Descriptive label over the 0-100 scale. `RiskLevel` is the decision tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => ScoreBand::Excellent,
            s if s >= 80.0 => ScoreBand::VeryGood,
            s if s >= 65.0 => ScoreBand::Good,
            s if s >= 50.0 => ScoreBand::Fair,
            s if s >= 30.0 => ScoreBand::Poor,
            _ => ScoreBand::VeryPoor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::VeryGood => "Very Good",
            ScoreBand::Good => "Good",
            ScoreBand::Fair => "Fair",
            ScoreBand::Poor => "Poor",
            ScoreBand::VeryPoor => "Very Poor",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreResult {
    pub address: String,
    /// The name the caller supplied, when it differs from `address`.
    pub input: Option<String>,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub risk_level: RiskLevel,
    pub band: ScoreBand,
    pub last_updated: DateTime<Utc>,
}

impl ScoreResult {
    pub fn improvement_tips(&self) -> Vec<(Factor, &'static str)> {
        self.breakdown
            .factors()
            .filter(|(_, value)| *value < TIP_THRESHOLD)
            .map(|(factor, _)| (factor, factor.tip()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries_are_inclusive() {
        assert_eq!(ScoreBand::from_score(100.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(90.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(89.99), ScoreBand::VeryGood);
        assert_eq!(ScoreBand::from_score(65.0), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(50.0), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(30.0), ScoreBand::Poor);
        assert_eq!(ScoreBand::from_score(0.0), ScoreBand::VeryPoor);
    }

    #[test]
    fn test_tips_only_for_weak_factors() {
        let result = ScoreResult {
            address: "0xabc".to_string(),
            input: None,
            score: 74.0,
            breakdown: ScoreBreakdown {
                payment_history: 80.0,
                amounts_owed: 100.0,
                credit_history: 33.88,
                credit_mix: 40.0,
                new_credit: 79.99,
            },
            risk_level: RiskLevel::Medium,
            band: ScoreBand::Good,
            last_updated: Utc::now(),
        };

        let tips: Vec<Factor> = result.improvement_tips().into_iter().map(|(f, _)| f).collect();
        assert_eq!(tips, vec![Factor::CreditHistory, Factor::CreditMix, Factor::NewCredit]);
    }
}
