use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    models::{total_holdings_value_usd, ScoreBreakdown, TokenHolding, Transaction, NULL_ADDRESS},
    scoring::{
        protocols::{ProtocolCategory, ProtocolTable},
        repayment::{RepaymentDetector, SummaryPatternDetector},
    },
};

pub const DEFAULT_NEW_CREDIT_WINDOW_DAYS: u32 = 30;

// Payment history
const REPAYMENT_VOLUME_PROXY_USD: f64 = 1_000.0;
const REPAYMENT_VOLUME_CEILING_USD: f64 = 500_000.0;
const NO_REPAYMENT_DAYS: f64 = 999.0;
const REPAYMENT_RECENCY_DECAY: f64 = 0.03;

// Amounts owed
const HOLDINGS_EPSILON: f64 = 1e-6;

// Credit history
const FULL_HISTORY_DAYS: f64 = 365.0 * 3.0;

// New credit
const NEW_PROTOCOL_DECAY: f64 = 0.3;

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Signals that have no data feed yet. Both default to zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CreditSignals {
    pub liquidation_count: u32,
    pub outstanding_debt_usd: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PaymentHistory {
    pub value: f64,
    pub liquidation_count: u32,
    pub repayment_count: usize,
    pub days_since_last_repay: f64,
    pub consistency: f64,
    pub volume: f64,
    pub recency: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AmountsOwed {
    pub value: f64,
    pub debt_usd: f64,
    pub total_holdings_usd: f64,
    pub utilization: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CreditHistory {
    pub value: f64,
    pub days_since_first_tx: i64,
    pub active_days: usize,
    pub age: f64,
    pub activity: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CreditMix {
    pub value: f64,
    pub lending: u32,
    pub dex: u32,
    pub nft: u32,
    pub derivatives: u32,
    pub other: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NewCredit {
    pub value: f64,
    pub window_days: u32,
    pub new_protocols: usize,
    pub tx_volume: usize,
    pub unique_senders: usize,
    pub rate: f64,
    pub quality: f64,
}

/// Every sub-score with the intermediate values that produced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreDiagnostics {
    pub payment_history: PaymentHistory,
    pub amounts_owed: AmountsOwed,
    pub credit_history: CreditHistory,
    pub credit_mix: CreditMix,
    pub new_credit: NewCredit,
}

impl ScoreDiagnostics {
    pub fn breakdown(&self) -> ScoreBreakdown {
        ScoreBreakdown {
            payment_history: self.payment_history.value,
            amounts_owed: self.amounts_owed.value,
            credit_history: self.credit_history.value,
            credit_mix: self.credit_mix.value,
            new_credit: self.new_credit.value,
        }
    }
}

/// The five sub-score calculators. All of them are pure: same inputs and `now`,
/// same output.
#[derive(Clone)]
pub struct ScoringAlgorithm {
    detector: Arc<dyn RepaymentDetector>,
    protocols: ProtocolTable,
    new_credit_window_days: u32,
}

impl Default for ScoringAlgorithm {
    fn default() -> Self {
        Self::new(DEFAULT_NEW_CREDIT_WINDOW_DAYS)
    }
}

impl ScoringAlgorithm {
    pub fn new(new_credit_window_days: u32) -> Self {
        Self {
            detector: Arc::new(SummaryPatternDetector::default()),
            protocols: ProtocolTable::default(),
            new_credit_window_days,
        }
    }

    pub fn with_repayment_detector(mut self, detector: Arc<dyn RepaymentDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_protocol_table(mut self, protocols: ProtocolTable) -> Self {
        self.protocols = protocols;
        self
    }

    pub fn new_credit_window_days(&self) -> u32 {
        self.new_credit_window_days
    }

    pub fn calculate(
        &self,
        holdings: &[TokenHolding],
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> ScoreDiagnostics {
        self.calculate_with_signals(holdings, transactions, CreditSignals::default(), now)
    }

    pub fn calculate_with_signals(
        &self,
        holdings: &[TokenHolding],
        transactions: &[Transaction],
        signals: CreditSignals,
        now: DateTime<Utc>,
    ) -> ScoreDiagnostics {
        ScoreDiagnostics {
            payment_history: self.payment_history(transactions, signals.liquidation_count, now),
            amounts_owed: amounts_owed(holdings, signals.outstanding_debt_usd),
            credit_history: credit_history(transactions, now),
            credit_mix: self.credit_mix(holdings),
            new_credit: new_credit(transactions, self.new_credit_window_days, now),
        }
    }

    pub fn payment_history(
        &self,
        transactions: &[Transaction],
        liquidation_count: u32,
        now: DateTime<Utc>,
    ) -> PaymentHistory {
        let consistency = 100.0 / (1.0 + liquidation_count as f64);

        let repayments: Vec<&Transaction> = transactions
            .iter()
            .filter(|tx| self.detector.is_repayment(tx))
            .collect();

        let repaid_volume_proxy = repayments.len() as f64 * REPAYMENT_VOLUME_PROXY_USD;
        let volume = ((1.0 + repaid_volume_proxy).log10()
            / (1.0 + REPAYMENT_VOLUME_CEILING_USD).log10()
            * 100.0)
            .min(100.0);

        let days_since_last_repay = repayments
            .iter()
            .map(|tx| tx.block_signed_at)
            .max()
            .map(|last| (now - last).num_days().max(0) as f64)
            .unwrap_or(NO_REPAYMENT_DAYS);
        let recency = 100.0 * (-REPAYMENT_RECENCY_DECAY * days_since_last_repay).exp();

        PaymentHistory {
            value: round2(0.80 * consistency + 0.15 * volume + 0.05 * recency),
            liquidation_count,
            repayment_count: repayments.len(),
            days_since_last_repay,
            consistency,
            volume,
            recency,
        }
    }

    pub fn credit_mix(&self, holdings: &[TokenHolding]) -> CreditMix {
        let counts = self.protocols.count_by_category(holdings);
        let count = |category: ProtocolCategory| counts.get(&category).copied().unwrap_or(0);

        let lending = count(ProtocolCategory::Lending);
        let dex = count(ProtocolCategory::Dex);
        let nft = count(ProtocolCategory::Nft);
        let derivatives = count(ProtocolCategory::Derivatives);
        let other = count(ProtocolCategory::Other);

        // Each bucket is capped before summing so no single category dominates.
        let total = (10.0 * lending as f64).min(25.0)
            + (10.0 * dex as f64).min(20.0)
            + (5.0 * nft as f64).min(15.0)
            + (15.0 * derivatives as f64).min(25.0)
            + (5.0 * other as f64).min(10.0);

        CreditMix {
            value: round2(total.min(100.0)),
            lending,
            dex,
            nft,
            derivatives,
            other,
        }
    }
}

pub fn amounts_owed(holdings: &[TokenHolding], debt_usd: f64) -> AmountsOwed {
    let debt_usd = if debt_usd.is_finite() { debt_usd.max(0.0) } else { 0.0 };
    let total_holdings_usd = total_holdings_value_usd(holdings);
    let utilization = debt_usd / (total_holdings_usd + HOLDINGS_EPSILON);

    AmountsOwed {
        value: round2((100.0 * (-utilization).exp()).max(0.0)),
        debt_usd,
        total_holdings_usd,
        utilization,
    }
}

pub fn credit_history(transactions: &[Transaction], now: DateTime<Utc>) -> CreditHistory {
    let days_since_first_tx = transactions
        .iter()
        .map(|tx| tx.block_signed_at)
        .min()
        .map(|first| (now - first).num_days())
        .unwrap_or(1)
        .max(1);

    let active_days = transactions
        .iter()
        .map(|tx| tx.block_signed_at.date_naive())
        .collect::<HashSet<_>>()
        .len();

    let days = days_since_first_tx as f64;
    let age = (days / FULL_HISTORY_DAYS * 100.0).min(100.0);
    // Distinct calendar days can exceed whole elapsed days by one.
    let activity = (active_days as f64 / days * 100.0).min(100.0);

    CreditHistory {
        value: round2(0.9 * age + 0.1 * activity),
        days_since_first_tx,
        active_days,
        age,
        activity,
    }
}

pub fn new_credit(transactions: &[Transaction], window_days: u32, now: DateTime<Utc>) -> NewCredit {
    let window_start = now - Duration::days(window_days as i64);
    let recent: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.block_signed_at >= window_start)
        .collect();

    let protocols: HashSet<String> = recent
        .iter()
        .flat_map(|tx| tx.log_events.iter())
        .map(|event| event.sender_address.trim().to_lowercase())
        .filter(|sender| !sender.is_empty() && sender != NULL_ADDRESS)
        .collect();

    let unique_senders = recent
        .iter()
        .map(|tx| tx.from_address.to_lowercase())
        .collect::<HashSet<_>>()
        .len();

    let new_protocols = protocols.len();
    let tx_volume = recent.len();

    let rate = 100.0 * (-NEW_PROTOCOL_DECAY * new_protocols as f64).exp();
    let tvl_proxy = tx_volume as f64 * (unique_senders as f64 / 10.0).max(1.0);
    let quality = (20.0 * (tvl_proxy + 1.0).log10()).min(100.0);

    NewCredit {
        value: round2(0.7 * rate + 0.3 * quality),
        window_days,
        new_protocols,
        tx_volume,
        unique_senders,
        rate,
        quality,
    }
}
