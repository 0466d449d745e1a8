use crate::models::Transaction;

/// Decides whether a transaction repaid a loan. Payment history only sees this
/// trait, so a structured event-log parser can replace the summary heuristic.
pub trait RepaymentDetector: Send + Sync {
    fn is_repayment(&self, tx: &Transaction) -> bool;
}

/// Case-insensitive substring match on the transaction summary.
#[derive(Debug, Clone)]
pub struct SummaryPatternDetector {
    patterns: Vec<String>,
}

impl Default for SummaryPatternDetector {
    fn default() -> Self {
        Self::new(&["repay", "repaid"])
    }
}

impl SummaryPatternDetector {
    pub fn new(patterns: &[&str]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_lowercase()).collect(),
        }
    }
}

impl RepaymentDetector for SummaryPatternDetector {
    fn is_repayment(&self, tx: &Transaction) -> bool {
        if tx.summary_text.is_empty() {
            return false;
        }
        let summary = tx.summary_text.to_lowercase();
        self.patterns.iter().any(|p| summary.contains(p.as_str()))
    }
}
