pub mod algorithm;
pub mod calculator;
pub mod protocols;
pub mod repayment;
pub mod risk;
pub mod weights;

pub use algorithm::{ScoreDiagnostics, ScoringAlgorithm};
pub use calculator::ScoreCalculator;
pub use protocols::{ProtocolCategory, ProtocolTable};
pub use repayment::{RepaymentDetector, SummaryPatternDetector};
pub use risk::{Aggregator, RiskThresholds};
pub use weights::ScoringWeights;
