pub mod chains;
pub mod config;
pub mod models;
pub mod scoring;
pub mod utils;

pub use chains::{CodeReader, DataProvider, RpcClassifier};
pub use config::Settings;
pub use models::{
    AddressKind, CreditScoreError, Result, RiskLevel, ScoreBand, ScoreBreakdown, ScoreResult,
};
pub use scoring::{ScoreCalculator, ScoreDiagnostics};
pub use utils::NameResolver;
