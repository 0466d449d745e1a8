use thiserror::Error;

#[derive(Error, Debug)]
pub enum CreditScoreError {
    #[error("Address could not be resolved: {0}")]
    AddressUnresolvable(String),

    #[error("Could not determine whether {0} is a wallet or a contract")]
    ClassificationIndeterminate(String),

    #[error("{0} is a contract address; only wallets can be scored")]
    ContractAddress(String),

    #[error("Data provider unavailable{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    DataUnavailable { status: Option<u16>, message: String },

    #[error("RPC error on {endpoint}: {message}")]
    Rpc { endpoint: String, message: String },

    #[error("Timed out during {operation}")]
    Timeout { operation: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid scoring weights: {0}")]
    InvalidWeights(String),
}

impl CreditScoreError {
    /// HTTP status that caused the failure, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            CreditScoreError::DataUnavailable { status, .. } => *status,
            CreditScoreError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Rate limiting is the only failure the data provider client retries.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

pub type Result<T> = std::result::Result<T, CreditScoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_unavailable_message_includes_status() {
        let err = CreditScoreError::DataUnavailable {
            status: Some(429),
            message: "retry budget exhausted".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Data provider unavailable (HTTP 429): retry budget exhausted"
        );
        assert!(err.is_rate_limited());

        let err = CreditScoreError::DataUnavailable {
            status: None,
            message: "malformed body".to_string(),
        };
        assert_eq!(err.to_string(), "Data provider unavailable: malformed body");
        assert!(!err.is_rate_limited());
    }
}
