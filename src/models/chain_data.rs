use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The zero address; log events emitted "from" it are mints/burns, not protocols.
pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AddressKind {
    Eoa,
    Contract,
    Unknown,
}

impl AddressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Eoa => "EOA",
            AddressKind::Contract => "Contract",
            AddressKind::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenHolding {
    pub contract_name: String,
    pub ticker_symbol: String,
    pub quote_value_usd: f64,
}

impl TokenHolding {
    pub fn new(
        contract_name: impl Into<String>,
        ticker_symbol: impl Into<String>,
        quote_value_usd: f64,
    ) -> Self {
        Self {
            contract_name: contract_name.into(),
            ticker_symbol: ticker_symbol.into(),
            quote_value_usd,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEvent {
    pub sender_address: String,
    pub event_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub from_address: String,
    pub to_address: Option<String>,
    pub block_signed_at: DateTime<Utc>,
    pub summary_text: String,
    pub log_events: Vec<LogEvent>,
}

impl Transaction {
    pub fn new(from_address: impl Into<String>, block_signed_at: DateTime<Utc>) -> Self {
        Self {
            from_address: from_address.into(),
            to_address: None,
            block_signed_at,
            summary_text: String::new(),
            log_events: Vec::new(),
        }
    }

    pub fn with_to(mut self, to_address: impl Into<String>) -> Self {
        self.to_address = Some(to_address.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary_text = summary.into();
        self
    }

    pub fn with_log_event(
        mut self,
        sender_address: impl Into<String>,
        event_name: Option<&str>,
    ) -> Self {
        self.log_events.push(LogEvent {
            sender_address: sender_address.into(),
            event_name: event_name.map(str::to_string),
        });
        self
    }
}

/// Sum of USD quotes across all holdings. Missing quotes count as zero.
pub fn total_holdings_value_usd(holdings: &[TokenHolding]) -> f64 {
    holdings
        .iter()
        .map(|h| h.quote_value_usd)
        .filter(|v| v.is_finite() && *v > 0.0)
        .sum()
}
