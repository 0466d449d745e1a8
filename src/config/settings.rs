use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    config::RpcSettings,
    scoring::{algorithm::DEFAULT_NEW_CREDIT_WINDOW_DAYS, RiskThresholds, ScoringWeights},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub provider: ProviderSettings,
    pub rpc: RpcSettings,
    pub retry: RetrySettings,
    pub scoring: ScoringSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub log_level: String,
}

/// Indexed blockchain-data API (balances and transactions by address).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    pub chain_id: u64,
    pub timeout_seconds: u64,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

/// What to do when neither RPC node could classify an address.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnknownAddressPolicy {
    /// Log a warning and score the address as a wallet.
    Permissive,
    /// Refuse to score.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    pub weights: ScoringWeights,
    pub risk_thresholds: RiskThresholds,
    pub new_credit_window_days: u32,
    pub unknown_address_policy: UnknownAddressPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "Wallet Credit Scorer".to_string(),
                log_level: "info".to_string(),
            },
            provider: ProviderSettings {
                base_url: "https://api.covalenthq.com".to_string(),
                api_key: String::new(),
                chain_id: 1,
                timeout_seconds: 30,
                page_size: 100,
            },
            rpc: RpcSettings::default(),
            retry: RetrySettings {
                max_attempts: 3,
                base_delay_ms: 1000,
            },
            scoring: ScoringSettings {
                weights: ScoringWeights::default(),
                risk_thresholds: RiskThresholds::default(),
                new_credit_window_days: DEFAULT_NEW_CREDIT_WINDOW_DAYS,
                unknown_address_policy: UnknownAddressPolicy::Permissive,
            },
        }
    }
}

impl Settings {
    /// Defaults, then `config/default.*`, `config/local.*`, then `CREDIT_SCORE_*`
    /// environment variables (`__` separates nested keys).
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("CREDIT_SCORE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CREDIT_SCORE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.scoring.weights.validate().map_err(|e| e.to_string())?;
        self.scoring.risk_thresholds.validate().map_err(|e| e.to_string())?;
        self.rpc_endpoints()?.validate()?;

        if self.scoring.new_credit_window_days == 0 {
            return Err("New credit window must be at least one day".to_string());
        }

        if self.retry.max_attempts == 0 {
            return Err("Retry budget must allow at least one attempt".to_string());
        }

        if self.provider.timeout_seconds == 0 {
            return Err("Provider timeout must be at least one second".to_string());
        }

        if self.provider.base_url.trim().is_empty() {
            return Err("Provider base URL must be set".to_string());
        }

        Ok(())
    }

    /// RPC endpoints for `provider.chain_id`, with unset URLs taken from the
    /// public endpoint table of that chain.
    pub fn rpc_endpoints(&self) -> Result<RpcSettings, String> {
        self.rpc.with_chain_defaults(self.provider.chain_id)
    }

    /// The API key is only needed once a live provider client is built.
    pub fn require_api_key(&self) -> Result<&str, String> {
        let key = self.provider.api_key.trim();
        if key.is_empty() {
            return Err(
                "Provider API key is not set (CREDIT_SCORE_PROVIDER__API_KEY)".to_string(),
            );
        }
        Ok(key)
    }
}
