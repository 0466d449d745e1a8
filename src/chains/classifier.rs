use async_trait::async_trait;
use ethers::{
    providers::{Http, JsonRpcClient, Middleware, Provider},
    types::Address,
};
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    config::RpcSettings,
    models::{AddressKind, CreditScoreError, Result},
};

/// Reads deployed bytecode for an address, hex encoded with a `0x` prefix.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeReader: Send + Sync {
    async fn get_code(&self, address: &str) -> Result<String>;
}

/// `eth_getCode` over JSON-RPC with a per-call timeout.
pub struct EthersCodeReader<P = Http> {
    provider: Provider<P>,
    endpoint: String,
    timeout: Duration,
}

impl EthersCodeReader<Http> {
    pub fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| CreditScoreError::Config(format!("Invalid RPC URL {}: {}", url, e)))?;
        Ok(Self::with_provider(provider, url, timeout))
    }
}

impl<P> EthersCodeReader<P> {
    pub fn with_provider(
        provider: Provider<P>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl<P> CodeReader for EthersCodeReader<P>
where
    P: JsonRpcClient + 'static,
{
    async fn get_code(&self, address: &str) -> Result<String> {
        let parsed = Address::from_str(address)
            .map_err(|_| CreditScoreError::AddressUnresolvable(address.to_string()))?;

        let code = timeout(self.timeout, self.provider.get_code(parsed, None))
            .await
            .map_err(|_| CreditScoreError::Timeout {
                operation: format!("eth_getCode on {}", self.endpoint),
            })?
            .map_err(|e| CreditScoreError::Rpc {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
            })?;

        Ok(format!("0x{}", hex::encode(code.as_ref())))
    }
}

fn is_empty_code(code: &str) -> bool {
    let trimmed = code.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("0x") || trimmed.eq_ignore_ascii_case("0x0")
}

/// Tells wallets from contracts by asking for bytecode, primary node first.
pub struct RpcClassifier {
    primary: Arc<dyn CodeReader>,
    fallback: Arc<dyn CodeReader>,
}

impl RpcClassifier {
    pub fn new(primary: Arc<dyn CodeReader>, fallback: Arc<dyn CodeReader>) -> Self {
        Self { primary, fallback }
    }

    pub fn from_settings(settings: &RpcSettings) -> Result<Self> {
        let per_call = Duration::from_secs(settings.timeout_seconds.max(1));
        let primary = EthersCodeReader::connect(&settings.primary_url, per_call)?;
        let fallback = EthersCodeReader::connect(&settings.fallback_url, per_call)?;
        Ok(Self::new(Arc::new(primary), Arc::new(fallback)))
    }

    /// Never fails: when neither node answers the result is `AddressKind::Unknown`.
    pub async fn classify(&self, address: &str) -> AddressKind {
        let primary_error = match self.primary.get_code(address).await {
            Ok(code) => return Self::kind_from_code(address, &code),
            Err(e) => e,
        };
        warn!(address = %address, error = %primary_error, "primary RPC failed, trying fallback");

        match self.fallback.get_code(address).await {
            Ok(code) => Self::kind_from_code(address, &code),
            Err(e) => {
                warn!(
                    address = %address,
                    primary_error = %primary_error,
                    fallback_error = %e,
                    "address classification failed on both RPC endpoints"
                );
                AddressKind::Unknown
            }
        }
    }

    fn kind_from_code(address: &str, code: &str) -> AddressKind {
        let kind = if is_empty_code(code) {
            AddressKind::Eoa
        } else {
            AddressKind::Contract
        };
        debug!(address = %address, code_len = code.len(), "bytecode fetched");
        info!(address = %address, kind = kind.as_str(), "address classified");
        kind
    }
}
