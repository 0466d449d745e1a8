use async_trait::async_trait;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::models::{CreditScoreError, Result};

/// Turns a human-readable name into an on-chain address.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<String>;
}

/// ENS resolution through an Ethereum mainnet node.
pub struct EnsResolver<P = Http> {
    provider: Provider<P>,
    timeout: Duration,
}

impl EnsResolver<Http> {
    pub fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| CreditScoreError::Config(format!("Invalid RPC URL {}: {}", url, e)))?;
        Ok(Self::with_provider(provider, timeout))
    }
}

impl<P> EnsResolver<P> {
    pub fn with_provider(provider: Provider<P>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl<P> NameResolver for EnsResolver<P>
where
    P: JsonRpcClient + 'static,
{
    async fn resolve(&self, name: &str) -> Result<String> {
        let lookup = timeout(self.timeout, self.provider.resolve_name(name))
            .await
            .map_err(|_| {
                warn!(name = %name, "ENS lookup timed out");
                CreditScoreError::AddressUnresolvable(name.to_string())
            })?;

        match lookup {
            Ok(address) => {
                let resolved = format!("{:?}", address);
                debug!(name = %name, address = %resolved, "ENS name resolved");
                Ok(resolved)
            }
            Err(e) => {
                warn!(name = %name, error = %e, "ENS lookup failed");
                Err(CreditScoreError::AddressUnresolvable(name.to_string()))
            }
        }
    }
}
