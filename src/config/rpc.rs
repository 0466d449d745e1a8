use serde::{Deserialize, Serialize};

/// Node endpoints used by the address classifier. Empty URLs are filled from
/// the public endpoint table of the configured chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSettings {
    pub primary_url: String,
    pub fallback_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct PublicEndpoints {
    pub chain_id: u64,
    pub primary: &'static str,
    pub fallback: &'static str,
}

const PUBLIC_ENDPOINTS: &[PublicEndpoints] = &[
    PublicEndpoints {
        chain_id: 1,
        primary: "https://ethereum.publicnode.com",
        fallback: "https://1rpc.io/eth",
    },
    PublicEndpoints {
        chain_id: 42161,
        primary: "https://arbitrum-one.publicnode.com",
        fallback: "https://arb1.arbitrum.io/rpc",
    },
    PublicEndpoints {
        chain_id: 10,
        primary: "https://optimism.publicnode.com",
        fallback: "https://mainnet.optimism.io",
    },
    PublicEndpoints {
        chain_id: 8453,
        primary: "https://base.publicnode.com",
        fallback: "https://mainnet.base.org",
    },
];

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            primary_url: String::new(),
            fallback_url: String::new(),
            timeout_seconds: 10,
        }
    }
}

impl RpcSettings {
    /// Public endpoint pair for a known chain id.
    pub fn for_chain(chain_id: u64) -> Option<Self> {
        PUBLIC_ENDPOINTS
            .iter()
            .find(|e| e.chain_id == chain_id)
            .map(|e| Self {
                primary_url: e.primary.to_string(),
                fallback_url: e.fallback.to_string(),
                timeout_seconds: 10,
            })
    }

    /// Keeps explicitly configured URLs and takes the rest from the public
    /// endpoints of `chain_id`.
    pub fn with_chain_defaults(&self, chain_id: u64) -> Result<Self, String> {
        let known = Self::for_chain(chain_id);
        let public = known.as_ref();
        let pick = |configured: &str, fallback: Option<&str>| -> Result<String, String> {
            match configured.trim() {
                "" => fallback.map(str::to_string).ok_or_else(|| {
                    format!(
                        "No public RPC endpoints known for chain {}; set rpc.primary_url and rpc.fallback_url",
                        chain_id
                    )
                }),
                url => Ok(url.to_string()),
            }
        };

        Ok(Self {
            primary_url: pick(&self.primary_url, public.map(|p| p.primary_url.as_str()))?,
            fallback_url: pick(&self.fallback_url, public.map(|p| p.fallback_url.as_str()))?,
            timeout_seconds: self.timeout_seconds,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.primary_url.trim().is_empty() || self.fallback_url.trim().is_empty() {
            return Err("Both primary and fallback RPC URLs must be set".to_string());
        }
        if self.timeout_seconds == 0 {
            return Err("RPC timeout must be at least one second".to_string());
        }
        Ok(())
    }
}
