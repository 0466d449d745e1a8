use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    chains::{resilience::RetryPolicy, DataProvider},
    config::ProviderSettings,
    models::{CreditScoreError, LogEvent, Result, TokenHolding, Transaction},
};

/// Upper bound on transaction pages followed for one address.
const MAX_TRANSACTION_PAGES: usize = 10;

/// Longest response body excerpt kept in an error message.
const MAX_ERROR_BODY: usize = 256;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    error: bool,
    error_message: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct ItemsPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    links: Option<PageLinks>,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BalanceItem {
    contract_name: Option<String>,
    contract_ticker_symbol: Option<String>,
    quote: Option<f64>,
}

impl From<BalanceItem> for TokenHolding {
    fn from(item: BalanceItem) -> Self {
        TokenHolding {
            contract_name: item.contract_name.unwrap_or_default(),
            ticker_symbol: item.contract_ticker_symbol.unwrap_or_default(),
            quote_value_usd: item.quote.filter(|q| q.is_finite()).unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TransactionItem {
    from_address: Option<String>,
    to_address: Option<String>,
    block_signed_at: DateTime<Utc>,
    summary: Option<String>,
    log_events: Option<Vec<LogEventItem>>,
}

#[derive(Debug, Deserialize)]
struct LogEventItem {
    sender_address: Option<String>,
    decoded: Option<DecodedEvent>,
}

#[derive(Debug, Deserialize)]
struct DecodedEvent {
    name: Option<String>,
}

impl From<TransactionItem> for Transaction {
    fn from(item: TransactionItem) -> Self {
        let log_events: Vec<LogEvent> = item
            .log_events
            .unwrap_or_default()
            .into_iter()
            .map(|event| LogEvent {
                sender_address: event.sender_address.unwrap_or_default(),
                event_name: event.decoded.and_then(|d| d.name),
            })
            .collect();

        // Without an explicit summary, decoded event names stand in for one
        // so that e.g. a `Repay` event is still visible to repayment detection.
        let summary_text = match item.summary {
            Some(summary) if !summary.trim().is_empty() => summary,
            _ => log_events
                .iter()
                .filter_map(|e| e.event_name.as_deref())
                .collect::<Vec<_>>()
                .join(" "),
        };

        Transaction {
            from_address: item.from_address.unwrap_or_default(),
            to_address: item.to_address,
            block_signed_at: item.block_signed_at,
            summary_text,
            log_events,
        }
    }
}

/// Client for a Covalent/GoldRush style indexed data API.
pub struct CovalentClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    chain_id: u64,
    page_size: String,
    retry: RetryPolicy,
}

impl CovalentClient {
    pub fn new(settings: &ProviderSettings, retry: RetryPolicy) -> Result<Self> {
        let api_key = settings.api_key.trim();
        if api_key.is_empty() {
            return Err(CreditScoreError::Config(
                "Data provider API key is not configured".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(concat!("wallet-credit-scorer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            chain_id: settings.chain_id,
            page_size: settings.page_size.max(1).to_string(),
            retry,
        })
    }

    fn endpoint(&self, address: &str, resource: &str) -> String {
        format!(
            "{}/v1/{}/address/{}/{}/",
            self.base_url, self.chain_id, address, resource
        )
    }

    /// One GET with the rate-limit retry policy applied.
    async fn get_page<T>(&self, operation: &str, url: &str) -> Result<ItemsPage<T>>
    where
        T: DeserializeOwned,
    {
        self.retry
            .run(operation, || self.get_once(url), CreditScoreError::is_rate_limited)
            .await
    }

    async fn get_once<T>(&self, url: &str) -> Result<ItemsPage<T>>
    where
        T: DeserializeOwned,
    {
        debug!(url = %url, "requesting data provider");
        let response = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("page-size", self.page_size.as_str())])
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "data provider returned non-success status");
            return Err(CreditScoreError::DataUnavailable {
                status: Some(status.as_u16()),
                message: truncate(&body),
            });
        }

        let body = response.text().await.map_err(unavailable)?;
        let envelope: Envelope<ItemsPage<T>> =
            serde_json::from_str(&body).map_err(|e| CreditScoreError::DataUnavailable {
                status: Some(status.as_u16()),
                message: format!("malformed response: {}", e),
            })?;

        if envelope.error {
            return Err(CreditScoreError::DataUnavailable {
                status: envelope.error_code,
                message: envelope
                    .error_message
                    .unwrap_or_else(|| "provider reported an error".to_string()),
            });
        }

        Ok(envelope.data.unwrap_or(ItemsPage {
            items: Vec::new(),
            links: None,
        }))
    }
}

#[async_trait]
impl DataProvider for CovalentClient {
    async fn fetch_balances(&self, address: &str) -> Result<Vec<TokenHolding>> {
        let url = self.endpoint(address, "balances_v2");
        let page: ItemsPage<BalanceItem> = self.get_page("fetch_balances", &url).await?;
        let holdings: Vec<TokenHolding> = page.items.into_iter().map(TokenHolding::from).collect();

        info!(address = %address, count = holdings.len(), "fetched token balances");
        Ok(holdings)
    }

    async fn fetch_transactions(&self, address: &str) -> Result<Vec<Transaction>> {
        let mut url = self.endpoint(address, "transactions_v3");
        let mut transactions = Vec::new();

        for page_number in 0..MAX_TRANSACTION_PAGES {
            let page: ItemsPage<TransactionItem> =
                self.get_page("fetch_transactions", &url).await?;
            transactions.extend(page.items.into_iter().map(Transaction::from));

            match page.links.and_then(|l| l.next) {
                Some(next) if !next.is_empty() => {
                    if page_number + 1 == MAX_TRANSACTION_PAGES {
                        warn!(
                            address = %address,
                            pages = MAX_TRANSACTION_PAGES,
                            "transaction history truncated"
                        );
                    }
                    url = next;
                }
                _ => break,
            }
        }

        info!(address = %address, count = transactions.len(), "fetched transactions");
        Ok(transactions)
    }
}

fn unavailable(err: reqwest::Error) -> CreditScoreError {
    CreditScoreError::DataUnavailable {
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDRESS: &str = "0x742d35cc6634c0532925a3b844bc9e7595f6e842";

    fn test_settings(base_url: String) -> ProviderSettings {
        ProviderSettings {
            base_url,
            api_key: "test-key".to_string(),
            chain_id: 1,
            timeout_seconds: 5,
            page_size: 100,
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    fn balances_body() -> serde_json::Value {
        serde_json::json!({
            "data": {
                "address": ADDRESS,
                "items": [
                    {"contract_name": "Aave Token", "contract_ticker_symbol": "AAVE", "quote": 1200.5},
                    {"contract_name": null, "contract_ticker_symbol": null, "quote": null}
                ]
            },
            "error": false,
            "error_message": null,
            "error_code": null
        })
    }

    #[tokio::test]
    async fn test_fetch_balances_parses_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/1/address/{}/balances_v2/", ADDRESS)))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(balances_body()))
            .mount(&server)
            .await;

        let client = CovalentClient::new(&test_settings(server.uri()), fast_retry()).unwrap();
        let holdings = client.fetch_balances(ADDRESS).await.unwrap();

        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0], TokenHolding::new("Aave Token", "AAVE", 1200.5));
        assert_eq!(holdings[1], TokenHolding::new("", "", 0.0));
    }

    #[tokio::test]
    async fn test_retries_rate_limit_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(balances_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = CovalentClient::new(&test_settings(server.uri()), fast_retry()).unwrap();
        let holdings = client.fetch_balances(ADDRESS).await.unwrap();
        assert_eq!(holdings.len(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_is_data_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let client = CovalentClient::new(&test_settings(server.uri()), fast_retry()).unwrap();
        let err = client.fetch_balances(ADDRESS).await.unwrap_err();

        assert!(matches!(
            err,
            CreditScoreError::DataUnavailable { status: Some(429), .. }
        ));
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = CovalentClient::new(&test_settings(server.uri()), fast_retry()).unwrap();
        let err = client.fetch_transactions(ADDRESS).await.unwrap_err();

        match err {
            CreditScoreError::DataUnavailable { status, message } => {
                assert_eq!(status, Some(401));
                assert_eq!(message, "invalid key");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(balances_body())
                    .set_delay(Duration::from_secs(3)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = test_settings(server.uri());
        settings.timeout_seconds = 1;
        let client = CovalentClient::new(&settings, fast_retry()).unwrap();
        let err = client.fetch_balances(ADDRESS).await.unwrap_err();

        assert!(matches!(
            err,
            CreditScoreError::DataUnavailable { status: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_provider_error_flag_is_data_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": null,
                "error": true,
                "error_message": "Chain not supported",
                "error_code": 400
            })))
            .mount(&server)
            .await;

        let client = CovalentClient::new(&test_settings(server.uri()), fast_retry()).unwrap();
        let err = client.fetch_balances(ADDRESS).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_fetch_transactions_follows_pages_and_builds_summaries() {
        let server = MockServer::start().await;
        let next = format!("{}/v1/1/address/{}/transactions_v3/page/1/", server.uri(), ADDRESS);

        Mock::given(method("GET"))
            .and(path(format!("/v1/1/address/{}/transactions_v3/", ADDRESS)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "items": [{
                        "from_address": ADDRESS,
                        "to_address": "0x87870bca3f3fd6335c3f4ce8392d69350b4fa4e2",
                        "block_signed_at": "2024-05-01T10:00:00Z",
                        "log_events": [{
                            "sender_address": "0x87870bca3f3fd6335c3f4ce8392d69350b4fa4e2",
                            "decoded": {"name": "Repay"}
                        }]
                    }],
                    "links": {"prev": null, "next": next}
                },
                "error": false
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/v1/1/address/{}/transactions_v3/page/1/", ADDRESS)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "items": [{
                        "from_address": ADDRESS,
                        "to_address": null,
                        "block_signed_at": "2024-04-01T10:00:00Z",
                        "summary": "Swap 1 ETH for USDC",
                        "log_events": null
                    }],
                    "links": {"prev": null, "next": null}
                },
                "error": false
            })))
            .mount(&server)
            .await;

        let client = CovalentClient::new(&test_settings(server.uri()), fast_retry()).unwrap();
        let txs = client.fetch_transactions(ADDRESS).await.unwrap();

        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].summary_text, "Repay");
        assert_eq!(txs[0].log_events.len(), 1);
        assert_eq!(txs[1].summary_text, "Swap 1 ETH for USDC");
        assert!(txs[1].log_events.is_empty());
    }

    #[tokio::test]
    async fn test_empty_history_is_valid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"items": []},
                "error": false
            })))
            .mount(&server)
            .await;

        let client = CovalentClient::new(&test_settings(server.uri()), fast_retry()).unwrap();
        assert!(client.fetch_transactions(ADDRESS).await.unwrap().is_empty());
        assert!(client.fetch_balances(ADDRESS).await.unwrap().is_empty());
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let mut settings = test_settings("http://localhost".to_string());
        settings.api_key = "  ".to_string();
        assert!(matches!(
            CovalentClient::new(&settings, fast_retry()),
            Err(CreditScoreError::Config(_))
        ));
    }
}
