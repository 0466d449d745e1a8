use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

use crate::{
    chains::{CovalentClient, DataProvider, RetryPolicy, RpcClassifier},
    config::{Settings, UnknownAddressPolicy},
    models::{AddressKind, CreditScoreError, Result, ScoreResult},
    scoring::{algorithm::ScoreDiagnostics, Aggregator, ScoringAlgorithm},
    utils::{is_ens_name, parse_address, EnsResolver, NameResolver},
};

/// Scores one wallet at a time: resolve, classify, fetch, calculate, aggregate.
pub struct ScoreCalculator {
    provider: Arc<dyn DataProvider>,
    classifier: RpcClassifier,
    resolver: Option<Arc<dyn NameResolver>>,
    algorithm: ScoringAlgorithm,
    aggregator: Aggregator,
    unknown_policy: UnknownAddressPolicy,
}

impl ScoreCalculator {
    pub fn new(
        provider: Arc<dyn DataProvider>,
        classifier: RpcClassifier,
        algorithm: ScoringAlgorithm,
        aggregator: Aggregator,
    ) -> Self {
        Self {
            provider,
            classifier,
            resolver: None,
            algorithm,
            aggregator,
            unknown_policy: UnknownAddressPolicy::Permissive,
        }
    }

    pub fn with_name_resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_unknown_policy(mut self, policy: UnknownAddressPolicy) -> Self {
        self.unknown_policy = policy;
        self
    }

    /// Wires live collaborators from configuration. ENS names are resolved
    /// through the primary RPC endpoint, which is only meaningful on mainnet.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate().map_err(CreditScoreError::Config)?;
        settings.require_api_key().map_err(CreditScoreError::Config)?;
        let rpc = settings.rpc_endpoints().map_err(CreditScoreError::Config)?;

        let provider = CovalentClient::new(&settings.provider, RetryPolicy::from(&settings.retry))?;
        let classifier = RpcClassifier::from_settings(&rpc)?;
        let algorithm = ScoringAlgorithm::new(settings.scoring.new_credit_window_days);
        let aggregator =
            Aggregator::new(settings.scoring.weights, settings.scoring.risk_thresholds)?;

        let mut calculator = Self::new(Arc::new(provider), classifier, algorithm, aggregator)
            .with_unknown_policy(settings.scoring.unknown_address_policy);

        if settings.provider.chain_id == 1 {
            let resolver = EnsResolver::connect(
                &rpc.primary_url,
                Duration::from_secs(rpc.timeout_seconds.max(1)),
            )?;
            calculator = calculator.with_name_resolver(Arc::new(resolver));
        }

        Ok(calculator)
    }

    pub async fn compute_score(&self, input: &str) -> Result<ScoreResult> {
        let (result, _) = self.compute_score_detailed(input).await?;
        Ok(result)
    }

    pub async fn compute_score_detailed(
        &self,
        input: &str,
    ) -> Result<(ScoreResult, ScoreDiagnostics)> {
        self.compute_score_at(input, Utc::now()).await
    }

    /// Scores as of `now`: window boundaries and ages are measured from it.
    pub async fn compute_score_at(
        &self,
        input: &str,
        now: DateTime<Utc>,
    ) -> Result<(ScoreResult, ScoreDiagnostics)> {
        let address = self.resolve_address(input).await?;
        info!(address = %address, "computing credit score");

        self.ensure_wallet(&address).await?;

        let (holdings, transactions) = futures::try_join!(
            self.provider.fetch_balances(&address),
            self.provider.fetch_transactions(&address),
        )?;

        let diagnostics = self.algorithm.calculate(&holdings, &transactions, now);
        let mut result = self.aggregator.aggregate(&address, diagnostics.breakdown(), now);
        if is_ens_name(input) {
            result.input = Some(input.trim().to_string());
        }

        info!(
            address = %address,
            score = result.score,
            risk_level = result.risk_level.as_str(),
            holdings = holdings.len(),
            transactions = transactions.len(),
            "credit score computed"
        );

        Ok((result, diagnostics))
    }

    /// Hex addresses are normalised; `.eth` names go through the resolver.
    pub async fn resolve_address(&self, input: &str) -> Result<String> {
        if !is_ens_name(input) {
            return parse_address(input);
        }

        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| CreditScoreError::AddressUnresolvable(input.trim().to_string()))?;
        let resolved = resolver.resolve(input.trim()).await?;
        parse_address(&resolved)
    }

    pub async fn classify(&self, input: &str) -> Result<AddressKind> {
        let address = self.resolve_address(input).await?;
        Ok(self.classifier.classify(&address).await)
    }

    async fn ensure_wallet(&self, address: &str) -> Result<()> {
        match self.classifier.classify(address).await {
            AddressKind::Eoa => Ok(()),
            AddressKind::Contract => Err(CreditScoreError::ContractAddress(address.to_string())),
            AddressKind::Unknown => match self.unknown_policy {
                UnknownAddressPolicy::Strict => {
                    Err(CreditScoreError::ClassificationIndeterminate(address.to_string()))
                }
                UnknownAddressPolicy::Permissive => {
                    warn!(
                        address = %address,
                        "classification indeterminate, scoring as a wallet"
                    );
                    Ok(())
                }
            },
        }
    }
}
