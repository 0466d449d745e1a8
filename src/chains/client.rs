use async_trait::async_trait;

use crate::models::{Result, TokenHolding, Transaction};

/// Indexed balance and transaction views for an address.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Token holdings with USD quotes. An empty list is a valid answer.
    async fn fetch_balances(&self, address: &str) -> Result<Vec<TokenHolding>>;

    /// Transaction history. An empty list is a valid answer.
    async fn fetch_transactions(&self, address: &str) -> Result<Vec<Transaction>>;
}

