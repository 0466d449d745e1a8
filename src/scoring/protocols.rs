use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::TokenHolding;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProtocolCategory {
    Lending,
    Dex,
    Nft,
    Derivatives,
    Other,
}

impl ProtocolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolCategory::Lending => "lending",
            ProtocolCategory::Dex => "dex",
            ProtocolCategory::Nft => "nft",
            ProtocolCategory::Derivatives => "derivatives",
            ProtocolCategory::Other => "other",
        }
    }
}

/// Category -> contract-name keywords, matched case-insensitively as substrings.
/// Order matters: the first category with a matching keyword wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolTable {
    entries: Vec<(ProtocolCategory, Vec<String>)>,
}

const LENDING_KEYWORDS: &[&str] = &[
    "aave", "compound", "maker", "liquity", "euler", "morpho", "spark", "venus", "radiant",
];
const DEX_KEYWORDS: &[&str] = &[
    "uniswap", "sushi", "curve", "balancer", "pancake", "1inch", "camelot", "velodrome",
    "aerodrome",
];
const NFT_KEYWORDS: &[&str] = &["nft", "opensea", "blur", "looksrare", "punks", "erc721"];
const DERIVATIVES_KEYWORDS: &[&str] = &[
    "gmx", "dydx", "synthetix", "perp", "gains", "lyra", "hegic", "opyn", "ribbon",
];

impl Default for ProtocolTable {
    fn default() -> Self {
        Self::from_static(&[
            (ProtocolCategory::Lending, LENDING_KEYWORDS),
            (ProtocolCategory::Dex, DEX_KEYWORDS),
            (ProtocolCategory::Nft, NFT_KEYWORDS),
            (ProtocolCategory::Derivatives, DERIVATIVES_KEYWORDS),
        ])
    }
}

impl ProtocolTable {
    pub fn from_static(entries: &[(ProtocolCategory, &[&str])]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(category, keywords)| {
                    (*category, keywords.iter().map(|k| k.to_lowercase()).collect())
                })
                .collect(),
        }
    }

    /// Adds keywords to a category, appending the category if it is new.
    pub fn extend(&mut self, category: ProtocolCategory, keywords: &[&str]) {
        let lowered = keywords.iter().map(|k| k.to_lowercase());
        match self.entries.iter_mut().find(|(c, _)| *c == category) {
            Some((_, existing)) => existing.extend(lowered),
            None => self.entries.push((category, lowered.collect())),
        }
    }

    pub fn classify(&self, contract_name: &str) -> ProtocolCategory {
        let name = contract_name.to_lowercase();
        self.entries
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k.as_str())))
            .map(|(category, _)| *category)
            .unwrap_or(ProtocolCategory::Other)
    }

    /// Number of distinct tickers per category. Holdings sharing a ticker count once;
    /// holdings without a ticker are not protocols and are skipped.
    pub fn count_by_category(&self, holdings: &[TokenHolding]) -> HashMap<ProtocolCategory, u32> {
        let mut seen = HashSet::new();
        let mut counts = HashMap::new();

        for holding in holdings {
            let ticker = holding.ticker_symbol.trim().to_lowercase();
            if ticker.is_empty() || !seen.insert(ticker) {
                continue;
            }
            *counts.entry(self.classify(&holding.contract_name)).or_insert(0) += 1;
        }

        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_case_insensitive() {
        let table = ProtocolTable::default();
        assert_eq!(table.classify("Aave Interest bearing USDC"), ProtocolCategory::Lending);
        assert_eq!(table.classify("UNISWAP"), ProtocolCategory::Dex);
        assert_eq!(table.classify("GMX"), ProtocolCategory::Derivatives);
        assert_eq!(table.classify("Bored NFT Club"), ProtocolCategory::Nft);
        assert_eq!(table.classify("Wrapped Ether"), ProtocolCategory::Other);
    }

    #[test]
    fn test_duplicate_tickers_count_once() {
        let table = ProtocolTable::default();
        let holdings = vec![
            TokenHolding::new("Aave Token", "AAVE", 10.0),
            TokenHolding::new("Aave Token (bridged)", "aave", 5.0),
            TokenHolding::new("Compound", "COMP", 1.0),
            TokenHolding::new("Nameless", "", 1.0),
        ];
        let counts = table.count_by_category(&holdings);
        assert_eq!(counts.get(&ProtocolCategory::Lending), Some(&2));
        assert_eq!(counts.get(&ProtocolCategory::Other), None);
    }

    #[test]
    fn test_extend_adds_keywords() {
        let mut table = ProtocolTable::default();
        assert_eq!(table.classify("Pendle"), ProtocolCategory::Other);
        table.extend(ProtocolCategory::Derivatives, &["Pendle"]);
        assert_eq!(table.classify("Pendle Market"), ProtocolCategory::Derivatives);
    }
}
