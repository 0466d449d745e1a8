use crate::models::{CreditScoreError, Result};

/// Accepts a `0x`-prefixed 20-byte hex address in any case and returns it lowercased.
pub fn parse_address(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| CreditScoreError::AddressUnresolvable(input.to_string()))?;

    if hex_part.len() != 40 || hex::decode(hex_part).is_err() {
        return Err(CreditScoreError::AddressUnresolvable(input.to_string()));
    }

    Ok(format!("0x{}", hex_part.to_ascii_lowercase()))
}

pub fn is_ens_name(input: &str) -> bool {
    let name = input.trim();
    name.len() > ".eth".len() && name.to_ascii_lowercase().ends_with(".eth")
}
