//! Well-known token addresses on Base mainnet.
//!
//! Config files may name tokens by symbol; anything starting with `0x`
//! is taken as an address verbatim.

use super::error::TokenLookupError;
use super::holdings::{NATIVE_TOKEN_ADDRESS, TokenAddress};

/// Symbol → address table for the supported chain.
pub const BASE_MAINNET_TOKENS: &[(&str, &str)] = &[
    ("ETH", NATIVE_TOKEN_ADDRESS),
    ("WETH", "0x4200000000000000000000000000000000000006"),
    ("USDC", "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
    ("USDbC", "0xd9aAEc86B65D86f6A7B5B1b0c42FFA531710b6CA"),
    ("DAI", "0x50c5725949A6F0c72E6C4a641F24049A917DB0Cb"),
];

/// Resolve a symbol or address to a token address.
///
/// # Errors
/// Returns [`TokenLookupError`] for symbols not in [`BASE_MAINNET_TOKENS`].
pub fn resolve_token(symbol_or_address: &str) -> Result<TokenAddress, TokenLookupError> {
    let input = symbol_or_address.trim();
    if input.starts_with("0x") {
        return Ok(input.to_string());
    }

    BASE_MAINNET_TOKENS
        .iter()
        .find(|(symbol, _)| symbol.eq_ignore_ascii_case(input))
        .map(|(_, address)| (*address).to_string())
        .ok_or_else(|| TokenLookupError(symbol_or_address.to_string()))
}

/// Reverse lookup for log output.
pub fn symbol_for(address: &str) -> Option<&'static str> {
    BASE_MAINNET_TOKENS
        .iter()
        .find(|(_, a)| a.eq_ignore_ascii_case(address))
        .map(|(symbol, _)| *symbol)
}
