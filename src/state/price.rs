//! Oracle price

use bigdecimal::BigDecimal;
use solana_program::pubkey::Pubkey;

/// Token price resolved by the oracle layer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenOraclePrice {
    /// Liquidity mint the price is for
    pub mint_address: Pubkey,
    /// Price of one whole token in the quote currency
    pub price: BigDecimal,
    /// Unix timestamp of the price
    pub timestamp: u64,
    /// Mint decimals
    pub decimals: u8,
    /// False when the oracle reported a stale or out of band price
    pub valid: bool,
}
