use rust_decimal::Decimal;
use serde::Serialize;

/// One asset sampled on every tick.
///
/// `id` is the stable name used in the stores and in alerts (`ethereum`,
/// `polygon`); `chain` and `token_address` address the token at the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedAsset {
    pub id: String,
    pub chain: String,
    pub token_address: String,
}

impl TrackedAsset {
    pub fn new(id: impl Into<String>, chain: impl Into<String>, token_address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            chain: chain.into(),
            token_address: token_address.into(),
        }
    }
}

/// Current price as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Always positive; sources reject anything else.
    pub price: Decimal,
    /// Provider-computed change, if it sent one.
    pub percent_change: Option<Decimal>,
}
