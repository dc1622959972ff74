use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// Body of `GET /erc20/{address}/price`. Only the fields the engine reads.
#[derive(Debug, Deserialize)]
pub struct TokenPrice {
    #[serde(rename = "usdPrice")]
    pub usd_price: Value,

    #[serde(rename = "24hrPercentChange", alias = "percent_change", default)]
    pub percent_change: Option<Value>,

    #[serde(rename = "tokenSymbol", default)]
    pub token_symbol: Option<String>,
}

/// The provider sends prices as JSON numbers and percent changes as strings,
/// but neither is guaranteed. Accept both.
pub fn decimal_from_json(v: &Value) -> Option<Decimal> {
    let raw = match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}
