use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::market::moralis::types::{TokenPrice, decimal_from_json};
use crate::market::{Quote, QuoteError, QuoteSource, TrackedAsset};

/// HTTP client for the Moralis token price endpoint.
///
/// Built once at startup and injected wherever quotes are needed; the
/// underlying connection pool lives as long as this value.
#[derive(Clone)]
pub struct MoralisClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl MoralisClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, QuoteError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[async_trait]
impl QuoteSource for MoralisClient {
    #[instrument(
        skip(self, asset),
        fields(asset = %asset.id, chain = %asset.chain),
        level = "debug"
    )]
    async fn fetch_price(&self, asset: &TrackedAsset) -> Result<Quote, QuoteError> {
        if !self.has_key() {
            return Err(QuoteError::MissingApiKey);
        }

        let url = format!("{}/erc20/{}/price", self.base_url, asset.token_address);

        let resp = self
            .http
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .query(&[("chain", asset.chain.as_str()), ("include", "percent_change")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(QuoteError::Status { status, body });
        }

        let body: TokenPrice = resp.json().await?;

        let price = decimal_from_json(&body.usd_price)
            .ok_or_else(|| QuoteError::InvalidResponse(format!("usdPrice: {}", body.usd_price)))?;
        if price <= rust_decimal::Decimal::ZERO {
            return Err(QuoteError::InvalidResponse(format!(
                "non-positive usdPrice: {price}"
            )));
        }

        let percent_change = body.percent_change.as_ref().and_then(decimal_from_json);

        debug!(
            price = %price,
            percent_change = ?percent_change,
            symbol = ?body.token_symbol,
            "quote fetched"
        );

        Ok(Quote {
            price,
            percent_change,
        })
    }
}
