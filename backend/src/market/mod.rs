pub mod errors;
pub mod moralis;
pub mod types;

use async_trait::async_trait;

pub use errors::QuoteError;
pub use types::{Quote, TrackedAsset};

/// External price feed. One call returns one current quote.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_price(&self, asset: &TrackedAsset) -> Result<Quote, QuoteError>;
}
