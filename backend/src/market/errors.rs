use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid response from quote provider: {0}")]
    InvalidResponse(String),

    #[error("quote provider api key is not configured")]
    MissingApiKey,
}
