use thiserror::Error;

/// Every way the startup rate lookup can leave us without a usable rate.
#[derive(Error, Debug)]
pub enum RateError {
    #[error("Invalid rate request: {0}")]
    InvalidRequest(String),

    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Pricing endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Malformed pricing response: {0}")]
    MalformedBody(String),

    #[error("Pricing provider error: {0}")]
    Provider(String),

    #[error("No {quote} rate for base {base} in pricing response")]
    MissingQuote { base: String, quote: String },

    #[error("Unusable {base}/{quote} rate: {value}")]
    InvalidRate {
        base: String,
        quote: String,
        value: f64,
    },
}
