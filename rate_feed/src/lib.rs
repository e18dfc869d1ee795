pub mod config;
pub mod error;
pub mod fetcher;
pub mod logger;

pub use config::PricingConfig;
pub use error::RateError;
pub use fetcher::{ExchangeRate, RateFetcher, RateTable};
