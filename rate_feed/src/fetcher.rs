use std::collections::HashMap;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;

use crate::config::PricingConfig;
use crate::error::RateError;

/// Fiat units per one unit of `quote`, as served by the pricing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    pub base: String,
    pub quote: String,
    pub value: f64,
}

impl ExchangeRate {
    pub fn new(base: &str, quote: &str, value: f64) -> Self {
        Self {
            base: base.to_string(),
            quote: quote.to_string(),
            value,
        }
    }
}

/// `base -> quote -> rate`, the nested shape returned by `pricemulti`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable(HashMap<String, HashMap<String, f64>>);

impl RateTable {
    pub fn from_response(body: &str) -> Result<Self, RateError> {
        let json: Value =
            serde_json::from_str(body).map_err(|e| RateError::MalformedBody(e.to_string()))?;

        // The provider answers errors with 200 and an envelope instead of a table.
        if json.get("Response").and_then(Value::as_str) == Some("Error") {
            let message = json
                .get("Message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(RateError::Provider(message.to_string()));
        }

        let table: HashMap<String, HashMap<String, f64>> =
            serde_json::from_value(json).map_err(|e| RateError::MalformedBody(e.to_string()))?;
        Ok(Self(table))
    }

    pub fn get(&self, base: &str, quote: &str) -> Option<f64> {
        self.0.get(base).and_then(|quotes| quotes.get(quote)).copied()
    }

    pub fn rate(&self, base: &str, quote: &str) -> Result<ExchangeRate, RateError> {
        let value = self.get(base, quote).ok_or_else(|| RateError::MissingQuote {
            base: base.to_string(),
            quote: quote.to_string(),
        })?;

        if !value.is_finite() || value <= 0.0 {
            return Err(RateError::InvalidRate {
                base: base.to_string(),
                quote: quote.to_string(),
                value,
            });
        }

        Ok(ExchangeRate::new(base, quote, value))
    }
}

pub struct RateFetcher {
    client: Client,
    config: PricingConfig,
}

impl RateFetcher {
    pub fn new(config: PricingConfig) -> Result<Self, RateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Query the pricing endpoint once for `base` against every code in `quotes`.
    pub async fn fetch_rate(&self, base: &str, quotes: &[String]) -> Result<RateTable, RateError> {
        if base.trim().is_empty() {
            return Err(RateError::InvalidRequest("base currency is empty".to_string()));
        }
        if quotes.is_empty() || quotes.iter().any(|q| q.trim().is_empty()) {
            return Err(RateError::InvalidRequest(
                "quote currency list is empty or has a blank code".to_string(),
            ));
        }

        let tsyms = quotes.join(",");
        let mut request = self
            .client
            .get(&self.config.url)
            .header("Accept", "application/json")
            .query(&[("fsyms", base), ("tsyms", tsyms.as_str())]);

        if self.config.api_key.is_empty() {
            debug!("No pricing API key configured, sending unauthenticated request");
        } else {
            request = request.query(&[("api_key", self.config.api_key.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Failed to fetch data from pricing endpoint: {}", status);
            return Err(RateError::Status { status, body });
        }

        let body = response.text().await?;
        RateTable::from_response(&body)
    }

    /// Fetch the configured `base -> target` conversion factor.
    pub async fn conversion_rate(&self) -> Result<ExchangeRate, RateError> {
        let base = self.config.base_currency.as_str();
        let target = self.config.target_currency.as_str();

        let mut quotes = self.config.quote_currencies.clone();
        if !quotes.iter().any(|q| q == target) {
            quotes.push(target.to_string());
        }

        info!("Fetching {}/{} exchange rate from {}", base, target, self.config.url);
        let table = self.fetch_rate(base, &quotes).await?;
        let rate = table.rate(base, target)?;
        info!("Cached exchange rate {} {} per {}", rate.value, rate.quote, rate.base);

        Ok(rate)
    }
}
