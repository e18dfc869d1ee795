use serde::Deserialize;

pub const DEFAULT_PRICING_URL: &str = "https://min-api.cryptocompare.com/data/pricemulti";

/// Settings for the one-shot exchange rate lookup done at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub url: String,
    /// May be empty, in which case the request goes out unauthenticated.
    pub api_key: String,
    pub base_currency: String,
    pub quote_currencies: Vec<String>,
    /// Quote whose rate is cached as the conversion factor.
    pub target_currency: String,
    pub timeout_secs: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PRICING_URL.to_string(),
            api_key: String::new(),
            base_currency: "USD".to_string(),
            quote_currencies: vec!["BTC".to_string(), "ETH".to_string()],
            target_currency: "ETH".to_string(),
            timeout_secs: 10,
        }
    }
}
