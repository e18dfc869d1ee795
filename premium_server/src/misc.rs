use serde::Serialize;

/// Premium in units of the configured crypto asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PremiumQuote {
    #[serde(rename = "predicted_premium")]
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
