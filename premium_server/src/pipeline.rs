use std::sync::Arc;

use log::debug;
use premium_features::ApplicantProfile;
use rate_feed::ExchangeRate;
use serde_json::Value;

use crate::engine::{PremiumModel, to_rows};
use crate::error::{ModelError, PredictionError};
use crate::misc::PremiumQuote;

/// 12% margin on top of the expected expenses.
pub const PROFIT_MARGIN: f64 = 0.12;

/// Request path from `user_data` to a crypto-denominated premium.
/// Holds the startup model and rate; both are immutable for the process lifetime.
pub struct PremiumPipeline {
    model: Arc<dyn PremiumModel>,
    rate: ExchangeRate,
}

impl PremiumPipeline {
    pub fn new(model: Arc<dyn PremiumModel>, rate: ExchangeRate) -> Self {
        Self { model, rate }
    }

    pub fn rate(&self) -> &ExchangeRate {
        &self.rate
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Score a `{"user_data": {...}}` request body.
    pub fn predict(&self, payload: &Value) -> Result<PremiumQuote, PredictionError> {
        let user_data = payload
            .get("user_data")
            .filter(|data| !data.is_null())
            .ok_or(PredictionError::MissingPayload)?;

        let profile = ApplicantProfile::from_json(user_data)?;
        self.quote(&profile)
    }

    pub fn quote(&self, profile: &ApplicantProfile) -> Result<PremiumQuote, PredictionError> {
        let features = profile.feature_vector();
        let estimates = self.model.predict(to_rows(&[features]).view())?;
        let expenses = estimates
            .first()
            .copied()
            .ok_or_else(|| ModelError::Inference("model returned no estimate".to_string()))?;

        let fiat_premium = expenses * PROFIT_MARGIN;
        // Multiplied by the rate, not divided.
        let value = self.rate.value * fiat_premium;
        if !value.is_finite() {
            return Err(ModelError::Inference(format!("premium is not finite: {value}")).into());
        }

        debug!(
            "Quoted {:?}: expenses {} -> {} {} -> {} {}",
            features.as_slice(),
            expenses,
            fiat_premium,
            self.rate.base,
            value,
            self.rate.quote
        );
        Ok(PremiumQuote { value })
    }
}
