//! Column layout shared by the training workflow, the model artifact and the
//! request path. Reordering `FEATURE_SCHEMA` changes every model input, so
//! artifacts record the names they were fitted on and are checked against it.

use serde::{Deserialize, Serialize};

pub const NUM_FEATURES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Age,
    Sex,
    Bmi,
    Children,
    Smoker,
}

/// Model column order.
pub const FEATURE_SCHEMA: [Feature; NUM_FEATURES] = [
    Feature::Age,
    Feature::Sex,
    Feature::Bmi,
    Feature::Children,
    Feature::Smoker,
];

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::Sex => "sex",
            Feature::Bmi => "bmi",
            Feature::Children => "children",
            Feature::Smoker => "smoker",
        }
    }

    /// Column index of this feature in a model input row.
    pub fn column(&self) -> usize {
        FEATURE_SCHEMA
            .iter()
            .position(|f| f == self)
            .unwrap_or_else(|| unreachable!("every feature is in the schema"))
    }
}

pub fn feature_names() -> Vec<String> {
    FEATURE_SCHEMA.iter().map(|f| f.name().to_string()).collect()
}

/// One model input row in `FEATURE_SCHEMA` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; NUM_FEATURES]);

impl FeatureVector {
    /// Build a row by asking `value` for each feature in schema order.
    pub fn assemble(value: impl FnMut(Feature) -> f64) -> Self {
        Self(FEATURE_SCHEMA.map(value))
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.column()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}
