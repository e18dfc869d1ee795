pub mod error;
pub mod profile;
pub mod schema;
pub mod training;

pub use error::{ProfileError, TrainingError};
pub use profile::{ApplicantProfile, Sex, Smoker};
pub use schema::{FEATURE_SCHEMA, Feature, FeatureVector, NUM_FEATURES};
