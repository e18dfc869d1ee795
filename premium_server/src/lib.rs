pub mod config;
pub mod engine;
pub mod error;
pub mod misc;
pub mod pipeline;
pub mod server;

pub use engine::{ForestModel, PremiumModel, load_model};
pub use error::{ModelError, ModelLoadError, PredictionError};
pub use misc::PremiumQuote;
pub use pipeline::{PROFIT_MARGIN, PremiumPipeline};
