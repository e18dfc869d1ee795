use std::net::SocketAddr;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use rate_feed::PricingConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "premium.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub model_path: String,
    #[serde(default)]
    pub pricing: PricingConfig,
}

impl ServiceConfig {
    /// Defaults, then `path` if it exists, then `PREMIUM_*` environment variables.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("PREMIUM")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("pricing.quote_currencies")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 10000)?
            .set_default("model_path", "premium_model.bin")
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
