use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Loads `configuration.*` and `APP__*` variables. A bare `PORT`
    /// variable takes precedence over both, as hosting platforms set it.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        Self::load_with_port(std::env::var("PORT").ok())
    }

    fn load_with_port(port: Option<String>) -> Result<Self, AppError> {
        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .set_override_option("port", port)?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
