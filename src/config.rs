// Service configuration, loaded with the 'config' crate and '.env' via dotenv

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_address: String,
    // Upstream endpoint answering the catalog query (multipart POST)
    pub catalog_endpoint: String,
    pub debounce_ms: u64,
    // Sessions nobody polls for this long are dropped
    pub session_idle_secs: u64,
    pub default_per_page: u32,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub proxy_url: Option<String>,
    pub csrf_token: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Config::builder()
            // Add default values
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("catalog_endpoint", "http://127.0.0.1:8080/catalog")?
            .set_default("debounce_ms", 1000)?
            .set_default("session_idle_secs", 1800)?
            .set_default("default_per_page", 25)?
            .set_default("request_timeout_secs", 15)?
            .set_default("user_agent", concat!("catalog_filter/", env!("CARGO_PKG_VERSION")))?
            // Load from a configuration file (e.g., config.toml)
            .add_source(File::with_name("config").required(false))
            // Load from environment variables (e.g., APP_CATALOG_ENDPOINT)
            .add_source(Environment::with_prefix("APP").prefix_separator("_").try_parsing(true));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
