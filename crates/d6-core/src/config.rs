//! Navigator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache lifetime of a response that names no `ttl`
    pub default_ttl_ms: u64,
    /// View used when a response names none
    pub error_view: String,
    /// Elements that show loading progress
    pub spinner_selector: String,
    /// Class applied to spinners and target regions while loading
    pub loading_class: String,
    /// Class marking a region as the destination of a partial load
    pub target_class: String,
    /// Links carrying this class are left to the browser
    pub no_prefetch_class: String,
    /// User agent of the HTTP transport
    pub user_agent: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            default_ttl_ms: 10_000,
            error_view: "error0".to_string(),
            spinner_selector: "._SPINNER".to_string(),
            loading_class: "_LOADING".to_string(),
            target_class: "_D6_TARGET".to_string(),
            no_prefetch_class: "_NOPREFETCH".to_string(),
            user_agent: format!("d6/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Parse a JSON config; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_ttl_ms == 0 {
            return Err(CoreError::Config("default_ttl_ms must be positive".to_string()));
        }

        let required = [
            ("error_view", &self.error_view),
            ("spinner_selector", &self.spinner_selector),
            ("loading_class", &self.loading_class),
            ("target_class", &self.target_class),
            ("no_prefetch_class", &self.no_prefetch_class),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::Config(format!("{} must not be empty", name)));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
