//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `shesecure.toml`, then `SHESECURE__*` environment variables. `PORT`
//! overrides the listen port and `TWILIO_*` supplies SMS credentials.

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use sos::TwilioConfig;

/// Listen address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    /// tracing level filter (default: info)
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Maximum reports returned by the list endpoint
    pub reports_limit: usize,
    /// Emergency contacts notified per SOS
    pub max_sos_contacts: usize,
    /// Limits on login, signup and SOS
    pub rate_limit: RateLimitConfig,
    /// Read from `TWILIO_*`, never from the config file
    #[serde(skip)]
    pub twilio: Option<TwilioConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            log_level: "info".to_string(),
            log_json: false,
            reports_limit: 200,
            max_sos_contacts: 4,
            rate_limit: RateLimitConfig::strict(),
            twilio: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration from defaults, file and environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config: ApiConfig = Config::builder()
            .add_source(Config::try_from(&ApiConfig::default())?)
            .add_source(File::with_name("shesecure").required(false))
            .add_source(
                Environment::with_prefix("SHESECURE")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .build()?
            .try_deserialize()?;

        config.twilio = twilio_from_env();
        Ok(config)
    }
}

/// Twilio credentials, present only when all three variables are set
fn twilio_from_env() -> Option<TwilioConfig> {
    Config::builder()
        .add_source(Environment::with_prefix("TWILIO"))
        .build()
        .and_then(|c| c.try_deserialize::<TwilioConfig>())
        .ok()
        .filter(|t| {
            !t.account_sid.is_empty() && !t.auth_token.is_empty() && !t.phone_number.is_empty()
        })
}
