//! SMS gateways

use crate::SosError;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Twilio credentials
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number
    pub phone_number: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    TWILIO_API_BASE.to_string()
}

impl TwilioConfig {
    pub fn new(account_sid: &str, auth_token: &str, phone_number: &str) -> Self {
        Self {
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            phone_number: phone_number.to_string(),
            api_base: default_api_base(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

/// Twilio Messages API client
#[derive(Debug, Clone)]
pub struct TwilioGateway {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioGateway {
    pub fn new(config: TwilioConfig) -> Result<Self, SosError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { config, client })
    }

    /// Send one SMS and return the message sid
    pub async fn send(&self, to: &str, body: &str) -> Result<String, SosError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", to),
                ("From", self.config.phone_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SosError::Gateway(format!("{}: {}", status, text)));
        }

        let resource: MessageResource = response.json().await?;
        debug!("Twilio accepted message {} to {}", resource.sid, to);
        Ok(resource.sid)
    }
}

/// Delivery channel for SOS messages
#[derive(Debug, Clone)]
pub enum SmsGateway {
    /// No delivery, every contact is reported as simulated
    Simulated,
    Twilio(TwilioGateway),
}

impl SmsGateway {
    /// Twilio when credentials are present, simulated otherwise
    pub fn from_config(config: Option<TwilioConfig>) -> Result<Self, SosError> {
        match config {
            Some(config) => Ok(SmsGateway::Twilio(TwilioGateway::new(config)?)),
            None => Ok(SmsGateway::Simulated),
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, SmsGateway::Simulated)
    }
}
