//! SOS Fan-out
//!
//! Composes an emergency alert and sends it to a user's emergency contacts:
//! - Twilio SMS when credentials are configured
//! - Simulated delivery otherwise, or when the gateway fails

mod dispatcher;
mod gateway;

pub use dispatcher::{compose_message, SentMessage, SosAlert, SosDispatcher, SosOutcome, SIMULATED_SID};
pub use gateway::{SmsGateway, TwilioConfig, TwilioGateway};

use thiserror::Error;

/// SOS error types
#[derive(Error, Debug)]
pub enum SosError {
    #[error("Gateway rejected message: {0}")]
    Gateway(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
