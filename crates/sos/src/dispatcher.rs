//! SOS dispatch

use crate::gateway::SmsGateway;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Sid recorded for contacts that were not sent through a real gateway
pub const SIMULATED_SID: &str = "simulated";

/// Emergency raised by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SosAlert {
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub to: String,
    pub sid: String,
}

/// Result of one SOS fan-out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SosOutcome {
    pub ok: bool,
    pub sent: Vec<SentMessage>,
    pub message: String,
}

/// Alert text with a map link to the current location
///
/// Coordinates keep a decimal point even when whole (`30.0`, not `30`).
pub fn compose_message(name: &str, phone: &str, lat: f64, lng: f64) -> String {
    format!(
        "⚠️ EMERGENCY ALERT! {} needs help immediately. \
         Current location: https://maps.google.com/?q={:?},{:?}. \
         Contact: {}.",
        name, lat, lng, phone
    )
}

/// Sends alerts to emergency contacts
pub struct SosDispatcher {
    gateway: SmsGateway,
    max_contacts: usize,
}

impl SosDispatcher {
    pub fn new(gateway: SmsGateway, max_contacts: usize) -> Self {
        Self {
            gateway,
            max_contacts,
        }
    }

    /// Fan an alert out to the first `max_contacts` contacts
    ///
    /// Best effort: a gateway failure on any contact downgrades the whole
    /// batch to simulated delivery.
    pub async fn dispatch(&self, alert: &SosAlert, contacts: &[String]) -> SosOutcome {
        let message = compose_message(&alert.name, &alert.phone, alert.lat, alert.lng);
        let contacts = &contacts[..contacts.len().min(self.max_contacts)];

        let sent = match &self.gateway {
            SmsGateway::Twilio(twilio) => {
                let mut sent = Vec::with_capacity(contacts.len());
                let mut failed = false;
                for contact in contacts.iter().filter(|c| !c.is_empty()) {
                    match twilio.send(contact, &message).await {
                        Ok(sid) => sent.push(SentMessage {
                            to: contact.clone(),
                            sid,
                        }),
                        Err(e) => {
                            warn!("SOS send to {} failed, falling back to simulated: {}", contact, e);
                            failed = true;
                            break;
                        }
                    }
                }
                if failed {
                    simulated(contacts)
                } else {
                    sent
                }
            }
            SmsGateway::Simulated => simulated(contacts),
        };

        info!(
            "SOS for user {} dispatched to {} contact(s)",
            alert.user_id,
            sent.len()
        );

        SosOutcome {
            ok: true,
            sent,
            message,
        }
    }
}

fn simulated(contacts: &[String]) -> Vec<SentMessage> {
    contacts
        .iter()
        .map(|c| SentMessage {
            to: c.clone(),
            sid: SIMULATED_SID.to_string(),
        })
        .collect()
}
