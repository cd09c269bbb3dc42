//! Contact-form email notifications via a transactional mail API
//!
//! Delivery is fire-and-forget: the contact row is already persisted
//! when the send starts, so a mail failure only logs.

use std::sync::OnceLock;
use std::time::Duration;

use tracing::{info, warn};
use ureq::Agent;

use crate::config::get_config;

const HTTP_TIMEOUT_SECS: u64 = 5;

static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

#[derive(Clone)]
pub struct Mailer {
    enabled: bool,
    api_key: String,
    endpoint: String,
    from_address: String,
    to_address: String,
}

impl Mailer {
    pub fn from_config() -> Self {
        let config = get_config();
        Self {
            enabled: config.mail.enabled && !config.mail.api_key.is_empty(),
            api_key: config.mail.api_key.clone(),
            endpoint: config.mail.endpoint.clone(),
            from_address: config.mail.from_address.clone(),
            to_address: config.mail.to_address.clone(),
        }
    }

    /// Send a new-contact notification without blocking the request
    pub fn notify_contact(&self, name: &str, email: &str, subject: Option<&str>, message: &str) {
        if !self.enabled {
            return;
        }

        let mailer = self.clone();
        let subject_line = match subject {
            Some(s) if !s.is_empty() => format!("New contact: {}", s),
            _ => format!("New contact from {}", name),
        };
        let body = format!("From: {} <{}>\n\n{}", name, email, message);

        tokio::task::spawn_blocking(move || {
            if let Err(e) = mailer.send_sync(&subject_line, &body) {
                warn!("Contact notification mail failed: {}", e);
            } else {
                info!("Contact notification mail sent");
            }
        });
    }

    fn send_sync(&self, subject: &str, body: &str) -> Result<(), String> {
        let payload = serde_json::json!({
            "from": self.from_address,
            "to": [self.to_address],
            "subject": subject,
            "text": body,
        });

        let agent = get_agent();
        agent
            .post(&self.endpoint)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&payload)
            .map_err(|e| e.to_string())?;

        Ok(())
    }
}
