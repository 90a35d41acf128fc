//! Alert escalation.
//!
//! Every alert is logged at warning level. When e-mail is enabled the alert
//! is also handed to a [`Mailer`]; delivery failures stay here and are only
//! logged.

use std::sync::Arc;

use crate::error::{PerfError, Result};

pub const ALERT_SUBJECT: &str = "System Performance Alert";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertConfig {
    pub email_enabled: bool,
    pub recipients: Vec<String>,
}

/// Outbound e-mail transport.
pub trait Mailer: Send + Sync {
    fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<()>;
}

#[derive(Clone)]
pub struct AlertManager {
    config: AlertConfig,
    mailer: Option<Arc<dyn Mailer>>,
}

impl AlertManager {
    pub fn new(config: AlertConfig) -> Self {
        Self { config, mailer: None }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Record the alert and, if enabled, try to mail it. Never fails.
    pub fn trigger(&self, message: &str) {
        log::warn!("ALERT: {}", message);

        if !self.config.email_enabled {
            return;
        }
        match self.send_email(message) {
            Ok(()) => log::info!("Alert email sent successfully."),
            Err(e) => log::error!("Failed to send alert email: {}", e),
        }
    }

    fn send_email(&self, message: &str) -> Result<()> {
        let mailer = self
            .mailer
            .as_ref()
            .ok_or_else(|| PerfError::alert("e-mail alerts enabled but no mailer configured"))?;
        if self.config.recipients.is_empty() {
            return Err(PerfError::alert("no alert recipients configured"));
        }
        let body = format!("System Alert: {}", message);
        mailer.send(ALERT_SUBJECT, &body, &self.config.recipients)
    }
}
