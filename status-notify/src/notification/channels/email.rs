//! Email notification channel using SMTP.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{NotificationChannel, default_timeout, escape_html, require_non_empty};
use crate::notification::delivery::DeliveryError;
use crate::notification::events::{Event, NotificationPriority};
use crate::{Error, Result};

const DEFAULT_SUBJECT_PREFIX: &str = "[status]";

/// SMTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    /// SMTP server host.
    #[serde(default)]
    pub host: String,
    /// SMTP server port. Defaults to 465 for implicit TLS, 587 otherwise.
    #[serde(default)]
    pub port: Option<u16>,
    /// `true` for implicit TLS, `false` for STARTTLS.
    #[serde(default)]
    pub secure: bool,
    /// Optional login.
    #[serde(default)]
    pub auth: Option<SmtpAuth>,
}

impl SmtpConfig {
    fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.secure { 465 } else { 587 })
    }
}

/// SMTP credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpAuth {
    pub user: String,
    pub pass: String,
}

impl std::fmt::Debug for SmtpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpAuth")
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .finish()
    }
}

/// Recipient list given either as one string or as an array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Recipients {
    One(String),
    Many(Vec<String>),
}

fn recipients_as_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let list = match Recipients::deserialize(deserializer)? {
        Recipients::One(s) => s.split(',').map(str::to_string).collect(),
        Recipients::Many(list) => list,
    };
    Ok(list
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Email channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
    pub smtp: SmtpConfig,
    /// Sender address, e.g. `Status <status@example.com>`.
    #[serde(default)]
    pub from: String,
    /// Recipient addresses.
    #[serde(default, deserialize_with = "recipients_as_list")]
    pub to: Vec<String>,
    #[serde(default)]
    pub subject_prefix: Option<String>,
    /// Per-attempt deadline in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl EmailConfig {
    pub fn validate(&self, name: &str) -> Result<()> {
        require_non_empty(name, "smtp.host", &self.smtp.host)?;
        require_non_empty(name, "from", &self.from)?;
        if self.to.is_empty() {
            return Err(Error::channel(name, "missing required field 'to'"));
        }

        self.from
            .parse::<Mailbox>()
            .map_err(|e| Error::channel(name, format!("invalid 'from' address: {e}")))?;
        for address in &self.to {
            address
                .parse::<Mailbox>()
                .map_err(|e| Error::channel(name, format!("invalid 'to' address '{address}': {e}")))?;
        }
        Ok(())
    }
}

/// Email notification channel.
pub struct EmailChannel {
    name: String,
    config: EmailConfig,
}

impl EmailChannel {
    /// Create a new Email channel.
    pub fn new(name: &str, config: EmailConfig) -> Self {
        crate::utils::http_client::install_rustls_provider();
        Self {
            name: name.to_string(),
            config,
        }
    }

    /// Build the email subject.
    fn build_subject(&self, event: &Event) -> String {
        let prefix = self
            .config
            .subject_prefix
            .as_deref()
            .unwrap_or(DEFAULT_SUBJECT_PREFIX);
        if prefix.is_empty() {
            event.title()
        } else {
            format!("{prefix} {}", event.title())
        }
    }

    fn time_label(event: &Event) -> String {
        event
            .timestamp()
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Build the email body (plain text).
    fn build_body_text(&self, event: &Event) -> String {
        let mut body = format!(
            "{}\n\n{}\n\nPriority: {}\nType: {}\nTime: {}",
            event.title(),
            event.description(),
            event.priority(),
            event.event_type(),
            Self::time_label(event)
        );
        if let Some(link) = event.link() {
            body.push_str(&format!("\nLink: {link}"));
        }
        body
    }

    /// Build the email body (HTML).
    fn build_body_html(&self, event: &Event) -> String {
        let priority_color = match event.priority() {
            NotificationPriority::Low => "#808080",
            NotificationPriority::Normal => "#2ecc71",
            NotificationPriority::High => "#f39c12",
            NotificationPriority::Critical => "#e74c3c",
        };
        let link = event
            .link()
            .map(|l| {
                let l = escape_html(l);
                format!(r#"<p><a href="{l}">{l}</a></p>"#)
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        .header {{ background-color: {}; color: white; padding: 15px; border-radius: 5px; }}
        .content {{ padding: 20px; background-color: #f9f9f9; border-radius: 5px; margin-top: 10px; }}
        .footer {{ color: #666; font-size: 12px; margin-top: 20px; }}
    </style>
</head>
<body>
    <div class="header">
        <h2>{}</h2>
    </div>
    <div class="content">
        <p>{}</p>
        {}
    </div>
    <div class="footer">
        <p>Priority: {} | Type: {} | Time: {}</p>
    </div>
</body>
</html>"#,
            priority_color,
            escape_html(&event.title()),
            escape_html(&event.description()),
            link,
            event.priority(),
            escape_html(event.event_type()),
            Self::time_label(event)
        )
    }

    fn build_message(&self, event: &Event) -> std::result::Result<Message, DeliveryError> {
        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|e| DeliveryError::InvalidMessage(format!("invalid sender: {e}")))?;

        let mut builder = Message::builder().from(from).subject(self.build_subject(event));
        for address in &self.config.to {
            let to: Mailbox = address
                .parse()
                .map_err(|e| DeliveryError::InvalidMessage(format!("invalid recipient: {e}")))?;
            builder = builder.to(to);
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                self.build_body_text(event),
                self.build_body_html(event),
            ))
            .map_err(|e| DeliveryError::InvalidMessage(e.to_string()))
    }

    fn build_transport(&self) -> std::result::Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let smtp = &self.config.smtp;
        let builder = if smtp.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
        }
        .map_err(|e| DeliveryError::Smtp(e.to_string()))?;

        let mut builder = builder
            .port(smtp.effective_port())
            .timeout(Some(self.timeout()));
        if let Some(auth) = &smtp.auth {
            builder = builder.credentials(Credentials::new(auth.user.clone(), auth.pass.clone()));
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &'static str {
        "email"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn send(&self, event: &Event) -> std::result::Result<(), DeliveryError> {
        let message = self.build_message(event)?;
        let transport = self.build_transport()?;

        transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Smtp(e.to_string()))?;

        debug!(
            channel = %self.name,
            recipients = self.config.to.len(),
            event_type = event.event_type(),
            "Email notification sent"
        );
        Ok(())
    }
}
