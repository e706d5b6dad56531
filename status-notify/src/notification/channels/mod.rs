//! Notification channels.
//!
//! This module provides different channels for delivering notifications:
//! - Slack incoming webhooks
//! - Discord webhooks
//! - Telegram Bot API
//! - Email (SMTP)
//! - Generic webhooks (HTTP POST/PUT)

mod discord;
mod email;
mod slack;
mod telegram;
mod webhook;

pub use discord::{DiscordChannel, DiscordConfig};
pub use email::{EmailChannel, EmailConfig, SmtpAuth, SmtpConfig};
pub use slack::{SlackChannel, SlackConfig};
pub use telegram::{TelegramChannel, TelegramConfig};
pub use webhook::{WebhookChannel, WebhookConfig};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::delivery::DeliveryError;
use super::events::Event;
use crate::utils::http_client::summarize_error_body;
use crate::{Error, Result};

/// Default per-attempt deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub(crate) fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Trait for notification channels.
///
/// `send` delivers one event and reports failure as a [`DeliveryError`];
/// implementations must not retry.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel identifier from the configuration.
    fn name(&self) -> &str;

    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Upper bound for a single delivery attempt.
    fn timeout(&self) -> Duration;

    /// Send a notification through this channel.
    async fn send(&self, event: &Event) -> std::result::Result<(), DeliveryError>;
}

/// Typed settings of one channel record.
#[derive(Debug, Clone)]
pub enum ChannelConfig {
    /// Slack incoming webhook.
    Slack(SlackConfig),
    /// Discord webhook channel.
    Discord(DiscordConfig),
    /// Telegram Bot API channel.
    Telegram(TelegramConfig),
    /// Email channel.
    Email(EmailConfig),
    /// Generic webhook channel.
    Webhook(WebhookConfig),
}

impl ChannelConfig {
    /// Build typed settings for the record stored under `name`.
    ///
    /// The record's `type` field selects the transport; without it the
    /// channel identifier itself is used.
    pub fn from_record(name: &str, record: &Value) -> Result<Self> {
        let kind = match record.get("type") {
            Some(Value::String(kind)) => kind.trim().to_ascii_lowercase(),
            Some(_) => return Err(Error::channel(name, "'type' must be a string")),
            None => name.to_ascii_lowercase(),
        };

        let config = match kind.as_str() {
            "slack" => Self::Slack(parse_settings(name, record)?),
            "discord" => Self::Discord(parse_settings(name, record)?),
            "telegram" => Self::Telegram(parse_settings(name, record)?),
            "email" | "smtp" => Self::Email(parse_settings(name, record)?),
            "webhook" => Self::Webhook(parse_settings(name, record)?),
            _ => {
                return Err(Error::UnsupportedChannel {
                    channel: name.to_string(),
                    kind,
                });
            }
        };

        config.validate(name)?;
        Ok(config)
    }

    /// Get the channel type name.
    pub fn channel_type(&self) -> &'static str {
        match self {
            Self::Slack(_) => "slack",
            Self::Discord(_) => "discord",
            Self::Telegram(_) => "telegram",
            Self::Email(_) => "email",
            Self::Webhook(_) => "webhook",
        }
    }

    /// Check required fields.
    pub fn validate(&self, name: &str) -> Result<()> {
        match self {
            Self::Slack(c) => c.validate(name),
            Self::Discord(c) => c.validate(name),
            Self::Telegram(c) => c.validate(name),
            Self::Email(c) => c.validate(name),
            Self::Webhook(c) => c.validate(name),
        }
    }

    /// Instantiate the transport for these settings.
    pub fn build(&self, name: &str) -> Arc<dyn NotificationChannel> {
        match self {
            Self::Slack(c) => Arc::new(SlackChannel::new(name, c.clone())),
            Self::Discord(c) => Arc::new(DiscordChannel::new(name, c.clone())),
            Self::Telegram(c) => Arc::new(TelegramChannel::new(name, c.clone())),
            Self::Email(c) => Arc::new(EmailChannel::new(name, c.clone())),
            Self::Webhook(c) => Arc::new(WebhookChannel::new(name, c.clone())),
        }
    }
}

fn parse_settings<T: DeserializeOwned>(name: &str, record: &Value) -> Result<T> {
    serde_json::from_value(record.clone()).map_err(|e| Error::channel(name, e))
}

/// Reject empty required string fields.
pub(crate) fn require_non_empty(name: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::channel(
            name,
            format!("missing required field '{field}'"),
        ));
    }
    Ok(())
}

/// Require an absolute `http`/`https` URL.
pub(crate) fn require_http_url(name: &str, field: &str, value: &str) -> Result<()> {
    require_non_empty(name, field, value)?;
    // Never echo the URL itself: it usually embeds a credential.
    let url = url::Url::parse(value)
        .map_err(|e| Error::channel(name, format!("'{field}' is not a valid URL ({e})")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::channel(
            name,
            format!("'{field}' must use http or https, found '{scheme}'"),
        )),
    }
}

/// Escape the characters HTML renderers treat as markup.
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Map a non-success HTTP response to a [`DeliveryError`], returning the body otherwise.
pub(crate) async fn check_http_response(
    response: reqwest::Response,
) -> std::result::Result<String, DeliveryError> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(DeliveryError::Http {
            status: status.as_u16(),
            body: summarize_error_body(&body),
        });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_identifier() {
        let record = json!({"enabled": true, "webhookUrl": "https://hooks.slack.com/services/x"});
        let config = ChannelConfig::from_record("slack", &record).expect("valid slack config");
        assert_eq!(config.channel_type(), "slack");
    }

    #[test]
    fn test_kind_from_type_field() {
        let record = json!({
            "enabled": true,
            "type": "Discord",
            "webhookUrl": "https://discord.com/api/webhooks/1/abc"
        });
        let config = ChannelConfig::from_record("ops-alerts", &record).expect("valid config");
        assert_eq!(config.channel_type(), "discord");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let record = json!({"enabled": true});
        match ChannelConfig::from_record("pager", &record) {
            Err(Error::UnsupportedChannel { channel, kind }) => {
                assert_eq!(channel, "pager");
                assert_eq!(kind, "pager");
            }
            other => panic!("expected UnsupportedChannel, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let record = json!({"enabled": true});
        let err = ChannelConfig::from_record("slack", &record).expect_err("webhookUrl missing");
        assert!(err.to_string().contains("webhookUrl"));
    }

    #[test]
    fn test_invalid_url_does_not_leak_value() {
        let record = json!({"enabled": true, "webhookUrl": "ftp://secret-host/T000/B000/XYZ"});
        let err = ChannelConfig::from_record("slack", &record).expect_err("ftp is not allowed");
        let message = err.to_string();
        assert!(message.contains("http or https"));
        assert!(!message.contains("secret-host"));
    }

    #[test]
    fn test_build_uses_channel_name() {
        let record = json!({"enabled": true, "type": "webhook", "url": "https://example.com/hook"});
        let config = ChannelConfig::from_record("status-hook", &record).expect("valid webhook");
        let channel = config.build("status-hook");
        assert_eq!(channel.name(), "status-hook");
        assert_eq!(channel.channel_type(), "webhook");
        assert_eq!(channel.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
