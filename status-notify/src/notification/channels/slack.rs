//! Slack incoming-webhook notification channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::{NotificationChannel, check_http_response, default_timeout, require_http_url};
use crate::Result;
use crate::notification::delivery::DeliveryError;
use crate::notification::events::{Event, NotificationPriority};
use crate::utils::http_client::build_channel_client;

/// Slack channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackConfig {
    /// Incoming webhook URL.
    #[serde(default)]
    pub webhook_url: String,
    /// Override of the webhook's default channel.
    #[serde(default)]
    pub channel: Option<String>,
    /// Override of the webhook's default username.
    #[serde(default)]
    pub username: Option<String>,
    /// Emoji shortcode used as the message icon, e.g. `:rotating_light:`.
    #[serde(default)]
    pub icon_emoji: Option<String>,
    /// Per-attempt deadline in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl SlackConfig {
    pub fn validate(&self, name: &str) -> Result<()> {
        require_http_url(name, "webhookUrl", &self.webhook_url)
    }
}

/// Slack notification channel.
pub struct SlackChannel {
    name: String,
    config: SlackConfig,
    client: Client,
}

impl SlackChannel {
    /// Create a new Slack channel.
    pub fn new(name: &str, config: SlackConfig) -> Self {
        let client = build_channel_client(Duration::from_secs(config.timeout_secs));
        Self {
            name: name.to_string(),
            config,
            client,
        }
    }

    /// Attachment colour for a priority.
    fn get_color(priority: NotificationPriority) -> &'static str {
        match priority {
            NotificationPriority::Low => "#808080",
            NotificationPriority::Normal => "#2eb886",
            NotificationPriority::High => "#f39c12",
            NotificationPriority::Critical => "#e74c3c",
        }
    }

    /// Build the webhook payload for an event.
    fn build_payload(&self, event: &Event) -> Value {
        let title = event.title();

        let mut attachment = json!({
            "color": Self::get_color(event.priority()),
            "title": title,
            "text": event.description(),
            "footer": format!("Priority: {} | Type: {}", event.priority(), event.event_type()),
        });
        if let Some(link) = event.link() {
            attachment["title_link"] = json!(link);
        }
        if let Some(ts) = event.timestamp() {
            attachment["ts"] = json!(ts.timestamp());
        }

        let mut payload = json!({
            "text": title,
            "attachments": [attachment],
        });

        if let Some(channel) = &self.config.channel {
            payload["channel"] = json!(channel);
        }
        if let Some(username) = &self.config.username {
            payload["username"] = json!(username);
        }
        if let Some(icon_emoji) = &self.config.icon_emoji {
            payload["icon_emoji"] = json!(icon_emoji);
        }

        payload
    }
}

#[async_trait]
impl NotificationChannel for SlackChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &'static str {
        "slack"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn send(&self, event: &Event) -> std::result::Result<(), DeliveryError> {
        let payload = self.build_payload(event);

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&payload)
            .send()
            .await?;
        check_http_response(response).await?;

        debug!(channel = %self.name, event_type = event.event_type(), "Slack notification sent");
        Ok(())
    }
}
