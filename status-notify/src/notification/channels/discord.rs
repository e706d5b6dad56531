//! Discord webhook notification channel.
//!
//! Each event becomes a single embed. Rate-limited responses (429) are
//! reported as failed attempts like any other non-success status.

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

/// Discord limits embed descriptions to 4096 characters.
const EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// Discord channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordConfig {
    /// Discord webhook URL.
    #[serde(default)]
    pub webhook_url: String,
    /// Optional username for the webhook.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional avatar URL for the webhook.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Per-attempt deadline in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl DiscordConfig {
    pub fn validate(&self, name: &str) -> Result<()> {
        require_http_url(name, "webhookUrl", &self.webhook_url)?;
        if let Some(avatar_url) = &self.avatar_url {
            require_http_url(name, "avatarUrl", avatar_url)?;
        }
        Ok(())
    }
}

/// Discord notification channel.
pub struct DiscordChannel {
    name: String,
    config: DiscordConfig,
    client: Client,
}

impl DiscordChannel {
    /// Create a new Discord channel.
    pub fn new(name: &str, config: DiscordConfig) -> Self {
        let client = build_channel_client(Duration::from_secs(config.timeout_secs));
        Self {
            name: name.to_string(),
            config,
            client,
        }
    }

    /// Get the embed color based on priority.
    fn get_color(priority: NotificationPriority) -> u32 {
        match priority {
            NotificationPriority::Low => 0x808080,      // Gray
            NotificationPriority::Normal => 0x2ecc71,   // Green
            NotificationPriority::High => 0xf39c12,     // Orange
            NotificationPriority::Critical => 0xe74c3c, // Red
        }
    }

    /// Build the webhook payload for an event.
    fn build_payload(&self, event: &Event) -> Value {
        let description: String = event
            .description()
            .chars()
            .take(EMBED_DESCRIPTION_LIMIT)
            .collect();

        let mut embed = json!({
            "title": event.title(),
            "description": description,
            "color": Self::get_color(event.priority()),
            "footer": {
                "text": format!("Priority: {} | Type: {}", event.priority(), event.event_type())
            }
        });
        if let Some(ts) = event.timestamp() {
            embed["timestamp"] = json!(ts.to_rfc3339());
        }
        if let Some(link) = event.link() {
            embed["url"] = json!(link);
        }

        let mut payload = json!({
            "embeds": [embed]
        });

        if let Some(username) = &self.config.username {
            payload["username"] = json!(username);
        }
        if let Some(avatar_url) = &self.config.avatar_url {
            payload["avatar_url"] = json!(avatar_url);
        }

        payload
    }
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &'static str {
        "discord"
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

        debug!(channel = %self.name, event_type = event.event_type(), "Discord notification sent");
        Ok(())
    }
}
