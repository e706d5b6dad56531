//! Generic webhook notification channel.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{NotificationChannel, check_http_response, default_timeout, require_http_url};
use crate::notification::delivery::DeliveryError;
use crate::notification::events::Event;
use crate::{Error, Result};

/// Webhook channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Webhook URL.
    #[serde(default)]
    pub url: String,
    /// HTTP method (default: POST).
    #[serde(default = "default_method")]
    pub method: String,
    /// Custom headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_method() -> String {
    "POST".to_string()
}

impl WebhookConfig {
    pub fn validate(&self, name: &str) -> Result<()> {
        require_http_url(name, "url", &self.url)?;
        self.parsed_method()
            .ok_or_else(|| Error::channel(name, format!("unsupported method '{}'", self.method)))?;
        for (key, value) in &self.headers {
            HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| Error::channel(name, format!("invalid header name '{key}'")))?;
            HeaderValue::from_str(value)
                .map_err(|_| Error::channel(name, format!("invalid value for header '{key}'")))?;
        }
        Ok(())
    }

    fn parsed_method(&self) -> Option<Method> {
        match self.method.trim().to_ascii_uppercase().as_str() {
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            _ => None,
        }
    }
}

/// Generic webhook notification channel.
pub struct WebhookChannel {
    name: String,
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    /// Create a new Webhook channel.
    pub fn new(name: &str, config: WebhookConfig) -> Self {
        let client =
            crate::utils::http_client::build_channel_client(Duration::from_secs(config.timeout_secs));
        Self {
            name: name.to_string(),
            config,
            client,
        }
    }

    /// Build the request headers.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for (name, value) in &self.config.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(mut value)) => {
                    value.set_sensitive(true);
                    headers.insert(name, value);
                }
                _ => warn!(channel = %self.name, header = %name, "Skipping invalid webhook header"),
            }
        }

        headers
    }

    /// Build the JSON payload.
    fn build_payload(&self, event: &Event) -> Value {
        json!({
            "event_type": event.event_type(),
            "service": event.service(),
            "state": event.state(),
            "title": event.title(),
            "description": event.description(),
            "priority": event.priority().to_string(),
            "timestamp": event.timestamp().map(|ts| ts.to_rfc3339()),
            "event": event,
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &'static str {
        "webhook"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn send(&self, event: &Event) -> std::result::Result<(), DeliveryError> {
        let method = self.config.parsed_method().unwrap_or(Method::POST);
        let payload = self.build_payload(event);

        let response = self
            .client
            .request(method, &self.config.url)
            .headers(self.build_headers())
            .json(&payload)
            .send()
            .await?;
        check_http_response(response).await?;

        debug!(channel = %self.name, event_type = event.event_type(), "Webhook notification sent");
        Ok(())
    }
}
