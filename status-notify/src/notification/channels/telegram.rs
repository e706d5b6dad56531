//! Telegram Bot API notification channel.
//!
//! Sends messages via the Telegram Bot API (`POST /bot<token>/sendMessage`).
//! A response whose JSON body reports `"ok": false` is treated as a failure
//! even when the HTTP status is 2xx.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::{
    NotificationChannel, check_http_response, default_timeout, escape_html, require_http_url,
    require_non_empty,
};
use crate::{Error, Result};
use crate::notification::delivery::DeliveryError;
use crate::notification::events::{Event, NotificationPriority};
use crate::utils::http_client::{build_channel_client, summarize_error_body};

/// Telegram `sendMessage` text limit (UTF-8 characters).
const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Telegram channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    /// Telegram Bot API token.
    #[serde(default)]
    pub bot_token: String,
    /// Target chat ID (user, group, or channel). Numeric IDs are accepted.
    #[serde(default, deserialize_with = "string_or_number")]
    pub chat_id: String,
    /// Parse mode for message formatting (HTML, Markdown, MarkdownV2).
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
    /// Bot API base URL, overridable for self-hosted API servers.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-attempt deadline in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_parse_mode() -> String {
    "HTML".to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

impl TelegramConfig {
    pub fn validate(&self, name: &str) -> Result<()> {
        require_non_empty(name, "botToken", &self.bot_token)?;
        require_non_empty(name, "chatId", &self.chat_id)?;
        if ParseMode::parse(&self.parse_mode).is_none() {
            return Err(Error::channel(
                name,
                "parseMode must be HTML, Markdown or MarkdownV2",
            ));
        }
        require_http_url(name, "apiBaseUrl", &self.api_base_url)
    }

    fn mode(&self) -> ParseMode {
        ParseMode::parse(&self.parse_mode).unwrap_or(ParseMode::Html)
    }
}

/// Telegram notification channel.
pub struct TelegramChannel {
    name: String,
    config: TelegramConfig,
    client: Client,
}

impl TelegramChannel {
    /// Create a new Telegram channel.
    pub fn new(name: &str, config: TelegramConfig) -> Self {
        let client = build_channel_client(Duration::from_secs(config.timeout_secs));
        Self {
            name: name.to_string(),
            config,
            client,
        }
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    /// Build the message text for an event.
    ///
    /// Only the description is shortened to fit the limit, and it is cut
    /// before escaping so the markup and footer stay intact.
    fn build_message(&self, event: &Event) -> String {
        let emoji = match event.priority() {
            NotificationPriority::Low => "\u{2139}\u{fe0f}", // ℹ️
            NotificationPriority::Normal => "\u{1f514}",     // 🔔
            NotificationPriority::High => "\u{26a0}\u{fe0f}", // ⚠️
            NotificationPriority::Critical => "\u{1f6a8}",   // 🚨
        };

        let mode = self.config.mode();
        let title = event.title();
        let footer = format!(
            "Priority: {} | Type: {}",
            event.priority(),
            event.event_type()
        );
        let link = event.link();

        // Visible characters outside the description: "{emoji} {title}\n\n" + "\n\n{footer}" + "\n{link}".
        let frame = emoji.chars().count()
            + 1
            + title.chars().count()
            + 4
            + footer.chars().count()
            + link.map_or(0, |l| l.chars().count() + 1);
        let description = truncate_message(
            &event.description(),
            TELEGRAM_MESSAGE_LIMIT.saturating_sub(frame),
        );

        let title = mode.escape(&title);
        let description = mode.escape(&description);
        let footer = mode.escape(&footer);

        let mut text = match mode {
            ParseMode::Html => {
                format!("{emoji} <b>{title}</b>\n\n{description}\n\n<i>{footer}</i>")
            }
            ParseMode::MarkdownV2 => format!("{emoji} *{title}*\n\n{description}\n\n_{footer}_"),
            // Legacy Markdown cannot escape inside an entity, so nothing is styled.
            ParseMode::Markdown => format!("{emoji} {title}\n\n{description}\n\n{footer}"),
        };
        if let Some(link) = link {
            text.push('\n');
            text.push_str(&mode.escape(link));
        }
        text
    }
}

/// Telegram `parse_mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseMode {
    Html,
    Markdown,
    MarkdownV2,
}

impl ParseMode {
    fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("html") {
            Some(Self::Html)
        } else if value.eq_ignore_ascii_case("markdownv2") {
            Some(Self::MarkdownV2)
        } else if value.eq_ignore_ascii_case("markdown") {
            Some(Self::Markdown)
        } else {
            None
        }
    }

    fn escape(self, text: &str) -> String {
        match self {
            Self::Html => escape_html(text),
            Self::Markdown => escape_markdown(text),
            Self::MarkdownV2 => escape_markdown_v2(text),
        }
    }
}

/// Escape entity characters for the legacy `Markdown` parse mode.
fn escape_markdown(text: &str) -> String {
    escape_with(text, &['_', '*', '`', '['])
}

/// Escape reserved characters for the `MarkdownV2` parse mode.
fn escape_markdown_v2(text: &str) -> String {
    escape_with(
        text,
        &[
            '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}',
            '.', '!',
        ],
    )
}

fn escape_with(text: &str, reserved: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if reserved.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &'static str {
        "telegram"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn send(&self, event: &Event) -> std::result::Result<(), DeliveryError> {
        let payload = json!({
            "chat_id": self.config.chat_id,
            "text": self.build_message(event),
            "parse_mode": self.config.parse_mode,
        });

        let response = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await?;
        let body = check_http_response(response).await?;
        check_api_body(&body)?;

        debug!(channel = %self.name, event_type = event.event_type(), "Telegram notification sent");
        Ok(())
    }
}

/// Inspect the Bot API envelope of a 2xx response.
fn check_api_body(body: &str) -> std::result::Result<(), DeliveryError> {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        // Proxies in front of self-hosted API servers may answer with plain text.
        return Ok(());
    };
    if parsed.get("ok").and_then(Value::as_bool) == Some(false) {
        let description = parsed
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("sendMessage returned ok=false");
        return Err(DeliveryError::Rejected(summarize_error_body(description)));
    }
    Ok(())
}

/// Truncate a message to fit within the Telegram character limit.
fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let suffix = "\n\n[truncated]";
    let budget = limit.saturating_sub(suffix.chars().count());
    let truncated: String = text.chars().take(budget).collect();
    format!("{truncated}{suffix}")
}
