//! Notification events.
//!
//! Events are opaque JSON objects handed through to every channel unchanged.
//! Channels that render human-readable messages use the accessors below,
//! which look for the conventional status-page field names.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{Error, Result};

const SERVICE_KEYS: &[&str] = &["service", "system", "site", "name"];
const STATE_KEYS: &[&str] = &["state", "status"];
const PREVIOUS_STATE_KEYS: &[&str] = &["previousState", "previousStatus", "from"];
const MESSAGE_KEYS: &[&str] = &["message", "description", "details"];
const SEVERITY_KEYS: &[&str] = &["severity", "priority", "level"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "time", "date"];
const LINK_KEYS: &[&str] = &["url", "link"];
const EVENT_TYPE_KEYS: &[&str] = &["type", "event"];

/// Fallback event type when the record does not name one.
pub const DEFAULT_EVENT_TYPE: &str = "status_change";

/// Priority level for notifications.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// Low priority - informational only.
    Low,
    /// Normal priority - standard notifications.
    #[default]
    Normal,
    /// High priority - degraded service.
    High,
    /// Critical priority - outage.
    Critical,
}

impl NotificationPriority {
    /// Parse an explicit severity label.
    pub fn from_severity(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "info" | "minor" | "debug" => Some(Self::Low),
            "normal" | "medium" | "notice" => Some(Self::Normal),
            "high" | "warning" | "warn" | "major" | "error" => Some(Self::High),
            "critical" | "fatal" | "emergency" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Infer a priority from a state label.
    fn from_state(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "down" | "outage" | "major" | "major_outage" | "offline" => Some(Self::Critical),
            "degraded" | "partial" | "partial_outage" | "maintenance" => Some(Self::High),
            "up" | "operational" | "resolved" | "online" | "recovered" => Some(Self::Normal),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A single status-change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    /// Wrap a JSON object as an event.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw event fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Return the event as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Affected service identifier.
    pub fn service(&self) -> Option<&str> {
        self.first_str(SERVICE_KEYS)
    }

    /// New state of the service.
    pub fn state(&self) -> Option<&str> {
        self.first_str(STATE_KEYS)
    }

    /// State before the transition, when reported.
    pub fn previous_state(&self) -> Option<&str> {
        self.first_str(PREVIOUS_STATE_KEYS)
    }

    /// Free-form message attached to the event.
    pub fn message(&self) -> Option<&str> {
        self.first_str(MESSAGE_KEYS)
    }

    /// Link to the status page or the affected endpoint.
    pub fn link(&self) -> Option<&str> {
        self.first_str(LINK_KEYS)
    }

    /// Event type label.
    pub fn event_type(&self) -> &str {
        self.first_str(EVENT_TYPE_KEYS).unwrap_or(DEFAULT_EVENT_TYPE)
    }

    /// Priority from the explicit severity, else inferred from the state.
    pub fn priority(&self) -> NotificationPriority {
        self.first_str(SEVERITY_KEYS)
            .and_then(NotificationPriority::from_severity)
            .or_else(|| self.state().and_then(NotificationPriority::from_state))
            .unwrap_or_default()
    }

    /// Event timestamp.
    ///
    /// Accepts RFC 3339 strings and unix timestamps in seconds or milliseconds.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let value = TIMESTAMP_KEYS.iter().find_map(|k| self.0.get(*k))?;
        match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => {
                let raw = n.as_i64()?;
                // Values past 10^11 cannot be seconds in any plausible range.
                if raw.abs() >= 100_000_000_000 {
                    Utc.timestamp_millis_opt(raw).single()
                } else {
                    Utc.timestamp_opt(raw, 0).single()
                }
            }
            _ => None,
        }
    }

    /// Get a human-readable title for this event.
    pub fn title(&self) -> String {
        let emoji = match self.priority() {
            NotificationPriority::Low => "\u{2139}\u{fe0f}",
            NotificationPriority::Normal => "\u{1f7e2}",
            NotificationPriority::High => "\u{1f7e1}",
            NotificationPriority::Critical => "\u{1f534}",
        };

        match (self.service(), self.state()) {
            (Some(service), Some(state)) => format!("{emoji} {service} is {state}"),
            (Some(service), None) => format!("{emoji} {service} status changed"),
            (None, Some(state)) => format!("{emoji} Status changed to {state}"),
            (None, None) => format!("{emoji} Status change"),
        }
    }

    /// Get a human-readable description for this event.
    pub fn description(&self) -> String {
        if let Some(message) = self.message() {
            return message.to_string();
        }

        let service = self.service().unwrap_or("Service");
        match (self.previous_state(), self.state()) {
            (Some(from), Some(to)) => format!("{service} changed from {from} to {to}"),
            (None, Some(to)) => format!("{service} is now {to}"),
            _ => "No details provided".to_string(),
        }
    }
}

impl From<Map<String, Value>> for Event {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Load the batch of events to deliver.
///
/// A missing or blank file is an empty batch. The file may hold an array of
/// event objects or a single event object.
pub fn load_events(path: &Path) -> Result<Vec<Event>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Events file not found, nothing to send");
            return Ok(Vec::new());
        }
        Err(e) => return Err(Error::Io(e)),
    };

    if content.trim().is_empty() {
        debug!(path = %path.display(), "Events file is empty, nothing to send");
        return Ok(Vec::new());
    }

    let parsed: Value = serde_json::from_str(&content).map_err(|source| Error::EventsParse {
        path: path.to_path_buf(),
        source,
    })?;

    let invalid = |reason: String| Error::InvalidEvents {
        path: path.to_path_buf(),
        reason,
    };

    let events = match parsed {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(fields) => Ok(Event::new(fields)),
                other => Err(invalid(format!(
                    "event at index {index} is not an object (found {})",
                    json_type(&other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?,
        Value::Object(fields) => vec![Event::new(fields)],
        other => {
            return Err(invalid(format!(
                "expected an array of events or a single event object, found {}",
                json_type(&other)
            )));
        }
    };

    debug!(path = %path.display(), count = events.len(), "Loaded events");
    Ok(events)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
