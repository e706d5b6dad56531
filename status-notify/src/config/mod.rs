//! Channel configuration.
//!
//! The configuration file is a JSON object with a `channels` mapping from
//! channel identifier to channel record. Any string in the document may be an
//! `env:VAR_NAME` reference; references are resolved once at load time
//! against an injected [`Environment`].
//!
//! ```json
//! {
//!   "channels": {
//!     "slack": { "enabled": true, "webhookUrl": "env:SLACK_WEBHOOK_URL" },
//!     "ops-hook": { "enabled": false, "type": "webhook", "url": "https://example.com" }
//!   }
//! }
//! ```

pub mod environment;
pub mod resolver;

pub use environment::Environment;
pub use resolver::{ENV_PREFIX, resolve, resolve_tracked};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::notification::channels::{ChannelConfig, NotificationChannel};
use crate::redact::{Redactor, collect_secret_values};
use crate::{Error, Result};

/// One enabled channel, validated and typed.
#[derive(Debug, Clone)]
pub struct ChannelEntry {
    /// Identifier used as the key in the `channels` mapping.
    pub name: String,
    pub config: ChannelConfig,
}

/// A loaded and resolved configuration file.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    path: PathBuf,
    raw: Value,
    resolved: Value,
    channels: Vec<ChannelEntry>,
    substituted: Vec<String>,
}

impl NotifyConfig {
    /// Read, parse, resolve and validate the configuration at `path`.
    pub fn load(path: &Path, env: &Environment) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: Value = serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_value(raw, env)?.with_path(path);
        info!(
            path = %path.display(),
            enabled = config.channels.len(),
            "Loaded notification config"
        );
        Ok(config)
    }

    /// Resolve and validate an already parsed configuration document.
    pub fn from_value(raw: Value, env: &Environment) -> Result<Self> {
        if !raw.get("channels").is_some_and(Value::is_object) {
            return Err(Error::config(
                "configuration must be an object with a 'channels' object",
            ));
        }

        let (resolved, substituted) = resolve_tracked(&raw, env)?;
        let channels = enabled_channels(&resolved)?;

        Ok(Self {
            path: PathBuf::new(),
            raw,
            resolved,
            channels,
            substituted,
        })
    }

    fn with_path(mut self, path: &Path) -> Self {
        self.path = path.to_path_buf();
        self
    }

    /// Path the configuration was loaded from, empty for in-memory configs.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The document as written, with `env:` references intact.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The document with every `env:` reference substituted.
    pub fn resolved(&self) -> &Value {
        &self.resolved
    }

    /// Enabled channels in file order.
    pub fn channels(&self) -> &[ChannelEntry] {
        &self.channels
    }

    /// Every value that must never appear in operator output: values
    /// substituted from the environment plus values of secret fields.
    pub fn secrets(&self) -> Vec<String> {
        let mut secrets = self.substituted.clone();
        secrets.extend(collect_secret_values(&self.resolved));
        secrets.sort();
        secrets.dedup();
        secrets
    }

    /// A redactor primed with this configuration's secrets.
    pub fn redactor(&self) -> Redactor {
        Redactor::new(self.secrets())
    }

    /// The resolved document with secrets masked, for display.
    pub fn redacted(&self) -> Value {
        self.redactor().redact_value(&self.resolved)
    }

    /// Instantiate one transport per enabled channel, in file order.
    pub fn build_channels(&self) -> Vec<Arc<dyn NotificationChannel>> {
        self.channels
            .iter()
            .map(|entry| entry.config.build(&entry.name))
            .collect()
    }
}

fn enabled_channels(resolved: &Value) -> Result<Vec<ChannelEntry>> {
    let Some(records) = resolved.get("channels").and_then(Value::as_object) else {
        return Err(Error::config("missing 'channels' object"));
    };

    let mut entries = Vec::new();
    for (name, record) in records {
        if !record.is_object() {
            return Err(Error::channel(name, "channel record must be an object"));
        }
        if !is_enabled(name, record)? {
            debug!(channel = %name, "Channel disabled, skipping");
            continue;
        }

        let config = ChannelConfig::from_record(name, record)?;
        debug!(channel = %name, channel_type = config.channel_type(), "Channel enabled");
        entries.push(ChannelEntry {
            name: name.clone(),
            config,
        });
    }
    Ok(entries)
}

/// Read the `enabled` flag; absent means disabled.
///
/// String forms are accepted since flags are often supplied via `env:`.
fn is_enabled(name: &str, record: &Value) -> Result<bool> {
    match record.get("enabled") {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(enabled)) => Ok(*enabled),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            _ => Err(Error::channel(name, "'enabled' must be a boolean")),
        },
        Some(_) => Err(Error::channel(name, "'enabled' must be a boolean")),
    }
}
