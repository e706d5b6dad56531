//! Secret redaction for operator-facing output.
//!
//! Everything printed or logged that may carry configuration content goes
//! through a [`Redactor`]: dry-run dumps, verbose failure lines and failure
//! logs emitted by the dispatcher.

use regex::Regex;
use serde_json::{Map, Value};

/// Canonical replacement marker for redacted content.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Object keys whose string values are always secrets.
const SECRET_KEYS: &[&str] = &[
    "webhookurl",
    "url",
    "bottoken",
    "pass",
    "password",
    "token",
    "secret",
    "apikey",
];

/// Object keys whose every nested string value is a secret.
const SECRET_CONTAINERS: &[&str] = &["headers"];

/// Shorter exact values are only redacted through their key, never by
/// substring replacement, to keep ports and flags readable.
const MIN_EXACT_SECRET_LEN: usize = 4;

/// Redacts known secret values and token-like patterns.
#[derive(Debug, Clone)]
pub struct Redactor {
    exact_secrets: Vec<String>,
    patterns: Vec<Regex>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Redactor {
    /// Create a redactor from known secret values.
    pub fn new(exact_secrets: Vec<String>) -> Self {
        let mut exact_secrets: Vec<String> = exact_secrets
            .into_iter()
            .filter(|s| s.chars().count() >= MIN_EXACT_SECRET_LEN)
            .collect();
        // Longest first so a secret containing another is replaced whole.
        exact_secrets.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        exact_secrets.dedup();

        Self {
            exact_secrets,
            patterns: default_patterns(),
        }
    }

    /// Redact exact known secrets and known secret patterns.
    pub fn redact(&self, text: &str) -> String {
        let mut sanitized = text.to_owned();
        for secret in &self.exact_secrets {
            sanitized = sanitized.replace(secret.as_str(), REDACTION_MARKER);
        }
        for pattern in &self.patterns {
            sanitized = pattern
                .replace_all(&sanitized, REDACTION_MARKER)
                .to_string();
        }
        sanitized
    }

    /// Redact a JSON document.
    ///
    /// String values under secret keys are replaced outright; every other
    /// string goes through [`Redactor::redact`]. Keys are never altered.
    pub fn redact_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.redact(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.redact_value(v)).collect()),
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, v) in map {
                    let redacted = if is_secret_container(key) {
                        mask_strings(v)
                    } else if is_secret_key(key) && v.is_string() {
                        Value::String(REDACTION_MARKER.to_string())
                    } else {
                        self.redact_value(v)
                    };
                    out.insert(key.clone(), redacted);
                }
                Value::Object(out)
            }
            other => other.clone(),
        }
    }
}

/// Whether a configuration key names a secret field.
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SECRET_KEYS.contains(&key.as_str())
}

fn is_secret_container(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SECRET_CONTAINERS.contains(&key.as_str())
}

fn mask_strings(value: &Value) -> Value {
    match value {
        Value::String(_) => Value::String(REDACTION_MARKER.to_string()),
        Value::Array(items) => Value::Array(items.iter().map(mask_strings).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), mask_strings(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Collect the string values stored under secret keys anywhere in `value`.
pub fn collect_secret_values(value: &Value) -> Vec<String> {
    fn walk(value: &Value, inside_secret: bool, out: &mut Vec<String>) {
        match value {
            Value::String(s) if inside_secret && !s.is_empty() => out.push(s.clone()),
            Value::Array(items) => items.iter().for_each(|v| walk(v, inside_secret, out)),
            Value::Object(map) => {
                for (key, v) in map {
                    let secret = inside_secret || is_secret_container(key) || is_secret_key(key);
                    walk(v, secret, out);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    walk(value, false, &mut out);
    out
}

fn default_patterns() -> Vec<Regex> {
    let patterns = [
        // Slack incoming webhooks
        r"https://hooks\.slack\.com/services/[A-Za-z0-9_/\-]+",
        // Discord webhooks
        r"https://(?:ptb\.|canary\.)?discord(?:app)?\.com/api/webhooks/[0-9]+/[A-Za-z0-9_\-]+",
        // Telegram bot tokens
        r"\b[0-9]{6,12}:[A-Za-z0-9_\-]{30,}\b",
        r"xox[abposr]-[A-Za-z0-9\-]{10,}",
        r"(?i)bearer\s+[A-Za-z0-9._~+/\-]{8,}=*",
    ];

    patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redacts_exact_secrets() {
        let redactor = Redactor::new(vec!["hunter2-pass".to_string()]);
        assert_eq!(
            redactor.redact("login failed for hunter2-pass"),
            "login failed for [REDACTED]"
        );
    }

    #[test]
    fn test_short_values_not_substring_redacted() {
        let redactor = Redactor::new(vec!["587".to_string()]);
        assert_eq!(redactor.redact("port 587"), "port 587");
    }

    #[test]
    fn test_longest_secret_wins() {
        let redactor = Redactor::new(vec!["abcd".to_string(), "abcdefgh".to_string()]);
        assert_eq!(redactor.redact("x abcdefgh y"), "x [REDACTED] y");
    }

    #[test]
    fn test_redacts_known_patterns() {
        let redactor = Redactor::default();
        let text = "POST https://hooks.slack.com/services/T000/B000/XXXXXXXX failed";
        assert_eq!(redactor.redact(text), "POST [REDACTED] failed");

        let text = "token 123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw9 rejected";
        assert_eq!(redactor.redact(text), "token [REDACTED] rejected");
    }

    #[test]
    fn test_redact_value_masks_secret_keys() {
        let redactor = Redactor::default();
        let config = json!({
            "channels": {
                "telegram": {"enabled": true, "botToken": "abc", "chatId": "42"},
                "webhook": {
                    "url": "https://example.com/hook",
                    "headers": {"X-Api-Key": "k", "X-Other": "v"},
                    "timeoutSecs": 5
                },
                "email": {"smtp": {"host": "smtp.example.com", "auth": {"user": "bot", "pass": "p"}}}
            }
        });

        let redacted = redactor.redact_value(&config);
        let channels = &redacted["channels"];
        assert_eq!(channels["telegram"]["botToken"], REDACTION_MARKER);
        assert_eq!(channels["telegram"]["chatId"], "42");
        assert_eq!(channels["telegram"]["enabled"], true);
        assert_eq!(channels["webhook"]["url"], REDACTION_MARKER);
        assert_eq!(channels["webhook"]["headers"]["X-Other"], REDACTION_MARKER);
        assert_eq!(channels["webhook"]["timeoutSecs"], 5);
        assert_eq!(channels["email"]["smtp"]["auth"]["pass"], REDACTION_MARKER);
        assert_eq!(channels["email"]["smtp"]["auth"]["user"], "bot");
    }

    #[test]
    fn test_collect_secret_values() {
        let config = json!({
            "slack": {"webhookUrl": "https://hooks.example/1"},
            "webhook": {"headers": {"Authorization": "Bearer zzz"}},
            "email": {"from": "a@example.com"}
        });
        let mut secrets = collect_secret_values(&config);
        secrets.sort();
        assert_eq!(secrets, vec!["Bearer zzz", "https://hooks.example/1"]);
    }
}
