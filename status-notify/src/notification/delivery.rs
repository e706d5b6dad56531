//! Per-attempt delivery outcomes.

use std::time::Duration;

use thiserror::Error;

/// Why a single delivery attempt failed.
///
/// These never abort a run; the dispatcher stores them inside
/// [`DeliveryResult`] and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The endpoint accepted the request but reported an API-level error.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The attempt did not finish within the channel's deadline.
    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// SMTP transport or server error.
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// The message could not be built from the event and settings.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The transport panicked while handling the event.
    #[error("transport panicked: {0}")]
    Panicked(String),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL: webhook URLs and bot tokens are credentials.
        Self::Request(err.without_url().to_string())
    }
}

/// Outcome of delivering one event through one channel.
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    /// Channel identifier from the configuration.
    pub channel: String,
    /// Transport kind (`slack`, `email`, ...).
    pub channel_type: &'static str,
    /// Position of the event in the input batch.
    pub event_index: usize,
    /// Failure detail, `None` on success.
    pub error: Option<DeliveryError>,
}

impl DeliveryResult {
    pub fn success(channel: impl Into<String>, channel_type: &'static str, event_index: usize) -> Self {
        Self {
            channel: channel.into(),
            channel_type,
            event_index,
            error: None,
        }
    }

    pub fn failure(
        channel: impl Into<String>,
        channel_type: &'static str,
        event_index: usize,
        error: DeliveryError,
    ) -> Self {
        Self {
            channel: channel.into(),
            channel_type,
            event_index,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
