//! Fan-out of events to channels.
//!
//! Every (event, channel) pair is one isolated attempt running in its own
//! tokio task under the channel's deadline. Attempts run concurrently up to
//! the configured limit, but results come back in event order, then channel
//! order, regardless of completion order.

use std::any::Any;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use super::channels::NotificationChannel;
use super::delivery::{DeliveryError, DeliveryResult};
use super::events::Event;
use crate::redact::Redactor;

/// Default maximum number of in-flight attempts.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Delivers events to a fixed set of channels.
pub struct Dispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    concurrency: usize,
    redactor: Arc<Redactor>,
}

impl Dispatcher {
    /// Create a dispatcher over `channels`, kept in the given order.
    ///
    /// A `concurrency` of zero is treated as one.
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>, concurrency: usize) -> Self {
        Self {
            channels,
            concurrency: concurrency.max(1),
            redactor: Arc::new(Redactor::default()),
        }
    }

    /// Use `redactor` for failure details written to the log.
    pub fn with_redactor(mut self, redactor: Arc<Redactor>) -> Self {
        self.redactor = redactor;
        self
    }

    /// Number of channels attempts are made on.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver every event through every channel.
    ///
    /// Returns exactly `events.len() * channel_count()` results. Never fails:
    /// errors, timeouts and panics of individual attempts become failed
    /// results.
    pub async fn dispatch(&self, events: &[Event]) -> Vec<DeliveryResult> {
        if events.is_empty() || self.channels.is_empty() {
            debug!(
                events = events.len(),
                channels = self.channels.len(),
                "Nothing to dispatch"
            );
            return Vec::new();
        }

        info!(
            events = events.len(),
            channels = self.channels.len(),
            concurrency = self.concurrency,
            "Dispatching notifications"
        );

        let events: Vec<Arc<Event>> = events.iter().cloned().map(Arc::new).collect();
        let attempts = events.iter().enumerate().flat_map(|(event_index, event)| {
            self.channels
                .iter()
                .map(move |channel| (event_index, Arc::clone(event), Arc::clone(channel)))
        });

        stream::iter(attempts)
            .map(|(event_index, event, channel)| {
                attempt(event_index, event, channel, Arc::clone(&self.redactor))
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

/// Run one attempt in its own task and turn every outcome into a result.
async fn attempt(
    event_index: usize,
    event: Arc<Event>,
    channel: Arc<dyn NotificationChannel>,
    redactor: Arc<Redactor>,
) -> DeliveryResult {
    let name = channel.name().to_string();
    let channel_type = channel.channel_type();
    let deadline = channel.timeout();

    let task = tokio::spawn(async move {
        if deadline.is_zero() {
            return channel.send(&event).await;
        }
        match tokio::time::timeout(deadline, channel.send(&event)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DeliveryError::Timeout(deadline)),
        }
    });

    let outcome = match task.await {
        Ok(outcome) => outcome,
        Err(e) => Err(DeliveryError::Panicked(join_error_message(e))),
    };

    match outcome {
        Ok(()) => {
            debug!(channel = %name, channel_type, event_index, "Notification delivered");
            DeliveryResult::success(name, channel_type, event_index)
        }
        Err(error) => {
            warn!(
                channel = %name,
                channel_type,
                event_index,
                error = %redactor.redact(&error.to_string()),
                "Notification delivery failed"
            );
            DeliveryResult::failure(name, channel_type, event_index, error)
        }
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task was cancelled".to_string();
    }
    panic_message(err.into_panic())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
