//! Notification delivery.
//!
//! Events are fanned out to every enabled channel through the
//! [`Dispatcher`]; each (event, channel) attempt yields one
//! [`DeliveryResult`].
//!
//! # Example
//!
//! ```ignore
//! use status_notify::notification::{ChannelConfig, Dispatcher};
//!
//! let config = ChannelConfig::from_record("slack", &record)?;
//! let dispatcher = Dispatcher::new(vec![config.build("slack")], 4);
//! let results = dispatcher.dispatch(&events).await;
//! ```

pub mod channels;
pub mod delivery;
pub mod dispatcher;
pub mod events;

pub use channels::{ChannelConfig, NotificationChannel};
pub use delivery::{DeliveryError, DeliveryResult};
pub use dispatcher::{DEFAULT_CONCURRENCY, Dispatcher};
pub use events::{Event, NotificationPriority, load_events};
