//! status-notify: deliver status-change notifications.
//!
//! A run reads a channel configuration (with `env:VAR` indirection for
//! secrets), reads a batch of events, fans every event out to every enabled
//! channel and summarizes the outcome.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod notification;
pub mod redact;
pub mod report;
pub mod utils;

pub use error::{Error, Result};
