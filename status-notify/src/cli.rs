//! Command-line interface and the run pipeline.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::{Value, json};
use tracing::info;

use crate::Result;
use crate::config::{Environment, NotifyConfig};
use crate::logging::LogFormat;
use crate::notification::{Dispatcher, Event, load_events};
use crate::redact::Redactor;
use crate::report::{Reporter, Summary};

/// Deliver status-change notifications to Slack, Discord, Telegram, email and webhooks.
#[derive(Parser, Debug, Clone)]
#[command(name = "status-notify", version, about, long_about = None)]
pub struct Args {
    /// Channel configuration file (JSON)
    #[arg(short, long, value_name = "PATH", env = "STATUS_NOTIFY_CONFIG")]
    pub config: PathBuf,

    /// Events file (JSON array or single object); a missing file means no events
    #[arg(short, long, value_name = "PATH", default_value = "events.json")]
    pub events: PathBuf,

    /// Print per-failure details and debug logs
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Show the events and the redacted configuration without sending anything
    #[arg(long)]
    pub dry_run: bool,

    /// Dotenv file merged into the environment used for `env:` references
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Maximum number of deliveries in flight
    #[arg(
        long,
        value_name = "N",
        default_value = "4",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub concurrency: u32,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Run one invocation, writing operator output to `out`.
pub async fn run<W: Write>(args: &Args, out: &mut W) -> Result<Summary> {
    let mut env = Environment::from_process();
    if let Some(env_file) = &args.env_file {
        env = env.with_env_file(env_file)?;
    }

    let config = NotifyConfig::load(&args.config, &env)?;
    let events = load_events(&args.events)?;
    let redactor = config.redactor();

    if args.dry_run {
        print_dry_run(out, &config, &events, &redactor)?;
        return Ok(Summary::default());
    }

    if args.verbose {
        let names: Vec<&str> = config.channels().iter().map(|c| c.name.as_str()).collect();
        let listed = if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        };
        writeln!(out, "Enabled channels: {listed}")?;
    }

    let dispatcher = Dispatcher::new(config.build_channels(), args.concurrency as usize)
        .with_redactor(Arc::new(redactor.clone()));
    let results = dispatcher.dispatch(&events).await;

    let summary = Reporter::new(args.verbose, redactor).report(out, &results)?;
    info!(
        succeeded = summary.success_count,
        failed = summary.failure_count,
        "Run finished"
    );
    Ok(summary)
}

fn print_dry_run<W: Write>(
    out: &mut W,
    config: &NotifyConfig,
    events: &[Event],
    redactor: &Redactor,
) -> Result<()> {
    let channels: Vec<Value> = config
        .channels()
        .iter()
        .map(|c| json!({"name": c.name, "type": c.config.channel_type()}))
        .collect();

    writeln!(
        out,
        "Dry run: {} event(s), {} enabled channel(s); nothing will be sent",
        events.len(),
        channels.len()
    )?;
    writeln!(out, "Enabled channels:")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&channels)?)?;
    writeln!(out, "Events:")?;
    let events: Vec<Value> = events
        .iter()
        .map(|event| redactor.redact_value(&event.to_value()))
        .collect();
    writeln!(out, "{}", serde_json::to_string_pretty(&events)?)?;
    writeln!(out, "Configuration:")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&config.redacted())?)?;
    out.flush()?;
    Ok(())
}
