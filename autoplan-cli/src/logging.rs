//! `tracing-subscriber` setup for the `autoplan` binary.
//!
//! Level precedence: `--log-level`, then `AUTOPLAN_LOG`, then `[log] level`
//! from config.toml, then `warn`. Output goes to stderr so `--json` plans on
//! stdout stay machine-readable.

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::LogLevel;

pub fn init_logging(cli_level: Option<LogLevel>, config_level: &str) -> Result<()> {
    let env_level = std::env::var("AUTOPLAN_LOG").ok();
    let level = resolve_level(cli_level, env_level.as_deref(), config_level);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("install log subscriber: {e}"))
}

fn resolve_level(cli: Option<LogLevel>, env: Option<&str>, config: &str) -> Level {
    cli.map(LogLevel::as_level)
        .or_else(|| env.and_then(parse_level_str))
        .or_else(|| parse_level_str(config))
        .unwrap_or(Level::WARN)
}

pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
