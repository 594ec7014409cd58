// src/logging.rs

//! Daemon logging.
//!
//! `--log-level` wins when given. Otherwise `GAMED_LOG` is read as a full
//! `EnvFilter` directive list (e.g. `gamed=debug,reqwest=info`). With
//! neither, everything logs at `info` except the HTTP client stack, which
//! is held at `warn` so every panel poll doesn't show up.
//!
//! Logs go to stderr.

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "GAMED_LOG";

const HTTP_STACK: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"];

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

/// Filter for a CLI level and a `GAMED_LOG` value.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    let env = env.map(str::trim).filter(|s| !s.is_empty());

    let directives = match (cli_level, env) {
        (Some(level), _) => with_http_stack(level.as_str()),
        (None, Some(env)) => env.to_string(),
        (None, None) => with_http_stack("info"),
    };

    EnvFilter::try_new(&directives).with_context(|| format!("invalid log filter {directives:?}"))
}

fn with_http_stack(level: &str) -> String {
    std::iter::once(level)
        .chain(HTTP_STACK.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}
