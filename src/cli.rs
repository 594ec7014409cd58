// src/cli.rs

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Game server host daemon.
///
/// Pulls lifecycle tasks (start, stop, restart, update, ...) from the
/// panel's daemon API, runs them against the servers in the config and
/// reports each result back.
#[derive(Debug, Clone, Parser)]
#[command(name = "gamed", version, long_about = None)]
pub struct CliArgs {
    /// Daemon config: `[daemon]`, `[api]`, `[scripts]` and one
    /// `[server.<id>]` table per managed server.
    #[arg(long, value_name = "PATH", default_value = "gamed.toml")]
    pub config: PathBuf,

    /// Exit once no task is queued, running or waiting to be reported.
    #[arg(long)]
    pub once: bool,

    /// Log level for gamed itself. Overrides `GAMED_LOG`.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the resolved servers and script templates, then exit.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
