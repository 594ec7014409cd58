// src/lib.rs

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod registry;
pub mod scheduler;
pub mod task;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::HttpControlPlane;
use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::engine::{CoreRuntime, EnqueueHandle, Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::{ExecutorSettings, RealExecutorBackend};
use crate::registry::{ProcessRegistry, StaticRegistry};
use crate::scheduler::{Scheduler, SchedulerOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - process registry
/// - scheduler / runtime
/// - executor
/// - control plane client
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let registry: Arc<dyn ProcessRegistry> = Arc::new(StaticRegistry::from_config(&cfg));
    let settings = Arc::new(ExecutorSettings::from_config(&cfg));

    let scheduler = Scheduler::new(SchedulerOptions::from_settings(&cfg.daemon), registry.ids());
    info!(
        servers = registry.ids().len(),
        concurrency = ?cfg.daemon.concurrency,
        "scheduler ready"
    );

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = RealExecutorBackend::new(rt_tx.clone(), Arc::clone(&registry), settings);
    let control_plane = HttpControlPlane::new(&cfg.api)?;

    // Ctrl-C → graceful shutdown.
    {
        let handle = EnqueueHandle::new(rt_tx.clone());
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = handle.shutdown().await;
        });
    }

    let options = RuntimeOptions {
        exit_when_idle: args.once,
    };

    // Construct the pure core runtime (single source of truth for semantics).
    let core = CoreRuntime::new(scheduler, options);

    // Construct the async IO shell around the core.
    let runtime = Runtime::new(core, rt_rx, executor, control_plane, cfg.daemon.tick_interval);
    runtime.run().await?;
    Ok(())
}

/// Simple dry-run output: print daemon settings, scripts and servers.
fn print_dry_run(cfg: &ConfigFile) {
    println!("gamed dry-run");
    println!("  daemon.work_path = {}", cfg.daemon.work_path);
    println!("  daemon.tick_interval = {:?}", cfg.daemon.tick_interval);
    println!("  daemon.cache_ttl = {:?}", cfg.daemon.cache_ttl);
    println!("  daemon.command_timeout = {:?}", cfg.daemon.command_timeout);
    println!("  daemon.stop_grace = {:?}", cfg.daemon.stop_grace);
    println!("  daemon.concurrency = {:?}", cfg.daemon.concurrency);
    println!("  api.host = {}", cfg.api.host);
    println!();

    println!("scripts:");
    let scripts = [
        ("start", &cfg.scripts.start),
        ("stop", &cfg.scripts.stop),
        ("restart", &cfg.scripts.restart),
        ("status", &cfg.scripts.status),
        ("update", &cfg.scripts.update),
        ("delete", &cfg.scripts.delete),
    ];
    for (name, template) in scripts {
        if !template.is_empty() {
            println!("  {name}: {template}");
        }
    }
    println!();

    println!("servers ({}):", cfg.servers.len());
    for (id, server) in cfg.servers.iter() {
        println!("  - {id}");
        println!("      dir: {}", server.dir);
        if let Some(ref user) = server.user {
            println!("      user: {user}");
        }
        if !server.start_command.is_empty() {
            println!("      start_command: {}", server.start_command);
        }
        if !server.stop_command.is_empty() {
            println!("      stop_command: {}", server.stop_command);
        }
        if !server.force_stop_command.is_empty() {
            println!("      force_stop_command: {}", server.force_stop_command);
        }
        if !server.restart_command.is_empty() {
            println!("      restart_command: {}", server.restart_command);
        }
        if !server.vars.is_empty() {
            println!("      vars: {:?}", server.vars);
        }
    }

    debug!("dry-run complete (no execution)");
}
