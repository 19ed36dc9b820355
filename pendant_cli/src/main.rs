#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]
//! `pendant`: jogwheel pendant that drives a Marlin joystick input.

mod backend;
mod cli;
mod error_fmt;
mod rt;
mod simulate;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use pendant_core::{ControllerStats, PendantConfig};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    color_eyre::install()?;

    let cfg = pendant_config::load_path(&cli.config)?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");
    let core = PendantConfig::from(&cfg);

    match cli.cmd {
        Commands::Run {
            stats,
            rt,
            rt_prio,
            rt_lock,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = Arc::clone(&shutdown);
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                    .wrap_err("install Ctrl-C handler")?;
            }
            rt::setup_rt_once(rt, rt_prio, rt_lock);

            let mut backend = backend::open(&cfg, core)?;
            tracing::info!(backend = backend.name, "pendant running; Ctrl-C to stop");
            let final_stats = backend.pendant.run(&shutdown)?;
            if stats {
                print_stats(&final_stats, cli.json);
            }
        }
        Commands::Simulate {
            axis,
            speed,
            ticks,
            rate_hz,
            reverse,
        } => {
            let script = simulate::Script {
                axis,
                speed,
                ticks,
                rate_hz,
                reverse,
            };
            let final_stats = simulate::run(core, script, cli.json)?;
            print_stats(&final_stats, cli.json);
        }
        Commands::SelfCheck => {
            let mut backend = backend::open(&cfg, core)?;
            backend.pendant.begin()?;
            backend.pendant.shutdown()?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "status": "ok", "backend": backend.name })
                );
            } else {
                println!("OK: config valid, {} backend centered all axes", backend.name);
            }
        }
    }
    Ok(())
}

/// Console layer to stderr (pretty or JSON) plus an optional JSON file sink.
fn init_tracing(json: bool, level: &str, logging: &pendant_config::Logging) -> Result<()> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

fn print_stats(s: &ControllerStats, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "stats": {
                    "cycles": s.cycles,
                    "ticks_consumed": s.ticks_consumed,
                    "ticks_discarded_disabled": s.ticks_discarded_disabled,
                    "ticks_discarded_no_axis": s.ticks_discarded_no_axis,
                    "pulses_started": s.pulses_started,
                    "pulses_extended": s.pulses_extended,
                    "pulses_replaced": s.pulses_replaced,
                    "pulses_expired": s.pulses_expired,
                    "bus_writes": s.bus_writes,
                    "bus_errors": s.bus_errors,
                    "panel_errors": s.panel_errors,
                    "enable_errors": s.enable_errors,
                    "queue_overflows": s.queue_overflows,
                    "invalid_transitions": s.invalid_transitions,
                }
            })
        );
        return;
    }
    eprintln!("\n--- Pendant Stats ---");
    eprintln!("Cycles: {}", s.cycles);
    eprintln!(
        "Ticks consumed/discarded (disabled, no axis): {} / {}, {}",
        s.ticks_consumed, s.ticks_discarded_disabled, s.ticks_discarded_no_axis
    );
    eprintln!(
        "Pulses started/extended/replaced/expired: {} / {} / {} / {}",
        s.pulses_started, s.pulses_extended, s.pulses_replaced, s.pulses_expired
    );
    eprintln!("Bus writes/errors: {} / {}", s.bus_writes, s.bus_errors);
    eprintln!(
        "Panel errors: {}  Enable errors: {}  Queue overflows: {}  Invalid transitions: {}",
        s.panel_errors, s.enable_errors, s.queue_overflows, s.invalid_transitions
    );
    eprintln!("---------------------\n");
}
