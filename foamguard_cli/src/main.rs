use clap::Parser;
use eyre::WrapErr;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel as xch;
use foamguard_config::Config;
use foamguard_core::error::CoreError;
use foamguard_core::{OutboundCfg, OutboundChannel, OutboundHub, Runner, RunnerCfg, normalize};
use foamguard_traits::MonotonicClock;

mod cli;
mod console;
mod error_fmt;
mod hw;
mod logging;
mod sinks;
mod web;

use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use sinks::{CsvLogSink, JsonlPushSink, TracingReportSink};

/// Inbound queue depth between the readers and the run loop.
const INBOUND_CAPACITY: usize = 32;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if !cli.json {
        let _ = color_eyre::install();
    }

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    // Normalizing a payload needs neither config nor hardware.
    if let Commands::Normalize { channel, payload } = &cli.cmd {
        return print_normalized((*channel).into(), payload, cli.json);
    }

    let cfg = load_config(&cli.config)?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run {
            duration_ms,
            listen,
        } => run(&cfg, duration_ms, listen),
        Commands::SelfCheck => self_check(&cfg, cli.json),
        Commands::Normalize { .. } => Ok(()),
    }
}

/// Read, parse and validate the config. A missing file at the default path
/// falls back to built-in defaults.
fn load_config(path: &Path) -> eyre::Result<Config> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(text) => foamguard_config::load_toml(&text).map_err(|e| {
            eyre::Report::new(CoreError::Config(format!("{}: {e}", path.display())))
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && path == Path::new(cli::DEFAULT_CONFIG) => {
            Config::default()
        }
        Err(e) => {
            return Err(eyre::Report::new(CoreError::Config(format!(
                "read {}: {e}",
                path.display()
            ))));
        }
    };
    cfg.validate()
        .map_err(|e| eyre::Report::new(CoreError::Config(e.to_string())))?;
    Ok(cfg)
}

fn print_normalized(
    channel: foamguard_core::CommandChannel,
    payload: &str,
    json: bool,
) -> eyre::Result<()> {
    let cmd = normalize(channel, payload).map_err(eyre::Report::new)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "channel": channel.as_str(), "command": cmd.to_string() })
        );
    } else {
        println!("{cmd}");
    }
    Ok(())
}

fn run(cfg: &Config, duration_ms: Option<u64>, listen: Option<SocketAddr>) -> eyre::Result<()> {
    let (mut core, button) = hw::make_core(cfg)?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let mut hub = OutboundHub::new(OutboundCfg::from(&cfg.channels))
        .with_sink(OutboundChannel::Push, JsonlPushSink::stdout())
        .with_sink(OutboundChannel::Messaging, TracingReportSink);
    if let Some(path) = cfg.channels.log_csv.as_deref() {
        hub = hub.with_sink(OutboundChannel::Log, CsvLogSink::open(Path::new(path))?);
    }

    let (tx, rx) = xch::bounded(INBOUND_CAPACITY);
    let listen = match listen {
        Some(addr) => Some(addr),
        None => cfg
            .web
            .listen
            .as_deref()
            .map(str::parse::<SocketAddr>)
            .transpose()
            .wrap_err("web.listen")?,
    };
    if let Some(addr) = listen {
        web::spawn(addr, tx.clone())?;
    }
    // Detached: it blocks on stdin and ends with the process.
    let _reader = console::spawn_stdin_reader(tx);

    let mut runner = Runner::new(MonotonicClock::new(), RunnerCfg::from(cfg))
        .with_duration(duration_ms.map(Duration::from_millis))
        .with_stop_flag(stop)
        .with_inbound(rx);
    if let Some(read) = button {
        runner = runner.with_button(read);
    }

    let stats = runner.run(&mut core, &hub);
    let delivery = hub.stats();
    // Joins the workers after their queues drain.
    drop(hub);
    tracing::info!(
        iterations = stats.iterations,
        samples = stats.samples,
        commands = stats.commands,
        rejected = stats.rejected,
        transitions = stats.transitions,
        emissions = stats.emissions,
        delivered = delivery.delivered,
        failed = delivery.failed,
        dropped = delivery.dropped,
        "run finished"
    );
    Ok(())
}

fn self_check(cfg: &Config, json: bool) -> eyre::Result<()> {
    let (mut core, _button) = hw::make_core(cfg)?;
    let outcome = core.tick(Instant::now());
    let snap = core.snapshot();
    if json {
        println!("{}", serde_json::to_string(&snap)?);
    } else {
        println!("{}", snap.summary());
    }
    if !outcome.sampled || snap.sensor_fault {
        return Err(eyre::Report::new(CoreError::SensorUnavailable(
            "self-check sample incomplete".into(),
        )));
    }
    Ok(())
}
