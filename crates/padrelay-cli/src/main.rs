//! padrelayd - gamepad translation daemon
//!
//! Loads a configuration file, validates it, and runs the emulation engine
//! against the synthetic device and tracing bus until Ctrl-C (or for a fixed
//! duration), then prints the engine counters.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use clap::Parser;
use padrelay_cli::config::DaemonConfig;
use padrelay_cli::sim::{SyntheticDevice, TracingBus};
use padrelay_cli::logging;
use padrelay_cli::transport::ScriptedTransport;
use padrelay_engine::{CounterSnapshot, EmulationEngine, FeedbackNotification};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "padrelayd")]
#[command(about = "Translate physical controllers into virtual Format A / Format B gamepads")]
#[command(version)]
struct Cli {
    /// Configuration file (.yaml, .yml or .json)
    #[arg(short, long, env = "PADRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

fn load_config(cli: &Cli) -> Result<DaemonConfig> {
    let config = match &cli.config {
        Some(path) => DaemonConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => DaemonConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn print_summary(counters: &CounterSnapshot) {
    println!("ticks:                {}", counters.ticks);
    println!("missed ticks:         {}", counters.missed_ticks);
    println!("device read failures: {}", counters.device_read_failures);
    println!("format A reports:     {}", counters.reports_a);
    println!("format B reports:     {}", counters.reports_b);
    println!("peer targets created: {}", counters.peer_targets_created);
    println!("peer targets removed: {}", counters.peer_targets_destroyed);
    println!("bus errors:           {}", counters.bus_errors);
}

async fn rumble(bus: TracingBus, every: Duration) {
    let mut interval = tokio::time::interval(every);
    let mut strong = false;
    loop {
        interval.tick().await;
        strong = !strong;
        let level = if strong { 200 } else { 0 };
        bus.broadcast_feedback(FeedbackNotification {
            large_motor: level,
            small_motor: level / 2,
            led_number: None,
            lightbar: None,
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = load_config(&cli)?;
    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        slots = config.slot_count,
        emulated = config.emulated_slots(),
        peers = config.simulation.peers.len(),
        "starting padrelayd"
    );

    let shared = config.build_shared().context("failed to build slot table")?;
    let mut engine = EmulationEngine::new(config.engine.clone(), shared.clone())
        .context("failed to create engine")?;

    let bus = TracingBus::new(config.simulation.bus);
    let device = SyntheticDevice::new(config.simulation.device);
    engine
        .start(device, bus.clone())
        .context("engine refused to start")?;

    let transport = tokio::spawn(
        ScriptedTransport::new(shared.peers.clone(), &config.simulation.peers).run(),
    );
    let rumble_task = config
        .simulation
        .bus
        .rumble_interval_ms
        .filter(|ms| *ms > 0)
        .map(|ms| tokio::spawn(rumble(bus.clone(), Duration::from_millis(ms))));

    match cli.duration_secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            info!("received Ctrl-C");
        }
    }

    transport.abort();
    if let Some(task) = rumble_task {
        task.abort();
    }

    let engine = tokio::task::spawn_blocking(move || {
        if let Err(e) = engine.stop() {
            warn!(error = %e, "engine stopped with error");
        }
        engine
    })
    .await
    .context("engine stop task failed")?;

    if bus.live_targets() != 0 {
        warn!(live = bus.live_targets(), "targets left on the bus after stop");
    }
    print_summary(&engine.counters());
    Ok(())
}
