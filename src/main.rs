use std::collections::HashMap;
use std::path::PathBuf;

use ble_led_scheduler::*;
use clap::Parser;
use color_eyre::eyre::{bail, eyre, Result};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (JSON) to load devices from and save them back to on exit
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Device identity to manage, as advertised over BLE (repeatable)
    #[arg(short, long = "device")]
    devices: Vec<String>,

    /// Active window for devices given with --device, as START,END in seconds
    #[arg(short, long, value_parser = parse_window)]
    window: Option<(f32, f32)>,

    /// Number of window cycles to run
    #[arg(short, long, default_value_t = 1)]
    repeat: u32,

    /// Switch devices off inside the window instead of on
    #[arg(long)]
    inverted: bool,

    /// Discovery scan duration in seconds
    #[arg(long)]
    scan_secs: Option<u64>,

    /// Host loop interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Re-send power commands that were dropped while a device was busy
    #[arg(long)]
    resync_dropped: bool,
}

/// Parse "START,END" into a window
fn parse_window(value: &str) -> std::result::Result<(f32, f32), String> {
    let (start, end) = value
        .split_once(',')
        .ok_or_else(|| format!("expected START,END, got {value}"))?;
    let start = start.trim().parse().map_err(|e| format!("invalid start: {e}"))?;
    let end = end.trim().parse().map_err(|e| format!("invalid end: {e}"))?;
    Ok((start, end))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| EnvFilter::new("ble_led_scheduler=info,ledsched=info")),
        )
        .compact()
        .init();

    // Initialize color-eyre for pretty error reporting
    color_eyre::install()?;

    let cli = Cli::parse();
    debug!("Parsed command line arguments: {:?}", cli);

    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(secs) = cli.scan_secs {
        settings.link.scan_window_ms = secs * 1_000;
    }
    if let Some(ms) = cli.tick_ms {
        settings.engine.tick_interval_ms = ms;
    }
    settings.engine.resync_dropped_toggles |= cli.resync_dropped;

    let transport = BtleplugTransport::new().await?;
    let mut registry = DeviceRegistry::new(transport, settings.link.clone());
    registry.restore(&settings.registry)?;

    for identity in &cli.devices {
        if !registry.contains(identity) {
            registry.register(identity)?;
        }
        let entry = registry.get_mut(identity)?;
        if let Some((start, end)) = cli.window {
            entry.schedule = Schedule::new(start, end, cli.repeat, cli.inverted);
        }
    }

    if registry.is_empty() {
        bail!("No devices configured, pass --device or a settings file");
    }

    let result = run(&mut registry, settings.engine.clone()).await;

    if let Some(path) = &cli.settings {
        settings.registry = registry.snapshot();
        settings
            .save(path)
            .map_err(|e| eyre!("Failed to save settings to {}: {}", path.display(), e))?;
    }
    registry.shutdown().await;

    result
}

/// Host loop: reconcile connections, then advance schedules, until Ctrl-C
#[instrument(skip_all)]
async fn run(registry: &mut DeviceRegistry<BtleplugTransport>, config: EngineConfig) -> Result<()> {
    for identity in registry.identities() {
        registry.request_connect(&identity)?;
    }

    let mut interval = tokio::time::interval(config.tick_interval());
    let mut engine = ScheduleEngine::new(config);
    engine.resume();
    info!("Schedule started for {} devices", registry.len());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last_status: HashMap<String, String> = HashMap::new();
    loop {
        tokio::select! {
            _ = interval.tick() => {
                registry.poll_connections();
                engine.tick(registry);
                report_changes(registry, &mut last_status);
            }
            signal = &mut shutdown => {
                if let Err(e) = signal {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Stopping after {:.1}s", engine.elapsed_seconds());
                return Ok(());
            }
        }
    }
}

/// Log each device's status and power state when they change
fn report_changes(
    registry: &DeviceRegistry<BtleplugTransport>,
    last_status: &mut HashMap<String, String>,
) {
    for device in registry.iter() {
        let line = format!(
            "{} [{}]",
            device.link().status_str(),
            if device.profile.is_on { "on" } else { "off" }
        );
        if last_status.get(device.identity()) != Some(&line) {
            info!(device = device.profile.alias(), "{}", line);
            last_status.insert(device.identity().to_string(), line);
        }
    }
}
