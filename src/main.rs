// src/main.rs
//! Cycle Map - OpenCycleMap with a live "you are here" marker

use clap::Parser;
use cycle_map::{
    config::{parse_host_port, parse_lat_lon, MapConfig},
    display::{self, terminal::TerminalSurface},
    location::nmea::list_serial_ports,
    MapScreen, Result, StyleDocument,
};
use std::path::PathBuf;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "cycle-map")]
#[command(author, version, about = "Cycling map with a live position marker", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/cycle-map/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read GPS fixes from gpsd at HOST[:PORT]
    #[arg(long, value_name = "HOST[:PORT]")]
    gpsd: Option<String>,

    /// Read GPS fixes from an NMEA receiver on this serial port
    #[arg(long, value_name = "PORT", conflicts_with = "gpsd")]
    serial: Option<String>,

    /// Serial baud rate
    #[arg(long, default_value_t = 4800)]
    baud: u32,

    /// Use a fixed coordinate as the network location
    #[arg(long, value_name = "LAT,LON")]
    fixed: Option<String>,

    /// Thunderforest API key
    #[arg(long)]
    api_key: Option<String>,

    /// Use the terminal host even when a display is available
    #[arg(long)]
    headless: bool,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_ports {
        for port in list_serial_ports()? {
            println!("{}", port);
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    info!("🚲 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if config.api_key().is_empty() {
        warn!("no Thunderforest API key configured, tile requests will be rejected");
    }

    // Providers run on this runtime; the window and tile downloads stay off it
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let bridge = config.location_bridge(runtime.handle());
    let style = StyleDocument::open_cycle_map(config.api_key());

    #[cfg(feature = "gui")]
    if !cli.headless && display::should_use_gui() {
        info!("Using desktop window");
        let screen = MapScreen::new(display::gui::EguiSurface::new(), style, bridge)?;
        return display::gui::run(screen);
    }

    let screen = MapScreen::new(TerminalSurface::new(), style, bridge)?;
    runtime.block_on(display::terminal::run(screen))
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file with command line overrides applied
fn load_config(cli: &Cli) -> Result<MapConfig> {
    let mut config = match &cli.config {
        Some(path) => MapConfig::load_from(path)?,
        None => MapConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "could not load config, using defaults");
            MapConfig::default()
        }),
    };

    if let Some(gpsd) = &cli.gpsd {
        let (host, port) = parse_host_port(gpsd)?;
        config.update_gpsd(host, port);
    }
    if let Some(port) = &cli.serial {
        config.update_serial(port.clone(), cli.baud);
    }
    if let Some(fixed) = &cli.fixed {
        let (latitude, longitude) = parse_lat_lon(fixed)?;
        config.update_fixed_network(latitude, longitude);
    }
    if let Some(key) = &cli.api_key {
        config.api_key = Some(key.clone());
    }

    Ok(config)
}
