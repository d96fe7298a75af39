//! beaconscand - prints iBeacon sightings from a local Bluetooth adapter
//!
//! Resets the adapter, enables LE scanning and writes one line per iBeacon
//! advertisement to stdout until interrupted with Ctrl-C:
//!
//! ```text
//! <hostname>, <YYYY-MM-DD HH:MM:SS>, <UUID>, <RSSI>, <calibrated power>
//! ```
//!
//! Logs go to stderr. Configuration comes from `BEACONSCAN_*` environment
//! variables; raw HCI access needs root or CAP_NET_ADMIN/CAP_NET_RAW.

use anyhow::Context;
use beaconscan::{adapter, output, signal, BeaconWriter, HciSocket, ScanSession, ScannerConfig};
use std::io;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    if let Err(e) = run() {
        log::error!("{:#}", e);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = ScannerConfig::from_env().context("Invalid configuration")?;

    signal::install_interrupt_handler().context("Could not install SIGINT handler")?;

    if config.reset_adapter {
        adapter::reset(config.device_id)
            .context("Make sure the Bluetooth adapter is properly inserted")?;
    }

    let mut socket = HciSocket::open(config.device_id)
        .with_context(|| format!("Could not open hci{}", config.device_id))?;

    adapter::set_scan_parameters(&socket, &config.scan, config.command_timeout)
        .context("Set scan parameters failed")?;
    adapter::set_scan_enable(&socket, true, config.filter_duplicates, config.command_timeout)
        .context("Enable scan failed")?;

    let hostname = match config.hostname.clone() {
        Some(name) => name,
        None => output::hostname().unwrap_or_else(|e| {
            log::warn!("Could not read hostname: {}", e);
            String::from("unknown")
        }),
    };

    let stdout = io::stdout();
    let writer = BeaconWriter::new(stdout.lock(), hostname);
    let result = ScanSession::new(&mut socket, writer, &signal::SHUTDOWN).run();

    let disabled = adapter::set_scan_enable(
        &socket,
        false,
        config.filter_duplicates,
        config.command_timeout,
    );

    result.context("Scan aborted")?;
    disabled.context("Disable scan failed")?;
    Ok(())
}
