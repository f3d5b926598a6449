use anyhow::{Context, Result};
use clap::Parser;
use netpulse::discovery::ArpDiscoverer;
use netpulse::logging::init_logging_with_config;
use netpulse::monitor::{prompt_timeout, validate_timeout, Config, ConsoleReporter, Monitor, Settings};
use netpulse::probe::IcmpProber;
use std::io;
use tracing::{error, info, warn};

fn main() {
    let config = Config::parse();

    init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!(error = %e, "Monitor failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<()> {
    if config.no_color {
        colored::control::set_override(false);
    }

    let label = gethostname::gethostname().to_string_lossy().into_owned();
    let reporter = ConsoleReporter::new(label, config.show_devices);

    let interval = resolve_interval(&config, &reporter)?;
    let monitor_config = config.monitor_config(interval)?;

    reporter.set_window_title(&format!("{}!", reporter.label()));
    println!("{}", reporter.banner(&config.host, interval));
    info!(
        host = %config.host,
        interval_secs = interval,
        subnet = ?config.subnet,
        "Starting monitor"
    );

    let mut monitor = Monitor::new(monitor_config, IcmpProber, ArpDiscoverer, reporter);
    monitor.run()
}

/// Probe interval from the CLI, the settings file, or the operator
fn resolve_interval(config: &Config, reporter: &ConsoleReporter) -> Result<f64> {
    if let Some(timeout) = config.timeout {
        return Ok(validate_timeout(timeout)?);
    }

    match Settings::load(&config.config) {
        Ok(Some(settings)) => {
            println!("{}", reporter.notice("Loaded settings."));
            return Ok(settings.timeout);
        }
        Ok(None) => {}
        Err(e) => warn!(path = %config.config.display(), error = %e, "Ignoring unreadable settings file"),
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let timeout = prompt_timeout(&mut stdin.lock(), &mut stdout, &reporter.prefix())
        .context("Failed to read timeout from the terminal")?;

    Settings { timeout }
        .save(&config.config)
        .with_context(|| format!("Failed to write {}", config.config.display()))?;
    println!("{}", reporter.notice("Saved settings to config."));

    Ok(timeout)
}
