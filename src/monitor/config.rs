//! Command-line configuration

use crate::constants::*;
use crate::discovery::parse_range;
use crate::error::{NetpulseError, Result};
use crate::monitor::runner::MonitorConfig;
use crate::monitor::settings::validate_timeout;
use crate::sampler::Thresholds;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "netpulse")]
#[command(about = "Lightweight network health monitor")]
pub struct Config {
    /// Settings file holding the probe interval
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Host to probe
    #[arg(long, default_value = DEFAULT_TARGET_HOST)]
    pub host: String,

    /// IPv4 subnet to scan for devices after each successful probe (e.g. 192.168.1.0/24)
    #[arg(long)]
    pub subnet: Option<String>,

    /// Seconds between probes; skips the settings file when given
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Latencies below this many milliseconds are low
    #[arg(long, default_value_t = DEFAULT_LOW_THRESHOLD_MS)]
    pub low_ms: u64,

    /// Latencies above this many milliseconds are high
    #[arg(long, default_value_t = DEFAULT_HIGH_THRESHOLD_MS)]
    pub high_ms: u64,

    /// Time to wait for an echo reply in milliseconds
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_MS)]
    pub probe_timeout_ms: u64,

    /// Time to collect ARP replies in milliseconds
    #[arg(long, default_value_t = DEFAULT_DISCOVERY_TIMEOUT_MS)]
    pub discovery_timeout_ms: u64,

    /// List every discovered device under the status line
    #[arg(long)]
    pub show_devices: bool,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl Config {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn thresholds(&self) -> Result<Thresholds> {
        Thresholds::new(self.low_ms, self.high_ms)
    }

    /// Returns true if JSON format logging is enabled
    pub fn is_json_format(&self) -> bool {
        self.log_format.to_lowercase() == "json"
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        if let Some(timeout) = self.timeout {
            validate_timeout(timeout)?;
        }
        if self.host.trim().is_empty() {
            return Err(NetpulseError::Config("host must not be empty".into()));
        }
        if self.probe_timeout_ms == 0 {
            return Err(NetpulseError::Config("probe timeout must be > 0".into()));
        }
        if self.discovery_timeout_ms == 0 {
            return Err(NetpulseError::Config("discovery timeout must be > 0".into()));
        }
        self.thresholds()?;
        if let Some(subnet) = &self.subnet {
            parse_range(subnet)?;
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(NetpulseError::Config(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        debug!("Configuration validated successfully");
        Ok(())
    }

    /// Combine the CLI options with the probe interval from the settings file
    pub fn monitor_config(&self, interval_seconds: f64) -> Result<MonitorConfig> {
        let interval_seconds = validate_timeout(interval_seconds)?;
        Ok(MonitorConfig {
            target_host: self.host.clone(),
            interval: Duration::from_secs_f64(interval_seconds),
            probe_timeout: self.probe_timeout(),
            subnet: self.subnet.clone(),
            discovery_timeout: self.discovery_timeout(),
            thresholds: self.thresholds()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Config {
        Config::parse_from(["netpulse"])
    }

    #[test]
    fn test_defaults() {
        let config = defaults();

        assert_eq!(config.config, PathBuf::from("ping_config.cfg"));
        assert_eq!(config.host, "1.1.1.1");
        assert_eq!(config.subnet, None);
        assert_eq!(config.timeout, None);
        assert_eq!(config.probe_timeout(), Duration::from_millis(1000));
        assert!(!config.is_json_format());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_flags() {
        let config = Config::parse_from([
            "netpulse",
            "--host",
            "example.com",
            "--subnet",
            "192.168.1.0/24",
            "--timeout",
            "0.5",
            "--low-ms",
            "65",
            "--high-ms",
            "110",
            "--log-format",
            "json",
        ]);

        assert!(config.validate().is_ok());
        assert!(config.is_json_format());

        let monitor = config.monitor_config(0.5).unwrap();
        assert_eq!(monitor.interval, Duration::from_millis(500));
        assert_eq!(monitor.subnet.as_deref(), Some("192.168.1.0/24"));
        assert_eq!(monitor.thresholds.low_ms(), 65);
        assert_eq!(monitor.thresholds.high_ms(), 110);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = defaults();
        config.timeout = Some(0.0);
        assert!(config.validate().is_err());

        let mut config = defaults();
        config.low_ms = 90;
        assert!(config.validate().is_err());

        let mut config = defaults();
        config.subnet = Some("192.168.1.0/99".into());
        assert!(config.validate().is_err());

        let mut config = defaults();
        config.probe_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = defaults();
        config.log_level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_monitor_config_rejects_bad_interval() {
        assert!(defaults().monitor_config(-1.0).is_err());
        assert!(defaults().monitor_config(f64::INFINITY).is_err());
    }
}
