use crate::constants::SPINNER_TICK_INTERVAL_MS;
use crate::monitor::report::{Report, ReportSink, StatusReport};
use crate::sampler::Severity;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::debug;

/// Console reporter printing host-labelled, colour-banded status lines
pub struct ConsoleReporter {
    label: String,
    show_devices: bool,
    spinner: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(label: impl Into<String>, show_devices: bool) -> Self {
        Self {
            label: label.into(),
            show_devices,
            spinner: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// `(label)` in light red
    pub fn prefix(&self) -> String {
        format!("({})", self.label).bright_red().to_string()
    }

    /// A plain message line such as "Loaded settings."
    pub fn notice(&self, message: &str) -> String {
        format!("{} >> {}", self.prefix(), message)
    }

    pub fn banner(&self, host: &str, timeout_seconds: f64) -> String {
        self.notice(&format!(
            "Pinging {}... (Timeout: {}s)",
            host, timeout_seconds
        ))
    }

    /// Set the terminal window title with an OSC 0 sequence
    pub fn set_window_title(&self, title: &str) {
        let mut stdout = io::stdout();
        if stdout.is_terminal() {
            let _ = write!(stdout, "\x1b]0;{}\x07", title);
            let _ = stdout.flush();
        }
    }

    fn colorize_ping(ms: u64, severity: Severity) -> ColoredString {
        let text = format!("{}ms", ms);
        match severity {
            Severity::Low => text.green(),
            Severity::Medium => text.yellow(),
            Severity::High => text.red(),
        }
    }

    fn format_status(&self, status: &StatusReport) -> String {
        let mut line = format!(
            "{} >> Ping ({}) | Average ({}ms)",
            self.prefix(),
            Self::colorize_ping(status.delay.as_millis(), status.severity),
            status.average.as_millis()
        );
        if let Some(count) = status.device_count() {
            line.push_str(&format!(" | Devices ({})", count));
        }
        line
    }

    /// Render a report as a single line
    pub fn format_report(&self, report: &Report) -> String {
        match report {
            Report::Status(status) => self.format_status(status),
            Report::Failure => self.notice("Failed to get response."),
        }
    }

    /// One indented line per discovered device
    pub fn format_devices(&self, status: &StatusReport) -> Vec<String> {
        status
            .devices
            .iter()
            .flatten()
            .map(|device| self.notice(&format!("  {}", device)))
            .collect()
    }
}

impl ReportSink for ConsoleReporter {
    fn emit(&mut self, report: &Report) {
        println!("{}", self.format_report(report));
        if let Report::Status(status) = report {
            if self.show_devices {
                for line in self.format_devices(status) {
                    println!("{}", line);
                }
            }
        }
    }

    fn discovery_started(&mut self, subnet: &str) {
        if !io::stderr().is_terminal() {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Scanning {}", subnet));
        spinner.enable_steady_tick(Duration::from_millis(SPINNER_TICK_INTERVAL_MS));
        debug!(subnet = subnet, "Discovery spinner started");
        self.spinner = Some(spinner);
    }

    fn discovery_finished(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}
