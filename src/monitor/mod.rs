//! Monitor loop, its configuration and the console collaborator

pub mod config;
pub mod report;
pub mod reporter;
pub mod runner;
pub mod settings;

pub use config::Config;
pub use report::{CollectingSink, Report, ReportSink, StatusReport};
pub use reporter::ConsoleReporter;
pub use runner::{Monitor, MonitorConfig};
pub use settings::{prompt_timeout, validate_timeout, Settings};
