use crate::discovery::DiscoveredDevice;
use crate::sampler::{LatencySample, Severity};

/// Outcome of one monitor cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Status(StatusReport),
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub delay: LatencySample,
    pub average: LatencySample,
    pub severity: Severity,
    /// `None` when discovery is disabled
    pub devices: Option<Vec<DiscoveredDevice>>,
}

impl StatusReport {
    pub fn device_count(&self) -> Option<usize> {
        self.devices.as_ref().map(Vec::len)
    }
}

/// Receiver of monitor reports.
///
/// Formatting, colour and terminal handling live entirely behind this trait.
pub trait ReportSink {
    fn emit(&mut self, report: &Report);

    /// Called before a discovery scan blocks the loop
    fn discovery_started(&mut self, _subnet: &str) {}

    fn discovery_finished(&mut self) {}
}

/// Sink that keeps every report, for tests and embedding
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub reports: Vec<Report>,
}

impl ReportSink for CollectingSink {
    fn emit(&mut self, report: &Report) {
        self.reports.push(report.clone());
    }
}
