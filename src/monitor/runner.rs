use crate::discovery::Discoverer;
use crate::monitor::report::{Report, ReportSink, StatusReport};
use crate::probe::{ProbeResult, Prober};
use crate::sampler::{History, Thresholds};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Immutable settings of a monitor run
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub target_host: String,
    /// Sleep between cycles; not adjusted for time spent probing
    pub interval: Duration,
    pub probe_timeout: Duration,
    /// Discovery runs on every successful cycle when set
    pub subnet: Option<String>,
    pub discovery_timeout: Duration,
    pub thresholds: Thresholds,
}

/// Sequential probe, record, classify, discover, report loop
pub struct Monitor<P, D, S> {
    config: MonitorConfig,
    prober: P,
    discoverer: D,
    sink: S,
    history: History,
}

impl<P: Prober, D: Discoverer, S: ReportSink> Monitor<P, D, S> {
    pub fn new(config: MonitorConfig, prober: P, discoverer: D, sink: S) -> Self {
        Self {
            config,
            prober,
            discoverer,
            sink,
            history: History::new(),
        }
    }

    /// Run one cycle and hand its report to the sink
    pub fn tick(&mut self) -> Report {
        let report = match self
            .prober
            .probe(&self.config.target_host, self.config.probe_timeout)
        {
            ProbeResult::Success(delay) => {
                self.history.push(delay);
                let average = self.history.average().unwrap_or(delay);
                let severity = self.config.thresholds.classify(delay);

                let devices = match self.config.subnet.as_deref() {
                    Some(subnet) => {
                        self.sink.discovery_started(subnet);
                        let devices = self
                            .discoverer
                            .discover(subnet, self.config.discovery_timeout);
                        self.sink.discovery_finished();
                        Some(devices)
                    }
                    None => None,
                };

                debug!(
                    delay_ms = delay.as_millis(),
                    average_ms = average.as_millis(),
                    severity = severity.label(),
                    window = self.history.len(),
                    "Probe succeeded"
                );

                Report::Status(StatusReport {
                    delay,
                    average,
                    severity,
                    devices,
                })
            }
            ProbeResult::Failure => {
                debug!(host = %self.config.target_host, "Probe failed");
                Report::Failure
            }
        };

        self.sink.emit(&report);
        report
    }

    /// Run `ticks` cycles, sleeping the interval between them
    pub fn run_ticks(&mut self, ticks: usize) -> Vec<Report> {
        let mut reports = Vec::with_capacity(ticks);
        for i in 0..ticks {
            if i > 0 {
                thread::sleep(self.config.interval);
            }
            reports.push(self.tick());
        }
        reports
    }

    /// Run until the process is interrupted
    pub fn run(&mut self) -> ! {
        info!(
            host = %self.config.target_host,
            interval_ms = self.config.interval.as_millis() as u64,
            subnet = ?self.config.subnet,
            "Monitor started"
        );
        loop {
            self.tick();
            thread::sleep(self.config.interval);
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveredDevice;
    use crate::monitor::report::CollectingSink;
    use crate::sampler::{LatencySample, Severity};
    use mockall::{mock, Sequence};
    use pnet::util::MacAddr;
    use std::net::Ipv4Addr;

    mock! {
        pub Prober {}

        impl Prober for Prober {
            fn probe(&mut self, host: &str, timeout: Duration) -> ProbeResult;
        }
    }

    mock! {
        pub Discoverer {}

        impl Discoverer for Discoverer {
            fn discover(&mut self, subnet: &str, timeout: Duration) -> Vec<DiscoveredDevice>;
        }
    }

    fn config(subnet: Option<&str>) -> MonitorConfig {
        MonitorConfig {
            target_host: "1.1.1.1".to_string(),
            interval: Duration::ZERO,
            probe_timeout: Duration::from_millis(500),
            subnet: subnet.map(str::to_string),
            discovery_timeout: Duration::from_millis(200),
            thresholds: Thresholds::default(),
        }
    }

    fn success(seconds: f64) -> ProbeResult {
        ProbeResult::Success(LatencySample::from_secs(seconds))
    }

    #[test]
    fn test_failure_leaves_history_untouched() {
        let mut prober = MockProber::new();
        prober
            .expect_probe()
            .times(1)
            .returning(|_, _| ProbeResult::Failure);
        let mut discoverer = MockDiscoverer::new();
        discoverer.expect_discover().never();

        let mut monitor = Monitor::new(
            config(Some("192.168.1.0/24")),
            prober,
            discoverer,
            CollectingSink::default(),
        );

        assert_eq!(monitor.tick(), Report::Failure);
        assert!(monitor.history().is_empty());
        assert_eq!(monitor.sink().reports, vec![Report::Failure]);
    }

    #[test]
    fn test_probe_receives_configured_target_and_timeout() {
        let mut prober = MockProber::new();
        prober
            .expect_probe()
            .withf(|host, timeout| host == "1.1.1.1" && *timeout == Duration::from_millis(500))
            .times(1)
            .returning(|_, _| success(0.02));

        let mut monitor = Monitor::new(
            config(None),
            prober,
            MockDiscoverer::new(),
            CollectingSink::default(),
        );

        match monitor.tick() {
            Report::Status(status) => {
                assert_eq!(status.severity, Severity::Low);
                assert_eq!(status.device_count(), None);
            }
            Report::Failure => panic!("expected a status report"),
        }
    }

    #[test]
    fn test_discovery_runs_after_success_only() {
        let mut seq = Sequence::new();
        let mut prober = MockProber::new();
        prober
            .expect_probe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| success(0.09));
        prober
            .expect_probe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| ProbeResult::Failure);

        let mut discoverer = MockDiscoverer::new();
        discoverer
            .expect_discover()
            .withf(|subnet, timeout| {
                subnet == "192.168.1.0/24" && *timeout == Duration::from_millis(200)
            })
            .times(1)
            .returning(|_, _| {
                vec![DiscoveredDevice {
                    ip_address: Ipv4Addr::new(192, 168, 1, 1),
                    mac_address: MacAddr::new(0xaa, 0, 0, 0, 0, 1),
                }]
            });

        let mut monitor = Monitor::new(
            config(Some("192.168.1.0/24")),
            prober,
            discoverer,
            CollectingSink::default(),
        );
        let reports = monitor.run_ticks(2);

        match &reports[0] {
            Report::Status(status) => {
                assert_eq!(status.severity, Severity::High);
                assert_eq!(status.device_count(), Some(1));
            }
            Report::Failure => panic!("expected a status report"),
        }
        assert_eq!(reports[1], Report::Failure);
    }

    #[test]
    fn test_empty_discovery_still_reports() {
        let mut prober = MockProber::new();
        prober.expect_probe().returning(|_, _| success(0.06));
        let mut discoverer = MockDiscoverer::new();
        discoverer.expect_discover().returning(|_, _| Vec::new());

        let mut monitor = Monitor::new(
            config(Some("192.168.1.0/24")),
            prober,
            discoverer,
            CollectingSink::default(),
        );

        match monitor.tick() {
            Report::Status(status) => {
                assert_eq!(status.severity, Severity::Medium);
                assert_eq!(status.device_count(), Some(0));
            }
            Report::Failure => panic!("expected a status report"),
        }
    }
}
