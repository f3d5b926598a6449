use crate::constants::{DEFAULT_HIGH_THRESHOLD_MS, DEFAULT_LOW_THRESHOLD_MS};
use crate::error::{NetpulseError, Result};
use crate::sampler::history::LatencySample;

/// Latency band of a single sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Band boundaries in whole milliseconds.
///
/// `ms < low` is Low, `low <= ms <= high` is Medium, `ms > high` is High.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    low_ms: u64,
    high_ms: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_ms: DEFAULT_LOW_THRESHOLD_MS,
            high_ms: DEFAULT_HIGH_THRESHOLD_MS,
        }
    }
}

impl Thresholds {
    pub fn new(low_ms: u64, high_ms: u64) -> Result<Self> {
        if low_ms >= high_ms {
            return Err(NetpulseError::Config(format!(
                "low threshold ({}ms) must be below high threshold ({}ms)",
                low_ms, high_ms
            )));
        }
        Ok(Self { low_ms, high_ms })
    }

    pub fn low_ms(&self) -> u64 {
        self.low_ms
    }

    pub fn high_ms(&self) -> u64 {
        self.high_ms
    }

    /// Classify on the truncated millisecond value of `sample`
    pub fn classify(&self, sample: LatencySample) -> Severity {
        let ms = sample.as_millis();
        if ms < self.low_ms {
            Severity::Low
        } else if ms <= self.high_ms {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}
