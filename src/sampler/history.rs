use crate::constants::HISTORY_CAPACITY;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// A single round-trip time in seconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LatencySample(f64);

impl LatencySample {
    /// Negative and non-finite inputs are clamped to zero.
    pub fn from_secs(seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            Self(seconds)
        } else {
            Self(0.0)
        }
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// Whole milliseconds, truncated toward zero (0.0499s is 49ms)
    pub fn as_millis(self) -> u64 {
        (self.0 * 1000.0) as u64
    }
}

impl From<Duration> for LatencySample {
    fn from(elapsed: Duration) -> Self {
        Self::from_secs(elapsed.as_secs_f64())
    }
}

/// Bounded FIFO window of the most recent latency samples
#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<LatencySample>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// A zero capacity is raised to one so a pushed sample is always averageable.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest once the window is full
    pub fn push(&mut self, sample: LatencySample) {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                debug!(evicted_secs = evicted.as_secs(), "Evicted oldest sample");
            }
        }
    }

    /// Unweighted mean of every retained sample, `None` while empty
    pub fn average(&self) -> Option<LatencySample> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.as_secs()).sum();
        Some(LatencySample::from_secs(sum / self.samples.len() as f64))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = LatencySample> + '_ {
        self.samples.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(values: &[f64]) -> Vec<LatencySample> {
        values.iter().map(|&v| LatencySample::from_secs(v)).collect()
    }

    #[test]
    fn test_eleventh_push_evicts_first() {
        let mut history = History::new();
        for i in 1..=11 {
            history.push(LatencySample::from_secs(i as f64 / 1000.0));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        let kept: Vec<_> = history.iter().collect();
        let expected: Vec<_> = (2..=11)
            .map(|i| LatencySample::from_secs(i as f64 / 1000.0))
            .collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn test_average_of_three() {
        let mut history = History::new();
        for sample in secs(&[0.04, 0.06, 0.08]) {
            history.push(sample);
        }

        let average = history.average().unwrap();
        assert_eq!(average.as_secs(), 0.06);
        assert_eq!(average.as_millis(), 60);
    }

    #[test]
    fn test_average_empty_is_none() {
        assert!(History::new().average().is_none());
    }

    #[test]
    fn test_millis_truncates() {
        assert_eq!(LatencySample::from_secs(0.0499).as_millis(), 49);
        assert_eq!(LatencySample::from_secs(0.0525).as_millis(), 52);
        assert_eq!(LatencySample::from_secs(0.0).as_millis(), 0);
    }

    #[test]
    fn test_invalid_samples_clamp_to_zero() {
        assert_eq!(LatencySample::from_secs(-1.0).as_secs(), 0.0);
        assert_eq!(LatencySample::from_secs(f64::NAN).as_secs(), 0.0);
    }

    #[test]
    fn test_from_duration() {
        let sample = LatencySample::from(Duration::from_micros(12_345));
        assert_eq!(sample.as_millis(), 12);
    }

    #[test]
    fn test_zero_capacity_raised_to_one() {
        let mut history = History::with_capacity(0);
        history.push(LatencySample::from_secs(0.01));
        history.push(LatencySample::from_secs(0.02));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.average(), Some(LatencySample::from_secs(0.02)));
    }
}
