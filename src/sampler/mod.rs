//! Rolling latency statistics and severity classification

pub mod history;
pub mod severity;

pub use history::{History, LatencySample};
pub use severity::{Severity, Thresholds};
