//! Netpulse - lightweight network health monitor
//!
//! This library measures ICMP round-trip latency to a single remote host,
//! keeps a short rolling window of recent samples, classifies each sample
//! into a latency band, and can enumerate devices on the local subnet with
//! ARP probing.

pub mod constants;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod probe;
pub mod protocol;
pub mod sampler;

pub use error::{NetpulseError, Result};
