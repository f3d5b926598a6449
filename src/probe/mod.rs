//! ICMP echo probe
//!
//! [`probe`] sends a single echo request and waits at most `timeout` for the
//! matching reply. Every failure cause (resolution, permissions, timeout,
//! transport errors) collapses to [`ProbeResult::Failure`]; the reason is
//! logged, never returned.

pub mod socket;

pub use socket::{EchoSocket, IcmpSocket};

use crate::error::{NetpulseError, Result};
use crate::protocol::{EchoKind, EchoPacket, SequenceNumber};
use crate::sampler::LatencySample;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

static NEXT_SEQUENCE: AtomicU16 = AtomicU16::new(0);

/// Outcome of a single probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeResult {
    Success(LatencySample),
    Failure,
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeResult::Success(_))
    }
}

/// Anything that can measure a round trip to a host
pub trait Prober {
    fn probe(&mut self, host: &str, timeout: Duration) -> ProbeResult;
}

/// [`Prober`] backed by a fresh ICMP socket per probe
#[derive(Debug, Default)]
pub struct IcmpProber;

impl Prober for IcmpProber {
    fn probe(&mut self, host: &str, timeout: Duration) -> ProbeResult {
        probe(host, timeout)
    }
}

/// Send one echo request to `host` and wait up to `timeout` for the reply
pub fn probe(host: &str, timeout: Duration) -> ProbeResult {
    let dest = match resolve_ipv4(host) {
        Ok(dest) => dest,
        Err(e) => {
            warn!(host = host, error = %e, "Failed to resolve probe target");
            return ProbeResult::Failure;
        }
    };

    let mut socket = match IcmpSocket::open() {
        Ok(socket) => socket,
        Err(e) => {
            warn!(error = %e, "Probe unavailable");
            return ProbeResult::Failure;
        }
    };

    let identifier = (std::process::id() & 0xffff) as u16;
    let sequence = SequenceNumber(NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed));
    probe_once(&mut socket, dest, identifier, sequence, timeout)
}

/// Run one echo exchange on an already open socket
pub fn probe_once<S: EchoSocket>(
    socket: &mut S,
    dest: Ipv4Addr,
    identifier: u16,
    sequence: SequenceNumber,
    timeout: Duration,
) -> ProbeResult {
    match measure_echo(socket, dest, identifier, sequence, timeout) {
        Ok(Some(elapsed)) => ProbeResult::Success(LatencySample::from(elapsed)),
        Ok(None) => {
            debug!(dest = %dest, sequence = sequence.0, "Probe timed out");
            ProbeResult::Failure
        }
        Err(e) => {
            warn!(dest = %dest, error = %e, "Probe failed");
            ProbeResult::Failure
        }
    }
}

/// Measure a single echo round trip; `Ok(None)` means the deadline passed
fn measure_echo<S: EchoSocket>(
    socket: &mut S,
    dest: Ipv4Addr,
    identifier: u16,
    sequence: SequenceNumber,
    timeout: Duration,
) -> Result<Option<Duration>> {
    let request = EchoPacket::request(identifier, sequence);
    let ignore_identifier = socket.rewrites_identifier();

    let t1 = Instant::now();
    let deadline = t1 + timeout;

    debug!(dest = %dest, sequence = sequence.0, "Sending echo request");
    socket.send_echo(&request, dest)?;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        socket.set_timeout(remaining)?;

        match socket.recv_echo() {
            Ok(reply)
                if reply.kind == EchoKind::Reply
                    && reply.sequence == sequence
                    && (ignore_identifier || reply.identifier == identifier) =>
            {
                let elapsed = t1.elapsed();
                debug!(
                    latency_us = elapsed.as_micros() as u64,
                    sequence = sequence.0,
                    "Echo reply received"
                );
                return Ok(Some(elapsed));
            }
            Ok(other) => {
                debug!(
                    expected = sequence.0,
                    received = other.sequence.0,
                    identifier = other.identifier,
                    "Ignoring unrelated echo message"
                );
            }
            Err(NetpulseError::Protocol(e)) => {
                debug!(error = %e, "Ignoring undecodable ICMP message");
            }
            Err(e) if e.is_timeout() => return Ok(None),
            Err(e) => return Err(e),
        }
    }
}

fn resolve_ipv4(host: &str) -> Result<Ipv4Addr> {
    let addrs = (host, 0).to_socket_addrs()?;
    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| NetpulseError::Config(format!("{} has no IPv4 address", host)))
}
