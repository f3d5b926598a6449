//! Local subnet device discovery over ARP
//!
//! [`discover`] broadcasts one ARP request per host of a CIDR range in a
//! single batch and collects the replies that arrive before the timeout.
//! Any failure (bad range, no usable interface, channel or send errors)
//! is logged and reported as zero devices.

pub mod channel;
pub mod subnet;

pub use channel::{DatalinkChannel, LinkChannel};
pub use subnet::{parse_range, subnet_hosts};

use crate::error::{NetpulseError, Result};
use crate::protocol::{build_request, parse_reply, ArpEndpoint, ArpReply, ProtocolResult};
use ipnetwork::Ipv4Network;
use pnet::datalink;
use pnet::util::MacAddr;
use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A host that answered an ARP request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscoveredDevice {
    pub ip_address: Ipv4Addr,
    pub mac_address: MacAddr,
}

impl From<ArpReply> for DiscoveredDevice {
    fn from(reply: ArpReply) -> Self {
        Self {
            ip_address: reply.ip,
            mac_address: reply.mac,
        }
    }
}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ip_address, self.mac_address)
    }
}

/// Anything that can enumerate devices on a subnet
pub trait Discoverer {
    fn discover(&mut self, subnet: &str, timeout: Duration) -> Vec<DiscoveredDevice>;
}

/// [`Discoverer`] that scans with raw ARP on the matching interface
#[derive(Debug, Default)]
pub struct ArpDiscoverer;

impl Discoverer for ArpDiscoverer {
    fn discover(&mut self, subnet: &str, timeout: Duration) -> Vec<DiscoveredDevice> {
        discover(subnet, timeout)
    }
}

/// Scan `subnet_cidr` and return the devices that replied within `timeout`.
///
/// Order is arrival order and carries no meaning.
pub fn discover(subnet_cidr: &str, timeout: Duration) -> Vec<DiscoveredDevice> {
    match try_discover(subnet_cidr, timeout) {
        Ok(devices) => {
            info!(
                subnet = subnet_cidr,
                device_count = devices.len(),
                "Discovery finished"
            );
            devices
        }
        Err(e) => {
            warn!(subnet = subnet_cidr, error = %e, "Discovery failed, reporting zero devices");
            Vec::new()
        }
    }
}

fn try_discover(subnet_cidr: &str, timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
    let range = parse_range(subnet_cidr)?;
    let hosts = subnet::hosts_of(&range);

    let (interface, local) = datalink::interfaces()
        .into_iter()
        .filter(|iface| iface.is_up() && !iface.is_loopback())
        .find_map(|iface| subnet::endpoint_for(iface.mac, &iface.ips, &range).map(|ep| (iface, ep)))
        .ok_or_else(|| {
            NetpulseError::Discovery(format!("no up Ethernet interface is attached to {}", range))
        })?;

    debug!(
        interface = %interface.name,
        local_ip = %local.ip,
        hosts = hosts.len(),
        "Starting ARP scan"
    );

    let mut channel = DatalinkChannel::open(&interface)?;
    collect_replies(&mut channel, &local, &range, &hosts, timeout)
}

/// Send one ARP request per host as a single batch, then gather replies
/// from inside `range` until `timeout` elapses
pub fn collect_replies<C: LinkChannel>(
    channel: &mut C,
    local: &ArpEndpoint,
    range: &Ipv4Network,
    hosts: &[Ipv4Addr],
    timeout: Duration,
) -> Result<Vec<DiscoveredDevice>> {
    let frames = hosts
        .iter()
        .filter(|&&host| host != local.ip)
        .map(|&host| build_request(local, host))
        .collect::<ProtocolResult<Vec<_>>>()?;

    let deadline = Instant::now() + timeout;
    channel.send_batch(&frames)?;

    let mut seen = HashSet::new();
    let mut devices = Vec::new();

    while Instant::now() < deadline {
        match channel.recv_frame() {
            Ok(frame) => {
                let Some(reply) = parse_reply(&frame) else {
                    continue;
                };
                if !range.contains(reply.ip) || reply.ip == local.ip {
                    continue;
                }
                if seen.insert(reply.ip) {
                    debug!(ip = %reply.ip, mac = %reply.mac, "Device replied");
                    devices.push(DiscoveredDevice::from(reply));
                }
            }
            Err(e) if e.is_timeout() => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::channel::MockLinkChannel;
    use crate::protocol::arp::tests::build_reply;
    use std::io::ErrorKind;

    fn scanner() -> ArpEndpoint {
        ArpEndpoint {
            mac: MacAddr::new(0x02, 0, 0, 0, 0, 0x01),
            ip: Ipv4Addr::new(192, 168, 1, 10),
        }
    }

    fn responder(last_octet: u8) -> ArpEndpoint {
        ArpEndpoint {
            mac: MacAddr::new(0xaa, 0, 0, 0, 0, last_octet),
            ip: Ipv4Addr::new(192, 168, 1, last_octet),
        }
    }

    fn timed_out() -> NetpulseError {
        NetpulseError::Io(std::io::Error::from(ErrorKind::TimedOut))
    }

    #[test]
    fn test_collects_replies_in_range() -> Result<()> {
        let range = parse_range("192.168.1.0/24")?;
        let hosts = subnet::hosts_of(&range);

        let mut channel = MockLinkChannel::new();
        channel
            .expect_send_batch()
            .times(1)
            // the scanner does not ask for itself
            .withf(|frames| frames.len() == 253)
            .returning(|_| Ok(()));

        let foreign = ArpEndpoint {
            mac: MacAddr::new(0xbb, 0, 0, 0, 0, 1),
            ip: Ipv4Addr::new(10, 0, 0, 1),
        };
        let mut queue = vec![
            build_reply(&responder(1), &scanner()),
            build_reply(&foreign, &scanner()),
            build_reply(&responder(1), &scanner()), // duplicate
            build_reply(&responder(20), &scanner()),
        ];
        queue.reverse();
        channel.expect_recv_frame().returning(move || match queue.pop() {
            Some(frame) => Ok(frame),
            None => Err(timed_out()),
        });

        let devices = collect_replies(
            &mut channel,
            &scanner(),
            &range,
            &hosts,
            Duration::from_millis(50),
        )?;

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].ip_address, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(devices[0].mac_address, responder(1).mac);
        assert_eq!(devices[1].ip_address, Ipv4Addr::new(192, 168, 1, 20));
        Ok(())
    }

    #[test]
    fn test_no_responders_yields_empty_within_timeout() -> Result<()> {
        let range = parse_range("192.168.1.0/30")?;
        let hosts = subnet::hosts_of(&range);

        let mut channel = MockLinkChannel::new();
        channel.expect_send_batch().times(1).returning(|_| Ok(()));
        channel.expect_recv_frame().returning(|| Err(timed_out()));

        let started = Instant::now();
        let devices = collect_replies(
            &mut channel,
            &scanner(),
            &range,
            &hosts,
            Duration::from_millis(50),
        )?;

        assert!(devices.is_empty());
        assert!(started.elapsed() < Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn test_send_failure_propagates() {
        let range = parse_range("192.168.1.0/30").unwrap();
        let hosts = subnet::hosts_of(&range);

        let mut channel = MockLinkChannel::new();
        channel
            .expect_send_batch()
            .times(1)
            .returning(|_| Err(NetpulseError::Io(std::io::Error::from(ErrorKind::PermissionDenied))));
        channel.expect_recv_frame().never();

        let result = collect_replies(
            &mut channel,
            &scanner(),
            &range,
            &hosts,
            Duration::from_millis(50),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_discover_bad_subnet_is_empty() {
        assert!(discover("definitely not a cidr", Duration::from_millis(10)).is_empty());
    }

    #[test]
    fn test_device_display() {
        let device = DiscoveredDevice::from(ArpReply {
            ip: Ipv4Addr::new(192, 168, 1, 1),
            mac: MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff),
        });
        assert_eq!(device.to_string(), "192.168.1.1 (aa:bb:cc:dd:ee:ff)");
    }
}
