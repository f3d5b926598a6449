use crate::constants::MAX_DISCOVERY_HOSTS;
use crate::error::{NetpulseError, Result};
use crate::protocol::ArpEndpoint;
use ipnetwork::{IpNetwork, Ipv4Network};
use pnet::util::MacAddr;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Parse an IPv4 CIDR range such as `192.168.1.0/24`
pub fn parse_range(cidr: &str) -> Result<Ipv4Network> {
    let range = Ipv4Network::from_str(cidr.trim())
        .map_err(|e| NetpulseError::Config(format!("invalid subnet {:?}: {}", cidr, e)))?;
    let size = 1u64 << (32 - u32::from(range.prefix()));
    if size > MAX_DISCOVERY_HOSTS as u64 {
        return Err(NetpulseError::Config(format!(
            "subnet {} has {} addresses, at most {} can be scanned",
            range, size, MAX_DISCOVERY_HOSTS
        )));
    }
    Ok(range)
}

/// Usable host addresses of `cidr`.
///
/// Network and broadcast addresses are skipped except for /31 and /32,
/// where every address is a host.
pub fn subnet_hosts(cidr: &str) -> Result<Vec<Ipv4Addr>> {
    let range = parse_range(cidr)?;
    Ok(hosts_of(&range))
}

pub(crate) fn hosts_of(range: &Ipv4Network) -> Vec<Ipv4Addr> {
    if range.prefix() >= 31 {
        return range.iter().collect();
    }
    let network = range.network();
    let broadcast = range.broadcast();
    range
        .iter()
        .filter(|&ip| ip != network && ip != broadcast)
        .collect()
}

/// The address an interface with `mac` and `ips` would scan `range` from
pub(crate) fn endpoint_for(
    mac: Option<MacAddr>,
    ips: &[IpNetwork],
    range: &Ipv4Network,
) -> Option<ArpEndpoint> {
    let mac = mac.filter(|mac| *mac != MacAddr::zero())?;
    ips.iter().find_map(|ip| match ip {
        IpNetwork::V4(net) if net.contains(range.network()) || range.contains(net.ip()) => {
            Some(ArpEndpoint { mac, ip: net.ip() })
        }
        _ => None,
    })
}
