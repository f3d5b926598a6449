use crate::constants::ARP_FRAME_SIZE;
use crate::protocol::error::{ProtocolError, Result};
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::packet::Packet;
use pnet::util::MacAddr;
use std::net::Ipv4Addr;

const ETHERNET_HEADER_SIZE: usize = 14;

/// Hardware and protocol address of the scanning interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpEndpoint {
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
}

/// Address pair taken from the sender fields of an ARP reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpReply {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
}

/// Build a broadcast "who-has `target`" frame
pub fn build_request(source: &ArpEndpoint, target: Ipv4Addr) -> Result<[u8; ARP_FRAME_SIZE]> {
    let mut frame = [0u8; ARP_FRAME_SIZE];
    let (eth_buf, arp_buf) = frame.split_at_mut(ETHERNET_HEADER_SIZE);

    let mut ethernet =
        MutableEthernetPacket::new(eth_buf).ok_or(ProtocolError::FrameBuffer("ethernet header"))?;
    ethernet.set_destination(MacAddr::broadcast());
    ethernet.set_source(source.mac);
    ethernet.set_ethertype(EtherTypes::Arp);

    let mut arp = MutableArpPacket::new(arp_buf).ok_or(ProtocolError::FrameBuffer("arp payload"))?;
    arp.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp.set_protocol_type(EtherTypes::Ipv4);
    arp.set_hw_addr_len(6);
    arp.set_proto_addr_len(4);
    arp.set_operation(ArpOperations::Request);
    arp.set_sender_hw_addr(source.mac);
    arp.set_sender_proto_addr(source.ip);
    arp.set_target_hw_addr(MacAddr::zero());
    arp.set_target_proto_addr(target);

    Ok(frame)
}

/// Extract the responder from an Ethernet frame, if it carries an ARP reply
pub fn parse_reply(frame: &[u8]) -> Option<ArpReply> {
    let ethernet = EthernetPacket::new(frame)?;
    if ethernet.get_ethertype() != EtherTypes::Arp {
        return None;
    }

    let arp = ArpPacket::new(ethernet.payload())?;
    if arp.get_operation() != ArpOperations::Reply {
        return None;
    }

    Some(ArpReply {
        ip: arp.get_sender_proto_addr(),
        mac: arp.get_sender_hw_addr(),
    })
}
