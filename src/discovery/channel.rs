use crate::constants::{ARP_FRAME_SIZE, DATALINK_POLL_INTERVAL_MS, DATALINK_WRITE_BUFFER_SIZE};
use crate::error::{NetpulseError, Result};
use pnet::datalink::{self, Channel, DataLinkReceiver, DataLinkSender, NetworkInterface};
use std::time::Duration;
use tracing::{debug, warn};

/// Trait for link-layer frame exchange
pub trait LinkChannel: Send {
    /// Transmit every frame in one batched send
    fn send_batch(&mut self, frames: &[[u8; ARP_FRAME_SIZE]]) -> Result<()>;

    /// Receive the next frame; a timeout error means nothing arrived this poll
    fn recv_frame(&mut self) -> Result<Vec<u8>>;
}

/// Frames that fit in one `build_and_send` call on a write buffer of `write_buffer_size` bytes
pub(crate) fn frames_per_send(write_buffer_size: usize) -> usize {
    (write_buffer_size / ARP_FRAME_SIZE).max(1)
}

/// Ethernet channel on a single interface
pub struct DatalinkChannel {
    interface: String,
    tx: Box<dyn DataLinkSender>,
    rx: Box<dyn DataLinkReceiver>,
    frames_per_send: usize,
}

impl DatalinkChannel {
    pub fn open(interface: &NetworkInterface) -> Result<Self> {
        debug!(interface = %interface.name, "Opening datalink channel");
        let config = datalink::Config {
            read_timeout: Some(Duration::from_millis(DATALINK_POLL_INTERVAL_MS)),
            write_buffer_size: DATALINK_WRITE_BUFFER_SIZE,
            ..Default::default()
        };

        match datalink::channel(interface, config) {
            Ok(Channel::Ethernet(tx, rx)) => Ok(Self {
                interface: interface.name.clone(),
                tx,
                rx,
                frames_per_send: frames_per_send(DATALINK_WRITE_BUFFER_SIZE),
            }),
            Ok(_) => Err(NetpulseError::Discovery(format!(
                "{} is not an Ethernet interface",
                interface.name
            ))),
            Err(e) => {
                warn!(interface = %interface.name, error = %e, "Failed to open datalink channel");
                Err(NetpulseError::Discovery(format!(
                    "Failed to open datalink channel on {}: {}",
                    interface.name, e
                )))
            }
        }
    }
}

impl LinkChannel for DatalinkChannel {
    fn send_batch(&mut self, frames: &[[u8; ARP_FRAME_SIZE]]) -> Result<()> {
        for chunk in frames.chunks(self.frames_per_send) {
            let mut index = 0;
            let outcome = self
                .tx
                .build_and_send(chunk.len(), ARP_FRAME_SIZE, &mut |buf: &mut [u8]| {
                    let len = buf.len().min(ARP_FRAME_SIZE);
                    buf[..len].copy_from_slice(&chunk[index][..len]);
                    index += 1;
                });

            match outcome {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    warn!(interface = %self.interface, error = %e, "Failed to send ARP batch");
                    return Err(NetpulseError::Io(e));
                }
                None => {
                    return Err(NetpulseError::Discovery(format!(
                        "{} has no room to queue {} frames",
                        self.interface,
                        chunk.len()
                    )));
                }
            }
        }

        debug!(
            interface = %self.interface,
            frames = frames.len(),
            "ARP batch sent"
        );
        Ok(())
    }

    fn recv_frame(&mut self) -> Result<Vec<u8>> {
        self.rx
            .next()
            .map(|frame| frame.to_vec())
            .map_err(NetpulseError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_DISCOVERY_HOSTS;
    use crate::discovery::subnet_hosts;
    use crate::protocol::{build_request, ArpEndpoint};
    use mockall::mock;
    use pnet::util::MacAddr;
    use std::net::Ipv4Addr;

    mock! {
        pub LinkChannel {}

        impl LinkChannel for LinkChannel {
            fn send_batch(&mut self, frames: &[[u8; ARP_FRAME_SIZE]]) -> Result<()>;
            fn recv_frame(&mut self) -> Result<Vec<u8>>;
        }
    }

    /// pnet's default write buffer size
    const PNET_DEFAULT_WRITE_BUFFER: usize = 4096;

    fn slash_24_frames() -> Vec<[u8; ARP_FRAME_SIZE]> {
        let local = ArpEndpoint {
            mac: MacAddr::new(0x02, 0, 0, 0, 0, 0x01),
            ip: Ipv4Addr::new(192, 168, 1, 10),
        };
        subnet_hosts("192.168.1.0/24")
            .unwrap()
            .into_iter()
            .filter(|&host| host != local.ip)
            .map(|host| build_request(&local, host).unwrap())
            .collect()
    }

    #[test]
    fn test_write_buffer_holds_largest_scan() {
        let per_send = frames_per_send(DATALINK_WRITE_BUFFER_SIZE);
        assert!(per_send >= MAX_DISCOVERY_HOSTS);
        assert!(per_send * ARP_FRAME_SIZE <= DATALINK_WRITE_BUFFER_SIZE);
    }

    #[test]
    fn test_small_buffer_splits_slash_24_into_fitting_chunks() {
        let frames = slash_24_frames();
        assert_eq!(frames.len(), 253);

        let per_send = frames_per_send(PNET_DEFAULT_WRITE_BUFFER);
        let chunks: Vec<_> = frames.chunks(per_send).collect();
        assert_eq!(chunks.len(), 3);
        assert!(chunks
            .iter()
            .all(|chunk| chunk.len() * ARP_FRAME_SIZE <= PNET_DEFAULT_WRITE_BUFFER));
        assert_eq!(chunks.iter().map(|chunk| chunk.len()).sum::<usize>(), 253);
    }

    #[test]
    fn test_frames_per_send_never_zero() {
        assert_eq!(frames_per_send(0), 1);
    }

    #[test]
    fn test_loopback_channel_sends_full_slash_24_batch() {
        let Some(lo) = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.is_loopback())
        else {
            return;
        };
        // opening a datalink channel needs CAP_NET_RAW
        let Ok(mut channel) = DatalinkChannel::open(&lo) else {
            return;
        };

        let frames = slash_24_frames();
        assert!(channel.send_batch(&frames).is_ok());
        assert!(channel.send_batch(&frames[..2]).is_ok());
    }
}

#[cfg(test)]
pub use tests::MockLinkChannel;
