//! Constants used throughout the monitor

/// Number of latency samples kept in the rolling window
pub const HISTORY_CAPACITY: usize = 10;

/// Default probe target
pub const DEFAULT_TARGET_HOST: &str = "1.1.1.1";

/// Default settings file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "ping_config.cfg";

/// Default upper bound (exclusive) of the low latency band in milliseconds
pub const DEFAULT_LOW_THRESHOLD_MS: u64 = 50;

/// Default upper bound (inclusive) of the medium latency band in milliseconds
pub const DEFAULT_HIGH_THRESHOLD_MS: u64 = 80;

/// Default time to wait for an echo reply in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1000;

/// Default time to collect ARP replies in milliseconds
pub const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 2000;

/// Size of an ICMP echo header in bytes
pub const ICMP_HEADER_SIZE: usize = 8;

/// Payload carried by each echo request
pub const ECHO_PAYLOAD: &[u8] = b"netpulse-probe!!";

/// Receive buffer size for echo replies (IPv4 header + ICMP message)
pub const ECHO_RECV_BUFFER_SIZE: usize = 512;

/// Ethernet header plus ARP payload for IPv4 over Ethernet
pub const ARP_FRAME_SIZE: usize = 42;

/// Largest subnet enumerated by a single discovery scan
pub const MAX_DISCOVERY_HOSTS: usize = 4096;

/// Datalink write buffer, sized so the largest scan goes out in one send
pub const DATALINK_WRITE_BUFFER_SIZE: usize = MAX_DISCOVERY_HOSTS * ARP_FRAME_SIZE;

/// Read timeout of the datalink channel while collecting ARP replies
pub const DATALINK_POLL_INTERVAL_MS: u64 = 50;

/// Spinner tick interval during discovery in milliseconds
pub const SPINNER_TICK_INTERVAL_MS: u64 = 100;
