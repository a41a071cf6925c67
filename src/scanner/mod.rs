//! Scanner module containing the discovery orchestrator

pub mod engine;

use crate::config::ScanConfig;
use crate::device::DeviceRecord;
use std::net::Ipv4Addr;

pub use engine::ScanOrchestrator;

/// Events streamed by an in-flight scan.
///
/// Discovery events may arrive out of host-address order (workers race);
/// the progress counter is monotonically increasing regardless of emission
/// order; `Complete` is emitted at most once per scan.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// An endpoint classified as a camera and inserted into the registry
    Discovery(DeviceRecord),

    /// One more host fully accounted for
    Progress {
        scanned: usize,
        total: usize,
        /// Human-readable description of the host just finished
        current: String,
    },

    /// The scan finished or was cancelled; fired exactly once
    Complete {
        scanned: usize,
        total: usize,
        discovered: usize,
        cancelled: bool,
    },
}

/// Determine the local interface's IPv4 address by opening a UDP socket
/// toward a public address. No packet is sent; the OS routing decision
/// alone reveals the outbound interface.
pub fn local_ipv4() -> crate::Result<Ipv4Addr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:80")?;

    match socket.local_addr()?.ip() {
        std::net::IpAddr::V4(ipv4) => Ok(ipv4),
        std::net::IpAddr::V6(_) => Err(crate::ScanError::InvalidTarget(
            "IPv6-only interfaces are not supported".to_string(),
        )),
    }
}

/// The 254 host addresses of a /24, given its three-octet prefix
pub fn subnet_hosts(prefix: &str) -> crate::Result<Vec<Ipv4Addr>> {
    let octets: Vec<u8> = prefix
        .split('.')
        .map(|o| o.parse::<u8>())
        .collect::<Result<_, _>>()
        .map_err(|_| crate::ScanError::InvalidTarget(format!("Invalid subnet prefix: {}", prefix)))?;

    if octets.len() != 3 {
        return Err(crate::ScanError::InvalidTarget(format!(
            "Subnet prefix must be three octets: {}",
            prefix
        )));
    }

    Ok((1..=254)
        .map(|host| Ipv4Addr::new(octets[0], octets[1], octets[2], host))
        .collect())
}

/// Compute the target set for a scan: the configured /24 prefix, or the /24
/// of the local interface address when none is configured
pub fn enumerate_targets(config: &ScanConfig) -> crate::Result<Vec<Ipv4Addr>> {
    let prefix = match config.subnet {
        Some(ref prefix) => prefix.clone(),
        None => {
            let local = local_ipv4()?;
            let [a, b, c, _] = local.octets();
            format!("{}.{}.{}", a, b, c)
        }
    };

    subnet_hosts(&prefix)
}
