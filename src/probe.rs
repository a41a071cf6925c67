//! Single bounded-timeout network probes
//!
//! Every operation here blocks for at most its configured timeout and maps
//! any network failure to a negative result or an `Err` the caller treats as
//! one. The prober holds no scan state.

use crate::config::ScanConfig;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Cap on body bytes buffered by an HTTP probe, regardless of line limit
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Ports used as liveness witnesses by the reachability probe
const REACHABILITY_PORTS: &[u16] = &[80, 8080, 554];

const USER_AGENT: &str = concat!("camsweep/", env!("CARGO_PKG_VERSION"));

/// Typed result of a single HTTP GET probe
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub server: Option<String>,
    /// Body prefix, truncated at the probe's line limit or 16 KiB
    pub body_prefix: String,
}

impl ProbeResponse {
    /// First `n` lines of the body, case-folded and joined, for keyword
    /// matching
    pub fn folded_body_lines(&self, n: usize) -> String {
        self.body_prefix
            .lines()
            .take(n)
            .collect::<Vec<_>>()
            .join("\n")
            .to_lowercase()
    }
}

/// Performs bounded network operations on behalf of the orchestrator
#[derive(Debug, Clone)]
pub struct Prober {
    ping_timeout: Duration,
    connect_timeout: Duration,
    client: reqwest::Client,
}

impl Prober {
    pub fn new(config: &ScanConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .connect_timeout(config.http_timeout())
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            ping_timeout: config.ping_timeout(),
            connect_timeout: config.connect_timeout(),
            client,
        })
    }

    /// Bounded host liveness probe.
    ///
    /// ICMP echo needs raw sockets, so liveness is judged at the TCP level:
    /// a connect that completes or is actively refused proves a stack is
    /// answering at the address. Only a timeout or an unreachable error
    /// counts as down. The ping budget is split across the witness ports.
    pub async fn is_reachable(&self, ip: Ipv4Addr) -> bool {
        let per_port = self.ping_timeout / REACHABILITY_PORTS.len() as u32;

        for &port in REACHABILITY_PORTS {
            let addr = SocketAddr::from((ip, port));
            match timeout(per_port, TcpStream::connect(addr)).await {
                Ok(Ok(_)) => return true,
                Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => return true,
                Ok(Err(_)) | Err(_) => continue,
            }
        }

        false
    }

    /// Raw TCP connect with the per-port timeout
    pub async fn port_open(&self, ip: Ipv4Addr, port: u16) -> bool {
        let addr = SocketAddr::from((ip, port));
        matches!(timeout(self.connect_timeout, TcpStream::connect(addr)).await, Ok(Ok(_)))
    }

    /// Bounded HTTP GET returning status, the headers classification cares
    /// about, and at most `max_lines` lines of body.
    ///
    /// Any network or protocol failure surfaces as `Err`; callers treat it
    /// as a negative probe. The body is read incrementally and abandoned as
    /// soon as the line or byte limit is hit, so an endless MJPEG stream
    /// cannot stall a probe beyond its timeout.
    pub async fn http_get(&self, url: &str, max_lines: usize) -> crate::Result<ProbeResponse> {
        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let content_type = header_string(&response, reqwest::header::CONTENT_TYPE);
        let server = header_string(&response, reqwest::header::SERVER);

        let body_prefix = read_body_prefix(response, max_lines).await;

        Ok(ProbeResponse {
            status,
            content_type,
            server,
            body_prefix,
        })
    }

    /// Bounded GET with HTTP Basic credentials; used by the single
    /// default-credential attempt. Only the status matters to callers.
    pub async fn http_get_basic_auth(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> crate::Result<u16> {
        let response = self
            .client
            .get(url)
            .basic_auth(username, Some(password))
            .send()
            .await?;
        Ok(response.status().as_u16())
    }
}

fn header_string(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Drain at most `max_lines` lines (or 16 KiB) from a response body
async fn read_body_prefix(mut response: reqwest::Response, max_lines: usize) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let mut newlines = 0usize;

    while let Ok(Some(chunk)) = response.chunk().await {
        newlines += chunk.iter().filter(|&&b| b == b'\n').count();
        buf.extend_from_slice(&chunk);

        if newlines >= max_lines || buf.len() >= MAX_BODY_BYTES {
            break;
        }
    }

    buf.truncate(MAX_BODY_BYTES);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folded_body_lines_respects_limit() {
        let response = ProbeResponse {
            status: 200,
            content_type: None,
            server: None,
            body_prefix: "One\nTwo\nCAMERA\nFour".to_string(),
        };

        let first_two = response.folded_body_lines(2);
        assert!(first_two.contains("one"));
        assert!(!first_two.contains("camera"));

        let all = response.folded_body_lines(10);
        assert!(all.contains("camera"));
    }

    #[tokio::test]
    async fn unroutable_address_is_unreachable() {
        let config = ScanConfig {
            ping_timeout_ms: 150,
            ..ScanConfig::default()
        };
        let prober = Prober::new(&config).unwrap();
        // TEST-NET-1, guaranteed unrouted
        assert!(!prober.is_reachable(Ipv4Addr::new(192, 0, 2, 1)).await);
    }

    #[tokio::test]
    async fn loopback_is_reachable() {
        let prober = Prober::new(&ScanConfig::default()).unwrap();
        assert!(prober.is_reachable(Ipv4Addr::LOCALHOST).await);
    }

    #[tokio::test]
    async fn closed_port_is_not_open() {
        let config = ScanConfig::default();
        let prober = Prober::new(&config).unwrap();
        // Bind then drop to obtain a port that is almost certainly closed
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        assert!(!prober.port_open(Ipv4Addr::LOCALHOST, port).await);
    }
}
