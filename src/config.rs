//! Configuration module for the camsweep engine

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Well-known camera ports, tried in this order per host. Mixes standard
/// HTTP, alternate HTTP, RTSP, and the Dahua/Hikvision proprietary ranges.
pub const DEFAULT_CAMERA_PORTS: &[u16] = &[
    80, 81, 82, 83, 88, 554, 555, 8000, 8080, 8081, 8082, 8083, 8084, 8085, 8086, 8554, 8555,
    9000, 9001, 9002, 10554, 37777, 37778, 49152,
];

/// Candidate URL paths, tried in this order per open port. The first path
/// whose response classifies as camera-like wins; the rest are skipped.
pub const DEFAULT_CAMERA_PATHS: &[&str] = &[
    "/",
    "/index.html",
    "/view.html",
    "/viewer/live.html",
    "/live.html",
    "/live/index.html",
    "/video.cgi",
    "/mjpg/video.mjpg",
    "/cgi-bin/viewer/video.jpg",
    "/snapshot.cgi",
    "/axis-cgi/mjpg/video.cgi",
    "/control/faststream.jpg",
    "/videostream.cgi",
    "/GetData.cgi",
    "/live/av0",
    "/cam/realmonitor",
    "/webcam.jpg",
    "/camera.cgi",
    "/video/mjpg.cgi",
    "/cgi-bin/camera",
    "/image.jpg",
    "/video.mjpg",
    "/cgi-bin/mjpg/video.cgi",
    "/live/main",
    "/live/ch1/main",
];

/// Main configuration structure for a discovery sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// /24 prefix to sweep, e.g. "192.168.1". Derived from the local
    /// interface address when unset.
    pub subnet: Option<String>,

    /// Ports probed on each reachable host, in order
    pub ports: Vec<u16>,

    /// URL paths probed on each open port, in order
    pub paths: Vec<String>,

    /// Concurrent host units in flight
    pub workers: usize,

    /// Host reachability probe timeout in milliseconds
    pub ping_timeout_ms: u64,

    /// TCP connect timeout per port in milliseconds
    pub connect_timeout_ms: u64,

    /// HTTP GET timeout per path probe in milliseconds
    pub http_timeout_ms: u64,

    /// Control command timeout in milliseconds (control endpoints are
    /// slower than discovery probes)
    pub command_timeout_ms: u64,

    /// Attempt one admin/admin Basic Auth request against devices that
    /// answer 401 on their base URL
    pub try_default_credentials: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            subnet: None,
            ports: DEFAULT_CAMERA_PORTS.to_vec(),
            paths: DEFAULT_CAMERA_PATHS.iter().map(|p| p.to_string()).collect(),
            workers: 20,
            ping_timeout_ms: 500,
            connect_timeout_ms: 300,
            http_timeout_ms: 500,
            command_timeout_ms: 5000,
            try_default_credentials: false,
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit /24 prefix instead of deriving one
    pub fn with_subnet(mut self, subnet: impl Into<String>) -> Self {
        self.subnet = Some(subnet.into());
        self
    }

    /// Set the ports to probe
    pub fn with_ports(mut self, ports: Vec<u16>) -> Self {
        self.ports = ports;
        self
    }

    /// Set the candidate paths to probe
    pub fn with_paths(mut self, paths: Vec<String>) -> Self {
        self.paths = paths;
        self
    }

    /// Set the worker pool capacity
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enable or disable the single default-credential attempt
    pub fn with_default_credentials(mut self, enabled: bool) -> Self {
        self.try_default_credentials = enabled;
        self
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| crate::ScanError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: ScanConfig = toml::from_str(&content)
            .map_err(|e| crate::ScanError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from `~/.camsweep.toml`, falling back to defaults
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let config_path = home_dir.join(".camsweep.toml");

        if config_path.exists() {
            if let Ok(config) = Self::from_toml_file(&config_path) {
                log::info!("Loaded config from {}", config_path.display());
                return config;
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.ports.is_empty() {
            return Err(crate::ScanError::ConfigError("No ports specified".to_string()));
        }

        if self.paths.is_empty() {
            return Err(crate::ScanError::ConfigError("No candidate paths specified".to_string()));
        }

        if self.workers == 0 {
            return Err(crate::ScanError::ConfigError(
                "Worker count must be greater than 0".to_string(),
            ));
        }

        if let Some(ref subnet) = self.subnet {
            let octets: Vec<&str> = subnet.split('.').collect();
            if octets.len() != 3 || octets.iter().any(|o| o.parse::<u8>().is_err()) {
                return Err(crate::ScanError::ConfigError(format!(
                    "Subnet prefix must be three octets, e.g. 192.168.1 (got {})",
                    subnet
                )));
            }
        }

        Ok(())
    }
}
