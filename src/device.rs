//! Device records produced by a sweep

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// What kind of camera a record describes. Network discovery only ever
/// produces `Network`; the other variants exist for consumers that merge in
/// local hardware or paired short-range devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    LocalHardware,
    Network,
    ShortRangeWireless,
}

/// A username/password pair. Debug and Display redact the password so
/// credentials never reach logs in cleartext.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:<redacted>", self.username)
    }
}

/// One discovered camera endpoint. Deduplicated by `address:port`, not by
/// host: a device answering on several ports yields several records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Stable identity, `"address:port"`
    pub id: String,

    pub address: Ipv4Addr,
    pub port: u16,
    pub kind: DeviceKind,

    /// Reachable and classified as camera-like
    pub accessible: bool,

    /// No credentials required, or supplied credentials accepted
    authorized: bool,

    /// Canonical manufacturer display name, unset when fingerprinting found
    /// no match
    pub brand: Option<String>,

    pub model: Option<String>,

    #[serde(skip)]
    pub credentials: Option<Credentials>,

    /// First path that classified positive for this port
    pub stream_path: Option<String>,
}

impl DeviceRecord {
    /// Create a network camera record for an endpoint that classified
    /// positive
    pub fn network(address: Ipv4Addr, port: u16, stream_path: impl Into<String>) -> Self {
        Self {
            id: format!("{}:{}", address, port),
            address,
            port,
            kind: DeviceKind::Network,
            accessible: true,
            authorized: false,
            brand: None,
            model: None,
            credentials: None,
            stream_path: Some(stream_path.into()),
        }
    }

    pub fn authorized(&self) -> bool {
        self.authorized
    }

    /// Flip the authorization state. A record is never authorized without
    /// being accessible; setting `true` on an inaccessible record is ignored.
    pub fn set_authorized(&mut self, authorized: bool) {
        self.authorized = authorized && self.accessible;
    }

    pub fn set_accessible(&mut self, accessible: bool) {
        self.accessible = accessible;
        if !accessible {
            self.authorized = false;
        }
    }

    /// Base URL of the device web interface
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }

    /// Human-readable label used in progress output and reports
    pub fn display_name(&self) -> String {
        match &self.brand {
            Some(brand) => format!("{} camera ({})", brand, self.id),
            None => format!("Network camera ({})", self.id),
        }
    }
}
