//! Scan report rendering

use crate::device::DeviceRecord;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

/// Summary of a finished (or cancelled) sweep
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub timestamp: DateTime<Utc>,
    pub subnet: String,
    pub hosts_scanned: usize,
    pub hosts_total: usize,
    pub cancelled: bool,
    #[serde(serialize_with = "serialize_duration_secs")]
    pub duration: Duration,
    pub devices: Vec<DeviceRecord>,
}

fn serialize_duration_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl ScanReport {
    pub fn new(
        subnet: String,
        hosts_scanned: usize,
        hosts_total: usize,
        cancelled: bool,
        duration: Duration,
        devices: Vec<DeviceRecord>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            subnet,
            hosts_scanned,
            hosts_total,
            cancelled,
            duration,
            devices,
        }
    }

    /// Machine-readable report. Credentials are skipped by the record's
    /// serde attributes.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::ScanError::ParseError(e.to_string()))
    }

    /// Colored terminal report
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let status = if self.cancelled {
            "cancelled".yellow().bold()
        } else {
            "complete".green().bold()
        };

        let _ = writeln!(
            out,
            "\n{} {} — {}/{} hosts on {}.0/24 in {:.1}s",
            "Scan".bold(),
            status,
            self.hosts_scanned,
            self.hosts_total,
            self.subnet,
            self.duration.as_secs_f64()
        );

        if self.devices.is_empty() {
            let _ = writeln!(out, "{}", "No camera endpoints found.".dimmed());
            return out;
        }

        let _ = writeln!(
            out,
            "\n{:<22} {:<14} {:<26} {:<6} {}",
            "ENDPOINT".bold(),
            "BRAND".bold(),
            "STREAM PATH".bold(),
            "AUTH".bold(),
            "CREDENTIALS".bold()
        );

        for device in &self.devices {
            let brand = device.brand.as_deref().unwrap_or("-");
            let path = device.stream_path.as_deref().unwrap_or("-");
            let auth = if device.authorized() {
                "open".green()
            } else {
                "locked".red()
            };
            let creds = match &device.credentials {
                Some(creds) => creds.to_string(),
                None => "-".to_string(),
            };

            let _ = writeln!(
                out,
                "{:<22} {:<14} {:<26} {:<6} {}",
                device.id.cyan(),
                brand,
                path,
                auth,
                creds
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Credentials;
    use std::net::Ipv4Addr;

    fn sample_report() -> ScanReport {
        let mut device = DeviceRecord::network(Ipv4Addr::new(192, 168, 1, 64), 8080, "/video.cgi");
        device.brand = Some("海康威视".to_string());
        device.credentials = Some(Credentials::new("admin", "admin"));
        device.set_authorized(true);

        ScanReport::new(
            "192.168.1".to_string(),
            254,
            254,
            false,
            Duration::from_secs(12),
            vec![device],
        )
    }

    #[test]
    fn json_report_omits_credentials() {
        let json = sample_report().to_json().unwrap();
        assert!(json.contains("192.168.1.64:8080"));
        assert!(json.contains("海康威视"));
        assert!(!json.contains("\"password\""));
    }

    #[test]
    fn text_report_redacts_password() {
        let text = sample_report().render_text();
        assert!(text.contains("192.168.1.64:8080"));
        assert!(text.contains("admin:<redacted>"));
        assert!(!text.contains("admin:admin"));
    }
}
