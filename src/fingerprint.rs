//! Manufacturer fingerprinting
//!
//! One auxiliary GET to the device root, matched against a static signature
//! table. The `Server` header is checked first; the body is only scanned
//! when the header yields nothing. First match in table order wins.

use crate::probe::Prober;
use std::net::Ipv4Addr;

/// Lines of root-page body scanned when the Server header has no match
const BODY_LINE_LIMIT: usize = 50;

/// Lowercase token → canonical display name, matched by substring
/// containment. Order matters: the first containing token wins, so this is
/// a slice rather than a map.
pub const MANUFACTURER_SIGNATURES: &[(&str, &str)] = &[
    ("hikvision", "海康威视"),
    ("dahua", "大华"),
    ("axis", "安讯士"),
    ("sony", "索尼"),
    ("panasonic", "松下"),
    ("samsung", "三星"),
    ("bosch", "博世"),
    ("vivotek", "威联通"),
    ("tplink", "TP-Link"),
    ("dlink", "D-Link"),
    ("foscam", "福斯康姆"),
    ("wanscam", "万视达"),
    ("uniview", "宇视"),
    ("tiandy", "天地伟业"),
    ("kedacom", "科达"),
    ("yushi", "宇视"),
    ("infinova", "英飞拓"),
];

/// Where the matching token was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    ServerHeader,
    Body,
}

/// A successful manufacturer match
#[derive(Debug, Clone)]
pub struct BrandMatch {
    /// Signature token, e.g. "hikvision"
    pub token: &'static str,
    /// Canonical display name, e.g. "海康威视"
    pub display_name: &'static str,
    pub evidence: Evidence,
}

/// Match a case-folded haystack against the signature table
fn match_signature(haystack: &str, evidence: Evidence) -> Option<BrandMatch> {
    MANUFACTURER_SIGNATURES
        .iter()
        .find(|(token, _)| haystack.contains(token))
        .map(|&(token, display_name)| BrandMatch {
            token,
            display_name,
            evidence,
        })
}

/// Infer the manufacturer of a device from its root-path response.
///
/// Never fails: a failed request, an unexpected status, or no matching
/// signature all yield `None`, leaving the brand unset so the dispatcher
/// falls back to its generic command table.
pub async fn identify(prober: &Prober, address: Ipv4Addr, port: u16) -> Option<BrandMatch> {
    let url = format!("http://{}:{}/", address, port);
    let response = prober.http_get(&url, BODY_LINE_LIMIT).await.ok()?;

    if response.status != 200 && response.status != 401 {
        return None;
    }

    if let Some(ref server) = response.server {
        if let Some(found) = match_signature(&server.to_lowercase(), Evidence::ServerHeader) {
            log::debug!("{}:{} Server header matched {}", address, port, found.token);
            return Some(found);
        }
    }

    // Header was inconclusive; body text is only meaningful on a 200
    if response.status == 200 {
        let body = response.folded_body_lines(BODY_LINE_LIMIT);
        if let Some(found) = match_signature(&body, Evidence::Body) {
            log::debug!("{}:{} body matched {}", address, port, found.token);
            return Some(found);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_header_token_matches() {
        let found = match_signature("hikvision-webs", Evidence::ServerHeader).unwrap();
        assert_eq!(found.token, "hikvision");
        assert_eq!(found.display_name, "海康威视");
        assert_eq!(found.evidence, Evidence::ServerHeader);
    }

    #[test]
    fn containment_not_equality() {
        let found = match_signature("webserver/dahua-rtsp-gateway 2.0", Evidence::Body).unwrap();
        assert_eq!(found.display_name, "大华");
    }

    #[test]
    fn first_match_in_table_order_wins() {
        // Both tokens present; hikvision precedes dahua in the table
        let found = match_signature("dahua proxy for hikvision units", Evidence::Body).unwrap();
        assert_eq!(found.token, "hikvision");
    }

    #[test]
    fn unknown_server_yields_none() {
        assert!(match_signature("nginx/1.24.0", Evidence::ServerHeader).is_none());
    }

    #[test]
    fn table_covers_original_vendors() {
        assert_eq!(MANUFACTURER_SIGNATURES.len(), 17);
        assert!(MANUFACTURER_SIGNATURES.iter().any(|&(t, _)| t == "axis"));
        assert!(MANUFACTURER_SIGNATURES.iter().any(|&(t, _)| t == "foscam"));
    }
}
