//! End-to-end sweep tests against stub endpoints on the loopback /24

mod common;

use camsweep::config::ScanConfig;
use camsweep::fingerprint;
use camsweep::probe::Prober;
use camsweep::scanner::{ScanEvent, ScanOrchestrator};
use common::{spawn_stub, spawn_stub_with, MJPEG_RESPONSE};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::timeout;

/// Fast timeouts for loopback: connects resolve instantly there
fn loopback_config(port: u16, path: &str) -> ScanConfig {
    ScanConfig::default()
        .with_subnet("127.0.0")
        .with_ports(vec![port])
        .with_paths(vec![path.to_string()])
        .with_workers(64)
}

/// Drain events until completion, returning (discoveries, completion)
async fn drain(
    mut events: tokio::sync::mpsc::UnboundedReceiver<ScanEvent>,
) -> (Vec<camsweep::DeviceRecord>, Option<(usize, usize, usize, bool)>) {
    let mut discoveries = Vec::new();
    let mut completion = None;

    while let Some(event) = events.recv().await {
        match event {
            ScanEvent::Discovery(device) => discoveries.push(device),
            ScanEvent::Progress { .. } => {}
            ScanEvent::Complete {
                scanned,
                total,
                discovered,
                cancelled,
            } => {
                completion = Some((scanned, total, discovered, cancelled));
                break;
            }
        }
    }

    (discoveries, completion)
}

#[tokio::test]
async fn mjpeg_endpoint_is_discovered() {
    let (port, _) = spawn_stub(MJPEG_RESPONSE).await;
    let orchestrator = ScanOrchestrator::new(loopback_config(port, "/video.cgi")).unwrap();

    let events = orchestrator.start_scan().await.unwrap().unwrap();
    let (discoveries, completion) = timeout(Duration::from_secs(60), drain(events))
        .await
        .expect("scan did not finish in time");

    assert_eq!(discoveries.len(), 1, "exactly the stub host should classify");
    let device = &discoveries[0];
    assert_eq!(device.id, format!("127.0.0.1:{}", port));
    assert_eq!(device.address, Ipv4Addr::LOCALHOST);
    assert!(device.accessible);
    assert_eq!(device.stream_path.as_deref(), Some("/video.cgi"));

    let (scanned, total, discovered, cancelled) = completion.unwrap();
    assert_eq!((scanned, total), (254, 254));
    assert_eq!(discovered, 1);
    assert!(!cancelled);

    assert_eq!(orchestrator.registry().len().await, 1);
    assert!(!orchestrator.is_scanning());
}

#[tokio::test]
async fn non_camera_endpoint_is_not_discovered() {
    let (port, _) = spawn_stub(common::PLAIN_HTML_RESPONSE).await;
    let orchestrator = ScanOrchestrator::new(loopback_config(port, "/index.html")).unwrap();

    let events = orchestrator.start_scan().await.unwrap().unwrap();
    let (discoveries, completion) = timeout(Duration::from_secs(60), drain(events))
        .await
        .expect("scan did not finish in time");

    assert!(discoveries.is_empty());
    let (scanned, _, discovered, _) = completion.unwrap();
    assert_eq!(scanned, 254);
    assert_eq!(discovered, 0);
}

#[tokio::test]
async fn server_header_sets_brand_regardless_of_body() {
    let (port, _) = spawn_stub(
        "HTTP/1.1 200 OK\r\n\
Server: Hikvision-Webs\r\n\
Content-Type: text/html\r\n\
Connection: close\r\n\
\r\n\
<html>nothing vendor-like in here</html>\n",
    )
    .await;

    let prober = Prober::new(&ScanConfig::default()).unwrap();
    let brand = fingerprint::identify(&prober, Ipv4Addr::LOCALHOST, port)
        .await
        .expect("header should match");

    assert_eq!(brand.display_name, "海康威视");
    assert_eq!(brand.evidence, fingerprint::Evidence::ServerHeader);
}

#[tokio::test]
async fn body_fallback_identifies_brand() {
    let (port, _) = spawn_stub(
        "HTTP/1.1 200 OK\r\n\
Server: thttpd/2.25b\r\n\
Content-Type: text/html\r\n\
Connection: close\r\n\
\r\n\
<html><title>FOSCAM IP Camera</title></html>\n",
    )
    .await;

    let prober = Prober::new(&ScanConfig::default()).unwrap();
    let brand = fingerprint::identify(&prober, Ipv4Addr::LOCALHOST, port)
        .await
        .expect("body should match");

    assert_eq!(brand.display_name, "福斯康姆");
    assert_eq!(brand.evidence, fingerprint::Evidence::Body);
}

#[tokio::test]
async fn unreachable_subnet_completes_with_no_discoveries() {
    // TEST-NET-1 is guaranteed unrouted: every host times out
    let config = ScanConfig {
        subnet: Some("192.0.2".to_string()),
        ports: vec![80],
        paths: vec!["/".to_string()],
        workers: 128,
        ping_timeout_ms: 150,
        connect_timeout_ms: 100,
        ..ScanConfig::default()
    };
    let orchestrator = ScanOrchestrator::new(config).unwrap();

    let events = orchestrator.start_scan().await.unwrap().unwrap();
    let (discoveries, completion) = timeout(Duration::from_secs(60), drain(events))
        .await
        .expect("scan did not finish in time");

    assert!(discoveries.is_empty());
    let (scanned, total, discovered, cancelled) = completion.unwrap();
    assert_eq!((scanned, total), (254, 254));
    assert_eq!(discovered, 0);
    assert!(!cancelled);
}

#[tokio::test]
async fn default_credentials_flip_authorized_on_401() {
    let (port, _) = spawn_stub_with(|request| {
        // Header names arrive lowercase from hyper-based clients
        if request.to_ascii_lowercase().contains("authorization: basic") {
            "HTTP/1.1 200 OK\r\n\
Content-Type: image/jpeg\r\n\
Connection: close\r\n\
\r\n"
                .to_string()
        } else {
            "HTTP/1.1 401 Unauthorized\r\n\
WWW-Authenticate: Basic realm=\"camera\"\r\n\
Content-Type: text/html\r\n\
Connection: close\r\n\
\r\n\
<html>camera login</html>\n"
                .to_string()
        }
    })
    .await;

    let config = loopback_config(port, "/snapshot.cgi").with_default_credentials(true);
    let orchestrator = ScanOrchestrator::new(config).unwrap();

    let events = orchestrator.start_scan().await.unwrap().unwrap();
    let (discoveries, _) = timeout(Duration::from_secs(60), drain(events))
        .await
        .expect("scan did not finish in time");

    assert_eq!(discoveries.len(), 1);
    let device = &discoveries[0];
    assert!(device.authorized(), "200 under default creds must authorize");
    let creds = device.credentials.as_ref().expect("credentials recorded");
    assert_eq!(creds.username, "admin");
}

#[tokio::test]
async fn second_start_is_a_noop_while_active() {
    let config = ScanConfig {
        subnet: Some("192.0.2".to_string()),
        ports: vec![80],
        paths: vec!["/".to_string()],
        workers: 4,
        ping_timeout_ms: 500,
        ..ScanConfig::default()
    };
    let orchestrator = ScanOrchestrator::new(config).unwrap();

    let first = orchestrator.start_scan().await.unwrap();
    assert!(first.is_some());
    assert!(orchestrator.is_scanning());

    let second = orchestrator.start_scan().await.unwrap();
    assert!(second.is_none(), "concurrent start must be a no-op");

    orchestrator.stop_scan();
}

#[tokio::test]
async fn stop_scan_cancels_and_completes_once() {
    let config = ScanConfig {
        subnet: Some("192.0.2".to_string()),
        ports: vec![80],
        paths: vec!["/".to_string()],
        workers: 2, // slow on purpose so cancellation lands mid-scan
        ping_timeout_ms: 400,
        ..ScanConfig::default()
    };
    let orchestrator = ScanOrchestrator::new(config).unwrap();

    let events = orchestrator.start_scan().await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    orchestrator.stop_scan();
    orchestrator.stop_scan(); // idempotent

    let (_, completion) = timeout(Duration::from_secs(10), drain(events))
        .await
        .expect("cancellation must still produce completion");

    let (scanned, total, _, cancelled) = completion.unwrap();
    assert!(cancelled);
    assert!(scanned < total, "cancellation should land before all 254 hosts");
    assert!(!orchestrator.is_scanning());
}

#[tokio::test]
async fn stop_before_any_scan_is_harmless() {
    let orchestrator = ScanOrchestrator::new(loopback_config(1, "/")).unwrap();
    orchestrator.stop_scan();
    orchestrator.stop_scan();
    assert!(!orchestrator.is_scanning());

    // A scan can still start normally afterwards
    let events = orchestrator.start_scan().await.unwrap();
    assert!(events.is_some());
}
