//! Stub HTTP endpoints for exercising probes against real sockets

// Each test binary uses a subset of these helpers
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Request lines seen by a stub, in arrival order
pub type SeenRequests = Arc<Mutex<Vec<String>>>;

/// Spawn a stub server on an ephemeral loopback port that answers every
/// request with the same canned response. Returns the port and the request
/// lines it has served.
pub async fn spawn_stub(response: &'static str) -> (u16, SeenRequests) {
    spawn_stub_with(move |_request| response.to_string()).await
}

/// Spawn a stub whose response is computed from the raw request text
pub async fn spawn_stub_with<F>(respond: F) -> (u16, SeenRequests)
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let seen: SeenRequests = Arc::new(Mutex::new(Vec::new()));
    let seen_writer = seen.clone();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let seen = seen_writer.clone();
            let respond = respond.clone();

            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();

                if let Some(line) = request.lines().next() {
                    seen.lock().unwrap().push(line.to_string());
                }

                let response = respond(&request);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (port, seen)
}

/// Canned MJPEG-stream style response
pub const MJPEG_RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: multipart/x-mixed-replace; boundary=x\r\n\
Connection: close\r\n\
\r\n";

/// Canned plain HTML response with no camera markers
pub const PLAIN_HTML_RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: text/html\r\n\
Connection: close\r\n\
\r\n\
<html><title>Printer admin</title></html>\n";
