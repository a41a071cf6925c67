//! Scan orchestration
//!
//! Owns the bounded worker pool, fans out per-host probe units, aggregates
//! progress, and streams events to the consumer. Concurrency exists only at
//! the host level: each unit walks its port and path candidates
//! sequentially, so in-flight connections to any single device stay
//! bounded.

use crate::classify;
use crate::config::ScanConfig;
use crate::device::{Credentials, DeviceRecord};
use crate::fingerprint;
use crate::probe::Prober;
use crate::registry::DeviceRegistry;
use crate::scanner::{enumerate_targets, ScanEvent};
use futures::future::join_all;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Lines of body a path probe reads for classification
const CLASSIFY_LINE_LIMIT: usize = 20;

/// The single well-known credential pair tried against 401 endpoints
const DEFAULT_CREDENTIALS: (&str, &str) = ("admin", "admin");

/// Discovery orchestrator. One scan may be active at a time; starting a
/// second is a no-op until the first completes or is stopped.
pub struct ScanOrchestrator {
    config: ScanConfig,
    registry: DeviceRegistry,
    prober: Prober,
    scanning: Arc<AtomicBool>,
    cancel: Mutex<CancellationToken>,
}

impl ScanOrchestrator {
    pub fn new(config: ScanConfig) -> crate::Result<Self> {
        config.validate()?;
        let prober = Prober::new(&config)?;

        Ok(Self {
            config,
            registry: DeviceRegistry::new(),
            prober,
            scanning: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    /// Registry handle for consumers; populated while a scan runs
    pub fn registry(&self) -> DeviceRegistry {
        self.registry.clone()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Start a sweep of the target subnet.
    ///
    /// Returns the event stream for the new scan, or `None` when a scan is
    /// already active. The registry is cleared at start; records are never
    /// removed mid-scan.
    pub async fn start_scan(&self) -> crate::Result<Option<UnboundedReceiver<ScanEvent>>> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("scan already active, ignoring start request");
            return Ok(None);
        }

        let targets = match enumerate_targets(&self.config) {
            Ok(targets) => targets,
            Err(e) => {
                self.scanning.store(false, Ordering::Release);
                return Err(e);
            }
        };

        // Fresh token per scan: a previous stop must not poison this one
        let token = CancellationToken::new();
        *self.cancel.lock().unwrap() = token.clone();

        self.registry.clear().await;

        let (tx, rx) = mpsc::unbounded_channel();
        let driver = ScanDriver {
            config: self.config.clone(),
            prober: self.prober.clone(),
            registry: self.registry.clone(),
            token,
            tx,
        };
        let scanning = self.scanning.clone();

        tokio::spawn(async move {
            driver.run(targets, scanning).await;
        });

        Ok(Some(rx))
    }

    /// Cancel an in-flight scan. Idempotent; harmless when nothing is
    /// running. The active flag is released immediately so a new scan can
    /// start without waiting for abandoned units to drain — those observe
    /// the stale token and fall silent.
    pub fn stop_scan(&self) {
        let token = self.cancel.lock().unwrap();
        if !token.is_cancelled() {
            log::info!("scan cancellation requested");
        }
        token.cancel();
        self.scanning.store(false, Ordering::Release);
    }
}

/// Per-scan state moved into the driver task
struct ScanDriver {
    config: ScanConfig,
    prober: Prober,
    registry: DeviceRegistry,
    token: CancellationToken,
    tx: UnboundedSender<ScanEvent>,
}

impl ScanDriver {
    async fn run(self, targets: Vec<Ipv4Addr>, scanning: Arc<AtomicBool>) {
        let total = targets.len();
        let scanned = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let driver = Arc::new(self);

        log::info!(
            "sweeping {} hosts with {} workers",
            total,
            driver.config.workers
        );

        let mut handles = Vec::with_capacity(total);
        for ip in targets {
            let permit = tokio::select! {
                _ = driver.token.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let driver = driver.clone();
            let scanned = scanned.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                driver.scan_host(ip, &scanned, total).await;
            }));
        }

        let cancelled = tokio::select! {
            _ = driver.token.cancelled() => true,
            _ = join_all(handles) => driver.token.is_cancelled(),
        };

        let scanned_total = scanned.load(Ordering::SeqCst);
        let discovered = driver.registry.len().await;
        log::info!(
            "scan finished: {}/{} hosts, {} devices{}",
            scanned_total,
            total,
            discovered,
            if cancelled { " (cancelled)" } else { "" }
        );

        // Release the flag before emitting so a consumer reacting to the
        // completion event can start the next scan immediately. On
        // cancellation stop_scan already released it and a newer scan may
        // own it by now.
        if !cancelled {
            scanning.store(false, Ordering::Release);
        }

        // Sole emission point, so completion fires exactly once per scan
        let _ = driver.tx.send(ScanEvent::Complete {
            scanned: scanned_total,
            total,
            discovered,
            cancelled,
        });
    }

    /// One unit of work: fully account for a single host
    async fn scan_host(&self, ip: Ipv4Addr, scanned: &AtomicUsize, total: usize) {
        if !self.token.is_cancelled() && self.prober.is_reachable(ip).await {
            self.scan_ports(ip).await;
        }

        let done = scanned.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.token.is_cancelled() {
            let _ = self.tx.send(ScanEvent::Progress {
                scanned: done,
                total,
                current: format!("Probed {}", ip),
            });
        }
    }

    /// Walk candidate ports in table order; the path walk stops at the
    /// first positive per port, but remaining ports are still tried (one
    /// record per open+positive port).
    async fn scan_ports(&self, ip: Ipv4Addr) {
        for &port in &self.config.ports {
            if self.token.is_cancelled() {
                return;
            }

            if !self.prober.port_open(ip, port).await {
                continue;
            }

            log::debug!("{}:{} open, probing paths", ip, port);

            for path in &self.config.paths {
                if self.token.is_cancelled() {
                    return;
                }

                let url = format!("http://{}:{}{}", ip, port, path);
                let response = match self.prober.http_get(&url, CLASSIFY_LINE_LIMIT).await {
                    Ok(response) => response,
                    Err(_) => continue,
                };

                if classify::is_camera_response(&response) {
                    self.register_device(ip, port, path, response.status).await;
                    break;
                }
            }
        }
    }

    /// Build the record for a positive classification, enrich it, and
    /// announce it
    async fn register_device(&self, ip: Ipv4Addr, port: u16, path: &str, status: u16) {
        let mut record = DeviceRecord::network(ip, port, path);

        if let Some(brand) = fingerprint::identify(&self.prober, ip, port).await {
            log::info!(
                "{}:{} fingerprinted as {} (via {:?})",
                ip,
                port,
                brand.display_name,
                brand.evidence
            );
            record.brand = Some(brand.display_name.to_string());
        }

        if status == 401 {
            if self.config.try_default_credentials {
                self.try_default_credentials(&mut record).await;
            }
        } else {
            // Endpoint answered without demanding credentials
            record.set_authorized(true);
        }

        log::info!("discovered {}", record.display_name());
        self.registry.insert(record.clone()).await;

        if !self.token.is_cancelled() {
            let _ = self.tx.send(ScanEvent::Discovery(record));
        }
    }

    /// Exactly one well-known credential attempt against the base URL.
    /// Repeated or expanded attempts are out of scope by design.
    async fn try_default_credentials(&self, record: &mut DeviceRecord) {
        let (username, password) = DEFAULT_CREDENTIALS;
        match self
            .prober
            .http_get_basic_auth(&record.base_url(), username, password)
            .await
        {
            Ok(200) => {
                log::info!("{} accepted default credentials", record.id);
                record.credentials = Some(Credentials::new(username, password));
                record.set_authorized(true);
            }
            Ok(_) | Err(_) => {}
        }
    }
}
