//! In-memory registry of discovered devices
//!
//! Mutated only by the scan orchestrator; read by the command dispatcher and
//! report output. Inserts are keyed by `address:port`, so concurrent workers
//! normally touch distinct keys. A duplicate key (same endpoint found twice)
//! resolves last-write-wins, which is acceptable since classification is
//! deterministic.

use crate::device::DeviceRecord;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared device registry
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Arc<RwLock<HashMap<String, DeviceRecord>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record, keyed by its id
    pub async fn insert(&self, record: DeviceRecord) {
        let mut devices = self.devices.write().await;
        devices.insert(record.id.clone(), record);
    }

    pub async fn get(&self, id: &str) -> Option<DeviceRecord> {
        self.devices.read().await.get(id).cloned()
    }

    /// Snapshot of all records, sorted by id for stable output
    pub async fn all(&self) -> Vec<DeviceRecord> {
        let devices = self.devices.read().await;
        let mut records: Vec<DeviceRecord> = devices.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }

    /// Drop all records. Called when a new scan starts, never mid-scan.
    pub async fn clear(&self) {
        self.devices.write().await.clear();
    }
}
