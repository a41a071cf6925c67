//! camsweep - LAN camera discovery and control
//!
//! Sweeps the local /24 for IP cameras with a bounded worker pool,
//! classifies endpoints by heuristic fingerprinting, and dispatches
//! vendor-specific PTZ/snapshot/reboot commands over authenticated HTTP.

pub mod classify;
pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod fingerprint;
pub mod output;
pub mod probe;
pub mod registry;
pub mod scanner;

// Re-export commonly used types
pub use command::{CameraCommand, CommandDispatcher};
pub use config::ScanConfig;
pub use device::{Credentials, DeviceKind, DeviceRecord};
pub use error::{ScanError, ScanResult};
pub use registry::DeviceRegistry;
pub use scanner::{ScanEvent, ScanOrchestrator};

pub type Result<T> = std::result::Result<T, ScanError>;
