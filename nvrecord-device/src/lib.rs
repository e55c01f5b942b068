// Re-export main components for easy access
pub use error::{DeviceError, Result};
pub use nvml::NvmlProbe;
pub use query::{DeviceInfo, DeviceQuery, UtilizationReading};

pub mod error;
pub mod nvml;
pub mod query;

/// Version of the nvrecord-device library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
