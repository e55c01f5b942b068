use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identity of one enumerated GPU, fixed for the lifetime of a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// NVML device index
    pub index: u32,
    /// Device name as reported by the driver
    pub name: String,
}

/// One device's utilization percentages at a single point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilizationReading {
    /// Compute utilization (percent, 0-100)
    pub gpu_percent: u32,
    /// Memory utilization (percent, 0-100)
    pub memory_percent: u32,
}

/// Boundary to the GPU telemetry backend.
///
/// Implementors enumerate devices once at construction; `devices()` returns
/// that fixed, index-ordered set for the life of the value. A query failure
/// is fatal to the caller's sampling session, so implementations propagate
/// errors rather than degrade to partial results.
pub trait DeviceQuery: Send + Sync {
    /// The enumerated devices, in index order.
    fn devices(&self) -> &[DeviceInfo];

    /// Current utilization of the device at `index` (enumeration order).
    fn utilization(&self, index: usize) -> Result<UtilizationReading>;

    /// Current utilization of every enumerated device, in order.
    fn sample(&self) -> Result<Vec<UtilizationReading>> {
        (0..self.devices().len())
            .map(|i| self.utilization(i))
            .collect()
    }
}
