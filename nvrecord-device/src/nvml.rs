use nvml_wrapper::{Device as NvmlDevice, Nvml};
use tracing::{info, warn};

use crate::error::{DeviceError, Result};
use crate::query::{DeviceInfo, DeviceQuery, UtilizationReading};

/// NVML-backed device probe.
///
/// Initializes NVML once, enumerates every device in index order and caches
/// the device identities. Utilization queries go straight to the driver; any
/// failure is propagated, since a session cannot meaningfully continue with
/// a subset of its devices.
pub struct NvmlProbe {
    nvml: Nvml,
    devices: Vec<NvmlDevice<'static>>,
    info: Vec<DeviceInfo>,
}

impl NvmlProbe {
    /// Initialize NVML and enumerate all devices.
    pub fn new() -> Result<Self> {
        info!("Initializing NVML for utilization sampling");

        let nvml = Nvml::init().map_err(|e| {
            warn!("Failed to initialize NVML: {}", e);
            e
        })?;

        let device_count = nvml.device_count()?;
        let driver = nvml.sys_driver_version().unwrap_or_else(|_| "unknown".to_string());
        info!("NVML found {} GPU(s), driver {}", device_count, driver);

        let mut devices = Vec::new();
        let mut info = Vec::new();
        for i in 0..device_count {
            let device = nvml.device_by_index(i)?;
            let name = device.name()?;
            // We need to leak the device to get 'static lifetime.
            // This is safe as we keep the Nvml instance alive for as long as
            // the handles, and the handles never leave this struct.
            let device: NvmlDevice<'static> = unsafe { std::mem::transmute(device) };
            info.push(DeviceInfo { index: i, name });
            devices.push(device);
        }

        Ok(Self { nvml, devices, info })
    }

    /// Driver version string, for startup reporting.
    pub fn driver_version(&self) -> Result<String> {
        Ok(self.nvml.sys_driver_version()?)
    }

    /// Number of enumerated devices.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

impl DeviceQuery for NvmlProbe {
    fn devices(&self) -> &[DeviceInfo] {
        &self.info
    }

    fn utilization(&self, index: usize) -> Result<UtilizationReading> {
        let device = self
            .devices
            .get(index)
            .ok_or(DeviceError::InvalidIndex(index))?;

        let rates = device.utilization_rates()?;
        Ok(UtilizationReading {
            gpu_percent: rates.gpu,
            memory_percent: rates.memory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nvml_probe() {
        // This test will only exercise real queries on systems with NVIDIA GPUs
        match NvmlProbe::new() {
            Ok(probe) => {
                assert_eq!(probe.device_count(), probe.devices().len());
                let readings = probe.sample().expect("sampling enumerated devices");
                assert_eq!(readings.len(), probe.device_count());
                for (device, reading) in probe.devices().iter().zip(&readings) {
                    println!(
                        "GPU {} {}: gpu {}%, mem {}%",
                        device.index, device.name, reading.gpu_percent, reading.memory_percent
                    );
                }
            }
            Err(e) => {
                println!("NVML not available: {}", e);
            }
        }
    }

    #[test]
    fn test_invalid_index() {
        if let Ok(probe) = NvmlProbe::new() {
            let out_of_range = probe.device_count();
            assert!(matches!(
                probe.utilization(out_of_range),
                Err(DeviceError::InvalidIndex(_))
            ));
        }
    }
}
