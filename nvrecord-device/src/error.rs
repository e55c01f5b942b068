use thiserror::Error;

/// Device query error types
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("NVML error: {0}")]
    Nvml(#[from] nvml_wrapper::error::NvmlError),

    #[error("device index {0} out of range")]
    InvalidIndex(usize),

    #[error("device unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
