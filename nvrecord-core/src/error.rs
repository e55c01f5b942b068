use std::path::PathBuf;

use thiserror::Error;

use nvrecord_device::DeviceError;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("sampler is already running")]
    AlreadyRunning,

    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("no records to export")]
    EmptySeries,

    #[error("need at least 2 points to plot, got {0}")]
    TooFewPoints(usize),

    #[error("the file '{}' already exists; use --force-overwrite to overwrite it", .0.display())]
    OutputExists(PathBuf),

    #[error("column '{0}' not found in input")]
    MissingColumn(String),

    #[error("non-numeric value '{value}' in column '{column}'")]
    NonNumeric { column: String, value: String },

    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chart rendering failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
