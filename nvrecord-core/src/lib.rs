//! Core recording engine: a timer-driven GPU utilization sampler with a
//! start/stop lifecycle, CSV persistence and PNG chart rendering.

pub mod chart;
pub mod error;
pub mod export;
pub mod sample;
pub mod sampler;

pub use chart::render_time_series;
pub use error::{MonitorError, Result};
pub use export::{check_overwrite, read_table, write_series, write_table, RecordTable};
pub use sample::{
    format_timestamp, gpu_column, is_utilization_column, memory_column, parse_timestamp, Sample,
    SampleSeries, TIME_COLUMN, TIMESTAMP_FORMAT,
};
pub use sampler::{Sampler, SamplerOptions, SamplerState, ShutdownHandle, DEFAULT_INTERVAL};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
