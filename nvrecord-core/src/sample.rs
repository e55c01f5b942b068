//! Sample data model shared by the sampler, the exporter and the CLI.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use nvrecord_device::{DeviceInfo, UtilizationReading};

use crate::error::Result;
use crate::export::RecordTable;

/// Header of the timestamp column in exported files.
pub const TIME_COLUMN: &str = "Time";

/// Timestamps are written with microsecond precision so that sub-second
/// sampling intervals stay distinguishable in the output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// Lenient on read: accepts any sub-second precision, including none.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    Ok(NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_PARSE_FORMAT)?)
}

/// Column header for a device's GPU engine utilization.
pub fn gpu_column(device: &DeviceInfo) -> String {
    format!("GPU {} {} gpu utilization", device.index, device.name)
}

/// Column header for a device's memory controller utilization.
pub fn memory_column(device: &DeviceInfo) -> String {
    format!("GPU {} {} memory utilization", device.index, device.name)
}

/// Whether a column header names a utilization series (as opposed to the
/// timestamp column or anything else a hand-edited file may contain).
pub fn is_utilization_column(name: &str) -> bool {
    name.ends_with(" gpu utilization") || name.ends_with(" memory utilization")
}

/// One polling round: a wall-clock timestamp plus one reading per device,
/// in device enumeration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub taken_at: NaiveDateTime,
    pub readings: Vec<UtilizationReading>,
}

impl Sample {
    pub fn new(taken_at: NaiveDateTime, readings: Vec<UtilizationReading>) -> Self {
        Self { taken_at, readings }
    }

    /// Stamp a set of readings with the current local time.
    pub fn now(readings: Vec<UtilizationReading>) -> Self {
        Self::new(Local::now().naive_local(), readings)
    }

    /// Single-line rendition for live console output.
    pub fn render_live(&self, devices: &[DeviceInfo]) -> String {
        let mut line = format_timestamp(self.taken_at);
        for (device, reading) in devices.iter().zip(&self.readings) {
            line.push_str(&format!(
                " | GPU {} {}: gpu {}% mem {}%",
                device.index, device.name, reading.gpu_percent, reading.memory_percent
            ));
        }
        line
    }
}

/// An ordered recording session: the device set it was taken against and
/// the samples in collection order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSeries {
    devices: Vec<DeviceInfo>,
    samples: Vec<Sample>,
}

impl SampleSeries {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices,
            samples: Vec::new(),
        }
    }

    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn push(&mut self, sample: Sample) {
        debug_assert_eq!(sample.readings.len(), self.devices.len());
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.samples.first().map(|s| s.taken_at)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.samples.last().map(|s| s.taken_at)
    }

    /// Export header row: the timestamp column followed by a gpu and a
    /// memory utilization column per device, in enumeration order.
    pub fn column_names(&self) -> Vec<String> {
        std::iter::once(TIME_COLUMN.to_string())
            .chain(
                self.devices
                    .iter()
                    .flat_map(|d| [gpu_column(d), memory_column(d)]),
            )
            .collect()
    }

    /// Flatten into a stringly table, one row per sample. Row cells line up
    /// with [`column_names`](Self::column_names) by construction.
    pub fn to_table(&self) -> RecordTable {
        let mut table = RecordTable::new(self.column_names());
        for sample in &self.samples {
            let mut row = Vec::with_capacity(1 + self.devices.len() * 2);
            row.push(format_timestamp(sample.taken_at));
            for reading in &sample.readings {
                row.push(reading.gpu_percent.to_string());
                row.push(reading.memory_percent.to_string());
            }
            table.push_row(row);
        }
        table
    }
}
