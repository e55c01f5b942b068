//! Lifecycle tests for the sampler, driven by a fake device backend and
//! tokio's paused clock so timing is deterministic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nvrecord_core::{MonitorError, Sampler, SamplerOptions, SamplerState};
use nvrecord_device::{
    DeviceError, DeviceInfo, DeviceQuery, Result as DeviceResult, UtilizationReading,
};

struct FakeQuery {
    devices: Vec<DeviceInfo>,
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl FakeQuery {
    fn new(count: u32) -> Self {
        Self {
            devices: (0..count)
                .map(|i| DeviceInfo {
                    index: i,
                    name: format!("Fake GPU {i}"),
                })
                .collect(),
            calls: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    /// Succeeds for `ok_rounds` polling rounds, then fails every round.
    fn failing_after(count: u32, ok_rounds: usize) -> Self {
        Self {
            fail_after: Some(ok_rounds),
            ..Self::new(count)
        }
    }
}

impl DeviceQuery for FakeQuery {
    fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    fn utilization(&self, index: usize) -> DeviceResult<UtilizationReading> {
        Ok(UtilizationReading {
            gpu_percent: (index as u32 * 7) % 100,
            memory_percent: (index as u32 * 3) % 100,
        })
    }

    fn sample(&self) -> DeviceResult<Vec<UtilizationReading>> {
        let round = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_after {
            if round >= limit {
                return Err(DeviceError::Unavailable("fake backend gone".to_string()));
            }
        }
        (0..self.devices.len()).map(|i| self.utilization(i)).collect()
    }
}

fn options(interval_ms: u64) -> SamplerOptions {
    SamplerOptions {
        interval: Duration::from_millis(interval_ms),
        echo: false,
    }
}

#[tokio::test]
async fn test_stop_without_start_is_noop() {
    let mut sampler = Sampler::new(Arc::new(FakeQuery::new(1)));
    sampler.stop().await.unwrap();
    assert_eq!(sampler.state(), SamplerState::Idle);
    assert!(sampler.samples().is_empty());
}

#[tokio::test]
async fn test_wait_returns_immediately_when_idle() {
    let sampler = Sampler::new(Arc::new(FakeQuery::new(1)));
    sampler.wait_until_stopped().await;
    assert_eq!(sampler.state(), SamplerState::Idle);
}

#[tokio::test]
async fn test_start_while_running_is_rejected() {
    let mut sampler = Sampler::new(Arc::new(FakeQuery::new(1)));
    sampler.start(options(10)).unwrap();

    let err = sampler.start(options(10)).unwrap_err();
    assert!(matches!(err, MonitorError::AlreadyRunning));

    sampler.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stop_immediately_keeps_at_most_one_sample() {
    let mut sampler = Sampler::new(Arc::new(FakeQuery::new(1)));
    sampler.start(options(10)).unwrap();
    sampler.stop().await.unwrap();

    assert!(sampler.samples().len() <= 1);
    assert_eq!(sampler.state(), SamplerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_sample_count_tracks_elapsed_time() {
    let mut sampler = Sampler::new(Arc::new(FakeQuery::new(2)));
    sampler.start(options(10)).unwrap();
    tokio::time::sleep(Duration::from_millis(55)).await;
    sampler.stop().await.unwrap();

    let collected = sampler.samples().len();
    assert!(collected >= 2, "expected several ticks, got {collected}");
    assert!(collected <= 7, "expected at most 7 ticks, got {collected}");

    // A stopped session must not keep growing.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sampler.samples().len(), collected);
}

#[tokio::test(start_paused = true)]
async fn test_samples_are_in_collection_order() {
    let mut sampler = Sampler::new(Arc::new(FakeQuery::new(1)));
    sampler.start(options(10)).unwrap();
    tokio::time::sleep(Duration::from_millis(35)).await;
    sampler.stop().await.unwrap();

    let series = sampler.samples();
    for pair in series.samples().windows(2) {
        assert!(pair[0].taken_at <= pair[1].taken_at);
    }
}

#[tokio::test(start_paused = true)]
async fn test_live_snapshot_grows_while_running() {
    let mut sampler = Sampler::new(Arc::new(FakeQuery::new(1)));
    sampler.start(options(10)).unwrap();

    tokio::time::sleep(Duration::from_millis(25)).await;
    let early = sampler.samples().len();
    tokio::time::sleep(Duration::from_millis(25)).await;
    let late = sampler.samples().len();

    assert!(early >= 1);
    assert!(late >= early);

    sampler.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_restart_discards_previous_session() {
    let mut sampler = Sampler::new(Arc::new(FakeQuery::new(1)));
    sampler.start(options(10)).unwrap();
    tokio::time::sleep(Duration::from_millis(55)).await;
    sampler.stop().await.unwrap();
    let first = sampler.samples().len();
    assert!(first >= 2);

    sampler.start(options(10)).unwrap();
    sampler.stop().await.unwrap();
    assert!(sampler.samples().len() <= 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_handle_ends_session() {
    let mut sampler = Sampler::new(Arc::new(FakeQuery::new(1)));
    let handle = sampler.shutdown_handle();
    sampler.start(options(10)).unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.trigger();
    });

    sampler.wait_until_stopped().await;
    assert_eq!(sampler.state(), SamplerState::Stopped);

    // The loop has exited even though stop() has not been called yet.
    let settled = sampler.samples().len();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sampler.samples().len(), settled);

    sampler.stop().await.unwrap();
    assert_eq!(sampler.samples().len(), settled);
}

#[tokio::test(start_paused = true)]
async fn test_device_failure_ends_session_and_surfaces_on_stop() {
    let mut sampler = Sampler::new(Arc::new(FakeQuery::failing_after(1, 2)));
    sampler.start(options(10)).unwrap();

    sampler.wait_until_stopped().await;
    assert_eq!(sampler.state(), SamplerState::Stopped);

    let err = sampler.stop().await.unwrap_err();
    assert!(matches!(err, MonitorError::Device(_)));
    assert_eq!(sampler.samples().len(), 2);

    // A fresh session recovers nothing from the failed one.
    sampler.start(options(10)).unwrap();
    let err = sampler.stop().await;
    assert!(err.is_ok() || sampler.samples().len() <= 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_devices_records_time_only_samples() {
    let mut sampler = Sampler::new(Arc::new(FakeQuery::new(0)));
    sampler.start(options(10)).unwrap();
    tokio::time::sleep(Duration::from_millis(25)).await;
    sampler.stop().await.unwrap();

    let series = sampler.samples();
    assert!(series.len() >= 1);
    assert_eq!(series.column_names(), vec!["Time"]);
    assert!(series.samples().iter().all(|s| s.readings.is_empty()));
}
