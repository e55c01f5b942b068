//! Timer-driven sampling with a start/stop lifecycle.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use nvrecord_device::{DeviceError, DeviceQuery};

use crate::error::{MonitorError, Result};
use crate::sample::{Sample, SampleSeries};

/// Default polling interval (50ms).
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Never started.
    Idle,
    /// Background task is collecting samples.
    Running,
    /// The session ended; collected samples remain readable.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct SamplerOptions {
    /// Time between polling rounds.
    pub interval: Duration,
    /// Print each sample to stdout as it is taken.
    pub echo: bool,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            echo: false,
        }
    }
}

/// Cheap clonable handle that ends the session it was taken from. Safe to
/// trigger from signal handlers or other tasks; triggering when nothing is
/// running has no effect.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Polls a [`DeviceQuery`] on a fixed interval from a background task and
/// accumulates the readings into a [`SampleSeries`].
///
/// One session at a time: `start` on a running sampler fails, and starting
/// again after a stop discards the previous session's samples.
pub struct Sampler {
    query: Arc<dyn DeviceQuery>,
    state: Arc<RwLock<SamplerState>>,
    series: Arc<RwLock<SampleSeries>>,
    // A query failure ends the session; the error is held for `stop`.
    failure: Arc<Mutex<Option<DeviceError>>>,
    shutdown: Arc<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl Sampler {
    pub fn new(query: Arc<dyn DeviceQuery>) -> Self {
        let devices = query.devices().to_vec();
        let (shutdown, _) = watch::channel(false);
        Self {
            query,
            state: Arc::new(RwLock::new(SamplerState::Idle)),
            series: Arc::new(RwLock::new(SampleSeries::new(devices))),
            failure: Arc::new(Mutex::new(None)),
            shutdown: Arc::new(shutdown),
            task: None,
        }
    }

    /// Begin a new recording session. Must be called from within a tokio
    /// runtime; the sampling itself runs on a spawned task.
    pub fn start(&mut self, options: SamplerOptions) -> Result<()> {
        if *self.state.read() == SamplerState::Running {
            return Err(MonitorError::AlreadyRunning);
        }

        *self.series.write() = SampleSeries::new(self.query.devices().to_vec());
        *self.failure.lock() = None;

        // Reset before subscribing so a trigger from a previous session
        // cannot stop this one.
        self.shutdown.send_replace(false);
        let shutdown_rx = self.shutdown.subscribe();
        *self.state.write() = SamplerState::Running;

        info!(
            interval_ms = options.interval.as_millis() as u64,
            devices = self.query.devices().len(),
            "sampling started"
        );

        self.task = Some(tokio::spawn(Self::run_loop(
            self.query.clone(),
            self.series.clone(),
            self.state.clone(),
            self.failure.clone(),
            shutdown_rx,
            options,
        )));
        Ok(())
    }

    async fn run_loop(
        query: Arc<dyn DeviceQuery>,
        series: Arc<RwLock<SampleSeries>>,
        state: Arc<RwLock<SamplerState>>,
        failure: Arc<Mutex<Option<DeviceError>>>,
        mut shutdown_rx: watch::Receiver<bool>,
        options: SamplerOptions,
    ) {
        let devices = query.devices().to_vec();
        let interval = if options.interval.is_zero() {
            warn!("zero sampling interval requested, clamping to 1ms");
            Duration::from_millis(1)
        } else {
            options.interval
        };

        let mut ticker = tokio::time::interval(interval);
        // A late tick pushes the following ones back instead of bursting.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match query.sample() {
                        Ok(readings) => {
                            let sample = Sample::now(readings);
                            if options.echo {
                                println!("{}", sample.render_live(&devices));
                            }
                            series.write().push(sample);
                        }
                        Err(e) => {
                            error!("device query failed, ending session: {}", e);
                            *failure.lock() = Some(e);
                            break;
                        }
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }

        // Last write of the session: readers of `state` may rely on the
        // series and failure slots being settled once they observe Stopped.
        *state.write() = SamplerState::Stopped;
        debug!("sampling task exited with {} samples", series.read().len());
    }

    /// End the session and wait for the background task to finish. A no-op
    /// when nothing was started. Surfaces the device error if the session
    /// was ended by a failed query.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            debug!("stop called with no active sampling task");
            return Ok(());
        };

        self.shutdown.send_replace(true);
        if let Err(e) = task.await {
            error!("sampling task aborted: {}", e);
        }
        *self.state.write() = SamplerState::Stopped;
        info!("sampling stopped after {} samples", self.series.read().len());

        if let Some(failure) = self.failure.lock().take() {
            return Err(failure.into());
        }
        Ok(())
    }

    /// Block until the current session is no longer running. Returns
    /// immediately when nothing is running.
    pub async fn wait_until_stopped(&self) {
        while *self.state.read() == SamplerState::Running {
            tokio::time::sleep(STOP_POLL_INTERVAL).await;
        }
    }

    /// Handle for ending the session from another task. The handle only
    /// affects a session that is running when it fires.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown.clone(),
        }
    }

    pub fn state(&self) -> SamplerState {
        *self.state.read()
    }

    /// Snapshot of the samples collected so far. Safe to call while the
    /// session is running.
    pub fn samples(&self) -> SampleSeries {
        self.series.read().clone()
    }
}
