//! Liveness Monitor
//!
//! Periodically probes the backend health endpoint and maintains the
//! tri-state badge value shown by the console. A probe cycle retries a
//! fixed number of times before counting as failed, and the visible status
//! only flips to `Down` after consecutive failed cycles, so transient blips
//! do not flap the badge.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};

use crate::error::MonitorError;

use super::probe::HealthProbe;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the liveness monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Attempts per probe cycle
    pub max_attempts: u32,

    /// Delay between attempts within a cycle (none after the last)
    pub retry_delay: Duration,

    /// Consecutive failed cycles before the status flips to `Down`
    pub failure_threshold: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
            failure_threshold: 2,
        }
    }
}

// ============================================================================
// Status
// ============================================================================

/// Tri-state liveness value rendered as the console badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LivenessStatus {
    /// No probe cycle has completed yet
    Unknown,

    /// The backend answered healthy
    Up,

    /// Consecutive cycle failures reached the threshold
    Down,
}

impl LivenessStatus {
    /// Check if the backend is known to be reachable
    pub fn is_up(&self) -> bool {
        matches!(self, LivenessStatus::Up)
    }

    /// Check if at least one probe cycle has completed
    pub fn is_known(&self) -> bool {
        !matches!(self, LivenessStatus::Unknown)
    }
}

/// Summary of one completed probe cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// An attempt succeeded; holds the 1-based index of the winning attempt
    Up {
        /// Attempt that succeeded
        attempt: u32,
    },

    /// Every attempt failed; holds the post-increment consecutive count
    Exhausted {
        /// Consecutive failed cycles including this one
        consecutive_failures: u32,
    },

    /// The result was discarded because `stop()` was called mid-cycle
    Discarded,
}

// ============================================================================
// Monitor
// ============================================================================

struct MonitorState {
    status: LivenessStatus,
    consecutive_cycle_failures: u32,
}

struct Runner {
    shutdown: broadcast::Sender<()>,
    #[allow(dead_code)]
    task: JoinHandle<()>,
}

struct Inner {
    config: MonitorConfig,

    probe: Arc<dyn HealthProbe>,

    state: RwLock<MonitorState>,

    /// Set by `stop()` before the run task observes shutdown, so an
    /// in-flight cycle can never apply its result afterwards
    stopped: AtomicBool,

    /// Bumped on every `start()`. A cycle captures the epoch when it begins
    /// and only applies its result if the epoch is unchanged, so a cycle
    /// left in flight by a stopped run can never mutate a restarted run's
    /// state.
    epoch: AtomicU64,

    runner: Mutex<Option<Runner>>,
}

/// Background monitor for backend liveness
///
/// Cheap to clone; clones share the same state and timer. Two separately
/// constructed monitors are fully independent with no probe deduplication.
#[derive(Clone)]
pub struct LivenessMonitor {
    inner: Arc<Inner>,
}

impl LivenessMonitor {
    /// Create a monitor over a probe
    pub fn new(config: MonitorConfig, probe: Arc<dyn HealthProbe>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                probe,
                state: RwLock::new(MonitorState {
                    status: LivenessStatus::Unknown,
                    consecutive_cycle_failures: 0,
                }),
                stopped: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                runner: Mutex::new(None),
            }),
        }
    }

    /// Create with default configuration
    pub fn with_probe(probe: Arc<dyn HealthProbe>) -> Self {
        Self::new(MonitorConfig::default(), probe)
    }

    /// Current badge value
    pub fn status(&self) -> LivenessStatus {
        self.inner.state.read().status
    }

    /// Fully-failed cycles since the last success
    pub fn consecutive_cycle_failures(&self) -> u32 {
        self.inner.state.read().consecutive_cycle_failures
    }

    /// Check whether the polling task is active
    pub fn is_running(&self) -> bool {
        self.inner.runner.lock().is_some()
    }

    /// Run one probe cycle: up to `max_attempts` sequential attempts with a
    /// fixed delay between them, stopping early on the first success.
    ///
    /// Failures never propagate to the caller; they are absorbed into the
    /// status and failure count.
    pub async fn run_probe_cycle(&self) -> CycleOutcome {
        self.inner.run_probe_cycle().await
    }

    /// Start polling: one cycle immediately, then one per `poll_interval`.
    ///
    /// Returns [`MonitorError::AlreadyRunning`] if a polling task already
    /// exists; exactly one run task is ever active per monitor.
    pub fn start(&self, poll_interval: Duration) -> Result<(), MonitorError> {
        let mut runner = self.inner.runner.lock();
        if runner.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        self.inner.stopped.store(false, Ordering::SeqCst);
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            inner.run(shutdown_rx, poll_interval).await;
        });

        *runner = Some(Runner {
            shutdown: shutdown_tx,
            task,
        });

        tracing::info!(
            poll_interval_ms = poll_interval.as_millis() as u64,
            "Liveness monitor started"
        );
        Ok(())
    }

    /// Stop polling. No-op when not running.
    ///
    /// The pending timer is cancelled; a cycle already in flight may finish
    /// but its result is discarded, so no status mutation happens after this
    /// returns.
    pub fn stop(&self) {
        let Some(runner) = self.inner.runner.lock().take() else {
            tracing::debug!("Stop called while not running");
            return;
        };

        self.inner.stopped.store(true, Ordering::SeqCst);
        let _ = runner.shutdown.send(());
        tracing::info!("Liveness monitor stopping");
    }
}

impl Inner {
    async fn run_probe_cycle(&self) -> CycleOutcome {
        let epoch = self.epoch.load(Ordering::SeqCst);

        for attempt in 1..=self.config.max_attempts {
            match self.probe.check().await {
                Ok(()) => return self.apply_success(epoch, attempt),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.config.max_attempts,
                        error = %e,
                        "Probe attempt failed"
                    );
                    if attempt < self.config.max_attempts {
                        sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        self.apply_cycle_failure(epoch)
    }

    /// A cycle's result is void once `stop()` has been called or once a
    /// newer run has started
    fn cancelled(&self, epoch: u64) -> bool {
        self.stopped.load(Ordering::SeqCst) || self.epoch.load(Ordering::SeqCst) != epoch
    }

    fn apply_success(&self, epoch: u64, attempt: u32) -> CycleOutcome {
        if self.cancelled(epoch) {
            return CycleOutcome::Discarded;
        }

        let mut state = self.state.write();
        let previous = state.status;
        state.status = LivenessStatus::Up;
        state.consecutive_cycle_failures = 0;
        drop(state);

        if previous != LivenessStatus::Up {
            tracing::info!(previous = ?previous, attempt, "Backend is up");
        }
        CycleOutcome::Up { attempt }
    }

    fn apply_cycle_failure(&self, epoch: u64) -> CycleOutcome {
        if self.cancelled(epoch) {
            return CycleOutcome::Discarded;
        }

        let mut state = self.state.write();
        state.consecutive_cycle_failures += 1;
        let consecutive_failures = state.consecutive_cycle_failures;

        // The threshold is compared against the post-increment count: the
        // cycle that reaches it flips the status, not the one after it. A
        // single isolated cycle failure leaves the status untouched.
        if consecutive_failures >= self.config.failure_threshold
            && state.status != LivenessStatus::Down
        {
            state.status = LivenessStatus::Down;
            drop(state);
            tracing::error!(consecutive_failures, "Backend is down");
        }

        CycleOutcome::Exhausted {
            consecutive_failures,
        }
    }

    async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>, poll_interval: Duration) {
        let mut ticker = interval(poll_interval);
        // A cycle that outlasts the interval skips the overdue tick instead
        // of running catch-up cycles back to back
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = shutdown.recv() => {
                    match result {
                        Ok(()) | Err(broadcast::error::RecvError::Closed) => {
                            tracing::debug!("Liveness monitor received shutdown signal");
                            break;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::debug!(missed = n, "Liveness monitor receiver lagged");
                        }
                    }
                }

                _ = ticker.tick() => {
                    match self.run_probe_cycle().await {
                        CycleOutcome::Up { attempt } => {
                            tracing::debug!(attempt, "Probe cycle succeeded");
                        }
                        CycleOutcome::Exhausted { consecutive_failures } => {
                            tracing::warn!(
                                consecutive_failures,
                                "Probe cycle exhausted all attempts"
                            );
                        }
                        CycleOutcome::Discarded => break,
                    }
                }
            }
        }

        tracing::info!("Liveness monitor stopped");
    }
}

// ============================================================================
// Tests
// ============================================================================
