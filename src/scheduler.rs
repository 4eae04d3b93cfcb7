//! Periodic driver for collection passes.
//!
//! The scheduler owns one background task. Passes run back to back on that
//! task and never overlap; a tick that comes due while a pass is running is
//! delayed until it finishes. Stopping only prevents future passes.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collector::Collector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("scheduler already started")]
    AlreadyStarted,

    #[error("scheduler has been stopped")]
    Stopped,

    #[error("collection interval must be greater than zero")]
    ZeroInterval,
}

pub struct Scheduler {
    collector: Arc<Collector>,
    state: Mutex<SchedulerState>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(collector: Arc<Collector>) -> Self {
        Self {
            collector,
            state: Mutex::new(SchedulerState::Idle),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(SchedulerState::Stopped)
    }

    pub fn collector(&self) -> &Arc<Collector> {
        &self.collector
    }

    /// Runs one pass to completion, then starts the periodic task.
    ///
    /// Only the first call on an idle scheduler does anything.
    pub async fn start(&self, interval: Duration) -> Result<(), SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| SchedulerError::Stopped)?;
            match *state {
                SchedulerState::Idle => *state = SchedulerState::Running,
                SchedulerState::Running => {
                    warn!("Scheduler start requested while already running");
                    return Err(SchedulerError::AlreadyStarted);
                }
                SchedulerState::Stopped => {
                    warn!("Scheduler start requested after stop");
                    return Err(SchedulerError::Stopped);
                }
            }
        }

        info!("Running initial collection pass");
        self.collector.run_cycle().await;

        if self.cancel.is_cancelled() {
            debug!("Scheduler stopped during initial pass, not spawning periodic task");
            return Ok(());
        }

        let collector = Arc::clone(&self.collector);
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        collector.run_cycle().await;
                    }
                }
            }
            debug!("Periodic collection task finished");
        });

        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
        info!("Periodic collection started (every {:?})", interval);
        Ok(())
    }

    /// Prevents further passes. Safe to call repeatedly and before `start`.
    pub fn stop(&self) {
        if let Ok(mut state) = self.state.lock() {
            if *state != SchedulerState::Stopped {
                info!("Stopping periodic collection");
            }
            *state = SchedulerState::Stopped;
        }
        self.cancel.cancel();
    }

    /// Stops the scheduler and waits for an in-flight pass to finish.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Collection task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
