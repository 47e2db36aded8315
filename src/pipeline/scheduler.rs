// src/pipeline/scheduler.rs

//! Fixed-interval driver for a [`Job`].
//!
//! The scheduler runs the job once inline at startup, then registers a
//! recurring timer and runs the job on every tick until the shutdown future
//! resolves or a job panics. Cycles run on the scheduler's own task, so two
//! cycles never overlap; ticks missed while a cycle overran are skipped.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::pipeline::{CycleReport, Job};

/// Smallest accepted interval; tokio rejects a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    ShuttingDown,
    Stopped,
}

/// Why the scheduler stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Operator interrupt or termination request
    Interrupted,
    /// Something went wrong inside the scheduler loop
    Fault(String),
}

/// Owns the recurring timer and its lifecycle state.
pub struct Scheduler {
    interval: Duration,
    state: SchedulerState,
    ticker: Option<Interval>,
    cycles: u64,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            state: SchedulerState::Idle,
            ticker: None,
            cycles: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Whether the recurring job is currently registered.
    pub fn is_registered(&self) -> bool {
        self.ticker.is_some()
    }

    /// Completed job cycles, the startup run included.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Drive `job` until `shutdown` resolves or a cycle panics.
    ///
    /// Cleanup runs on every exit path. A scheduler can only be run once.
    pub async fn run<J, S>(&mut self, job: &J, shutdown: S) -> StopReason
    where
        J: Job + ?Sized,
        S: Future<Output = StopReason>,
    {
        if self.state != SchedulerState::Idle {
            log::error!("Scheduler: run called in state {:?}", self.state);
            return StopReason::Fault(format!("scheduler already in state {:?}", self.state));
        }

        self.state = SchedulerState::Running;
        let reason = self.run_until_stopped(job, shutdown).await;
        match &reason {
            StopReason::Interrupted => log::info!("Scheduler stopped by user"),
            StopReason::Fault(message) => log::error!("Scheduler encountered an error: {message}"),
        }
        self.shutdown();
        reason
    }

    async fn run_until_stopped<J, S>(&mut self, job: &J, shutdown: S) -> StopReason
    where
        J: Job + ?Sized,
        S: Future<Output = StopReason>,
    {
        log::info!("Scheduler: Performing initial run on startup");
        if let Err(reason) = self.run_cycle(job).await {
            return reason;
        }

        self.register();
        log::info!(
            "Scheduler started. Trends will be fetched every {}s. Press Ctrl+C to exit.",
            self.interval.as_secs_f64()
        );

        tokio::pin!(shutdown);
        loop {
            let Some(ticker) = self.ticker.as_mut() else {
                return StopReason::Fault("recurring job is not registered".to_string());
            };

            tokio::select! {
                biased;
                reason = &mut shutdown => return reason,
                _ = ticker.tick() => {}
            }

            if let Err(reason) = self.run_cycle(job).await {
                return reason;
            }
        }
    }

    async fn run_cycle<J: Job + ?Sized>(&mut self, job: &J) -> Result<CycleReport, StopReason> {
        match AssertUnwindSafe(job.run()).catch_unwind().await {
            Ok(report) => {
                self.cycles += 1;
                log::debug!("Scheduler: cycle {} finished: {:?}", self.cycles, report);
                Ok(report)
            }
            Err(panic) => Err(StopReason::Fault(format!(
                "job panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    }

    fn register(&mut self) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);
    }

    fn shutdown(&mut self) {
        self.state = SchedulerState::ShuttingDown;
        if self.ticker.take().is_some() {
            log::info!("Scheduler: recurring job deregistered");
        }
        self.state = SchedulerState::Stopped;
        log::info!("Scheduler shutdown complete");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Resolve on Ctrl+C, or SIGTERM on Unix.
///
/// Handlers are installed when this is called, not when the future is first
/// polled, so a signal arriving during the startup run is not lost.
pub fn shutdown_signal() -> impl Future<Output = StopReason> {
    let installed = signals::install();
    async move {
        match installed {
            Ok(signals) => signals.wait().await,
            Err(e) => StopReason::Fault(format!("failed to install signal handlers: {e}")),
        }
    }
}

#[cfg(unix)]
mod signals {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    use super::StopReason;

    pub struct Signals {
        interrupt: Signal,
        terminate: Signal,
    }

    pub fn install() -> std::io::Result<Signals> {
        Ok(Signals {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    impl Signals {
        pub async fn wait(mut self) -> StopReason {
            tokio::select! {
                _ = self.interrupt.recv() => log::info!("Received Ctrl+C, shutting down..."),
                _ = self.terminate.recv() => log::info!("Received SIGTERM, shutting down..."),
            }
            StopReason::Interrupted
        }
    }
}

#[cfg(not(unix))]
mod signals {
    use super::StopReason;

    pub struct Signals;

    pub fn install() -> std::io::Result<Signals> {
        Ok(Signals)
    }

    impl Signals {
        pub async fn wait(self) -> StopReason {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    log::info!("Received Ctrl+C, shutting down...");
                    StopReason::Interrupted
                }
                Err(e) => StopReason::Fault(format!("failed to listen for Ctrl+C: {e}")),
            }
        }
    }
}
