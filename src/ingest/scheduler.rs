// src/ingest/scheduler.rs
//! The single repeating mining task.
//!
//! `Idle --start--> Running --stop--> Stopping --loop exits--> Idle`
//!
//! Cancellation is cooperative: the loop checks a watch channel before each
//! source and races it against the sleep between cycles. An in-flight fetch
//! always completes first.
//!
//! `start` during `Stopping` re-arms: a fresh loop is spawned right away and
//! waits on the cycle lock, so it only begins once the cancelled loop has
//! left its cycle.

use metrics::gauge;
use serde::Serialize;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{MinerError, Result};
use crate::ingest::types::CycleReport;
use crate::ingest::Pipeline;

/// Upper bound for the sleep between cycles (one year).
pub const MAX_INTERVAL_HOURS: f64 = 24.0 * 365.0;

/// Accept finite intervals in `(0, MAX_INTERVAL_HOURS]`.
pub fn validate_interval(hours: f64) -> Result<f64> {
    if hours.is_finite() && hours > 0.0 && hours <= MAX_INTERVAL_HOURS {
        Ok(hours)
    } else {
        Err(MinerError::Validation(format!(
            "interval must be within (0, {MAX_INTERVAL_HOURS}] hours, got {hours}"
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningPhase {
    Idle,
    Running,
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    /// Started while the previous loop was still winding down.
    Restarted,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Stopping,
    NotRunning,
}

#[derive(Debug)]
struct State {
    phase: MiningPhase,
    generation: u64,
    cancel: Option<watch::Sender<bool>>,
}

struct Inner {
    pipeline: Pipeline,
    state: Mutex<State>,
    interval_hours: RwLock<f64>,
    // Held for the duration of a cycle, by the loop or by `run_once`.
    cycle: tokio::sync::Mutex<()>,
}

impl Inner {
    /// Move back to Idle unless a newer loop has taken over.
    fn finish(&self, generation: u64) {
        let mut st = self.state.lock().expect("scheduler mutex poisoned");
        if st.generation == generation {
            st.phase = MiningPhase::Idle;
            st.cancel = None;
        }
    }

    fn interval_hours(&self) -> f64 {
        *self.interval_hours.read().expect("interval rwlock poisoned")
    }
}

/// Resets the phase even if the loop task panics.
struct FinishGuard {
    inner: Arc<Inner>,
    generation: u64,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.inner.finish(self.generation);
    }
}

/// Cloneable control handle: `start`, `stop`, `is_running`, `set_interval`.
#[derive(Clone)]
pub struct MiningScheduler {
    inner: Arc<Inner>,
}

impl MiningScheduler {
    pub fn new(pipeline: Pipeline, interval_hours: f64) -> Result<Self> {
        let interval_hours = validate_interval(interval_hours)?;
        gauge!("mining_interval_hours").set(interval_hours);
        Ok(Self {
            inner: Arc::new(Inner {
                pipeline,
                state: Mutex::new(State {
                    phase: MiningPhase::Idle,
                    generation: 0,
                    cancel: None,
                }),
                interval_hours: RwLock::new(interval_hours),
                cycle: tokio::sync::Mutex::new(()),
            }),
        })
    }

    /// Spawn the loop unless one already exists. Must be called inside a
    /// Tokio runtime.
    pub fn start(&self) -> StartOutcome {
        let mut st = self.inner.state.lock().expect("scheduler mutex poisoned");
        let outcome = match st.phase {
            MiningPhase::Running => return StartOutcome::AlreadyRunning,
            MiningPhase::Stopping => StartOutcome::Restarted,
            MiningPhase::Idle => StartOutcome::Started,
        };

        // Replacing the sender leaves the old loop cancelled; its guard no
        // longer matches the generation and will not reset the phase.
        let (tx, rx) = watch::channel(false);
        st.generation += 1;
        st.phase = MiningPhase::Running;
        st.cancel = Some(tx);

        let guard = FinishGuard {
            inner: Arc::clone(&self.inner),
            generation: st.generation,
        };
        tokio::spawn(async move {
            run_loop(&guard.inner, rx).await;
            drop(guard);
        });

        info!(target: "mining", ?outcome, "mining started");
        outcome
    }

    /// Signal cancellation and return without waiting for the loop.
    pub fn stop(&self) -> StopOutcome {
        let mut st = self.inner.state.lock().expect("scheduler mutex poisoned");
        if st.phase != MiningPhase::Running {
            return StopOutcome::NotRunning;
        }
        if let Some(tx) = &st.cancel {
            // Receiver gone means the loop already exited.
            let _ = tx.send(true);
        }
        st.phase = MiningPhase::Stopping;
        info!(target: "mining", "mining stop requested");
        StopOutcome::Stopping
    }

    pub fn phase(&self) -> MiningPhase {
        self.inner.state.lock().expect("scheduler mutex poisoned").phase
    }

    pub fn is_running(&self) -> bool {
        self.phase() == MiningPhase::Running
    }

    pub fn interval_hours(&self) -> f64 {
        self.inner.interval_hours()
    }

    /// Takes effect at the next sleep; the in-flight cycle is unaffected.
    pub fn set_interval(&self, hours: f64) -> Result<()> {
        let hours = validate_interval(hours)?;
        *self
            .inner
            .interval_hours
            .write()
            .expect("interval rwlock poisoned") = hours;
        gauge!("mining_interval_hours").set(hours);
        info!(target: "mining", interval_hours = hours, "mining interval updated");
        Ok(())
    }

    /// Run a single cycle now, outside the loop. Refused while another cycle
    /// is in progress.
    pub async fn run_once(&self) -> Result<CycleReport> {
        let _cycle = self
            .inner
            .cycle
            .try_lock()
            .map_err(|_| MinerError::Busy("a mining cycle is already in progress".into()))?;
        self.inner.pipeline.run_cycle(|| false).await
    }
}

async fn run_loop(inner: &Inner, mut cancel: watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            break;
        }

        {
            let _cycle = inner.cycle.lock().await;
            info!(target: "mining", "mining cycle starting");
            let rx = &cancel;
            if let Err(e) = inner.pipeline.run_cycle(|| *rx.borrow()).await {
                warn!(target: "mining", error = %e, "mining cycle aborted");
            }
        }

        if *cancel.borrow() {
            break;
        }

        // Read at sleep time so a live update applies to this sleep.
        let hours = inner.interval_hours();
        let pause =
            Duration::try_from_secs_f64(hours * 3600.0).unwrap_or(Duration::from_secs(3600));
        info!(target: "mining", interval_hours = hours, "cycle done; sleeping");

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            changed = cancel.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    info!(target: "mining", "mining loop stopped");
}
