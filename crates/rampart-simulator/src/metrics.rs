//! Per-tick metrics, run states and observer notifications

use rampart_core::ImportanceRanking;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SimulatorError;
use crate::state::StatusCounts;

/// Controller run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No worker; the initial and final state
    #[default]
    Stopped,
    /// Worker is ticking
    Running,
    /// Worker is alive but not ticking
    Paused,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stopped => "STOPPED",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
        };
        f.write_str(label)
    }
}

/// Event that caused a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlEvent {
    /// Run started
    Started,
    /// Run paused
    Paused,
    /// Run resumed after a pause
    Resumed,
    /// Explicit stop
    Stopped,
    /// Configured duration reached
    Completed,
    /// A tick failed
    Failed,
}

/// Measurements taken after one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickMetrics {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Simulated seconds
    pub sim_time: f64,
    /// System reliability, when reporting is enabled
    pub reliability: Option<f64>,
    /// Birnbaum ranking, when reporting is enabled
    pub importance: Option<ImportanceRanking>,
    /// Operational nodes after the tick
    pub operational: usize,
    /// Degraded nodes after the tick
    pub degraded: usize,
    /// Compromised nodes after the tick
    pub compromised: usize,
    /// Failed nodes after the tick
    pub failed: usize,
    /// Events that impacted a component this tick
    pub events_fired: usize,
    /// Components repaired this tick
    #[serde(default)]
    pub repairs: usize,
}

impl TickMetrics {
    pub(crate) fn new(
        tick: u64,
        sim_time: f64,
        counts: StatusCounts,
        events_fired: usize,
        repairs: usize,
    ) -> Self {
        Self {
            tick,
            sim_time,
            reliability: None,
            importance: None,
            operational: counts.operational,
            degraded: counts.degraded,
            compromised: counts.compromised,
            failed: counts.failed,
            events_fired,
            repairs,
        }
    }
}

/// Message delivered to observers
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The controller entered `state` because of `event`
    StateChanged {
        /// What caused the change
        event: ControlEvent,
        /// State entered
        state: RunState,
    },
    /// A tick completed
    Tick(TickMetrics),
    /// A tick failed; a `StateChanged` to `Stopped` follows
    Failed {
        /// Tick that failed
        tick: u64,
        /// Why it failed
        error: SimulatorError,
    },
}

/// Receiver of controller notifications.
///
/// Callbacks run on whichever thread is dispatching, usually the worker.
/// A callback that blocks stalls every later tick; the controller does not
/// time out or isolate slow observers. Callbacks may call back into the
/// controller.
pub trait SimulationObserver: Send + Sync {
    /// Handle one notification
    fn notify(&self, notification: &Notification);
}

impl<F> SimulationObserver for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn notify(&self, notification: &Notification) {
        self(notification);
    }
}

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);
