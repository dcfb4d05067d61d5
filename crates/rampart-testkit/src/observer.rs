//! Observer that records every notification

use parking_lot::Mutex;
use rampart_simulator::{Notification, RunState, SimulationObserver, TickMetrics};

/// Collects controller notifications for later assertions
#[derive(Debug, Default)]
pub struct RecordingObserver {
    received: Mutex<Vec<Notification>>,
}

impl RecordingObserver {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, in delivery order
    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    /// States entered, in order
    pub fn states(&self) -> Vec<RunState> {
        self.received
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::StateChanged { state, .. } => Some(*state),
                _ => None,
            })
            .collect()
    }

    /// Metrics of every delivered tick
    pub fn ticks(&self) -> Vec<TickMetrics> {
        self.received
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Tick(metrics) => Some(metrics.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of delivered ticks
    pub fn tick_count(&self) -> usize {
        self.received
            .lock()
            .iter()
            .filter(|n| matches!(n, Notification::Tick(_)))
            .count()
    }

    /// Failure notifications as `(tick, message)`
    pub fn failures(&self) -> Vec<(u64, String)> {
        self.received
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Failed { tick, error } => Some((*tick, error.to_string())),
                _ => None,
            })
            .collect()
    }

    /// Forget everything received
    pub fn clear(&self) {
        self.received.lock().clear();
    }
}

impl SimulationObserver for RecordingObserver {
    fn notify(&self, notification: &Notification) {
        self.received.lock().push(notification.clone());
    }
}
