//! Simulation sessions and checkpoints
//!
//! A session is created when a run starts, mutated only by the tick loop,
//! and finalised when the run stops. Readers get clones, never a live
//! reference.

use rampart_core::{durbin_watson, DurbinWatson};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::errors::{Result, SimulatorError};
use crate::events::EventRecord;
use crate::metrics::TickMetrics;
use crate::state::NetworkState;

/// State of one run
#[derive(Debug, Clone)]
pub struct SimulationSession {
    id: Uuid,
    seed: u64,
    tick: u64,
    sim_time: f64,
    state: NetworkState,
    events: Vec<EventRecord>,
    metrics: Vec<TickMetrics>,
    pause_count: u32,
    paused_total: Duration,
    paused_since: Option<Instant>,
    started_at: Instant,
    finished_at: Option<Instant>,
    resumed_from: Option<u64>,
}

impl SimulationSession {
    /// Fresh session at tick 0
    pub fn new(seed: u64, state: NetworkState) -> Self {
        Self {
            id: Uuid::new_v4(),
            seed,
            tick: 0,
            sim_time: 0.0,
            state,
            events: Vec::new(),
            metrics: Vec::new(),
            pause_count: 0,
            paused_total: Duration::ZERO,
            paused_since: None,
            started_at: Instant::now(),
            finished_at: None,
            resumed_from: None,
        }
    }

    /// Session continuing from a checkpoint. Its event and metric logs start
    /// empty.
    pub fn from_checkpoint(checkpoint: SessionCheckpoint) -> Self {
        let mut session = Self::new(checkpoint.seed, checkpoint.state);
        session.tick = checkpoint.tick;
        session.sim_time = checkpoint.sim_time;
        session.resumed_from = Some(checkpoint.tick);
        session
    }

    /// Unique id of this session
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Seed the event generator started from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Ticks completed
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds elapsed
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Current network state
    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut NetworkState {
        &mut self.state
    }

    /// Append-only event log
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Metrics of every tick, in order
    pub fn metrics(&self) -> &[TickMetrics] {
        &self.metrics
    }

    /// Tick a restored session started after
    pub fn resumed_from(&self) -> Option<u64> {
        self.resumed_from
    }

    pub(crate) fn record_events(&mut self, records: Vec<EventRecord>) {
        self.events.extend(records);
    }

    /// Close a tick: advances the tick counter and simulated time
    pub(crate) fn record_metrics(&mut self, metrics: TickMetrics) {
        self.tick = metrics.tick;
        self.sim_time = metrics.sim_time;
        self.metrics.push(metrics);
    }

    /// Number of times the run was paused
    pub fn pause_count(&self) -> u32 {
        self.pause_count
    }

    /// Wall time spent paused, including a pause still in progress
    pub fn paused_duration(&self) -> Duration {
        self.paused_total + self.paused_since.map_or(Duration::ZERO, |t| t.elapsed())
    }

    pub(crate) fn mark_paused(&mut self) {
        self.pause_count += 1;
        self.paused_since = Some(Instant::now());
    }

    pub(crate) fn mark_resumed(&mut self) {
        if let Some(since) = self.paused_since.take() {
            self.paused_total += since.elapsed();
        }
    }

    pub(crate) fn finalize(&mut self) {
        self.mark_resumed();
        self.finished_at.get_or_insert_with(Instant::now);
    }

    /// Whether the run that owned this session has stopped
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Wall time from creation to finalisation (or now)
    pub fn wall_time(&self) -> Duration {
        self.finished_at
            .unwrap_or_else(Instant::now)
            .duration_since(self.started_at)
    }

    /// Reliability of every tick that reported it
    pub fn reliability_series(&self) -> Vec<f64> {
        self.metrics.iter().filter_map(|m| m.reliability).collect()
    }

    /// Reliability series minus its mean
    pub fn reliability_residuals(&self) -> Vec<f64> {
        let series = self.reliability_series();
        if series.is_empty() {
            return series;
        }
        let mean = series.iter().sum::<f64>() / series.len() as f64;
        series.into_iter().map(|r| r - mean).collect()
    }

    /// Durbin-Watson diagnostic over the reliability residuals
    pub fn durbin_watson(&self) -> Result<DurbinWatson> {
        Ok(durbin_watson(&self.reliability_residuals())?)
    }

    /// Capture the resumable part of this session
    pub fn checkpoint(&self, rng_word_pos: u128) -> SessionCheckpoint {
        SessionCheckpoint {
            session_id: self.id,
            seed: self.seed,
            tick: self.tick,
            sim_time: self.sim_time,
            state: self.state.clone(),
            rng_word_pos,
        }
    }
}

/// Everything needed to resume a run deterministically
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    /// Session the checkpoint was taken from
    pub session_id: Uuid,
    /// Seed of the event generator
    pub seed: u64,
    /// Ticks completed at capture
    pub tick: u64,
    /// Simulated seconds at capture
    pub sim_time: f64,
    /// Probabilities and statuses at capture
    pub state: NetworkState,
    /// Position of the event generator's keystream
    pub rng_word_pos: u128,
}

impl SessionCheckpoint {
    /// Encode with bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| SimulatorError::checkpoint(e.to_string()))
    }

    /// Decode with bincode
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| SimulatorError::checkpoint(e.to_string()))
    }
}
