//! Single-threaded tick engine
//!
//! [`SimulationEngine`] performs one tick at a time and owns everything a
//! run mutates. The controller drives it from its worker thread; tests and
//! batch callers can drive it directly.

use rampart_core::{BirnbaumImportance, Network, ReliabilityEvaluator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::debug;

use crate::config::{ConfigValidation, SimulationConfig};
use crate::errors::{Result, SimulatorError};
use crate::events::EventSimulator;
use crate::metrics::TickMetrics;
use crate::session::{SessionCheckpoint, SimulationSession};
use crate::state::NetworkState;

/// Event simulation plus per-tick analysis over one network
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    network: Arc<Network>,
    config: Arc<SimulationConfig>,
    evaluator: ReliabilityEvaluator,
    events: EventSimulator,
    rng: ChaCha8Rng,
    session: SimulationSession,
}

impl SimulationEngine {
    /// Engine at tick 0 with the network's baseline state
    pub fn new(network: Arc<Network>, config: Arc<SimulationConfig>) -> Result<Self> {
        config.validate()?;
        let evaluator = ReliabilityEvaluator::new(config.analysis.clone())?;
        let events =
            EventSimulator::new(config.catalog.clone())?.with_repair(config.repair_probability);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let session = SimulationSession::new(config.seed, NetworkState::from_network(&network));
        Ok(Self {
            network,
            config,
            evaluator,
            events,
            rng,
            session,
        })
    }

    /// Engine continuing exactly where `checkpoint` was taken.
    ///
    /// The checkpoint's seed overrides the configured one. Fails if the
    /// checkpointed state does not cover every component of `network`.
    pub fn from_checkpoint(
        network: Arc<Network>,
        config: Arc<SimulationConfig>,
        checkpoint: SessionCheckpoint,
    ) -> Result<Self> {
        if !checkpoint.state.covers(&network) {
            return Err(SimulatorError::checkpoint(format!(
                "checkpoint state does not cover network {}",
                network.name()
            )));
        }
        let mut engine = Self::new(network, config)?;
        let mut rng = ChaCha8Rng::seed_from_u64(checkpoint.seed);
        rng.set_word_pos(checkpoint.rng_word_pos);
        engine.rng = rng;
        engine.session = SimulationSession::from_checkpoint(checkpoint);
        Ok(engine)
    }

    /// Advance one tick: draw events, then re-evaluate the network.
    ///
    /// Work done before a failing evaluation is kept in the session.
    pub fn step(&mut self) -> Result<TickMetrics> {
        let tick = self.session.tick() + 1;
        let sim_time = tick as f64 * self.config.time_step;

        let records = self.events.tick(
            &self.network,
            self.session.state_mut(),
            tick,
            sim_time,
            &mut self.rng,
        )?;
        let fired = records.iter().filter(|r| r.is_fired_event()).count();
        let repairs = records.iter().filter(|r| r.is_repair()).count();
        self.session.record_events(records);

        let state = self.session.state();
        let mut metrics =
            TickMetrics::new(tick, sim_time, state.counts(&self.network), fired, repairs);
        if self.config.report_reliability || self.config.report_importance {
            let topology = state.topology(&self.network)?;
            let matrix = topology.adjacency();
            if self.config.report_reliability {
                metrics.reliability = Some(
                    self.evaluator
                        .system_reliability(&matrix, state.probabilities())?,
                );
            }
            if self.config.report_importance {
                metrics.importance = Some(
                    BirnbaumImportance::new(self.evaluator.clone())
                        .compute(&matrix, state.probabilities())?,
                );
            }
        }

        debug!(
            tick,
            sim_time,
            reliability = metrics.reliability,
            events_fired = fired,
            repairs,
            "tick complete"
        );
        self.session.record_metrics(metrics.clone());
        Ok(metrics)
    }

    /// Whether a bounded run has reached its configured tick count
    pub fn is_complete(&self) -> bool {
        self.config
            .total_ticks()
            .is_some_and(|total| self.session.tick() >= total)
    }

    /// Resumable snapshot of the current tick
    pub fn checkpoint(&self) -> SessionCheckpoint {
        self.session.checkpoint(self.rng.get_word_pos())
    }

    /// Live session
    pub fn session(&self) -> &SimulationSession {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut SimulationSession {
        &mut self.session
    }

    /// Finalise and hand over the session
    pub fn into_session(mut self) -> SimulationSession {
        self.session.finalize();
        self.session
    }

    /// Network under simulation
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Configuration of this run
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{LinkKind, Node, NodeKind, ResilienceError};

    fn ring(n: usize) -> Arc<Network> {
        let mut net = Network::new("ring");
        for i in 0..n {
            net.add_node(Node::new(format!("r{i}"), NodeKind::Router)).unwrap();
        }
        for i in 0..n {
            net.connect(format!("r{i}"), format!("r{}", (i + 1) % n), LinkKind::Fiber)
                .unwrap();
        }
        Arc::new(net)
    }

    #[test]
    fn test_bounded_run_completes() {
        let config = Arc::new(SimulationConfig::testing_defaults().with_timing(30, 10));
        let mut engine = SimulationEngine::new(ring(5), config).unwrap();
        while !engine.is_complete() {
            engine.step().unwrap();
        }
        let session = engine.into_session();
        assert_eq!(session.tick(), 3);
        assert_eq!(session.metrics().len(), 3);
        assert_eq!(session.events().len(), 3 * 3);
        assert!(session.is_finished());
        assert!((session.sim_time() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let config = Arc::new(SimulationConfig::testing_defaults().with_seed(17));
        let mut a = SimulationEngine::new(ring(6), config.clone()).unwrap();
        let mut b = SimulationEngine::new(ring(6), config).unwrap();
        for _ in 0..25 {
            assert_eq!(a.step().unwrap(), b.step().unwrap());
        }
        assert_eq!(a.session().events(), b.session().events());
    }

    #[test]
    fn test_oversized_network_fails_tick() {
        let config = SimulationConfig::testing_defaults()
            .with_analysis(rampart_core::AnalysisConfig::default().with_max_exact_nodes(4));
        let mut engine = SimulationEngine::new(ring(5), Arc::new(config)).unwrap();
        let err = engine.step().unwrap_err();
        assert!(matches!(
            err,
            SimulatorError::Core(ResilienceError::NetworkTooLarge { nodes: 5, max: 4 })
        ));
        // the event draws of the failed tick are kept
        assert_eq!(engine.session().events().len(), 3);
    }

    #[test]
    fn test_importance_reporting() {
        let mut config = SimulationConfig::testing_defaults();
        config.report_importance = true;
        let mut engine = SimulationEngine::new(ring(4), Arc::new(config)).unwrap();
        let metrics = engine.step().unwrap();
        assert_eq!(metrics.importance.unwrap().len(), 4);
    }

    #[test]
    fn test_certain_repair_heals_every_tick() {
        use crate::events::{EventCatalog, EventEffect, EventKind, EventSpec, TargetClass};

        let fail = EventSpec::new(
            EventKind::HardwareFailure,
            1.0,
            1.0,
            TargetClass::Any,
            EventEffect::Fail { residual_factor: 0.0 },
        )
        .unwrap();
        let config = SimulationConfig::testing_defaults()
            .with_catalog(EventCatalog::from_entries(vec![fail]).unwrap())
            .with_repair_probability(1.0)
            .unwrap();
        let network = ring(4);
        let mut engine = SimulationEngine::new(network.clone(), Arc::new(config)).unwrap();
        for _ in 0..5 {
            let metrics = engine.step().unwrap();
            assert_eq!(metrics.events_fired, 1);
            assert_eq!(metrics.repairs, 1);
            assert_eq!(metrics.failed, 0);
            assert_eq!(metrics.operational, 4);
        }
        let state = engine.session().state();
        assert_eq!(state, &NetworkState::from_network(&network));
        let recoveries = engine
            .session()
            .events()
            .iter()
            .filter(|r| r.kind == EventKind::Recovery)
            .count();
        assert_eq!(recoveries, 5);
        assert_eq!(engine.session().events().len(), 10);
    }
}
