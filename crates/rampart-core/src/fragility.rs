//! Progressive node-removal (fragility) analysis
//!
//! The analyzer owns a working copy of the network and applies caller
//! supplied removals one at a time. A removal that would leave fewer than
//! `critical_threshold` nodes is refused, not applied, and every later
//! removal is refused as well. Callers can therefore tell a sequence that
//! ran out from one that made the network non-functional.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::component::ComponentId;
use crate::errors::{ResilienceError, Result};
use crate::importance::BirnbaumImportance;
use crate::network::Network;
use crate::probability::ProbabilityVector;
use crate::reliability::ReliabilityEvaluator;

/// Network state after one step of a removal sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragilitySnapshot {
    /// Step index; 0 is the baseline
    pub step: usize,
    /// Node removed at this step, `None` for the baseline
    pub removed: Option<ComponentId>,
    /// Nodes remaining
    pub remaining_nodes: usize,
    /// Links remaining
    pub remaining_links: usize,
    /// System reliability of the remaining network
    pub reliability: f64,
    /// Whether the remaining network is connected
    pub connected: bool,
    /// Number of connected components
    pub component_count: usize,
    /// Fraction of ordered node pairs still joined by a path
    pub connectivity_coefficient: f64,
}

/// Outcome of a full removal sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragilityReport {
    /// Baseline followed by one snapshot per applied removal
    pub snapshots: Vec<FragilitySnapshot>,
    /// Whether the sequence was halted at the critical threshold
    pub critical_threshold_reached: bool,
    /// Requested removals that were not applied
    pub refused: Vec<ComponentId>,
}

impl FragilityReport {
    /// Snapshot after the last applied removal
    pub fn last(&self) -> Option<&FragilitySnapshot> {
        self.snapshots.last()
    }

    /// Reliability values in step order
    pub fn reliability_trend(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.reliability).collect()
    }
}

/// Node count compared against the critical threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdStatus {
    /// Current node count
    pub node_count: usize,
    /// Configured minimum
    pub threshold: usize,
    /// Whether the count is below the minimum
    pub reached: bool,
}

/// Compare a network's node count with `threshold`
pub fn check_critical_threshold(network: &Network, threshold: usize) -> ThresholdStatus {
    let node_count = network.node_count();
    ThresholdStatus {
        node_count,
        threshold,
        reached: node_count < threshold,
    }
}

/// Node ids in ascending Birnbaum importance, the usual removal order
pub fn ascending_importance_order(
    evaluator: &ReliabilityEvaluator,
    network: &Network,
    probabilities: &ProbabilityVector,
) -> Result<Vec<ComponentId>> {
    let ranking = BirnbaumImportance::new(evaluator.clone()).compute_for(network, probabilities)?;
    Ok(ranking.ascending())
}

/// Stateful removal sequence over a private copy of a network
#[derive(Debug, Clone)]
pub struct FragilityAnalyzer {
    evaluator: ReliabilityEvaluator,
    network: Network,
    probabilities: ProbabilityVector,
    snapshots: Vec<FragilitySnapshot>,
    halted: bool,
}

impl FragilityAnalyzer {
    /// Start an analysis and record the baseline snapshot
    pub fn new(
        evaluator: ReliabilityEvaluator,
        network: &Network,
        probabilities: ProbabilityVector,
    ) -> Result<Self> {
        if network.node_count() == 0 {
            return Err(ResilienceError::EmptyNetwork);
        }
        let mut analyzer = Self {
            evaluator,
            network: network.clone(),
            probabilities,
            snapshots: Vec::new(),
            halted: false,
        };
        let baseline = analyzer.snapshot(None)?;
        analyzer.snapshots.push(baseline);
        Ok(analyzer)
    }

    fn threshold(&self) -> usize {
        self.evaluator.critical_threshold()
    }

    fn snapshot(&self, removed: Option<ComponentId>) -> Result<FragilitySnapshot> {
        let reliability = if self.network.node_count() == 0 {
            0.0
        } else {
            self.evaluator.evaluate(&self.network, &self.probabilities)?
        };
        Ok(FragilitySnapshot {
            step: self.snapshots.len(),
            removed,
            remaining_nodes: self.network.node_count(),
            remaining_links: self.network.link_count(),
            reliability,
            connected: self.network.is_connected(),
            component_count: self.network.component_count(),
            connectivity_coefficient: self.network.connectivity_coefficient(),
        })
    }

    /// Remove one node and record the resulting snapshot.
    ///
    /// Refused with `CriticalThresholdReached` if the removal would leave
    /// fewer than the critical threshold or the sequence has already been
    /// halted. Unknown ids fail with `UnknownComponent` without halting.
    pub fn remove(&mut self, id: &ComponentId) -> Result<&FragilitySnapshot> {
        let threshold = self.threshold();
        let remaining = self.network.node_count().saturating_sub(1);
        if self.halted {
            return Err(ResilienceError::CriticalThresholdReached {
                remaining,
                threshold,
            });
        }
        if self.network.node(id).is_none() {
            return Err(ResilienceError::unknown_component(id.clone()));
        }
        if remaining < threshold {
            self.halted = true;
            warn!(node = %id, remaining, threshold, "removal refused at critical threshold");
            return Err(ResilienceError::CriticalThresholdReached {
                remaining,
                threshold,
            });
        }

        self.network.remove_node(id)?;
        let snapshot = self.snapshot(Some(id.clone()))?;
        debug!(
            step = snapshot.step,
            node = %id,
            reliability = snapshot.reliability,
            connected = snapshot.connected,
            "fragility step"
        );
        self.snapshots.push(snapshot);
        Ok(&self.snapshots[self.snapshots.len() - 1])
    }

    /// Apply `order` until it is exhausted or the threshold halts it.
    ///
    /// Unknown ids abort the run with `UnknownComponent`.
    pub fn run(mut self, order: &[ComponentId]) -> Result<FragilityReport> {
        let mut refused = Vec::new();
        for (i, id) in order.iter().enumerate() {
            match self.remove(id) {
                Ok(_) => {}
                Err(ResilienceError::CriticalThresholdReached { .. }) => {
                    refused.extend(order[i..].iter().cloned());
                    break;
                }
                Err(other) => return Err(other),
            }
        }
        Ok(FragilityReport {
            snapshots: self.snapshots,
            critical_threshold_reached: self.halted,
            refused,
        })
    }

    /// Snapshots recorded so far
    pub fn snapshots(&self) -> &[FragilitySnapshot] {
        &self.snapshots
    }

    /// Whether further removals are refused
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Current working copy of the network
    pub fn network(&self) -> &Network {
        &self.network
    }
}
