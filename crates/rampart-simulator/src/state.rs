//! Mutable per-run network state
//!
//! The [`Network`] itself never changes during a run. Everything the event
//! simulator degrades lives here: the probability vector and a status per
//! component.

use indexmap::IndexMap;
use rampart_core::{
    ComponentId, ComponentStatus, Network, Probability, ProbabilityVector, ResilienceError,
};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::events::{EventEffect, TargetClass};

/// Node counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Nodes at full health
    pub operational: usize,
    /// Nodes weakened but still targetable
    pub degraded: usize,
    /// Nodes under adversary control
    pub compromised: usize,
    /// Nodes that are down
    pub failed: usize,
}

/// Probabilities and statuses of every node and link in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkState {
    probabilities: ProbabilityVector,
    statuses: IndexMap<ComponentId, ComponentStatus>,
}

impl NetworkState {
    /// Baseline state: configured probabilities and statuses of `network`
    pub fn from_network(network: &Network) -> Self {
        let mut statuses = IndexMap::with_capacity(network.node_count() + network.link_count());
        for node in network.nodes() {
            statuses.insert(node.id.clone(), node.status);
        }
        for link in network.links() {
            statuses.insert(link.id.clone(), link.status);
        }
        Self {
            probabilities: network.baseline_probabilities(),
            statuses,
        }
    }

    /// Current probability vector
    pub fn probabilities(&self) -> &ProbabilityVector {
        &self.probabilities
    }

    /// Current status of a component
    pub fn status(&self, id: &ComponentId) -> Option<ComponentStatus> {
        self.statuses.get(id).copied()
    }

    /// Current probability of a component
    pub fn probability(&self, id: &ComponentId) -> Option<f64> {
        self.probabilities.get(id).map(Probability::value)
    }

    /// Whether this state has an entry for every node and link of `network`
    pub fn covers(&self, network: &Network) -> bool {
        network
            .nodes()
            .map(|n| &n.id)
            .chain(network.links().map(|l| &l.id))
            .all(|id| self.probabilities.contains(id) && self.statuses.contains_key(id))
    }

    /// Components an event of `class` may target, nodes first, in network
    /// order. Only operational or degraded components are eligible.
    pub fn eligible(&self, network: &Network, class: TargetClass) -> Vec<ComponentId> {
        let nodes = network.nodes().map(|n| &n.id);
        let links = network.links().map(|l| &l.id);
        let candidates: Vec<&ComponentId> = match class {
            TargetClass::Nodes => nodes.collect(),
            TargetClass::Links => links.collect(),
            TargetClass::Any => nodes.chain(links).collect(),
        };
        candidates
            .into_iter()
            .filter(|id| self.status(id).is_some_and(ComponentStatus::is_operational))
            .cloned()
            .collect()
    }

    /// Apply an event effect and return the probability delta (never
    /// positive).
    pub fn apply(&mut self, id: &ComponentId, effect: EventEffect) -> Result<f64> {
        let before = self
            .probability(id)
            .ok_or_else(|| ResilienceError::unknown_component(id.clone()))?;
        let (factor, status) = match effect {
            EventEffect::Degrade { factor } => (factor, ComponentStatus::Degraded),
            EventEffect::Compromise { factor } => (factor, ComponentStatus::Compromised),
            EventEffect::Fail { residual_factor } => (residual_factor, ComponentStatus::Failed),
        };
        let after = Probability::saturating(before * factor);
        self.probabilities.insert(id.clone(), after);
        self.statuses.insert(id.clone(), status);
        Ok(after.value() - before)
    }

    /// Failed or compromised components, nodes first, in network order
    pub fn repairable(&self, network: &Network) -> Vec<ComponentId> {
        network
            .nodes()
            .map(|n| &n.id)
            .chain(network.links().map(|l| &l.id))
            .filter(|id| {
                matches!(
                    self.status(id),
                    Some(ComponentStatus::Failed | ComponentStatus::Compromised)
                )
            })
            .cloned()
            .collect()
    }

    /// Return a component to operational status at its baseline probability
    /// from `network`, returning the probability delta (never negative for a
    /// damaged component).
    pub fn restore(&mut self, network: &Network, id: &ComponentId) -> Result<f64> {
        let baseline = network
            .node(id)
            .map(|n| n.reliability)
            .or_else(|| network.link(id).map(|l| l.reliability))
            .ok_or_else(|| ResilienceError::unknown_component(id.clone()))?;
        let before = self
            .probability(id)
            .ok_or_else(|| ResilienceError::unknown_component(id.clone()))?;
        self.probabilities.insert(id.clone(), baseline);
        self.statuses.insert(id.clone(), ComponentStatus::Operational);
        Ok(baseline.value() - before)
    }

    /// Node counts by status
    pub fn counts(&self, network: &Network) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for id in network.node_ids() {
            match self.status(id) {
                Some(ComponentStatus::Operational) => counts.operational += 1,
                Some(ComponentStatus::Degraded) => counts.degraded += 1,
                Some(ComponentStatus::Compromised) => counts.compromised += 1,
                Some(ComponentStatus::Failed) => counts.failed += 1,
                None => {}
            }
        }
        counts
    }

    /// Nodes that are operational or degraded
    pub fn operational_nodes(&self, network: &Network) -> Vec<ComponentId> {
        self.eligible(network, TargetClass::Nodes)
    }

    /// Topology seen by the evaluators: `network` without its failed links
    pub fn topology(&self, network: &Network) -> Result<Network> {
        let mut topology = network.clone();
        let failed: Vec<ComponentId> = network
            .links()
            .filter(|l| self.status(&l.id) == Some(ComponentStatus::Failed))
            .map(|l| l.id.clone())
            .collect();
        for id in &failed {
            topology.remove_link(id)?;
        }
        Ok(topology)
    }
}
