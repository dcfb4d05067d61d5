//! Tabular reliability report over a network
//!
//! The report is plain data. Rendering and export belong to callers.

use serde::{Deserialize, Serialize};

use crate::component::{ComponentId, NodeKind};
use crate::errors::Result;
use crate::importance::{BirnbaumImportance, Criticality};
use crate::network::Network;
use crate::probability::ProbabilityVector;
use crate::reliability::ReliabilityEvaluator;

/// Per-node row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    /// Node id
    pub id: ComponentId,
    /// Node kind
    pub kind: NodeKind,
    /// Success probability used for the evaluation
    pub reliability: f64,
    /// `1 - reliability`
    pub failure_probability: f64,
    /// Birnbaum importance coefficient
    pub birnbaum: f64,
    /// Number of incident links
    pub degree: usize,
    /// Criticality band of `birnbaum`
    pub criticality: Criticality,
}

/// Whole-system totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemRow {
    /// System reliability
    pub reliability: f64,
    /// Sum of all node coefficients
    pub total_importance: f64,
    /// Nodes in the network
    pub node_count: usize,
    /// Links in the network
    pub link_count: usize,
    /// Whether every node is reachable from every other
    pub connected: bool,
}

/// Node rows plus a system total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityReport {
    /// Network name
    pub network: String,
    /// One row per node, in network order until sorted
    pub nodes: Vec<NodeRow>,
    /// Totals
    pub system: SystemRow,
}

impl ReliabilityReport {
    /// Evaluate `network` under `probabilities` and collect the rows.
    pub fn build(
        evaluator: &ReliabilityEvaluator,
        network: &Network,
        probabilities: &ProbabilityVector,
    ) -> Result<Self> {
        let matrix = network.adjacency();
        let reliability = evaluator.system_reliability(&matrix, probabilities)?;
        let ranking = BirnbaumImportance::new(evaluator.clone()).compute(&matrix, probabilities)?;

        let mut nodes = Vec::with_capacity(network.node_count());
        for node in network.nodes() {
            let p = probabilities.value_of(&node.id)?;
            let birnbaum = ranking.coefficient(&node.id).unwrap_or_default();
            nodes.push(NodeRow {
                id: node.id.clone(),
                kind: node.kind,
                reliability: p,
                failure_probability: 1.0 - p,
                birnbaum,
                degree: network.degree(&node.id),
                criticality: Criticality::classify(birnbaum),
            });
        }

        Ok(Self {
            network: network.name().to_string(),
            nodes,
            system: SystemRow {
                reliability,
                total_importance: ranking.total(),
                node_count: network.node_count(),
                link_count: network.link_count(),
                connected: network.is_connected(),
            },
        })
    }

    /// Reorder node rows from most to least important
    pub fn sort_by_importance(&mut self) {
        self.nodes.sort_by(|a, b| b.birnbaum.total_cmp(&a.birnbaum));
    }

    /// Row of a node
    pub fn row(&self, id: &ComponentId) -> Option<&NodeRow> {
        self.nodes.iter().find(|r| &r.id == id)
    }
}
