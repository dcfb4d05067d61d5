//! Birnbaum importance
//!
//! `B_i = R(p | x_i = 1) - R(p | x_i = 0)`: system reliability with node `i`
//! pinned up minus reliability with it pinned down, every other probability
//! unchanged. Coefficients can be negative under all-surviving
//! connectivity, where an isolated node that is up makes the survivors
//! disconnected.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

use crate::adjacency::AdjacencyMatrix;
use crate::component::ComponentId;
use crate::errors::{ResilienceError, Result};
use crate::network::Network;
use crate::probability::ProbabilityVector;
use crate::reliability::ReliabilityEvaluator;

/// Informational band of a Birnbaum coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    /// Below 0.1
    Low,
    /// At least 0.1
    Medium,
    /// At least 0.2
    High,
    /// At least 0.5
    Critical,
}

impl Criticality {
    /// Classify a coefficient
    pub fn classify(coefficient: f64) -> Self {
        if coefficient >= 0.5 {
            Self::Critical
        } else if coefficient >= 0.2 {
            Self::High
        } else if coefficient >= 0.1 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// Birnbaum coefficients of every node, in matrix order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportanceRanking {
    coefficients: IndexMap<ComponentId, f64>,
}

impl ImportanceRanking {
    /// Coefficient of a node
    pub fn coefficient(&self, id: &ComponentId) -> Option<f64> {
        self.coefficients.get(id).copied()
    }

    /// Band of a node's coefficient
    pub fn criticality(&self, id: &ComponentId) -> Option<Criticality> {
        self.coefficient(id).map(Criticality::classify)
    }

    /// Coefficients in matrix order
    pub fn iter(&self) -> impl Iterator<Item = (&ComponentId, f64)> {
        self.coefficients.iter().map(|(id, b)| (id, *b))
    }

    /// Node ids from least to most important. Ties keep matrix order.
    pub fn ascending(&self) -> Vec<ComponentId> {
        self.sorted(|a, b| a.total_cmp(b))
    }

    /// Node ids from most to least important. Ties keep matrix order.
    pub fn descending(&self) -> Vec<ComponentId> {
        self.sorted(|a, b| b.total_cmp(a))
    }

    fn sorted(&self, cmp: impl Fn(&f64, &f64) -> Ordering) -> Vec<ComponentId> {
        let mut entries: Vec<(&ComponentId, &f64)> = self.coefficients.iter().collect();
        entries.sort_by(|a, b| cmp(a.1, b.1));
        entries.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// Node with the largest coefficient
    pub fn most_critical(&self) -> Option<(&ComponentId, f64)> {
        self.iter().fold(None, |best, (id, b)| match best {
            Some((_, top)) if top >= b => best,
            _ => Some((id, b)),
        })
    }

    /// Sum of all coefficients
    pub fn total(&self) -> f64 {
        self.coefficients.values().sum()
    }

    /// Number of nodes ranked
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// Whether no nodes were ranked
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Owned map of coefficients
    pub fn into_map(self) -> IndexMap<ComponentId, f64> {
        self.coefficients
    }
}

/// Birnbaum importance calculator built on a reliability evaluator
#[derive(Debug, Clone, Default)]
pub struct BirnbaumImportance {
    evaluator: ReliabilityEvaluator,
}

impl BirnbaumImportance {
    /// Wrap an evaluator
    pub fn new(evaluator: ReliabilityEvaluator) -> Self {
        Self { evaluator }
    }

    /// Underlying evaluator
    pub fn evaluator(&self) -> &ReliabilityEvaluator {
        &self.evaluator
    }

    /// Coefficients of every node of `matrix`.
    ///
    /// Fails with `InvalidTopology` if a node of the matrix has no
    /// probability, plus every error of the underlying evaluation.
    pub fn compute(
        &self,
        matrix: &AdjacencyMatrix,
        probabilities: &ProbabilityVector,
    ) -> Result<ImportanceRanking> {
        // Surfaces missing entries as topology errors before any pinning.
        matrix.probabilities_in_order(probabilities)?;

        let mut coefficients = IndexMap::with_capacity(matrix.len());
        for id in matrix.order() {
            let up = self
                .evaluator
                .system_reliability(matrix, &probabilities.forced(id, true)?)?;
            let down = self
                .evaluator
                .system_reliability(matrix, &probabilities.forced(id, false)?)?;
            coefficients.insert(id.clone(), up - down);
        }
        debug!(nodes = coefficients.len(), "birnbaum importance computed");
        Ok(ImportanceRanking { coefficients })
    }

    /// Coefficients over a network's derived adjacency view
    pub fn compute_for(
        &self,
        network: &Network,
        probabilities: &ProbabilityVector,
    ) -> Result<ImportanceRanking> {
        self.compute(&network.adjacency(), probabilities)
    }

    /// Coefficient of a single node
    pub fn coefficient(
        &self,
        matrix: &AdjacencyMatrix,
        probabilities: &ProbabilityVector,
        id: &ComponentId,
    ) -> Result<f64> {
        if matrix.index_of(id).is_none() {
            return Err(ResilienceError::unknown_component(id.clone()));
        }
        let up = self
            .evaluator
            .system_reliability(matrix, &probabilities.forced(id, true)?)?;
        let down = self
            .evaluator
            .system_reliability(matrix, &probabilities.forced(id, false)?)?;
        Ok(up - down)
    }
}
