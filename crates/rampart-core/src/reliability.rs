//! Structure-function reliability evaluation
//!
//! The system is up when the subgraph induced by operational nodes has at
//! least `critical_threshold` nodes and satisfies the configured
//! connectivity scope. Nodes fail independently. Reliability is computed
//! exactly by enumerating all `2^n` up/down states, so cost is
//! `O(2^n · n)` in time for the structure function and `O(2^(n/2))` in
//! memory for the state weights. Networks above `max_exact_nodes` are
//! rejected with `NetworkTooLarge` rather than approximated; callers that
//! accept sampling error can ask for [`ReliabilityEvaluator::estimate`]
//! instead, which draws seeded Monte Carlo states (up to 64 nodes).
//!
//! With [`ConnectivityScope::AllSurviving`] the structure function is not
//! coherent in general: bringing an isolated node up can take the system
//! down. [`ConnectivityScope::Terminals`] is coherent, so reliability is
//! monotone in every node's probability under that scope.

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adjacency::AdjacencyMatrix;
use crate::component::ComponentId;
use crate::config::{AnalysisConfig, ConfigValidation, ConnectivityScope};
use crate::errors::{ResilienceError, Result};
use crate::network::Network;
use crate::probability::ProbabilityVector;

/// Bitmask form of the structure function for one adjacency matrix
#[derive(Debug, Clone)]
pub(crate) struct StructureFunction {
    masks: Vec<u64>,
    threshold: usize,
    /// `None` for all-surviving connectivity; `Some(0)` never occurs
    terminals: Option<u64>,
    /// A terminal is not part of the node set, so the system is never up
    unsatisfiable: bool,
}

impl StructureFunction {
    fn new(matrix: &AdjacencyMatrix, config: &AnalysisConfig) -> Result<Self> {
        let masks = matrix.neighbor_masks()?;
        let mut unsatisfiable = false;
        let terminals = match &config.connectivity {
            ConnectivityScope::AllSurviving => None,
            ConnectivityScope::Terminals(ids) => {
                let mut mask = 0u64;
                for id in ids {
                    match matrix.index_of(id) {
                        Some(i) => mask |= 1 << i,
                        None => {
                            debug!(terminal = %id, "terminal absent from node set");
                            unsatisfiable = true;
                        }
                    }
                }
                Some(mask)
            }
        };
        Ok(Self {
            masks,
            threshold: config.critical_threshold,
            terminals,
            unsatisfiable,
        })
    }

    /// Nodes of `state` reachable from the lowest set bit of `seed`
    fn reach(&self, seed: u64, state: u64) -> u64 {
        let start = seed & seed.wrapping_neg();
        let mut visited = start;
        let mut frontier = start;
        while frontier != 0 {
            let mut next = 0u64;
            let mut bits = frontier;
            while bits != 0 {
                let i = bits.trailing_zeros() as usize;
                next |= self.masks[i];
                bits &= bits - 1;
            }
            next &= state & !visited;
            visited |= next;
            frontier = next;
        }
        visited
    }

    /// `φ(state)`: bit `i` set means node `i` is operational
    pub(crate) fn is_up(&self, state: u64) -> bool {
        if self.unsatisfiable {
            return false;
        }
        let count = state.count_ones() as usize;
        if count == 0 || count < self.threshold {
            return false;
        }
        match self.terminals {
            None => self.reach(state, state) == state,
            Some(terminals) => {
                state & terminals == terminals && self.reach(terminals, state) & terminals == terminals
            }
        }
    }
}

/// Exact reliability evaluator
#[derive(Debug, Clone, Default)]
pub struct ReliabilityEvaluator {
    config: AnalysisConfig,
}

impl ReliabilityEvaluator {
    /// Create an evaluator, validating the configuration
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Critical threshold in force
    pub fn critical_threshold(&self) -> usize {
        self.config.critical_threshold
    }

    fn check_size(&self, matrix: &AdjacencyMatrix) -> Result<()> {
        if matrix.is_empty() {
            return Err(ResilienceError::EmptyNetwork);
        }
        if matrix.len() > self.config.max_exact_nodes {
            return Err(ResilienceError::NetworkTooLarge {
                nodes: matrix.len(),
                max: self.config.max_exact_nodes,
            });
        }
        Ok(())
    }

    pub(crate) fn structure_function(&self, matrix: &AdjacencyMatrix) -> Result<StructureFunction> {
        self.check_size(matrix)?;
        StructureFunction::new(matrix, &self.config)
    }

    /// Monte Carlo estimate of system reliability from `samples` independent
    /// draws of every node's state.
    ///
    /// Not bounded by `max_exact_nodes`; the bitmask form limits it to 64
    /// nodes. Fails with `EmptyNetwork` for an empty matrix and
    /// `InsufficientData` when `samples` is zero.
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        matrix: &AdjacencyMatrix,
        probabilities: &ProbabilityVector,
        samples: u64,
        rng: &mut R,
    ) -> Result<ReliabilityEstimate> {
        if matrix.is_empty() {
            return Err(ResilienceError::EmptyNetwork);
        }
        if samples == 0 {
            return Err(ResilienceError::insufficient_data(
                "monte carlo estimate needs at least one sample",
            ));
        }
        let phi = StructureFunction::new(matrix, &self.config)?;
        let p = matrix.probabilities_in_order(probabilities)?;

        let mut failures = vec![0u64; p.len()];
        let mut up_count = 0u64;
        for _ in 0..samples {
            let mut state = 0u64;
            for (i, &pi) in p.iter().enumerate() {
                if rng.gen_bool(pi) {
                    state |= 1 << i;
                } else {
                    failures[i] += 1;
                }
            }
            if phi.is_up(state) {
                up_count += 1;
            }
        }

        let reliability = up_count as f64 / samples as f64;
        debug!(nodes = matrix.len(), samples, reliability, "system reliability estimated");
        Ok(ReliabilityEstimate {
            reliability,
            samples,
            up_count,
            failure_counts: matrix.order().iter().cloned().zip(failures).collect(),
        })
    }

    /// Probability that the system is up.
    ///
    /// Fails with `EmptyNetwork` for an empty matrix, `InvalidTopology` if a
    /// node has no probability, and `NetworkTooLarge` above the enumeration
    /// limit. Fewer nodes than the critical threshold yields `0`.
    pub fn system_reliability(
        &self,
        matrix: &AdjacencyMatrix,
        probabilities: &ProbabilityVector,
    ) -> Result<f64> {
        let phi = self.structure_function(matrix)?;
        let p = matrix.probabilities_in_order(probabilities)?;
        let reliability = if matrix.len() < self.config.critical_threshold {
            0.0
        } else {
            enumerate(&p, |state| phi.is_up(state))
        };
        debug!(nodes = matrix.len(), reliability, "system reliability evaluated");
        Ok(reliability)
    }

    /// Probability that the network is up, using its derived adjacency view
    pub fn evaluate(&self, network: &Network, probabilities: &ProbabilityVector) -> Result<f64> {
        self.system_reliability(&network.adjacency(), probabilities)
    }

    /// Evaluate the structure function for one explicit set of operational
    /// nodes. Unknown identifiers are rejected.
    pub fn is_system_up(
        &self,
        matrix: &AdjacencyMatrix,
        operational: &[ComponentId],
    ) -> Result<bool> {
        let phi = self.structure_function(matrix)?;
        let mut state = 0u64;
        for id in operational {
            let i = matrix
                .index_of(id)
                .ok_or_else(|| ResilienceError::unknown_component(id.clone()))?;
            state |= 1 << i;
        }
        Ok(phi.is_up(state))
    }

    /// Probability that exactly `k` nodes are failed, for `k` in `0..=n`.
    ///
    /// Derived on demand from the node probabilities; it does not depend on
    /// topology.
    pub fn failure_count_distribution(
        &self,
        matrix: &AdjacencyMatrix,
        probabilities: &ProbabilityVector,
    ) -> Result<Vec<f64>> {
        if matrix.is_empty() {
            return Err(ResilienceError::EmptyNetwork);
        }
        let p = matrix.probabilities_in_order(probabilities)?;
        let mut dist = vec![0.0; p.len() + 1];
        dist[0] = 1.0;
        for (seen, &pi) in p.iter().enumerate() {
            for k in (0..=seen + 1).rev() {
                let stay_up = dist[k] * pi;
                let from_below = if k > 0 { dist[k - 1] * (1.0 - pi) } else { 0.0 };
                dist[k] = stay_up + from_below;
            }
        }
        Ok(dist)
    }

    /// Marginal failure probability `1 - p` of every node in the matrix
    pub fn node_failure_probabilities(
        &self,
        matrix: &AdjacencyMatrix,
        probabilities: &ProbabilityVector,
    ) -> Result<IndexMap<ComponentId, f64>> {
        let p = matrix.probabilities_in_order(probabilities)?;
        Ok(matrix
            .order()
            .iter()
            .cloned()
            .zip(p.into_iter().map(|pi| 1.0 - pi))
            .collect())
    }
}

/// Result of a Monte Carlo reliability run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityEstimate {
    /// Fraction of samples in which the system was up
    pub reliability: f64,
    /// Number of samples drawn
    pub samples: u64,
    /// Samples in which the system was up
    pub up_count: u64,
    /// Samples in which each node was down, in matrix order
    pub failure_counts: IndexMap<ComponentId, u64>,
}

impl ReliabilityEstimate {
    /// Standard error of the estimate, `sqrt(r(1 - r) / samples)`
    pub fn standard_error(&self) -> f64 {
        (self.reliability * (1.0 - self.reliability) / self.samples as f64).sqrt()
    }

    /// Expected hours up per year (8760 h)
    pub fn expected_uptime_hours(&self) -> f64 {
        self.reliability * 8760.0
    }
}

/// Sum the weights of every state accepted by `accept`.
///
/// The weight of a state is split into a low-half and high-half product so
/// that each one is a single multiplication of two table entries.
pub(crate) fn enumerate(p: &[f64], accept: impl Fn(u64) -> bool) -> f64 {
    let n = p.len();
    let lo_bits = n / 2;
    let lo = half_weights(&p[..lo_bits]);
    let hi = half_weights(&p[lo_bits..]);
    let lo_mask = (1u64 << lo_bits) - 1;

    let mut total = 0.0;
    for state in 0..(1u64 << n) {
        let weight = lo[(state & lo_mask) as usize] * hi[(state >> lo_bits) as usize];
        if weight != 0.0 && accept(state) {
            total += weight;
        }
    }
    total
}

fn half_weights(p: &[f64]) -> Vec<f64> {
    let mut weights = vec![1.0; 1 << p.len()];
    for (state, weight) in weights.iter_mut().enumerate() {
        for (i, &pi) in p.iter().enumerate() {
            *weight *= if state & (1 << i) != 0 { pi } else { 1.0 - pi };
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{LinkKind, Node, NodeKind};

    fn network(ids: &[&str], links: &[(&str, &str)]) -> Network {
        let mut n = Network::new("test");
        for id in ids {
            n.add_node(Node::new(*id, NodeKind::Router)).unwrap();
        }
        for (a, b) in links {
            n.connect(*a, *b, LinkKind::Ethernet).unwrap();
        }
        n
    }

    fn uniform(network: &Network, p: f64) -> ProbabilityVector {
        ProbabilityVector::from_pairs(network.node_ids().map(|id| (id.clone(), p))).unwrap()
    }

    #[test]
    fn test_complete_graph_matches_binomial_tail() {
        let ids = ["a", "b", "c", "d"];
        let mut links = Vec::new();
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                links.push((ids[i], ids[j]));
            }
        }
        let net = network(&ids, &links);
        let evaluator = ReliabilityEvaluator::default();
        let p: f64 = 0.9;
        // at least 3 of 4 up; every subset of a complete graph is connected
        let expected = p.powi(4) + 4.0 * p.powi(3) * (1.0 - p);
        let r = evaluator.evaluate(&net, &uniform(&net, p)).unwrap();
        assert!((r - expected).abs() < 1e-12);
    }

    #[test]
    fn test_path_requires_contiguous_survivors() {
        // a - b - c - d: up states with >= 3 contiguous nodes are
        // {a,b,c}, {b,c,d}, {a,b,c,d}
        let net = network(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        let evaluator = ReliabilityEvaluator::default();
        let p: f64 = 0.8;
        let q = 1.0 - p;
        let expected = p.powi(4) + 2.0 * p.powi(3) * q;
        let r = evaluator.evaluate(&net, &uniform(&net, p)).unwrap();
        assert!((r - expected).abs() < 1e-12);
    }

    #[test]
    fn test_below_threshold_is_zero() {
        let net = network(&["a", "b"], &[("a", "b")]);
        let r = ReliabilityEvaluator::default()
            .evaluate(&net, &uniform(&net, 1.0))
            .unwrap();
        assert_eq!(r, 0.0);
    }

    #[test]
    fn test_empty_network_is_error() {
        let net = Network::new("empty");
        let err = ReliabilityEvaluator::default()
            .evaluate(&net, &ProbabilityVector::new())
            .unwrap_err();
        assert_eq!(err, ResilienceError::EmptyNetwork);
    }

    #[test]
    fn test_size_limit_enforced() {
        let ids: Vec<String> = (0..6).map(|i| format!("n{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let net = network(&refs, &[]);
        let evaluator =
            ReliabilityEvaluator::new(AnalysisConfig::default().with_max_exact_nodes(5)).unwrap();
        assert!(matches!(
            evaluator.evaluate(&net, &uniform(&net, 0.5)),
            Err(ResilienceError::NetworkTooLarge { nodes: 6, max: 5 })
        ));
    }

    #[test]
    fn test_terminal_scope_ignores_stranded_survivors() {
        // a - b - c, d isolated. Terminals {a, c}.
        let net = network(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c")]);
        let evaluator = ReliabilityEvaluator::new(
            AnalysisConfig::default()
                .with_connectivity(ConnectivityScope::Terminals(vec!["a".into(), "c".into()])),
        )
        .unwrap();
        let matrix = net.adjacency();
        let all: Vec<ComponentId> = net.node_ids().cloned().collect();
        assert!(evaluator.is_system_up(&matrix, &all).unwrap());

        let default = ReliabilityEvaluator::default();
        assert!(!default.is_system_up(&matrix, &all).unwrap());
    }

    #[test]
    fn test_missing_terminal_never_up() {
        let net = network(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let evaluator = ReliabilityEvaluator::new(
            AnalysisConfig::default()
                .with_connectivity(ConnectivityScope::Terminals(vec!["zz".into()])),
        )
        .unwrap();
        assert_eq!(evaluator.evaluate(&net, &uniform(&net, 1.0)).unwrap(), 0.0);
    }

    #[test]
    fn test_failure_count_distribution_sums_to_one() {
        let net = network(&["a", "b", "c"], &[]);
        let probs = ProbabilityVector::from_pairs([("a", 0.9), ("b", 0.5), ("c", 0.2)]).unwrap();
        let dist = ReliabilityEvaluator::default()
            .failure_count_distribution(&net.adjacency(), &probs)
            .unwrap();
        assert_eq!(dist.len(), 4);
        assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((dist[0] - 0.9 * 0.5 * 0.2).abs() < 1e-12);
        assert!((dist[3] - 0.1 * 0.5 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_ignores_exact_limit() {
        use rand::SeedableRng;
        let ids: Vec<String> = (0..6).map(|i| format!("n{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let links: Vec<(&str, &str)> = refs.windows(2).map(|w| (w[0], w[1])).collect();
        let net = network(&refs, &links);
        let evaluator =
            ReliabilityEvaluator::new(AnalysisConfig::default().with_max_exact_nodes(5)).unwrap();
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        let estimate = evaluator
            .estimate(&net.adjacency(), &uniform(&net, 1.0), 200, &mut rng)
            .unwrap();
        assert_eq!(estimate.reliability, 1.0);
        assert_eq!(estimate.up_count, 200);
        assert!(estimate.failure_counts.values().all(|&c| c == 0));
        assert_eq!(estimate.standard_error(), 0.0);
    }

    #[test]
    fn test_estimate_rejects_zero_samples() {
        use rand::SeedableRng;
        let net = network(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            ReliabilityEvaluator::default().estimate(&net.adjacency(), &uniform(&net, 0.5), 0, &mut rng),
            Err(ResilienceError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_node_failure_probabilities() {
        let net = network(&["a", "b"], &[]);
        let probs = ProbabilityVector::from_pairs([("a", 0.9), ("b", 0.25)]).unwrap();
        let f = ReliabilityEvaluator::default()
            .node_failure_probabilities(&net.adjacency(), &probs)
            .unwrap();
        assert!((f[&ComponentId::from("a")] - 0.1).abs() < 1e-12);
        assert!((f[&ComponentId::from("b")] - 0.75).abs() < 1e-12);
    }
}
