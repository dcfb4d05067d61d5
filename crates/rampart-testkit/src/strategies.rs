//! Property test strategies for rampart types

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use rampart_core::{ComponentId, Network, NetworkBuilder, Probability, ProbabilityVector};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Probability values, biased towards the boundaries
pub fn arb_probability() -> impl Strategy<Value = f64> {
    prop_oneof![
        1 => Just(0.0),
        1 => Just(1.0),
        6 => 0.0..=1.0f64,
    ]
}

/// A success probability for every node of `network`
pub fn arb_probability_vector(network: &Network) -> impl Strategy<Value = ProbabilityVector> {
    let ids: Vec<ComponentId> = network.node_ids().cloned().collect();
    proptest::collection::vec(arb_probability(), ids.len()).prop_map(move |values| {
        let mut vector = ProbabilityVector::new();
        for (id, p) in ids.iter().zip(values) {
            vector.insert(id.clone(), Probability::saturating(p));
        }
        vector
    })
}

/// Pair of probability vectors over `network` where the second dominates the
/// first component-wise
pub fn arb_dominating_pair(
    network: &Network,
) -> impl Strategy<Value = (ProbabilityVector, ProbabilityVector)> {
    let ids: Vec<ComponentId> = network.node_ids().cloned().collect();
    proptest::collection::vec((arb_probability(), arb_probability()), ids.len()).prop_map(
        move |pairs| {
            let mut low = ProbabilityVector::new();
            let mut high = ProbabilityVector::new();
            for (id, (x, y)) in ids.iter().zip(pairs) {
                low.insert(id.clone(), Probability::saturating(x.min(y)));
                high.insert(id.clone(), Probability::saturating(x.max(y)));
            }
            (low, high)
        },
    )
}

/// Random networks of `min_nodes..=max_nodes` nodes, generated from a seed
/// so failures shrink to a reproducible case
pub fn arb_small_network(min_nodes: usize, max_nodes: usize) -> impl Strategy<Value = Network> {
    (min_nodes..=max_nodes, 0.2..=0.9f64, any::<u64>()).prop_map(|(n, density, seed)| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        NetworkBuilder::random(n, density, &mut rng).expect("valid generation parameters")
    })
}
