//! Network graph model
//!
//! A [`Network`] is an undirected graph of [`Node`]s joined by [`Link`]s.
//! Every link endpoint references an existing node; the graph need not be
//! connected. The adjacency view used by the evaluators is derived from the
//! network on demand and is never edited independently.

use indexmap::IndexMap;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adjacency::AdjacencyMatrix;
use crate::component::{ComponentId, Link, LinkKind, Node, NodeKind};
use crate::errors::{ResilienceError, Result};
use crate::probability::{Probability, ProbabilityVector};

/// Plain definition handed over by a topology builder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkDefinition {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Nodes in insertion order
    pub nodes: Vec<Node>,
    /// Links in insertion order
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Undirected network of nodes and links
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkDefinition", into = "NetworkDefinition")]
pub struct Network {
    name: String,
    nodes: IndexMap<ComponentId, Node>,
    links: IndexMap<ComponentId, Link>,
}

impl Network {
    /// Create an empty network
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a node. Identifiers must be unique across nodes and links.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) || self.links.contains_key(&node.id) {
            return Err(ResilienceError::DuplicateComponent { id: node.id });
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Add a link between two existing nodes.
    pub fn add_link(&mut self, link: Link) -> Result<()> {
        for endpoint in [&link.source, &link.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(ResilienceError::invalid_topology(format!(
                    "link {} references unknown node {endpoint}",
                    link.id
                )));
            }
        }
        if link.source == link.target {
            return Err(ResilienceError::invalid_topology(format!(
                "link {} is a self loop",
                link.id
            )));
        }
        if self.link_between(&link.source, &link.target).is_some() {
            return Err(ResilienceError::invalid_topology(format!(
                "nodes {} and {} are already linked",
                link.source, link.target
            )));
        }
        if self.links.contains_key(&link.id) || self.nodes.contains_key(&link.id) {
            return Err(ResilienceError::DuplicateComponent { id: link.id });
        }
        self.links.insert(link.id.clone(), link);
        Ok(())
    }

    /// Convenience: link two nodes with a default link of `kind`.
    pub fn connect(
        &mut self,
        source: impl Into<ComponentId>,
        target: impl Into<ComponentId>,
        kind: LinkKind,
    ) -> Result<()> {
        self.add_link(Link::new(source, target, kind))
    }

    /// Remove a node together with every link touching it.
    pub fn remove_node(&mut self, id: &ComponentId) -> Result<Node> {
        let node = self
            .nodes
            .shift_remove(id)
            .ok_or_else(|| ResilienceError::unknown_component(id.clone()))?;
        let before = self.links.len();
        self.links.retain(|_, link| !link.touches(id));
        debug!(
            node = %id,
            links_removed = before - self.links.len(),
            "removed node"
        );
        Ok(node)
    }

    /// Remove a single link
    pub fn remove_link(&mut self, id: &ComponentId) -> Result<Link> {
        self.links
            .shift_remove(id)
            .ok_or_else(|| ResilienceError::unknown_component(id.clone()))
    }

    /// Look up a node
    pub fn node(&self, id: &ComponentId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a link
    pub fn link(&self, id: &ComponentId) -> Option<&Link> {
        self.links.get(id)
    }

    /// The link joining two nodes, in either orientation
    pub fn link_between(&self, a: &ComponentId, b: &ComponentId) -> Option<&Link> {
        self.links.values().find(|l| {
            (&l.source == a && &l.target == b) || (&l.source == b && &l.target == a)
        })
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Links in insertion order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Node identifiers in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.nodes.keys()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Whether `id` names a node or a link
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.nodes.contains_key(id) || self.links.contains_key(id)
    }

    /// Neighbours of a node
    pub fn neighbors<'a>(&'a self, id: &'a ComponentId) -> impl Iterator<Item = &'a ComponentId> {
        self.links.values().filter_map(move |l| l.other_end(id))
    }

    /// Number of links touching a node
    pub fn degree(&self, id: &ComponentId) -> usize {
        self.neighbors(id).count()
    }

    /// Derived connectivity matrix over the current node and link set
    pub fn adjacency(&self) -> AdjacencyMatrix {
        AdjacencyMatrix::from_network(self)
    }

    /// Baseline success probabilities for every node and link
    pub fn baseline_probabilities(&self) -> ProbabilityVector {
        let mut vector = ProbabilityVector::new();
        for node in self.nodes.values() {
            vector.insert(node.id.clone(), node.reliability);
        }
        for link in self.links.values() {
            vector.insert(link.id.clone(), link.reliability);
        }
        vector
    }

    /// Baseline success probabilities for nodes only
    pub fn node_probabilities(&self) -> ProbabilityVector {
        let mut vector = ProbabilityVector::new();
        for node in self.nodes.values() {
            vector.insert(node.id.clone(), node.reliability);
        }
        vector
    }

    fn graph(&self) -> (UnGraph<(), ()>, IndexMap<&ComponentId, NodeIndex>) {
        let mut graph = UnGraph::with_capacity(self.nodes.len(), self.links.len());
        let index: IndexMap<&ComponentId, NodeIndex> = self
            .nodes
            .keys()
            .map(|id| (id, graph.add_node(())))
            .collect();
        for link in self.links.values() {
            if let (Some(&a), Some(&b)) = (index.get(&link.source), index.get(&link.target)) {
                graph.add_edge(a, b, ());
            }
        }
        (graph, index)
    }

    /// Number of connected components (zero for an empty network)
    pub fn component_count(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let (graph, _) = self.graph();
        petgraph::algo::connected_components(&graph)
    }

    /// Whether every node can reach every other node
    pub fn is_connected(&self) -> bool {
        self.component_count() == 1
    }

    /// Fraction of ordered node pairs joined by a path
    pub fn connectivity_coefficient(&self) -> f64 {
        let n = self.nodes.len();
        if n <= 1 {
            return if n == 1 { 1.0 } else { 0.0 };
        }
        let (graph, _) = self.graph();
        let mut sets = UnionFind::<usize>::new(graph.node_count());
        for edge in graph.raw_edges() {
            sets.union(edge.source().index(), edge.target().index());
        }
        let mut sizes: IndexMap<usize, usize> = IndexMap::new();
        for label in sets.into_labeling() {
            *sizes.entry(label).or_insert(0) += 1;
        }
        let reachable: usize = sizes.values().map(|s| s * (s - 1)).sum();
        reachable as f64 / (n * (n - 1)) as f64
    }
}

impl TryFrom<NetworkDefinition> for Network {
    type Error = ResilienceError;

    fn try_from(def: NetworkDefinition) -> Result<Self> {
        let mut network = Network::new(def.name);
        for node in def.nodes {
            network.add_node(node)?;
        }
        for link in def.links {
            network.add_link(link)?;
        }
        Ok(network)
    }
}

impl From<Network> for NetworkDefinition {
    fn from(network: Network) -> Self {
        Self {
            name: network.name,
            nodes: network.nodes.into_values().collect(),
            links: network.links.into_values().collect(),
        }
    }
}

/// Random network generation from kind profiles
pub struct NetworkBuilder;

impl NetworkBuilder {
    /// Generate `num_nodes` nodes of random kinds and link each pair with
    /// probability `connection_prob`.
    pub fn random<R: Rng + ?Sized>(
        num_nodes: usize,
        connection_prob: f64,
        rng: &mut R,
    ) -> Result<Network> {
        let connection_prob = Probability::new(connection_prob, "connection_prob")?.value();
        let mut network = Network::new("random");

        for i in 0..num_nodes {
            let kind = NodeKind::ALL[rng.gen_range(0..NodeKind::ALL.len())];
            let profile = kind.profile();
            let node = Node::new(format!("node_{i}"), kind)
                .with_capacity(rng.gen_range(profile.capacity.clone()))?
                .with_reliability(rng.gen_range(profile.reliability.clone()))?;
            network.add_node(node)?;
        }

        let ids: Vec<ComponentId> = network.node_ids().cloned().collect();
        for (i, source) in ids.iter().enumerate() {
            for target in &ids[i + 1..] {
                if rng.gen_bool(connection_prob) {
                    let kind = LinkKind::ALL[rng.gen_range(0..LinkKind::ALL.len())];
                    let profile = kind.profile();
                    let mut link = Link::new(source, target, kind)
                        .with_bandwidth(rng.gen_range(profile.capacity.clone()))
                        .with_reliability(rng.gen_range(profile.reliability.clone()))?;
                    link.latency = rng.gen_range(profile.latency.clone());
                    network.add_link(link)?;
                }
            }
        }
        Ok(network)
    }
}
