//! Read-only connectivity matrix view of a network

use serde::{Deserialize, Serialize};

use crate::component::ComponentId;
use crate::errors::{ResilienceError, Result};
use crate::network::Network;
use crate::probability::ProbabilityVector;

/// Symmetric node-by-node connectivity matrix.
///
/// Row and column `i` both refer to `order[i]`. The diagonal is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyMatrix {
    order: Vec<ComponentId>,
    cells: Vec<Vec<bool>>,
}

impl AdjacencyMatrix {
    /// Derive the matrix from a network's current nodes and links
    pub fn from_network(network: &Network) -> Self {
        let order: Vec<ComponentId> = network.node_ids().cloned().collect();
        let n = order.len();
        let mut cells = vec![vec![false; n]; n];
        for link in network.links() {
            let i = order.iter().position(|id| id == &link.source);
            let j = order.iter().position(|id| id == &link.target);
            if let (Some(i), Some(j)) = (i, j) {
                cells[i][j] = true;
                cells[j][i] = true;
            }
        }
        Self { order, cells }
    }

    /// Build from raw 0/1 rows supplied by a caller.
    ///
    /// Fails with `InvalidTopology` when the matrix is not square, does not
    /// match the length of `order`, repeats an identifier, contains values
    /// other than 0 and 1, or is not symmetric.
    pub fn from_rows(order: Vec<ComponentId>, rows: &[Vec<u8>]) -> Result<Self> {
        let n = order.len();
        if rows.len() != n {
            return Err(ResilienceError::invalid_topology(format!(
                "matrix has {} rows for {n} nodes",
                rows.len()
            )));
        }
        for (i, id) in order.iter().enumerate() {
            if order[..i].contains(id) {
                return Err(ResilienceError::invalid_topology(format!(
                    "node {id} appears twice in the matrix order"
                )));
            }
        }
        let mut cells = vec![vec![false; n]; n];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(ResilienceError::invalid_topology(format!(
                    "row {i} has {} columns, expected {n}",
                    row.len()
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                cells[i][j] = match value {
                    0 => false,
                    1 => true,
                    other => {
                        return Err(ResilienceError::invalid_topology(format!(
                            "cell ({i}, {j}) holds {other}, expected 0 or 1"
                        )))
                    }
                };
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if cells[i][j] != cells[j][i] {
                    return Err(ResilienceError::invalid_topology(format!(
                        "matrix is not symmetric at ({i}, {j})"
                    )));
                }
            }
        }
        Ok(Self { order, cells })
    }

    /// Node identifiers in row order
    pub fn order(&self) -> &[ComponentId] {
        &self.order
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the matrix has no nodes
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Row index of a node
    pub fn index_of(&self, id: &ComponentId) -> Option<usize> {
        self.order.iter().position(|o| o == id)
    }

    /// Whether nodes `i` and `j` are linked
    pub fn connected(&self, i: usize, j: usize) -> bool {
        i != j && self.cells[i][j]
    }

    /// Node degree by row index
    pub fn degree(&self, i: usize) -> usize {
        (0..self.len()).filter(|&j| self.connected(i, j)).count()
    }

    /// Number of undirected links
    pub fn link_count(&self) -> usize {
        (0..self.len()).map(|i| self.degree(i)).sum::<usize>() / 2
    }

    /// Neighbour bitmasks, one per row. Requires at most 64 nodes.
    pub fn neighbor_masks(&self) -> Result<Vec<u64>> {
        if self.len() > 64 {
            return Err(ResilienceError::NetworkTooLarge {
                nodes: self.len(),
                max: 64,
            });
        }
        Ok((0..self.len())
            .map(|i| {
                (0..self.len())
                    .filter(|&j| self.connected(i, j))
                    .fold(0u64, |mask, j| mask | (1 << j))
            })
            .collect())
    }

    /// Success probabilities in row order.
    ///
    /// Fails with `InvalidTopology` if any node of the matrix has no entry
    /// in `probabilities`. Extra entries (links, removed nodes) are ignored.
    pub fn probabilities_in_order(&self, probabilities: &ProbabilityVector) -> Result<Vec<f64>> {
        self.order
            .iter()
            .map(|id| {
                probabilities.get(id).map(|p| p.value()).ok_or_else(|| {
                    ResilienceError::invalid_topology(format!(
                        "node {id} has no success probability"
                    ))
                })
            })
            .collect()
    }
}
