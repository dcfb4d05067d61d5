//! Rampart Core - Network Reliability & Resilience Analysis
//!
//! Exact probabilistic survivability of a communication network modelled as
//! an undirected graph of independently failing components.
//!
//! # Layers
//!
//! ## Data Model
//! - `Node`, `Link`: components with a success probability `p ∈ [0, 1]`,
//!   a threat level and an operational status
//! - `Network`: undirected graph; every link endpoint is an existing node
//! - `AdjacencyMatrix`: derived read-only connectivity view
//! - `ProbabilityVector`: id → `p`, owned by the caller, not the network
//!
//! ## Analysis
//! - `ReliabilityEvaluator`: exhaustive `2^n` structure-function evaluation
//! - `BirnbaumImportance`: `B_i = R(p | x_i=1) - R(p | x_i=0)`
//! - `FragilityAnalyzer`: progressive node removal down to the critical
//!   threshold
//! - `durbin_watson`, `autocorrelation`: residual diagnostics
//!
//! # Complexity
//!
//! Exact evaluation is exponential in the node count. Networks above
//! `AnalysisConfig::max_exact_nodes` (default 24, never above 30) are
//! rejected with `NetworkTooLarge`.

#![forbid(unsafe_code)]

/// Unified error handling
pub mod errors;

/// Validated probabilities and probability vectors
pub mod probability;

/// Nodes, links and kind profiles
pub mod component;

/// Network graph model and random generation
pub mod network;

/// Derived connectivity matrix
pub mod adjacency;

/// Analysis configuration
pub mod config;

/// Structure-function reliability evaluation
pub mod reliability;

/// Birnbaum importance ranking
pub mod importance;

/// Node-removal fragility analysis
pub mod fragility;

/// Residual autocorrelation diagnostics
pub mod diagnostics;

/// Tabular reliability report
pub mod report;

// === Public API Re-exports ===

pub use adjacency::AdjacencyMatrix;
pub use component::{
    ComponentId, ComponentStatus, KindProfile, Link, LinkKind, Node, NodeKind,
    DEFAULT_THREAT_LEVEL,
};
pub use config::{
    AnalysisConfig, ConfigValidation, ConnectivityScope, CRITICAL_NODE_THRESHOLD,
    DEFAULT_MAX_EXACT_NODES, MAX_EXACT_NODES_CEILING,
};
pub use diagnostics::{
    autocorrelation, durbin_watson, durbin_watson_with_bounds, Autocorrelation, DurbinWatson,
    DurbinWatsonBounds,
};
pub use errors::{ResilienceError, Result};
pub use fragility::{
    ascending_importance_order, check_critical_threshold, FragilityAnalyzer, FragilityReport,
    FragilitySnapshot, ThresholdStatus,
};
pub use importance::{BirnbaumImportance, Criticality, ImportanceRanking};
pub use network::{Network, NetworkBuilder, NetworkDefinition};
pub use probability::{Probability, ProbabilityVector};
pub use reliability::{ReliabilityEstimate, ReliabilityEvaluator};
pub use report::{NodeRow, ReliabilityReport, SystemRow};
