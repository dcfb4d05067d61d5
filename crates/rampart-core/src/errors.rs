//! Unified error system for rampart analysis
//!
//! Every computational failure is raised synchronously at the call that
//! triggered it. Nothing in this crate retries internally.

use serde::{Deserialize, Serialize};

use crate::component::ComponentId;

/// Error type for all analysis operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum ResilienceError {
    /// A probability or threat level outside `[0, 1]`
    #[error("Invalid probability {value} for {component}: must lie in [0, 1]")]
    InvalidProbability {
        /// Component (or field) the value was supplied for
        component: String,
        /// Offending value
        value: f64,
    },

    /// The network has no nodes
    #[error("Network has no nodes")]
    EmptyNetwork,

    /// Connectivity matrix is malformed or disagrees with the node set
    #[error("Invalid topology: {message}")]
    InvalidTopology {
        /// Error message describing the inconsistency
        message: String,
    },

    /// A fragility sequence was halted at the critical threshold
    #[error("Critical threshold reached: {remaining} nodes would remain, minimum is {threshold}")]
    CriticalThresholdReached {
        /// Node count the refused removal would have left
        remaining: usize,
        /// Configured minimum node count
        threshold: usize,
    },

    /// Diagnostic input too short or degenerate
    #[error("Insufficient data: {message}")]
    InsufficientData {
        /// Error message describing the shortfall
        message: String,
    },

    /// Referenced component does not exist
    #[error("Unknown component: {id}")]
    UnknownComponent {
        /// Identifier that failed to resolve
        id: ComponentId,
    },

    /// Component identifier already in use
    #[error("Duplicate component: {id}")]
    DuplicateComponent {
        /// Identifier that collided
        id: ComponentId,
    },

    /// Exhaustive enumeration refused for this many nodes
    #[error("Network too large for exact evaluation: {nodes} nodes, limit is {max}")]
    NetworkTooLarge {
        /// Node count of the rejected network
        nodes: usize,
        /// Configured enumeration limit
        max: usize,
    },

    /// Invalid analysis configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the invalid setting
        message: String,
    },
}

impl ResilienceError {
    /// Create an invalid probability error
    pub fn invalid_probability(component: impl Into<String>, value: f64) -> Self {
        Self::InvalidProbability {
            component: component.into(),
            value,
        }
    }

    /// Create an invalid topology error
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// Create an insufficient data error
    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: message.into(),
        }
    }

    /// Create an unknown component error
    pub fn unknown_component(id: impl Into<ComponentId>) -> Self {
        Self::UnknownComponent { id: id.into() }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Standard Result type for analysis operations
pub type Result<T> = std::result::Result<T, ResilienceError>;
