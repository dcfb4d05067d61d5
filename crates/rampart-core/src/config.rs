//! Analysis configuration

use serde::{Deserialize, Serialize};

use crate::component::ComponentId;
use crate::errors::{ResilienceError, Result};

/// Minimum surviving node count for the system to be considered up
pub const CRITICAL_NODE_THRESHOLD: usize = 3;

/// Default enumeration limit for exact reliability evaluation
pub const DEFAULT_MAX_EXACT_NODES: usize = 24;

/// Hard ceiling on exact evaluation, whatever the configuration says
pub const MAX_EXACT_NODES_CEILING: usize = 30;

/// Trait for configuration validation
pub trait ConfigValidation {
    /// Validate configuration parameters
    fn validate(&self) -> Result<()>;
}

/// Which surviving nodes must be mutually connected for the system to be up
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "nodes")]
pub enum ConnectivityScope {
    /// Every operational node must reach every other operational node
    #[default]
    AllSurviving,
    /// The listed nodes must all be operational and mutually reachable
    /// through operational nodes; other survivors may be cut off
    Terminals(Vec<ComponentId>),
}

/// Parameters of the structure function and its evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum operational node count
    pub critical_threshold: usize,
    /// Connectivity requirement over operational nodes
    pub connectivity: ConnectivityScope,
    /// Largest node count evaluated by exhaustive enumeration
    pub max_exact_nodes: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            critical_threshold: CRITICAL_NODE_THRESHOLD,
            connectivity: ConnectivityScope::AllSurviving,
            max_exact_nodes: DEFAULT_MAX_EXACT_NODES,
        }
    }
}

impl AnalysisConfig {
    /// Override the critical threshold
    pub fn with_critical_threshold(mut self, threshold: usize) -> Self {
        self.critical_threshold = threshold;
        self
    }

    /// Override the connectivity scope
    pub fn with_connectivity(mut self, scope: ConnectivityScope) -> Self {
        self.connectivity = scope;
        self
    }

    /// Override the enumeration limit
    pub fn with_max_exact_nodes(mut self, max: usize) -> Self {
        self.max_exact_nodes = max;
        self
    }
}

impl ConfigValidation for AnalysisConfig {
    fn validate(&self) -> Result<()> {
        if self.max_exact_nodes == 0 {
            return Err(ResilienceError::configuration(
                "max_exact_nodes must be greater than 0",
            ));
        }
        if self.max_exact_nodes > MAX_EXACT_NODES_CEILING {
            return Err(ResilienceError::configuration(format!(
                "max_exact_nodes must be at most {MAX_EXACT_NODES_CEILING}"
            )));
        }
        if let ConnectivityScope::Terminals(terminals) = &self.connectivity {
            if terminals.is_empty() {
                return Err(ResilienceError::configuration(
                    "terminal connectivity needs at least one terminal",
                ));
            }
        }
        Ok(())
    }
}
