//! Simulator error type

use rampart_core::ResilienceError;
use serde::{Deserialize, Serialize};

/// Errors raised while configuring or running a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum SimulatorError {
    /// Failure in the analysis layer
    #[error(transparent)]
    Core(#[from] ResilienceError),

    /// Invalid simulation configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the invalid setting
        message: String,
    },

    /// Configuration file could not be read or parsed
    #[error("Failed to load configuration from {path}: {message}")]
    ConfigLoad {
        /// Path that was being loaded
        path: String,
        /// Underlying I/O or TOML error
        message: String,
    },

    /// Checkpoint could not be encoded, decoded or applied
    #[error("Checkpoint error: {message}")]
    Checkpoint {
        /// Error message
        message: String,
    },

    /// A tick failed and the run was stopped
    #[error("Tick {tick} failed: {message}")]
    Tick {
        /// Tick that failed
        tick: u64,
        /// Error or panic message
        message: String,
    },
}

impl SimulatorError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a checkpoint error
    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::Checkpoint {
            message: message.into(),
        }
    }
}

/// Standard Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimulatorError>;
