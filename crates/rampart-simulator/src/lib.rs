//! Rampart Simulator - Time-Stepped External-Event Simulation
//!
//! Drives `rampart-core` analysis through simulated time. Each tick draws
//! stochastic external events (attacks, power loss, hardware failure)
//! against a per-run copy of the network state, then re-evaluates system
//! reliability and, optionally, Birnbaum importance.
//!
//! # Components
//!
//! - `EventSimulator`: seeded Bernoulli occurrence and impact trials
//! - `SimulationEngine`: one tick at a time, deterministic for a seed
//! - `SimulationController`: pausable real-time loop on a worker thread,
//!   with observer notifications
//! - `SessionCheckpoint`: bincode snapshot that resumes a run exactly
//!
//! # Example
//!
//! ```rust,no_run
//! use rampart_core::{LinkKind, Network, Node, NodeKind};
//! use rampart_simulator::{Notification, SimulationConfig, SimulationController};
//! use std::time::Duration;
//!
//! let mut network = Network::new("lab");
//! for id in ["a", "b", "c"] {
//!     network.add_node(Node::new(id, NodeKind::Server)).unwrap();
//! }
//! network.connect("a", "b", LinkKind::Fiber).unwrap();
//! network.connect("b", "c", LinkKind::Fiber).unwrap();
//!
//! let controller = SimulationController::new(network, SimulationConfig::default()).unwrap();
//! controller.subscribe_fn(|n: &Notification| println!("{n:?}"));
//! controller.start();
//! controller.wait_until_stopped(Duration::from_secs(120));
//! ```

#![forbid(unsafe_code)]

/// Simulation configuration and TOML loading
pub mod config;

/// Per-tick simulation engine
pub mod engine;

/// Simulator error type
pub mod errors;

/// Event catalog and external-event simulator
pub mod events;

/// Tick metrics, run states and observers
pub mod metrics;

/// Sessions and checkpoints
pub mod session;

/// Mutable per-run network state
pub mod state;

/// Threaded start/pause/resume/stop controller
pub mod controller;

pub use config::{ConfigValidation, SimulationConfig};
pub use controller::SimulationController;
pub use engine::SimulationEngine;
pub use errors::{Result, SimulatorError};
pub use events::{
    EventCatalog, EventEffect, EventKind, EventRecord, EventSimulator, EventSpec, TargetClass,
};
pub use metrics::{
    ControlEvent, Notification, ObserverId, RunState, SimulationObserver, TickMetrics,
};
pub use session::{SessionCheckpoint, SimulationSession};
pub use state::{NetworkState, StatusCounts};
