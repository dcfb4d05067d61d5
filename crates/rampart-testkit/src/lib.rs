//! Rampart Testing Infrastructure
//!
//! Shared fixtures, proptest strategies and observers used by the tests of
//! `rampart-core` and `rampart-simulator`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! rampart-testkit = { path = "../rampart-testkit" }
//! ```
//!
//! ```rust,no_run
//! use rampart_testkit::*;
//!
//! let network = sample_network();
//! let probs = network.node_probabilities();
//! assert_eq!(probs.len(), 6);
//! ```

pub mod fixtures;
pub mod observer;
pub mod strategies;

pub use fixtures::*;
pub use observer::RecordingObserver;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `warn`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
