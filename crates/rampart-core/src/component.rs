//! Network components: nodes, links and their kind profiles
//!
//! Kinds never change behaviour structurally. Each kind only selects a row
//! of default parameter ranges from [`KindProfile`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::errors::{ResilienceError, Result};
use crate::probability::Probability;

/// Default threat level for freshly built components
pub const DEFAULT_THREAT_LEVEL: f64 = 0.1;

/// Identifier of a node or link
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Create a new identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier used for the link between `source` and `target`
    pub fn link(source: &ComponentId, target: &ComponentId) -> Self {
        Self(format!("{}--{}", source.0, target.0))
    }

    /// Borrow as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&ComponentId> for ComponentId {
    fn from(id: &ComponentId) -> Self {
        id.clone()
    }
}

/// Operational status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// Working normally
    #[default]
    Operational,
    /// Working with reduced capacity
    Degraded,
    /// Under adversarial control
    Compromised,
    /// Out of service
    Failed,
}

impl ComponentStatus {
    /// Whether the component can still be targeted by external events
    pub fn is_operational(self) -> bool {
        matches!(self, Self::Operational | Self::Degraded)
    }
}

/// Node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Application or data host
    Server,
    /// Layer-3 forwarding device
    Router,
    /// Layer-2 forwarding device
    Switch,
    /// End-user device
    Client,
    /// Edge between network segments
    Gateway,
    /// Traffic filtering device
    Firewall,
}

impl NodeKind {
    /// All node kinds, in declaration order
    pub const ALL: [NodeKind; 6] = [
        Self::Server,
        Self::Router,
        Self::Switch,
        Self::Client,
        Self::Gateway,
        Self::Firewall,
    ];

    /// Default parameter ranges for this kind
    pub fn profile(self) -> KindProfile {
        match self {
            Self::Server => KindProfile::new(500.0..=1000.0, 0.0..=0.0, 0.95..=0.99),
            Self::Router => KindProfile::new(300.0..=600.0, 0.0..=0.0, 0.93..=0.98),
            Self::Switch => KindProfile::new(100.0..=400.0, 0.0..=0.0, 0.94..=0.99),
            Self::Client => KindProfile::new(50.0..=150.0, 0.0..=0.0, 0.85..=0.95),
            Self::Gateway => KindProfile::new(200.0..=500.0, 0.0..=0.0, 0.90..=0.97),
            Self::Firewall => KindProfile::new(150.0..=300.0, 0.0..=0.0, 0.90..=0.96),
        }
    }
}

/// Link kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Wired Ethernet
    Ethernet,
    /// 802.11 wireless LAN
    Wifi,
    /// Optical fiber
    Fiber,
    /// Copper line other than Ethernet
    Copper,
    /// Long-range radio link
    Wireless,
}

impl LinkKind {
    /// All link kinds, in declaration order
    pub const ALL: [LinkKind; 5] = [
        Self::Ethernet,
        Self::Wifi,
        Self::Fiber,
        Self::Copper,
        Self::Wireless,
    ];

    /// Default parameter ranges for this kind
    pub fn profile(self) -> KindProfile {
        match self {
            Self::Ethernet => KindProfile::new(10.0..=100.0, 1.0..=5.0, 0.95..=0.99),
            Self::Wifi => KindProfile::new(10.0..=50.0, 5.0..=30.0, 0.85..=0.95),
            Self::Fiber => KindProfile::new(100.0..=1000.0, 1.0..=10.0, 0.97..=0.99),
            Self::Copper => KindProfile::new(10.0..=100.0, 2.0..=10.0, 0.92..=0.98),
            Self::Wireless => KindProfile::new(5.0..=50.0, 10.0..=50.0, 0.80..=0.93),
        }
    }
}

/// Default parameter ranges associated with a component kind
#[derive(Debug, Clone, PartialEq)]
pub struct KindProfile {
    /// Capacity or bandwidth, Mbit/s
    pub capacity: RangeInclusive<f64>,
    /// Latency, ms (zero range for nodes)
    pub latency: RangeInclusive<f64>,
    /// Success probability
    pub reliability: RangeInclusive<f64>,
}

impl KindProfile {
    fn new(
        capacity: RangeInclusive<f64>,
        latency: RangeInclusive<f64>,
        reliability: RangeInclusive<f64>,
    ) -> Self {
        Self {
            capacity,
            latency,
            reliability,
        }
    }

    /// Midpoint of the reliability range
    pub fn typical_reliability(&self) -> f64 {
        (self.reliability.start() + self.reliability.end()) / 2.0
    }
}

/// A network node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identifier
    pub id: ComponentId,
    /// Kind tag
    pub kind: NodeKind,
    /// Capacity, Mbit/s
    pub capacity: f64,
    /// Baseline success probability
    pub reliability: Probability,
    /// Failure amplification used by the event simulator
    pub threat_level: Probability,
    /// Status at construction time
    pub status: ComponentStatus,
}

impl Node {
    /// Node with the midpoint reliability and lower capacity bound of its kind
    pub fn new(id: impl Into<ComponentId>, kind: NodeKind) -> Self {
        let profile = kind.profile();
        Self {
            id: id.into(),
            kind,
            capacity: *profile.capacity.start(),
            reliability: Probability::saturating(profile.typical_reliability()),
            threat_level: Probability::saturating(DEFAULT_THREAT_LEVEL),
            status: ComponentStatus::Operational,
        }
    }

    /// Set the success probability, rejecting out-of-range values
    pub fn with_reliability(mut self, p: f64) -> Result<Self> {
        self.reliability = Probability::new(p, self.id.as_str())?;
        Ok(self)
    }

    /// Set the threat level, rejecting out-of-range values
    pub fn with_threat_level(mut self, level: f64) -> Result<Self> {
        self.threat_level = Probability::new(level, &format!("{}.threat_level", self.id))?;
        Ok(self)
    }

    /// Set the capacity
    pub fn with_capacity(mut self, capacity: f64) -> Result<Self> {
        if !capacity.is_finite() || capacity < 0.0 {
            return Err(ResilienceError::configuration(format!(
                "capacity of {} must be a non-negative number, got {capacity}",
                self.id
            )));
        }
        self.capacity = capacity;
        Ok(self)
    }
}

/// An undirected link between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Identifier, `source--target`
    pub id: ComponentId,
    /// First endpoint
    pub source: ComponentId,
    /// Second endpoint
    pub target: ComponentId,
    /// Kind tag
    pub kind: LinkKind,
    /// Bandwidth, Mbit/s
    pub bandwidth: f64,
    /// Latency, ms
    pub latency: f64,
    /// Baseline success probability
    pub reliability: Probability,
    /// Failure amplification used by the event simulator
    pub threat_level: Probability,
    /// Status at construction time
    pub status: ComponentStatus,
}

impl Link {
    /// Link with the midpoint reliability and lower bounds of its kind
    pub fn new(
        source: impl Into<ComponentId>,
        target: impl Into<ComponentId>,
        kind: LinkKind,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        let profile = kind.profile();
        Self {
            id: ComponentId::link(&source, &target),
            source,
            target,
            kind,
            bandwidth: *profile.capacity.start(),
            latency: *profile.latency.start(),
            reliability: Probability::saturating(profile.typical_reliability()),
            threat_level: Probability::saturating(DEFAULT_THREAT_LEVEL),
            status: ComponentStatus::Operational,
        }
    }

    /// Set the success probability, rejecting out-of-range values
    pub fn with_reliability(mut self, p: f64) -> Result<Self> {
        self.reliability = Probability::new(p, self.id.as_str())?;
        Ok(self)
    }

    /// Set the threat level, rejecting out-of-range values
    pub fn with_threat_level(mut self, level: f64) -> Result<Self> {
        self.threat_level = Probability::new(level, &format!("{}.threat_level", self.id))?;
        Ok(self)
    }

    /// Set bandwidth
    pub fn with_bandwidth(mut self, bandwidth: f64) -> Self {
        self.bandwidth = bandwidth.max(0.0);
        self
    }

    /// Whether this link touches `node`
    pub fn touches(&self, node: &ComponentId) -> bool {
        &self.source == node || &self.target == node
    }

    /// The endpoint opposite `node`, if `node` is an endpoint
    pub fn other_end(&self, node: &ComponentId) -> Option<&ComponentId> {
        if &self.source == node {
            Some(&self.target)
        } else if &self.target == node {
            Some(&self.source)
        } else {
            None
        }
    }
}
