//! External-event catalog and simulator
//!
//! Each tick draws one occurrence trial per catalog entry. An event that
//! occurs picks a random eligible target and draws a second trial for its
//! impact, amplified by the target's threat level. When a repair
//! probability is set, every failed or compromised component then gets one
//! repair trial that restores its baseline probability on success. Every
//! trial is logged, whether it fires or not.

use rampart_core::{ComponentId, Network, Probability};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

use crate::config::ConfigValidation;
use crate::errors::{Result, SimulatorError};
use crate::state::NetworkState;

/// Kinds of external event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Adversarial compromise of a component
    Attack,
    /// Loss of power at a site
    PowerLoss,
    /// Random hardware fault
    HardwareFailure,
    /// Repair of a failed or compromised component; never a catalog entry
    Recovery,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Attack => "attack",
            Self::PowerLoss => "power_loss",
            Self::HardwareFailure => "hardware_failure",
            Self::Recovery => "recovery",
        };
        f.write_str(label)
    }
}

/// Which components an event can hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetClass {
    /// Nodes only
    #[default]
    Nodes,
    /// Links only
    Links,
    /// Nodes and links
    Any,
}

/// What an impacting event does to its target.
///
/// Every factor multiplies the target's success probability and lies in
/// `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EventEffect {
    /// Status becomes degraded; the component stays targetable
    Degrade {
        /// Multiplier on the target's probability
        factor: f64,
    },
    /// Status becomes compromised
    Compromise {
        /// Multiplier on the target's probability
        factor: f64,
    },
    /// Status becomes failed
    Fail {
        /// Multiplier left on the target's probability, usually zero
        #[serde(default)]
        residual_factor: f64,
    },
}

impl EventEffect {
    fn factor(self) -> f64 {
        match self {
            Self::Degrade { factor } | Self::Compromise { factor } => factor,
            Self::Fail { residual_factor } => residual_factor,
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    /// Event kind, unique within a catalog
    pub kind: EventKind,
    /// Per-tick occurrence probability
    pub occurrence: Probability,
    /// Impact probability given occurrence, before threat amplification
    pub impact: Probability,
    /// Components the event may hit
    #[serde(default)]
    pub target: TargetClass,
    /// Change applied to an impacted target
    pub effect: EventEffect,
}

impl EventSpec {
    /// Create an entry, rejecting out-of-range probabilities
    pub fn new(
        kind: EventKind,
        occurrence: f64,
        impact: f64,
        target: TargetClass,
        effect: EventEffect,
    ) -> Result<Self> {
        Ok(Self {
            kind,
            occurrence: Probability::new(occurrence, &format!("{kind}.occurrence"))?,
            impact: Probability::new(impact, &format!("{kind}.impact"))?,
            target,
            effect,
        })
    }

    /// Impact probability against a target with `threat_level`:
    /// `min(1, impact × (1 + threat_level))`
    pub fn effective_impact(&self, threat_level: Probability) -> f64 {
        (self.impact.value() * (1.0 + threat_level.value())).min(1.0)
    }
}

impl ConfigValidation for EventSpec {
    fn validate(&self) -> Result<()> {
        if self.kind == EventKind::Recovery {
            return Err(SimulatorError::configuration(
                "recovery is driven by repair_probability, not a catalog entry",
            ));
        }
        let factor = self.effect.factor();
        if !(0.0..=1.0).contains(&factor) {
            return Err(SimulatorError::configuration(format!(
                "{} effect factor must be between 0.0 and 1.0, got {factor}",
                self.kind
            )));
        }
        Ok(())
    }
}

/// Ordered set of event entries, at most one per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventCatalog {
    entries: Vec<EventSpec>,
}

impl Default for EventCatalog {
    /// Attack 10% / 30%, power loss 5% / 80%, hardware failure 15% / 20%
    fn default() -> Self {
        let attack = EventSpec {
            kind: EventKind::Attack,
            occurrence: Probability::saturating(0.10),
            impact: Probability::saturating(0.30),
            target: TargetClass::Nodes,
            effect: EventEffect::Compromise { factor: 0.3 },
        };
        let power_loss = EventSpec {
            kind: EventKind::PowerLoss,
            occurrence: Probability::saturating(0.05),
            impact: Probability::saturating(0.80),
            target: TargetClass::Nodes,
            effect: EventEffect::Fail {
                residual_factor: 0.0,
            },
        };
        let hardware_failure = EventSpec {
            kind: EventKind::HardwareFailure,
            occurrence: Probability::saturating(0.15),
            impact: Probability::saturating(0.20),
            target: TargetClass::Any,
            effect: EventEffect::Fail {
                residual_factor: 0.0,
            },
        };
        Self {
            entries: vec![attack, power_loss, hardware_failure],
        }
    }
}

impl EventCatalog {
    /// Catalog with no entries
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Catalog from explicit entries
    pub fn from_entries(entries: Vec<EventSpec>) -> Result<Self> {
        let catalog = Self { entries };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Add or replace the entry for `spec.kind`
    pub fn with(mut self, spec: EventSpec) -> Self {
        match self.entries.iter_mut().find(|e| e.kind == spec.kind) {
            Some(existing) => *existing = spec,
            None => self.entries.push(spec),
        }
        self
    }

    /// Override the probabilities of an existing entry
    pub fn set_probabilities(
        &mut self,
        kind: EventKind,
        occurrence: f64,
        impact: f64,
    ) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.kind == kind)
            .ok_or_else(|| SimulatorError::configuration(format!("no {kind} entry in catalog")))?;
        entry.occurrence = Probability::new(occurrence, &format!("{kind}.occurrence"))?;
        entry.impact = Probability::new(impact, &format!("{kind}.impact"))?;
        Ok(())
    }

    /// Entry for a kind
    pub fn get(&self, kind: EventKind) -> Option<&EventSpec> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Entries in draw order
    pub fn entries(&self) -> &[EventSpec] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigValidation for EventCatalog {
    fn validate(&self) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            entry.validate()?;
            if self.entries[..i].iter().any(|e| e.kind == entry.kind) {
                return Err(SimulatorError::configuration(format!(
                    "event kind {} appears twice in the catalog",
                    entry.kind
                )));
            }
        }
        Ok(())
    }
}

/// One logged trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Tick the trial belongs to
    pub tick: u64,
    /// Simulated seconds at the tick
    pub sim_time: f64,
    /// Event kind, or `Recovery` for a repair trial
    pub kind: EventKind,
    /// Chosen target, if the event occurred and one was eligible
    pub target: Option<ComponentId>,
    /// Whether the occurrence trial (or repair trial) succeeded
    pub occurred: bool,
    /// Whether an eligible target existed
    pub applicable: bool,
    /// Whether the target's state changed
    pub impacted: bool,
    /// Change in the target's probability; zero unless impacted, positive
    /// for a repair
    pub probability_delta: f64,
}

impl EventRecord {
    /// Whether this is an external event that changed a component
    pub fn is_fired_event(&self) -> bool {
        self.impacted && self.kind != EventKind::Recovery
    }

    /// Whether this is a successful repair
    pub fn is_repair(&self) -> bool {
        self.impacted && self.kind == EventKind::Recovery
    }
}

/// Draws catalog events against a network state
#[derive(Debug, Clone)]
pub struct EventSimulator {
    catalog: EventCatalog,
    repair: Probability,
}

impl EventSimulator {
    /// Simulator over a validated catalog, without repairs
    pub fn new(catalog: EventCatalog) -> Result<Self> {
        catalog.validate()?;
        Ok(Self {
            catalog,
            repair: Probability::ZERO,
        })
    }

    /// Builder: per-tick repair probability of each failed or compromised
    /// component
    pub fn with_repair(mut self, repair: Probability) -> Self {
        self.repair = repair;
        self
    }

    /// Active catalog
    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    /// Per-tick repair probability
    pub fn repair_probability(&self) -> Probability {
        self.repair
    }

    /// Run one tick: one record per catalog entry, then one `Recovery`
    /// record per failed or compromised component if repair is enabled.
    /// Components damaged this tick are already eligible for repair.
    pub fn tick<R: Rng + ?Sized>(
        &self,
        network: &Network,
        state: &mut NetworkState,
        tick: u64,
        sim_time: f64,
        rng: &mut R,
    ) -> Result<Vec<EventRecord>> {
        let mut records = Vec::with_capacity(self.catalog.len());
        for spec in self.catalog.entries() {
            let mut record = EventRecord {
                tick,
                sim_time,
                kind: spec.kind,
                target: None,
                occurred: rng.gen_bool(spec.occurrence.value()),
                applicable: false,
                impacted: false,
                probability_delta: 0.0,
            };
            if record.occurred {
                let eligible = state.eligible(network, spec.target);
                if eligible.is_empty() {
                    trace!(tick, kind = %spec.kind, "event occurred with no eligible target");
                } else {
                    let target = eligible[rng.gen_range(0..eligible.len())].clone();
                    let threat = threat_level(network, &target);
                    record.applicable = true;
                    record.impacted = rng.gen_bool(spec.effective_impact(threat));
                    if record.impacted {
                        record.probability_delta = state.apply(&target, spec.effect)?;
                        debug!(
                            tick,
                            kind = %spec.kind,
                            target = %target,
                            delta = record.probability_delta,
                            "event impacted component"
                        );
                    }
                    record.target = Some(target);
                }
            }
            records.push(record);
        }
        if self.repair > Probability::ZERO {
            self.repair_trials(network, state, tick, sim_time, rng, &mut records)?;
        }
        Ok(records)
    }

    fn repair_trials<R: Rng + ?Sized>(
        &self,
        network: &Network,
        state: &mut NetworkState,
        tick: u64,
        sim_time: f64,
        rng: &mut R,
        records: &mut Vec<EventRecord>,
    ) -> Result<()> {
        for target in state.repairable(network) {
            let repaired = rng.gen_bool(self.repair.value());
            let mut record = EventRecord {
                tick,
                sim_time,
                kind: EventKind::Recovery,
                target: None,
                occurred: repaired,
                applicable: true,
                impacted: repaired,
                probability_delta: 0.0,
            };
            if repaired {
                record.probability_delta = state.restore(network, &target)?;
                debug!(
                    tick,
                    target = %target,
                    delta = record.probability_delta,
                    "component repaired"
                );
            }
            record.target = Some(target);
            records.push(record);
        }
        Ok(())
    }
}

fn threat_level(network: &Network, id: &ComponentId) -> Probability {
    network
        .node(id)
        .map(|n| n.threat_level)
        .or_else(|| network.link(id).map(|l| l.threat_level))
        .unwrap_or(Probability::ZERO)
}
