//! Success probabilities and probability vectors
//!
//! A [`ProbabilityVector`] is owned by whoever runs an analysis or a
//! simulation session, not by the [`Network`](crate::Network). The same
//! network can be replayed against any number of vectors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::component::ComponentId;
use crate::errors::{ResilienceError, Result};

/// A probability in `[0, 1]`.
///
/// Construction is the only place the range is checked; every value of this
/// type is valid.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Probability(f64);

impl Probability {
    /// Certain failure.
    pub const ZERO: Probability = Probability(0.0);
    /// Certain success.
    pub const ONE: Probability = Probability(1.0);

    /// Validate a raw value. `label` names the component in the error.
    pub fn new(value: f64, label: &str) -> Result<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ResilienceError::invalid_probability(label, value))
        }
    }

    /// Clamp an arbitrary value into range. NaN becomes zero.
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            Self::ZERO
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Raw value
    pub fn value(self) -> f64 {
        self.0
    }

    /// `1 - p`
    pub fn complement(self) -> Self {
        Self(1.0 - self.0)
    }
}

impl TryFrom<f64> for Probability {
    type Error = ResilienceError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value, "value")
    }
}

impl From<Probability> for f64 {
    fn from(p: Probability) -> Self {
        p.0
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Ordered mapping of component id to current success probability.
///
/// Iteration order is insertion order, which keeps enumeration and reports
/// deterministic for a given network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbabilityVector {
    entries: IndexMap<ComponentId, Probability>,
}

impl ProbabilityVector {
    /// Create an empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(id, value)` pairs, rejecting out-of-range values.
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<ComponentId>,
    {
        let mut vector = Self::new();
        for (id, value) in pairs {
            let id = id.into();
            let p = Probability::new(value, id.as_str())?;
            vector.entries.insert(id, p);
        }
        Ok(vector)
    }

    /// Set the probability of a component, inserting it if absent.
    pub fn set(&mut self, id: impl Into<ComponentId>, value: f64) -> Result<()> {
        let id = id.into();
        let p = Probability::new(value, id.as_str())?;
        self.entries.insert(id, p);
        Ok(())
    }

    /// Insert an already validated probability.
    pub fn insert(&mut self, id: impl Into<ComponentId>, p: Probability) {
        self.entries.insert(id.into(), p);
    }

    /// Current probability of a component
    pub fn get(&self, id: &ComponentId) -> Option<Probability> {
        self.entries.get(id).copied()
    }

    /// Raw value, or `UnknownComponent` if absent
    pub fn value_of(&self, id: &ComponentId) -> Result<f64> {
        self.get(id)
            .map(Probability::value)
            .ok_or_else(|| ResilienceError::unknown_component(id.clone()))
    }

    /// Whether the component has an entry
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.entries.contains_key(id)
    }

    /// Remove a component's entry
    pub fn remove(&mut self, id: &ComponentId) -> Option<Probability> {
        self.entries.shift_remove(id)
    }

    /// Copy of this vector with one component pinned up (`1`) or down (`0`).
    pub fn forced(&self, id: &ComponentId, up: bool) -> Result<Self> {
        if !self.contains(id) {
            return Err(ResilienceError::unknown_component(id.clone()));
        }
        let mut copy = self.clone();
        copy.insert(
            id.clone(),
            if up { Probability::ONE } else { Probability::ZERO },
        );
        Ok(copy)
    }

    /// Per-component failure probability, `1 - p`.
    pub fn failure_probabilities(&self) -> IndexMap<ComponentId, f64> {
        self.entries
            .iter()
            .map(|(id, p)| (id.clone(), p.complement().value()))
            .collect()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&ComponentId, Probability)> {
        self.entries.iter().map(|(id, p)| (id, *p))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_range() {
        assert!(Probability::new(0.0, "a").is_ok());
        assert!(Probability::new(1.0, "a").is_ok());
        assert!(Probability::new(-0.01, "a").is_err());
        assert!(Probability::new(1.01, "a").is_err());
        assert!(Probability::new(f64::NAN, "a").is_err());
    }

    #[test]
    fn test_saturating_clamps() {
        assert_eq!(Probability::saturating(1.7).value(), 1.0);
        assert_eq!(Probability::saturating(-3.0).value(), 0.0);
        assert_eq!(Probability::saturating(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_from_pairs_rejects_out_of_range() {
        let err = ProbabilityVector::from_pairs([("a", 0.5), ("b", 1.5)]).unwrap_err();
        assert_eq!(err, ResilienceError::invalid_probability("b", 1.5));
    }

    #[test]
    fn test_forced_pins_one_component() {
        let v = ProbabilityVector::from_pairs([("a", 0.3), ("b", 0.6)]).unwrap();
        let up = v.forced(&"a".into(), true).unwrap();
        let down = v.forced(&"a".into(), false).unwrap();
        assert_eq!(up.value_of(&"a".into()).unwrap(), 1.0);
        assert_eq!(down.value_of(&"a".into()).unwrap(), 0.0);
        assert_eq!(down.value_of(&"b".into()).unwrap(), 0.6);
        assert!(v.forced(&"zz".into(), true).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let bad = r#"{"a": 0.5, "b": 2.0}"#;
        assert!(serde_json::from_str::<ProbabilityVector>(bad).is_err());

        let good = r#"{"a": 0.5, "b": 1.0}"#;
        let v: ProbabilityVector = serde_json::from_str(good).unwrap();
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_failure_probabilities() {
        let v = ProbabilityVector::from_pairs([("a", 0.25), ("b", 1.0)]).unwrap();
        let f = v.failure_probabilities();
        assert_eq!(f[&ComponentId::from("a")], 0.75);
        assert_eq!(f[&ComponentId::from("b")], 0.0);
    }
}
