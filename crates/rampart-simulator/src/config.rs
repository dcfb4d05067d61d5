//! Simulation configuration
//!
//! A [`SimulationConfig`] is passed into each controller explicitly, so
//! several runs can use different catalogs and thresholds side by side.
//! Durations are expressed in milliseconds in TOML.

use rampart_core::{AnalysisConfig, Probability};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::{Result, SimulatorError};
use crate::events::EventCatalog;

/// Trait for configuration validation
pub trait ConfigValidation {
    /// Validate configuration parameters
    fn validate(&self) -> Result<()>;
}

/// Parameters of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wall-clock run length; 0 runs until stopped
    pub duration_ms: u64,
    /// Wall-clock time between ticks
    pub tick_interval_ms: u64,
    /// Simulated seconds added per tick
    pub time_step: f64,
    /// Seed of the event simulator's generator
    pub seed: u64,
    /// Per-tick chance that each failed or compromised component is
    /// repaired; 0 disables repair
    pub repair_probability: Probability,
    /// Structure function and enumeration limits
    pub analysis: AnalysisConfig,
    /// External events drawn each tick
    pub catalog: EventCatalog,
    /// Re-evaluate system reliability every tick
    pub report_reliability: bool,
    /// Recompute Birnbaum importance every tick
    pub report_importance: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 60_000,
            tick_interval_ms: 1_000,
            time_step: 1.0,
            seed: 0,
            repair_probability: Probability::ZERO,
            analysis: AnalysisConfig::default(),
            catalog: EventCatalog::default(),
            report_reliability: true,
            report_importance: false,
        }
    }
}

impl SimulationConfig {
    /// Fast, unbounded, seeded configuration for tests
    pub fn testing_defaults() -> Self {
        Self {
            duration_ms: 0,
            tick_interval_ms: 2,
            seed: 42,
            ..Self::default()
        }
    }

    /// Run length as a duration, `None` if unbounded
    pub fn duration(&self) -> Option<Duration> {
        (self.duration_ms > 0).then(|| Duration::from_millis(self.duration_ms))
    }

    /// Wall-clock tick interval
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Number of ticks in a bounded run (at least one)
    pub fn total_ticks(&self) -> Option<u64> {
        self.duration()
            .map(|_| (self.duration_ms / self.tick_interval_ms.max(1)).max(1))
    }

    /// Builder: seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: catalog
    pub fn with_catalog(mut self, catalog: EventCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Builder: repair probability
    pub fn with_repair_probability(mut self, p: f64) -> Result<Self> {
        self.repair_probability = Probability::new(p, "repair_probability")?;
        Ok(self)
    }

    /// Builder: analysis parameters
    pub fn with_analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.analysis = analysis;
        self
    }

    /// Builder: critical threshold override
    pub fn with_critical_threshold(mut self, threshold: usize) -> Self {
        self.analysis.critical_threshold = threshold;
        self
    }

    /// Builder: run length and tick interval in milliseconds
    pub fn with_timing(mut self, duration_ms: u64, tick_interval_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self.tick_interval_ms = tick_interval_ms;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| SimulatorError::ConfigLoad {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |message: String| SimulatorError::ConfigLoad {
            path: path.display().to_string(),
            message,
        };
        let source = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let config: Self = toml::from_str(&source).map_err(|e| load_error(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| SimulatorError::configuration(e.to_string()))
    }
}

impl ConfigValidation for SimulationConfig {
    fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(SimulatorError::configuration(
                "tick_interval_ms must be greater than 0",
            ));
        }
        if self.duration_ms > 0 && self.duration_ms < self.tick_interval_ms {
            return Err(SimulatorError::configuration(
                "duration_ms must be 0 or at least one tick_interval_ms",
            ));
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(SimulatorError::configuration(
                "time_step must be a positive number of seconds",
            ));
        }
        rampart_core::ConfigValidation::validate(&self.analysis)?;
        self.catalog.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use rampart_core::ConnectivityScope;

    #[test]
    fn test_defaults_validate() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert!(SimulationConfig::testing_defaults().validate().is_ok());
        assert_eq!(SimulationConfig::default().total_ticks(), Some(60));
        assert_eq!(SimulationConfig::testing_defaults().total_ticks(), None);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = SimulationConfig::default().with_timing(1_000, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            duration_ms = 5000
            tick_interval_ms = 100
            seed = 9

            [analysis]
            critical_threshold = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.total_ticks(), Some(50));
        assert_eq!(config.analysis.critical_threshold, 4);
        assert_eq!(config.analysis.connectivity, ConnectivityScope::AllSurviving);
        assert_eq!(config.catalog, EventCatalog::default());
    }

    #[test]
    fn test_catalog_override_from_toml() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [[catalog]]
            kind = "attack"
            occurrence = 0.5
            impact = 1.0
            effect = { kind = "compromise", factor = 0.25 }

            [analysis.connectivity]
            mode = "terminals"
            nodes = ["core", "edge"]
            "#,
        )
        .unwrap();
        assert_eq!(config.catalog.len(), 1);
        let attack = config.catalog.get(EventKind::Attack).unwrap();
        assert_eq!(attack.occurrence.value(), 0.5);
        assert_eq!(
            config.analysis.connectivity,
            ConnectivityScope::Terminals(vec!["core".into(), "edge".into()])
        );
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let err = SimulationConfig::from_toml_str(
            r#"
            [[catalog]]
            kind = "attack"
            occurrence = 1.5
            impact = 0.3
            effect = { kind = "compromise", factor = 0.3 }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SimulatorError::ConfigLoad { .. }));
    }

    #[test]
    fn test_repair_probability_from_toml() {
        let config = SimulationConfig::from_toml_str("repair_probability = 0.25").unwrap();
        assert_eq!(config.repair_probability.value(), 0.25);
        assert_eq!(SimulationConfig::default().repair_probability, Probability::ZERO);
        assert!(SimulationConfig::from_toml_str("repair_probability = 2.0").is_err());
        assert!(SimulationConfig::default().with_repair_probability(-0.1).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SimulationConfig::default().with_seed(77);
        let text = config.to_toml_string().unwrap();
        assert_eq!(SimulationConfig::from_toml_str(&text).unwrap(), config);
    }
}
