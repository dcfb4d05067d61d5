//! Loading simulation configuration from TOML files

use assert_matches::assert_matches;
use rampart_core::ConnectivityScope;
use rampart_simulator::{EventEffect, EventKind, SimulationConfig, SimulatorError, TargetClass};
use std::io::Write;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
duration_ms = 5000
tick_interval_ms = 100
seed = 7
report_importance = true

[analysis]
critical_threshold = 2
connectivity = { mode = "terminals", nodes = ["server1", "client1"] }

[[catalog]]
kind = "attack"
occurrence = 0.5
impact = 0.25
target = "nodes"
effect = { kind = "compromise", factor = 0.3 }

[[catalog]]
kind = "hardware_failure"
occurrence = 0.1
impact = 0.2
target = "any"
effect = { kind = "fail" }
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(CONFIG);
    let config = SimulationConfig::load(file.path()).unwrap();

    assert_eq!(config.seed, 7);
    assert_eq!(config.total_ticks(), Some(50));
    assert!(config.report_reliability);
    assert!(config.report_importance);
    assert_eq!(config.analysis.critical_threshold, 2);
    assert_matches!(config.analysis.connectivity, ConnectivityScope::Terminals(ref nodes) if nodes.len() == 2);

    assert_eq!(config.catalog.len(), 2);
    let attack = config.catalog.get(EventKind::Attack).unwrap();
    assert_eq!(attack.occurrence.value(), 0.5);
    assert_eq!(attack.effect, EventEffect::Compromise { factor: 0.3 });
    let hardware = config.catalog.get(EventKind::HardwareFailure).unwrap();
    assert_eq!(hardware.target, TargetClass::Any);
    assert_eq!(hardware.effect, EventEffect::Fail { residual_factor: 0.0 });
    assert!(config.catalog.get(EventKind::PowerLoss).is_none());
}

#[test]
fn test_saved_config_loads_back() {
    let config = SimulationConfig::default().with_seed(99).with_critical_threshold(4);
    let file = write_config(&config.to_toml_string().unwrap());
    assert_eq!(SimulationConfig::load(file.path()).unwrap(), config);
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = SimulationConfig::load(&path).unwrap_err();
    assert_matches!(err, SimulatorError::ConfigLoad { path: ref p, .. } if p.ends_with("absent.toml"));
}

#[test]
fn test_invalid_values_rejected() {
    let file = write_config("tick_interval_ms = 0\n");
    assert_matches!(
        SimulationConfig::load(file.path()),
        Err(SimulatorError::Configuration { .. })
    );

    let file = write_config("[[catalog]]\nkind = \"attack\"\noccurrence = 2.0\nimpact = 0.1\neffect = { kind = \"degrade\", factor = 0.5 }\n");
    assert_matches!(
        SimulationConfig::load(file.path()),
        Err(SimulatorError::ConfigLoad { .. })
    );

    let file = write_config("[[catalog]]\nkind = \"attack\"\noccurrence = 0.2\nimpact = 0.1\neffect = { kind = \"degrade\", factor = 1.5 }\n");
    assert_matches!(
        SimulationConfig::load(file.path()),
        Err(SimulatorError::Configuration { .. })
    );
}
