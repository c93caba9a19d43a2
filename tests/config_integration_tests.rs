//! Integration tests for ConfigManager and data file handling
//!
//! These tests verify:
//! - Loading and saving of coefficients, catalog and configuration
//! - Default generation when files are missing
//! - Coefficient validation and environment overrides at load time
//! - Hand-written YAML with decimal-comma attributes compiles as expected

mod common;

use camino::Utf8PathBuf;
use config::Environment;
use pvbom::models::{CoefficientSet, MaterialCatalog, RoofType, Selection};
use pvbom::{ConfigManager, compile};
use std::fs;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

fn create_test_data_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let data_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, data_path)
}

fn no_env() -> Environment {
    ConfigManager::env_overrides().source(Some(config::Map::new()))
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, data_path) = create_test_data_dir();
    let manager = ConfigManager::new(&data_path).unwrap();

    assert_eq!(manager.data_dir(), &data_path);
}

#[test]
fn test_creates_missing_data_dir() {
    let (_temp_dir, data_path) = create_test_data_dir();
    let nested = data_path.join("site").join("data");

    assert_ok!(ConfigManager::new(&nested));
    assert!(nested.exists());
}

#[test]
fn test_full_round_trip_compiles_identically() {
    let (_temp_dir, data_path) = create_test_data_dir();
    let manager = ConfigManager::new(&data_path).unwrap();

    let coefficients = CoefficientSet::default();
    let catalog = common::catalog();
    let mut configuration = common::configuration();
    configuration.options.battery = Some(Selection::new("BAT-5", 2));

    manager.save_coefficients(&coefficients).unwrap();
    manager.save_catalog(&catalog).unwrap();
    manager.save_configuration(&configuration).unwrap();

    let loaded_coefficients = manager.load_coefficients_with(no_env()).unwrap();
    let loaded_catalog = manager.load_catalog().unwrap();
    let loaded_configuration = manager.load_configuration(&loaded_coefficients).unwrap();

    assert_eq!(loaded_configuration, configuration);
    assert_eq!(
        compile(&loaded_configuration, &loaded_catalog, &loaded_coefficients),
        compile(&configuration, &catalog, &coefficients)
    );
}

#[test]
fn test_hand_written_catalog() {
    let (_temp_dir, data_path) = create_test_data_dir();
    let manager = ConfigManager::new(&data_path).unwrap();

    let yaml = r#"
- id: INV-8K
  description: Inverter 8 kW
  category: inverter
  price: 1450.5
  specs:
    "Max. AC-Strom": "12,8"
    "Dongle integriert": "Nein"
- id: MOD-400
  description: Module 400 W
  category: module
  specs:
    Länge: "1.722,0"
    Breite: 1134
"#;
    fs::write(data_path.join("catalog.yaml"), yaml).unwrap();

    let catalog: MaterialCatalog = manager.load_catalog().unwrap();
    assert_eq!(catalog.len(), 2);

    let module = catalog.get("MOD-400").unwrap();
    assert_eq!(
        pvbom::services::spec_number(Some(module), pvbom::services::spec_ids::MODULE_LENGTH),
        1722.0
    );
    let inverter = catalog.get("INV-8K").unwrap();
    assert_eq!(inverter.price, Some(1450.5));
    assert_eq!(
        pvbom::services::spec_number(Some(inverter), pvbom::services::spec_ids::MAX_CURRENT),
        12.8
    );
}

#[test]
fn test_hand_written_configuration() {
    let (_temp_dir, data_path) = create_test_data_dir();
    let manager = ConfigManager::new(&data_path).unwrap();

    let yaml = r#"
module: MOD-430
roof: flat
layout:
  portrait:
    - module_count: 6
inverters:
  - material_id: INV-10K
    quantity: 1
    strings:
      - name: A
        module_count: 6
options:
  wallbox:
    material_id: WB-11
    quantity: 1
"#;
    fs::write(data_path.join("configuration.yaml"), yaml).unwrap();

    let configuration = manager.load_configuration(&CoefficientSet::default()).unwrap();
    assert_eq!(configuration.roof, Some(RoofType::Flat));
    assert_eq!(configuration.total_modules(), 6);
    assert_eq!(configuration.options.wallbox, Some(Selection::new("WB-11", 1)));
    assert!(configuration.mounting.system.is_none());
}

#[test]
fn test_malformed_configuration_reports_path() {
    let (_temp_dir, data_path) = create_test_data_dir();
    let manager = ConfigManager::new(&data_path).unwrap();
    fs::write(data_path.join("configuration.yaml"), "layout: [not, a, layout").unwrap();

    let err = manager
        .load_configuration(&CoefficientSet::default())
        .unwrap_err();
    assert!(err.to_string().contains("configuration.yaml"));
}

#[test]
fn test_unsorted_sizing_table_is_sorted_on_load() {
    let (_temp_dir, data_path) = create_test_data_dir();
    let manager = ConfigManager::new(&data_path).unwrap();

    let mut coefficients = CoefficientSet::default();
    coefficients.sizing.reverse();
    manager.save_coefficients(&coefficients).unwrap();

    let loaded = manager.load_coefficients_with(no_env()).unwrap();
    assert_eq!(loaded.sizing[0].max_ampacity_a, 16.0);
    assert_eq!(loaded.sizing.last().unwrap().max_ampacity_a, 100.0);
}

#[test]
fn test_duplicate_threshold_rejected_at_load() {
    let (_temp_dir, data_path) = create_test_data_dir();
    let manager = ConfigManager::new(&data_path).unwrap();

    let mut coefficients = CoefficientSet::default();
    let duplicate = coefficients.sizing[2].clone();
    coefficients.sizing.push(duplicate);
    manager.save_coefficients(&coefficients).unwrap();

    assert_err!(manager.load_coefficients_with(no_env()));
}

#[test]
fn test_nested_environment_override() {
    let (_temp_dir, data_path) = create_test_data_dir();
    let manager = ConfigManager::new(&data_path).unwrap();
    manager.save_coefficients(&CoefficientSet::default()).unwrap();

    let env = ConfigManager::env_overrides().source(Some(
        [
            ("PVBOM_AC__CABLE_LENGTH_PER_DEVICE_M".to_string(), "20".to_string()),
            ("PVBOM_DONGLE__DEFAULT_MATERIAL".to_string(), "SMART-DONGLE-LAN".to_string()),
        ]
        .into_iter()
        .collect(),
    ));

    let loaded = manager.load_coefficients_with(env).unwrap();
    assert_eq!(loaded.ac.cable_length_per_device_m, 20.0);
    assert_eq!(loaded.dongle.default_material.as_deref(), Some("SMART-DONGLE-LAN"));
}
