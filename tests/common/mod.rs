//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use pvbom::models::{
    CoefficientSet, Configuration, InverterEntry, Material, MaterialCatalog, ModuleLayout,
    ModuleRow, RoofType, StringEntry,
};

/// A small catalog with the attributes the rules read.
pub fn catalog() -> MaterialCatalog {
    vec![
        Material::new("MOD-430", "Module 430 W", "module")
            .with_spec("module_length_mm", 1700.0)
            .with_spec("module_width_mm", 1100.0)
            .with_price(95.0),
        Material::new("INV-10K", "Hybrid inverter 10 kW", "inverter")
            .with_spec("max_ac_current_a", "16,0")
            .with_spec("dongle_integrated", "nein")
            .with_price(1890.0),
        Material::new("INV-20K", "Inverter 20 kW", "inverter")
            .with_spec("imax_ac", 29.0)
            .with_spec("dongle_integrated", "ja"),
        Material::new("WB-11", "Wallbox 11 kW", "wallbox").with_spec("max_current_a", 16.0),
        Material::new("BKP-3P", "Backup box three-phase", "backup").with_spec("max_current_a", 50.0),
        Material::new("BAT-5", "Battery module 5 kWh", "battery"),
        Material::new("EMS-PRO", "Energy manager", "ems").with_spec("replaces_dongle", "ja"),
        Material::new("EMS-BASIC", "Energy meter", "ems").with_spec("replaces_dongle", "nein"),
        Material::new("RAIL-PROFILE-6000", "Rail profile 6 m", "mounting")
            .with_spec("profile_length_mm", "6000"),
        Material::new("END-CLAMP-35", "End clamp 35 mm", "mounting").with_spec("clamp_width_mm", 30.0),
        Material::new("MID-CLAMP-35", "Mid clamp 35 mm", "mounting").with_spec("clamp_width_mm", 20.0),
        Material::new("CABLE-TIE-200", "Cable tie 200 mm", "consumable"),
    ]
    .into()
}

/// Ten landscape modules on a tile roof, one inverter with two strings of five.
pub fn configuration() -> Configuration {
    Configuration {
        module: Some("MOD-430".to_string()),
        roof: Some(RoofType::Tile),
        layout: ModuleLayout {
            portrait: Vec::new(),
            landscape: vec![ModuleRow::new(10)],
        },
        inverters: vec![InverterEntry::new(
            "INV-10K",
            1,
            vec![StringEntry::new("A", 5), StringEntry::new("B", 5)],
        )],
        ..Configuration::with_defaults(&CoefficientSet::default())
    }
}
