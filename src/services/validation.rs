//! Per-stage structural checks for the configurator wizard.
//!
//! Each check is a pure function of the configuration and is re-run on every
//! attempt to move forward. A non-empty result blocks the forward transition;
//! moving back is never checked.

use serde::Serialize;

use crate::models::{Configuration, Selection, WizardStage};

/// A missing or invalid field, named by its path in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "required")
    }
}

/// Issues that block leaving `stage` forwards.
pub fn validate_stage(stage: WizardStage, config: &Configuration) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    match stage {
        WizardStage::ModuleAndRoof => check_module_and_roof(config, &mut issues),
        WizardStage::Mounting => check_mounting(config, &mut issues),
        WizardStage::Inverters => check_inverters(config, &mut issues),
        WizardStage::OptionalComponents => {
            for (name, selection) in config.options.named() {
                check_pair(&format!("options.{}", name), selection, &mut issues);
            }
        }
        WizardStage::ElectricalComponents => {
            for (name, selection) in config.electrical.named() {
                check_pair(&format!("electrical.{}", name), selection, &mut issues);
            }
        }
        WizardStage::Review => {}
    }
    issues
}

/// Issues of every stage before `stage`, in stage order.
pub fn validate_through(stage: WizardStage, config: &Configuration) -> Vec<ValidationIssue> {
    WizardStage::ALL
        .into_iter()
        .take_while(|s| *s < stage)
        .flat_map(|s| validate_stage(s, config))
        .collect()
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn check_module_and_roof(config: &Configuration, issues: &mut Vec<ValidationIssue>) {
    if is_blank(&config.module) {
        issues.push(ValidationIssue::missing("module"));
    }
    if config.roof.is_none() {
        issues.push(ValidationIssue::missing("roof"));
    }

    for (name, rows) in [("portrait", &config.layout.portrait), ("landscape", &config.layout.landscape)] {
        for (index, row) in rows.iter().enumerate() {
            if row.module_count == 0 {
                issues.push(ValidationIssue::new(
                    format!("layout.{}[{}].module_count", name, index),
                    "row must contain at least one module",
                ));
            }
        }
    }
    if config.total_modules() == 0 {
        issues.push(ValidationIssue::new("layout", "at least one module row is required"));
    }
}

fn check_mounting(config: &Configuration, issues: &mut Vec<ValidationIssue>) {
    let mounting = &config.mounting;
    for (field, value) in [
        ("mounting.system", &mounting.system),
        ("mounting.end_clamp", &mounting.end_clamp),
        ("mounting.mid_clamp", &mounting.mid_clamp),
    ] {
        if is_blank(value) {
            issues.push(ValidationIssue::missing(field));
        }
    }
    if !is_blank(&mounting.profile_connector) && is_blank(&mounting.profile) {
        issues.push(ValidationIssue::new(
            "mounting.profile",
            "a profile connector needs a profile",
        ));
    }
}

fn check_inverters(config: &Configuration, issues: &mut Vec<ValidationIssue>) {
    if config.inverters.is_empty() {
        issues.push(ValidationIssue::new("inverters", "at least one inverter is required"));
        return;
    }

    for (i, inverter) in config.inverters.iter().enumerate() {
        if inverter.material_id.trim().is_empty() {
            issues.push(ValidationIssue::missing(format!("inverters[{}].material_id", i)));
        }
        if inverter.quantity == 0 {
            issues.push(ValidationIssue::new(
                format!("inverters[{}].quantity", i),
                "quantity must be at least 1",
            ));
        }
        if inverter.strings.is_empty() {
            issues.push(ValidationIssue::new(
                format!("inverters[{}].strings", i),
                "at least one string is required",
            ));
        }
        for (j, string) in inverter.strings.iter().enumerate() {
            if string.module_count == 0 {
                issues.push(ValidationIssue::new(
                    format!("inverters[{}].strings[{}].module_count", i, j),
                    "string must contain at least one module",
                ));
            }
        }
    }

    let (wired, laid_out) = (config.total_string_modules(), config.total_modules());
    if wired != laid_out {
        issues.push(ValidationIssue::new(
            "inverters.strings",
            format!("strings wire {} modules but the layout has {}", wired, laid_out),
        ));
    }
}

fn check_pair(field: &str, selection: &Option<Selection>, issues: &mut Vec<ValidationIssue>) {
    let Some(selection) = selection else {
        return;
    };
    if selection.material_id.trim().is_empty() {
        issues.push(ValidationIssue::new(
            format!("{}.material_id", field),
            "a quantity was entered without a material",
        ));
    }
    if selection.quantity == 0 {
        issues.push(ValidationIssue::new(
            format!("{}.quantity", field),
            "a material was selected without a quantity",
        ));
    }
}
