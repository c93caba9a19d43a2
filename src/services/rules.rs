//! Rule-based derivation of BOM lines from a configuration.
//!
//! Rules run in a fixed order and only ever append lines or warnings, so the
//! same inputs always produce the same list. Duplicate materials are left for
//! the consolidator.

use crate::models::{
    BomLine, CoefficientSet, Configuration, ConsumableKind, DeviceCounts, MaterialCatalog,
    Selection, Subsystem, configuration::selected_quantity,
};

use super::geometry::{ProfileDimensions, profile_totals};
use super::recommendation::RecommendationEngine;
use super::spec_lookup::{spec_flag, spec_ids};

/// Tolerance absorbing float noise before rounding quantities up.
const CEIL_TOLERANCE: f64 = 1e-9;

/// Device total a per-device consumable is multiplied with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceAggregate {
    Inverters,
    Batteries,
    Wallboxes,
    Backups,
    InvertersAndBatteries,
    InvertersAndWallboxes,
    InvertersAndBackups,
    InvertersWallboxesBackups,
    AllDevices,
}

impl DeviceAggregate {
    fn count(self, d: &DeviceCounts) -> u64 {
        match self {
            DeviceAggregate::Inverters => d.inverters,
            DeviceAggregate::Batteries => d.batteries,
            DeviceAggregate::Wallboxes => d.wallboxes,
            DeviceAggregate::Backups => d.backups,
            DeviceAggregate::InvertersAndBatteries => d.inverters.saturating_add(d.batteries),
            DeviceAggregate::InvertersAndWallboxes => d.inverters.saturating_add(d.wallboxes),
            DeviceAggregate::InvertersAndBackups => d.inverters.saturating_add(d.backups),
            DeviceAggregate::InvertersWallboxesBackups => {
                d.inverters.saturating_add(d.wallboxes).saturating_add(d.backups)
            }
            DeviceAggregate::AllDevices => d
                .inverters
                .saturating_add(d.batteries)
                .saturating_add(d.wallboxes)
                .saturating_add(d.backups),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Basis {
    Fixed,
    PerDevice(DeviceAggregate),
}

/// How each flat-rate consumable is quantified.
const CONSUMABLE_RULES: [(ConsumableKind, Basis); 25] = {
    use Basis::{Fixed, PerDevice};
    use DeviceAggregate::*;
    [
        (ConsumableKind::EqualizationWire, Fixed),
        (ConsumableKind::EqualizationRail, Fixed),
        (ConsumableKind::EarthingClamps, PerDevice(InvertersAndBatteries)),
        (ConsumableKind::CableTies, PerDevice(AllDevices)),
        (ConsumableKind::UvCableTies, Fixed),
        (ConsumableKind::Grommets, PerDevice(AllDevices)),
        (ConsumableKind::CableLugs, PerDevice(InvertersAndBackups)),
        (ConsumableKind::WireFerrules, PerDevice(InvertersWallboxesBackups)),
        (ConsumableKind::InverterFeedCable, PerDevice(Inverters)),
        (ConsumableKind::WallboxFeedCable, PerDevice(Wallboxes)),
        (ConsumableKind::BackupFeedCable, PerDevice(Backups)),
        (ConsumableKind::BatteryDcCable, PerDevice(Batteries)),
        (ConsumableKind::CableDuct, PerDevice(AllDevices)),
        (ConsumableKind::ScrewsAndDowels, PerDevice(AllDevices)),
        (ConsumableKind::JunctionBoxes, PerDevice(Inverters)),
        (ConsumableKind::DinRailTerminals, PerDevice(InvertersWallboxesBackups)),
        (ConsumableKind::NeutralEarthTerminals, PerDevice(InvertersAndBackups)),
        (ConsumableKind::ProtectiveConduit, Fixed),
        (ConsumableKind::InstallationTube, PerDevice(InvertersAndBatteries)),
        (ConsumableKind::FireSeal, Fixed),
        (ConsumableKind::EthernetCable, PerDevice(InvertersAndWallboxes)),
        (ConsumableKind::Rj45Plugs, PerDevice(InvertersAndWallboxes)),
        (ConsumableKind::HeatShrink, PerDevice(Inverters)),
        (ConsumableKind::CircuitLabels, Fixed),
        (ConsumableKind::SmallParts, PerDevice(AllDevices)),
    ]
};

/// Round a derived quantity up to whole units.
pub fn ceil_quantity(value: f64) -> f64 {
    if value <= 0.0 {
        0.0
    } else {
        (value - CEIL_TOLERANCE).ceil()
    }
}

/// Message of the string/layout parity warning.
pub fn parity_warning(wired: u64, laid_out: u64) -> String {
    format!(
        "String plan wires {} modules but the layout contains {}",
        wired, laid_out
    )
}

/// Unconsolidated rule output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Augmented {
    pub lines: Vec<BomLine>,
    pub warnings: Vec<String>,
}

/// Applies every derivation rule to one configuration snapshot.
pub struct RuleAugmenter<'a> {
    config: &'a Configuration,
    catalog: &'a MaterialCatalog,
    coefficients: &'a CoefficientSet,
    devices: DeviceCounts,
    out: Augmented,
}

impl<'a> RuleAugmenter<'a> {
    pub fn new(
        config: &'a Configuration,
        catalog: &'a MaterialCatalog,
        coefficients: &'a CoefficientSet,
    ) -> Self {
        Self {
            config,
            catalog,
            coefficients,
            devices: config.device_counts(),
            out: Augmented::default(),
        }
    }

    /// Run all rules in order.
    pub fn run(mut self) -> Augmented {
        self.add_modules();
        self.add_inverters();
        self.add_mounting();
        self.add_clamps();
        self.add_profiles();
        self.add_dc_cabling();
        self.add_selections();
        self.add_auto_dongles();
        self.add_grounding_electrodes();
        self.add_recommendations();
        if self.has_installation() {
            self.add_consumables();
            self.add_warning_label();
        }

        tracing::debug!(
            "Rules produced {} lines and {} warnings",
            self.out.lines.len(),
            self.out.warnings.len()
        );
        self.out
    }

    fn has_installation(&self) -> bool {
        self.config.total_modules() > 0 || self.devices.inverters > 0
    }

    fn push_configured(&mut self, material_id: Option<&str>, quantity: f64) {
        if let Some(id) = usable(material_id, quantity) {
            let line = BomLine::configured(id, quantity, self.catalog);
            self.out.lines.push(line);
        }
    }

    fn push_derived(&mut self, material_id: Option<&str>, quantity: f64) {
        if let Some(id) = usable(material_id, quantity) {
            let line = BomLine::derived(id, quantity, self.catalog);
            self.out.lines.push(line);
        }
    }

    fn already_listed(&self, material_id: &str) -> bool {
        self.out.lines.iter().any(|l| l.material_id == material_id)
    }

    fn add_modules(&mut self) {
        let config = self.config;
        self.push_configured(config.module.as_deref(), config.total_modules() as f64);
    }

    fn add_inverters(&mut self) {
        for inverter in &self.config.inverters {
            if let Some(id) = usable(Some(&inverter.material_id), f64::from(inverter.quantity)) {
                let line = BomLine::configured(id, f64::from(inverter.quantity), self.catalog);
                self.out.lines.push(line);
            }
        }

        let (wired, laid_out) = (
            self.config.total_string_modules(),
            self.config.total_modules(),
        );
        if wired != laid_out {
            tracing::warn!("String/module parity mismatch: {} wired, {} laid out", wired, laid_out);
            self.out.warnings.push(parity_warning(wired, laid_out));
        }
    }

    fn add_mounting(&mut self) {
        let config = self.config;
        let modules = config.total_modules() as f64;
        let systems = ceil_quantity(modules * self.coefficients.mounting.ratio);
        let mounting = &config.mounting;

        self.push_configured(mounting.system.as_deref(), systems);
        if usable(mounting.system.as_deref(), systems).is_some() {
            self.push_configured(mounting.fastener.as_deref(), systems * 2.0);
        }
    }

    fn add_clamps(&mut self) {
        let config = self.config;
        let rows = config.total_rows();
        let modules = config.total_modules();
        let end_clamps = rows.saturating_mul(4);
        let mid_clamps = modules.saturating_sub(rows).saturating_mul(2);

        let mounting = &config.mounting;
        self.push_configured(mounting.end_clamp.as_deref(), end_clamps as f64);
        self.push_configured(mounting.mid_clamp.as_deref(), mid_clamps as f64);
    }

    fn add_profiles(&mut self) {
        let config = self.config;
        let mounting = &config.mounting;
        if !config.is_tile_roof() || non_blank(mounting.profile.as_deref()).is_none() {
            return;
        }

        let dims = ProfileDimensions::from_catalog(config, self.catalog);
        if dims.profile_length_mm <= 0.0 {
            tracing::warn!(
                "Profile {:?} has no usable length, skipping profile sizing",
                mounting.profile
            );
        }
        let totals = profile_totals(&config.layout, &dims);
        tracing::debug!(
            "Tile roof profiles: {} profiles, {} connectors",
            totals.profiles,
            totals.connectors
        );

        self.push_configured(mounting.profile.as_deref(), totals.profiles as f64);
        self.push_configured(mounting.profile_connector.as_deref(), totals.connectors as f64);
    }

    fn add_dc_cabling(&mut self) {
        let strings = self.config.total_strings() as f64;
        let coefficients = self.coefficients;
        let dc = &coefficients.dc;

        self.push_derived(
            dc.connector_material.as_deref(),
            strings * dc.connector_pairs_per_string,
        );
        self.push_derived(
            dc.cable_material.as_deref(),
            strings * dc.cable_length_per_string_m * 2.0,
        );
    }

    fn add_selections(&mut self) {
        let config = self.config;
        let selections: Vec<&Selection> = config
            .options
            .named()
            .into_iter()
            .chain(config.electrical.named())
            .filter_map(|(_, selection)| selection.as_ref())
            .filter(|s| s.is_complete())
            .collect();

        for selection in selections {
            self.push_configured(Some(&selection.material_id), f64::from(selection.quantity));
        }
    }

    fn add_auto_dongles(&mut self) {
        let config = self.config;
        if selected_quantity(&config.options.smart_dongle) > 0 {
            return;
        }

        let manager = config.options.energy_management.as_ref();
        if let Some(manager) = manager.filter(|s| s.is_complete()) {
            let material = self.catalog.get(&manager.material_id);
            if spec_flag(material, spec_ids::REPLACES_DONGLE) == Some(true) {
                tracing::debug!(
                    "Energy manager {} replaces the dongle, no dongle added",
                    manager.material_id
                );
                return;
            }
        }

        let coefficients = self.coefficients;
        let Some(dongle) = non_blank(coefficients.dongle.default_material.as_deref()) else {
            return;
        };
        if self.already_listed(dongle) {
            return;
        }

        let needed: u64 = config
            .inverters
            .iter()
            .filter(|inverter| {
                let material = self.catalog.get(&inverter.material_id);
                spec_flag(material, spec_ids::DONGLE_INTEGRATED) == Some(false)
            })
            .map(|inverter| u64::from(inverter.quantity))
            .sum();

        self.push_derived(Some(dongle), needed as f64);
    }

    fn add_grounding_electrodes(&mut self) {
        let rods = selected_quantity(&self.config.electrical.grounding_rod);
        if rods == 0 {
            return;
        }
        let coefficients = self.coefficients;
        let grounding = &coefficients.grounding;
        let Some(electrode) = non_blank(grounding.electrode_material.as_deref()) else {
            return;
        };
        if self.already_listed(electrode) {
            return;
        }

        let quantity = rods as f64 * grounding.multiplier;
        self.push_derived(Some(electrode), quantity);
    }

    fn add_recommendations(&mut self) {
        let engine = RecommendationEngine::new(self.catalog, self.coefficients);
        let cable_length = self.coefficients.ac.cable_length_per_device_m;

        for subsystem in Subsystem::ALL {
            let count = engine.device_count(subsystem, self.config);
            if count == 0 {
                continue;
            }
            let chosen = engine.chosen(subsystem, self.config);
            let count = count as f64;

            self.push_configured(chosen.breaker_id.as_deref(), count);
            self.push_configured(chosen.cable_id.as_deref(), count * cable_length);
            self.push_configured(chosen.rcd_id.as_deref(), count);
        }
    }

    fn add_consumables(&mut self) {
        let coefficients = self.coefficients;
        for (kind, basis) in CONSUMABLE_RULES {
            let item = coefficients.consumables.item(kind);
            let quantity = match basis {
                Basis::Fixed => item.quantity,
                Basis::PerDevice(aggregate) => aggregate.count(&self.devices) as f64 * item.quantity,
            };
            self.push_derived(item.material_id(), quantity);
        }
    }

    fn add_warning_label(&mut self) {
        let coefficients = self.coefficients;
        let labels = &coefficients.labels;
        let label = if self.devices.backups > 0 {
            labels.backup_power.as_deref()
        } else if self.devices.batteries > 0 {
            labels.battery.as_deref()
        } else {
            labels.pv.as_deref()
        };
        self.push_derived(label, labels.quantity);
    }
}

fn non_blank(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.trim().is_empty())
}

/// Identifier to emit when both the material and the quantity are usable.
fn usable(material_id: Option<&str>, quantity: f64) -> Option<&str> {
    non_blank(material_id).filter(|_| quantity.is_finite() && quantity > 0.0)
}
