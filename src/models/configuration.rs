use serde::{Deserialize, Serialize};

use super::coefficients::CoefficientSet;

/// Roof type the installation is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofType {
    Tile,
    Trapezoidal,
    Flat,
}

/// Module orientation of a row.
///
/// Landscape modules lie with their long edge along the rails, portrait
/// modules with their short edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Module dimension that runs along the rail for this orientation.
    pub fn rail_dimension(self, module_length_mm: f64, module_width_mm: f64) -> f64 {
        match self {
            Orientation::Landscape => module_length_mm,
            Orientation::Portrait => module_width_mm,
        }
    }
}

/// A material chosen together with its quantity.
///
/// Either the whole selection is present or it is absent (`Option<Selection>`);
/// there is no half-filled state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub material_id: String,
    pub quantity: u32,
}

impl Selection {
    pub fn new(material_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            material_id: material_id.into(),
            quantity,
        }
    }

    /// A selection is usable when it names a material and a positive quantity.
    pub fn is_complete(&self) -> bool {
        !self.material_id.trim().is_empty() && self.quantity > 0
    }
}

/// Count of selected units, treating absent or incomplete selections as zero.
pub fn selected_quantity(selection: &Option<Selection>) -> u64 {
    selection
        .as_ref()
        .filter(|s| s.is_complete())
        .map(|s| u64::from(s.quantity))
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRow {
    pub module_count: u32,
}

impl ModuleRow {
    pub fn new(module_count: u32) -> Self {
        Self { module_count }
    }
}

/// Module rows, kept separately per orientation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleLayout {
    #[serde(default)]
    pub portrait: Vec<ModuleRow>,

    #[serde(default)]
    pub landscape: Vec<ModuleRow>,
}

impl ModuleLayout {
    /// Rows of both orientations, portrait first.
    pub fn rows(&self) -> impl Iterator<Item = (Orientation, &ModuleRow)> {
        self.portrait
            .iter()
            .map(|row| (Orientation::Portrait, row))
            .chain(self.landscape.iter().map(|row| (Orientation::Landscape, row)))
    }

    pub fn total_modules(&self) -> u64 {
        self.rows().map(|(_, row)| u64::from(row.module_count)).sum()
    }

    /// Number of rows that actually hold modules.
    pub fn total_rows(&self) -> u64 {
        self.rows().filter(|(_, row)| row.module_count > 0).count() as u64
    }
}

/// Mounting hardware selections. Quantities are derived, not entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountingSelection {
    #[serde(default)]
    pub system: Option<String>,

    #[serde(default)]
    pub fastener: Option<String>,

    #[serde(default)]
    pub end_clamp: Option<String>,

    #[serde(default)]
    pub mid_clamp: Option<String>,

    /// Rail profile, only sized on tile roofs.
    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default)]
    pub profile_connector: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringEntry {
    pub name: String,
    pub module_count: u32,
}

impl StringEntry {
    pub fn new(name: impl Into<String>, module_count: u32) -> Self {
        Self {
            name: name.into(),
            module_count,
        }
    }
}

/// One inverter model with its quantity and string plan.
///
/// The string plan covers the whole entry; it is not repeated per unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InverterEntry {
    pub material_id: String,
    pub quantity: u32,

    #[serde(default)]
    pub strings: Vec<StringEntry>,
}

impl InverterEntry {
    pub fn new(material_id: impl Into<String>, quantity: u32, strings: Vec<StringEntry>) -> Self {
        Self {
            material_id: material_id.into(),
            quantity,
            strings,
        }
    }

    /// Names a material and at least one unit.
    pub fn is_complete(&self) -> bool {
        !self.material_id.trim().is_empty() && self.quantity > 0
    }

    pub fn total_strings(&self) -> u64 {
        self.strings.len() as u64
    }

    /// Modules wired by the string plan.
    pub fn total_string_modules(&self) -> u64 {
        self.strings.iter().map(|s| u64::from(s.module_count)).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalSubsystems {
    #[serde(default)]
    pub optimizer: Option<Selection>,
    #[serde(default)]
    pub battery: Option<Selection>,
    #[serde(default)]
    pub wallbox: Option<Selection>,
    #[serde(default)]
    pub energy_management: Option<Selection>,
    #[serde(default)]
    pub backup: Option<Selection>,
    #[serde(default)]
    pub smart_dongle: Option<Selection>,
}

impl OptionalSubsystems {
    /// Named selections in line order.
    pub fn named(&self) -> [(&'static str, &Option<Selection>); 6] {
        [
            ("optimizer", &self.optimizer),
            ("battery", &self.battery),
            ("wallbox", &self.wallbox),
            ("energy_management", &self.energy_management),
            ("backup", &self.backup),
            ("smart_dongle", &self.smart_dongle),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectricalComponents {
    #[serde(default)]
    pub surge_arrester: Option<Selection>,
    #[serde(default)]
    pub grounding_rod: Option<Selection>,
    #[serde(default)]
    pub combiner: Option<Selection>,
    #[serde(default)]
    pub meter_cabinet: Option<Selection>,
    #[serde(default)]
    pub connection_box: Option<Selection>,
    #[serde(default)]
    pub auxiliary_supply: Option<Selection>,
}

impl ElectricalComponents {
    pub fn named(&self) -> [(&'static str, &Option<Selection>); 6] {
        [
            ("surge_arrester", &self.surge_arrester),
            ("grounding_rod", &self.grounding_rod),
            ("combiner", &self.combiner),
            ("meter_cabinet", &self.meter_cabinet),
            ("connection_box", &self.connection_box),
            ("auxiliary_supply", &self.auxiliary_supply),
        ]
    }
}

/// Current-consuming subsystems that receive breaker/cable recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    Inverter,
    Wallbox,
    Backup,
}

impl Subsystem {
    pub const ALL: [Subsystem; 3] = [Subsystem::Inverter, Subsystem::Wallbox, Subsystem::Backup];

    pub fn as_str(self) -> &'static str {
        match self {
            Subsystem::Inverter => "inverter",
            Subsystem::Wallbox => "wallbox",
            Subsystem::Backup => "backup",
        }
    }
}

/// Breaker, cable and residual-current device identifiers for one subsystem.
///
/// Used both for computed recommendations and for user overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub breaker_id: Option<String>,
    #[serde(default)]
    pub cable_id: Option<String>,
    #[serde(default)]
    pub rcd_id: Option<String>,
}

impl Recommendation {
    pub fn is_empty(&self) -> bool {
        self.breaker_id.is_none() && self.cable_id.is_none() && self.rcd_id.is_none()
    }
}

/// User overrides of recommended protection, per subsystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationOverrides {
    #[serde(default)]
    pub inverter: Recommendation,
    #[serde(default)]
    pub wallbox: Recommendation,
    #[serde(default)]
    pub backup: Recommendation,
}

impl RecommendationOverrides {
    pub fn get(&self, subsystem: Subsystem) -> &Recommendation {
        match subsystem {
            Subsystem::Inverter => &self.inverter,
            Subsystem::Wallbox => &self.wallbox,
            Subsystem::Backup => &self.backup,
        }
    }

    pub fn get_mut(&mut self, subsystem: Subsystem) -> &mut Recommendation {
        match subsystem {
            Subsystem::Inverter => &mut self.inverter,
            Subsystem::Wallbox => &mut self.wallbox,
            Subsystem::Backup => &mut self.backup,
        }
    }
}

/// Per-unit device counts used by the flat-rate and recommendation rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCounts {
    pub inverters: u64,
    pub batteries: u64,
    pub wallboxes: u64,
    pub backups: u64,
}

/// The planned installation as entered in the configurator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub roof: Option<RoofType>,

    #[serde(default)]
    pub layout: ModuleLayout,

    #[serde(default)]
    pub mounting: MountingSelection,

    #[serde(default)]
    pub inverters: Vec<InverterEntry>,

    #[serde(default)]
    pub options: OptionalSubsystems,

    #[serde(default)]
    pub electrical: ElectricalComponents,

    #[serde(default)]
    pub overrides: RecommendationOverrides,
}

impl Configuration {
    /// Create a configuration pre-populated from the declared defaults.
    pub fn with_defaults(coefficients: &CoefficientSet) -> Self {
        let defaults = &coefficients.defaults;
        Self {
            module: defaults.module.clone(),
            roof: defaults.roof,
            mounting: MountingSelection {
                system: defaults.mounting_system.clone(),
                fastener: defaults.fastener.clone(),
                end_clamp: defaults.end_clamp.clone(),
                mid_clamp: defaults.mid_clamp.clone(),
                profile: defaults.profile.clone(),
                profile_connector: defaults.profile_connector.clone(),
            },
            electrical: ElectricalComponents {
                surge_arrester: defaults.surge_arrester.clone(),
                grounding_rod: defaults.grounding_rod.clone(),
                meter_cabinet: defaults.meter_cabinet.clone(),
                ..ElectricalComponents::default()
            },
            ..Self::default()
        }
    }

    pub fn total_modules(&self) -> u64 {
        self.layout.total_modules()
    }

    pub fn total_rows(&self) -> u64 {
        self.layout.total_rows()
    }

    pub fn total_strings(&self) -> u64 {
        self.inverters.iter().map(InverterEntry::total_strings).sum()
    }

    pub fn total_string_modules(&self) -> u64 {
        self.inverters.iter().map(InverterEntry::total_string_modules).sum()
    }

    /// Installed inverter units; entries without a material are not counted.
    pub fn inverter_units(&self) -> u64 {
        self.inverters
            .iter()
            .filter(|i| i.is_complete())
            .map(|i| u64::from(i.quantity))
            .sum()
    }

    pub fn device_counts(&self) -> DeviceCounts {
        DeviceCounts {
            inverters: self.inverter_units(),
            batteries: selected_quantity(&self.options.battery),
            wallboxes: selected_quantity(&self.options.wallbox),
            backups: selected_quantity(&self.options.backup),
        }
    }

    pub fn is_tile_roof(&self) -> bool {
        self.roof == Some(RoofType::Tile)
    }
}
