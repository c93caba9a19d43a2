use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::configuration::{RoofType, Selection};

/// Errors detected when validating a coefficient set at load time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoefficientError {
    #[error("Coefficient {field} must be finite and non-negative, got {value}")]
    InvalidCoefficient { field: String, value: f64 },

    #[error("Sizing table is empty")]
    EmptySizingTable,

    #[error("Sizing bucket {index} is invalid: {reason}")]
    InvalidSizingBucket { index: usize, reason: String },

    #[error("Duplicate sizing threshold {0} A")]
    DuplicateSizingThreshold(f64),
}

/// Mounting-system coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountingCoefficients {
    /// Mounting-system units per module.
    pub ratio: f64,
}

/// DC side: connectors and string cabling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcCoefficients {
    #[serde(default)]
    pub connector_material: Option<String>,
    pub connector_pairs_per_string: f64,

    #[serde(default)]
    pub cable_material: Option<String>,

    /// Single-conductor run per string in metres; plus and minus are added.
    pub cable_length_per_string_m: f64,
}

/// AC side: recommended cable runs and fixed protection devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcCoefficients {
    /// Cable length per current-consuming device in metres.
    pub cable_length_per_device_m: f64,

    #[serde(default)]
    pub wallbox_rcd_material: Option<String>,
}

/// One bucket of the ampacity sizing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingBucket {
    pub cross_section_mm2: f64,
    pub max_ampacity_a: f64,
    pub breaker_rating_a: f64,

    /// Standard breaker for this bucket.
    #[serde(default)]
    pub breaker_material: Option<String>,

    /// Standard cable for this bucket.
    #[serde(default)]
    pub cable_material: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DongleCoefficients {
    #[serde(default)]
    pub default_material: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingCoefficients {
    #[serde(default)]
    pub electrode_material: Option<String>,

    /// Electrodes per selected grounding rod.
    pub multiplier: f64,
}

/// Warning-label materials, chosen by priority backup > battery > PV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCoefficients {
    #[serde(default)]
    pub backup_power: Option<String>,
    #[serde(default)]
    pub battery: Option<String>,
    #[serde(default)]
    pub pv: Option<String>,
    pub quantity: f64,
}

/// A flat-rate consumable: a material and either a fixed quantity or a
/// per-device coefficient, depending on the rule that consumes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatRateItem {
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub quantity: f64,
}

impl FlatRateItem {
    pub fn new(material: &str, quantity: f64) -> Self {
        Self {
            material: Some(material.to_string()),
            quantity,
        }
    }

    /// Configured material, ignoring blank identifiers.
    pub fn material_id(&self) -> Option<&str> {
        self.material.as_deref().filter(|m| !m.trim().is_empty())
    }
}

/// Identifies one flat-rate consumable rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumableKind {
    EqualizationWire,
    EqualizationRail,
    EarthingClamps,
    CableTies,
    UvCableTies,
    Grommets,
    CableLugs,
    WireFerrules,
    InverterFeedCable,
    WallboxFeedCable,
    BackupFeedCable,
    BatteryDcCable,
    CableDuct,
    ScrewsAndDowels,
    JunctionBoxes,
    DinRailTerminals,
    NeutralEarthTerminals,
    ProtectiveConduit,
    InstallationTube,
    FireSeal,
    EthernetCable,
    Rj45Plugs,
    HeatShrink,
    CircuitLabels,
    SmallParts,
}

impl ConsumableKind {
    pub const ALL: [ConsumableKind; 25] = [
        ConsumableKind::EqualizationWire,
        ConsumableKind::EqualizationRail,
        ConsumableKind::EarthingClamps,
        ConsumableKind::CableTies,
        ConsumableKind::UvCableTies,
        ConsumableKind::Grommets,
        ConsumableKind::CableLugs,
        ConsumableKind::WireFerrules,
        ConsumableKind::InverterFeedCable,
        ConsumableKind::WallboxFeedCable,
        ConsumableKind::BackupFeedCable,
        ConsumableKind::BatteryDcCable,
        ConsumableKind::CableDuct,
        ConsumableKind::ScrewsAndDowels,
        ConsumableKind::JunctionBoxes,
        ConsumableKind::DinRailTerminals,
        ConsumableKind::NeutralEarthTerminals,
        ConsumableKind::ProtectiveConduit,
        ConsumableKind::InstallationTube,
        ConsumableKind::FireSeal,
        ConsumableKind::EthernetCable,
        ConsumableKind::Rj45Plugs,
        ConsumableKind::HeatShrink,
        ConsumableKind::CircuitLabels,
        ConsumableKind::SmallParts,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            ConsumableKind::EqualizationWire => "equalization_wire",
            ConsumableKind::EqualizationRail => "equalization_rail",
            ConsumableKind::EarthingClamps => "earthing_clamps",
            ConsumableKind::CableTies => "cable_ties",
            ConsumableKind::UvCableTies => "uv_cable_ties",
            ConsumableKind::Grommets => "grommets",
            ConsumableKind::CableLugs => "cable_lugs",
            ConsumableKind::WireFerrules => "wire_ferrules",
            ConsumableKind::InverterFeedCable => "inverter_feed_cable",
            ConsumableKind::WallboxFeedCable => "wallbox_feed_cable",
            ConsumableKind::BackupFeedCable => "backup_feed_cable",
            ConsumableKind::BatteryDcCable => "battery_dc_cable",
            ConsumableKind::CableDuct => "cable_duct",
            ConsumableKind::ScrewsAndDowels => "screws_and_dowels",
            ConsumableKind::JunctionBoxes => "junction_boxes",
            ConsumableKind::DinRailTerminals => "din_rail_terminals",
            ConsumableKind::NeutralEarthTerminals => "neutral_earth_terminals",
            ConsumableKind::ProtectiveConduit => "protective_conduit",
            ConsumableKind::InstallationTube => "installation_tube",
            ConsumableKind::FireSeal => "fire_seal",
            ConsumableKind::EthernetCable => "ethernet_cable",
            ConsumableKind::Rj45Plugs => "rj45_plugs",
            ConsumableKind::HeatShrink => "heat_shrink",
            ConsumableKind::CircuitLabels => "circuit_labels",
            ConsumableKind::SmallParts => "small_parts",
        }
    }
}

/// Flat-rate consumables, one named field per rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumableCoefficients {
    pub equalization_wire: FlatRateItem,
    pub equalization_rail: FlatRateItem,
    pub earthing_clamps: FlatRateItem,
    pub cable_ties: FlatRateItem,
    pub uv_cable_ties: FlatRateItem,
    pub grommets: FlatRateItem,
    pub cable_lugs: FlatRateItem,
    pub wire_ferrules: FlatRateItem,
    pub inverter_feed_cable: FlatRateItem,
    pub wallbox_feed_cable: FlatRateItem,
    pub backup_feed_cable: FlatRateItem,
    pub battery_dc_cable: FlatRateItem,
    pub cable_duct: FlatRateItem,
    pub screws_and_dowels: FlatRateItem,
    pub junction_boxes: FlatRateItem,
    pub din_rail_terminals: FlatRateItem,
    pub neutral_earth_terminals: FlatRateItem,
    pub protective_conduit: FlatRateItem,
    pub installation_tube: FlatRateItem,
    pub fire_seal: FlatRateItem,
    pub ethernet_cable: FlatRateItem,
    pub rj45_plugs: FlatRateItem,
    pub heat_shrink: FlatRateItem,
    pub circuit_labels: FlatRateItem,
    pub small_parts: FlatRateItem,
}

impl ConsumableCoefficients {
    pub fn item(&self, kind: ConsumableKind) -> &FlatRateItem {
        match kind {
            ConsumableKind::EqualizationWire => &self.equalization_wire,
            ConsumableKind::EqualizationRail => &self.equalization_rail,
            ConsumableKind::EarthingClamps => &self.earthing_clamps,
            ConsumableKind::CableTies => &self.cable_ties,
            ConsumableKind::UvCableTies => &self.uv_cable_ties,
            ConsumableKind::Grommets => &self.grommets,
            ConsumableKind::CableLugs => &self.cable_lugs,
            ConsumableKind::WireFerrules => &self.wire_ferrules,
            ConsumableKind::InverterFeedCable => &self.inverter_feed_cable,
            ConsumableKind::WallboxFeedCable => &self.wallbox_feed_cable,
            ConsumableKind::BackupFeedCable => &self.backup_feed_cable,
            ConsumableKind::BatteryDcCable => &self.battery_dc_cable,
            ConsumableKind::CableDuct => &self.cable_duct,
            ConsumableKind::ScrewsAndDowels => &self.screws_and_dowels,
            ConsumableKind::JunctionBoxes => &self.junction_boxes,
            ConsumableKind::DinRailTerminals => &self.din_rail_terminals,
            ConsumableKind::NeutralEarthTerminals => &self.neutral_earth_terminals,
            ConsumableKind::ProtectiveConduit => &self.protective_conduit,
            ConsumableKind::InstallationTube => &self.installation_tube,
            ConsumableKind::FireSeal => &self.fire_seal,
            ConsumableKind::EthernetCable => &self.ethernet_cable,
            ConsumableKind::Rj45Plugs => &self.rj45_plugs,
            ConsumableKind::HeatShrink => &self.heat_shrink,
            ConsumableKind::CircuitLabels => &self.circuit_labels,
            ConsumableKind::SmallParts => &self.small_parts,
        }
    }
}

/// Selections a new configuration starts with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationDefaults {
    pub module: Option<String>,
    pub roof: Option<RoofType>,
    pub mounting_system: Option<String>,
    pub fastener: Option<String>,
    pub end_clamp: Option<String>,
    pub mid_clamp: Option<String>,
    pub profile: Option<String>,
    pub profile_connector: Option<String>,
    pub surge_arrester: Option<Selection>,
    pub grounding_rod: Option<Selection>,
    pub meter_cabinet: Option<Selection>,
}

/// Coefficients and standard materials driving the BOM rules.
///
/// Loaded once per session by [`crate::config::ConfigManager`] and validated
/// there; the compiler only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientSet {
    pub version: String,
    pub mounting: MountingCoefficients,
    pub dc: DcCoefficients,
    pub ac: AcCoefficients,
    pub sizing: Vec<SizingBucket>,

    #[serde(default)]
    pub dongle: DongleCoefficients,

    pub grounding: GroundingCoefficients,
    pub labels: LabelCoefficients,

    #[serde(default)]
    pub consumables: ConsumableCoefficients,

    #[serde(default)]
    pub defaults: ConfigurationDefaults,
}

impl CoefficientSet {
    /// Check every numeric coefficient and the sizing table.
    pub fn validate(&self) -> Result<(), CoefficientError> {
        check_non_negative("mounting.ratio", self.mounting.ratio)?;
        check_non_negative("dc.connector_pairs_per_string", self.dc.connector_pairs_per_string)?;
        check_non_negative("dc.cable_length_per_string_m", self.dc.cable_length_per_string_m)?;
        check_non_negative("ac.cable_length_per_device_m", self.ac.cable_length_per_device_m)?;
        check_non_negative("grounding.multiplier", self.grounding.multiplier)?;
        check_non_negative("labels.quantity", self.labels.quantity)?;

        for kind in ConsumableKind::ALL {
            let field = format!("consumables.{}.quantity", kind.field_name());
            check_non_negative(&field, self.consumables.item(kind).quantity)?;
        }

        if self.sizing.is_empty() {
            return Err(CoefficientError::EmptySizingTable);
        }

        let mut thresholds: Vec<f64> = Vec::with_capacity(self.sizing.len());
        for (index, bucket) in self.sizing.iter().enumerate() {
            for (name, value) in [
                ("cross_section_mm2", bucket.cross_section_mm2),
                ("max_ampacity_a", bucket.max_ampacity_a),
                ("breaker_rating_a", bucket.breaker_rating_a),
            ] {
                if !value.is_finite() || value <= 0.0 {
                    return Err(CoefficientError::InvalidSizingBucket {
                        index,
                        reason: format!("{} must be positive, got {}", name, value),
                    });
                }
            }
            if thresholds.contains(&bucket.max_ampacity_a) {
                return Err(CoefficientError::DuplicateSizingThreshold(bucket.max_ampacity_a));
            }
            thresholds.push(bucket.max_ampacity_a);
        }

        Ok(())
    }

    /// Validate and normalise: the sizing table is sorted ascending by ampacity.
    pub fn validated(mut self) -> Result<Self, CoefficientError> {
        self.validate()?;
        self.sizing
            .sort_by(|a, b| a.max_ampacity_a.total_cmp(&b.max_ampacity_a));
        Ok(self)
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), CoefficientError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoefficientError::InvalidCoefficient {
            field: field.to_string(),
            value,
        })
    }
}

fn bucket(cross_section: f64, ampacity: f64, breaker: &str, cable: &str) -> SizingBucket {
    SizingBucket {
        cross_section_mm2: cross_section,
        max_ampacity_a: ampacity,
        breaker_rating_a: ampacity,
        breaker_material: Some(breaker.to_string()),
        cable_material: Some(cable.to_string()),
    }
}

impl Default for CoefficientSet {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            mounting: MountingCoefficients { ratio: 1.6 },
            dc: DcCoefficients {
                connector_material: Some("MC4-PAIR".to_string()),
                connector_pairs_per_string: 2.0,
                cable_material: Some("H1Z2Z2-K-6".to_string()),
                cable_length_per_string_m: 25.0,
            },
            ac: AcCoefficients {
                cable_length_per_device_m: 15.0,
                wallbox_rcd_material: Some("RCD-TYPE-A-40-30".to_string()),
            },
            sizing: vec![
                bucket(1.5, 16.0, "MCB-B16-3P", "NYM-J-5X1.5"),
                bucket(2.5, 20.0, "MCB-B20-3P", "NYM-J-5X2.5"),
                bucket(4.0, 25.0, "MCB-B25-3P", "NYM-J-5X4"),
                bucket(6.0, 32.0, "MCB-B32-3P", "NYM-J-5X6"),
                bucket(10.0, 40.0, "MCB-B40-3P", "NYM-J-5X10"),
                bucket(16.0, 63.0, "MCB-B63-3P", "NYY-J-5X16"),
                bucket(25.0, 80.0, "MCB-C80-3P", "NYY-J-5X25"),
                bucket(35.0, 100.0, "MCB-C100-3P", "NYY-J-5X35"),
            ],
            dongle: DongleCoefficients {
                default_material: Some("SMART-DONGLE-WLAN".to_string()),
            },
            grounding: GroundingCoefficients {
                electrode_material: Some("EARTH-ELECTRODE-1.5M".to_string()),
                multiplier: 2.0,
            },
            labels: LabelCoefficients {
                backup_power: Some("LABEL-PV-BACKUP".to_string()),
                battery: Some("LABEL-PV-BATTERY".to_string()),
                pv: Some("LABEL-PV".to_string()),
                quantity: 1.0,
            },
            consumables: ConsumableCoefficients {
                equalization_wire: FlatRateItem::new("H07V-K-16-GNYE", 20.0),
                equalization_rail: FlatRateItem::new("PE-RAIL", 1.0),
                earthing_clamps: FlatRateItem::new("EARTHING-CLAMP", 2.0),
                cable_ties: FlatRateItem::new("CABLE-TIE-200", 25.0),
                uv_cable_ties: FlatRateItem::new("CABLE-TIE-UV-300", 50.0),
                grommets: FlatRateItem::new("GROMMET-M25", 4.0),
                cable_lugs: FlatRateItem::new("CABLE-LUG-16", 4.0),
                wire_ferrules: FlatRateItem::new("FERRULE-SET", 1.0),
                inverter_feed_cable: FlatRateItem::new("NYM-J-5X2.5", 5.0),
                wallbox_feed_cable: FlatRateItem::new("NYM-J-5X6", 5.0),
                backup_feed_cable: FlatRateItem::new("NYM-J-5X10", 5.0),
                battery_dc_cable: FlatRateItem::new("H07RN-F-1X25", 4.0),
                cable_duct: FlatRateItem::new("CABLE-DUCT-40X60", 4.0),
                screws_and_dowels: FlatRateItem::new("SCREW-DOWEL-SET", 1.0),
                junction_boxes: FlatRateItem::new("JUNCTION-BOX-AP", 1.0),
                din_rail_terminals: FlatRateItem::new("TERMINAL-DIN-4", 5.0),
                neutral_earth_terminals: FlatRateItem::new("TERMINAL-N-PE", 2.0),
                protective_conduit: FlatRateItem::new("CONDUIT-M25", 10.0),
                installation_tube: FlatRateItem::new("TUBE-M32", 3.0),
                fire_seal: FlatRateItem::new("FIRE-SEAL-CARTRIDGE", 1.0),
                ethernet_cable: FlatRateItem::new("CAT7-CABLE", 10.0),
                rj45_plugs: FlatRateItem::new("RJ45-PLUG", 2.0),
                heat_shrink: FlatRateItem::new("HEAT-SHRINK-SET", 1.0),
                circuit_labels: FlatRateItem::new("CIRCUIT-LABEL-SET", 1.0),
                small_parts: FlatRateItem::new("SMALL-PARTS-FLAT", 1.0),
            },
            defaults: ConfigurationDefaults {
                roof: Some(RoofType::Tile),
                mounting_system: Some("ROOF-HOOK-TILE".to_string()),
                fastener: Some("WOOD-SCREW-8X100".to_string()),
                end_clamp: Some("END-CLAMP-35".to_string()),
                mid_clamp: Some("MID-CLAMP-35".to_string()),
                profile: Some("RAIL-PROFILE-6000".to_string()),
                profile_connector: Some("RAIL-CONNECTOR".to_string()),
                surge_arrester: Some(Selection::new("SPD-DC-1000", 1)),
                ..ConfigurationDefaults::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_coefficients_are_valid() {
        assert_eq!(CoefficientSet::default().validate(), Ok(()));
    }

    #[test]
    fn test_negative_ratio_rejected() {
        let mut coefficients = CoefficientSet::default();
        coefficients.mounting.ratio = -1.0;

        assert!(matches!(
            coefficients.validate(),
            Err(CoefficientError::InvalidCoefficient { ref field, .. }) if field == "mounting.ratio"
        ));
    }

    #[test]
    fn test_nan_consumable_rejected() {
        let mut coefficients = CoefficientSet::default();
        coefficients.consumables.grommets.quantity = f64::NAN;

        let err = coefficients.validate().unwrap_err();
        assert!(err.to_string().contains("consumables.grommets.quantity"));
    }

    #[test]
    fn test_empty_sizing_table_rejected() {
        let mut coefficients = CoefficientSet::default();
        coefficients.sizing.clear();
        assert_eq!(coefficients.validate(), Err(CoefficientError::EmptySizingTable));
    }

    #[test]
    fn test_duplicate_threshold_rejected() {
        let mut coefficients = CoefficientSet::default();
        let first = coefficients.sizing[0].clone();
        coefficients.sizing.push(first);
        assert_eq!(
            coefficients.validate(),
            Err(CoefficientError::DuplicateSizingThreshold(16.0))
        );
    }

    #[test]
    fn test_validated_sorts_sizing_table() {
        let mut coefficients = CoefficientSet::default();
        coefficients.sizing.reverse();

        let coefficients = coefficients.validated().unwrap();
        let thresholds: Vec<f64> = coefficients.sizing.iter().map(|b| b.max_ampacity_a).collect();
        let mut sorted = thresholds.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(thresholds, sorted);
    }

    #[test]
    fn test_every_consumable_has_a_distinct_field() {
        let names: std::collections::HashSet<&str> =
            ConsumableKind::ALL.iter().map(|k| k.field_name()).collect();
        assert_eq!(names.len(), ConsumableKind::ALL.len());
    }
}
