use crate::models::{CoefficientSet, Configuration, MaterialCatalog, Recommendation, Subsystem};

use super::sizing::SizingTable;
use super::spec_lookup::{spec_ids, spec_number};

/// Derives breaker, cable and RCD recommendations for current-consuming
/// subsystems and merges in user overrides.
pub struct RecommendationEngine<'a> {
    table: SizingTable,
    catalog: &'a MaterialCatalog,
    coefficients: &'a CoefficientSet,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(catalog: &'a MaterialCatalog, coefficients: &'a CoefficientSet) -> Self {
        Self {
            table: SizingTable::from_coefficients(coefficients),
            catalog,
            coefficients,
        }
    }

    /// Number of installed units of a subsystem, as counted by
    /// [`Configuration::device_counts`].
    pub fn device_count(&self, subsystem: Subsystem, config: &Configuration) -> u64 {
        let counts = config.device_counts();
        match subsystem {
            Subsystem::Inverter => counts.inverters,
            Subsystem::Wallbox => counts.wallboxes,
            Subsystem::Backup => counts.backups,
        }
    }

    /// Demand current in amperes, `None` when the subsystem is not configured.
    ///
    /// With several inverter models the largest device current governs.
    pub fn demand_current(&self, subsystem: Subsystem, config: &Configuration) -> Option<f64> {
        if self.device_count(subsystem, config) == 0 {
            return None;
        }
        let current_of = |id: &str| spec_number(self.catalog.find(Some(id)), spec_ids::MAX_CURRENT);

        let demand = match subsystem {
            Subsystem::Inverter => config
                .inverters
                .iter()
                .filter(|i| i.is_complete())
                .map(|i| current_of(&i.material_id))
                .fold(0.0, f64::max),
            Subsystem::Wallbox => config
                .options
                .wallbox
                .as_ref()
                .map(|s| current_of(&s.material_id))
                .unwrap_or(0.0),
            Subsystem::Backup => config
                .options
                .backup
                .as_ref()
                .map(|s| current_of(&s.material_id))
                .unwrap_or(0.0),
        };
        Some(demand)
    }

    /// Recommendation computed from the sizing table alone.
    pub fn recommend(&self, subsystem: Subsystem, config: &Configuration) -> Recommendation {
        let Some(demand) = self.demand_current(subsystem, config) else {
            return Recommendation::default();
        };

        let mut recommendation = match self.table.pick_for_current(demand) {
            Some(entry) => {
                tracing::debug!(
                    "{} demand {:.1} A -> {} mm², {} A breaker",
                    subsystem.as_str(),
                    demand,
                    entry.cross_section_mm2,
                    entry.breaker_rating_a
                );
                Recommendation {
                    breaker_id: entry.breaker_material.clone(),
                    cable_id: entry.cable_material.clone(),
                    rcd_id: None,
                }
            }
            None => Recommendation::default(),
        };

        if subsystem == Subsystem::Wallbox {
            recommendation.rcd_id = self
                .coefficients
                .ac
                .wallbox_rcd_material
                .clone()
                .filter(|id| !id.trim().is_empty());
        }

        recommendation
    }

    /// Recommendation after applying the user's overrides.
    pub fn chosen(&self, subsystem: Subsystem, config: &Configuration) -> Recommendation {
        choose(
            &self.recommend(subsystem, config),
            config.overrides.get(subsystem),
        )
    }
}

/// Per field: the override when present and non-blank, else the computed value.
pub fn choose(computed: &Recommendation, overrides: &Recommendation) -> Recommendation {
    fn pick(override_id: &Option<String>, computed_id: &Option<String>) -> Option<String> {
        match override_id {
            Some(id) if !id.trim().is_empty() => Some(id.clone()),
            _ => computed_id.clone(),
        }
    }

    Recommendation {
        breaker_id: pick(&overrides.breaker_id, &computed.breaker_id),
        cable_id: pick(&overrides.cable_id, &computed.cable_id),
        rcd_id: pick(&overrides.rcd_id, &computed.rcd_id),
    }
}
