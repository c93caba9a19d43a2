//! Rail profile sizing for tile roofs.
//!
//! Each row sits on two rails. The rail length per row covers the modules plus
//! a fixed gap allowance and the clamp widths; profiles are packed by ceiling
//! division, so the result over-provisions rather than falls short.

use crate::models::{Configuration, MaterialCatalog, ModuleLayout};

use super::spec_lookup::{spec_ids, spec_number};

/// Rails under each row.
const RAILS_PER_ROW: u64 = 2;

/// End clamps per row: two rails, two ends each.
const END_CLAMPS_PER_ROW: u64 = 4;

/// Gap allowance per end clamp in millimetres.
const END_GAP_MM: f64 = 50.0;

/// Physical dimensions feeding the profile calculation, in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProfileDimensions {
    pub module_length_mm: f64,
    pub module_width_mm: f64,
    pub profile_length_mm: f64,
    pub end_clamp_width_mm: f64,
    pub mid_clamp_width_mm: f64,
}

impl ProfileDimensions {
    /// Read dimensions from the selected module, profile and clamp materials.
    pub fn from_catalog(config: &Configuration, catalog: &MaterialCatalog) -> Self {
        let module = catalog.find(config.module.as_deref());
        let mounting = &config.mounting;
        Self {
            module_length_mm: spec_number(module, spec_ids::MODULE_LENGTH),
            module_width_mm: spec_number(module, spec_ids::MODULE_WIDTH),
            profile_length_mm: spec_number(
                catalog.find(mounting.profile.as_deref()),
                spec_ids::PROFILE_LENGTH,
            ),
            end_clamp_width_mm: spec_number(
                catalog.find(mounting.end_clamp.as_deref()),
                spec_ids::CLAMP_WIDTH,
            ),
            mid_clamp_width_mm: spec_number(
                catalog.find(mounting.mid_clamp.as_deref()),
                spec_ids::CLAMP_WIDTH,
            ),
        }
    }
}

/// Quantities for a single row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RowGeometry {
    pub end_clamps: u64,
    pub mid_clamps: u64,
    pub row_length_mm: f64,
    pub profiles: u64,
    pub connectors: u64,
}

/// Totals across all rows of both orientations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileTotals {
    pub profiles: u64,
    pub connectors: u64,
}

/// Geometry of one row; `unit_dimension_mm` is the module edge along the rail.
pub fn row_geometry(module_count: u32, unit_dimension_mm: f64, dims: &ProfileDimensions) -> RowGeometry {
    let end_clamps = END_CLAMPS_PER_ROW;
    let mid_clamps = u64::from(module_count.saturating_sub(1)) * 2;

    let row_length_mm = f64::from(module_count) * unit_dimension_mm * RAILS_PER_ROW as f64
        + end_clamps as f64 * END_GAP_MM
        + end_clamps as f64 * dims.end_clamp_width_mm
        + mid_clamps as f64 * dims.mid_clamp_width_mm;

    // float-to-int `as` saturates
    let profiles = if dims.profile_length_mm > 0.0 && row_length_mm > 0.0 {
        (row_length_mm / dims.profile_length_mm).ceil() as u64
    } else {
        0
    };
    let connectors = profiles.saturating_sub(1).saturating_mul(RAILS_PER_ROW);

    RowGeometry {
        end_clamps,
        mid_clamps,
        row_length_mm,
        profiles,
        connectors,
    }
}

/// Sum profiles and connectors over every populated row.
pub fn profile_totals(layout: &ModuleLayout, dims: &ProfileDimensions) -> ProfileTotals {
    layout
        .rows()
        .filter(|(_, row)| row.module_count > 0)
        .map(|(orientation, row)| {
            let unit = orientation.rail_dimension(dims.module_length_mm, dims.module_width_mm);
            row_geometry(row.module_count, unit, dims)
        })
        .fold(ProfileTotals::default(), |acc, row| ProfileTotals {
            profiles: acc.profiles.saturating_add(row.profiles),
            connectors: acc.connectors.saturating_add(row.connectors),
        })
}
