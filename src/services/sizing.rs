use crate::models::{CoefficientSet, SizingBucket};

/// One row of the ampacity table.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingTableEntry {
    pub cross_section_mm2: f64,
    pub max_ampacity_a: f64,
    pub breaker_rating_a: f64,
    pub breaker_material: Option<String>,
    pub cable_material: Option<String>,
}

impl From<&SizingBucket> for SizingTableEntry {
    fn from(bucket: &SizingBucket) -> Self {
        Self {
            cross_section_mm2: bucket.cross_section_mm2,
            max_ampacity_a: bucket.max_ampacity_a,
            breaker_rating_a: bucket.breaker_rating_a,
            breaker_material: non_blank(&bucket.breaker_material),
            cable_material: non_blank(&bucket.cable_material),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// Ampacity → cross-section → breaker table, ascending by ampacity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizingTable {
    entries: Vec<SizingTableEntry>,
}

impl SizingTable {
    pub fn new(mut entries: Vec<SizingTableEntry>) -> Self {
        entries.sort_by(|a, b| a.max_ampacity_a.total_cmp(&b.max_ampacity_a));
        Self { entries }
    }

    /// The active table for a coefficient set.
    pub fn from_coefficients(coefficients: &CoefficientSet) -> Self {
        Self::new(coefficients.sizing.iter().map(SizingTableEntry::from).collect())
    }

    /// First entry able to carry `demand_a`.
    ///
    /// A demand above the largest entry saturates to that entry; only an empty
    /// table yields `None`.
    pub fn pick_for_current(&self, demand_a: f64) -> Option<&SizingTableEntry> {
        self.entries
            .iter()
            .find(|entry| entry.max_ampacity_a >= demand_a)
            .or_else(|| self.entries.last())
    }

    pub fn entries(&self) -> &[SizingTableEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
