use serde::{Deserialize, Serialize};

use super::catalog::{Material, MaterialCatalog};
use crate::services::consolidation::consolidate;

/// A single bill-of-materials line.
///
/// Identity for consolidation is `material_id` alone. A line that is neither
/// configured nor manual was derived by a flat-rate rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    pub material_id: String,
    pub quantity: f64,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub is_configured: bool,

    #[serde(default)]
    pub is_manual: bool,
}

impl BomLine {
    /// Line for a user selection or a direct engineering recommendation.
    pub fn configured(material_id: &str, quantity: f64, catalog: &MaterialCatalog) -> Self {
        let mut line = Self::derived(material_id, quantity, catalog);
        line.is_configured = true;
        line
    }

    /// Line produced by a derivation or flat-rate rule.
    pub fn derived(material_id: &str, quantity: f64, catalog: &MaterialCatalog) -> Self {
        let (description, category) = describe(material_id, catalog.get(material_id));
        Self {
            material_id: material_id.to_string(),
            quantity,
            description,
            category,
            is_configured: false,
            is_manual: false,
        }
    }

    /// Line added by hand at review time.
    pub fn manual(material_id: &str, quantity: f64, catalog: &MaterialCatalog) -> Self {
        let mut line = Self::derived(material_id, quantity, catalog);
        line.is_manual = true;
        line
    }

    pub fn is_flat_rate(&self) -> bool {
        !self.is_configured && !self.is_manual
    }
}

/// Description and category of a material; unknown materials are described by
/// their identifier.
fn describe(material_id: &str, material: Option<&Material>) -> (String, String) {
    match material {
        Some(m) if !m.description.trim().is_empty() => (m.description.clone(), m.category.clone()),
        Some(m) => (material_id.to_string(), m.category.clone()),
        None => (material_id.to_string(), String::new()),
    }
}

/// Output of one compiler run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledBom {
    pub lines: Vec<BomLine>,
    pub warnings: Vec<String>,
}

impl CompiledBom {
    pub fn line(&self, material_id: &str) -> Option<&BomLine> {
        self.lines.iter().find(|l| l.material_id == material_id)
    }

    pub fn quantity_of(&self, material_id: &str) -> f64 {
        self.line(material_id).map(|l| l.quantity).unwrap_or(0.0)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Manual edits applied to a compiled BOM during review.
///
/// The compiled BOM itself is never patched; the review holds its own copy
/// which is discarded when the configuration is recompiled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BomReview {
    lines: Vec<BomLine>,
    warnings: Vec<String>,
}

impl BomReview {
    pub fn from_compiled(bom: &CompiledBom) -> Self {
        Self {
            lines: bom.lines.clone(),
            warnings: bom.warnings.clone(),
        }
    }

    /// Add a manual line; it merges with an existing line of the same material.
    ///
    /// Non-positive quantities are ignored, matching [`BomReview::set_quantity`].
    pub fn add_manual(&mut self, material_id: &str, quantity: f64, catalog: &MaterialCatalog) {
        if !(quantity.is_finite() && quantity > 0.0) {
            tracing::debug!("Manual line {} with quantity {} ignored", material_id, quantity);
            return;
        }
        self.lines.push(BomLine::manual(material_id, quantity, catalog));
        self.lines = consolidate(std::mem::take(&mut self.lines));
    }

    /// Remove a line. Returns false when no line had that material.
    pub fn remove(&mut self, material_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.material_id != material_id);
        self.lines.len() != before
    }

    /// Overwrite the quantity of a line. A non-positive quantity removes it.
    pub fn set_quantity(&mut self, material_id: &str, quantity: f64) -> bool {
        if quantity <= 0.0 {
            return self.remove(material_id);
        }
        match self.lines.iter_mut().find(|l| l.material_id == material_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn lines(&self) -> &[BomLine] {
        &self.lines
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// A review can be committed when it has lines and no open warnings.
    pub fn can_commit(&self) -> bool {
        self.warnings.is_empty() && !self.lines.is_empty()
    }
}
