use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::bom::{BomReview, CompiledBom};
use super::catalog::MaterialCatalog;
use super::coefficients::CoefficientSet;
use super::configuration::Configuration;

/// Steps of the configurator wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    ModuleAndRoof,
    Mounting,
    Inverters,
    OptionalComponents,
    ElectricalComponents,
    Review,
}

impl WizardStage {
    pub const ALL: [WizardStage; 6] = [
        WizardStage::ModuleAndRoof,
        WizardStage::Mounting,
        WizardStage::Inverters,
        WizardStage::OptionalComponents,
        WizardStage::ElectricalComponents,
        WizardStage::Review,
    ];

    pub fn next(self) -> Option<WizardStage> {
        let index = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(index + 1).copied()
    }

    pub fn previous(self) -> Option<WizardStage> {
        let index = Self::ALL.iter().position(|s| *s == self)?;
        index.checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStage::ModuleAndRoof => "module and roof",
            WizardStage::Mounting => "mounting",
            WizardStage::Inverters => "inverters",
            WizardStage::OptionalComponents => "optional components",
            WizardStage::ElectricalComponents => "electrical components",
            WizardStage::Review => "review",
        }
    }
}

/// Everything one configurator session works on.
///
/// Wrapped in `Arc<RwLock<SessionState>>` by
/// [`SessionManager`](crate::state::SessionManager); the catalog and coefficient
/// snapshots are shared and only ever replaced whole.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub stage: WizardStage,
    pub configuration: Configuration,
    pub catalog: Arc<MaterialCatalog>,
    pub coefficients: Arc<CoefficientSet>,

    /// Result of the latest compiler run.
    pub bom: CompiledBom,

    /// Manual review edits; cleared whenever the BOM is recompiled.
    pub review: Option<BomReview>,

    /// Number of compiler runs in this session.
    pub revision: u64,
}

impl SessionState {
    pub fn new(catalog: Arc<MaterialCatalog>, coefficients: Arc<CoefficientSet>) -> Self {
        let configuration = Configuration::with_defaults(&coefficients);
        Self {
            stage: WizardStage::ModuleAndRoof,
            configuration,
            catalog,
            coefficients,
            bom: CompiledBom::default(),
            review: None,
            revision: 0,
        }
    }

    pub fn is_reviewing(&self) -> bool {
        self.stage == WizardStage::Review
    }

    /// Review copy of the BOM, created on first use.
    pub fn review_mut(&mut self) -> &mut BomReview {
        let bom = &self.bom;
        self.review.get_or_insert_with(|| BomReview::from_compiled(bom))
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(
            Arc::new(MaterialCatalog::default()),
            Arc::new(CoefficientSet::default()),
        )
    }
}
