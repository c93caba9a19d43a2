// Session state module
//
// This module provides the SessionManager which wraps SessionState with thread-safe access
// using Arc<RwLock<T>>, recompiles the BOM on every input change and emits change events.

use crate::metrics::Metrics;
use crate::models::{
    BomReview, CoefficientSet, CompiledBom, Configuration, MaterialCatalog, Recommendation,
    SessionState, Subsystem, WizardStage,
};
use crate::services::{BomCompiler, ValidationIssue, validate_stage};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tokio::sync::broadcast;

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 100;

/// Change events emitted when the session is modified
///
/// Consumers (a UI, a persistence task) subscribe instead of polling.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionChange {
    /// The planned installation changed
    ConfigurationChanged,

    /// A recommendation override was set or cleared
    OverridesChanged { subsystem: Subsystem },

    /// A new coefficient set was loaded
    CoefficientsChanged,

    /// A new catalog snapshot was loaded
    CatalogChanged,

    /// The compiled BOM differs from the previous run
    BomRecompiled {
        revision: u64,
        line_count: usize,
        warning_count: usize,
    },

    /// The wizard moved to another stage
    StageChanged { from: WizardStage, to: WizardStage },

    /// Moving forward was refused
    AdvanceBlocked {
        stage: WizardStage,
        issues: Vec<ValidationIssue>,
    },

    /// The review copy of the BOM was edited
    ReviewEdited { line_count: usize },

    /// The session was reset to defaults
    SessionReset,
}

/// Thread-safe session manager with event emission
///
/// This is the central session component that:
/// - Provides thread-safe access to [`SessionState`] via `Arc<RwLock<T>>`
/// - Recompiles the BOM wholesale whenever configuration, catalog or coefficients change
/// - Gates forward wizard transitions on stage validation
/// - Supports subscribing to [`SessionChange`] events via tokio broadcast channels
///
/// # Related Types
///
/// - [`crate::models::SessionState`]: The underlying state structure
/// - [`crate::services::BomCompiler`]: Pure compiler re-run on every change
/// - [`crate::config::ConfigManager`]: Loads the inputs a session starts from
pub struct SessionManager {
    state: Arc<RwLock<SessionState>>,
    session_tx: broadcast::Sender<SessionChange>,
    compiler: BomCompiler,
    metrics: Arc<Metrics>,
}

impl SessionManager {
    /// Start a session on the given catalog and coefficients.
    ///
    /// The configuration starts from the coefficient defaults and is compiled
    /// once immediately.
    pub fn new(catalog: Arc<MaterialCatalog>, coefficients: Arc<CoefficientSet>) -> Self {
        Self::with_metrics(catalog, coefficients, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(
        catalog: Arc<MaterialCatalog>,
        coefficients: Arc<CoefficientSet>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (session_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let manager = Self {
            state: Arc::new(RwLock::new(SessionState::new(catalog, coefficients))),
            session_tx,
            compiler: BomCompiler::new(),
            metrics,
        };
        {
            let mut state = manager.write();
            manager.recompile(&mut state);
        }
        manager
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a read-only snapshot of the current session
    pub fn snapshot(&self) -> SessionState {
        self.read_guard().clone()
    }

    /// Execute a function with read access to the session
    ///
    /// # Example
    /// ```ignore
    /// let lines = session.read(|state| state.bom.lines.len());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SessionState) -> R,
    {
        let state = self.read_guard();
        f(&state)
    }

    /// Latest compiled BOM
    pub fn bom(&self) -> CompiledBom {
        self.read(|state| state.bom.clone())
    }

    /// Subscribe to session change events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.session_tx.subscribe()
    }

    /// Modify the configuration and recompile
    ///
    /// # Returns
    /// The emitted events; empty when the closure changed nothing
    ///
    /// # Example
    /// ```ignore
    /// session.update_configuration(|config| {
    ///     config.layout.landscape.push(ModuleRow::new(10));
    /// });
    /// ```
    pub fn update_configuration<F>(&self, update_fn: F) -> Vec<SessionChange>
    where
        F: FnOnce(&mut Configuration),
    {
        let mut state = self.write();
        let old = state.configuration.clone();

        update_fn(&mut state.configuration);

        if state.configuration == old {
            return Vec::new();
        }

        let mut changes = vec![SessionChange::ConfigurationChanged];
        for subsystem in Subsystem::ALL {
            if old.overrides.get(subsystem) != state.configuration.overrides.get(subsystem) {
                changes.push(SessionChange::OverridesChanged { subsystem });
            }
        }
        changes.extend(self.recompile(&mut state));
        self.emit(&changes);
        changes
    }

    /// Replace the user override of one subsystem's recommendation
    pub fn set_override(&self, subsystem: Subsystem, overrides: Recommendation) -> Vec<SessionChange> {
        let mut state = self.write();
        if *state.configuration.overrides.get(subsystem) == overrides {
            return Vec::new();
        }

        *state.configuration.overrides.get_mut(subsystem) = overrides;
        tracing::info!("Override for {} updated", subsystem.as_str());

        let mut changes = vec![SessionChange::OverridesChanged { subsystem }];
        changes.extend(self.recompile(&mut state));
        self.emit(&changes);
        changes
    }

    /// Swap in a new coefficient set and recompile
    pub fn set_coefficients(&self, coefficients: Arc<CoefficientSet>) -> Vec<SessionChange> {
        let mut state = self.write();
        state.coefficients = coefficients;
        tracing::info!("Coefficients v{} applied", state.coefficients.version);

        let mut changes = vec![SessionChange::CoefficientsChanged];
        changes.extend(self.recompile(&mut state));
        self.emit(&changes);
        changes
    }

    /// Swap in a new catalog snapshot and recompile
    pub fn set_catalog(&self, catalog: Arc<MaterialCatalog>) -> Vec<SessionChange> {
        let mut state = self.write();
        state.catalog = catalog;
        tracing::info!("Catalog with {} materials applied", state.catalog.len());

        let mut changes = vec![SessionChange::CatalogChanged];
        changes.extend(self.recompile(&mut state));
        self.emit(&changes);
        changes
    }

    /// Move to the next wizard stage if the current one validates
    ///
    /// Entering the review stage starts a fresh review copy of the BOM.
    pub fn advance_stage(&self) -> Vec<SessionChange> {
        let mut state = self.write();
        let from = state.stage;
        let Some(to) = from.next() else {
            return Vec::new();
        };

        let issues = validate_stage(from, &state.configuration);
        let changes = if issues.is_empty() {
            state.stage = to;
            if to == WizardStage::Review {
                state.review = Some(BomReview::from_compiled(&state.bom));
            }
            tracing::info!("Stage {} -> {}", from.label(), to.label());
            vec![SessionChange::StageChanged { from, to }]
        } else {
            self.metrics.record_blocked_advance();
            tracing::info!(
                "Leaving stage {} blocked by {} issue(s)",
                from.label(),
                issues.len()
            );
            vec![SessionChange::AdvanceBlocked { stage: from, issues }]
        };

        self.emit(&changes);
        changes
    }

    /// Move to the previous wizard stage; never validated
    pub fn back_stage(&self) -> Vec<SessionChange> {
        let mut state = self.write();
        let from = state.stage;
        let Some(to) = from.previous() else {
            return Vec::new();
        };

        state.stage = to;
        tracing::info!("Stage {} -> {}", from.label(), to.label());

        let changes = vec![SessionChange::StageChanged { from, to }];
        self.emit(&changes);
        changes
    }

    /// Edit the review copy of the BOM
    ///
    /// Only allowed in the review stage; the closure gets the catalog for
    /// describing manually added lines.
    ///
    /// # Example
    /// ```ignore
    /// session.apply_review_edit(|review, catalog| review.add_manual("CABLE-TIE-200", 50.0, catalog));
    /// ```
    pub fn apply_review_edit<F>(&self, edit_fn: F) -> Vec<SessionChange>
    where
        F: FnOnce(&mut BomReview, &MaterialCatalog),
    {
        let mut state = self.write();
        if !state.is_reviewing() {
            tracing::warn!("Review edit ignored outside the review stage");
            return Vec::new();
        }

        let catalog = Arc::clone(&state.catalog);
        let review = state.review_mut();
        let before = review.clone();
        edit_fn(review, &catalog);

        if *review == before {
            return Vec::new();
        }
        let changes = vec![SessionChange::ReviewEdited {
            line_count: review.lines().len(),
        }];
        self.emit(&changes);
        changes
    }

    /// Start over with the same catalog and coefficients
    pub fn reset(&self) -> Vec<SessionChange> {
        let mut state = self.write();
        let mut fresh = SessionState::new(Arc::clone(&state.catalog), Arc::clone(&state.coefficients));
        fresh.revision = state.revision;
        *state = fresh;
        tracing::info!("Session reset");

        let mut changes = vec![SessionChange::SessionReset];
        changes.extend(self.recompile(&mut state));
        self.emit(&changes);
        changes
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the compiler on the current inputs, replacing the previous result.
    fn recompile(&self, state: &mut SessionState) -> Option<SessionChange> {
        let started = Instant::now();
        let bom = self
            .compiler
            .compile(&state.configuration, &state.catalog, &state.coefficients);
        self.metrics
            .record_compilation(started.elapsed(), bom.warnings.len());

        state.revision += 1;
        state.review = None;
        if state.is_reviewing() {
            state.review = Some(BomReview::from_compiled(&bom));
        }

        if bom == state.bom && state.revision > 1 {
            return None;
        }

        let change = SessionChange::BomRecompiled {
            revision: state.revision,
            line_count: bom.lines.len(),
            warning_count: bom.warnings.len(),
        };
        tracing::debug!(
            "BOM revision {}: {} lines, {} warnings",
            state.revision,
            bom.lines.len(),
            bom.warnings.len()
        );
        state.bom = bom;
        Some(change)
    }

    fn emit(&self, changes: &[SessionChange]) {
        for change in changes {
            // No subscribers is fine
            if self.session_tx.send(change.clone()).is_ok() {
                self.metrics.record_session_broadcast();
            }
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(
            Arc::new(MaterialCatalog::default()),
            Arc::new(CoefficientSet::default()),
        )
    }
}

// Cloning shares the same session
impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            session_tx: self.session_tx.clone(),
            compiler: self.compiler,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InverterEntry, Material, ModuleRow, Selection, StringEntry};

    fn catalog() -> Arc<MaterialCatalog> {
        let catalog: MaterialCatalog = vec![
            Material::new("MOD", "Module", "module")
                .with_spec("module_length_mm", 1700.0)
                .with_spec("module_width_mm", 1100.0),
            Material::new("INV", "Inverter", "inverter").with_spec("max_ac_current_a", 16.0),
        ]
        .into();
        Arc::new(catalog)
    }

    fn manager() -> SessionManager {
        SessionManager::new(catalog(), Arc::new(CoefficientSet::default()))
    }

    fn plan(config: &mut Configuration) {
        config.module = Some("MOD".to_string());
        config.layout.landscape = vec![ModuleRow::new(10)];
        config.inverters = vec![InverterEntry::new("INV", 1, vec![StringEntry::new("A", 10)])];
    }

    #[test]
    fn test_new_session_is_compiled() {
        let manager = manager();
        let state = manager.snapshot();

        assert_eq!(state.stage, WizardStage::ModuleAndRoof);
        assert_eq!(state.revision, 1);
        assert_eq!(state.configuration.mounting.end_clamp.as_deref(), Some("END-CLAMP-35"));
    }

    #[test]
    fn test_update_configuration_recompiles() {
        let manager = manager();

        let changes = manager.update_configuration(plan);

        assert_eq!(changes[0], SessionChange::ConfigurationChanged);
        assert!(matches!(changes[1], SessionChange::BomRecompiled { revision: 2, .. }));
        assert_eq!(manager.bom().quantity_of("MOD"), 10.0);
    }

    #[test]
    fn test_no_op_update_emits_nothing() {
        let manager = manager();
        let changes = manager.update_configuration(|_| {});
        assert!(changes.is_empty());
        assert_eq!(manager.snapshot().revision, 1);
    }

    #[test]
    fn test_override_replaces_recommendation() {
        let manager = manager();
        manager.update_configuration(plan);

        let changes = manager.set_override(
            Subsystem::Inverter,
            Recommendation {
                breaker_id: Some("MCB-B20-3P".to_string()),
                ..Recommendation::default()
            },
        );

        assert_eq!(changes[0], SessionChange::OverridesChanged { subsystem: Subsystem::Inverter });
        let bom = manager.bom();
        assert_eq!(bom.quantity_of("MCB-B20-3P"), 1.0);
        assert_eq!(bom.quantity_of("MCB-B16-3P"), 0.0);
    }

    #[test]
    fn test_advance_blocked_then_allowed() {
        let manager = manager();

        let changes = manager.advance_stage();
        assert!(matches!(
            &changes[0],
            SessionChange::AdvanceBlocked { stage: WizardStage::ModuleAndRoof, issues } if !issues.is_empty()
        ));
        assert_eq!(manager.snapshot().stage, WizardStage::ModuleAndRoof);

        manager.update_configuration(plan);
        let changes = manager.advance_stage();
        assert_eq!(
            changes,
            vec![SessionChange::StageChanged {
                from: WizardStage::ModuleAndRoof,
                to: WizardStage::Mounting
            }]
        );
        assert_eq!(
            manager.metrics().blocked_advances.load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn test_back_stage_is_unconditional() {
        let manager = manager();
        manager.update_configuration(plan);
        manager.advance_stage();
        manager.update_configuration(|config| config.mounting.system = None);

        let changes = manager.back_stage();
        assert_eq!(
            changes,
            vec![SessionChange::StageChanged {
                from: WizardStage::Mounting,
                to: WizardStage::ModuleAndRoof
            }]
        );
        assert!(manager.back_stage().is_empty());
    }

    #[test]
    fn test_review_edits_only_in_review() {
        let manager = manager();
        manager.update_configuration(plan);
        assert!(manager
            .apply_review_edit(|review, catalog| review.add_manual("MOD", 1.0, catalog))
            .is_empty());

        for _ in 0..5 {
            manager.advance_stage();
        }
        assert_eq!(manager.snapshot().stage, WizardStage::Review);

        let changes = manager.apply_review_edit(|review, catalog| {
            review.add_manual("EXTRA", 3.0, catalog);
        });
        assert!(matches!(changes[0], SessionChange::ReviewEdited { .. }));

        let state = manager.snapshot();
        let review = state.review.as_ref().unwrap();
        assert!(review.lines().iter().any(|l| l.material_id == "EXTRA" && l.is_manual));
        assert_eq!(state.bom.quantity_of("EXTRA"), 0.0);
    }

    #[test]
    fn test_recompile_discards_review_edits() {
        let manager = manager();
        manager.update_configuration(plan);
        for _ in 0..5 {
            manager.advance_stage();
        }
        manager.apply_review_edit(|review, catalog| review.add_manual("EXTRA", 3.0, catalog));

        manager.update_configuration(|config| {
            config.options.wallbox = Some(Selection::new("WB", 1));
        });

        let state = manager.snapshot();
        let review = state.review.as_ref().unwrap();
        assert!(review.lines().iter().all(|l| l.material_id != "EXTRA"));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let manager = manager();
        manager.update_configuration(plan);
        manager.advance_stage();

        let changes = manager.reset();
        assert_eq!(changes[0], SessionChange::SessionReset);

        let state = manager.snapshot();
        assert_eq!(state.stage, WizardStage::ModuleAndRoof);
        assert!(state.configuration.inverters.is_empty());
    }

    #[test]
    fn test_subscribe_to_changes() {
        let manager = manager();
        let mut rx = manager.subscribe();

        manager.update_configuration(plan);

        assert_eq!(rx.try_recv().unwrap(), SessionChange::ConfigurationChanged);
        assert!(matches!(rx.try_recv().unwrap(), SessionChange::BomRecompiled { .. }));
    }

    #[test]
    fn test_clones_share_state() {
        let manager = manager();
        let other = manager.clone();

        other.update_configuration(plan);
        assert_eq!(manager.bom().quantity_of("MOD"), 10.0);
    }
}
