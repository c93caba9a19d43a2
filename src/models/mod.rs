//! Data models for the PV configurator.
//!
//! This module contains the core data structures the BOM compiler works on:
//! - [`MaterialCatalog`]: Read-only material records with their specification attributes
//! - [`Configuration`]: The planned installation as entered step by step in the wizard
//! - [`CoefficientSet`]: Flat constants, sizing buckets and standard materials loaded once per session
//! - [`BomLine`] / [`CompiledBom`]: Compiler output, plus [`BomReview`] for manual edits
//! - [`SessionState`]: Everything a configurator session holds
//!
//! # Architecture Note
//!
//! The models are designed to be:
//! - **Serializable**: Inputs and outputs derive `Serialize`/`Deserialize` for YAML persistence
//! - **Immutable to the compiler**: The compiler borrows every input and returns a fresh [`CompiledBom`]
//! - **Valid by construction**: Optional components are `Option<Selection>`, never a half-filled pair

pub mod bom;
pub mod catalog;
pub mod coefficients;
pub mod configuration;
pub mod session;

pub use bom::{BomLine, BomReview, CompiledBom};
pub use catalog::{Material, MaterialCatalog, MaterialSpecSet, SpecValue};
pub use coefficients::{
    CoefficientError, CoefficientSet, ConsumableCoefficients, ConsumableKind, FlatRateItem,
    SizingBucket,
};
pub use configuration::{
    Configuration, DeviceCounts, ElectricalComponents, InverterEntry, ModuleLayout, ModuleRow,
    MountingSelection, OptionalSubsystems, Orientation, Recommendation, RecommendationOverrides,
    RoofType, Selection, StringEntry, Subsystem,
};
pub use session::{SessionState, WizardStage};
