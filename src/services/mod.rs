//! Services module - Pure business logic of the BOM compiler.
//!
//! This module turns a [`Configuration`](crate::models::Configuration) into a
//! consolidated bill of materials and books reviewed BOMs out of stock. The
//! services are **framework-agnostic**: they borrow their inputs, hold no
//! session state and never touch the file system.
//!
//! # Components
//!
//! - [`BomCompiler`]: Entry point. Runs the rules, then consolidates:
//!   - [`RuleAugmenter`]: Ordered derivation rules (modules, mounting, clamps, profiles,
//!     DC cabling, selections, auto-dongle, grounding, recommendations, consumables, labels)
//!   - [`consolidate`]: Merges lines sharing a material, order-independent quantities
//!
//! - [`RecommendationEngine`]: Breaker/cable/RCD per current-consuming subsystem, using:
//!   - [`SizingTable`]: Ascending ampacity buckets with saturating lookup
//!   - [`choose`]: Per-field user override precedence
//!
//! - Geometry ([`row_geometry`], [`profile_totals`]): Rail profiles and connectors for tile roofs
//!
//! - Spec lookup ([`spec_number`], [`spec_text`], [`spec_flag`]): Tolerant reads of
//!   material attributes under several identifiers, with decimal-comma parsing
//!
//! - Validation ([`validate_stage`]): Per-stage checks gating the wizard
//!
//! - [`BookingService`]: Compensated stock booking against a [`StockStore`]
//!
//! # Design Philosophy
//!
//! The services layer is designed to be:
//! - **Pure**: Compilation has no side effects and never fails
//! - **Deterministic**: Same inputs, same lines in the same order
//! - **Degrading**: Missing catalog data yields zero quantities or skipped lines, not errors
//!
//! # Usage Example
//!
//! ```ignore
//! use pvbom::services::BomCompiler;
//!
//! let bom = BomCompiler::new().compile(&configuration, &catalog, &coefficients);
//! for line in &bom.lines {
//!     println!("{} x {}", line.quantity, line.description);
//! }
//! ```

pub mod booking;
pub mod compiler;
pub mod consolidation;
pub mod geometry;
pub mod recommendation;
pub mod rules;
pub mod sizing;
pub mod spec_lookup;
pub mod validation;

pub use booking::{
    BookedLine, BookingError, BookingReceipt, BookingRecord, BookingRequest, BookingService,
    InMemoryStockStore, StockError, StockStore,
};
pub use compiler::{BomCompiler, compile};
pub use consolidation::consolidate;
pub use geometry::{ProfileDimensions, ProfileTotals, RowGeometry, profile_totals, row_geometry};
pub use recommendation::{RecommendationEngine, choose};
pub use rules::{Augmented, RuleAugmenter};
pub use sizing::{SizingTable, SizingTableEntry};
pub use spec_lookup::{parse_locale_number, spec_flag, spec_ids, spec_number, spec_text};
pub use validation::{ValidationIssue, validate_stage, validate_through};
