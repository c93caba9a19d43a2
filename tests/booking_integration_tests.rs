//! Integration tests for stock booking
//!
//! These tests verify:
//! - A clean review books every line and records the booking
//! - Failures part-way through restore all earlier stock changes
//! - Warnings block booking until resolved
//! - The full flow from a session's review stage to a stock booking

mod common;

use pvbom::models::{BomReview, CoefficientSet, CompiledBom, MaterialCatalog, ModuleRow};
use pvbom::services::{
    BookingError, BookingRecord, BookingRequest, BookingService, InMemoryStockStore, StockError,
    StockStore,
};
use pvbom::{Metrics, SessionManager};
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn review(lines: &[(&str, f64)]) -> BomReview {
    let catalog = common::catalog();
    let mut review = BomReview::from_compiled(&CompiledBom::default());
    for (id, quantity) in lines {
        review.add_manual(id, *quantity, &catalog);
    }
    review
}

fn request() -> BookingRequest {
    BookingRequest::new("Muster GmbH", "Roof 2026-07")
}

/// Store whose booking ledger is down while stock updates still work.
struct LedgerDown {
    inner: InMemoryStockStore,
}

impl StockStore for LedgerDown {
    fn apply_delta(&mut self, material_id: &str, delta: f64) -> Result<(), StockError> {
        self.inner.apply_delta(material_id, delta)
    }

    fn record_booking(&mut self, _record: &BookingRecord) -> Result<(), StockError> {
        Err(StockError::Unavailable("ledger offline".to_string()))
    }
}

#[test]
fn test_commit_books_all_lines() {
    let mut store = InMemoryStockStore::with_stock([("MOD-430", 40.0), ("INV-10K", 3.0)]);
    let review = review(&[("MOD-430", 10.0), ("INV-10K", 1.0)]);

    let receipt = BookingService::new()
        .commit(&mut store, &review, &common::catalog(), &request())
        .unwrap();

    assert_eq!(receipt.lines_booked, 2);
    assert_eq!(store.level("MOD-430"), Some(30.0));
    assert_eq!(store.level("INV-10K"), Some(2.0));
    assert_eq!(store.bookings(), &[receipt.record.clone()]);

    let inverter = receipt
        .record
        .lines
        .iter()
        .find(|l| l.material_id == "INV-10K")
        .unwrap();
    assert_eq!(inverter.unit_price, Some(1890.0));
    assert_eq!(inverter.description, "Hybrid inverter 10 kW");
}

#[test]
fn test_insufficient_stock_rolls_back_earlier_lines() {
    let mut store = InMemoryStockStore::with_stock([("MOD-430", 40.0), ("INV-10K", 0.0)]);
    let review = review(&[("MOD-430", 10.0), ("INV-10K", 1.0)]);

    let err = BookingService::new()
        .commit(&mut store, &review, &common::catalog(), &request())
        .unwrap_err();

    assert!(matches!(
        err,
        BookingError::RolledBack(StockError::Insufficient { ref material_id, .. }) if material_id == "INV-10K"
    ));
    assert_eq!(store.level("MOD-430"), Some(40.0));
    assert_eq!(store.level("INV-10K"), Some(0.0));
    assert!(store.bookings().is_empty());
}

#[test]
fn test_unknown_material_rolls_back() {
    let mut store = InMemoryStockStore::with_stock([("MOD-430", 40.0)]);
    let review = review(&[("MOD-430", 10.0), ("NOT-STOCKED", 1.0)]);

    let err = BookingService::new()
        .commit(&mut store, &review, &common::catalog(), &request())
        .unwrap_err();

    assert_eq!(
        err,
        BookingError::RolledBack(StockError::UnknownMaterial("NOT-STOCKED".to_string()))
    );
    assert_eq!(store.level("MOD-430"), Some(40.0));
}

#[test]
fn test_ledger_failure_restores_all_stock() {
    let metrics = Arc::new(Metrics::new());
    let mut store = LedgerDown {
        inner: InMemoryStockStore::with_stock([("MOD-430", 40.0), ("INV-10K", 3.0)]),
    };
    let review = review(&[("MOD-430", 10.0), ("INV-10K", 1.0)]);

    let err = BookingService::with_metrics(metrics.clone())
        .commit(&mut store, &review, &common::catalog(), &request())
        .unwrap_err();

    assert!(matches!(err, BookingError::RolledBack(StockError::Unavailable(_))));
    assert_eq!(store.inner.level("MOD-430"), Some(40.0));
    assert_eq!(store.inner.level("INV-10K"), Some(3.0));
    assert_eq!(metrics.bookings_rolled_back.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.bookings_committed.load(Ordering::Relaxed), 0);
}

#[test]
fn test_warnings_block_booking() {
    let mut bom = CompiledBom::default();
    bom.warnings.push("String plan wires 8 modules but the layout contains 10".to_string());
    let mut review = BomReview::from_compiled(&bom);
    review.add_manual("MOD-430", 10.0, &common::catalog());
    let mut store = InMemoryStockStore::with_stock([("MOD-430", 40.0)]);

    let err = BookingService::new()
        .commit(&mut store, &review, &common::catalog(), &request())
        .unwrap_err();

    assert!(matches!(err, BookingError::Blocked(ref warnings) if warnings.len() == 1));
    assert_eq!(store.level("MOD-430"), Some(40.0));
}

#[test]
fn test_empty_review_is_refused() {
    let mut store = InMemoryStockStore::new();
    let err = BookingService::new()
        .commit(
            &mut store,
            &BomReview::default(),
            &MaterialCatalog::default(),
            &request(),
        )
        .unwrap_err();

    assert_eq!(err, BookingError::Empty);
}

#[test]
fn test_session_review_to_booking() {
    let session = SessionManager::new(Arc::new(common::catalog()), Arc::new(CoefficientSet::default()));
    session.update_configuration(|config| *config = common::configuration());
    for _ in 0..5 {
        session.advance_stage();
    }
    session.apply_review_edit(|review, catalog| review.add_manual("CABLE-TIE-200", 100.0, catalog));

    let state = session.snapshot();
    let review = state.review.as_ref().unwrap();
    assert!(review.can_commit());

    let mut store = InMemoryStockStore::with_stock(
        review
            .lines()
            .iter()
            .map(|l| (l.material_id.clone(), l.quantity + 5.0)),
    );
    let receipt = BookingService::new()
        .commit(&mut store, review, &state.catalog, &request())
        .unwrap();

    assert_eq!(receipt.lines_booked, review.lines().len());
    for line in review.lines() {
        assert_eq!(store.level(&line.material_id), Some(5.0));
    }
}

#[test]
fn test_session_with_parity_warning_cannot_book() {
    let session = SessionManager::new(Arc::new(common::catalog()), Arc::new(CoefficientSet::default()));
    session.update_configuration(|config| *config = common::configuration());
    for _ in 0..5 {
        session.advance_stage();
    }
    // Editing the layout in review recompiles into a fresh review
    session.update_configuration(|config| config.layout.landscape.push(ModuleRow::new(4)));

    let state = session.snapshot();
    let review = state.review.as_ref().unwrap();
    assert!(!review.can_commit());

    let mut store = InMemoryStockStore::new();
    let err = BookingService::new()
        .commit(&mut store, review, &state.catalog, &request())
        .unwrap_err();
    assert!(matches!(err, BookingError::Blocked(_)));
}
