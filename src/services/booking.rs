//! Stock booking of a reviewed BOM.
//!
//! Booking decrements stock line by line and then records the booking. The
//! store has no transactions, so every applied decrement is remembered and
//! replayed in reverse when a later step fails.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::Metrics;
use crate::models::{BomReview, MaterialCatalog};

/// Failure reported by a stock store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StockError {
    #[error("Unknown material in stock: {0}")]
    UnknownMaterial(String),

    #[error("Insufficient stock for {material_id}: {available} available, {requested} requested")]
    Insufficient {
        material_id: String,
        available: f64,
        requested: f64,
    },

    #[error("Stock store unavailable: {0}")]
    Unavailable(String),
}

/// Reasons a booking did not go through.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Booking blocked by {} unresolved warning(s)", .0.len())]
    Blocked(Vec<String>),

    #[error("Nothing to book")]
    Empty,

    #[error("Booking failed and was rolled back: {0}")]
    RolledBack(#[source] StockError),

    #[error("Booking failed ({cause}); stock could not be restored for {}", .unreverted.join(", "))]
    RollbackIncomplete {
        cause: StockError,
        unreverted: Vec<String>,
    },
}

/// Persistence seam for stock levels and booking records.
#[cfg_attr(test, mockall::automock)]
pub trait StockStore {
    /// Change the stock level of one material by `delta` (negative books out).
    fn apply_delta(&mut self, material_id: &str, delta: f64) -> Result<(), StockError>;

    /// Persist the booking record once all deltas are applied.
    fn record_booking(&mut self, record: &BookingRecord) -> Result<(), StockError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub customer: String,
    pub project: String,
}

impl BookingRequest {
    pub fn new(customer: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            customer: customer.into(),
            project: project.into(),
        }
    }
}

/// One booked line with the catalog price at booking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookedLine {
    pub material_id: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub customer: String,
    pub project: String,
    pub lines: Vec<BookedLine>,
}

impl BookingRecord {
    /// Snapshot a review together with current catalog prices.
    pub fn snapshot(request: &BookingRequest, review: &BomReview, catalog: &MaterialCatalog) -> Self {
        let lines = review
            .lines()
            .iter()
            .map(|line| BookedLine {
                material_id: line.material_id.clone(),
                description: line.description.clone(),
                quantity: line.quantity,
                unit_price: catalog.get(&line.material_id).and_then(|m| m.price),
            })
            .collect();

        Self {
            customer: request.customer.clone(),
            project: request.project.clone(),
            lines,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingReceipt {
    pub record: BookingRecord,
    pub lines_booked: usize,
}

/// Commits reviewed BOMs against a [`StockStore`].
#[derive(Debug, Default, Clone)]
pub struct BookingService {
    metrics: Option<Arc<Metrics>>,
}

impl BookingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }

    /// Book every line of `review` out of stock.
    ///
    /// Refuses while warnings remain. On any store failure the applied
    /// decrements are reverted in reverse order.
    pub fn commit<S: StockStore + ?Sized>(
        &self,
        store: &mut S,
        review: &BomReview,
        catalog: &MaterialCatalog,
        request: &BookingRequest,
    ) -> Result<BookingReceipt, BookingError> {
        if !review.warnings().is_empty() {
            tracing::warn!(
                "Booking for {} refused: {} warnings unresolved",
                request.project,
                review.warnings().len()
            );
            return Err(BookingError::Blocked(review.warnings().to_vec()));
        }
        if review.lines().is_empty() {
            return Err(BookingError::Empty);
        }

        let record = BookingRecord::snapshot(request, review, catalog);
        let mut applied: Vec<(&str, f64)> = Vec::with_capacity(record.lines.len());

        for line in &record.lines {
            if let Err(e) = store.apply_delta(&line.material_id, -line.quantity) {
                tracing::warn!("Stock decrement for {} failed: {}", line.material_id, e);
                return Err(self.compensate(store, &applied, e));
            }
            applied.push((&line.material_id, line.quantity));
        }

        if let Err(e) = store.record_booking(&record) {
            tracing::warn!("Recording booking for {} failed: {}", request.project, e);
            return Err(self.compensate(store, &applied, e));
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_booking_committed();
        }
        tracing::info!(
            "Booked {} lines for {} / {}",
            record.lines.len(),
            request.customer,
            request.project
        );

        let lines_booked = record.lines.len();
        Ok(BookingReceipt {
            record,
            lines_booked,
        })
    }

    fn compensate<S: StockStore + ?Sized>(
        &self,
        store: &mut S,
        applied: &[(&str, f64)],
        cause: StockError,
    ) -> BookingError {
        if let Some(metrics) = &self.metrics {
            metrics.record_booking_rolled_back();
        }

        let mut unreverted = Vec::new();
        for (material_id, quantity) in applied.iter().rev() {
            if let Err(e) = store.apply_delta(material_id, *quantity) {
                tracing::error!("Failed to restore stock for {}: {}", material_id, e);
                unreverted.push(material_id.to_string());
            }
        }

        if unreverted.is_empty() {
            tracing::info!("Rolled back {} stock changes", applied.len());
            BookingError::RolledBack(cause)
        } else {
            BookingError::RollbackIncomplete { cause, unreverted }
        }
    }
}

/// Stock levels held in memory; refuses to go below zero.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockStore {
    levels: IndexMap<String, f64>,
    bookings: Vec<BookingRecord>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock<I, K>(levels: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            bookings: Vec::new(),
        }
    }

    pub fn level(&self, material_id: &str) -> Option<f64> {
        self.levels.get(material_id).copied()
    }

    pub fn bookings(&self) -> &[BookingRecord] {
        &self.bookings
    }
}

impl StockStore for InMemoryStockStore {
    fn apply_delta(&mut self, material_id: &str, delta: f64) -> Result<(), StockError> {
        let level = self
            .levels
            .get_mut(material_id)
            .ok_or_else(|| StockError::UnknownMaterial(material_id.to_string()))?;

        if *level + delta < 0.0 {
            return Err(StockError::Insufficient {
                material_id: material_id.to_string(),
                available: *level,
                requested: -delta,
            });
        }
        *level += delta;
        Ok(())
    }

    fn record_booking(&mut self, record: &BookingRecord) -> Result<(), StockError> {
        self.bookings.push(record.clone());
        Ok(())
    }
}
