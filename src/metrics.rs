// Session metrics module
//
// Lightweight counters for compiler runs, wizard transitions and bookings

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Session-wide counters.
///
/// Uses atomic operations so the session manager and booking service can
/// record without locks. Summaries are logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Number of compiler runs
    pub compilations: AtomicU64,

    /// Total compile time in microseconds
    pub total_compile_time_us: AtomicU64,

    /// Warnings emitted across all compiler runs
    pub warnings_emitted: AtomicU64,

    /// Forward stage transitions refused by validation
    pub blocked_advances: AtomicU64,

    /// Bookings written to the stock store
    pub bookings_committed: AtomicU64,

    /// Bookings that failed and were compensated
    pub bookings_rolled_back: AtomicU64,

    /// Number of session events broadcast
    pub session_broadcasts: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            compilations: AtomicU64::new(0),
            total_compile_time_us: AtomicU64::new(0),
            warnings_emitted: AtomicU64::new(0),
            blocked_advances: AtomicU64::new(0),
            bookings_committed: AtomicU64::new(0),
            bookings_rolled_back: AtomicU64::new(0),
            session_broadcasts: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one compiler run
    pub fn record_compilation(&self, duration: Duration, warnings: usize) {
        self.compilations.fetch_add(1, Ordering::Relaxed);
        self.total_compile_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.warnings_emitted
            .fetch_add(warnings as u64, Ordering::Relaxed);
    }

    pub fn record_blocked_advance(&self) {
        self.blocked_advances.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_booking_committed(&self) {
        self.bookings_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_booking_rolled_back(&self) {
        self.bookings_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_broadcast(&self) {
        self.session_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average compile time in milliseconds
    pub fn avg_compile_time_ms(&self) -> f64 {
        let total = self.total_compile_time_us.load(Ordering::Relaxed);
        let count = self.compilations.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64 / 1000.0
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Compilations: {} (avg: {:.3}ms), warnings emitted: {}",
            self.compilations.load(Ordering::Relaxed),
            self.avg_compile_time_ms(),
            self.warnings_emitted.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Blocked advances: {}, session events: {}",
            self.blocked_advances.load(Ordering::Relaxed),
            self.session_broadcasts.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Bookings: {} committed, {} rolled back",
            self.bookings_committed.load(Ordering::Relaxed),
            self.bookings_rolled_back.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
