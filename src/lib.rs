// pvbom - Bill-of-materials compiler for photovoltaic installations
//
// This is the library crate containing the compiler, its data model and the session layer.
// The binary crate (main.rs) compiles a configuration from a data directory.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{BomLine, CoefficientSet, CompiledBom, Configuration, MaterialCatalog};
pub use services::{BomCompiler, BookingService, compile};
pub use state::{SessionChange, SessionManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
