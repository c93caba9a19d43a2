//! pvbom - Bill-of-materials compiler for photovoltaic installations
//!
//! Command-line entry point.
//!
//! # Execution Flow
//!
//! 1. Initialize logging → logs/pvbom.<date>
//! 2. Load the data files from the data directory (default `pvbom-data/`)
//!    - `coefficients.yaml` → rule constants, sizing table, defaults (env overrides: `PVBOM_*`)
//!    - `catalog.yaml` → material snapshot
//!    - `configuration.yaml` → the installation to compile
//! 3. Start a session, apply the configuration, report validation issues per stage
//! 4. Print the compiled BOM as YAML on stdout
//!
//! # Usage
//!
//! ```text
//! pvbom [DATA_DIR] [--debug]
//! ```

use anyhow::{Context, Result};
use pvbom::models::WizardStage;
use pvbom::services::validate_stage;
use pvbom::{APP_NAME, ConfigManager, Metrics, SessionManager, VERSION};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

const DEFAULT_DATA_DIR: &str = "pvbom-data";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let debug_mode = args.iter().any(|a| a == "--debug");
    let data_dir = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(String::as_str)
        .unwrap_or(DEFAULT_DATA_DIR);

    let _log_guard = pvbom::logging::setup_logging_with_console("logs", "pvbom", debug_mode, debug_mode)?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let config_manager = ConfigManager::new(data_dir)?;
    let coefficients = config_manager.load_coefficients()?;
    let catalog = config_manager.load_catalog()?;
    let configuration = config_manager.load_configuration(&coefficients)?;

    let metrics = Arc::new(Metrics::new());
    let session = SessionManager::with_metrics(Arc::new(catalog), Arc::new(coefficients), metrics.clone());

    let mut events = session.subscribe();
    let listener = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(change) => tracing::debug!("Session event: {:?}", change),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Session listener skipped {} events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    session.update_configuration(|config| *config = configuration);

    let mut issue_count = 0;
    session.read(|state| {
        for stage in WizardStage::ALL {
            for issue in validate_stage(stage, &state.configuration) {
                issue_count += 1;
                tracing::warn!("[{}] {}: {}", stage.label(), issue.field, issue.message);
            }
        }
    });

    let bom = session.bom();
    for warning in &bom.warnings {
        tracing::warn!("BOM warning: {}", warning);
    }

    let yaml = serde_yaml_ng::to_string(&bom).context("Failed to serialize BOM to YAML")?;
    print!("{}", yaml);

    tracing::info!(
        "Compiled {} lines, {} warnings, {} validation issues",
        bom.lines.len(),
        bom.warnings.len(),
        issue_count
    );

    drop(session);
    if let Err(e) = listener.await {
        tracing::warn!("Session listener ended abnormally: {}", e);
    }

    metrics.log_summary();
    Ok(())
}
