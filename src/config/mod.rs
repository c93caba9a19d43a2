use crate::models::{CoefficientSet, Configuration, MaterialCatalog};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// Prefix of environment variables overriding coefficients, e.g.
/// `PVBOM_MOUNTING__RATIO=1.8`.
pub const ENV_PREFIX: &str = "PVBOM";

/// Configuration manager for loading and saving the YAML data files.
///
/// Manages three files in the data directory:
/// - Coefficients (`coefficients.yaml`): Rule constants, sizing table, standard materials
/// - Catalog (`catalog.yaml`): Material snapshot with specification attributes
/// - Configuration (`configuration.yaml`): The installation being planned
#[derive(Debug, Clone)]
pub struct ConfigManager {
    data_dir: Utf8PathBuf,
    coefficients_path: Utf8PathBuf,
    catalog_path: Utf8PathBuf,
    configuration_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating the data directory if needed.
    ///
    /// # Arguments
    /// * `data_dir` - Directory containing the data files (e.g., "pvbom-data")
    pub fn new<P: AsRef<Utf8Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {}", data_dir))?;
        }

        Ok(Self {
            coefficients_path: data_dir.join("coefficients.yaml"),
            catalog_path: data_dir.join("catalog.yaml"),
            configuration_path: data_dir.join("configuration.yaml"),
            data_dir,
        })
    }

    /// Environment source for coefficient overrides.
    pub fn env_overrides() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Load and validate the coefficient set.
    ///
    /// # Returns
    /// The validated coefficients with the sizing table sorted, or the
    /// built-in defaults if the file doesn't exist
    pub fn load_coefficients(&self) -> Result<CoefficientSet> {
        self.load_coefficients_with(Self::env_overrides())
    }

    /// Load coefficients layering `env` over the YAML file.
    pub fn load_coefficients_with(&self, env: Environment) -> Result<CoefficientSet> {
        if !self.coefficients_path.exists() {
            tracing::warn!(
                "Coefficients file not found at {}, using defaults",
                self.coefficients_path
            );
            return self.create_default_coefficients();
        }

        let layered = Config::builder()
            .add_source(File::from(self.coefficients_path.as_std_path()).format(FileFormat::Yaml))
            .add_source(env)
            .build()
            .with_context(|| format!("Failed to read coefficients: {}", self.coefficients_path))?;

        let coefficients: CoefficientSet = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse coefficients: {}", self.coefficients_path))?;

        let coefficients = coefficients
            .validated()
            .with_context(|| format!("Invalid coefficients in {}", self.coefficients_path))?;

        tracing::info!(
            "Loaded coefficients v{} from {} ({} sizing buckets)",
            coefficients.version,
            self.coefficients_path,
            coefficients.sizing.len()
        );
        Ok(coefficients)
    }

    /// Save the coefficient set.
    pub fn save_coefficients(&self, coefficients: &CoefficientSet) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(coefficients)
            .context("Failed to serialize coefficients to YAML")?;

        fs::write(&self.coefficients_path, yaml_string)
            .with_context(|| format!("Failed to write coefficients: {}", self.coefficients_path))?;

        tracing::info!("Saved coefficients to {}", self.coefficients_path);
        Ok(())
    }

    /// Load the material catalog.
    ///
    /// # Returns
    /// The loaded catalog, or an empty catalog if the file doesn't exist
    pub fn load_catalog(&self) -> Result<MaterialCatalog> {
        if !self.catalog_path.exists() {
            tracing::warn!(
                "Catalog file not found at {}, starting with an empty catalog",
                self.catalog_path
            );
            return Ok(MaterialCatalog::default());
        }

        let file_contents = fs::read_to_string(&self.catalog_path)
            .with_context(|| format!("Failed to read catalog: {}", self.catalog_path))?;

        let catalog: MaterialCatalog = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse catalog: {}", self.catalog_path))?;

        tracing::info!("Loaded {} materials from {}", catalog.len(), self.catalog_path);
        Ok(catalog)
    }

    /// Save the material catalog.
    pub fn save_catalog(&self, catalog: &MaterialCatalog) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(catalog).context("Failed to serialize catalog to YAML")?;

        fs::write(&self.catalog_path, yaml_string)
            .with_context(|| format!("Failed to write catalog: {}", self.catalog_path))?;

        tracing::info!("Saved catalog to {}", self.catalog_path);
        Ok(())
    }

    /// Load the planned configuration.
    ///
    /// # Arguments
    /// * `coefficients` - Provides the defaults used when the file doesn't exist
    pub fn load_configuration(&self, coefficients: &CoefficientSet) -> Result<Configuration> {
        if !self.configuration_path.exists() {
            tracing::warn!(
                "Configuration file not found at {}, using defaults",
                self.configuration_path
            );
            return Ok(Configuration::with_defaults(coefficients));
        }

        let file_contents = fs::read_to_string(&self.configuration_path).with_context(|| {
            format!("Failed to read configuration: {}", self.configuration_path)
        })?;

        let configuration: Configuration = serde_yaml_ng::from_str(&file_contents).with_context(|| {
            format!("Failed to parse configuration: {}", self.configuration_path)
        })?;

        tracing::info!("Loaded configuration from {}", self.configuration_path);
        Ok(configuration)
    }

    /// Save the planned configuration.
    pub fn save_configuration(&self, configuration: &Configuration) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(configuration)
            .context("Failed to serialize configuration to YAML")?;

        fs::write(&self.configuration_path, yaml_string).with_context(|| {
            format!("Failed to write configuration: {}", self.configuration_path)
        })?;

        tracing::info!("Saved configuration to {}", self.configuration_path);
        Ok(())
    }

    /// Write the built-in coefficients so they can be edited, and return them.
    ///
    /// This is used when the coefficients file doesn't exist.
    fn create_default_coefficients(&self) -> Result<CoefficientSet> {
        let coefficients = CoefficientSet::default()
            .validated()
            .context("Built-in coefficients are invalid")?;

        if let Err(e) = self.save_coefficients(&coefficients) {
            tracing::warn!("Could not write default coefficients: {:#}", e);
        }
        Ok(coefficients)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    pub fn coefficients_path(&self) -> &Utf8Path {
        &self.coefficients_path
    }
}
