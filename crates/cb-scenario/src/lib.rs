//! cb-scenario: clinical content for the code-blue simulator.
//!
//! - the action vocabulary shared by catalogs and engines
//! - the diagnosis catalog (built-in table + YAML/JSON loading)
//! - the deterministic code-blue script (phases, arrest trigger, arrhythmia roll)
//! - titration scenario configurations
//! - validation of everything loaded from disk

pub mod action_kind;
pub mod catalog;
pub mod diagnosis;
pub mod script;
pub mod titration;
pub mod validate;

pub use action_kind::{ActionKind, KNOWN_ACTION_NAMES};
pub use catalog::{CatalogFile, DiagnosisCatalog, baseline_map};
pub use diagnosis::{
    Abg, Bmp, Cbc, Diagnosis, Imaging, Labs, LossConditions, Progression, SustainedThreshold,
};
pub use script::{
    ARRHYTHMIA_RECHECK_MS, CodeBluePhase, ScriptState, advance_phase, phase_duration_ms,
    roll_arrhythmia, should_trigger_arrest,
};
pub use titration::{DEFAULT_TITRATION_ID, TitrationConfig};
pub use validate::{ValidationError, validate_catalog, validate_titration};

use std::path::Path;

pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[derive(thiserror::Error, Debug)]
pub enum ScenarioError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported file format: {path} (expected .yaml, .yml or .json)")]
    UnsupportedFormat { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> ScenarioResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => Ok(Format::Yaml),
        Some("json") => Ok(Format::Json),
        _ => Err(ScenarioError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}

fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> ScenarioResult<T> {
    let format = format_of(path)?;
    let content = std::fs::read_to_string(path)?;
    let doc = match format {
        Format::Yaml => serde_yaml::from_str(&content)?,
        Format::Json => serde_json::from_str(&content)?,
    };
    Ok(doc)
}

fn write_document<T: serde::Serialize>(path: &Path, doc: &T) -> ScenarioResult<()> {
    let content = match format_of(path)? {
        Format::Yaml => serde_yaml::to_string(doc)?,
        Format::Json => serde_json::to_string_pretty(doc)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}

/// Load and validate a diagnosis catalog from a `.yaml`/`.yml`/`.json` file.
pub fn load_catalog(path: &Path) -> ScenarioResult<DiagnosisCatalog> {
    let file: CatalogFile = read_document(path)?;
    let catalog = DiagnosisCatalog::try_from(file)?;
    tracing::info!(
        path = %path.display(),
        diagnoses = catalog.len(),
        "loaded diagnosis catalog"
    );
    Ok(catalog)
}

pub fn save_catalog(path: &Path, catalog: &DiagnosisCatalog) -> ScenarioResult<()> {
    write_document(path, &catalog.to_file())
}

/// Load and validate a titration scenario from a `.yaml`/`.yml`/`.json` file.
pub fn load_titration(path: &Path) -> ScenarioResult<TitrationConfig> {
    let config: TitrationConfig = read_document(path)?;
    validate_titration(&config)?;
    tracing::info!(path = %path.display(), scenario = %config.id, "loaded titration scenario");
    Ok(config)
}

pub fn save_titration(path: &Path, config: &TitrationConfig) -> ScenarioResult<()> {
    validate_titration(config)?;
    write_document(path, config)
}
