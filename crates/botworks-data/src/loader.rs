//! File loading: format detection (RON/JSON/TOML), discovery, and
//! deserialization of settings and scenario files.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use botworks_core::catalog::CatalogError;
use botworks_core::engine::Engine;

use crate::schema::{Scenario, Settings};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading data files.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A catalog override produced an invalid spec.
    #[error("invalid catalog override in {file}: {source}")]
    Catalog {
        file: PathBuf,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Look for `{base_name}.ron`, `.toml`, or `.json` in `dir`.
///
/// `Ok(None)` when none exists; `ConflictingFormats` when more than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format).map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

fn deserialize_str<T: DeserializeOwned>(content: &str, format: Format) -> Result<T, String> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    }
}

/// Load a settings file and check that its catalog overrides are valid.
pub fn load_settings(path: &Path) -> Result<Settings, DataLoadError> {
    let settings: Settings = deserialize_file(path)?;
    settings
        .build_catalog()
        .map_err(|source| DataLoadError::Catalog {
            file: path.to_path_buf(),
            source,
        })?;
    Ok(settings)
}

pub fn load_scenario(path: &Path) -> Result<Scenario, DataLoadError> {
    deserialize_file(path)
}

// ===========================================================================
// Directory loading
// ===========================================================================

/// Settings and scenario read from one data directory.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSetup {
    pub settings: Settings,
    pub scenario: Scenario,
}

impl GameSetup {
    /// An empty factory with this setup's catalog and config. The scenario
    /// is not applied; feed [`Scenario::commands`] through the engine.
    pub fn build_engine(&self) -> Result<Engine, CatalogError> {
        self.settings.build_engine()
    }
}

/// Load `settings.*` and `scenario.*` from `dir`. A missing settings file
/// means defaults; a missing scenario means [`Scenario::demo`].
pub fn load_data_dir(dir: &Path) -> Result<GameSetup, DataLoadError> {
    let settings = match find_data_file(dir, "settings")? {
        Some(path) => load_settings(&path)?,
        None => Settings::default(),
    };
    let scenario = match find_data_file(dir, "scenario")? {
        Some(path) => load_scenario(&path)?,
        None => Scenario::demo(),
    };
    tracing::debug!(
        dir = %dir.display(),
        scenario = %scenario.name,
        overrides = settings.catalog.len(),
        "loaded data directory"
    );
    Ok(GameSetup { settings, scenario })
}

// ===========================================================================
// Tests
// ===========================================================================
