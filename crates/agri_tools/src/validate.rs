//! Data validation utilities.

use std::path::{Path, PathBuf};

use agri_core::data::{EconomyCatalog, EventCatalog};
use agri_core::error::GameError;
use agri_core::events::EventSystem;
use agri_core::math::Fixed;
use thiserror::Error;

/// Economy catalog file name inside a data directory.
pub const ECONOMY_FILE: &str = "economy.ron";

/// Event catalog file name inside a data directory.
pub const EVENTS_FILE: &str = "events.json";

/// Why a data directory failed validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A data file could not be read.
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A data file could not be parsed.
    #[error(transparent)]
    Parse(#[from] GameError),

    /// The catalogs parsed but are inconsistent.
    #[error("{} problem(s) found:\n  {}", .0.len(), .0.join("\n  "))]
    Invalid(Vec<String>),
}

/// What a valid data directory contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSummary {
    /// Number of crops.
    pub crops: usize,
    /// Number of animals.
    pub animals: usize,
    /// Number of structures, upgraded tiers included.
    pub structures: usize,
    /// Number of instruments.
    pub instruments: usize,
    /// Number of events.
    pub events: usize,
    /// Sum of event probabilities.
    pub total_probability: Fixed,
}

fn read(path: PathBuf) -> Result<(String, PathBuf), ValidationError> {
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok((text, path)),
        Err(source) => Err(ValidationError::Io { path, source }),
    }
}

/// Load both catalogs from a data directory.
///
/// # Errors
///
/// Returns an error if either file is missing or fails to parse.
pub fn load_catalogs(dir: &Path) -> Result<(EconomyCatalog, EventCatalog), ValidationError> {
    let (economy_text, economy_path) = read(dir.join(ECONOMY_FILE))?;
    let economy = EconomyCatalog::from_ron_str(&economy_text, &economy_path.to_string_lossy())?;

    let (events_text, events_path) = read(dir.join(EVENTS_FILE))?;
    let events = EventCatalog::from_json_str(&events_text, &events_path.to_string_lossy())?;

    Ok((economy, events))
}

/// Validate the catalogs in a data directory.
///
/// # Errors
///
/// Returns an error if any data file fails to load or the catalogs
/// reference each other inconsistently.
pub fn validate_data_directory(path: &Path) -> Result<DataSummary, ValidationError> {
    let (economy, events) = load_catalogs(path)?;
    let events = EventSystem::new(events);

    let mut problems = economy.validate();
    problems.extend(events.validate(&economy));
    if !problems.is_empty() {
        for problem in &problems {
            tracing::warn!("{problem}");
        }
        return Err(ValidationError::Invalid(problems));
    }

    Ok(DataSummary {
        crops: economy.crops.len(),
        animals: economy.animals.len(),
        structures: economy.structures.len(),
        instruments: economy.instruments.len(),
        events: events.catalog().len(),
        total_probability: events.catalog().total_probability(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_core::data::{BUILTIN_ECONOMY_RON, BUILTIN_EVENTS_JSON};

    fn write_dir(economy: &str, events: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ECONOMY_FILE), economy).unwrap();
        std::fs::write(dir.path().join(EVENTS_FILE), events).unwrap();
        dir
    }

    #[test]
    fn test_builtin_data_validates() {
        let dir = write_dir(BUILTIN_ECONOMY_RON, BUILTIN_EVENTS_JSON);
        let summary = validate_data_directory(dir.path()).unwrap();
        assert_eq!(summary.crops, 4);
        assert_eq!(summary.animals, 4);
        assert_eq!(summary.instruments, 3);
        assert_eq!(summary.events, 14);
        assert!(summary.total_probability <= Fixed::ONE);
    }

    #[test]
    fn test_missing_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ECONOMY_FILE), BUILTIN_ECONOMY_RON).unwrap();
        let err = validate_data_directory(dir.path()).unwrap_err();
        assert!(matches!(err, ValidationError::Io { ref path, .. } if path.ends_with(EVENTS_FILE)));
    }

    #[test]
    fn test_parse_error_reported() {
        let dir = write_dir("EconomyCatalog(crops: {", BUILTIN_EVENTS_JSON);
        let err = validate_data_directory(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Parse(GameError::DataParseError { .. })
        ));
    }

    #[test]
    fn test_unknown_references_reported() {
        let events = r#"[
            { "id": "locusts", "type": "DISASTER", "name": "Locusts", "probability": 0.1,
              "effects": { "cropFailure": "wheat" } }
        ]"#;
        let dir = write_dir(BUILTIN_ECONOMY_RON, events);
        let err = validate_data_directory(dir.path()).unwrap_err();
        let ValidationError::Invalid(problems) = err else {
            panic!("expected invalid catalogs, got {err}");
        };
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("wheat"));
    }
}
