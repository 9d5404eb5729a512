//! Error types for the gfop library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum GfopError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("The following groups are not present in the network: {}", .groups.join(", "))]
    InvalidGroups { groups: Vec<String> },

    #[error("Invalid sample type '{0}': expected 'simple', 'complex' or 'all'")]
    InvalidSampleType(String),

    #[error("Unsupported metadata file '{0}': must be either a CSV (.csv) or TSV (.tsv, .txt)")]
    UnsupportedMetadataFormat(String),

    #[error("Invalid value '{value}' at row {row}, column '{column}'")]
    InvalidValue {
        value: String,
        row: usize,
        column: String,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GfopError {
    /// Whether this error stems from caller configuration rather than I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GfopError::MissingColumn(_)
                | GfopError::InvalidGroups { .. }
                | GfopError::InvalidSampleType(_)
                | GfopError::UnsupportedMetadataFormat(_)
                | GfopError::InvalidParameter(_)
        )
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, GfopError>;

/// Fail with [`GfopError::FileNotFound`] before attempting to open `path`.
pub(crate) fn ensure_exists(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(GfopError::FileNotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_groups_message_names_each_group() {
        let err = GfopError::InvalidGroups {
            groups: vec!["G7".to_string(), "G9".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("G7"));
        assert!(msg.contains("G9"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_io_is_not_configuration() {
        let err = GfopError::FileNotFound(PathBuf::from("missing.tsv"));
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("missing.tsv"));
    }
}
