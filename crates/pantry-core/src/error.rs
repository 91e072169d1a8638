use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the pantry telemetry crates.
///
/// Malformed fields inside a record never surface here; they degrade to
/// "no sample". Only structurally unusable input and I/O failures do.
#[derive(Error, Debug)]
pub enum PantryError {
    /// The input was not a collection of records at all.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The requested telemetry path does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No `.json` / `.jsonl` telemetry files were found under the given directory.
    #[error("No telemetry files found in {0}")]
    NoDataFiles(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the pantry crates.
pub type Result<T> = std::result::Result<T, PantryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_input() {
        let err = PantryError::InvalidInput("expected an array of records".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid input: expected an array of records"
        );
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = PantryError::FileRead {
            path: PathBuf::from("/exports/pantry-7.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/exports/pantry-7.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_data_path_not_found() {
        let err = PantryError::DataPathNotFound(PathBuf::from("/missing/dir"));
        assert_eq!(err.to_string(), "Data path not found: /missing/dir");
    }

    #[test]
    fn test_error_display_no_data_files() {
        let err = PantryError::NoDataFiles(PathBuf::from("/empty/dir"));
        assert_eq!(err.to_string(), "No telemetry files found in /empty/dir");
    }

    #[test]
    fn test_error_display_config() {
        let err = PantryError::Config("recent must be positive".to_string());
        assert_eq!(err.to_string(), "Configuration error: recent must be positive");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: PantryError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
