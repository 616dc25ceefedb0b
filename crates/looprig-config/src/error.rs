//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur while loading, saving or assembling a rig.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A value is out of range or inconsistent with another.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Module id not in the registry, or not in the chain.
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// Parameter name not found on the module.
    #[error("unknown parameter '{param}' for module '{module}'")]
    UnknownParameter {
        /// Module id.
        module: String,
        /// Parameter name as written in the file.
        param: String,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create an unknown parameter error.
    pub fn unknown_parameter(module: impl Into<String>, param: impl Into<String>) -> Self {
        ConfigError::UnknownParameter {
            module: module.into(),
            param: param.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn read_file_names_the_path() {
        let err = ConfigError::read_file(
            "/rigs/stage.toml",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/rigs/stage.toml"), "got: {msg}");
        assert!(msg.contains("missing"), "got: {msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn write_file_keeps_source() {
        let err = ConfigError::write_file(
            "/ro/rig.toml",
            io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        );
        assert!(err.to_string().starts_with("failed to write file"));
        assert!(err.source().is_some());
    }

    #[test]
    fn unknown_parameter_message() {
        let err = ConfigError::unknown_parameter("distortion", "drive");
        let msg = err.to_string();
        assert!(msg.contains("'drive'"), "got: {msg}");
        assert!(msg.contains("'distortion'"), "got: {msg}");
    }

    #[test]
    fn validation_wraps() {
        let err: ConfigError = ValidationError::NotPositive {
            field: "sample_rate",
        }
        .into();
        assert!(err.to_string().contains("sample_rate"));
    }

    #[test]
    fn toml_parse_from() {
        let parse: Result<toml::Value, _> = toml::from_str("chain = [");
        let err: ConfigError = parse.map_err(ConfigError::from).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse TOML"));
    }
}
