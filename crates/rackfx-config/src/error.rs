//! Errors raised while loading, saving, or restoring chain documents.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Filesystem step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// Reading a document.
    Read,
    /// Writing a document.
    Write,
    /// Creating the directory a document goes in.
    CreateDir,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileAction::Read => "read file",
            FileAction::Write => "write file",
            FileAction::CreateDir => "create directory",
        })
    }
}

/// Everything that can go wrong between a chain and its stored document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem access failed.
    #[error("failed to {action} '{path}': {source}")]
    Io {
        /// What was being attempted.
        action: FileAction,
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML text could not be parsed into a document.
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A document could not be rendered as TOML.
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON text was malformed, or a document could not be rendered.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored state blob is not valid base64.
    #[error("state blob for '{identity}' is not valid base64: {source}")]
    Base64 {
        /// Identity of the processor the blob belongs to.
        identity: String,
        /// Underlying decode error.
        #[source]
        source: base64::DecodeError,
    },

    /// The document comes from a newer format revision.
    #[error("unsupported document version {found} (expected at most {supported})")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Highest version this build reads.
        supported: u32,
    },

    /// The document failed validation before anything was restored.
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),
}

impl ConfigError {
    fn io(action: FileAction, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Reading `path` failed.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io(FileAction::Read, path, source)
    }

    /// Writing `path` failed.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io(FileAction::Write, path, source)
    }

    /// Creating the directory `path` failed.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io(FileAction::CreateDir, path, source)
    }

    /// The blob stored for `identity` did not decode.
    pub fn base64(identity: impl Into<String>, source: base64::DecodeError) -> Self {
        ConfigError::Base64 {
            identity: identity.into(),
            source,
        }
    }

    /// Whether this is a missing-file error, as opposed to a parse or
    /// permission problem.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ConfigError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
