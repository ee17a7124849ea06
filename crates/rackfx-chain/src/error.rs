//! Error types for processor state handling.

use thiserror::Error;

/// Why a state blob could not be applied.
///
/// Public chain and processor operations collapse these to `bool`; the
/// detail goes to the log.
#[derive(Debug, Error)]
pub enum StateError {
    /// The blob is not valid state JSON.
    #[error("malformed state blob: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The blob was written by a newer format.
    #[error("unsupported state version {found} (expected at most {supported})")]
    UnsupportedVersion {
        /// Version found in the blob.
        found: u32,
        /// Highest version this build reads.
        supported: u32,
    },

    /// The blob belongs to a different unit.
    #[error("state is for '{found}', processor is '{expected}'")]
    IdentifierMismatch {
        /// Identifier of the processor.
        expected: String,
        /// Identifier recorded in the blob.
        found: String,
    },

    /// The processor has no unit to restore into.
    #[error("unit '{0}' is not loaded")]
    Unresolved(String),
}
