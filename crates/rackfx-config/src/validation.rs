//! Chain document validation.
//!
//! [`validate_document`] checks what a document must satisfy to be applied
//! at all. [`check_factory`] reports identities the factory cannot build;
//! those are not fatal, since such processors load as missing slots.
//!
//! # Example
//!
//! ```rust
//! use rackfx_config::{ChainDocument, ProcessorRecord, validate_document};
//!
//! let mut doc = ChainDocument::new(48000.0);
//! doc.processors.push(ProcessorRecord::new("gain", "Gain"));
//! assert!(validate_document(&doc).is_ok());
//!
//! doc.processors[0].mix_level = 2.0;
//! assert!(validate_document(&doc).is_err());
//! ```

use rackfx_registry::EffectFactory;
use thiserror::Error;

use crate::document::ChainDocument;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A processor has no identity.
    #[error("processor {index} has an empty identity")]
    EmptyIdentity {
        /// Position in the chain.
        index: usize,
    },

    /// Mix level outside `[0, 1]`.
    #[error("processor {index} ('{identity}') mix level {value} out of range [0, 1]")]
    MixOutOfRange {
        /// Position in the chain.
        index: usize,
        /// Processor identity.
        identity: String,
        /// The offending value.
        value: f32,
    },

    /// Sample rate hint that is not a positive finite number.
    #[error("sample rate {0} is not a positive finite number")]
    InvalidSampleRate(f64),

    /// The factory cannot build this identity.
    #[error("unknown effect '{identity}' at processor {index}")]
    UnknownEffect {
        /// Position in the chain.
        index: usize,
        /// Processor identity.
        identity: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Checks sample rate, identities, and mix levels.
pub fn validate_document(doc: &ChainDocument) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if !(doc.sample_rate.is_finite() && doc.sample_rate > 0.0) {
        errors.push(ValidationError::InvalidSampleRate(doc.sample_rate));
    }

    for (index, record) in doc.processors.iter().enumerate() {
        if record.identity.trim().is_empty() {
            errors.push(ValidationError::EmptyIdentity { index });
        }
        if !(0.0..=1.0).contains(&record.mix_level) {
            errors.push(ValidationError::MixOutOfRange {
                index,
                identity: record.identity.clone(),
                value: record.mix_level,
            });
        }
    }

    collect(errors)
}

/// Lists processors whose identity `factory` cannot build.
pub fn check_factory(doc: &ChainDocument, factory: &dyn EffectFactory) -> Vec<ValidationError> {
    let sample_rate = doc.sample_rate as f32;
    doc.processors
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            factory
                .create_by_identifier(&record.identity, sample_rate)
                .is_none()
        })
        .map(|(index, record)| ValidationError::UnknownEffect {
            index,
            identity: record.identity.clone(),
        })
        .collect()
}
