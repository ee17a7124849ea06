//! Persisted chain documents for the rackfx effect chain.
//!
//! A chain is saved as a [`ChainDocument`]: one [`ProcessorRecord`] per
//! slot holding its identity, display name, bypass flag, mix level, editor
//! position, and the default and last state blobs. Documents read and write
//! as TOML or JSON.
//!
//! # Features
//!
//! - **Documents**: capture a live chain, restore it into another one
//! - **Validation**: reject documents that cannot be applied
//! - **Paths**: platform-specific directory for saved chains
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rackfx_chain::EffectProcessorChain;
//! use rackfx_config::{ChainDocument, user_chains_dir};
//! use rackfx_registry::EffectRegistry;
//!
//! let chain = EffectProcessorChain::new(Arc::new(EffectRegistry::new()));
//! chain.prepare(48000.0, 512);
//! chain.append_new_effect("ladder");
//! chain.append_new_effect("delay");
//!
//! let path = user_chains_dir().join("live_set.toml");
//! ChainDocument::capture(&chain).save(&path).unwrap();
//!
//! let report = ChainDocument::load(&path).unwrap().restore_into(&chain).unwrap();
//! println!("{} restored, {} missing", report.restored, report.missing.len());
//! ```

mod document;
mod error;

/// Platform-specific paths for saved chains.
pub mod paths;

/// Chain document validation.
pub mod validation;

pub use document::{
    ChainDocument, DOCUMENT_VERSION, DocumentFormat, ProcessorRecord, RestoreReport,
};
pub use error::{ConfigError, FileAction};
pub use paths::{
    chain_name_from_path, ensure_user_chains_dir, find_chain, list_user_chains, user_chains_dir,
    user_config_dir,
};
pub use validation::{ValidationError, ValidationResult, check_factory, validate_document};
