//! State blob format.
//!
//! A blob is compact JSON:
//!
//! ```json
//! {"version":1,"id":"delay","params":{"500":300.0,"501":35.0}}
//! ```
//!
//! Parameters are keyed by stable [`ParamId`] rather than index, so blobs
//! survive parameters being reordered or appended.

use std::collections::BTreeMap;

use rackfx_core::ParamId;
use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Current blob format version.
pub const STATE_VERSION: u32 = 1;

/// Decoded contents of a state blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitState {
    /// Format version.
    pub version: u32,
    /// Canonical unit identifier.
    pub id: String,
    /// Plain parameter values by stable id.
    #[serde(default)]
    pub params: BTreeMap<u32, f32>,
}

impl UnitState {
    /// Empty state for `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            version: STATE_VERSION,
            id: id.into(),
            params: BTreeMap::new(),
        }
    }

    /// Records a parameter value.
    pub fn insert(&mut self, id: ParamId, value: f32) {
        self.params.insert(id.0, value);
    }

    /// Value recorded for `id`.
    pub fn get(&self, id: ParamId) -> Option<f32> {
        self.params.get(&id.0).copied()
    }

    /// Serializes to blob bytes.
    pub fn encode(&self) -> Vec<u8> {
        // A map of integers to floats always serializes.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Parses blob bytes and checks the version.
    pub fn decode(bytes: &[u8]) -> Result<Self, StateError> {
        let state: UnitState = serde_json::from_slice(bytes)?;
        if state.version > STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: state.version,
                supported: STATE_VERSION,
            });
        }
        Ok(state)
    }

    /// Parses blob bytes and checks they belong to `identifier`.
    pub fn decode_for(bytes: &[u8], identifier: &str) -> Result<Self, StateError> {
        let state = Self::decode(bytes)?;
        if state.id != identifier {
            return Err(StateError::IdentifierMismatch {
                expected: identifier.to_string(),
                found: state.id,
            });
        }
        Ok(state)
    }
}
