//! Persisted chain documents.
//!
//! A [`ChainDocument`] stores one [`ProcessorRecord`] per slot, in chain
//! order. State blobs are opaque bytes and are stored base64-encoded so the
//! document stays readable as TOML or JSON.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rackfx_chain::EffectProcessorChain;
//! use rackfx_config::ChainDocument;
//! use rackfx_registry::EffectRegistry;
//!
//! let chain = EffectProcessorChain::new(Arc::new(EffectRegistry::new()));
//! chain.prepare(48000.0, 256);
//! chain.append_new_effect("gain");
//! chain.set_mix_level(0, 0.25);
//!
//! let text = ChainDocument::capture(&chain).to_toml().unwrap();
//!
//! let restored = EffectProcessorChain::new(Arc::new(EffectRegistry::new()));
//! restored.prepare(48000.0, 256);
//! let report = ChainDocument::from_toml(&text).unwrap().restore_into(&restored).unwrap();
//! assert_eq!(report.restored, 1);
//! assert_eq!(restored.effect(0).unwrap().mix_level(), 0.25);
//! ```

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rackfx_chain::{EffectProcessor, EffectProcessorChain, ProcessorHandle, UiPosition};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::validation::validate_document;

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

fn default_sample_rate() -> f64 {
    48000.0
}

fn default_mix() -> f32 {
    1.0
}

/// Serialized form of one processor slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorRecord {
    /// Factory identifier used to rebuild the unit.
    pub identity: String,

    /// Name shown to the user.
    #[serde(default)]
    pub display_name: String,

    /// Whether the slot is bypassed.
    #[serde(default)]
    pub bypassed: bool,

    /// Dry/wet level in `[0, 1]`.
    #[serde(default = "default_mix")]
    pub mix_level: f32,

    /// State blob the unit was created with, base64.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_state: String,

    /// Most recent state blob, base64.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_state: String,

    /// Where the editor last drew this slot.
    #[serde(default)]
    pub ui_position: UiPosition,
}

impl ProcessorRecord {
    /// Record with the given identity and name, unbypassed, fully wet and
    /// without state.
    pub fn new(identity: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            display_name: display_name.into(),
            bypassed: false,
            mix_level: 1.0,
            default_state: String::new(),
            last_state: String::new(),
            ui_position: UiPosition::default(),
        }
    }

    /// Snapshot of a live processor.
    pub fn capture(processor: &EffectProcessor) -> Self {
        let last_state = if processor.has_undecoded_state() {
            String::from_utf8_lossy(&processor.state_blob()).into_owned()
        } else {
            encode_blob(&processor.state_blob())
        };
        Self {
            identity: processor.identifier().to_string(),
            display_name: processor.display_name(),
            bypassed: processor.is_bypassed(),
            mix_level: processor.mix_level(),
            default_state: encode_blob(&processor.default_state_blob()),
            last_state,
            ui_position: processor.ui_position(),
        }
    }

    /// Decoded default state blob.
    pub fn default_state_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        decode_blob(&self.identity, &self.default_state)
    }

    /// Decoded last state blob.
    pub fn last_state_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        decode_blob(&self.identity, &self.last_state)
    }
}

fn encode_blob(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        String::new()
    } else {
        STANDARD.encode(bytes)
    }
}

fn decode_blob(identity: &str, text: &str) -> Result<Vec<u8>, ConfigError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    STANDARD
        .decode(text)
        .map_err(|e| ConfigError::base64(identity, e))
}

/// Outcome of [`ChainDocument::restore_into`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Slots whose unit was built and whose state applied cleanly.
    pub restored: usize,
    /// Identities of slots that ended up as missing placeholders, in order.
    pub missing: Vec<String>,
}

impl RestoreReport {
    /// Whether every slot was restored.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// On-disk encoding of a [`ChainDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    /// TOML, the default.
    #[default]
    Toml,
    /// JSON.
    Json,
}

impl DocumentFormat {
    /// Picks the format from a file extension; anything other than `.json`
    /// is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Toml,
        }
    }
}

/// A persisted processor chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDocument {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Sample rate the chain was running at when captured.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,

    /// Processor slots in chain order.
    #[serde(default)]
    pub processors: Vec<ProcessorRecord>,
}

impl Default for ChainDocument {
    fn default() -> Self {
        Self::new(default_sample_rate())
    }
}

impl ChainDocument {
    /// Empty document at the current version.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            sample_rate,
            processors: Vec::new(),
        }
    }

    /// Snapshot of every slot in `chain`, missing ones included.
    pub fn capture(chain: &EffectProcessorChain) -> Self {
        let processors = chain
            .effects()
            .iter()
            .map(|p| ProcessorRecord::capture(p))
            .collect();
        Self {
            version: DOCUMENT_VERSION,
            sample_rate: f64::from(chain.sample_rate()),
            processors,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Whether the document has no slots.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Runs [`validate_document`] on this document.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_document(self)?;
        Ok(())
    }

    /// Replaces the contents of `chain` with the slots in this document.
    ///
    /// The document is validated first and `chain` is left untouched if it
    /// fails. Slots the factory cannot build, or whose state does not
    /// apply, become missing placeholders that keep their stored blobs, so
    /// capturing the chain again reproduces them. The chain keeps its
    /// current sample rate; the document's rate is only a hint.
    pub fn restore_into(&self, chain: &EffectProcessorChain) -> Result<RestoreReport, ConfigError> {
        self.validate()?;

        let mut report = RestoreReport::default();
        let mut processors: Vec<ProcessorHandle> = Vec::with_capacity(self.processors.len());

        for record in &self.processors {
            let processor = self.restore_record(chain, record);
            if processor.is_missing() {
                report.missing.push(record.identity.clone());
            } else {
                report.restored += 1;
            }
            processors.push(processor);
        }

        chain.restore_processors(processors);
        tracing::info!(
            restored = report.restored,
            missing = report.missing.len(),
            "chain document restored"
        );
        Ok(report)
    }

    fn restore_record(&self, chain: &EffectProcessorChain, record: &ProcessorRecord) -> ProcessorHandle {
        let processor = match chain.create_processor(record.identity.as_str()) {
            Some(processor) => processor,
            None => {
                tracing::warn!(identity = %record.identity, "effect unavailable, keeping placeholder");
                chain.create_missing_processor(&record.identity, &record.display_name)
            }
        };

        if !record.display_name.is_empty() {
            processor.set_display_name(&record.display_name);
        }
        processor.set_bypassed(record.bypassed);
        processor.set_mix_level(record.mix_level);
        processor.set_ui_position(record.ui_position);

        match record.default_state_bytes() {
            Ok(bytes) if !bytes.is_empty() => processor.set_default_state_blob(&bytes),
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "ignoring default state"),
        }

        match record.last_state_bytes() {
            Ok(bytes) if !bytes.is_empty() => {
                processor.restore_from_state_blob(&bytes);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "last state unreadable, slot marked missing");
                processor.keep_undecoded_state(&record.last_state);
            }
        }

        processor
    }

    fn check_version(self) -> Result<Self, ConfigError> {
        if self.version > DOCUMENT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: DOCUMENT_VERSION,
            });
        }
        Ok(self)
    }

    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(text)?.check_version()
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(text)?.check_version()
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse `text` in the given format.
    pub fn parse(text: &str, format: DocumentFormat) -> Result<Self, ConfigError> {
        match format {
            DocumentFormat::Toml => Self::from_toml(text),
            DocumentFormat::Json => Self::from_json(text),
        }
    }

    /// Render in the given format.
    pub fn render(&self, format: DocumentFormat) -> Result<String, ConfigError> {
        match format {
            DocumentFormat::Toml => self.to_toml(),
            DocumentFormat::Json => self.to_json(),
        }
    }

    /// Load from a file, choosing the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::parse(&content, DocumentFormat::from_path(path))
    }

    /// Save to a file, choosing the format by extension and creating the
    /// parent directory if needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.render(DocumentFormat::from_path(path))?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), processors = self.len(), "chain document saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackfx_registry::EffectRegistry;
    use std::sync::Arc;

    fn chain() -> EffectProcessorChain {
        let chain = EffectProcessorChain::new(Arc::new(EffectRegistry::new()));
        chain.prepare(48000.0, 128);
        chain
    }

    #[test]
    fn test_blob_encoding() {
        assert_eq!(encode_blob(&[]), "");
        let text = encode_blob(b"abc");
        assert_eq!(decode_blob("x", &text).unwrap(), b"abc");
        assert!(decode_blob("x", "").unwrap().is_empty());
        assert!(matches!(
            decode_blob("x", "not base64!"),
            Err(ConfigError::Base64 { .. })
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.toml")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("a")), DocumentFormat::Toml);
    }

    #[test]
    fn test_capture_records_every_field() {
        let chain = chain();
        chain.append_new_effect("gain");
        chain.append_new_effect("delay");
        chain.set_bypass(1, true);
        chain.set_mix_level(0, 0.5);
        chain.set_effect_name(0, "Boost");
        chain
            .effect(0)
            .unwrap()
            .set_ui_position(UiPosition::new(10.0, 20.0));

        let doc = ChainDocument::capture(&chain);
        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert_eq!(doc.sample_rate, 48000.0);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.processors[0].identity, "gain");
        assert_eq!(doc.processors[0].display_name, "Boost");
        assert_eq!(doc.processors[0].mix_level, 0.5);
        assert_eq!(doc.processors[0].ui_position, UiPosition::new(10.0, 20.0));
        assert!(doc.processors[1].bypassed);
        assert!(!doc.processors[0].last_state.is_empty());
    }

    #[test]
    fn test_restore_rejects_invalid_without_touching_chain() {
        let chain = chain();
        chain.append_new_effect("gain");

        let mut doc = ChainDocument::new(48000.0);
        doc.processors.push(ProcessorRecord::new("", ""));
        assert!(matches!(
            doc.restore_into(&chain),
            Err(ConfigError::Validation(_))
        ));
        assert_eq!(chain.num_effects(), 1);
    }

    #[test]
    fn test_unknown_identity_becomes_missing() {
        let chain = chain();
        let mut doc = ChainDocument::new(48000.0);
        doc.processors.push(ProcessorRecord::new("gain", "Gain"));
        let mut fuzz = ProcessorRecord::new("vintage_fuzz", "Fuzz");
        fuzz.last_state = encode_blob(b"opaque state");
        doc.processors.push(fuzz);

        let report = doc.restore_into(&chain).unwrap();
        assert_eq!(report.restored, 1);
        assert_eq!(report.missing, vec!["vintage_fuzz".to_string()]);
        assert!(!report.is_complete());

        let slot = chain.effect(1).unwrap();
        assert!(slot.is_missing());
        assert_eq!(slot.state_blob(), b"opaque state");

        let again = ChainDocument::capture(&chain);
        assert_eq!(again.processors[1].last_state, doc.processors[1].last_state);
    }

    #[test]
    fn test_bad_base64_marks_only_that_slot_missing() {
        let chain = chain();
        let mut doc = ChainDocument::new(48000.0);
        let mut broken = ProcessorRecord::new("gain", "Gain");
        broken.last_state = "%%%".to_string();
        doc.processors.push(broken);
        doc.processors.push(ProcessorRecord::new("clipper", "Clipper"));

        let report = doc.restore_into(&chain).unwrap();
        assert_eq!(report.restored, 1);
        assert_eq!(report.missing, vec!["gain".to_string()]);
        assert!(chain.effect(0).unwrap().is_missing());
        assert!(!chain.effect(1).unwrap().is_missing());
    }

    #[test]
    fn test_bad_base64_saved_back_unchanged() {
        let chain = chain();
        let mut doc = ChainDocument::new(48000.0);
        let mut broken = ProcessorRecord::new("gain", "Gain");
        broken.last_state = "%%%".to_string();
        doc.processors.push(broken);
        doc.restore_into(&chain).unwrap();

        let again = ChainDocument::capture(&chain);
        assert_eq!(again.processors[0].last_state, "%%%");
        let reloaded = ChainDocument::from_toml(&again.to_toml().unwrap()).unwrap();
        assert_eq!(reloaded.processors[0].last_state, "%%%");
    }

    #[test]
    fn test_future_version_rejected() {
        let text = "version = 99\nsample_rate = 48000.0\n";
        assert!(matches!(
            ChainDocument::from_toml(text),
            Err(ConfigError::UnsupportedVersion { found: 99, supported: 1 })
        ));
        let json = r#"{"version": 2, "processors": []}"#;
        assert!(matches!(
            ChainDocument::from_json(json),
            Err(ConfigError::UnsupportedVersion { found: 2, .. })
        ));
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let doc = ChainDocument::from_toml("[[processors]]\nidentity = \"gain\"\n").unwrap();
        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert_eq!(doc.sample_rate, 48000.0);
        let record = &doc.processors[0];
        assert_eq!(record.mix_level, 1.0);
        assert!(!record.bypassed);
        assert!(record.last_state.is_empty());
    }
}
