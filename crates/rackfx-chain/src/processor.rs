//! One slot of the chain: a unit plus bypass, dry/wet mix, identity and state.
//!
//! [`EffectProcessor`] is shared between the control thread and the audio
//! thread behind an `Arc`. Everything the control side touches while audio is
//! running is lock-free:
//!
//! - bypass, missing, latency and channel count are atomics
//! - the mix level is a [`SmootherTarget`] read by the audio-side smoother
//! - parameter values live in an `ArcSwap`-published store of atomics that
//!   the audio thread syncs into the unit at the start of each block
//!
//! The unit itself sits in a `parking_lot::Mutex`. The audio thread only ever
//! `try_lock`s it; a block that finds it busy is skipped rather than waited
//! for.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::{Mutex, RwLock};
use rackfx_core::{
    AtomicF32, AudioBuffer, EventKind, EventList, MAX_CHANNELS, ParamDescriptor, ParamId,
    ParameterSmoother, SmootherTarget, SmoothingStyle, wet_dry_mix,
};
use rackfx_registry::{BoxedEffect, EffectDescriptor, EffectFactory, canonical_identifier};
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::state::UnitState;

/// Shared ownership of a processor.
pub type ProcessorHandle = Arc<EffectProcessor>;

/// Non-owning reference to a processor. Upgrading fails once the processor
/// has been removed from its chain and every other handle is gone.
pub type ProcessorObserver = Weak<EffectProcessor>;

/// Dry/wet ramp length used when no other is configured.
pub const DEFAULT_MIX_RAMP_SECONDS: f32 = 0.020;

/// Sample rate assumed until `prepare` is called.
const FALLBACK_SAMPLE_RATE: f32 = 48000.0;

/// Block size assumed until `prepare` is called.
const FALLBACK_BLOCK_SIZE: usize = 512;

/// Position of a processor's editor or card in a host UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UiPosition {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

impl UiPosition {
    /// Position at `(x, y)`.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Result of one `process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Bypassed, missing, busy, or nothing to do. Buffer untouched.
    Skipped,
    /// The unit ran and its output was blended into the buffer.
    Processed,
    /// The unit produced non-finite output or the block did not fit. The
    /// buffer holds the processor's input.
    Faulted,
}

/// Parameter metadata and values, published as one snapshot.
struct ParamStore {
    descriptors: Vec<ParamDescriptor>,
    values: Vec<AtomicF32>,
}

impl ParamStore {
    fn empty() -> Self {
        Self {
            descriptors: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Reads descriptors and current values off a unit.
    fn capture(unit: &BoxedEffect) -> Self {
        let descriptors: Vec<ParamDescriptor> = (0..unit.effect_param_count())
            .map_while(|i| unit.effect_param_info(i))
            .collect();
        let values = (0..descriptors.len())
            .map(|i| AtomicF32::new(unit.effect_get_param(i)))
            .collect();
        Self {
            descriptors,
            values,
        }
    }

    fn index_of(&self, id: ParamId) -> Option<usize> {
        self.descriptors.iter().position(|d| d.id == id)
    }

    fn snapshot(&self) -> Vec<f32> {
        self.values
            .iter()
            .map(|v| v.load(Ordering::Acquire))
            .collect()
    }

    fn to_state(&self, identifier: &str) -> UnitState {
        let mut state = UnitState::new(identifier);
        for (desc, value) in self.descriptors.iter().zip(&self.values) {
            state.insert(desc.id, value.load(Ordering::Acquire));
        }
        state
    }

    /// Writes `state` into the store, falling back to defaults for ids the
    /// state does not mention.
    fn apply_state(&self, state: &UnitState) {
        for (desc, value) in self.descriptors.iter().zip(&self.values) {
            let v = state.get(desc.id).map_or(desc.default, |v| desc.clamp(v));
            value.store(v, Ordering::Release);
        }
    }
}

/// Audio-side state, guarded by the processor's core lock.
struct ProcessorCore {
    unit: Option<BoxedEffect>,
    mix: ParameterSmoother,
    /// Input copy used by the standalone `process` entry point.
    checkpoint: AudioBuffer,
    /// Parameter values last pushed into the unit.
    applied: Vec<f32>,
    sample_rate: f32,
    max_block_size: usize,
}

impl ProcessorCore {
    /// Pushes store values that differ from what the unit last saw.
    fn sync_params(&mut self, store: &ParamStore) {
        let Some(unit) = self.unit.as_mut() else {
            return;
        };
        for (i, (value, applied)) in store.values.iter().zip(self.applied.iter_mut()).enumerate()
        {
            let v = value.load(Ordering::Acquire);
            if v.to_bits() != applied.to_bits() {
                unit.effect_set_param(i, v);
                *applied = v;
            }
        }
    }

    /// Runs the unit over `buffer` and blends the result with the input.
    fn run(
        &mut self,
        buffer: &mut AudioBuffer,
        events: &EventList,
        store: &ParamStore,
        external: Option<&mut AudioBuffer>,
    ) -> ProcessOutcome {
        let checkpoint = match external {
            Some(buf) => buf,
            None => &mut self.checkpoint,
        };
        let Some(unit) = self.unit.as_mut() else {
            return ProcessOutcome::Skipped;
        };
        if !checkpoint.copy_from(buffer) {
            return ProcessOutcome::Faulted;
        }

        let n = buffer.num_samples();
        let mut start = 0;
        for event in events {
            let offset = event.sample_offset.min(n);
            render(unit, buffer, start, offset);
            start = start.max(offset);
            match event.kind {
                EventKind::ParamChange { param, value } => {
                    let Some(index) = store.index_of(param) else {
                        continue;
                    };
                    let value = store.descriptors[index].clamp(value);
                    unit.effect_set_param(index, value);
                    store.values[index].store(value, Ordering::Release);
                    if let Some(applied) = self.applied.get_mut(index) {
                        *applied = value;
                    }
                }
                ref other => unit.handle_event(other),
            }
        }
        render(unit, buffer, start, n);

        if !buffer.all_finite() {
            buffer.copy_from(checkpoint);
            unit.reset();
            return ProcessOutcome::Faulted;
        }

        blend(&mut self.mix, buffer, checkpoint);
        ProcessOutcome::Processed
    }
}

/// Processes `[start, end)` of `buffer` in place.
#[inline]
fn render(unit: &mut BoxedEffect, buffer: &mut AudioBuffer, start: usize, end: usize) {
    if start >= end {
        return;
    }
    let (left, right) = buffer.stereo_mut();
    if right.is_empty() {
        unit.process_block(&mut left[start..end]);
    } else {
        unit.process_block_stereo(&mut left[start..end], &mut right[start..end]);
    }
}

/// Crossfades `wet` towards `dry` by the smoothed mix level.
fn blend(mix: &mut ParameterSmoother, wet: &mut AudioBuffer, dry: &AudioBuffer) {
    if mix.is_settled() {
        let level = mix.current();
        if level >= 1.0 {
            return;
        }
        if level <= 0.0 {
            wet.copy_from(dry);
            return;
        }
    }
    let channels = wet.num_channels();
    for i in 0..wet.num_samples() {
        let level = mix.next_value();
        for ch in 0..channels {
            let d = dry.channel(ch)[i];
            let w = &mut wet.channel_mut(ch)[i];
            *w = wet_dry_mix(d, *w, level);
        }
    }
}

/// A unit staged for installation by [`EffectProcessor::commit_reload`].
pub(crate) struct PendingReload {
    unit: BoxedEffect,
    store: ParamStore,
    generation: u64,
}

/// A unit wrapped with bypass, mix, identity, and persistent state.
///
/// # Example
///
/// ```rust
/// use rackfx_chain::EffectProcessor;
/// use rackfx_core::AudioBuffer;
/// use rackfx_registry::{EffectFactory, EffectRegistry};
///
/// let registry = EffectRegistry::new();
/// let (unit, descriptor) = registry.create_by_identifier("gain", 48000.0).unwrap();
/// let processor = EffectProcessor::new(unit, &descriptor);
/// processor.prepare(48000.0, 64);
///
/// processor.set_bypassed(true);
/// let mut buffer = AudioBuffer::from_channels(&[&[0.5; 64], &[0.5; 64]]);
/// processor.process(&mut buffer, &Default::default());
/// assert_eq!(buffer.channel(0)[0], 0.5);
/// ```
pub struct EffectProcessor {
    identifier: String,
    display_name: RwLock<String>,
    ui_position: RwLock<UiPosition>,
    bypassed: AtomicBool,
    /// Set when bypass engages; the next processed block starts from a reset.
    resume_pending: AtomicBool,
    mix: SmootherTarget,
    mix_ramp_seconds: f32,
    missing: AtomicBool,
    latency: AtomicUsize,
    channels: AtomicUsize,
    params: ArcSwap<ParamStore>,
    params_dirty: AtomicBool,
    core: Mutex<ProcessorCore>,
    default_state: RwLock<Vec<u8>>,
    last_state: RwLock<Vec<u8>>,
    /// `last_state` holds saved text that never decoded to bytes.
    undecoded_state: AtomicBool,
    reload_generation: AtomicU64,
    /// Raised whenever bypass, latency, or missing status changes.
    observer: ArcSwapOption<AtomicBool>,
}

impl EffectProcessor {
    /// Wraps a freshly created unit. Its current parameters become the
    /// default state.
    pub fn new(unit: BoxedEffect, descriptor: &EffectDescriptor) -> Self {
        let identifier = canonical_identifier(descriptor.id);
        let store = ParamStore::capture(&unit);
        let default_state = store.to_state(&identifier).encode();
        let applied = store.snapshot();
        let latency = unit.latency_samples();
        let channels = unit.num_channels();
        Self::build(
            identifier,
            descriptor.name.to_string(),
            Some(unit),
            store,
            applied,
            default_state,
            latency,
            channels,
        )
    }

    /// A placeholder for a unit the factory could not build. It keeps its
    /// identity and any state assigned to it, and never processes audio.
    pub fn new_missing(identifier: &str, display_name: &str) -> Self {
        let processor = Self::build(
            canonical_identifier(identifier),
            display_name.to_string(),
            None,
            ParamStore::empty(),
            Vec::new(),
            Vec::new(),
            0,
            0,
        );
        processor.missing.store(true, Ordering::Release);
        processor
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        identifier: String,
        display_name: String,
        unit: Option<BoxedEffect>,
        store: ParamStore,
        applied: Vec<f32>,
        default_state: Vec<u8>,
        latency: usize,
        channels: usize,
    ) -> Self {
        let mix = SmootherTarget::new(1.0);
        let mut smoother = ParameterSmoother::with_shared_target(mix.clone(), SmoothingStyle::Linear);
        smoother.reset(FALLBACK_SAMPLE_RATE, DEFAULT_MIX_RAMP_SECONDS);
        Self {
            identifier,
            display_name: RwLock::new(display_name),
            ui_position: RwLock::new(UiPosition::default()),
            bypassed: AtomicBool::new(false),
            resume_pending: AtomicBool::new(false),
            mix,
            mix_ramp_seconds: DEFAULT_MIX_RAMP_SECONDS,
            missing: AtomicBool::new(false),
            latency: AtomicUsize::new(latency),
            channels: AtomicUsize::new(channels),
            params: ArcSwap::from_pointee(store),
            params_dirty: AtomicBool::new(false),
            core: Mutex::new(ProcessorCore {
                unit,
                mix: smoother,
                checkpoint: AudioBuffer::default(),
                applied,
                sample_rate: FALLBACK_SAMPLE_RATE,
                max_block_size: FALLBACK_BLOCK_SIZE,
            }),
            last_state: RwLock::new(default_state.clone()),
            undecoded_state: AtomicBool::new(false),
            default_state: RwLock::new(default_state),
            reload_generation: AtomicU64::new(0),
            observer: ArcSwapOption::empty(),
        }
    }

    /// Sets the dry/wet ramp length applied at the next `prepare`.
    #[must_use]
    pub fn with_mix_ramp_seconds(mut self, seconds: f32) -> Self {
        self.mix_ramp_seconds = seconds.max(0.0);
        self
    }

    /// Non-owning handle to `this`.
    pub fn downgrade(this: &ProcessorHandle) -> ProcessorObserver {
        Arc::downgrade(this)
    }

    pub(crate) fn attach_observer(&self, flag: Arc<AtomicBool>) {
        self.observer.store(Some(flag));
    }

    fn notify(&self) {
        if let Some(flag) = &*self.observer.load() {
            flag.store(true, Ordering::Release);
        }
    }

    // --- identity -------------------------------------------------------

    /// Canonical factory identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Name shown to users.
    pub fn display_name(&self) -> String {
        self.display_name.read().clone()
    }

    /// Renames the processor.
    pub fn set_display_name(&self, name: &str) {
        *self.display_name.write() = name.to_string();
    }

    /// Last stored UI position.
    pub fn ui_position(&self) -> UiPosition {
        *self.ui_position.read()
    }

    /// Stores a UI position. The chain never reads it.
    pub fn set_ui_position(&self, position: UiPosition) {
        *self.ui_position.write() = position;
    }

    // --- bypass and mix -------------------------------------------------

    /// Whether the processor is bypassed.
    pub fn is_bypassed(&self) -> bool {
        self.bypassed.load(Ordering::Acquire)
    }

    /// Bypasses or re-enables the processor. Safe from any thread.
    ///
    /// Re-enabling resets the unit and jumps the mix to its target on the
    /// next processed block, so stale tails are never heard.
    pub fn set_bypassed(&self, bypassed: bool) {
        let was = self.bypassed.swap(bypassed, Ordering::AcqRel);
        if was != bypassed {
            if bypassed {
                self.resume_pending.store(true, Ordering::Release);
            }
            self.notify();
        }
    }

    /// Target dry/wet level in `[0, 1]`.
    pub fn mix_level(&self) -> f32 {
        self.mix.get()
    }

    /// Sets the dry/wet level. Clamped to `[0, 1]`; non-finite values are
    /// ignored. The audible level ramps linearly to the new value.
    pub fn set_mix_level(&self, level: f32) {
        if level.is_finite() {
            self.mix.set(level.clamp(0.0, 1.0));
        }
    }

    // --- status ---------------------------------------------------------

    /// Whether the unit could not be built or its state could not be
    /// restored.
    pub fn is_missing(&self) -> bool {
        self.missing.load(Ordering::Acquire)
    }

    fn set_missing(&self, missing: bool) {
        if self.missing.swap(missing, Ordering::AcqRel) != missing {
            self.notify();
        }
    }

    /// Neither bypassed nor missing.
    pub fn can_be_processed(&self) -> bool {
        !self.is_bypassed() && !self.is_missing()
    }

    /// Latency the unit reports, in samples.
    pub fn latency_samples(&self) -> usize {
        self.latency.load(Ordering::Acquire)
    }

    /// Channels the unit works on. Zero for missing processors.
    pub fn num_channels(&self) -> usize {
        self.channels.load(Ordering::Acquire)
    }

    /// Copies latency and channel count out of the unit, notifying the
    /// observer when the latency moved.
    fn publish_unit_info(&self, core: &ProcessorCore) {
        let Some(unit) = core.unit.as_ref() else {
            return;
        };
        self.channels.store(unit.num_channels(), Ordering::Release);
        let latency = unit.latency_samples();
        if self.latency.swap(latency, Ordering::AcqRel) != latency {
            self.notify();
        }
    }

    /// Drains pending parameter writes into the unit.
    fn apply_pending(&self, core: &mut ProcessorCore) {
        if self.params_dirty.swap(false, Ordering::AcqRel) {
            core.sync_params(&self.params.load());
            self.publish_unit_info(core);
        }
    }

    // --- parameters -----------------------------------------------------

    /// Number of parameters. Zero for missing processors.
    pub fn parameter_count(&self) -> usize {
        self.params.load().descriptors.len()
    }

    /// Descriptor of parameter `index`.
    pub fn parameter_descriptor(&self, index: usize) -> Option<ParamDescriptor> {
        self.params.load().descriptors.get(index).copied()
    }

    /// Index of the parameter with stable id `id`.
    pub fn parameter_index_by_id(&self, id: ParamId) -> Option<usize> {
        self.params.load().index_of(id)
    }

    /// Current plain value of parameter `index`.
    pub fn parameter(&self, index: usize) -> Option<f32> {
        self.params
            .load()
            .values
            .get(index)
            .map(|v| v.load(Ordering::Acquire))
    }

    /// Sets parameter `index`, clamped to its range. Returns `false` when the
    /// index is out of range.
    ///
    /// The value reaches the unit immediately if the audio thread is idle,
    /// otherwise at the start of its next block.
    pub fn set_parameter(&self, index: usize, value: f32) -> bool {
        {
            let store = self.params.load();
            let (Some(desc), Some(slot)) = (store.descriptors.get(index), store.values.get(index))
            else {
                return false;
            };
            slot.store(desc.clamp(value), Ordering::Release);
        }
        self.params_dirty.store(true, Ordering::Release);
        if let Some(mut core) = self.core.try_lock() {
            self.apply_pending(&mut core);
        }
        true
    }

    /// Current value of parameter `index` formatted with its unit.
    pub fn format_parameter(&self, index: usize) -> Option<String> {
        let store = self.params.load();
        let desc = store.descriptors.get(index)?;
        let value = store.values.get(index)?.load(Ordering::Acquire);
        Some(desc.format_value(value))
    }

    // --- lifecycle ------------------------------------------------------

    /// Configures the unit, the mix ramp, and the internal scratch buffer
    /// for `sample_rate` and blocks of up to `max_block_size` samples.
    ///
    /// Allocates. Never call from the audio thread.
    pub fn prepare(&self, sample_rate: f32, max_block_size: usize) {
        let mut core = self.core.lock();
        core.sample_rate = sample_rate;
        core.max_block_size = max_block_size;
        core.checkpoint.resize(MAX_CHANNELS, max_block_size);
        self.params_dirty.store(false, Ordering::Release);
        core.sync_params(&self.params.load());
        if let Some(unit) = core.unit.as_mut() {
            unit.prepare(sample_rate, max_block_size);
        }
        core.mix.reset(sample_rate, self.mix_ramp_seconds);
        self.resume_pending.store(false, Ordering::Release);
        self.publish_unit_info(&core);
    }

    /// Clears the unit's internal state. Blocks until the audio thread
    /// releases the unit.
    pub fn reset(&self) {
        let mut core = self.core.lock();
        if let Some(unit) = core.unit.as_mut() {
            unit.reset();
        }
        core.mix.snap_to_target();
    }

    /// Processes `buffer` in place using the processor's own scratch buffer.
    ///
    /// A no-op when bypassed or missing.
    pub fn process(&self, buffer: &mut AudioBuffer, events: &EventList) -> ProcessOutcome {
        self.process_inner(buffer, events, None)
    }

    /// Processes `buffer` in place, copying the input into `checkpoint`
    /// first. The chain passes one shared checkpoint to every processor.
    pub fn process_with(
        &self,
        buffer: &mut AudioBuffer,
        events: &EventList,
        checkpoint: &mut AudioBuffer,
    ) -> ProcessOutcome {
        self.process_inner(buffer, events, Some(checkpoint))
    }

    fn process_inner(
        &self,
        buffer: &mut AudioBuffer,
        events: &EventList,
        checkpoint: Option<&mut AudioBuffer>,
    ) -> ProcessOutcome {
        if !self.can_be_processed() || buffer.is_empty() {
            return ProcessOutcome::Skipped;
        }
        let Some(mut core) = self.core.try_lock() else {
            return ProcessOutcome::Skipped;
        };
        self.apply_pending(&mut core);
        if self.resume_pending.swap(false, Ordering::AcqRel) {
            if let Some(unit) = core.unit.as_mut() {
                unit.reset();
            }
            core.mix.snap_to_target();
        }
        let store = self.params.load();
        core.run(buffer, events, &store, checkpoint)
    }

    // --- state ----------------------------------------------------------

    /// Opaque blob capturing the unit's parameters.
    ///
    /// Missing processors return the last blob assigned to them, so state
    /// survives a round trip through a host that lacks the unit.
    pub fn state_blob(&self) -> Vec<u8> {
        if self.is_missing() {
            return self.last_state.read().clone();
        }
        self.params.load().to_state(&self.identifier).encode()
    }

    /// Restores parameters from a blob produced by [`state_blob`](Self::state_blob).
    ///
    /// On failure the processor is marked missing and the blob is kept as
    /// its last state.
    pub fn restore_from_state_blob(&self, bytes: &[u8]) -> bool {
        match self.try_restore(bytes) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    processor = %self.identifier,
                    error = %err,
                    "state restore failed, processor marked missing"
                );
                *self.last_state.write() = bytes.to_vec();
                self.undecoded_state.store(false, Ordering::Release);
                self.set_missing(true);
                false
            }
        }
    }

    /// Marks the processor missing and keeps `text` verbatim as its last
    /// state, for saved state that could not be decoded into a blob at all.
    pub fn keep_undecoded_state(&self, text: &str) {
        tracing::warn!(
            processor = %self.identifier,
            "saved state undecodable, processor marked missing"
        );
        *self.last_state.write() = text.as_bytes().to_vec();
        self.undecoded_state.store(true, Ordering::Release);
        self.set_missing(true);
    }

    /// Whether [`state_blob`](Self::state_blob) returns text kept by
    /// [`keep_undecoded_state`](Self::keep_undecoded_state).
    pub fn has_undecoded_state(&self) -> bool {
        self.is_missing() && self.undecoded_state.load(Ordering::Acquire)
    }

    fn try_restore(&self, bytes: &[u8]) -> Result<(), StateError> {
        let state = UnitState::decode_for(bytes, &self.identifier)?;
        let mut core = self.core.lock();
        if core.unit.is_none() {
            return Err(StateError::Unresolved(self.identifier.clone()));
        }
        let store = self.params.load();
        store.apply_state(&state);
        self.params_dirty.store(false, Ordering::Release);
        core.sync_params(&store);
        self.publish_unit_info(&core);
        drop(core);

        *self.last_state.write() = bytes.to_vec();
        self.undecoded_state.store(false, Ordering::Release);
        self.set_missing(false);
        Ok(())
    }

    /// Blob describing the unit as it was created.
    pub fn default_state_blob(&self) -> Vec<u8> {
        self.default_state.read().clone()
    }

    /// Replaces the default blob, e.g. when loading a saved chain.
    pub fn set_default_state_blob(&self, bytes: &[u8]) {
        *self.default_state.write() = bytes.to_vec();
    }

    /// Blob most recently restored or assigned.
    pub fn last_state_blob(&self) -> Vec<u8> {
        self.last_state.read().clone()
    }

    /// Rebuilds the unit from the factory and restores the last state blob.
    ///
    /// Returns `false` when the blob is invalid, the factory cannot build
    /// the unit, or a newer reload was started in the meantime.
    pub fn reload_from_state_if_valid(&self, factory: &dyn EffectFactory) -> bool {
        let generation = self.begin_reload();
        let (sample_rate, max_block_size) = {
            let core = self.core.lock();
            (core.sample_rate, core.max_block_size)
        };
        match self.build_reload(factory, sample_rate, max_block_size, generation) {
            Ok(pending) => self.commit_reload(pending),
            Err(err) => {
                tracing::warn!(processor = %self.identifier, error = %err, "reload failed");
                false
            }
        }
    }

    /// Starts a reload and returns its generation. Any reload started
    /// earlier can no longer commit.
    pub(crate) fn begin_reload(&self) -> u64 {
        self.reload_generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Builds and prepares a replacement unit without touching the live one.
    pub(crate) fn build_reload(
        &self,
        factory: &dyn EffectFactory,
        sample_rate: f32,
        max_block_size: usize,
        generation: u64,
    ) -> Result<PendingReload, StateError> {
        let blob = self.last_state_blob();
        let state = UnitState::decode_for(&blob, &self.identifier)?;
        let (mut unit, _) = factory
            .create_by_identifier(&self.identifier, sample_rate)
            .ok_or_else(|| StateError::Unresolved(self.identifier.clone()))?;

        let store = ParamStore::capture(&unit);
        store.apply_state(&state);
        for (i, value) in store.snapshot().into_iter().enumerate() {
            unit.effect_set_param(i, value);
        }
        unit.prepare(sample_rate, max_block_size);
        Ok(PendingReload {
            unit,
            store,
            generation,
        })
    }

    /// Installs a staged unit unless a newer reload has started.
    pub(crate) fn commit_reload(&self, pending: PendingReload) -> bool {
        if self.reload_generation.load(Ordering::Acquire) != pending.generation {
            tracing::debug!(processor = %self.identifier, "reload superseded");
            return false;
        }
        let PendingReload { unit, store, .. } = pending;
        let applied = store.snapshot();
        let retired = {
            let mut core = self.core.lock();
            let retired = core.unit.replace(unit);
            core.applied = applied;
            core.mix.snap_to_target();
            self.params.store(Arc::new(store));
            self.params_dirty.store(false, Ordering::Release);
            self.publish_unit_info(&core);
            retired
        };
        drop(retired);
        self.set_missing(false);
        true
    }
}

impl fmt::Debug for EffectProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectProcessor")
            .field("identifier", &self.identifier)
            .field("display_name", &*self.display_name.read())
            .field("bypassed", &self.is_bypassed())
            .field("mix", &self.mix_level())
            .field("missing", &self.is_missing())
            .field("latency", &self.latency_samples())
            .finish_non_exhaustive()
    }
}
