//! Ordered list of processors with real-time-safe processing and bounded
//! structural mutation.
//!
//! The processor list is published through an `ArcSwap`, so the audio thread
//! and lock-free setters always see a complete list. Structural edits build
//! the new list off to the side (including any factory work) and then take
//! the chain lock only long enough to swap it in. The audio thread holds the
//! same lock for the duration of a block, which gives the chain a single
//! observable state: idle, processing, or mutating.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, MutexGuard};
use rackfx_core::{AtomicF32, AudioBuffer, EventList, MAX_CHANNELS};
use rackfx_registry::{EffectFactory, canonical_identifier};

use crate::processor::{
    DEFAULT_MIX_RAMP_SECONDS, EffectProcessor, ProcessOutcome, ProcessorHandle,
};

/// What the chain is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChainState {
    /// Neither processing nor being edited.
    Idle = 0,
    /// The audio thread is inside `process`.
    Processing = 1,
    /// A structural edit or reload holds the chain lock.
    Mutating = 2,
}

impl ChainState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ChainState::Processing,
            2 => ChainState::Mutating,
            _ => ChainState::Idle,
        }
    }
}

/// Relative destinations for [`EffectProcessorChain::move_effect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePreset {
    /// To the front of the chain.
    First,
    /// One slot earlier.
    Previous,
    /// One slot later.
    Next,
    /// To the end of the chain.
    Last,
}

/// Destination of a move: an absolute index or a [`MovePreset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    /// Absolute index, clamped to the last slot.
    Index(usize),
    /// Relative destination.
    Preset(MovePreset),
}

impl From<usize> for MoveTarget {
    fn from(index: usize) -> Self {
        MoveTarget::Index(index)
    }
}

impl From<MovePreset> for MoveTarget {
    fn from(preset: MovePreset) -> Self {
        MoveTarget::Preset(preset)
    }
}

/// How to ask the factory for a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryKey {
    /// Position in the factory's catalogue.
    Index(usize),
    /// Unit identifier, matched case-insensitively.
    Identifier(String),
}

impl From<usize> for FactoryKey {
    fn from(index: usize) -> Self {
        FactoryKey::Index(index)
    }
}

impl From<&str> for FactoryKey {
    fn from(identifier: &str) -> Self {
        FactoryKey::Identifier(identifier.to_string())
    }
}

impl From<String> for FactoryKey {
    fn from(identifier: String) -> Self {
        FactoryKey::Identifier(identifier)
    }
}

impl fmt::Display for FactoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryKey::Index(i) => write!(f, "#{i}"),
            FactoryKey::Identifier(id) => f.write_str(id),
        }
    }
}

/// Tunables for an [`EffectProcessorChain`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainConfig {
    /// Dry/wet ramp length for every processor.
    pub mix_ramp_seconds: f32,
    /// Longest a reload waits for the chain lock.
    pub reload_timeout: Duration,
    /// Sample rate used for units created before the first `prepare`.
    pub default_sample_rate: f32,
    /// Block size used for units created before the first `prepare`.
    pub default_block_size: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            mix_ramp_seconds: DEFAULT_MIX_RAMP_SECONDS,
            reload_timeout: Duration::from_millis(50),
            default_sample_rate: 48000.0,
            default_block_size: 512,
        }
    }
}

/// State guarded by the chain lock.
struct ChainInner {
    /// Shared input copy handed to each processor in turn.
    checkpoint: AudioBuffer,
    prepared: bool,
}

/// Decrements the in-flight reload count on drop.
struct ReloadGuard<'a>(&'a AtomicUsize);

impl<'a> ReloadGuard<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self(count)
    }
}

impl Drop for ReloadGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// An ordered chain of [`EffectProcessor`]s.
///
/// Control-thread methods take `&self` and may be called while another
/// thread runs [`process`](Self::process). Structural edits are serialized
/// against each other and against processing; per-processor setters
/// (`set_bypass`, `set_mix_level`, `set_effect_name`) are lock-free.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rackfx_chain::{EffectProcessorChain, MovePreset};
/// use rackfx_core::{AudioBuffer, EventList};
/// use rackfx_registry::EffectRegistry;
///
/// let chain = EffectProcessorChain::new(Arc::new(EffectRegistry::new()));
/// chain.prepare(48000.0, 256);
/// chain.append_new_effect("gain").unwrap();
/// chain.append_new_effect("clipper").unwrap();
/// assert!(chain.move_effect(1, MovePreset::First));
///
/// let mut buffer = AudioBuffer::new(2, 256);
/// chain.process(&mut buffer, &EventList::new());
/// ```
pub struct EffectProcessorChain {
    factory: Arc<dyn EffectFactory>,
    config: ChainConfig,
    processors: ArcSwap<Vec<ProcessorHandle>>,
    inner: Mutex<ChainInner>,
    /// Serializes control-side edits so concurrent edits never lose each other.
    edit: Mutex<()>,
    state: AtomicU8,
    sample_rate: AtomicF32,
    max_block_size: AtomicUsize,
    latency: AtomicUsize,
    channels: AtomicUsize,
    whole_bypassed: AtomicBool,
    /// Raised by processors when bypass, latency or missing status changes.
    aggregates_dirty: Arc<AtomicBool>,
    /// Held while the cached totals are recomputed.
    aggregates: Mutex<()>,
    reloads_in_flight: AtomicUsize,
    faults: AtomicU32,
}

impl EffectProcessorChain {
    /// Empty chain drawing units from `factory`.
    pub fn new(factory: Arc<dyn EffectFactory>) -> Self {
        Self::with_config(factory, ChainConfig::default())
    }

    /// Empty chain with explicit tunables.
    pub fn with_config(factory: Arc<dyn EffectFactory>, config: ChainConfig) -> Self {
        Self {
            factory,
            processors: ArcSwap::from_pointee(Vec::new()),
            inner: Mutex::new(ChainInner {
                checkpoint: AudioBuffer::default(),
                prepared: false,
            }),
            edit: Mutex::new(()),
            state: AtomicU8::new(ChainState::Idle as u8),
            sample_rate: AtomicF32::new(config.default_sample_rate),
            max_block_size: AtomicUsize::new(config.default_block_size),
            latency: AtomicUsize::new(0),
            channels: AtomicUsize::new(0),
            whole_bypassed: AtomicBool::new(true),
            aggregates_dirty: Arc::new(AtomicBool::new(false)),
            aggregates: Mutex::new(()),
            reloads_in_flight: AtomicUsize::new(0),
            faults: AtomicU32::new(0),
            config,
        }
    }

    /// The factory new processors come from.
    pub fn factory(&self) -> &Arc<dyn EffectFactory> {
        &self.factory
    }

    /// Chain tunables.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn set_state(&self, state: ChainState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Current state.
    pub fn state(&self) -> ChainState {
        ChainState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Sample rate from the last `prepare`, or the configured default.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate.load(Ordering::Acquire)
    }

    /// Block size from the last `prepare`, or the configured default.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size.load(Ordering::Acquire)
    }

    // --- lifecycle ------------------------------------------------------

    /// Prepares every processor and sizes the chain's scratch buffer.
    ///
    /// This is the only call that allocates audio buffers. Call it before
    /// processing and again whenever the sample rate or block size changes.
    pub fn prepare(&self, sample_rate: f64, max_block_size: usize) {
        let _edit = self.edit.lock();
        #[allow(clippy::cast_possible_truncation)]
        let sr = sample_rate as f32;
        let processors = self.processors.load_full();
        {
            let mut inner = self.inner.lock();
            self.set_state(ChainState::Mutating);
            inner.checkpoint.resize(MAX_CHANNELS, max_block_size);
            inner.prepared = true;
            self.sample_rate.store(sr, Ordering::Release);
            self.max_block_size.store(max_block_size, Ordering::Release);
            for processor in processors.iter() {
                processor.prepare(sr, max_block_size);
            }
            self.recompute_aggregates();
            self.set_state(ChainState::Idle);
        }
        tracing::debug!(
            sample_rate,
            max_block_size,
            effects = processors.len(),
            "chain prepared"
        );
    }

    /// Processes `buffer` in place through every processable processor.
    ///
    /// Real-time safe: never allocates. Returns untouched audio when the
    /// whole chain is bypassed, a reload is in flight, the chain has not been
    /// prepared, or the block exceeds the prepared size.
    pub fn process(&self, buffer: &mut AudioBuffer, events: &EventList) {
        if self.reloads_in_flight.load(Ordering::Acquire) > 0 {
            return;
        }
        let mut inner = self.inner.lock();
        if self.whole_bypassed_for_block() {
            return;
        }
        if !inner.prepared || buffer.num_samples() > inner.checkpoint.capacity() {
            self.faults.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.set_state(ChainState::Processing);
        let processors = self.processors.load();
        for processor in processors.iter() {
            if !processor.can_be_processed() {
                continue;
            }
            if processor.process_with(buffer, events, &mut inner.checkpoint)
                == ProcessOutcome::Faulted
            {
                self.faults.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.set_state(ChainState::Idle);
    }

    /// Blocks that faulted since the last call: oversized blocks, an
    /// unprepared chain, or processors producing non-finite output.
    pub fn take_fault_count(&self) -> u32 {
        self.faults.swap(0, Ordering::AcqRel)
    }

    // --- structural edits ----------------------------------------------

    /// Builds the new list with `edit`, then swaps it in under the chain
    /// lock. `None` from `edit` leaves the chain untouched.
    fn mutate<T>(
        &self,
        action: &'static str,
        edit: impl FnOnce(&mut Vec<ProcessorHandle>) -> Option<T>,
    ) -> Option<T> {
        let _edit = self.edit.lock();
        let mut next: Vec<ProcessorHandle> = self.processors.load().iter().cloned().collect();
        let result = edit(&mut next)?;
        for processor in &next {
            processor.attach_observer(Arc::clone(&self.aggregates_dirty));
        }
        let len = next.len();
        let retired = {
            let _inner = self.inner.lock();
            self.set_state(ChainState::Mutating);
            let retired = self.processors.swap(Arc::new(next));
            self.recompute_aggregates();
            self.set_state(ChainState::Idle);
            retired
        };
        drop(retired);
        tracing::debug!(action, effects = len, "chain edited");
        Some(result)
    }

    /// Builds a prepared processor from the factory. Returns `None` when the
    /// factory cannot resolve `key`.
    pub fn create_processor(&self, key: impl Into<FactoryKey>) -> Option<ProcessorHandle> {
        let key = key.into();
        let sample_rate = self.sample_rate();
        let created = match &key {
            FactoryKey::Index(i) => self.factory.create_by_index(*i, sample_rate),
            FactoryKey::Identifier(id) => self.factory.create_by_identifier(id, sample_rate),
        };
        let Some((unit, descriptor)) = created else {
            tracing::warn!(key = %key, "factory could not create effect");
            return None;
        };
        let processor =
            EffectProcessor::new(unit, &descriptor).with_mix_ramp_seconds(self.config.mix_ramp_seconds);
        processor.prepare(sample_rate, self.max_block_size());
        Some(Arc::new(processor))
    }

    /// Builds a prepared placeholder for a unit the factory lacks.
    pub fn create_missing_processor(&self, identifier: &str, display_name: &str) -> ProcessorHandle {
        let processor = EffectProcessor::new_missing(identifier, display_name)
            .with_mix_ramp_seconds(self.config.mix_ramp_seconds);
        processor.prepare(self.sample_rate(), self.max_block_size());
        Arc::new(processor)
    }

    /// Appends a new unit. Returns its handle, or `None` when the factory
    /// cannot build it.
    pub fn append_new_effect(&self, key: impl Into<FactoryKey>) -> Option<ProcessorHandle> {
        let processor = self.create_processor(key)?;
        let added = Arc::clone(&processor);
        self.mutate("append", move |list| {
            list.push(added);
            Some(())
        })?;
        Some(processor)
    }

    /// Inserts a new unit before `index` (`index == len` appends). Returns
    /// `None` when `index` is past the end or the factory fails.
    pub fn insert_new_effect(
        &self,
        key: impl Into<FactoryKey>,
        index: usize,
    ) -> Option<ProcessorHandle> {
        if index > self.num_effects() {
            return None;
        }
        let processor = self.create_processor(key)?;
        let added = Arc::clone(&processor);
        self.mutate("insert", move |list| {
            if index > list.len() {
                return None;
            }
            list.insert(index, added);
            Some(())
        })?;
        Some(processor)
    }

    /// Replaces the processor at `index` with a new unit.
    pub fn replace_effect(&self, key: impl Into<FactoryKey>, index: usize) -> Option<ProcessorHandle> {
        if index >= self.num_effects() {
            return None;
        }
        let processor = self.create_processor(key)?;
        let added = Arc::clone(&processor);
        self.mutate("replace", move |list| {
            let slot = list.get_mut(index)?;
            *slot = added;
            Some(())
        })?;
        Some(processor)
    }

    /// Moves the processor at `from`. Returns `false` when `from` is out of
    /// range or the move would not change the order.
    pub fn move_effect(&self, from: usize, to: impl Into<MoveTarget>) -> bool {
        let to = to.into();
        self.mutate("move", |list| {
            let len = list.len();
            if from >= len {
                return None;
            }
            let dest = match to {
                MoveTarget::Index(i) => i.min(len - 1),
                MoveTarget::Preset(MovePreset::First) => 0,
                MoveTarget::Preset(MovePreset::Previous) => from.checked_sub(1)?,
                MoveTarget::Preset(MovePreset::Next) => (from + 1 < len).then_some(from + 1)?,
                MoveTarget::Preset(MovePreset::Last) => len - 1,
            };
            if dest == from {
                return None;
            }
            let processor = list.remove(from);
            list.insert(dest, processor);
            Some(())
        })
        .is_some()
    }

    /// Removes the processor at `index`.
    pub fn remove_effect(&self, index: usize) -> bool {
        self.mutate("remove", |list| {
            (index < list.len()).then(|| {
                list.remove(index);
            })
        })
        .is_some()
    }

    /// Removes every processor. Returns `false` when already empty.
    pub fn clear(&self) -> bool {
        self.mutate("clear", |list| {
            (!list.is_empty()).then(|| list.clear())
        })
        .is_some()
    }

    /// Replaces the whole list, e.g. when loading a saved chain.
    pub fn restore_processors(&self, processors: Vec<ProcessorHandle>) {
        self.mutate("restore", move |list| {
            *list = processors;
            Some(())
        });
    }

    // --- per-processor setters -----------------------------------------

    /// Renames the processor at `index`.
    pub fn set_effect_name(&self, index: usize, name: &str) -> bool {
        self.effect(index)
            .map(|p| p.set_display_name(name))
            .is_some()
    }

    /// Bypasses or re-enables the processor at `index`.
    pub fn set_bypass(&self, index: usize, bypassed: bool) -> bool {
        self.effect(index)
            .map(|p| p.set_bypassed(bypassed))
            .is_some()
    }

    /// Sets the dry/wet level of the processor at `index`.
    pub fn set_mix_level(&self, index: usize, level: f32) -> bool {
        self.effect(index)
            .map(|p| p.set_mix_level(level))
            .is_some()
    }

    /// Rebuilds the processor at `index` from its last state blob.
    ///
    /// Factory work happens before any lock is taken. Installing the new
    /// unit then waits at most [`ChainConfig::reload_timeout`] for the chain
    /// lock and gives up with `false` on timeout. While the reload is in
    /// flight `process` passes audio through untouched. A reload that is
    /// overtaken by a newer one on the same processor returns `false`.
    pub fn reload_from_state_if_valid(&self, index: usize) -> bool {
        let Some(processor) = self.effect(index) else {
            return false;
        };
        let _in_flight = ReloadGuard::enter(&self.reloads_in_flight);
        let generation = processor.begin_reload();
        let pending = match processor.build_reload(
            &*self.factory,
            self.sample_rate(),
            self.max_block_size(),
            generation,
        ) {
            Ok(pending) => pending,
            Err(err) => {
                tracing::warn!(index, error = %err, "reload rejected");
                return false;
            }
        };

        let Some(_inner) = self.inner.try_lock_for(self.config.reload_timeout) else {
            tracing::warn!(
                index,
                timeout = ?self.config.reload_timeout,
                "reload timed out waiting for the chain"
            );
            return false;
        };
        if self.index_of(&processor).is_none() {
            tracing::debug!(index, "reload target left the chain");
            return false;
        }
        self.set_state(ChainState::Mutating);
        let committed = processor.commit_reload(pending);
        self.recompute_aggregates();
        self.set_state(ChainState::Idle);
        committed
    }

    // --- queries --------------------------------------------------------

    /// Number of processors.
    pub fn num_effects(&self) -> usize {
        self.processors.load().len()
    }

    /// Whether the chain has no processors.
    pub fn is_empty(&self) -> bool {
        self.num_effects() == 0
    }

    /// Processor at `index`.
    pub fn effect(&self, index: usize) -> Option<ProcessorHandle> {
        self.processors.load().get(index).cloned()
    }

    /// Snapshot of the current order.
    pub fn effects(&self) -> Arc<Vec<ProcessorHandle>> {
        self.processors.load_full()
    }

    /// Position of `processor` in the chain.
    pub fn index_of(&self, processor: &ProcessorHandle) -> Option<usize> {
        self.processors
            .load()
            .iter()
            .position(|p| Arc::ptr_eq(p, processor))
    }

    /// First processor whose identifier matches, case-insensitively.
    pub fn find_by_identifier(&self, identifier: &str) -> Option<ProcessorHandle> {
        let identifier = canonical_identifier(identifier);
        self.processors
            .load()
            .iter()
            .find(|p| p.identifier() == identifier)
            .cloned()
    }

    /// Total latency of active processors, in samples.
    pub fn latency_samples(&self) -> usize {
        self.refresh_aggregates();
        self.latency.load(Ordering::Acquire)
    }

    /// Widest channel count any processor works on.
    pub fn num_channels(&self) -> usize {
        self.refresh_aggregates();
        self.channels.load(Ordering::Acquire)
    }

    /// Whether every processor is bypassed. An empty chain counts as
    /// bypassed.
    pub fn is_whole_chain_bypassed(&self) -> bool {
        self.refresh_aggregates();
        self.whole_bypassed.load(Ordering::Acquire)
    }

    /// Brings the cached totals up to date. Readers take the lock even when
    /// the flag is clear, since a pass in progress has already cleared it.
    fn refresh_aggregates(&self) {
        let guard = self.aggregates.lock();
        if self.aggregates_dirty.load(Ordering::Acquire) {
            self.recompute_locked(&guard);
        }
    }

    /// Whole-bypass flag as seen by the audio thread. Never waits: while a
    /// control thread holds the totals lock the flag is derived from the
    /// current snapshot instead of the cache.
    fn whole_bypassed_for_block(&self) -> bool {
        let Some(guard) = self.aggregates.try_lock() else {
            return self.processors.load().iter().all(|p| p.is_bypassed());
        };
        if self.aggregates_dirty.load(Ordering::Acquire) {
            self.recompute_locked(&guard);
        }
        self.whole_bypassed.load(Ordering::Acquire)
    }

    fn recompute_aggregates(&self) {
        let guard = self.aggregates.lock();
        self.recompute_locked(&guard);
    }

    /// The dirty flag is cleared before the processors are read, so a change
    /// racing with this pass leaves it raised for the next one. The guard
    /// keeps an older pass from storing after a newer one.
    fn recompute_locked(&self, _guard: &MutexGuard<'_, ()>) {
        self.aggregates_dirty.store(false, Ordering::Release);
        let processors = self.processors.load();
        let mut latency = 0;
        let mut channels = 0;
        let mut all_bypassed = true;
        for processor in processors.iter() {
            channels = channels.max(processor.num_channels());
            if processor.is_bypassed() {
                continue;
            }
            all_bypassed = false;
            if !processor.is_missing() {
                latency += processor.latency_samples();
            }
        }
        self.latency.store(latency, Ordering::Release);
        self.channels.store(channels, Ordering::Release);
        self.whole_bypassed.store(all_bypassed, Ordering::Release);
    }
}

impl fmt::Debug for EffectProcessorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectProcessorChain")
            .field("state", &self.state())
            .field("effects", &self.processors.load_full())
            .field("latency", &self.latency.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
