//! Core Effect trait.
//!
//! The [`Effect`] trait is the unit interface hosted by the effect chain.
//! Every built-in unit implements it, providing a consistent interface for
//! per-frame and block-based processing on one or two channels.
//!
//! ## Design Decisions
//!
//! - **Frame processing**: `process` handles a mono frame and `process_stereo`
//!   a stereo frame. Shared per-frame state (smoothers, sample-and-hold
//!   counters) advances once per frame regardless of channel count.
//!
//! - **Object-safe**: The chain stores units as `Box<dyn EffectWithParams + Send>`.
//!
//! - **No allocations**: `process*`, `reset`, and `handle_event` are called on
//!   the audio thread. Allocation is only allowed in `prepare`.

use crate::event::EventKind;

/// Core trait for all audio units.
///
/// # Example
///
/// ```rust
/// use rackfx_core::Effect;
///
/// struct Halve;
///
/// impl Effect for Halve {
///     fn process(&mut self, input: f32) -> f32 {
///         input * 0.5
///     }
///
///     fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
///         (left * 0.5, right * 0.5)
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///
///     fn reset(&mut self) {}
/// }
///
/// let mut h = Halve;
/// let mut block = [1.0, -1.0];
/// h.process_block(&mut block);
/// assert_eq!(block, [0.5, -0.5]);
/// ```
pub trait Effect {
    /// Process one mono frame.
    fn process(&mut self, input: f32) -> f32;

    /// Process one stereo frame.
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Process a mono block in place.
    fn process_block(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process(*s);
        }
    }

    /// Process a stereo block in place.
    ///
    /// Only the common prefix of the two slices is processed.
    fn process_block_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process_stereo(*l, *r);
        }
    }

    /// Update the sample rate.
    ///
    /// Units recalculate sample-rate-dependent coefficients here.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Prepare for playback.
    ///
    /// The only place a unit may allocate. The default applies the sample
    /// rate and clears state.
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.set_sample_rate(sample_rate);
        self.reset();
    }

    /// Clear internal state (delay lines, filter history) without changing
    /// parameters.
    fn reset(&mut self);

    /// Processing latency in samples. Most units report 0.
    fn latency_samples(&self) -> usize {
        0
    }

    /// Channel count the unit processes natively (1 or 2).
    fn num_channels(&self) -> usize {
        2
    }

    /// React to a timed control event.
    ///
    /// Parameter changes are applied by the host before this is called; the
    /// default ignores everything else.
    fn handle_event(&mut self, _event: &EventKind) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        frames: usize,
        notes: usize,
    }

    impl Effect for Counter {
        fn process(&mut self, input: f32) -> f32 {
            self.frames += 1;
            input + 1.0
        }

        fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
            self.frames += 1;
            (left + 1.0, right - 1.0)
        }

        fn set_sample_rate(&mut self, _sample_rate: f32) {}

        fn reset(&mut self) {
            self.frames = 0;
        }

        fn handle_event(&mut self, event: &EventKind) {
            if matches!(event, EventKind::NoteOn { .. }) {
                self.notes += 1;
            }
        }
    }

    #[test]
    fn test_stereo_block_advances_once_per_frame() {
        let mut c = Counter { frames: 0, notes: 0 };
        let mut l = [0.0; 4];
        let mut r = [0.0; 4];
        c.process_block_stereo(&mut l, &mut r);
        assert_eq!(c.frames, 4);
        assert_eq!(l, [1.0; 4]);
        assert_eq!(r, [-1.0; 4]);
    }

    #[test]
    fn test_stereo_block_uses_common_prefix() {
        let mut c = Counter { frames: 0, notes: 0 };
        let mut l = [0.0; 4];
        let mut r = [0.0; 2];
        c.process_block_stereo(&mut l, &mut r);
        assert_eq!(c.frames, 2);
        assert_eq!(l, [1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_default_prepare_resets() {
        let mut c = Counter { frames: 0, notes: 0 };
        c.process(0.0);
        c.prepare(48000.0, 512);
        assert_eq!(c.frames, 0);
        assert_eq!(c.latency_samples(), 0);
        assert_eq!(c.num_channels(), 2);
    }

    #[test]
    fn test_handle_event_dispatch() {
        let mut c = Counter { frames: 0, notes: 0 };
        c.handle_event(&EventKind::NoteOn { note: 60, velocity: 1.0 });
        c.handle_event(&EventKind::NoteOff { note: 60 });
        assert_eq!(c.notes, 1);
    }
}
