//! Fractional delay line for time-based units.
//!
//! [`FractionalDelay`] keeps one circular buffer per channel, allocated in
//! [`prepare`](FractionalDelay::prepare) and never resized on the audio
//! thread. Delay times may be fractional; the read is interpolated with the
//! configured [`Interpolation`]. Integer delays are exact regardless of the
//! interpolation mode.
//!
//! # Use Cases
//!
//! | Unit | Delay Range | Notes |
//! |------|-------------|-------|
//! | Sample delay | 0-48000 samples | Integer, reported as latency |
//! | Echo | 1-2000 ms | Feedback via [`tap`](FractionalDelay::tap) + [`push`](FractionalDelay::push) |

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::MAX_CHANNELS;

/// Interpolation method for fractional delay reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Truncate to the nearest older sample.
    None,
    /// Linear interpolation between two samples.
    #[default]
    Linear,
    /// 4-point cubic interpolation.
    Cubic,
}

/// Multi-channel circular delay line with fractional reads.
///
/// ```rust
/// use rackfx_core::FractionalDelay;
///
/// let mut d = FractionalDelay::new();
/// d.prepare(48000.0, 0.01);
/// d.set_delay_samples(2.0);
/// assert_eq!(d.process_sample(1.0, 0), 0.0);
/// assert_eq!(d.process_sample(0.0, 0), 0.0);
/// assert_eq!(d.process_sample(0.0, 0), 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FractionalDelay {
    buffers: [Vec<f32>; MAX_CHANNELS],
    write_pos: [usize; MAX_CHANNELS],
    delay_samples: f32,
    max_delay: f32,
    sample_rate: f32,
    interpolation: Interpolation,
}

impl FractionalDelay {
    /// Creates an unprepared delay. It passes audio through until prepared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates room for `max_seconds` of delay at `sample_rate` and clears
    /// state. The current delay time is clamped to the new maximum.
    pub fn prepare(&mut self, sample_rate: f32, max_seconds: f32) {
        let max_samples = libm::ceilf(sample_rate * max_seconds.max(0.0)) as usize;
        self.prepare_samples(sample_rate, max_samples);
    }

    /// Like [`prepare`](Self::prepare) with the maximum given in samples.
    pub fn prepare_samples(&mut self, sample_rate: f32, max_samples: usize) {
        // Headroom for the interpolation neighbours.
        let len = max_samples + 4;
        for buf in &mut self.buffers {
            *buf = vec![0.0; len];
        }
        self.write_pos = [0; MAX_CHANNELS];
        self.sample_rate = sample_rate;
        self.max_delay = max_samples as f32;
        self.delay_samples = self.delay_samples.clamp(0.0, self.max_delay);
        #[cfg(feature = "tracing")]
        tracing::debug!("delay_prepare: {max_samples} samples x {MAX_CHANNELS} channels");
    }

    /// Sets the delay in samples, clamped to `0 ..= max_delay_samples()`.
    pub fn set_delay_samples(&mut self, samples: f32) {
        self.delay_samples = if samples.is_finite() {
            samples.clamp(0.0, self.max_delay)
        } else {
            0.0
        };
    }

    /// Sets the delay in milliseconds at the prepared sample rate.
    pub fn set_delay_ms(&mut self, ms: f32) {
        self.set_delay_samples(ms * 0.001 * self.sample_rate);
    }

    /// Sets the interpolation method.
    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    /// Current delay in samples.
    pub fn delay_samples(&self) -> f32 {
        self.delay_samples
    }

    /// Largest delay the allocation supports.
    pub fn max_delay_samples(&self) -> f32 {
        self.max_delay
    }

    /// Whether [`prepare`](Self::prepare) has allocated storage.
    pub fn is_prepared(&self) -> bool {
        !self.buffers[0].is_empty()
    }

    /// Zeroes all channels.
    pub fn reset(&mut self) {
        for buf in &mut self.buffers {
            buf.fill(0.0);
        }
        self.write_pos = [0; MAX_CHANNELS];
    }

    /// Writes `input`, then reads it back delayed by the current delay time.
    ///
    /// A delay of 0 returns `input`. Unprepared lines and channels at or
    /// beyond [`MAX_CHANNELS`] pass through.
    #[inline]
    pub fn process_sample(&mut self, input: f32, channel: usize) -> f32 {
        if channel >= MAX_CHANNELS || !self.is_prepared() {
            return input;
        }
        self.push(input, channel);
        self.read_behind(channel, self.delay_samples)
    }

    /// Reads the sample `delay` samples before the next write, for feedback
    /// loops that read first and [`push`](Self::push) afterwards. `delay` is
    /// clamped to at least one sample.
    #[inline]
    pub fn tap(&self, channel: usize, delay: f32) -> f32 {
        if channel >= MAX_CHANNELS || !self.is_prepared() {
            return 0.0;
        }
        self.read_behind(channel, (delay - 1.0).clamp(0.0, self.max_delay))
    }

    /// Appends a sample to `channel`.
    #[inline]
    pub fn push(&mut self, input: f32, channel: usize) {
        let Some(buf) = self.buffers.get_mut(channel) else {
            return;
        };
        if buf.is_empty() {
            return;
        }
        let pos = self.write_pos[channel];
        buf[pos] = input;
        self.write_pos[channel] = (pos + 1) % buf.len();
    }

    /// Reads `offset` samples older than the most recent write.
    fn read_behind(&self, channel: usize, offset: f32) -> f32 {
        let buf = &self.buffers[channel];
        let len = buf.len();
        let whole = offset as usize;
        let frac = offset - whole as f32;
        let newest = (self.write_pos[channel] + len - 1) % len;
        let pos = (newest + len - whole % len) % len;

        if frac == 0.0 {
            return buf[pos];
        }
        match self.interpolation {
            Interpolation::None => buf[pos],
            Interpolation::Linear => {
                let a = buf[pos];
                let b = buf[(pos + len - 1) % len];
                a + (b - a) * frac
            }
            Interpolation::Cubic => {
                let y0 = buf[(pos + 1) % len];
                let y1 = buf[pos];
                let y2 = buf[(pos + len - 1) % len];
                let y3 = buf[(pos + len - 2) % len];

                let t = frac;
                let t2 = t * t;
                let t3 = t2 * t;

                let a0 = y3 - y2 - y0 + y1;
                let a1 = y0 - y1 - a0;
                let a2 = y2 - y0;

                a0 * t3 + a1 * t2 + a2 * t + y1
            }
        }
    }
}
