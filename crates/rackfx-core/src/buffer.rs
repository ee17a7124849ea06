//! Planar audio buffer with a fixed allocation.
//!
//! [`AudioBuffer`] holds up to [`MAX_CHANNELS`] channels. Storage is sized by
//! [`resize`](AudioBuffer::resize) during preparation; afterwards the number of
//! active samples can change per block without touching the allocator.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::MAX_CHANNELS;

/// Planar buffer of up to [`MAX_CHANNELS`] channels.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    data: [Vec<f32>; MAX_CHANNELS],
    num_channels: usize,
    num_samples: usize,
}

impl AudioBuffer {
    /// Creates a zeroed buffer with `capacity` samples per channel, all of
    /// them active. `num_channels` is clamped to `1..=MAX_CHANNELS`.
    pub fn new(num_channels: usize, capacity: usize) -> Self {
        Self {
            data: [vec![0.0; capacity], vec![0.0; capacity]],
            num_channels: num_channels.clamp(1, MAX_CHANNELS),
            num_samples: capacity,
        }
    }

    /// Creates a buffer holding a copy of the given channel slices.
    ///
    /// Extra channels beyond [`MAX_CHANNELS`] are dropped; shorter channels
    /// are zero-padded to the longest one.
    pub fn from_channels(channels: &[&[f32]]) -> Self {
        let len = channels.iter().map(|c| c.len()).max().unwrap_or(0);
        let mut buf = Self::new(channels.len(), len);
        for (dst, src) in buf.data.iter_mut().zip(channels) {
            dst[..src.len()].copy_from_slice(src);
        }
        buf
    }

    /// Reallocates storage for `capacity` samples per channel and sets the
    /// channel count. Preparation only.
    pub fn resize(&mut self, num_channels: usize, capacity: usize) {
        for ch in &mut self.data {
            ch.clear();
            ch.resize(capacity, 0.0);
        }
        self.num_channels = num_channels.clamp(1, MAX_CHANNELS);
        self.num_samples = capacity;
        #[cfg(feature = "tracing")]
        tracing::debug!("buffer_resize: {} ch x {capacity}", self.num_channels);
    }

    /// Allocated samples per channel.
    pub fn capacity(&self) -> usize {
        self.data[0].len()
    }

    /// Active channel count.
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Active samples per channel.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Whether there are no active samples.
    pub fn is_empty(&self) -> bool {
        self.num_samples == 0
    }

    /// Sets the active sample count without allocating.
    ///
    /// Returns `false` (leaving the buffer unchanged) if `n` exceeds the
    /// capacity.
    pub fn set_num_samples(&mut self, n: usize) -> bool {
        if n > self.capacity() {
            return false;
        }
        self.num_samples = n;
        true
    }

    /// Sets the active channel count, clamped to `1..=MAX_CHANNELS`.
    pub fn set_num_channels(&mut self, n: usize) {
        self.num_channels = n.clamp(1, MAX_CHANNELS);
    }

    /// Active samples of channel `ch`. Empty for inactive channels.
    pub fn channel(&self, ch: usize) -> &[f32] {
        if ch < self.num_channels {
            &self.data[ch][..self.num_samples]
        } else {
            &[]
        }
    }

    /// Mutable active samples of channel `ch`. Empty for inactive channels.
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        if ch < self.num_channels {
            &mut self.data[ch][..self.num_samples]
        } else {
            &mut []
        }
    }

    /// Both channels at once. The right slice is empty for mono buffers.
    pub fn stereo_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        let n = self.num_samples;
        let stereo = self.num_channels > 1;
        let [left, right] = &mut self.data;
        let right: &mut [f32] = if stereo { &mut right[..n] } else { &mut [] };
        (&mut left[..n], right)
    }

    /// Copies the active region of `other` into this buffer, adopting its
    /// channel and sample counts.
    ///
    /// Returns `false` without copying when `other` has more active samples
    /// than this buffer can hold.
    pub fn copy_from(&mut self, other: &AudioBuffer) -> bool {
        let n = other.num_samples;
        if n > self.capacity() {
            return false;
        }
        self.num_samples = n;
        self.num_channels = other.num_channels;
        for ch in 0..self.num_channels {
            self.data[ch][..n].copy_from_slice(&other.data[ch][..n]);
        }
        true
    }

    /// Zeroes the active region.
    pub fn clear(&mut self) {
        let n = self.num_samples;
        for ch in 0..self.num_channels {
            self.data[ch][..n].fill(0.0);
        }
    }

    /// Whether every active sample is finite.
    pub fn all_finite(&self) -> bool {
        (0..self.num_channels).all(|ch| self.channel(ch).iter().all(|s| s.is_finite()))
    }

    /// Peak absolute value over the active region.
    pub fn peak(&self) -> f32 {
        (0..self.num_channels)
            .flat_map(|ch| self.channel(ch).iter())
            .fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(MAX_CHANNELS, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_num_samples_within_capacity() {
        let mut buf = AudioBuffer::new(2, 64);
        assert!(buf.set_num_samples(16));
        assert_eq!(buf.channel(0).len(), 16);
        assert!(!buf.set_num_samples(65));
        assert_eq!(buf.num_samples(), 16);
        assert_eq!(buf.capacity(), 64);
    }

    #[test]
    fn test_channel_count_clamped() {
        assert_eq!(AudioBuffer::new(0, 4).num_channels(), 1);
        assert_eq!(AudioBuffer::new(8, 4).num_channels(), 2);
        let mono = AudioBuffer::new(1, 4);
        assert!(mono.channel(1).is_empty());
    }

    #[test]
    fn test_from_channels_pads() {
        let buf = AudioBuffer::from_channels(&[&[1.0, 2.0, 3.0], &[4.0]]);
        assert_eq!(buf.num_samples(), 3);
        assert_eq!(buf.channel(1), &[4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_stereo_mut_mono() {
        let mut buf = AudioBuffer::new(1, 4);
        let (l, r) = buf.stereo_mut();
        assert_eq!(l.len(), 4);
        assert!(r.is_empty());
    }

    #[test]
    fn test_copy_from_respects_capacity() {
        let src = AudioBuffer::from_channels(&[&[0.5; 8], &[0.25; 8]]);
        let mut small = AudioBuffer::new(2, 4);
        assert!(!small.copy_from(&src));
        let mut big = AudioBuffer::new(2, 16);
        assert!(big.copy_from(&src));
        assert_eq!(big.num_samples(), 8);
        assert_eq!(big.channel(1), &[0.25; 8]);
    }

    #[test]
    fn test_all_finite_and_peak() {
        let mut buf = AudioBuffer::from_channels(&[&[0.1, -0.7], &[0.3, 0.2]]);
        assert!(buf.all_finite());
        assert!((buf.peak() - 0.7).abs() < 1e-7);
        buf.channel_mut(1)[0] = f32::NAN;
        assert!(!buf.all_finite());
        buf.clear();
        assert!(buf.all_finite());
        assert_eq!(buf.peak(), 0.0);
    }
}
