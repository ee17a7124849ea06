//! Time-based units: a feedback echo and a pure sample delay.

use libm::roundf;
use rackfx_core::{
    BiquadFilter, BiquadKind, Effect, FractionalDelay, ParamDescriptor, ParamId, ParamUnit,
    ParameterSmoother, flush_denormal, ms_to_samples, samples_to_ms,
};

/// Longest echo time in seconds.
const MAX_ECHO_SECONDS: f32 = 2.0;

/// Damping setting that leaves repeats unfiltered.
const MAX_DAMPING_HZ: f32 = 20000.0;

/// Feedback echo with a damped repeat path and optional ping-pong.
///
/// The output is the echoes only; the processor's mix control blends in the
/// dry signal.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Delay Time | 1.0–2000.0 ms | 300.0 |
/// | 1 | Feedback | 0–95% | 35% |
/// | 2 | Damping | 500.0–20000.0 Hz | 20000.0 (off) |
/// | 3 | Ping-Pong | 0 = off, 1 = on | 0 |
///
/// # Example
///
/// ```rust
/// use rackfx_effects::Delay;
/// use rackfx_core::Effect;
///
/// let mut delay = Delay::new(48000.0);
/// delay.set_delay_time_ms(10.0);
/// delay.reset();
/// let first = delay.process(1.0);
/// assert_eq!(first, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Delay {
    line: FractionalDelay,
    damping: BiquadFilter,
    delay_time: ParameterSmoother,
    feedback: ParameterSmoother,
    damping_hz: f32,
    ping_pong: bool,
    sample_rate: f32,
}

impl Delay {
    /// 300 ms echo with 35% feedback.
    pub fn new(sample_rate: f32) -> Self {
        let mut line = FractionalDelay::new();
        line.prepare(sample_rate, MAX_ECHO_SECONDS);
        let mut damping = BiquadFilter::new(BiquadKind::LowPass, sample_rate);
        damping.set_frequency(MAX_DAMPING_HZ);
        Self {
            line,
            damping,
            delay_time: ParameterSmoother::with_config(
                ms_to_samples(300.0, sample_rate),
                sample_rate,
                0.05,
            ),
            feedback: ParameterSmoother::standard(0.35, sample_rate),
            damping_hz: MAX_DAMPING_HZ,
            ping_pong: false,
            sample_rate,
        }
    }

    /// Set delay time in milliseconds (1–2000).
    pub fn set_delay_time_ms(&mut self, ms: f32) {
        let samples = ms_to_samples(ms.clamp(1.0, 2000.0), self.sample_rate);
        self.delay_time
            .set_target(samples.clamp(1.0, self.line.max_delay_samples()));
    }

    /// Delay time target in milliseconds.
    pub fn delay_time_ms(&self) -> f32 {
        samples_to_ms(self.delay_time.target(), self.sample_rate)
    }

    /// Set feedback, `0.0..=0.95`.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback.set_target(feedback.clamp(0.0, 0.95));
    }

    /// Set the low-pass corner in the repeat path.
    pub fn set_damping_hz(&mut self, hz: f32) {
        self.damping_hz = hz.clamp(500.0, MAX_DAMPING_HZ);
        self.damping.set_frequency(self.damping_hz);
    }

    /// Enable or disable ping-pong: each channel's repeats feed the other.
    pub fn set_ping_pong(&mut self, enabled: bool) {
        self.ping_pong = enabled;
    }

    /// Whether ping-pong is on.
    pub fn ping_pong(&self) -> bool {
        self.ping_pong
    }

    /// The repeat path low-pass; the top of the range disables it.
    #[inline]
    fn damp(&mut self, x: f32, channel: usize) -> f32 {
        if self.damping_hz >= MAX_DAMPING_HZ {
            x
        } else {
            self.damping.process_sample(x, channel)
        }
    }
}

impl Effect for Delay {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let d = self.delay_time.next_value();
        let fb = self.feedback.next_value();

        let delayed = self.line.tap(0, d);
        let repeat = self.damp(delayed, 0);
        self.line.push(flush_denormal(input + repeat * fb), 0);
        delayed
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let d = self.delay_time.next_value();
        let fb = self.feedback.next_value();

        let delayed_l = self.line.tap(0, d);
        let delayed_r = self.line.tap(1, d);
        let repeat_l = self.damp(delayed_l, 0);
        let repeat_r = self.damp(delayed_r, 1);

        let (back_l, back_r) = if self.ping_pong {
            (repeat_r, repeat_l)
        } else {
            (repeat_l, repeat_r)
        };
        self.line.push(flush_denormal(left + back_l * fb), 0);
        self.line.push(flush_denormal(right + back_r * fb), 1);

        (delayed_l, delayed_r)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        let ms = self.delay_time_ms();
        self.sample_rate = sample_rate;
        self.delay_time.set_sample_rate(sample_rate);
        self.feedback.set_sample_rate(sample_rate);
        self.damping.prepare(sample_rate);
        self.set_delay_time_ms(ms);
    }

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.line.prepare(sample_rate, MAX_ECHO_SECONDS);
        self.set_sample_rate(sample_rate);
        self.reset();
    }

    fn reset(&mut self) {
        self.line.reset();
        self.damping.reset();
        self.delay_time.snap_to_target();
        self.feedback.snap_to_target();
    }
}

rackfx_core::impl_params! {
    Delay, this {
        [0] ParamDescriptor::time_ms("Delay Time", "Time", 1.0, 2000.0, 300.0)
                .with_id(ParamId(500), "dly_time"),
            get: this.delay_time_ms(),
            set: |v| this.set_delay_time_ms(v);

        [1] ParamDescriptor::feedback()
                .with_id(ParamId(501), "dly_feedback"),
            get: this.feedback.target() * 100.0,
            set: |v| this.set_feedback(v / 100.0);

        [2] ParamDescriptor::frequency_hz("Damping", "Damp", 500.0, 20000.0, 20000.0)
                .with_id(ParamId(502), "dly_damping"),
            get: this.damping_hz,
            set: |v| this.set_damping_hz(v);

        [3] ParamDescriptor::custom("Ping-Pong", "PingPong", 0.0, 1.0, 0.0)
                .stepped()
                .with_id(ParamId(503), "dly_pingpong"),
            get: if this.ping_pong { 1.0 } else { 0.0 },
            set: |v| this.set_ping_pong(v >= 0.5);
    }
}

/// Largest latency a [`SampleDelay`] can introduce.
pub const MAX_SAMPLE_DELAY: usize = 48_000;

/// Whole-sample delay that reports its length as latency.
///
/// Used to line up parallel paths and to exercise latency reporting.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Samples | 0–48000 | 0 |
#[derive(Debug, Clone)]
pub struct SampleDelay {
    line: FractionalDelay,
    samples: usize,
}

impl SampleDelay {
    /// Zero-length delay.
    pub fn new(sample_rate: f32) -> Self {
        let mut line = FractionalDelay::new();
        line.prepare_samples(sample_rate, MAX_SAMPLE_DELAY);
        line.set_delay_samples(0.0);
        Self { line, samples: 0 }
    }

    /// Set the delay length in samples.
    pub fn set_samples(&mut self, samples: usize) {
        self.samples = samples.min(MAX_SAMPLE_DELAY);
        self.line.set_delay_samples(self.samples as f32);
    }

    /// Delay length in samples.
    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl Effect for SampleDelay {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.line.process_sample(input, 0)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (
            self.line.process_sample(left, 0),
            self.line.process_sample(right, 1),
        )
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.line.prepare_samples(sample_rate, MAX_SAMPLE_DELAY);
        self.line.set_delay_samples(self.samples as f32);
    }

    fn reset(&mut self) {
        self.line.reset();
    }

    fn latency_samples(&self) -> usize {
        self.samples
    }
}

rackfx_core::impl_params! {
    SampleDelay, this {
        [0] ParamDescriptor::custom("Samples", "Samples", 0.0, MAX_SAMPLE_DELAY as f32, 0.0)
                .stepped()
                .with_unit(ParamUnit::Samples)
                .with_id(ParamId(700), "sdly_samples"),
            get: this.samples as f32,
            set: |v| this.set_samples(roundf(v) as usize);
    }
}
