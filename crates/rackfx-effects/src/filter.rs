//! Filter units: the nonlinear ladder and the multi-shape biquad.
//!
//! Cutoff and resonance are smoothed exponentially and coefficients are only
//! recomputed while a smoother is still moving.

use rackfx_core::{
    BiquadFilter, BiquadKind, Effect, LadderFilter, LadderMode, ParamDescriptor, ParamId,
    ParameterSmoother, db_to_linear,
};

/// Four-pole ladder filter unit.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Cutoff | 20.0–20000.0 Hz | 1000.0 |
/// | 1 | Resonance | 0–100% | 0% |
/// | 2 | Drive | 0.0–24.0 dB | 0.0 |
/// | 3 | Mode | 0 = low-pass, 1 = high-pass | 0 |
///
/// Changing the mode clears the filter history on the next sample.
///
/// # Example
///
/// ```rust
/// use rackfx_effects::LadderFilterUnit;
/// use rackfx_core::Effect;
///
/// let mut f = LadderFilterUnit::new(48000.0);
/// f.set_cutoff_hz(400.0);
/// let y = f.process(0.3);
/// assert!(y.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct LadderFilterUnit {
    filter: LadderFilter,
    cutoff: ParameterSmoother,
    resonance: ParameterSmoother,
    drive_db: f32,
}

impl LadderFilterUnit {
    /// Low-pass at 1 kHz.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            filter: LadderFilter::new(sample_rate),
            cutoff: ParameterSmoother::slow(1000.0, sample_rate),
            resonance: ParameterSmoother::slow(0.0, sample_rate),
            drive_db: 0.0,
        }
    }

    /// Set the cutoff in Hz.
    pub fn set_cutoff_hz(&mut self, hz: f32) {
        self.cutoff.set_target(hz.clamp(20.0, 20000.0));
    }

    /// Set resonance, `0.0..=1.0`.
    pub fn set_resonance(&mut self, amount: f32) {
        self.resonance.set_target(amount.clamp(0.0, 1.0));
    }

    /// Set input drive in dB.
    pub fn set_drive_db(&mut self, db: f32) {
        self.drive_db = db.clamp(0.0, 24.0);
        self.filter.set_drive(db_to_linear(self.drive_db));
    }

    /// Switch between low-pass and high-pass.
    pub fn set_mode(&mut self, mode: LadderMode) {
        self.filter.set_mode(mode);
    }

    /// Current mode.
    pub fn mode(&self) -> LadderMode {
        self.filter.mode()
    }

    #[inline]
    fn advance_params(&mut self) {
        if !self.cutoff.is_settled() {
            let hz = self.cutoff.next_value();
            self.filter.set_cutoff(hz);
        }
        if !self.resonance.is_settled() {
            let r = self.resonance.next_value();
            self.filter.set_resonance(r);
        }
    }
}

impl Effect for LadderFilterUnit {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.advance_params();
        self.filter.process_sample(input, 0)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.advance_params();
        (
            self.filter.process_sample(left, 0),
            self.filter.process_sample(right, 1),
        )
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.filter.prepare(sample_rate);
        self.cutoff.set_sample_rate(sample_rate);
        self.resonance.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.cutoff.snap_to_target();
        self.resonance.snap_to_target();
        self.filter.set_cutoff(self.cutoff.current());
        self.filter.set_resonance(self.resonance.current());
        self.filter.reset();
    }
}

rackfx_core::impl_params! {
    LadderFilterUnit, this {
        [0] ParamDescriptor::frequency_hz("Cutoff", "Cutoff", 20.0, 20000.0, 1000.0)
                .with_id(ParamId(300), "ladder_cutoff"),
            get: this.cutoff.target(),
            set: |v| this.set_cutoff_hz(v);

        [1] ParamDescriptor::percent("Resonance", "Reso", 0.0)
                .with_id(ParamId(301), "ladder_reso"),
            get: this.resonance.target() * 100.0,
            set: |v| this.set_resonance(v / 100.0);

        [2] ParamDescriptor::gain_db("Drive", "Drive", 0.0, 24.0, 0.0)
                .with_id(ParamId(302), "ladder_drive"),
            get: this.drive_db,
            set: |v| this.set_drive_db(v);

        [3] ParamDescriptor::custom("Mode", "Mode", 0.0, 1.0, 0.0)
                .stepped()
                .with_id(ParamId(303), "ladder_mode"),
            get: this.filter.mode().index(),
            set: |v| this.set_mode(LadderMode::from_index(v));
    }
}

/// Multi-shape biquad filter unit.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Type | 0–7 (LP, HP, BP, Notch, AP, Peak, LoShelf, HiShelf) | 0 |
/// | 1 | Frequency | 20.0–20000.0 Hz | 1000.0 |
/// | 2 | Q | 0.1–10.0 | 0.707 |
/// | 3 | Gain | −24.0–24.0 dB | 0.0 |
#[derive(Debug, Clone)]
pub struct BiquadFilterUnit {
    filter: BiquadFilter,
    frequency: ParameterSmoother,
    q: f32,
    gain_db: ParameterSmoother,
    needs_update: bool,
}

impl BiquadFilterUnit {
    /// Low-pass at 1 kHz, Butterworth Q.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            filter: BiquadFilter::new(BiquadKind::LowPass, sample_rate),
            frequency: ParameterSmoother::slow(1000.0, sample_rate),
            q: core::f32::consts::FRAC_1_SQRT_2,
            gain_db: ParameterSmoother::standard(0.0, sample_rate),
            needs_update: false,
        }
    }

    /// Set the response shape.
    pub fn set_kind(&mut self, kind: BiquadKind) {
        self.filter.set_kind(kind);
    }

    /// Set the corner/centre frequency in Hz.
    pub fn set_frequency_hz(&mut self, hz: f32) {
        self.frequency.set_target(hz.clamp(20.0, 20000.0));
    }

    /// Set Q.
    pub fn set_q(&mut self, q: f32) {
        self.q = q.clamp(0.1, 10.0);
        self.needs_update = true;
    }

    /// Set gain in dB (peak and shelf shapes).
    pub fn set_gain_db(&mut self, db: f32) {
        self.gain_db.set_target(db.clamp(-24.0, 24.0));
    }

    /// Current shape.
    pub fn kind(&self) -> BiquadKind {
        self.filter.kind()
    }

    #[inline]
    fn advance_params(&mut self) {
        if !self.frequency.is_settled() || !self.gain_db.is_settled() || self.needs_update {
            let hz = self.frequency.next_value();
            let db = self.gain_db.next_value();
            self.filter.set_parameters(hz, self.q, db);
            self.needs_update = false;
        }
    }
}

impl Effect for BiquadFilterUnit {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.advance_params();
        self.filter.process_sample(input, 0)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.advance_params();
        (
            self.filter.process_sample(left, 0),
            self.filter.process_sample(right, 1),
        )
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.filter.prepare(sample_rate);
        self.frequency.set_sample_rate(sample_rate);
        self.gain_db.set_sample_rate(sample_rate);
        self.needs_update = true;
    }

    fn reset(&mut self) {
        self.frequency.snap_to_target();
        self.gain_db.snap_to_target();
        self.filter
            .set_parameters(self.frequency.current(), self.q, self.gain_db.current());
        self.needs_update = false;
        self.filter.reset();
    }
}

rackfx_core::impl_params! {
    BiquadFilterUnit, this {
        [0] ParamDescriptor::custom("Type", "Type", 0.0, 7.0, 0.0)
                .stepped()
                .with_id(ParamId(400), "filter_type"),
            get: this.filter.kind().index(),
            set: |v| this.set_kind(BiquadKind::from_index(v));

        [1] ParamDescriptor::frequency_hz("Frequency", "Freq", 20.0, 20000.0, 1000.0)
                .with_id(ParamId(401), "filter_freq"),
            get: this.frequency.target(),
            set: |v| this.set_frequency_hz(v);

        [2] ParamDescriptor::custom("Q", "Q", 0.1, 10.0, core::f32::consts::FRAC_1_SQRT_2)
                .with_id(ParamId(402), "filter_q"),
            get: this.q,
            set: |v| this.set_q(v);

        [3] ParamDescriptor::gain_db("Gain", "Gain", -24.0, 24.0, 0.0)
                .with_id(ParamId(403), "filter_gain"),
            get: this.gain_db.target(),
            set: |v| this.set_gain_db(v);
    }
}

/// Measured RMS gain in dB of `unit` for a sine at `freq`, used by tests.
#[cfg(test)]
pub(crate) fn sine_gain_db<E: Effect>(unit: &mut E, freq: f32, sample_rate: f32) -> f32 {
    let n = (sample_rate as usize) / 2;
    let mut sum_in = 0.0;
    let mut sum_out = 0.0;
    for i in 0..n {
        let x = 0.25 * libm::sinf(core::f32::consts::TAU * freq * i as f32 / sample_rate);
        let y = unit.process(x);
        if i >= n / 2 {
            sum_in += x * x;
            sum_out += y * y;
        }
    }
    rackfx_core::linear_to_db(libm::sqrtf(sum_out / sum_in))
}
