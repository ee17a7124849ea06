//! Offline render command.
//!
//! Feeds a sine tone through a saved chain block by block, the way an audio
//! callback would, and reports levels before and after.

use clap::Args;
use rackfx_chain::EffectProcessorChain;
use rackfx_core::{AudioBuffer, EventList};

use super::common::load_chain;

#[derive(Args)]
pub struct RenderArgs {
    /// Chain name or path
    chain: String,

    /// Tone frequency in Hz
    #[arg(long, default_value = "440")]
    freq: f32,

    /// Tone amplitude (linear)
    #[arg(long, default_value = "0.5")]
    amplitude: f32,

    /// Duration in seconds
    #[arg(short, long, default_value = "1.0")]
    duration: f32,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: usize,
}

/// Running peak and RMS over one channel pair.
#[derive(Debug, Default, Clone, Copy)]
pub struct Levels {
    peak: f32,
    sum_sq: f64,
    count: usize,
}

impl Levels {
    fn add(&mut self, buffer: &AudioBuffer) {
        self.peak = self.peak.max(buffer.peak());
        for ch in 0..buffer.num_channels() {
            for &s in buffer.channel(ch) {
                self.sum_sq += f64::from(s) * f64::from(s);
                self.count += 1;
            }
        }
    }

    /// Peak absolute sample.
    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// Root mean square.
    pub fn rms(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum_sq / self.count as f64).sqrt() as f32
        }
    }
}

/// Input and output levels of a render.
#[derive(Debug, Clone, Copy)]
pub struct RenderSummary {
    /// Levels of the tone before processing.
    pub input: Levels,
    /// Levels after the chain.
    pub output: Levels,
    /// Samples rendered per channel.
    pub samples: usize,
    /// Non-finite blocks the chain discarded.
    pub faults: u32,
}

/// Renders `total` samples of a sine tone through `chain`.
pub fn render_tone(
    chain: &EffectProcessorChain,
    freq: f32,
    amplitude: f32,
    total: usize,
    block_size: usize,
) -> RenderSummary {
    let block_size = block_size.max(1);
    let sample_rate = chain.sample_rate();
    let step = std::f32::consts::TAU * freq / sample_rate;
    let mut phase = 0.0_f32;

    let mut buffer = AudioBuffer::new(2, block_size);
    let events = EventList::new();
    let mut input = Levels::default();
    let mut output = Levels::default();

    let mut rendered = 0;
    while rendered < total {
        let n = block_size.min(total - rendered);
        buffer.set_num_samples(n);
        {
            let (left, right) = buffer.stereo_mut();
            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                let s = amplitude * phase.sin();
                *l = s;
                *r = s;
                phase = (phase + step) % std::f32::consts::TAU;
            }
        }
        input.add(&buffer);
        chain.process(&mut buffer, &events);
        output.add(&buffer);
        rendered += n;
    }

    RenderSummary {
        input,
        output,
        samples: total,
        faults: chain.take_fault_count(),
    }
}

fn db(linear: f32) -> String {
    if linear <= 0.0 {
        "-inf dB".to_string()
    } else {
        format!("{:.1} dB", 20.0 * linear.log10())
    }
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if args.duration <= 0.0 || !args.duration.is_finite() {
        anyhow::bail!("Duration must be positive, got {}", args.duration);
    }
    if args.block_size == 0 {
        anyhow::bail!("Block size must be at least 1");
    }

    let (chain, _, report) =
        load_chain(&args.chain, f64::from(args.sample_rate), args.block_size)?;
    let total = (args.duration * args.sample_rate as f32).round() as usize;

    tracing::info!(
        processors = chain.num_effects(),
        missing = report.missing.len(),
        samples = total,
        "rendering"
    );
    let summary = render_tone(&chain, args.freq, args.amplitude, total, args.block_size);

    println!("Rendered {} samples at {} Hz", summary.samples, args.sample_rate);
    println!("  Latency:     {} samples", chain.latency_samples());
    println!(
        "  Input:       peak {:.4} ({}), rms {:.4}",
        summary.input.peak(),
        db(summary.input.peak()),
        summary.input.rms()
    );
    println!(
        "  Output:      peak {:.4} ({}), rms {:.4}",
        summary.output.peak(),
        db(summary.output.peak()),
        summary.output.rms()
    );
    if summary.faults > 0 {
        println!("  Faults:      {}", summary.faults);
    }
    Ok(())
}
