//! Sample-level voice rendering: oscillators, noise, envelopes, filtering

use std::f32::consts::PI;

use rand::Rng;
use rand_pcg::Pcg32;

use super::event::{ScheduledEvent, Voice, Waveform};

/// Gain every envelope decays toward
pub const ENVELOPE_FLOOR: f32 = 0.01;
/// Hi-hat high-pass cutoff
pub const NOISE_CUTOFF_HZ: f32 = 5000.0;

/// Volume ramp over the lifetime of a voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Envelope {
    /// `from * (to / from)^t`, as an exponential ramp on an audio param
    Exponential { from: f32, to: f32 },
    /// Straight line from `from` to `to`
    Linear { from: f32, to: f32 },
}

impl Envelope {
    /// Gain at normalized position `t` in [0, 1]
    #[inline]
    pub fn gain_at(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Envelope::Exponential { from, to } => {
                // Exponential ramps are undefined through zero
                let from = from.max(1e-4);
                let to = to.max(1e-4);
                from * (to / from).powf(t)
            }
            Envelope::Linear { from, to } => from + (to - from) * t,
        }
    }
}

/// Biquad high-pass filter (RBJ cookbook coefficients)
#[derive(Debug, Clone)]
pub struct HighPass {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl HighPass {
    pub fn new(cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        let w0 = 2.0 * PI * (cutoff_hz / sample_rate).min(0.49);
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;

        Self {
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            b0: ((1.0 + cos_w0) / 2.0) / a0,
            b1: -(1.0 + cos_w0) / a0,
            b2: ((1.0 + cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }
}

#[derive(Debug, Clone)]
enum Source {
    Oscillator {
        waveform: Waveform,
        phase: f32,
        increment: f32,
    },
    Noise {
        filter: HighPass,
    },
}

/// A voice currently sounding in the mixer
#[derive(Debug, Clone)]
pub struct ActiveVoice {
    source: Source,
    envelope: Envelope,
    /// Frames rendered since the scheduled start
    age: u64,
    /// Total frames until the voice stops
    length: u64,
}

impl ActiveVoice {
    /// Build the voice for an event. `late_frames` is how far past its start
    /// the event already is, so the envelope still ends on schedule.
    pub fn from_event(event: &ScheduledEvent, sample_rate: u32, late_frames: u64) -> Self {
        let sr = sample_rate as f32;
        let length = (event.duration * sample_rate as f64).round().max(1.0) as u64;

        let (source, envelope) = match event.voice {
            Voice::Tone {
                frequency,
                waveform,
            } => {
                let increment = frequency / sr;
                let phase = (increment * late_frames as f32).fract();
                (
                    Source::Oscillator {
                        waveform,
                        phase,
                        increment,
                    },
                    Envelope::Exponential {
                        from: event.velocity,
                        to: ENVELOPE_FLOOR,
                    },
                )
            }
            Voice::Noise => (
                Source::Noise {
                    filter: HighPass::new(NOISE_CUTOFF_HZ, std::f32::consts::FRAC_1_SQRT_2, sr),
                },
                Envelope::Linear {
                    from: event.velocity,
                    to: ENVELOPE_FLOOR,
                },
            ),
        };

        Self {
            source,
            envelope,
            age: late_frames,
            length,
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.age >= self.length
    }

    /// Render the next sample and advance
    #[inline]
    pub fn next_sample(&mut self, rng: &mut Pcg32) -> f32 {
        if self.is_finished() {
            return 0.0;
        }
        let t = self.age as f32 / self.length as f32;
        let gain = self.envelope.gain_at(t);

        let raw = match &mut self.source {
            Source::Oscillator {
                waveform,
                phase,
                increment,
            } => {
                let s = waveform.sample(*phase);
                *phase = (*phase + *increment).fract();
                s
            }
            Source::Noise { filter } => filter.process(rng.random_range(-1.0..1.0)),
        };

        self.age += 1;
        raw * gain
    }
}
