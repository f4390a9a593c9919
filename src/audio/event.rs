//! Timestamped musical triggers passed from the sequencer to the mixer

use serde::{Deserialize, Serialize};

/// Oscillator shape for tonal voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Sample the waveform at a phase in [0, 1)
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * std::f32::consts::TAU).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

/// What a scheduled event sounds like
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Voice {
    /// Pitched oscillator
    Tone { frequency: f32, waveform: Waveform },
    /// High-passed white noise (hi-hat)
    Noise,
}

/// A musical trigger on the audio clock. Consumed exactly once by the mixer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Absolute audio-clock start time (seconds)
    pub time: f64,
    pub voice: Voice,
    /// Seconds until the voice is silent
    pub duration: f64,
    /// Peak gain
    pub velocity: f32,
}

impl ScheduledEvent {
    pub fn tone(time: f64, frequency: f32, waveform: Waveform, duration: f64, velocity: f32) -> Self {
        Self {
            time,
            voice: Voice::Tone {
                frequency,
                waveform,
            },
            duration,
            velocity,
        }
    }

    pub fn noise(time: f64, duration: f64, velocity: f32) -> Self {
        Self {
            time,
            voice: Voice::Noise,
            duration,
            velocity,
        }
    }

    /// Audio-clock time at which the voice has fully decayed
    #[inline]
    pub fn end_time(&self) -> f64 {
        self.time + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_ranges() {
        for wf in [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Sawtooth,
            Waveform::Triangle,
        ] {
            for i in 0..100 {
                let s = wf.sample(i as f32 / 100.0);
                assert!((-1.0..=1.0).contains(&s), "{wf:?} out of range: {s}");
            }
        }
        assert_eq!(Waveform::Square.sample(0.25), 1.0);
        assert_eq!(Waveform::Square.sample(0.75), -1.0);
        assert_eq!(Waveform::Triangle.sample(0.5), 1.0);
        assert_eq!(Waveform::Sawtooth.sample(0.0), -1.0);
    }

    #[test]
    fn test_end_time() {
        let e = ScheduledEvent::noise(1.5, 0.05, 0.05);
        assert!((e.end_time() - 1.55).abs() < 1e-12);
    }
}
