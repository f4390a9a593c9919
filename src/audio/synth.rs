//! Procedural synthesizer front-end
//!
//! Fire-and-forget: every call schedules a voice on the mixer at an absolute
//! audio-clock time. With no output attached, or while suspended, calls do
//! nothing.

use super::event::{ScheduledEvent, Waveform};
use super::mixer::SharedMixer;

/// Starting gain of a hi-hat burst
pub const NOISE_VELOCITY: f32 = 0.05;

/// Schedules tones and noise bursts on the shared mixer
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    mixer: Option<SharedMixer>,
}

impl Synthesizer {
    pub fn new(mixer: Option<SharedMixer>) -> Self {
        Self { mixer }
    }

    /// Synth with no output; every call is a no-op
    pub fn disconnected() -> Self {
        Self { mixer: None }
    }

    pub fn is_connected(&self) -> bool {
        self.mixer.is_some()
    }

    /// Play a pitched tone starting at `start_time`, decaying exponentially
    /// from `volume` to silence by `start_time + duration`.
    pub fn play_tone(
        &self,
        frequency: f32,
        waveform: Waveform,
        duration: f64,
        start_time: f64,
        volume: f32,
    ) {
        self.dispatch(ScheduledEvent::tone(
            start_time, frequency, waveform, duration, volume,
        ));
    }

    /// Play a high-passed noise burst (hi-hat) starting at `start_time`
    pub fn play_noise_burst(&self, duration: f64, start_time: f64) {
        self.dispatch(ScheduledEvent::noise(start_time, duration, NOISE_VELOCITY));
    }

    /// Hand a prebuilt event to the mixer
    pub fn dispatch(&self, event: ScheduledEvent) {
        let Some(mixer) = &self.mixer else { return };
        let Ok(mut mixer) = mixer.lock() else { return };
        if mixer.is_suspended() {
            return;
        }
        mixer.schedule(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mixer::Mixer;

    fn live_mixer() -> SharedMixer {
        let mut mixer = Mixer::new(48_000, 1.0, 64);
        mixer.resume();
        mixer.shared()
    }

    #[test]
    fn test_disconnected_is_noop() {
        let synth = Synthesizer::disconnected();
        assert!(!synth.is_connected());
        synth.play_tone(440.0, Waveform::Square, 0.1, 0.0, 0.1);
        synth.play_noise_burst(0.05, 0.0);
    }

    #[test]
    fn test_suspended_is_noop() {
        let mixer = Mixer::new(48_000, 1.0, 64).shared();
        let synth = Synthesizer::new(Some(mixer.clone()));
        synth.play_noise_burst(0.05, 0.0);
        assert_eq!(mixer.lock().unwrap().pending_len(), 0);
    }

    #[test]
    fn test_tone_is_audible_then_silent() {
        let mixer = live_mixer();
        let synth = Synthesizer::new(Some(mixer.clone()));
        synth.play_tone(220.0, Waveform::Sawtooth, 0.1, 0.05, 0.4);

        let mut m = mixer.lock().unwrap();
        let mut buf = vec![0.0; 48_000 / 5];
        m.render(&mut buf, 1);

        // 0.05 s = frame 2400, ends at 0.15 s = frame 7200
        assert!(buf[..2400].iter().all(|&s| s == 0.0));
        assert!(buf[2400..7200].iter().any(|&s| s.abs() > 0.1));
        assert!(buf[7200..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_noise_burst_is_quiet_and_short() {
        let mixer = live_mixer();
        let synth = Synthesizer::new(Some(mixer.clone()));
        synth.play_noise_burst(0.05, 0.0);

        let mut m = mixer.lock().unwrap();
        let mut buf = vec![0.0; 4800];
        m.render(&mut buf, 1);
        assert!(buf[..2400].iter().any(|&s| s != 0.0));
        assert!(buf[2400..].iter().all(|&s| s == 0.0));
        // Filtered noise at 0.05 gain stays well below full scale
        assert!(buf.iter().all(|&s| s.abs() < 0.2));
    }
}
