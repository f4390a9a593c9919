//! Lookahead step sequencer
//!
//! Pure state machine: given the current audio-clock time it returns every
//! event whose start falls inside `[now, now + ahead)`. Event times come from
//! `next_event_time`, which only ever advances by whole steps from its own
//! previous value, so a late or jittery caller changes *when* decisions are
//! made but never *where* the notes land.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::event::{ScheduledEvent, Waveform};
use crate::settings::AudioSettings;
use crate::subdivision_secs;

/// Sequencer timing state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SequencerState {
    /// Audio-clock time of the next step (seconds)
    pub next_event_time: f64,
    /// Steps taken since start
    pub beat_count: u64,
    pub is_running: bool,
}

/// Fixed arrangement: hi-hat every step, arpeggio and bass on longer periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Arpeggio notes (Hz); one is picked at random per trigger
    pub scale: Vec<f32>,
    pub arp_every: u64,
    pub arp_waveform: Waveform,
    pub arp_duration: f64,
    pub arp_velocity: f32,
    pub bass_every: u64,
    pub bass_frequency: f32,
    pub bass_waveform: Waveform,
    pub bass_duration: f64,
    pub bass_velocity: f32,
    pub hat_duration: f64,
    pub hat_velocity: f32,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            scale: vec![110.0, 130.81, 146.83, 164.81, 196.0, 220.0, 261.63],
            arp_every: 4,
            arp_waveform: Waveform::Square,
            arp_duration: 0.1,
            arp_velocity: 0.1,
            bass_every: 8,
            bass_frequency: 55.0,
            bass_waveform: Waveform::Sawtooth,
            bass_duration: 0.2,
            bass_velocity: 0.4,
            hat_duration: 0.05,
            hat_velocity: super::synth::NOISE_VELOCITY,
        }
    }
}

impl Pattern {
    /// Events triggered on step `beat` at `time`
    pub fn events_for(&self, beat: u64, time: f64, rng: &mut Pcg32, out: &mut Vec<ScheduledEvent>) {
        if self.arp_every > 0 && beat % self.arp_every == 0 && !self.scale.is_empty() {
            let note = self.scale[rng.random_range(0..self.scale.len())];
            out.push(ScheduledEvent::tone(
                time,
                note,
                self.arp_waveform,
                self.arp_duration,
                self.arp_velocity,
            ));
        }
        if self.bass_every > 0 && beat % self.bass_every == 0 {
            out.push(ScheduledEvent::tone(
                time,
                self.bass_frequency,
                self.bass_waveform,
                self.bass_duration,
                self.bass_velocity,
            ));
        }
        out.push(ScheduledEvent::noise(time, self.hat_duration, self.hat_velocity));
    }
}

/// Lookahead sequencer over a fixed tempo grid
#[derive(Debug, Clone)]
pub struct Sequencer {
    state: SequencerState,
    pattern: Pattern,
    step_secs: f64,
    ahead_secs: f64,
    rng: Pcg32,
}

impl Sequencer {
    pub fn new(settings: &AudioSettings, pattern: Pattern, seed: u64) -> Self {
        Self {
            state: SequencerState::default(),
            pattern,
            step_secs: subdivision_secs(settings.tempo_bpm, settings.subdivision_beats),
            ahead_secs: settings.schedule_ahead_secs,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    /// Seconds between steps
    #[inline]
    pub fn step_secs(&self) -> f64 {
        self.step_secs
    }

    /// Begin (or restart) at the current audio-clock time
    pub fn start(&mut self, now: f64) {
        self.state.next_event_time = now;
        self.state.is_running = true;
    }

    pub fn stop(&mut self) {
        self.state.is_running = false;
    }

    /// Collect all events due inside the lookahead window. Does nothing while
    /// stopped. Steps that already lie in the past (a very late call) are
    /// skipped rather than emitted late.
    pub fn fill(&mut self, now: f64) -> Vec<ScheduledEvent> {
        let mut events = Vec::new();
        if !self.state.is_running {
            return events;
        }

        let horizon = now + self.ahead_secs;
        let mut skipped = 0u32;
        while self.state.next_event_time < horizon {
            self.state.beat_count += 1;
            let time = self.state.next_event_time;
            if time >= now {
                self.pattern
                    .events_for(self.state.beat_count, time, &mut self.rng, &mut events);
            } else {
                skipped += 1;
            }
            self.state.next_event_time += self.step_secs;
        }

        if skipped > 0 {
            log::debug!("Scheduler tick late, skipped {skipped} step(s) already in the past");
        }
        events
    }
}
