//! Real-time mixer and audio clock
//!
//! The mixer is the consumer side of the lookahead queue: the sequencer pushes
//! future-timestamped events, the output callback renders them. Time on the
//! audio clock only advances as frames are rendered, so everything scheduled
//! against it starts on an exact sample regardless of wall-clock jitter.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::event::ScheduledEvent;
use super::voice::ActiveVoice;

/// Mixer shared between the output callback and the scheduler thread
pub type SharedMixer = Arc<Mutex<Mixer>>;

/// Sums scheduled voices into an output stream
#[derive(Debug)]
pub struct Mixer {
    sample_rate: u32,
    /// Frames rendered while running (the audio clock)
    frames_rendered: u64,
    /// Events not yet started, ordered by time
    pending: VecDeque<ScheduledEvent>,
    voices: Vec<ActiveVoice>,
    suspended: bool,
    master_gain: f32,
    /// Most recent output samples, oldest first
    recent: VecDeque<f32>,
    analysis_size: usize,
    rng: Pcg32,
}

impl Mixer {
    /// New mixer. Starts suspended, like a freshly created audio context
    /// that has not been resumed yet.
    pub fn new(sample_rate: u32, master_gain: f32, analysis_size: usize) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            frames_rendered: 0,
            pending: VecDeque::new(),
            voices: Vec::new(),
            suspended: true,
            master_gain,
            recent: VecDeque::with_capacity(analysis_size),
            analysis_size,
            rng: Pcg32::seed_from_u64(0x6e656f6e),
        }
    }

    /// Wrap in the shared handle used by the output stream and scheduler
    pub fn shared(self) -> SharedMixer {
        Arc::new(Mutex::new(self))
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current audio-clock time in seconds
    #[inline]
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Freeze the clock; output is silent until resumed
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    /// Drop all pending events and sounding voices
    pub fn clear(&mut self) {
        self.pending.clear();
        self.voices.clear();
        self.recent.clear();
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain.clamp(0.0, 1.0);
    }

    /// Queue an event, keeping the queue ordered by start time
    pub fn schedule(&mut self, event: ScheduledEvent) {
        let idx = self.pending.partition_point(|e| e.time <= event.time);
        self.pending.insert(idx, event);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending events, earliest first
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.pending.iter()
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Frame index on which an event time falls
    #[inline]
    fn frame_of(&self, time: f64) -> u64 {
        (time.max(0.0) * self.sample_rate as f64).round() as u64
    }

    /// Render interleaved output. Every channel carries the same mono mix.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        if self.suspended {
            out.fill(0.0);
            return;
        }

        for frame in out.chunks_mut(channels) {
            let now = self.frames_rendered;

            while let Some(event) = self.pending.front() {
                let start = self.frame_of(event.time);
                if start > now {
                    break;
                }
                if let Some(event) = self.pending.pop_front() {
                    let voice = ActiveVoice::from_event(&event, self.sample_rate, now - start);
                    if !voice.is_finished() {
                        self.voices.push(voice);
                    }
                }
            }

            let mut mix = 0.0;
            for voice in &mut self.voices {
                mix += voice.next_sample(&mut self.rng);
            }
            self.voices.retain(|v| !v.is_finished());

            let sample = (mix * self.master_gain).clamp(-1.0, 1.0);
            if self.analysis_size > 0 {
                if self.recent.len() == self.analysis_size {
                    self.recent.pop_front();
                }
                self.recent.push_back(sample);
            }

            frame.fill(sample);
            self.frames_rendered += 1;
        }
    }

    /// Render `secs` of audio into a scratch buffer (offline use)
    pub fn advance(&mut self, secs: f64) {
        let frames = (secs * self.sample_rate as f64).round() as usize;
        let mut scratch = vec![0.0; frames];
        self.render(&mut scratch, 1);
    }

    /// Copy of the analysis window, zero-padded at the front until full
    pub fn analysis_window(&self) -> Vec<f32> {
        let mut window = vec![0.0; self.analysis_size.saturating_sub(self.recent.len())];
        window.extend(self.recent.iter().copied());
        window
    }
}
