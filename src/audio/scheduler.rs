//! Timer-driven producer for the lookahead queue
//!
//! A background thread wakes every `tick_interval_ms`, reads the audio clock
//! and lets the sequencer top up the mixer's queue. Stopping signals the
//! thread through a channel, which cancels the pending wake-up immediately.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::analyser::SpectrumAnalyser;
use super::mixer::SharedMixer;
use super::sequencer::{Pattern, Sequencer, SequencerState};
use super::synth::Synthesizer;
use crate::orchestrator::LoudnessSource;
use crate::settings::AudioSettings;

struct Worker {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives the sequencer on its own clock and exposes loudness for visuals
pub struct Scheduler {
    mixer: Option<SharedMixer>,
    sequencer: Arc<Mutex<Sequencer>>,
    synth: Synthesizer,
    analyser: SpectrumAnalyser,
    tick_interval: Duration,
    worker: Option<Worker>,
}

impl Scheduler {
    /// `mixer` is `None` when no audio output could be opened; the scheduler
    /// then tracks running state but produces no sound.
    pub fn new(mixer: Option<SharedMixer>, settings: &AudioSettings, seed: u64) -> Self {
        Self {
            synth: Synthesizer::new(mixer.clone()),
            mixer,
            sequencer: Arc::new(Mutex::new(Sequencer::new(
                settings,
                Pattern::default(),
                seed,
            ))),
            analyser: SpectrumAnalyser::new(settings.analysis_size),
            tick_interval: Duration::from_millis(settings.tick_interval_ms.max(1)),
            worker: None,
        }
    }

    /// Snapshot of the sequencer state
    pub fn state(&self) -> SequencerState {
        self.sequencer
            .lock()
            .map(|s| s.state())
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running
    }

    pub fn mixer(&self) -> Option<&SharedMixer> {
        self.mixer.as_ref()
    }

    /// Current audio-clock time (0 without an output)
    pub fn current_time(&self) -> f64 {
        self.mixer
            .as_ref()
            .and_then(|m| m.lock().ok().map(|m| m.current_time()))
            .unwrap_or(0.0)
    }

    /// Resume the clock and begin scheduling. No-op if already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        if let Some(mixer) = &self.mixer {
            if let Ok(mut m) = mixer.lock() {
                m.resume();
            }
        } else {
            log::warn!("No audio output; sequencer runs silent");
        }

        let now = self.current_time();
        if let Ok(mut seq) = self.sequencer.lock() {
            seq.start(now);
        }
        log::info!("Sequencer started at {now:.3}s");

        if self.mixer.is_none() {
            return;
        }

        // First window is filled right away, then on every wake-up
        run_tick(&self.sequencer, self.mixer.as_ref(), &self.synth);

        let (cancel, cancelled) = mpsc::channel::<()>();
        let sequencer = Arc::clone(&self.sequencer);
        let mixer = self.mixer.clone();
        let synth = self.synth.clone();
        let interval = self.tick_interval;

        let spawned = thread::Builder::new()
            .name("neon-pulse-scheduler".into())
            .spawn(move || {
                loop {
                    match cancelled.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if !run_tick(&sequencer, mixer.as_ref(), &synth) {
                                break;
                            }
                        }
                        // Cancelled, or the scheduler was dropped
                        _ => break,
                    }
                }
                log::debug!("Scheduler thread exiting");
            });

        match spawned {
            Ok(handle) => self.worker = Some(Worker { cancel, handle }),
            Err(e) => log::error!("Failed to spawn scheduler thread: {e}"),
        }
    }

    /// Stop scheduling, cancel the pending wake-up and suspend the clock.
    /// Safe to call repeatedly.
    pub fn stop(&mut self) {
        let was_running = self.is_running();
        if let Ok(mut seq) = self.sequencer.lock() {
            seq.stop();
        }

        if let Some(worker) = self.worker.take() {
            let _ = worker.cancel.send(());
            if worker.handle.join().is_err() {
                log::error!("Scheduler thread panicked");
            }
        }

        if let Some(mixer) = &self.mixer {
            if let Ok(mut m) = mixer.lock() {
                m.suspend();
                m.clear();
            }
        }

        if was_running {
            log::info!("Sequencer stopped");
        }
    }

    /// One lookahead pass. Hosts without threads can call this from their
    /// own timer instead of relying on the worker.
    pub fn tick(&self) -> bool {
        run_tick(&self.sequencer, self.mixer.as_ref(), &self.synth)
    }
}

impl LoudnessSource for Scheduler {
    /// Mean byte magnitude of the current output spectrum; 0 while stopped
    fn loudness(&self) -> f32 {
        if !self.is_running() {
            return 0.0;
        }
        let Some(mixer) = &self.mixer else { return 0.0 };
        let window = match mixer.lock() {
            Ok(m) => m.analysis_window(),
            Err(_) => return 0.0,
        };
        self.analyser.loudness(&window)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Top up the queue. Returns false when the sequencer is stopped, which ends
/// the worker loop.
fn run_tick(
    sequencer: &Mutex<Sequencer>,
    mixer: Option<&SharedMixer>,
    synth: &Synthesizer,
) -> bool {
    let Some(mixer) = mixer else { return false };
    let Ok(mut seq) = sequencer.lock() else {
        return false;
    };
    if !seq.is_running() {
        return false;
    }
    let now = match mixer.lock() {
        Ok(m) => m.current_time(),
        Err(_) => return true,
    };
    for event in seq.fill(now) {
        synth.dispatch(event);
    }
    true
}
