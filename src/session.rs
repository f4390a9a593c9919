//! Play session control surface
//!
//! Owns the game state, the frame orchestrator and the music scheduler, and
//! ties their lifetimes together: `start` begins a round and the music,
//! `stop` (or the round timer running out) silences it.

use crate::audio::{AudioOutput, Scheduler, SharedMixer};
use crate::orchestrator::{FrameOrchestrator, RenderFrame};
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState, ImageRef, Viewport};

/// Mixes the session seed into an independent stream for the sequencer
const MUSIC_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

pub struct Session {
    settings: Settings,
    state: GameState,
    orchestrator: FrameOrchestrator,
    scheduler: Scheduler,
    output: Option<AudioOutput>,
    viewport: Viewport,
    images: Vec<ImageRef>,
}

impl Session {
    /// Build a session around an existing mixer (or none for silent play)
    pub fn new(
        settings: Settings,
        mixer: Option<SharedMixer>,
        orchestrator: FrameOrchestrator,
        viewport: Viewport,
    ) -> Self {
        let seed = settings.session_seed();
        log::info!("Session seed {seed}");
        Self {
            scheduler: Scheduler::new(mixer, &settings.audio, seed ^ MUSIC_SEED_SALT),
            state: GameState::new(seed),
            settings,
            orchestrator,
            output: None,
            viewport,
            images: Vec::new(),
        }
    }

    /// Build a session on the default output device. Falls back to silent
    /// play when no device can be opened.
    pub fn open_default(
        settings: Settings,
        orchestrator: FrameOrchestrator,
        viewport: Viewport,
    ) -> Self {
        match AudioOutput::open_default(&settings.audio) {
            Ok((output, mixer)) => {
                // Device runs only while a round is active
                output.pause();
                let mut session = Self::new(settings, Some(mixer), orchestrator, viewport);
                session.output = Some(output);
                session
            }
            Err(e) => {
                log::warn!("Audio unavailable ({e}); playing without sound");
                Self::new(settings, None, orchestrator, viewport)
            }
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn has_audio_output(&self) -> bool {
        self.output.is_some()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Replace the loaded target images. An empty set suppresses spawning.
    pub fn set_images(&mut self, images: Vec<ImageRef>) {
        log::debug!("{} target images loaded", images.len());
        self.images = images;
    }

    /// Begin a round: reset the score, resume the audio clock and start the
    /// sequencer. No-op while a round is in progress.
    pub fn start(&mut self) {
        if self.state.is_playing() {
            return;
        }
        self.state.begin_round(self.settings.session.round_secs);
        if let Some(output) = &self.output {
            output.play();
        }
        self.scheduler.start();
        log::info!("Round started ({}s)", self.settings.session.round_secs);
    }

    /// End the round early and silence the music. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.state.phase == GamePhase::Playing {
            self.state.phase = GamePhase::Idle;
            log::info!("Round stopped at score {}", self.state.score);
        }
        self.halt_audio();
    }

    /// Advance one display frame
    pub fn frame(&mut self, dt: f32) -> RenderFrame {
        let frame = self.orchestrator.frame(
            &mut self.state,
            &self.scheduler,
            self.viewport,
            &self.images,
            dt,
        );
        if self.state.phase == GamePhase::Finished && self.scheduler.is_running() {
            self.halt_audio();
        }
        frame
    }

    fn halt_audio(&mut self) {
        self.scheduler.stop();
        if let Some(output) = &self.output {
            output.pause();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.halt_audio();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Mixer;
    use crate::orchestrator::NullListener;
    use crate::pose::NoPose;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.session.seed = Some(42);
        settings.session.round_secs = 0.5;
        settings
    }

    fn session(mixer: Option<SharedMixer>) -> Session {
        let settings = settings();
        let orchestrator = FrameOrchestrator::new(
            settings.clone(),
            Box::new(NoPose),
            None,
            Box::new(NullListener),
        );
        Session::new(settings, mixer, orchestrator, Viewport::new(1280.0, 720.0))
    }

    #[test]
    fn test_start_stop_idempotent() {
        let mixer = Mixer::new(48_000, 0.4, 64).shared();
        let mut s = session(Some(mixer.clone()));
        assert!(!s.scheduler().is_running());
        assert!(mixer.lock().unwrap().is_suspended());

        s.start();
        s.start();
        assert!(s.state().is_playing());
        assert!(s.scheduler().is_running());
        assert!(!mixer.lock().unwrap().is_suspended());

        s.stop();
        s.stop();
        assert_eq!(s.state().phase, GamePhase::Idle);
        assert!(!s.scheduler().is_running());
        assert!(mixer.lock().unwrap().is_suspended());
        assert_eq!(mixer.lock().unwrap().pending_len(), 0);
    }

    #[test]
    fn test_start_resets_score() {
        let mut s = session(None);
        s.start();
        s.state.score = 70;
        s.state.score_at_last_commentary = 50;
        s.stop();
        assert_eq!(s.state().score, 70);

        s.start();
        assert_eq!(s.state().score, 0);
        assert_eq!(s.state().score_at_last_commentary, 0);
    }

    #[test]
    fn test_round_end_stops_music() {
        let mut s = session(None);
        s.set_images(vec![ImageRef::new(0, 64, 64)]);
        s.start();
        assert!(s.scheduler().is_running());

        let mut frames = 0;
        while s.state().phase != GamePhase::Finished {
            let frame = s.frame(1.0 / 60.0);
            assert!(frame.beat_scale >= 1.0);
            frames += 1;
            assert!(frames < 1000);
        }
        assert!(!s.scheduler().is_running());

        // A new round can start after the old one finished
        s.start();
        assert!(s.state().is_playing());
        assert!(s.scheduler().is_running());
    }

    #[test]
    fn test_silent_session_frames() {
        let mut s = session(None);
        assert!(!s.has_audio_output());
        let frame = s.frame(1.0 / 60.0);
        assert_eq!(frame.phase, GamePhase::Idle);
        assert_eq!(frame.beat_scale, 1.0);
        assert!(frame.targets.is_empty());
    }
}
