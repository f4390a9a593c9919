//! Neon Pulse - a beat-reactive motion arcade engine
//!
//! Core modules:
//! - `audio`: Lookahead sequencer, procedural synth, mixer and spectrum analysis
//! - `sim`: Frame simulation (target spawning, capture detection, particles)
//! - `pose`: Capture point derivation from body landmarks
//! - `commentary`: Fire-and-forget milestone commentary
//! - `orchestrator`: Per-frame sequencing of the above
//! - `session`: Start/stop control surface

pub mod audio;
pub mod commentary;
pub mod orchestrator;
pub mod pose;
pub mod session;
pub mod settings;
pub mod sim;

pub use orchestrator::{FrameOrchestrator, GameListener, LoudnessSource, RenderFrame};
pub use session::Session;
pub use settings::Settings;

/// Engine configuration defaults
pub mod consts {
    /// Tempo of the backing track
    pub const TEMPO_BPM: f64 = 120.0;
    /// One sixteenth note, as a fraction of a beat
    pub const SUBDIVISION_BEATS: f64 = 0.25;
    /// Wall-clock period of the scheduler wake-up (ms)
    pub const TICK_INTERVAL_MS: u64 = 25;
    /// How far ahead of the audio clock events are scheduled (seconds)
    pub const SCHEDULE_AHEAD_SECS: f64 = 0.1;
    /// Output gain applied after mixing all voices
    pub const MASTER_GAIN: f32 = 0.4;
    /// Samples per analysis window (yields half as many frequency bins)
    pub const ANALYSIS_SIZE: usize = 64;

    /// Per-frame probability of spawning a target
    pub const SPAWN_PROBABILITY: f64 = 0.03;
    /// Maximum simultaneously live targets
    pub const MAX_TARGETS: usize = 5;
    /// Targets are retired once this far below the bottom edge
    pub const EXIT_MARGIN: f32 = 100.0;
    /// Viewports narrower than this use the mobile sizing
    pub const MOBILE_BREAKPOINT: f32 = 768.0;
    pub const MOBILE_WIDTH_FRACTION: f32 = 0.16;
    pub const DESKTOP_WIDTH_FRACTION: f32 = 0.10;

    /// Capture radius multiplier on the target half-width
    pub const RADIUS_TOLERANCE: f32 = 1.2;
    pub const POINTS_PER_CAPTURE: u32 = 10;
    /// Score delta between commentary requests
    pub const COMMENTARY_INTERVAL: u32 = 50;

    /// Particles per capture burst
    pub const BURST_SIZE: usize = 10;
    /// Life lost per frame (full fade in 50 frames)
    pub const PARTICLE_LIFE_DECAY: f32 = 0.02;

    /// Length of a play session (seconds)
    pub const ROUND_SECS: f32 = 30.0;
    /// Minimum landmark visibility for the capture point
    pub const VISIBILITY_THRESHOLD: f32 = 0.5;

    /// Maximum extra scale applied to sprites at full loudness
    pub const BEAT_SCALE_DEPTH: f32 = 0.5;
}

/// Seconds per subdivision for a tempo (0.125 at 120 BPM sixteenths)
#[inline]
pub fn subdivision_secs(tempo_bpm: f64, subdivision_beats: f64) -> f64 {
    (60.0 / tempo_bpm) * subdivision_beats
}

/// Map a loudness reading in [0, 255] to the sprite pulse multiplier
#[inline]
pub fn beat_scale(loudness: f32) -> f32 {
    1.0 + (loudness.clamp(0.0, 255.0) / 255.0) * consts::BEAT_SCALE_DEPTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdivision_at_default_tempo() {
        assert_eq!(
            subdivision_secs(consts::TEMPO_BPM, consts::SUBDIVISION_BEATS),
            0.125
        );
    }

    #[test]
    fn test_beat_scale_range() {
        assert_eq!(beat_scale(0.0), 1.0);
        assert_eq!(beat_scale(255.0), 1.5);
        assert!((beat_scale(127.5) - 1.25).abs() < 1e-6);
        // Out of range readings are clamped
        assert_eq!(beat_scale(-3.0), 1.0);
        assert_eq!(beat_scale(900.0), 1.5);
    }
}
