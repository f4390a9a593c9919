//! Engine settings and tuning
//!
//! Every tuned constant (tempo, spawn rate, capture tolerance, ...) is exposed
//! here so a host can adjust balance without recompiling. Persisted as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sequencer and output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Output gain after mixing (0.0 - 1.0)
    pub master_gain: f32,
    pub tempo_bpm: f64,
    /// Length of one sequencer step in beats
    pub subdivision_beats: f64,
    /// Scheduler wake-up period
    pub tick_interval_ms: u64,
    /// Lookahead window relative to the audio clock
    pub schedule_ahead_secs: f64,
    /// Analysis window in samples (power of two)
    pub analysis_size: usize,
    /// Silence the output while keeping the clock running
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_gain: MASTER_GAIN,
            tempo_bpm: TEMPO_BPM,
            subdivision_beats: SUBDIVISION_BEATS,
            tick_interval_ms: TICK_INTERVAL_MS,
            schedule_ahead_secs: SCHEDULE_AHEAD_SECS,
            analysis_size: ANALYSIS_SIZE,
            muted: false,
        }
    }
}

impl AudioSettings {
    /// Effective output gain (respects mute)
    pub fn effective_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_gain.clamp(0.0, 1.0)
        }
    }
}

/// Target spawning and motion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// Bernoulli probability evaluated once per frame
    pub spawn_probability: f64,
    pub max_targets: usize,
    pub mobile_breakpoint: f32,
    pub mobile_width_fraction: f32,
    pub desktop_width_fraction: f32,
    /// Distance below the viewport at which targets are retired
    pub exit_margin: f32,
    /// Lateral speed is drawn from [-max_lateral_speed, max_lateral_speed)
    pub max_lateral_speed: f32,
    pub min_fall_speed: f32,
    pub max_fall_speed: f32,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            spawn_probability: SPAWN_PROBABILITY,
            max_targets: MAX_TARGETS,
            mobile_breakpoint: MOBILE_BREAKPOINT,
            mobile_width_fraction: MOBILE_WIDTH_FRACTION,
            desktop_width_fraction: DESKTOP_WIDTH_FRACTION,
            exit_margin: EXIT_MARGIN,
            max_lateral_speed: 1.0,
            min_fall_speed: 2.0,
            max_fall_speed: 4.0,
        }
    }
}

/// Capture detection and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    pub radius_tolerance: f32,
    pub points_per_capture: u32,
    pub commentary_interval: u32,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            radius_tolerance: RADIUS_TOLERANCE,
            points_per_capture: POINTS_PER_CAPTURE,
            commentary_interval: COMMENTARY_INTERVAL,
        }
    }
}

/// Capture burst particles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    pub burst_size: usize,
    pub life_decay: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub min_size: f32,
    pub max_size: f32,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            burst_size: BURST_SIZE,
            life_decay: PARTICLE_LIFE_DECAY,
            min_speed: 2.0,
            max_speed: 7.0,
            min_size: 2.0,
            max_size: 6.0,
        }
    }
}

/// Round and input mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub round_secs: f32,
    /// Fixed RNG seed for reproducible sessions (random when absent)
    pub seed: Option<u64>,
    /// Mirror the camera horizontally (selfie view)
    pub mirror_x: bool,
    pub visibility_threshold: f32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            round_secs: ROUND_SECS,
            seed: None,
            mirror_x: true,
            visibility_threshold: VISIBILITY_THRESHOLD,
        }
    }
}

/// All engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub spawn: SpawnSettings,
    pub collision: CollisionSettings,
    pub particles: ParticleSettings,
    pub session: SessionSettings,
}

impl Settings {
    /// Load settings from a JSON file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    /// Save settings as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Seed for this session: the configured one, or a fresh random seed
    pub fn session_seed(&self) -> u64 {
        self.session.seed.unwrap_or_else(rand::random)
    }
}
