//! Per-frame orchestration
//!
//! Once per display refresh: read the pose, step the simulation, report
//! score/milestone/commentary to the host, and pulse sprite sizes with the
//! music. The orchestrator owns no game state of its own; `GameState` is
//! passed in by reference every frame.

use std::sync::Arc;

use glam::Vec2;
use serde::Serialize;

use crate::beat_scale;
use crate::commentary::{CommentaryDispatcher, CommentaryService};
use crate::pose::{CaptureMapping, PoseSource};
use crate::settings::Settings;
use crate::sim::{FrameInput, GameEvent, GamePhase, GameState, ImageRef, Viewport, tick};

/// Instantaneous loudness of the music, in [0, 255]
pub trait LoudnessSource {
    fn loudness(&self) -> f32;
}

/// Constant loudness (silence, tests, or hosts without audio)
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLoudness(pub f32);

impl LoudnessSource for FixedLoudness {
    fn loudness(&self) -> f32 {
        self.0
    }
}

/// Host callbacks. All methods default to no-ops.
pub trait GameListener {
    /// Fired on every capture with the new score
    fn on_score_changed(&mut self, _score: u32) {}
    /// Fired when a commentary request is made
    fn on_milestone(&mut self, _score: u32) {}
    /// Commentary text arrived (possibly after the round ended)
    fn on_commentary(&mut self, _text: &str) {}
    fn on_round_over(&mut self, _score: u32) {}
}

/// Listener that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullListener;

impl GameListener for NullListener {}

/// A target as the renderer should draw it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSprite {
    pub id: u64,
    /// Centre of the sprite
    pub pos: Vec2,
    /// Display size with the beat pulse applied
    pub size: Vec2,
    pub image: ImageRef,
}

/// A particle as the renderer should draw it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleSprite {
    pub pos: Vec2,
    pub size: f32,
    /// 0xRRGGBB
    pub color: u32,
    /// Remaining life
    pub opacity: f32,
}

/// Everything the drawing collaborator needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub beat_scale: f32,
    pub capture_point: Option<Vec2>,
    pub targets: Vec<TargetSprite>,
    pub particles: Vec<ParticleSprite>,
    pub score: u32,
    pub time_left: f32,
    pub phase: GamePhase,
}

/// Sequences pose input, simulation, callbacks and beat scaling
pub struct FrameOrchestrator {
    settings: Settings,
    pose: Box<dyn PoseSource>,
    mapping: CaptureMapping,
    commentary: CommentaryDispatcher,
    listener: Box<dyn GameListener>,
    events: Vec<GameEvent>,
}

impl FrameOrchestrator {
    pub fn new(
        settings: Settings,
        pose: Box<dyn PoseSource>,
        commentary: Option<Arc<dyn CommentaryService>>,
        listener: Box<dyn GameListener>,
    ) -> Self {
        let mapping = CaptureMapping {
            mirror_x: settings.session.mirror_x,
            visibility_threshold: settings.session.visibility_threshold,
        };
        Self {
            settings,
            pose,
            mapping,
            commentary: CommentaryDispatcher::new(commentary),
            listener,
            events: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Events produced by the most recent frame
    pub fn last_events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Run one frame
    pub fn frame(
        &mut self,
        state: &mut GameState,
        audio: &dyn LoudnessSource,
        viewport: Viewport,
        images: &[ImageRef],
        dt: f32,
    ) -> RenderFrame {
        let capture_point = self
            .pose
            .latest()
            .and_then(|landmarks| self.mapping.capture_point(&landmarks, &viewport));

        self.events.clear();
        let input = FrameInput {
            capture_point,
            viewport,
            images,
            dt,
        };
        tick(state, &input, &self.settings, &mut self.events);

        for event in &self.events {
            match *event {
                GameEvent::ScoreChanged(score) => self.listener.on_score_changed(score),
                GameEvent::Milestone(score) => {
                    self.listener.on_milestone(score);
                    self.commentary.request(score);
                }
                GameEvent::RoundOver { score } => {
                    log::info!("Round over, final score {score}");
                    self.listener.on_round_over(score);
                }
                GameEvent::TargetCaptured { .. } | GameEvent::TargetMissed { .. } => {}
            }
        }

        for reply in self.commentary.poll() {
            self.listener.on_commentary(&reply.text);
        }

        let scale = beat_scale(audio.loudness());
        RenderFrame {
            beat_scale: scale,
            capture_point,
            targets: state
                .targets
                .iter()
                .map(|t| TargetSprite {
                    id: t.id,
                    pos: t.pos,
                    size: t.size * scale,
                    image: t.image,
                })
                .collect(),
            particles: state
                .particles
                .iter()
                .map(|p| ParticleSprite {
                    pos: p.pos,
                    size: p.size * scale,
                    color: p.color,
                    opacity: p.life.clamp(0.0, 1.0),
                })
                .collect(),
            score: state.score,
            time_left: state.time_left,
            phase: state.phase,
        }
    }
}
