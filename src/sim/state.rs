//! Game state and core simulation types
//!
//! Everything the frame loop mutates lives in `GameState`, which is passed
//! by `&mut` through each step. No globals.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Not started, or stopped by the host
    #[default]
    Idle,
    /// Round in progress
    Playing,
    /// Round timer ran out
    Finished,
}

/// Drawing surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Narrow (phone-sized) viewport
    #[inline]
    pub fn is_mobile(&self, breakpoint: f32) -> bool {
        self.width < breakpoint
    }
}

/// Image handle supplied by the asset loader, with its pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

impl ImageRef {
    pub fn new(id: u32, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    /// Width / height, guarding against zero height
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// A falling collectible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingTarget {
    pub id: u64,
    /// Centre of the sprite
    pub pos: Vec2,
    /// Displacement per frame
    pub vel: Vec2,
    /// Display width and height
    pub size: Vec2,
    pub image: ImageRef,
}

impl FloatingTarget {
    /// Capture radius: half the width, widened by `tolerance`
    #[inline]
    pub fn collision_radius(&self, tolerance: f32) -> f32 {
        (self.size.x / 2.0) * tolerance
    }

    /// Euler step, no acceleration
    #[inline]
    pub fn advance(&mut self) {
        self.pos += self.vel;
    }

    /// Fell past the bottom edge by more than `margin`
    #[inline]
    pub fn is_out_of_bounds(&self, viewport: &Viewport, margin: f32) -> bool {
        self.pos.y > viewport.height + margin
    }
}

/// A capture-burst particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life in (0, 1], also the draw opacity
    pub life: f32,
    /// 0xRRGGBB
    pub color: u32,
    pub size: f32,
    /// Frames since emission
    pub age: u32,
}

/// Something that happened during a frame step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A target was captured at `pos`
    TargetCaptured { id: u64, pos: Vec2 },
    /// A target left the bottom of the screen
    TargetMissed { id: u64 },
    /// New score after a capture
    ScoreChanged(u32),
    /// Score crossed the next commentary threshold
    Milestone(u32),
    /// Round timer expired
    RoundOver { score: u32 },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed for this session's RNG
    pub seed: u64,
    pub phase: GamePhase,
    pub score: u32,
    /// Score when commentary was last requested
    pub score_at_last_commentary: u32,
    /// Seconds remaining in the round
    pub time_left: f32,
    pub frame_count: u64,
    /// Live targets, in spawn (id) order
    pub targets: Vec<FloatingTarget>,
    pub particles: Vec<Particle>,
    pub rng: Pcg32,
    next_id: u64,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            phase: GamePhase::Idle,
            score: 0,
            score_at_last_commentary: 0,
            time_left: 0.0,
            frame_count: 0,
            targets: Vec::new(),
            particles: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new target id (unique and increasing)
    pub fn next_entity_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Clear the board and begin a round of `round_secs`
    pub fn begin_round(&mut self, round_secs: f32) {
        self.phase = GamePhase::Playing;
        self.score = 0;
        self.score_at_last_commentary = 0;
        self.time_left = round_secs;
        self.targets.clear();
        self.particles.clear();
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut state = GameState::new(1);
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert!(b > a);
    }

    #[test]
    fn test_begin_round_resets() {
        let mut state = GameState::new(1);
        state.score = 120;
        state.score_at_last_commentary = 100;
        state.particles.push(Particle {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            life: 1.0,
            color: 0xffffff,
            size: 3.0,
            age: 0,
        });
        state.begin_round(30.0);
        assert!(state.is_playing());
        assert_eq!(state.score, 0);
        assert_eq!(state.score_at_last_commentary, 0);
        assert_eq!(state.time_left, 30.0);
        assert!(state.particles.is_empty());
    }

    #[test]
    fn test_aspect_ratio_guard() {
        assert_eq!(ImageRef::new(0, 200, 100).aspect_ratio(), 2.0);
        assert_eq!(ImageRef::new(0, 64, 0).aspect_ratio(), 64.0);
    }

    #[test]
    fn test_target_bounds() {
        let viewport = Viewport::new(800.0, 600.0);
        let mut target = FloatingTarget {
            id: 1,
            pos: Vec2::new(100.0, 699.0),
            vel: Vec2::new(0.0, 2.0),
            size: Vec2::new(80.0, 80.0),
            image: ImageRef::new(0, 64, 64),
        };
        assert!(!target.is_out_of_bounds(&viewport, 100.0));
        target.advance();
        assert!(target.is_out_of_bounds(&viewport, 100.0));
        assert!((target.collision_radius(1.2) - 48.0).abs() < 1e-4);
    }
}
