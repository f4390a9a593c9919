//! Capture detection and scoring
//!
//! The capture point is tested against every live target each frame. All
//! targets hit in the same frame are captured, in spawn order.

use glam::Vec2;

use super::particles::emit_burst;
use super::state::{FloatingTarget, GameEvent, GameState};
use crate::settings::{CollisionSettings, ParticleSettings};

/// True when `point` lies within the target's capture radius (boundary
/// inclusive).
#[inline]
pub fn is_captured(target: &FloatingTarget, point: Vec2, tolerance: f32) -> bool {
    let r = target.collision_radius(tolerance);
    target.pos.distance_squared(point) <= r * r
}

/// Capture every target under `point`: remove it, burst particles at its
/// centre, add points and raise milestone events. Returns the capture count.
pub fn resolve_captures(
    state: &mut GameState,
    point: Vec2,
    collision: &CollisionSettings,
    particles: &ParticleSettings,
    events: &mut Vec<GameEvent>,
) -> usize {
    let (captured, live): (Vec<_>, Vec<_>) = std::mem::take(&mut state.targets)
        .into_iter()
        .partition(|t| is_captured(t, point, collision.radius_tolerance));
    state.targets = live;

    for target in &captured {
        emit_burst(&mut state.particles, &mut state.rng, target.pos, particles);
        state.score = state.score.saturating_add(collision.points_per_capture);
        events.push(GameEvent::TargetCaptured {
            id: target.id,
            pos: target.pos,
        });
        events.push(GameEvent::ScoreChanged(state.score));

        if collision.commentary_interval > 0
            && state.score - state.score_at_last_commentary >= collision.commentary_interval
        {
            state.score_at_last_commentary = state.score;
            events.push(GameEvent::Milestone(state.score));
        }
    }

    captured.len()
}
