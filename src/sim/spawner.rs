//! Target spawning and falling motion

use glam::Vec2;
use rand::Rng;

use super::particles::random_in;
use super::state::{FloatingTarget, GameEvent, GameState, ImageRef, Viewport};
use crate::settings::SpawnSettings;

/// Display size for an image: width from the viewport class, height from the
/// image's aspect ratio so it is never stretched.
pub fn target_size(viewport: &Viewport, image: &ImageRef, cfg: &SpawnSettings) -> Vec2 {
    let fraction = if viewport.is_mobile(cfg.mobile_breakpoint) {
        cfg.mobile_width_fraction
    } else {
        cfg.desktop_width_fraction
    };
    let width = viewport.width * fraction;
    Vec2::new(width, width / image.aspect_ratio())
}

/// Create a target just above the top edge, fully inside horizontally
pub fn spawn_target(
    state: &mut GameState,
    viewport: &Viewport,
    image: ImageRef,
    cfg: &SpawnSettings,
) -> FloatingTarget {
    let size = target_size(viewport, &image, cfg);
    let half_w = size.x / 2.0;
    let x = if viewport.width > size.x {
        random_in(&mut state.rng, half_w, viewport.width - half_w)
    } else {
        viewport.width / 2.0
    };
    let vx = random_in(&mut state.rng, -cfg.max_lateral_speed, cfg.max_lateral_speed);
    let vy = random_in(&mut state.rng, cfg.min_fall_speed, cfg.max_fall_speed);

    FloatingTarget {
        id: state.next_entity_id(),
        pos: Vec2::new(x, -size.y),
        vel: Vec2::new(vx, vy),
        size,
        image,
    }
}

/// One Bernoulli spawn trial. Spawns only below the live cap and when the
/// asset loader has supplied at least one image.
pub fn maybe_spawn(
    state: &mut GameState,
    viewport: &Viewport,
    images: &[ImageRef],
    cfg: &SpawnSettings,
) -> Option<u64> {
    let roll = state.rng.random_bool(cfg.spawn_probability.clamp(0.0, 1.0));
    if !roll || state.targets.len() >= cfg.max_targets || images.is_empty() {
        return None;
    }
    let image = images[state.rng.random_range(0..images.len())];
    let target = spawn_target(state, viewport, image, cfg);
    let id = target.id;
    state.targets.push(target);
    Some(id)
}

/// Move every target and retire the ones that fell off screen. Missed
/// targets do not touch the score.
pub fn step_targets(
    state: &mut GameState,
    viewport: &Viewport,
    cfg: &SpawnSettings,
    events: &mut Vec<GameEvent>,
) {
    for target in &mut state.targets {
        target.advance();
    }
    state.targets.retain(|t| {
        let out = t.is_out_of_bounds(viewport, cfg.exit_margin);
        if out {
            events.push(GameEvent::TargetMissed { id: t.id });
        }
        !out
    });
}
