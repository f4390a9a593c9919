//! Frame simulation
//!
//! All gameplay logic lives here, free of audio and platform dependencies:
//! - Seeded RNG only
//! - Stable iteration order (by target id)
//! - Motion in units per display frame

pub mod collision;
pub mod particles;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{is_captured, resolve_captures};
pub use particles::{PARTICLE_PALETTE, emit_burst, step_particles};
pub use spawner::{maybe_spawn, spawn_target, step_targets, target_size};
pub use state::{
    FloatingTarget, GameEvent, GamePhase, GameState, ImageRef, Particle, Viewport,
};
pub use tick::{FrameInput, tick};
