//! Capture-burst particles

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::Particle;
use crate::settings::ParticleSettings;

/// Cyan, magenta, yellow, white
pub const PARTICLE_PALETTE: [u32; 4] = [0x00ffff, 0xff00ff, 0xffff00, 0xffffff];

/// Spawn a radial burst at `at`
pub fn emit_burst(particles: &mut Vec<Particle>, rng: &mut Pcg32, at: Vec2, cfg: &ParticleSettings) {
    particles.reserve(cfg.burst_size);
    for _ in 0..cfg.burst_size {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = random_in(rng, cfg.min_speed, cfg.max_speed);
        particles.push(Particle {
            pos: at,
            vel: Vec2::from_angle(angle) * speed,
            life: 1.0,
            color: PARTICLE_PALETTE[rng.random_range(0..PARTICLE_PALETTE.len())],
            size: random_in(rng, cfg.min_size, cfg.max_size),
            age: 0,
        });
    }
}

/// Advance every particle one frame and drop the faded ones
pub fn step_particles(particles: &mut Vec<Particle>, life_decay: f32) {
    for p in particles.iter_mut() {
        p.pos += p.vel;
        p.age += 1;
        // From age rather than repeated subtraction, so a whole fade lands on 0
        p.life = 1.0 - p.age as f32 * life_decay;
    }
    particles.retain(|p| p.life > 0.0);
}

/// Uniform in [min, max), or `min` for an empty range
pub(crate) fn random_in(rng: &mut Pcg32, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}
