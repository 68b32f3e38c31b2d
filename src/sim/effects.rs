/// Cosmetic feedback: score popups, particles, and the score pulse.
///
/// Positions and velocities are in tile units (1.0 = one tile) relative to
/// the board's top-left corner, so the renderer can map them onto any cell
/// size. Popups and particles live in plain `Vec`s and are compacted with
/// `retain` every update; nothing here touches the board.

use rand::Rng;

use crate::domain::board::Pos;

/// Popups rise at ~30 px/s on a 42 px tile.
const POPUP_RISE: f32 = 0.71;
const POPUP_FADE: f32 = 1.0;

const PARTICLES_PER_MATCH: usize = 12;
const PARTICLE_MIN_SPEED: f32 = 1.43; // 60 px/s
const PARTICLE_SPEED_SPREAD: u32 = 40; // + up to 39 px/s
const PIXELS_PER_TILE: f32 = 42.0;
const PARTICLE_DAMPING: f32 = 0.95; // per 1/60 s
const PARTICLE_FADE: f32 = 2.0;

const PULSE_PEAK: f32 = 2.0;
const PULSE_DECAY: f32 = -2.5;

#[derive(Clone, Debug)]
pub struct ScorePopup {
    pub x: f32,
    pub y: f32,
    pub amount: u32,
    pub lifetime: f32,
    pub alpha: f32,
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub lifetime: f32,
    pub alpha: f32,
    /// Blue channel of a warm yellow-white tint, 100..=255.
    pub tint: u8,
}

#[derive(Clone, Debug)]
pub struct ScorePulse {
    pub scale: f32,
    velocity: f32,
}

impl ScorePulse {
    pub fn active(&self) -> bool {
        self.scale > 1.0
    }
}

impl Default for ScorePulse {
    fn default() -> Self {
        ScorePulse { scale: 1.0, velocity: 0.0 }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Effects {
    pub popups: Vec<ScorePopup>,
    pub particles: Vec<Particle>,
    pub pulse: ScorePulse,
}

impl Effects {
    pub fn spawn_popup(&mut self, at: Pos, amount: u32, lifetime: f32) {
        let (x, y) = tile_center(at);
        self.popups.push(ScorePopup { x, y, amount, lifetime, alpha: 1.0 });
    }

    /// Radial burst: one particle every 30 degrees.
    pub fn spawn_particles<R: Rng + ?Sized>(&mut self, at: Pos, rng: &mut R) {
        let (x, y) = tile_center(at);
        self.particles.reserve(PARTICLES_PER_MATCH);
        for i in 0..PARTICLES_PER_MATCH {
            let angle = (i as f32 * 30.0).to_radians();
            let speed = PARTICLE_MIN_SPEED
                + rng.gen_range(0..PARTICLE_SPEED_SPREAD) as f32 / PIXELS_PER_TILE;
            self.particles.push(Particle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                lifetime: 0.5 + rng.gen_range(0..10) as f32 * 0.02,
                alpha: 1.0,
                tint: rng.gen_range(100..=255),
            });
        }
    }

    pub fn kick_pulse(&mut self) {
        self.pulse.scale = PULSE_PEAK;
        self.pulse.velocity = PULSE_DECAY;
    }

    pub fn update(&mut self, dt: f32) {
        for p in &mut self.popups {
            p.lifetime -= dt;
            p.y -= POPUP_RISE * dt;
            p.alpha = (p.alpha - POPUP_FADE * dt).max(0.0);
        }
        self.popups.retain(|p| p.lifetime > 0.0);

        let damping = PARTICLE_DAMPING.powf(dt * 60.0);
        for p in &mut self.particles {
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.vx *= damping;
            p.vy *= damping;
            p.lifetime -= dt;
            p.alpha -= PARTICLE_FADE * dt;
        }
        self.particles.retain(|p| p.lifetime > 0.0 && p.alpha > 0.0);

        if self.pulse.active() {
            self.pulse.scale += self.pulse.velocity * dt;
            if self.pulse.scale <= 1.0 {
                self.pulse = ScorePulse::default();
            }
        }
    }
}

fn tile_center(p: Pos) -> (f32, f32) {
    (p.x as f32 + 0.5, p.y as f32 + 0.5)
}
