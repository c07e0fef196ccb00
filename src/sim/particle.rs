//! Visual particles (sparks, bursts, score popups)

use std::fmt::Write as _;

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::catalog::ParticleKind;
use crate::consts::{PARTICLE_LIFE_EPSILON, REFERENCE_FRAME_MS};
use crate::ease_out_quad;
use crate::pool::Poolable;

/// Velocity kept per reference frame
const DRAG: f32 = 0.98;

/// Text carried by a popup particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PopupText {
    Points(u64),
    Label(&'static str),
}

/// Everything needed to (re)initialize a particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleArgs {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub color: u32,
    pub gravity: f32,
    pub spin: f32,
    pub lifetime_ms: f32,
    pub text: Option<PopupText>,
}

impl ParticleArgs {
    /// Particle flying out of `center` in a random direction
    pub fn scatter(
        rng: &mut impl Rng,
        kind: ParticleKind,
        center: Vec2,
        color: u32,
        speed: f32,
    ) -> Self {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let magnitude = speed * rng.random_range(0.5..1.0);
        Self {
            kind,
            pos: center,
            vel: Vec2::new(angle.cos(), angle.sin()) * magnitude,
            size: rng.random_range(3.0..7.0),
            color,
            gravity: 0.15,
            spin: rng.random_range(-0.2..0.2),
            lifetime_ms: rng.random_range(500.0..900.0),
            text: None,
        }
    }

    /// Rising score popup
    pub fn popup(center: Vec2, text: PopupText, color: u32) -> Self {
        Self {
            kind: ParticleKind::Text,
            pos: center,
            vel: Vec2::new(0.0, -1.5),
            size: 18.0,
            color,
            gravity: 0.0,
            spin: 0.0,
            lifetime_ms: 900.0,
            text: Some(text),
        }
    }
}

/// A live particle
#[derive(Debug, Clone, Serialize)]
pub struct Particle {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub color: u32,
    pub gravity: f32,
    pub rotation: f32,
    pub spin: f32,
    /// 1 at spawn, eased toward 0
    pub life: f32,
    pub lifetime_ms: f32,
    pub age_ms: f32,
    /// Popup text; the buffer is kept across reuse
    pub text: String,
}

impl Poolable for Particle {
    type Args = ParticleArgs;

    fn create(args: ParticleArgs) -> Self {
        let mut particle = Self {
            kind: args.kind,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            size: 0.0,
            color: 0,
            gravity: 0.0,
            rotation: 0.0,
            spin: 0.0,
            life: 0.0,
            lifetime_ms: 0.0,
            age_ms: 0.0,
            text: String::new(),
        };
        particle.reset(args);
        particle
    }

    fn reset(&mut self, args: ParticleArgs) {
        self.kind = args.kind;
        self.pos = args.pos;
        self.vel = args.vel;
        self.size = args.size;
        self.color = args.color;
        self.gravity = args.gravity;
        self.rotation = 0.0;
        self.spin = args.spin;
        self.life = 1.0;
        self.lifetime_ms = args.lifetime_ms.max(1.0);
        self.age_ms = 0.0;
        self.text.clear();
        match args.text {
            Some(PopupText::Points(points)) => {
                let _ = write!(self.text, "+{points}");
            }
            Some(PopupText::Label(label)) => self.text.push_str(label),
            None => {}
        }
    }
}

impl Particle {
    pub fn update(&mut self, dt_ms: f32) {
        let dt = dt_ms / REFERENCE_FRAME_MS;
        self.age_ms += dt_ms;
        let progress = self.age_ms / self.lifetime_ms;
        self.life = 1.0 - ease_out_quad(progress);

        self.vel.y += self.gravity * dt;
        self.vel *= DRAG.powf(dt);
        self.pos += self.vel * dt;
        self.rotation += self.spin * dt;
    }

    pub fn is_dead(&self) -> bool {
        self.life <= PARTICLE_LIFE_EPSILON
    }

    /// Draw alpha
    pub fn alpha(&self) -> f32 {
        self.life.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ParticleArgs {
        ParticleArgs {
            kind: ParticleKind::Star,
            pos: Vec2::new(10.0, 10.0),
            vel: Vec2::new(1.0, 0.0),
            size: 4.0,
            color: 0xFFFFFF,
            gravity: 0.2,
            spin: 0.1,
            lifetime_ms: 500.0,
            text: None,
        }
    }

    #[test]
    fn test_life_decays_to_death() {
        let mut particle = Particle::create(args());
        assert_eq!(particle.life, 1.0);
        let mut last = particle.life;
        for _ in 0..31 {
            particle.update(REFERENCE_FRAME_MS);
            assert!(particle.life <= last);
            last = particle.life;
        }
        assert!(particle.is_dead());
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut particle = Particle::create(args());
        particle.update(REFERENCE_FRAME_MS);
        particle.update(REFERENCE_FRAME_MS);
        assert!(particle.vel.y > 0.0);
        assert!(particle.pos.x > 10.0);
    }

    #[test]
    fn test_popup_text_reuses_buffer() {
        let mut particle = Particle::create(ParticleArgs::popup(
            Vec2::ZERO,
            PopupText::Points(150),
            0xFFD54F,
        ));
        assert_eq!(particle.text, "+150");
        particle.reset(ParticleArgs::popup(Vec2::ZERO, PopupText::Label("COMBO!"), 0));
        assert_eq!(particle.text, "COMBO!");
        particle.reset(args());
        assert!(particle.text.is_empty());
        assert_eq!(particle.life, 1.0);
    }
}
