//! Motion and collision helpers
//!
//! `Physics` holds only configuration (constants and the playfield bounds).
//! Every method is a pure function of its arguments and that configuration.
//! Speeds are expressed per reference frame (60 Hz) and scaled by a
//! delta-time factor.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{MAX_DT_FACTOR, REFERENCE_FRAME_MS};

/// Tunable physics constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration per reference frame
    pub gravity: f32,
    /// Maximum downward speed
    pub terminal_velocity: f32,
    /// Fraction of normal velocity kept after a wall bounce
    pub bounce_damping: f32,
    /// Fraction of tangential velocity kept after a wall bounce
    pub friction: f32,
    /// Bounce velocities below this are zeroed
    pub min_bounce_velocity: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            terminal_velocity: 15.0,
            bounce_damping: 0.7,
            friction: 0.98,
            min_bounce_velocity: 0.5,
        }
    }
}

/// Which edges a circle touches or has left
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoundaryCheck {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
    /// Entirely above the playfield
    pub off_screen_top: bool,
    /// Entirely below the playfield
    pub off_screen_bottom: bool,
    /// Touching no edge
    pub in_bounds: bool,
}

/// Axis-aligned rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of size `size` centred on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self::new(center.x - size.x / 2.0, center.y - size.y / 2.0, size.x, size.y)
    }
}

/// Physics helper bound to a playfield
#[derive(Debug, Clone)]
pub struct Physics {
    config: PhysicsConfig,
    width: f32,
    height: f32,
}

impl Physics {
    pub fn new(config: PhysicsConfig, width: f32, height: f32) -> Self {
        Self {
            config,
            width,
            height,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Playfield size
    pub fn bounds(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Convert elapsed milliseconds to a reference-frame multiplier
    pub fn dt_factor(dt_ms: f32) -> f32 {
        (dt_ms / REFERENCE_FRAME_MS).clamp(0.0, MAX_DT_FACTOR)
    }

    /// Accelerate downward, clamped to terminal velocity
    pub fn apply_gravity(&self, vy: f32, multiplier: f32) -> f32 {
        (vy + self.config.gravity * multiplier).min(self.config.terminal_velocity)
    }

    /// Linear integration
    pub fn update_position(&self, pos: Vec2, vel: Vec2, dt_factor: f32) -> Vec2 {
        pos + vel * dt_factor
    }

    /// Horizontal sinusoidal offset around `base_x`
    pub fn apply_sway(
        &self,
        base_x: f32,
        time: f32,
        phase: f32,
        amplitude: f32,
        frequency: f32,
    ) -> f32 {
        base_x + (time * frequency + phase).sin() * amplitude
    }

    /// Classify a circle against the playfield edges
    pub fn check_boundaries(&self, pos: Vec2, radius: f32) -> BoundaryCheck {
        let left = pos.x - radius < 0.0;
        let right = pos.x + radius > self.width;
        let top = pos.y - radius < 0.0;
        let bottom = pos.y + radius > self.height;
        BoundaryCheck {
            left,
            right,
            top,
            bottom,
            off_screen_top: pos.y + radius < 0.0,
            off_screen_bottom: pos.y - radius > self.height,
            in_bounds: !(left || right || top || bottom),
        }
    }

    /// Reflect off any touched wall with damping and friction
    ///
    /// Returns true if a bounce happened. Sub-threshold bounce velocity is
    /// zeroed so resting bodies settle instead of jittering forever.
    pub fn apply_boundary_collision(&self, pos: &mut Vec2, vel: &mut Vec2, radius: f32) -> bool {
        let check = self.check_boundaries(*pos, radius);
        let cfg = &self.config;
        let mut bounced = false;

        if check.left || check.right {
            pos.x = if check.left { radius } else { self.width - radius };
            vel.x = -vel.x * cfg.bounce_damping;
            vel.y *= cfg.friction;
            if vel.x.abs() < cfg.min_bounce_velocity {
                vel.x = 0.0;
            }
            bounced = true;
        }

        if check.top || check.bottom {
            pos.y = if check.top { radius } else { self.height - radius };
            vel.y = -vel.y * cfg.bounce_damping;
            vel.x *= cfg.friction;
            if vel.y.abs() < cfg.min_bounce_velocity {
                vel.y = 0.0;
            }
            bounced = true;
        }

        bounced
    }

    /// Predict where a projectile fired now at `projectile_speed` meets a
    /// target moving at constant velocity
    ///
    /// Solves |target + v·t - shooter| = s·t for the smallest positive t.
    pub fn calculate_intercept(
        &self,
        target_pos: Vec2,
        target_vel: Vec2,
        shooter_pos: Vec2,
        projectile_speed: f32,
    ) -> Option<Vec2> {
        let d = target_pos - shooter_pos;
        let a = target_vel.dot(target_vel) - projectile_speed * projectile_speed;
        let b = 2.0 * d.dot(target_vel);
        let c = d.dot(d);

        let t = if a.abs() < 1e-6 {
            // Equal speeds: the equation is linear
            if b.abs() < 1e-6 {
                return None;
            }
            -c / b
        } else {
            let disc = b * b - 4.0 * a * c;
            if disc < 0.0 {
                return None;
            }
            let sqrt = disc.sqrt();
            let t1 = (-b - sqrt) / (2.0 * a);
            let t2 = (-b + sqrt) / (2.0 * a);
            match (t1 > 0.0, t2 > 0.0) {
                (true, true) => t1.min(t2),
                (true, false) => t1,
                (false, true) => t2,
                (false, false) => return None,
            }
        };

        if t <= 0.0 {
            return None;
        }
        Some(target_pos + target_vel * t)
    }
}

/// Circle vs circle overlap
#[inline]
pub fn circle_circle(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

/// Point inside (or on) a circle
#[inline]
pub fn point_circle(p: Vec2, center: Vec2, radius: f32) -> bool {
    p.distance_squared(center) <= radius * radius
}

/// Rectangle overlap
#[inline]
pub fn rect_rect(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Point inside (or on the edge of) a rectangle
#[inline]
pub fn point_rect(p: Vec2, r: &Rect) -> bool {
    p.x >= r.x && p.x <= r.x + r.w && p.y >= r.y && p.y <= r.y + r.h
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}
