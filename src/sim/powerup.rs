//! Falling power-ups and their active timers

use glam::Vec2;
use serde::Serialize;

use super::catalog::PowerUpKind;
use crate::physics::point_circle;

/// Vertical bob amplitude in pixels
const BOB_AMPLITUDE: f32 = 3.0;
const BOB_SPEED: f32 = 0.1;

/// A collectible power-up on screen
#[derive(Debug, Clone, Serialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub radius: f32,
    pub fall_speed: f32,
    pub collected: bool,
    /// Draw offset for the bob animation
    pub bob: f32,
    age: f32,
}

impl PowerUp {
    pub fn new(id: u32, kind: PowerUpKind, x: f32, fall_speed: f32) -> Self {
        let radius = kind.spec().radius;
        Self {
            id,
            kind,
            pos: Vec2::new(x, -radius),
            radius,
            fall_speed,
            collected: false,
            bob: 0.0,
            age: 0.0,
        }
    }

    pub fn update(&mut self, dt_factor: f32) {
        if self.collected {
            return;
        }
        self.age += dt_factor;
        self.pos.y += self.fall_speed * dt_factor;
        self.bob = (self.age * BOB_SPEED).sin() * BOB_AMPLITUDE;
    }

    /// Circular hit-test
    pub fn contains(&self, point: Vec2) -> bool {
        !self.collected && point_circle(point, self.pos, self.radius)
    }

    pub fn is_off_screen(&self, canvas_height: f32) -> bool {
        self.pos.y - self.radius > canvas_height
    }
}

/// Activation state of one power-up kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerUpTimer {
    pub active: bool,
    pub time_left_ms: f32,
    pub multiplier: f32,
}

impl Default for PowerUpTimer {
    fn default() -> Self {
        Self {
            active: false,
            time_left_ms: 0.0,
            multiplier: 1.0,
        }
    }
}

/// Timers for every power-up kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PowerUpTimers {
    slots: [PowerUpTimer; PowerUpKind::COUNT],
}

impl PowerUpTimers {
    pub fn get(&self, kind: PowerUpKind) -> &PowerUpTimer {
        &self.slots[kind.index()]
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.get(kind).active
    }

    /// Start (or restart) a power-up; the timer resets, effects never stack
    pub fn activate(&mut self, kind: PowerUpKind) {
        let spec = kind.spec();
        self.slots[kind.index()] = PowerUpTimer {
            active: true,
            time_left_ms: spec.duration_ms,
            multiplier: spec.multiplier,
        };
    }

    /// Count down every active timer; returns kinds that ran out this tick
    pub fn tick(&mut self, dt_ms: f32) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        for kind in PowerUpKind::ALL {
            let slot = &mut self.slots[kind.index()];
            if !slot.active {
                continue;
            }
            slot.time_left_ms -= dt_ms;
            if slot.time_left_ms <= 0.0 {
                *slot = PowerUpTimer::default();
                expired.push(kind);
            }
        }
        expired
    }

    /// Fall speed factor (speed boost slows ingredients)
    pub fn speed_multiplier(&self) -> f32 {
        let slot = self.get(PowerUpKind::SpeedBoost);
        if slot.active { slot.multiplier } else { 1.0 }
    }

    /// Score factor (2 while the score multiplier runs)
    pub fn score_multiplier(&self) -> f32 {
        let slot = self.get(PowerUpKind::ScoreMultiplier);
        if slot.active { slot.multiplier } else { 1.0 }
    }

    pub fn time_frozen(&self) -> bool {
        self.is_active(PowerUpKind::TimeFreeze)
    }

    pub fn active_kinds(&self) -> impl Iterator<Item = PowerUpKind> + '_ {
        PowerUpKind::ALL.into_iter().filter(|kind| self.is_active(*kind))
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_hit_test() {
        let mut power_up = PowerUp::new(1, PowerUpKind::TimeFreeze, 100.0, 1.5);
        power_up.pos = Vec2::new(100.0, 100.0);
        assert!(power_up.contains(Vec2::new(100.0 + power_up.radius, 100.0)));
        // Inside the bounding box, outside the circle
        let corner = power_up.radius * 0.9;
        assert!(!power_up.contains(Vec2::new(100.0 + corner, 100.0 + corner)));
    }

    #[test]
    fn test_falls_off_screen() {
        let mut power_up = PowerUp::new(1, PowerUpKind::SpeedBoost, 100.0, 10.0);
        for _ in 0..100 {
            power_up.update(1.0);
        }
        assert!(power_up.is_off_screen(600.0));
    }

    #[test]
    fn test_reactivation_resets_without_stacking() {
        let mut timers = PowerUpTimers::default();
        timers.activate(PowerUpKind::ScoreMultiplier);
        timers.tick(4000.0);
        timers.activate(PowerUpKind::ScoreMultiplier);
        let slot = timers.get(PowerUpKind::ScoreMultiplier);
        assert_eq!(slot.time_left_ms, 10_000.0);
        assert_eq!(slot.multiplier, 2.0);
        assert_eq!(timers.score_multiplier(), 2.0);
    }

    #[test]
    fn test_expiry_restores_defaults() {
        let mut timers = PowerUpTimers::default();
        timers.activate(PowerUpKind::SpeedBoost);
        assert_eq!(timers.speed_multiplier(), 0.5);
        assert!(timers.tick(4999.0).is_empty());
        assert_eq!(timers.tick(2.0), vec![PowerUpKind::SpeedBoost]);
        assert_eq!(timers.speed_multiplier(), 1.0);
        assert_eq!(timers.active_kinds().count(), 0);
    }

    #[test]
    fn test_time_freeze_flag() {
        let mut timers = PowerUpTimers::default();
        assert!(!timers.time_frozen());
        timers.activate(PowerUpKind::TimeFreeze);
        assert!(timers.time_frozen());
        timers.clear();
        assert!(!timers.time_frozen());
    }
}
