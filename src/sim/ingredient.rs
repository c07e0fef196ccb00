//! Falling ingredients

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::catalog::IngredientKind;
use crate::ease_in_quad;
use crate::physics::{Physics, Rect, point_rect};
use crate::pool::Poolable;
use crate::settings::GameConfig;

/// Fraction of full speed an ingredient falls at the moment it spawns
const MIN_FALL_RAMP: f32 = 0.25;
/// Alpha multiplier applied to older trail points each tick
const TRAIL_FADE: f32 = 0.7;
/// Maximum spin in radians per reference frame
const MAX_SPIN: f32 = 0.04;

/// Trail point for motion blur (newest first)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub alpha: f32,
}

/// Everything needed to (re)initialize an ingredient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngredientArgs {
    pub id: u32,
    pub kind: IngredientKind,
    /// Horizontal center the ingredient sways around
    pub x: f32,
    /// Fall speed per reference frame, difficulty already applied
    pub speed: f32,
    pub sway_phase: f32,
    pub rotation_speed: f32,
    pub trail_length: usize,
}

impl IngredientArgs {
    /// Roll spawn parameters for `kind`
    ///
    /// Speed varies by ±`speed_variation`, occasionally gets the outlier
    /// multiplier, and is scaled by the score-based difficulty at spawn time.
    pub fn roll(
        rng: &mut impl Rng,
        id: u32,
        kind: IngredientKind,
        config: &GameConfig,
        score: u64,
    ) -> Self {
        let half_width = kind.spec().width / 2.0;
        let max_x = (config.canvas_width - half_width).max(half_width);
        let x = if max_x > half_width {
            rng.random_range(half_width..max_x)
        } else {
            half_width
        };

        let variation = if config.speed_variation > 0.0 {
            rng.random_range(-config.speed_variation..config.speed_variation)
        } else {
            0.0
        };
        let mut speed = config.ingredient_base_speed * (1.0 + variation);
        if rng.random_bool(config.outlier_chance as f64) {
            speed *= config.outlier_multiplier;
        }
        speed *= 1.0 + score as f32 * config.difficulty_increase_rate;

        Self {
            id,
            kind,
            x,
            speed: speed.max(0.0),
            sway_phase: rng.random_range(0.0..std::f32::consts::TAU),
            rotation_speed: rng.random_range(-MAX_SPIN..MAX_SPIN),
            trail_length: config.trail_length,
        }
    }
}

/// Per-tick inputs shared by all ingredients
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub physics: &'a Physics,
    pub dt_factor: f32,
    /// Power-up speed factor, read fresh every tick
    pub speed_multiplier: f32,
    pub fall_ramp_step: f32,
    pub sway_amplitude: f32,
    pub sway_frequency: f32,
    /// Elapsed simulation time in reference frames
    pub time: f32,
}

/// A falling ingredient
#[derive(Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: u32,
    pub kind: IngredientKind,
    /// Center position
    pub pos: Vec2,
    pub size: Vec2,
    pub speed: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub sway_phase: f32,
    /// 0..1 ramp from spawn to full fall speed
    pub fall_progress: f32,
    pub collected: bool,
    pub trail: VecDeque<TrailPoint>,
    base_x: f32,
    trail_length: usize,
}

impl Poolable for Ingredient {
    type Args = IngredientArgs;

    fn create(args: IngredientArgs) -> Self {
        let mut ingredient = Self {
            id: 0,
            kind: args.kind,
            pos: Vec2::ZERO,
            size: Vec2::ZERO,
            speed: 0.0,
            rotation: 0.0,
            rotation_speed: 0.0,
            sway_phase: 0.0,
            fall_progress: 0.0,
            collected: false,
            trail: VecDeque::with_capacity(args.trail_length),
            base_x: 0.0,
            trail_length: 0,
        };
        ingredient.reset(args);
        ingredient
    }

    fn reset(&mut self, args: IngredientArgs) {
        let size = args.kind.size();
        self.id = args.id;
        self.kind = args.kind;
        self.size = size;
        // Start just above the top edge
        self.pos = Vec2::new(args.x, -size.y / 2.0);
        self.base_x = args.x;
        self.speed = args.speed.max(0.0);
        self.rotation = 0.0;
        self.rotation_speed = args.rotation_speed;
        self.sway_phase = args.sway_phase;
        self.fall_progress = 0.0;
        self.collected = false;
        self.trail.clear();
        self.trail_length = args.trail_length;
    }
}

impl Ingredient {
    /// Effective fall speed this tick before the delta-time factor
    pub fn current_speed(&self, speed_multiplier: f32) -> f32 {
        let ramp = MIN_FALL_RAMP + (1.0 - MIN_FALL_RAMP) * ease_in_quad(self.fall_progress);
        self.speed * speed_multiplier.max(0.0) * ramp
    }

    /// Move to `pos`; sway continues around the new x
    pub fn place(&mut self, pos: Vec2) {
        self.pos = pos;
        self.base_x = pos.x;
    }

    /// Advance one tick
    pub fn update(&mut self, ctx: &TickContext<'_>) {
        if self.collected {
            return;
        }
        self.record_trail();

        let vy = self.current_speed(ctx.speed_multiplier);
        self.fall_progress = (self.fall_progress + ctx.fall_ramp_step * ctx.dt_factor).min(1.0);

        let next = ctx
            .physics
            .update_position(self.pos, Vec2::new(0.0, vy), ctx.dt_factor);
        self.pos.y = next.y;
        self.pos.x = ctx.physics.apply_sway(
            self.base_x,
            ctx.time,
            self.sway_phase,
            ctx.sway_amplitude,
            ctx.sway_frequency,
        );
        self.rotation += self.rotation_speed * ctx.dt_factor;
    }

    fn record_trail(&mut self) {
        if self.trail_length == 0 {
            return;
        }
        for point in self.trail.iter_mut() {
            point.alpha *= TRAIL_FADE;
        }
        self.trail.push_front(TrailPoint {
            pos: self.pos,
            alpha: 1.0,
        });
        self.trail.truncate(self.trail_length);
    }

    /// Axis-aligned bounds
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.pos, self.size)
    }

    /// Hit-test a click
    pub fn contains(&self, point: Vec2) -> bool {
        !self.collected && point_rect(point, &self.bounds())
    }

    /// Fully below the playfield plus `margin`
    pub fn is_off_screen(&self, canvas_height: f32, margin: f32) -> bool {
        self.pos.y - self.size.y / 2.0 > canvas_height + margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicsConfig;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn args(kind: IngredientKind) -> IngredientArgs {
        IngredientArgs {
            id: 1,
            kind,
            x: 100.0,
            speed: 2.0,
            sway_phase: 0.0,
            rotation_speed: 0.01,
            trail_length: 4,
        }
    }

    fn ctx(physics: &Physics, speed_multiplier: f32) -> TickContext<'_> {
        TickContext {
            physics,
            dt_factor: 1.0,
            speed_multiplier,
            fall_ramp_step: 0.02,
            sway_amplitude: 0.0,
            sway_frequency: 0.05,
            time: 0.0,
        }
    }

    #[test]
    fn test_falls_and_ramps() {
        let physics = Physics::new(PhysicsConfig::default(), 800.0, 600.0);
        let mut ingredient = Ingredient::create(args(IngredientKind::Patty));
        let start_y = ingredient.pos.y;
        let first = ingredient.current_speed(1.0);
        for _ in 0..60 {
            ingredient.update(&ctx(&physics, 1.0));
        }
        assert!(ingredient.pos.y > start_y);
        assert!(ingredient.current_speed(1.0) > first);
        assert!((ingredient.fall_progress - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_speed_boost_halves_fall() {
        let ingredient = Ingredient::create(args(IngredientKind::Cheese));
        let normal = ingredient.current_speed(1.0);
        let slowed = ingredient.current_speed(0.5);
        assert!((slowed - normal * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_trail_is_bounded_and_fades() {
        let physics = Physics::new(PhysicsConfig::default(), 800.0, 600.0);
        let mut ingredient = Ingredient::create(args(IngredientKind::Tomato));
        for _ in 0..10 {
            ingredient.update(&ctx(&physics, 1.0));
        }
        assert_eq!(ingredient.trail.len(), 4);
        let alphas: Vec<f32> = ingredient.trail.iter().map(|p| p.alpha).collect();
        assert_eq!(alphas[0], 1.0);
        assert!(alphas.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_reset_clears_previous_life() {
        let physics = Physics::new(PhysicsConfig::default(), 800.0, 600.0);
        let mut ingredient = Ingredient::create(args(IngredientKind::Tomato));
        for _ in 0..10 {
            ingredient.update(&ctx(&physics, 1.0));
        }
        ingredient.collected = true;

        ingredient.reset(args(IngredientKind::Bacon));
        assert_eq!(ingredient.kind, IngredientKind::Bacon);
        assert!(ingredient.trail.is_empty());
        assert!(!ingredient.collected);
        assert_eq!(ingredient.fall_progress, 0.0);
        assert_eq!(ingredient.size, IngredientKind::Bacon.size());
    }

    #[test]
    fn test_hit_test_is_box() {
        let mut ingredient = Ingredient::create(args(IngredientKind::Patty));
        ingredient.pos = Vec2::new(100.0, 100.0);
        let half = ingredient.size / 2.0;
        assert!(ingredient.contains(Vec2::new(100.0 + half.x - 0.5, 100.0 - half.y + 0.5)));
        assert!(!ingredient.contains(Vec2::new(100.0 + half.x + 1.0, 100.0)));
        ingredient.collected = true;
        assert!(!ingredient.contains(Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn test_off_screen_uses_margin() {
        let mut ingredient = Ingredient::create(args(IngredientKind::Onion));
        ingredient.pos.y = 600.0 + 40.0;
        assert!(!ingredient.is_off_screen(600.0, 50.0));
        ingredient.pos.y = 600.0 + 50.0 + ingredient.size.y;
        assert!(ingredient.is_off_screen(600.0, 50.0));
    }

    #[test]
    fn test_roll_uses_configured_base_speed() {
        let config = GameConfig {
            ingredient_base_speed: 3.5,
            speed_variation: 0.0,
            outlier_chance: 0.0,
            ..GameConfig::default()
        };
        let mut rng = Pcg32::seed_from_u64(11);
        let rolled = IngredientArgs::roll(&mut rng, 1, IngredientKind::Cheese, &config, 0);
        assert!((rolled.speed - 3.5).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_rolled_speed_is_non_negative(seed in any::<u64>(), score in 0u64..1_000_000) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let config = GameConfig::default();
            for kind in IngredientKind::ALL {
                let rolled = IngredientArgs::roll(&mut rng, 1, kind, &config, score);
                prop_assert!(rolled.speed >= 0.0);
                prop_assert!(rolled.x >= 0.0 && rolled.x <= config.canvas_width);
                prop_assert!(IngredientKind::ALL.contains(&rolled.kind));
            }
        }
    }
}
