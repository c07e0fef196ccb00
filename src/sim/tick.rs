//! Per-tick simulation
//!
//! `Simulation` owns the state, the pools, the physics helper and the RNG.
//! A tick runs in three parts so the host can dispatch queued input between
//! the world update and the effect decay:
//!
//! 1. `begin_tick`: timers, spawning, update-and-cull
//! 2. clicks (`click_power_up` / `click_ingredient`)
//! 3. `end_tick`: screen effect decay
//!
//! `step` runs all three for headless callers.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::catalog::{IngredientKind, ParticleKind, PowerUpKind};
use super::events::GameEvent;
use super::ingredient::{Ingredient, IngredientArgs, TickContext};
use super::order::{CheckResult, Order};
use super::particle::{Particle, ParticleArgs, PopupText};
use super::powerup::PowerUp;
use super::state::{Collection, GameState, Phase};
use crate::audio::SoundCue;
use crate::error::Result;
use crate::perf::{PerformanceLevel, QualitySettings};
use crate::persistence::HighScoreStore;
use crate::physics::Physics;
use crate::pool::{ObjectPool, PoolStats};
use crate::renderer::{FrameView, OrderView, PowerUpView, UiState};
use crate::settings::{GameConfig, Settings};

/// Decay per reference frame (fast shake, slower flash)
const SHAKE_DECAY: f32 = 0.9;
const FLASH_DECAY: f32 = 0.95;
const EFFECT_EPSILON: f32 = 0.01;

const SUCCESS_PARTICLES: usize = 6;
const ERROR_PARTICLES: usize = 5;
const CELEBRATION_PARTICLES: usize = 14;
const POWER_UP_PARTICLES: usize = 10;

const SUCCESS_COLOR: u32 = 0x8B_E0_4E;
const ERROR_COLOR: u32 = 0xFF_45_45;
const POPUP_COLOR: u32 = 0xFF_D5_4F;
const CELEBRATION_COLOR: u32 = 0xFF_8A_65;

/// Points for a correct ingredient
///
/// `floor((base + floor(time_left_s)) * combo * multiplier)`
pub fn ingredient_points(base_points: u64, time_left_ms: f32, combo: u32, multiplier: f32) -> u64 {
    let secs = (time_left_ms.max(0.0) / 1000.0).floor() as u64;
    ((base_points + secs) as f64 * combo as f64 * multiplier as f64).floor() as u64
}

/// Bonus for completing an order: `floor(bonus * combo * multiplier)`
pub fn order_bonus(completion_bonus: u64, combo: u32, multiplier: f32) -> u64 {
    (completion_bonus as f64 * combo as f64 * multiplier as f64).floor() as u64
}

/// Result of catching an ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CatchOutcome {
    Correct { order_id: u32, points: u64 },
    Completed { order_id: u32, points: u64, bonus: u64 },
    /// Orders exist but none wanted this ingredient
    Wrong,
    /// No orders at all; the ingredient is simply consumed
    NoOrders,
}

/// Current screen effect intensities (0..1)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScreenEffects {
    pub shake: f32,
    pub flash: f32,
}

/// Player-controlled effect toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectOptions {
    pub shake: bool,
    pub flash: bool,
    pub particles: bool,
}

impl Default for EffectOptions {
    fn default() -> Self {
        Self {
            shake: true,
            flash: true,
            particles: true,
        }
    }
}

impl EffectOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            shake: settings.effective_screen_shake(),
            flash: settings.effective_screen_flash(),
            particles: settings.particles,
        }
    }
}

/// The game world and everything needed to advance it
pub struct Simulation {
    pub state: GameState,
    config: GameConfig,
    physics: Physics,
    ingredient_pool: ObjectPool<Ingredient>,
    particle_pool: ObjectPool<Particle>,
    rng: Pcg32,
    effects: ScreenEffects,
    options: EffectOptions,
    quality: QualitySettings,
    cues: Vec<SoundCue>,
    /// Elapsed run time in reference frames (drives sway)
    time: f32,
}

impl Simulation {
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let physics = Physics::new(config.physics, config.canvas_width, config.canvas_height);
        let mut sim = Self {
            state: GameState::new(&config),
            ingredient_pool: ObjectPool::new(config.ingredient_pool_size),
            particle_pool: ObjectPool::new(config.particle_pool_size),
            physics,
            rng: Pcg32::seed_from_u64(seed),
            effects: ScreenEffects::default(),
            options: EffectOptions::default(),
            quality: PerformanceLevel::High.quality(),
            cues: Vec::new(),
            time: 0.0,
            config,
        };
        sim.apply_particle_cap();
        Ok(sim)
    }

    pub fn set_store(&mut self, store: Box<dyn HighScoreStore>) {
        self.state.set_store(store);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn effects(&self) -> ScreenEffects {
        self.effects
    }

    pub fn quality(&self) -> QualitySettings {
        self.quality
    }

    /// (ingredient pool, particle pool)
    pub fn pool_stats(&self) -> (PoolStats, PoolStats) {
        (self.ingredient_pool.stats(), self.particle_pool.stats())
    }

    pub fn set_options(&mut self, options: EffectOptions) {
        self.options = options;
        if !options.shake {
            self.effects.shake = 0.0;
        }
        if !options.flash {
            self.effects.flash = 0.0;
        }
        self.apply_particle_cap();
    }

    /// Apply a quality bundle from the performance monitor
    pub fn set_quality(&mut self, quality: QualitySettings) {
        self.quality = quality;
        self.apply_particle_cap();
    }

    fn apply_particle_cap(&mut self) {
        let cap = if self.options.particles {
            self.config.max_particles.min(self.quality.max_particles)
        } else {
            0
        };
        let trimmed = self.state.set_particle_cap(cap);
        self.particle_pool.release_all(trimmed);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            log::warn!("Ignoring resize to {width}x{height}");
            return;
        }
        self.config.canvas_width = width;
        self.config.canvas_height = height;
        self.physics.set_bounds(width, height);
    }

    // === Lifecycle ===

    /// Return every live pooled entity to its pool
    pub fn release_all(&mut self) {
        self.ingredient_pool
            .release_all(self.state.ingredients.drain(..));
        self.particle_pool.release_all(self.state.particles.drain(..));
    }

    /// Release everything and begin a fresh run
    pub fn start(&mut self) {
        self.release_all();
        self.state.start_game();
        self.effects = ScreenEffects::default();
        self.cues.clear();
        self.time = 0.0;
    }

    /// Cues queued since the last drain
    pub fn drain_cues(&mut self) -> std::vec::Drain<'_, SoundCue> {
        self.cues.drain(..)
    }

    // === Tick ===

    /// Timers, spawning and update-and-cull. Returns false when not running.
    pub fn begin_tick(&mut self, dt_ms: f32) -> bool {
        if !self.state.is_running() {
            return false;
        }
        let dt_factor = Physics::dt_factor(dt_ms);
        let dt_ms = dt_factor * crate::consts::REFERENCE_FRAME_MS;
        self.state.frame_count += 1;
        self.time += dt_factor;

        self.update_timers(dt_ms);
        if !self.state.is_running() {
            return false;
        }
        self.spawn_entities();
        self.update_entities(dt_ms, dt_factor);
        true
    }

    /// Decay screen effects
    pub fn end_tick(&mut self, dt_ms: f32) {
        let dt_factor = Physics::dt_factor(dt_ms);
        self.effects.shake *= SHAKE_DECAY.powf(dt_factor);
        if self.effects.shake < EFFECT_EPSILON {
            self.effects.shake = 0.0;
        }
        self.effects.flash *= FLASH_DECAY.powf(dt_factor);
        if self.effects.flash < EFFECT_EPSILON {
            self.effects.flash = 0.0;
        }
    }

    /// Full tick with the given clicks resolved in between
    pub fn step(&mut self, dt_ms: f32, clicks: &[Vec2]) {
        if self.begin_tick(dt_ms) {
            for pos in clicks {
                self.click(*pos);
            }
        }
        self.end_tick(dt_ms);
    }

    fn update_timers(&mut self, dt_ms: f32) {
        self.state.tick_power_ups(dt_ms);

        let frozen = self.state.power_up_timers.time_frozen();
        let mut expired = Vec::new();
        for order in self.state.orders.iter_mut() {
            if order.update(dt_ms, frozen) {
                expired.push(order.id);
            }
        }
        for id in expired {
            self.expire_order(id);
            if !self.state.is_running() {
                break;
            }
        }
    }

    fn expire_order(&mut self, id: u32) {
        if let Err(err) = self.state.remove_order(id) {
            log::warn!("Order expiry skipped: {err}");
            return;
        }
        self.state.stats.orders_expired += 1;
        self.state.events.emit(GameEvent::OrderExpired { id });
        self.cues.push(SoundCue::OrderExpired);

        if self.state.lose_life() {
            self.cues.push(SoundCue::GameOver);
            self.state.end_game();
        } else {
            self.cues.push(SoundCue::LifeLost);
        }
    }

    fn spawn_entities(&mut self) {
        let frame = self.state.frame_count;

        let since_ingredient = frame.saturating_sub(self.state.timing.last_ingredient_spawn);
        if since_ingredient >= self.state.timing.spawn_rate as u64 {
            let kind = self.pick_ingredient_kind();
            self.spawn_ingredient(kind);
            self.state.timing.last_ingredient_spawn = frame;
        }

        if self.state.orders.len() < self.config.max_orders
            && (self.state.orders.is_empty()
                || self.rng.random_bool(self.config.order_spawn_chance as f64))
        {
            let id = self.state.next_id();
            let order = Order::generate(&mut self.rng, id, &self.config, self.state.level);
            self.state.add_order(order);
        }

        let since_power_up = frame.saturating_sub(self.state.timing.last_power_up_spawn);
        if since_power_up >= self.config.power_up_interval_frames
            && self.state.power_ups.len() < self.config.max_concurrent_power_ups
            && self
                .rng
                .random_bool(self.config.power_up_spawn_chance as f64)
        {
            let kind = PowerUpKind::ALL[self.rng.random_range(0..PowerUpKind::COUNT)];
            self.spawn_power_up(kind);
            self.state.timing.last_power_up_spawn = frame;
        }
    }

    /// Ingredient kind for the next spawn, biased toward what orders need
    fn pick_ingredient_kind(&mut self) -> IngredientKind {
        if self
            .rng
            .random_bool(self.config.needed_ingredient_bias as f64)
        {
            let needed = self
                .state
                .orders
                .iter()
                .filter_map(Order::next_needed)
                .count();
            if needed > 0 {
                let pick = self.rng.random_range(0..needed);
                if let Some(kind) = self
                    .state
                    .orders
                    .iter()
                    .filter_map(Order::next_needed)
                    .nth(pick)
                {
                    return kind;
                }
            }
        }
        IngredientKind::ALL[self.rng.random_range(0..IngredientKind::ALL.len())]
    }

    /// Spawn one ingredient; returns its id
    pub fn spawn_ingredient(&mut self, kind: IngredientKind) -> u32 {
        // Evict before acquiring so the evicted instance can be reused
        if let Some(evicted) = self.state.make_room_for_ingredient() {
            self.ingredient_pool.release(evicted);
        }
        let id = self.state.next_id();
        let mut args =
            IngredientArgs::roll(&mut self.rng, id, kind, &self.config, self.state.score);
        args.trail_length =
            (args.trail_length as f32 * self.quality.detail_multiplier).round() as usize;
        let ingredient = self.ingredient_pool.acquire(args);
        if let Some(evicted) = self.state.push_ingredient(ingredient) {
            self.ingredient_pool.release(evicted);
        }
        id
    }

    /// Spawn by catalog name; unknown names are an error
    pub fn spawn_ingredient_named(&mut self, name: &str) -> Result<u32> {
        let kind: IngredientKind = name.parse()?;
        Ok(self.spawn_ingredient(kind))
    }

    pub fn spawn_power_up(&mut self, kind: PowerUpKind) -> u32 {
        let id = self.state.next_id();
        let radius = kind.spec().radius;
        let max_x = (self.config.canvas_width - radius).max(radius);
        let x = if max_x > radius {
            self.rng.random_range(radius..max_x)
        } else {
            radius
        };
        self.state
            .add_power_up(PowerUp::new(id, kind, x, self.config.power_up_fall_speed));
        id
    }

    pub fn spawn_power_up_named(&mut self, name: &str) -> Result<u32> {
        let kind: PowerUpKind = name.parse()?;
        Ok(self.spawn_power_up(kind))
    }

    /// Add a specific order (scripted play, tests)
    pub fn push_order(&mut self, recipe: Vec<IngredientKind>, time_limit_ms: f32) -> u32 {
        let id = self.state.next_id();
        self.state.add_order(Order::new(id, recipe, time_limit_ms));
        id
    }

    fn update_entities(&mut self, dt_ms: f32, dt_factor: f32) {
        let height = self.config.canvas_height;

        let ctx = TickContext {
            physics: &self.physics,
            dt_factor,
            speed_multiplier: self.state.power_up_timers.speed_multiplier(),
            fall_ramp_step: self.config.fall_ramp_step,
            sway_amplitude: self.config.sway_amplitude,
            sway_frequency: self.config.sway_frequency,
            time: self.time,
        };
        let margin = self.config.offscreen_margin;
        let mut i = 0;
        while i < self.state.ingredients.len() {
            let ingredient = &mut self.state.ingredients[i];
            ingredient.update(&ctx);
            if ingredient.is_off_screen(height, margin) {
                let missed = self.state.ingredients.remove(i);
                self.ingredient_pool.release(missed);
            } else {
                i += 1;
            }
        }

        for power_up in self.state.power_ups.iter_mut() {
            power_up.update(dt_factor);
        }
        self.state.power_ups.retain(|p| !p.is_off_screen(height));

        let mut i = 0;
        while i < self.state.particles.len() {
            let particle = &mut self.state.particles[i];
            particle.update(dt_ms);
            if particle.is_dead() {
                let dead = self.state.particles.remove(i);
                self.particle_pool.release(dead);
            } else {
                i += 1;
            }
        }
    }

    // === Particles ===

    fn spawn_particle(&mut self, args: ParticleArgs) {
        if self.state.capacity(Collection::Particles) == 0 {
            return;
        }
        if let Some(evicted) = self.state.make_room_for_particle() {
            self.particle_pool.release(evicted);
        }
        let particle = self.particle_pool.acquire(args);
        if let Some(evicted) = self.state.push_particle(particle) {
            self.particle_pool.release(evicted);
        }
    }

    fn burst(&mut self, kind: ParticleKind, center: Vec2, color: u32, count: usize, speed: f32) {
        let scaled = if self.quality.effects {
            (count as f32 * self.quality.detail_multiplier).ceil() as usize
        } else {
            1
        };
        for _ in 0..scaled {
            let args = ParticleArgs::scatter(&mut self.rng, kind, center, color, speed);
            self.spawn_particle(args);
        }
    }

    // === Clicks ===

    /// Power-ups first, then ingredients; true if something was hit
    pub fn click(&mut self, pos: Vec2) -> bool {
        self.click_power_up(pos) || self.click_ingredient(pos).is_some()
    }

    /// Collect the topmost power-up under `pos`
    pub fn click_power_up(&mut self, pos: Vec2) -> bool {
        if !self.state.is_running() {
            return false;
        }
        let Some(id) = self
            .state
            .power_ups
            .iter()
            .rev()
            .find(|p| p.contains(pos))
            .map(|p| p.id)
        else {
            return false;
        };
        match self.state.remove_power_up(id) {
            Ok(power_up) => {
                self.collect_power_up(power_up);
                true
            }
            Err(err) => {
                log::warn!("Power-up click skipped: {err}");
                false
            }
        }
    }

    fn collect_power_up(&mut self, power_up: PowerUp) {
        let spec = power_up.kind.spec();
        self.state.activate_power_up(power_up.kind);
        if self.options.flash {
            self.effects.flash = 1.0;
        }
        self.burst(
            ParticleKind::Celebration,
            power_up.pos,
            spec.color,
            POWER_UP_PARTICLES,
            5.0,
        );
        self.spawn_particle(ParticleArgs::popup(
            power_up.pos,
            PopupText::Label(spec.label),
            spec.color,
        ));
        self.cues.push(SoundCue::PowerUpActivate(power_up.kind));
    }

    /// Catch the topmost ingredient under `pos`
    pub fn click_ingredient(&mut self, pos: Vec2) -> Option<CatchOutcome> {
        if !self.state.is_running() {
            return None;
        }
        let id = self
            .state
            .ingredients
            .iter()
            .rev()
            .find(|i| i.contains(pos))
            .map(|i| i.id)?;
        let ingredient = match self.state.remove_ingredient(id) {
            Ok(ingredient) => ingredient,
            Err(err) => {
                log::warn!("Ingredient click skipped: {err}");
                return None;
            }
        };
        let (kind, at) = (ingredient.kind, ingredient.pos);
        self.ingredient_pool.release(ingredient);
        Some(self.resolve_catch(kind, at))
    }

    /// Score a caught ingredient against the orders (first match wins)
    pub fn resolve_catch(&mut self, kind: IngredientKind, at: Vec2) -> CatchOutcome {
        if self.state.orders.is_empty() {
            return CatchOutcome::NoOrders;
        }

        let mut hit = None;
        for order in self.state.orders.iter_mut() {
            let result = order.check_ingredient(kind);
            if result != CheckResult::Wrong {
                hit = Some((order.id, order.time_left_ms, result == CheckResult::Completed));
                break;
            }
        }

        let Some((order_id, time_left_ms, completed)) = hit else {
            self.wrong_catch(at);
            return CatchOutcome::Wrong;
        };

        let multiplier = self.state.power_up_timers.score_multiplier();
        let points = ingredient_points(
            self.config.base_points,
            time_left_ms,
            self.state.combo,
            multiplier,
        );
        self.state.stats.ingredients_caught += 1;
        let mut levels = self.state.add_score(points);

        let outcome = if completed {
            self.state.increase_combo(self.config.combo_complete_bonus);
            let bonus = order_bonus(self.config.completion_bonus, self.state.combo, multiplier);
            levels += self.state.add_score(bonus);
            if let Err(err) = self.state.remove_order(order_id) {
                log::warn!("Completed order already gone: {err}");
            }
            self.state.stats.orders_completed += 1;
            self.state
                .events
                .emit(GameEvent::OrderCompleted { id: order_id, bonus });

            self.burst(
                ParticleKind::Celebration,
                at,
                CELEBRATION_COLOR,
                CELEBRATION_PARTICLES,
                6.0,
            );
            self.spawn_particle(ParticleArgs::popup(
                at,
                PopupText::Points(points + bonus),
                POPUP_COLOR,
            ));
            self.cues.push(SoundCue::OrderComplete);
            CatchOutcome::Completed {
                order_id,
                points,
                bonus,
            }
        } else {
            self.state.increase_combo(1);
            self.burst(ParticleKind::Star, at, SUCCESS_COLOR, SUCCESS_PARTICLES, 3.0);
            self.spawn_particle(ParticleArgs::popup(at, PopupText::Points(points), POPUP_COLOR));
            self.cues.push(SoundCue::Collect);
            CatchOutcome::Correct { order_id, points }
        };

        if levels > 0 {
            self.cues.push(SoundCue::LevelUp);
        }
        outcome
    }

    fn wrong_catch(&mut self, at: Vec2) {
        self.state.reset_combo();
        self.state.stats.wrong_catches += 1;
        if self.options.shake {
            self.effects.shake = 1.0;
        }
        self.burst(ParticleKind::Triangle, at, ERROR_COLOR, ERROR_PARTICLES, 2.5);
        self.cues.push(SoundCue::Error);
    }

    // === Views ===

    pub fn frame_view(&self) -> FrameView<'_> {
        FrameView {
            width: self.config.canvas_width,
            height: self.config.canvas_height,
            frame: self.state.frame_count,
            ingredients: &self.state.ingredients,
            particles: &self.state.particles,
            power_ups: &self.state.power_ups,
            orders: &self.state.orders,
            screen_shake: self.effects.shake,
            screen_flash: self.effects.flash,
            quality: self.quality,
        }
    }

    pub fn ui_state(&self, fps: f32, performance: PerformanceLevel) -> UiState {
        let state = &self.state;
        UiState {
            phase: state.phase,
            score: state.score,
            high_score: state.high_score,
            lives: state.lives,
            combo: state.combo,
            level: state.level,
            fps,
            performance,
            orders: state
                .orders
                .iter()
                .map(|order| OrderView {
                    id: order.id,
                    recipe: order.recipe.clone(),
                    cursor: order.cursor,
                    time_left_secs: order.time_left_secs(),
                    urgency: order.time_fraction(),
                })
                .collect(),
            power_ups: state
                .power_up_timers
                .active_kinds()
                .map(|kind| PowerUpView {
                    kind,
                    label: kind.spec().label,
                    time_left_ms: state.power_up_timers.get(kind).time_left_ms,
                })
                .collect(),
            stats: state.stats,
        }
    }

    /// Where a demo player would click next
    ///
    /// Prefers a power-up, then the lowest on-screen ingredient that some
    /// order needs next.
    pub fn autoplay_target(&self) -> Option<Vec2> {
        if self.state.phase != Phase::Running {
            return None;
        }
        if let Some(power_up) = self.state.power_ups.iter().find(|p| p.pos.y > 0.0) {
            return Some(power_up.pos);
        }
        self.state
            .ingredients
            .iter()
            .filter(|i| i.pos.y > 0.0)
            .filter(|i| {
                self.state
                    .orders
                    .iter()
                    .any(|o| o.next_needed() == Some(i.kind))
            })
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|i| i.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MAX_COMBO, MIN_COMBO, REFERENCE_FRAME_MS};
    use crate::error::GameError;
    use crate::sim::events::EventKind;
    use IngredientKind::*;

    fn sim() -> Simulation {
        let mut sim = Simulation::new(GameConfig::default(), 42).unwrap();
        sim.start();
        sim
    }

    #[test]
    fn test_scoring_formula() {
        // Score multiplier active, combo 3, 15 s left
        assert_eq!(ingredient_points(10, 15_000.0, 3, 2.0), 150);
        assert_eq!(ingredient_points(10, 15_999.0, 1, 1.0), 25);
        assert_eq!(order_bonus(100, 8, 1.0), 800);
    }

    #[test]
    fn test_multiplier_scenario_through_catch() {
        let mut sim = sim();
        sim.state.activate_power_up(PowerUpKind::ScoreMultiplier);
        sim.state.increase_combo(2);
        assert_eq!(sim.state.combo, 3);
        sim.push_order(vec![BunBottom, Patty, BunTop], 15_000.0);

        let outcome = sim.resolve_catch(BunBottom, Vec2::ZERO);
        assert!(matches!(outcome, CatchOutcome::Correct { points: 150, .. }));
        assert_eq!(sim.state.score, 150);
    }

    #[test]
    fn test_empty_orders_click_changes_nothing() {
        let mut sim = sim();
        assert!(sim.state.orders.is_empty());
        let id = sim.spawn_ingredient(Patty);
        sim.state.ingredients[0].pos = Vec2::new(200.0, 200.0);

        let outcome = sim.click_ingredient(Vec2::new(200.0, 200.0));
        assert_eq!(outcome, Some(CatchOutcome::NoOrders));
        assert_eq!(sim.state.score, 0);
        assert_eq!(sim.state.combo, MIN_COMBO);
        assert!(sim.state.ingredients.iter().all(|i| i.id != id));
        assert!(sim.drain_cues().next().is_none());
    }

    #[test]
    fn test_three_step_burger() {
        let mut sim = sim();
        let id = sim.push_order(vec![BunBottom, Patty, BunTop], 20_000.0);

        assert_eq!(
            sim.resolve_catch(BunBottom, Vec2::ZERO),
            CatchOutcome::Correct {
                order_id: id,
                points: 30
            }
        );
        assert_eq!(
            sim.resolve_catch(Patty, Vec2::ZERO),
            CatchOutcome::Correct {
                order_id: id,
                points: 60
            }
        );
        // combo 3 -> 8 before the bonus is computed
        assert_eq!(
            sim.resolve_catch(BunTop, Vec2::ZERO),
            CatchOutcome::Completed {
                order_id: id,
                points: 90,
                bonus: 800
            }
        );
        assert!(sim.state.orders.is_empty());
        assert_eq!(sim.state.combo, 8);
        assert_eq!(sim.state.score, 30 + 60 + 90 + 800);
        assert_eq!(sim.state.stats.orders_completed, 1);
        assert_eq!(sim.state.events.emitted(EventKind::OrderCompleted), 1);

        let cues: Vec<_> = sim.drain_cues().collect();
        assert_eq!(cues.last(), Some(&SoundCue::LevelUp));
        assert!(cues.contains(&SoundCue::OrderComplete));
    }

    #[test]
    fn test_completion_combo_caps() {
        let mut sim = sim();
        sim.state.increase_combo(7);
        sim.push_order(vec![BunTop], 20_000.0);
        let outcome = sim.resolve_catch(BunTop, Vec2::ZERO);
        assert_eq!(sim.state.combo, MAX_COMBO);
        assert!(matches!(outcome, CatchOutcome::Completed { bonus: 1000, .. }));
    }

    #[test]
    fn test_first_matching_order_wins() {
        let mut sim = sim();
        let first = sim.push_order(vec![BunBottom, Cheese, BunTop], 20_000.0);
        sim.push_order(vec![BunBottom, Patty, BunTop], 20_000.0);

        let outcome = sim.resolve_catch(BunBottom, Vec2::ZERO);
        assert!(matches!(outcome, CatchOutcome::Correct { order_id, .. } if order_id == first));
        assert_eq!(sim.state.orders[0].cursor, 1);
        assert_eq!(sim.state.orders[1].cursor, 0);

        // Patty only matches the second order
        sim.resolve_catch(BunBottom, Vec2::ZERO);
        let outcome = sim.resolve_catch(Patty, Vec2::ZERO);
        assert!(matches!(outcome, CatchOutcome::Correct { .. }));
    }

    #[test]
    fn test_wrong_catch_resets_combo_and_shakes() {
        let mut sim = sim();
        sim.push_order(vec![BunBottom, BunTop], 20_000.0);
        sim.state.increase_combo(4);

        assert_eq!(sim.resolve_catch(Pickle, Vec2::ZERO), CatchOutcome::Wrong);
        assert_eq!(sim.state.combo, MIN_COMBO);
        assert_eq!(sim.effects().shake, 1.0);
        assert_eq!(sim.state.score, 0);
        assert_eq!(sim.state.orders[0].cursor, 0);
        assert_eq!(sim.drain_cues().collect::<Vec<_>>(), vec![SoundCue::Error]);

        sim.end_tick(REFERENCE_FRAME_MS);
        assert!(sim.effects().shake < 1.0);
    }

    #[test]
    fn test_shake_respects_options() {
        let mut sim = sim();
        sim.set_options(EffectOptions {
            shake: false,
            ..EffectOptions::default()
        });
        sim.push_order(vec![BunBottom], 20_000.0);
        sim.resolve_catch(Bacon, Vec2::ZERO);
        assert_eq!(sim.effects().shake, 0.0);
    }

    #[test]
    fn test_last_life_order_expiry_ends_game_once() {
        let mut sim = sim();
        sim.state.lives = 1;
        sim.push_order(vec![BunBottom, BunTop], 100.0);
        sim.push_order(vec![BunBottom, BunTop], 100.0);

        for _ in 0..20 {
            sim.step(REFERENCE_FRAME_MS, &[]);
        }
        assert_eq!(sim.state.lives, 0);
        assert_eq!(sim.state.phase, Phase::Ended);
        assert_eq!(sim.state.events.emitted(EventKind::GameOver), 1);
        assert_eq!(sim.state.events.emitted(EventKind::GameEnded), 1);
        let cues: Vec<_> = sim.drain_cues().collect();
        assert_eq!(cues.iter().filter(|c| **c == SoundCue::GameOver).count(), 1);
    }

    #[test]
    fn test_time_freeze_stops_order_timers() {
        let mut sim = sim();
        sim.push_order(vec![BunBottom, BunTop], 10_000.0);
        sim.state.activate_power_up(PowerUpKind::TimeFreeze);
        for _ in 0..30 {
            sim.step(REFERENCE_FRAME_MS, &[]);
        }
        let order = &sim.state.orders[0];
        assert_eq!(order.time_left_ms, 10_000.0);
    }

    #[test]
    fn test_power_up_click_activates() {
        let mut sim = sim();
        let id = sim.spawn_power_up(PowerUpKind::SpeedBoost);
        sim.state.power_ups[0].pos = Vec2::new(300.0, 300.0);
        sim.spawn_ingredient(Patty);
        sim.state.ingredients[0].pos = Vec2::new(300.0, 300.0);

        // Power-up takes precedence over the ingredient underneath
        assert!(sim.click(Vec2::new(300.0, 300.0)));
        assert!(sim.state.power_ups.iter().all(|p| p.id != id));
        assert_eq!(sim.state.ingredients.len(), 1);
        assert!(sim.state.power_up_timers.is_active(PowerUpKind::SpeedBoost));
        assert_eq!(sim.effects().flash, 1.0);
        assert_eq!(
            sim.drain_cues().collect::<Vec<_>>(),
            vec![SoundCue::PowerUpActivate(PowerUpKind::SpeedBoost)]
        );
    }

    #[test]
    fn test_newest_ingredient_is_hit_first() {
        let mut sim = sim();
        let old = sim.spawn_ingredient(Patty);
        let new = sim.spawn_ingredient(Cheese);
        for ingredient in sim.state.ingredients.iter_mut() {
            ingredient.pos = Vec2::new(100.0, 100.0);
        }
        sim.click_ingredient(Vec2::new(100.0, 100.0));
        assert_eq!(sim.state.ingredients.len(), 1);
        assert_eq!(sim.state.ingredients[0].id, old);
        assert_ne!(old, new);
    }

    #[test]
    fn test_named_spawns_fail_fast() {
        let mut sim = sim();
        assert!(sim.spawn_ingredient_named("lettuce").is_ok());
        assert_eq!(
            sim.spawn_ingredient_named("kale"),
            Err(GameError::UnknownIngredient("kale".into()))
        );
        assert!(matches!(
            sim.spawn_power_up_named("shield"),
            Err(GameError::UnknownPowerUp(_))
        ));
    }

    #[test]
    fn test_difficulty_captured_at_spawn() {
        let mut easy = sim();
        let mut hard = sim();
        hard.state.score = 10_000;
        easy.spawn_ingredient(Patty);
        hard.spawn_ingredient(Patty);
        let ratio = hard.state.ingredients[0].speed / easy.state.ingredients[0].speed;
        assert!((ratio - 6.0).abs() < 1e-3);

        // Later score changes do not touch live ingredients
        let before = easy.state.ingredients[0].speed;
        easy.state.add_score(5_000);
        assert_eq!(easy.state.ingredients[0].speed, before);
    }

    #[test]
    fn test_ingredient_cap_recycles_through_pool() {
        let mut sim = sim();
        let cap = sim.config().max_ingredients;
        for _ in 0..cap + 5 {
            sim.spawn_ingredient(Onion);
        }
        assert_eq!(sim.state.ingredients.len(), cap);
        assert_eq!(sim.state.events.emitted(EventKind::LimitEnforced), 5);
        let (ingredients, _) = sim.pool_stats();
        assert_eq!(ingredients.reused, 5);
    }

    #[test]
    fn test_quality_caps_particles() {
        let mut sim = sim();
        sim.push_order(vec![BunTop], 20_000.0);
        sim.resolve_catch(BunTop, Vec2::ZERO);
        assert!(sim.state.particles.len() > 4);

        sim.set_quality(PerformanceLevel::Critical.quality());
        assert!(sim.state.particles.len() <= 4);
        assert!(sim.state.validate().is_empty());
    }

    #[test]
    fn test_restart_returns_entities_to_pools() {
        let mut sim = sim();
        for _ in 0..5 {
            sim.spawn_ingredient(Tomato);
        }
        sim.start();
        assert!(sim.state.ingredients.is_empty());
        let (ingredients, _) = sim.pool_stats();
        assert_eq!(ingredients.available, 5);
    }

    #[test]
    fn test_ticks_spawn_orders_and_ingredients() {
        let mut sim = sim();
        sim.step(REFERENCE_FRAME_MS, &[]);
        assert_eq!(sim.state.orders.len(), 1);
        for _ in 0..sim.config().spawn_rate {
            sim.step(REFERENCE_FRAME_MS, &[]);
        }
        assert!(!sim.state.ingredients.is_empty());
    }

    #[test]
    fn test_paused_sim_does_not_advance() {
        let mut sim = sim();
        sim.state.pause_game();
        sim.step(REFERENCE_FRAME_MS, &[]);
        assert_eq!(sim.state.frame_count, 0);
    }

    #[test]
    fn test_autoplay_run_keeps_invariants() {
        let mut sim = sim();
        let mut caught = 0;
        for _ in 0..6_000 {
            if sim.begin_tick(REFERENCE_FRAME_MS) {
                if let Some(target) = sim.autoplay_target() {
                    if sim.click(target) {
                        caught += 1;
                    }
                }
            }
            sim.end_tick(REFERENCE_FRAME_MS);
            sim.drain_cues().for_each(drop);

            let violations = sim.state.validate();
            assert!(violations.is_empty(), "{violations:?}");
            let caps = sim.state.caps();
            assert!(sim.state.ingredients.len() <= caps.ingredients);
            assert!(sim.state.particles.len() <= caps.particles);
            assert!(sim.state.power_ups.len() <= caps.power_ups);
            assert!(sim.state.orders.len() <= caps.orders);
            if sim.state.phase == Phase::Ended {
                break;
            }
        }
        assert!(caught > 0);
        assert!(sim.state.score > 0);
    }
}
