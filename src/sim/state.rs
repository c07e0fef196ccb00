//! Canonical game state
//!
//! Score, lives, combo, level, power-up timers and the bounded entity
//! collections all live here. Every mutation that matters to the outside
//! world goes out on the event bus.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::catalog::PowerUpKind;
use super::events::{EventBus, EventKind, GameEvent};
use super::ingredient::Ingredient;
use super::order::Order;
use super::particle::Particle;
use super::powerup::{PowerUp, PowerUpTimers};
use crate::consts::{MAX_COMBO, MAX_LIVES, MIN_COMBO};
use crate::error::{GameError, Result};
use crate::persistence::HighScoreStore;
use crate::settings::GameConfig;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Phase {
    /// Constructed, never started
    #[default]
    Idle,
    Running,
    Paused,
    /// Run over; restartable
    Ended,
}

/// Bounded entity collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Collection {
    Ingredients,
    Particles,
    PowerUps,
    Orders,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Ingredients => "ingredients",
            Collection::Particles => "particles",
            Collection::PowerUps => "power_ups",
            Collection::Orders => "orders",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = GameError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ingredients" => Ok(Collection::Ingredients),
            "particles" => Ok(Collection::Particles),
            "power_ups" | "powerUps" => Ok(Collection::PowerUps),
            "orders" => Ok(Collection::Orders),
            _ => Err(GameError::UnknownCollection(s.to_string())),
        }
    }
}

/// Capacity of each collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caps {
    pub ingredients: usize,
    pub particles: usize,
    pub power_ups: usize,
    pub orders: usize,
}

/// Spawn cadence bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Timing {
    pub last_ingredient_spawn: u64,
    pub last_power_up_spawn: u64,
    /// Frames between ingredient spawns
    pub spawn_rate: u32,
}

/// Level progression rules
#[derive(Debug, Clone, Copy, PartialEq)]
struct LevelRules {
    score_step: u64,
    spawn_rate: u32,
    spawn_rate_step: u32,
    min_spawn_rate: u32,
}

/// Per-run counters for the HUD and end screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub ingredients_caught: u32,
    pub wrong_catches: u32,
    pub orders_completed: u32,
    pub orders_expired: u32,
    pub power_ups_collected: u32,
    pub best_combo: u32,
}

/// Serializable summary for debugging
#[derive(Debug, Clone, Serialize)]
pub struct DebugSnapshot {
    pub phase: Phase,
    pub score: u64,
    pub lives: u8,
    pub combo: u32,
    pub level: u32,
    pub frame_count: u64,
    pub high_score: u64,
    pub ingredients: usize,
    pub particles: usize,
    pub power_ups: usize,
    pub orders: usize,
    pub active_power_ups: Vec<PowerUpKind>,
    pub timing: Timing,
    pub stats: RunStats,
    pub event_counts: Vec<(EventKind, u64)>,
    pub listener_failures: u64,
    pub violations: Vec<String>,
}

/// Canonical mutable game state
pub struct GameState {
    pub phase: Phase,
    pub score: u64,
    pub lives: u8,
    pub combo: u32,
    pub level: u32,
    pub frame_count: u64,
    pub high_score: u64,

    pub ingredients: Vec<Ingredient>,
    pub particles: Vec<Particle>,
    pub power_ups: Vec<PowerUp>,
    pub orders: Vec<Order>,

    pub power_up_timers: PowerUpTimers,
    pub timing: Timing,
    pub stats: RunStats,
    pub events: EventBus,

    caps: Caps,
    rules: LevelRules,
    store: Option<Box<dyn HighScoreStore>>,
    store_warned: bool,
    /// Best score as last persisted
    saved_best: u64,
    high_score_announced: bool,
    game_over_emitted: bool,
    next_id: u32,
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("lives", &self.lives)
            .field("combo", &self.combo)
            .field("level", &self.level)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        let rules = LevelRules {
            score_step: config.level_score_step.max(1),
            spawn_rate: config.spawn_rate,
            spawn_rate_step: config.spawn_rate_step,
            min_spawn_rate: config.min_spawn_rate,
        };
        Self {
            phase: Phase::Idle,
            score: 0,
            lives: MAX_LIVES,
            combo: MIN_COMBO,
            level: 1,
            frame_count: 0,
            high_score: 0,
            ingredients: Vec::with_capacity(config.max_ingredients),
            particles: Vec::with_capacity(config.max_particles),
            power_ups: Vec::with_capacity(config.max_power_ups),
            orders: Vec::with_capacity(config.max_orders),
            power_up_timers: PowerUpTimers::default(),
            timing: Timing {
                last_ingredient_spawn: 0,
                last_power_up_spawn: 0,
                spawn_rate: rules.spawn_rate,
            },
            stats: RunStats::default(),
            events: EventBus::new(),
            caps: Caps {
                ingredients: config.max_ingredients,
                particles: config.max_particles,
                power_ups: config.max_power_ups,
                orders: config.max_orders,
            },
            rules,
            store: None,
            store_warned: false,
            saved_best: 0,
            high_score_announced: false,
            game_over_emitted: false,
            next_id: 1,
        }
    }

    /// Attach best-score storage and load the saved value
    pub fn with_store(config: &GameConfig, store: Box<dyn HighScoreStore>) -> Self {
        let mut state = Self::new(config);
        state.set_store(store);
        state
    }

    pub fn set_store(&mut self, mut store: Box<dyn HighScoreStore>) {
        match store.load() {
            Ok(Some(best)) => {
                self.saved_best = best;
                self.high_score = self.high_score.max(best);
            }
            Ok(None) => {}
            Err(err) => self.warn_store(&err),
        }
        self.store = Some(store);
    }

    fn warn_store(&mut self, err: &dyn std::error::Error) {
        if !self.store_warned {
            self.store_warned = true;
            log::warn!("High score storage unavailable: {err}");
        }
    }

    pub fn caps(&self) -> Caps {
        self.caps
    }

    /// Change the particle cap (quality changes); returns trimmed particles
    pub fn set_particle_cap(&mut self, cap: usize) -> Vec<Particle> {
        self.caps.particles = cap;
        let excess = self.particles.len().saturating_sub(cap);
        self.particles.drain(..excess).collect()
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Fresh entity id
    pub fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    // === Lifecycle ===

    /// Reset everything except the high score and enter `Running`
    ///
    /// A run still in progress is ended first, so it is announced and
    /// persisted like any other. Pooled entities must already have been
    /// taken out of the collections by the caller; anything left here is
    /// dropped.
    pub fn start_game(&mut self) {
        if matches!(self.phase, Phase::Running | Phase::Paused) {
            self.end_game();
        }
        self.score = 0;
        self.lives = MAX_LIVES;
        self.combo = MIN_COMBO;
        self.level = 1;
        self.frame_count = 0;
        self.ingredients.clear();
        self.particles.clear();
        self.power_ups.clear();
        self.orders.clear();
        self.power_up_timers.clear();
        self.timing = Timing {
            last_ingredient_spawn: 0,
            last_power_up_spawn: 0,
            spawn_rate: self.rules.spawn_rate,
        };
        self.stats = RunStats {
            best_combo: MIN_COMBO,
            ..RunStats::default()
        };
        self.high_score_announced = false;
        self.game_over_emitted = false;
        self.phase = Phase::Running;
        log::info!("Game started (best {})", self.high_score);
        self.events.emit(GameEvent::GameStarted);
    }

    pub fn pause_game(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.phase = Phase::Paused;
        self.events.emit(GameEvent::GamePaused);
        true
    }

    pub fn resume_game(&mut self) -> bool {
        if self.phase != Phase::Paused {
            return false;
        }
        self.phase = Phase::Running;
        self.events.emit(GameEvent::GameResumed);
        true
    }

    /// Freeze the run and persist the high score if it improved
    pub fn end_game(&mut self) -> bool {
        if !matches!(self.phase, Phase::Running | Phase::Paused) {
            return false;
        }
        self.phase = Phase::Ended;
        self.high_score = self.high_score.max(self.score);

        let best = self.high_score;
        if best > self.saved_best {
            let result = match self.store.as_mut() {
                Some(store) => store.save(best),
                None => Ok(()),
            };
            match result {
                Ok(()) => self.saved_best = best,
                Err(err) => self.warn_store(&err),
            }
        }

        log::info!(
            "Game ended: score {} (best {}), level {}",
            self.score,
            self.high_score,
            self.level
        );
        self.events.emit(GameEvent::GameEnded {
            score: self.score,
            high_score: self.high_score,
        });
        true
    }

    // === Score, combo, lives ===

    /// Add points; returns the number of levels gained
    pub fn add_score(&mut self, points: u64) -> u32 {
        if points == 0 {
            return 0;
        }
        self.score = self.score.saturating_add(points);
        self.events.emit(GameEvent::ScoreChanged {
            score: self.score,
            delta: points,
        });

        if self.score > self.high_score {
            self.high_score = self.score;
            if !self.high_score_announced {
                self.high_score_announced = true;
                self.events.emit(GameEvent::NewHighScore { score: self.score });
            }
        }

        let level = (1 + self.score / self.rules.score_step).min(u32::MAX as u64) as u32;
        let gained = level.saturating_sub(self.level);
        for _ in 0..gained {
            self.level += 1;
            self.timing.spawn_rate = self
                .timing
                .spawn_rate
                .saturating_sub(self.rules.spawn_rate_step)
                .max(self.rules.min_spawn_rate);
            self.events.emit(GameEvent::LevelUp { level: self.level });
        }
        gained
    }

    fn set_combo(&mut self, combo: u32) {
        let combo = combo.clamp(MIN_COMBO, MAX_COMBO);
        if combo != self.combo {
            self.combo = combo;
            self.stats.best_combo = self.stats.best_combo.max(combo);
            self.events.emit(GameEvent::ComboChanged { combo });
        }
    }

    pub fn increase_combo(&mut self, by: u32) {
        self.set_combo(self.combo.saturating_add(by));
    }

    pub fn reset_combo(&mut self) {
        self.set_combo(MIN_COMBO);
    }

    /// Lose a life; true only on the call that reaches zero
    ///
    /// `GameOver` is emitted exactly once per run. The caller ends the game.
    pub fn lose_life(&mut self) -> bool {
        if self.lives == 0 {
            return false;
        }
        self.lives -= 1;
        self.events.emit(GameEvent::LifeLost { lives: self.lives });
        if self.lives == 0 && !self.game_over_emitted {
            self.game_over_emitted = true;
            self.events.emit(GameEvent::GameOver { score: self.score });
            return true;
        }
        false
    }

    // === Power-ups ===

    pub fn activate_power_up(&mut self, kind: PowerUpKind) {
        self.power_up_timers.activate(kind);
        self.stats.power_ups_collected += 1;
        self.events.emit(GameEvent::PowerUpActivated { kind });
    }

    /// Count timers down and announce expiries
    pub fn tick_power_ups(&mut self, dt_ms: f32) {
        for kind in self.power_up_timers.tick(dt_ms) {
            self.events.emit(GameEvent::PowerUpExpired { kind });
        }
    }

    // === Collections ===

    fn enforce(&mut self, collection: Collection) {
        let capacity = self.capacity(collection);
        log::debug!("{collection} at capacity {capacity}, evicting oldest");
        self.events.emit(GameEvent::LimitEnforced {
            collection: collection.as_str(),
            capacity,
        });
    }

    pub fn capacity(&self, collection: Collection) -> usize {
        match collection {
            Collection::Ingredients => self.caps.ingredients,
            Collection::Particles => self.caps.particles,
            Collection::PowerUps => self.caps.power_ups,
            Collection::Orders => self.caps.orders,
        }
    }

    pub fn count(&self, collection: Collection) -> usize {
        match collection {
            Collection::Ingredients => self.ingredients.len(),
            Collection::Particles => self.particles.len(),
            Collection::PowerUps => self.power_ups.len(),
            Collection::Orders => self.orders.len(),
        }
    }

    /// Evict the oldest ingredient if the next insert would exceed the cap
    pub fn make_room_for_ingredient(&mut self) -> Option<Ingredient> {
        if self.ingredients.len() < self.caps.ingredients || self.ingredients.is_empty() {
            return None;
        }
        self.enforce(Collection::Ingredients);
        Some(self.ingredients.remove(0))
    }

    /// Insert; returns whatever had to be evicted
    pub fn push_ingredient(&mut self, ingredient: Ingredient) -> Option<Ingredient> {
        let evicted = self.make_room_for_ingredient();
        self.ingredients.push(ingredient);
        evicted
    }

    /// Evict the oldest particle if the next insert would exceed the cap
    pub fn make_room_for_particle(&mut self) -> Option<Particle> {
        if self.particles.len() < self.caps.particles || self.particles.is_empty() {
            return None;
        }
        self.enforce(Collection::Particles);
        Some(self.particles.remove(0))
    }

    pub fn push_particle(&mut self, particle: Particle) -> Option<Particle> {
        let evicted = self.make_room_for_particle();
        self.particles.push(particle);
        evicted
    }

    pub fn add_order(&mut self, order: Order) {
        if self.orders.len() >= self.caps.orders && !self.orders.is_empty() {
            self.enforce(Collection::Orders);
            self.orders.remove(0);
        }
        let (id, len) = (order.id, order.recipe.len());
        self.orders.push(order);
        self.events.emit(GameEvent::OrderSpawned { id, len });
    }

    pub fn add_power_up(&mut self, power_up: PowerUp) {
        if self.power_ups.len() >= self.caps.power_ups && !self.power_ups.is_empty() {
            self.enforce(Collection::PowerUps);
            self.power_ups.remove(0);
        }
        self.power_ups.push(power_up);
    }

    /// Take a live ingredient out by id
    pub fn remove_ingredient(&mut self, id: u32) -> Result<Ingredient> {
        let index = self
            .ingredients
            .iter()
            .position(|i| i.id == id)
            .ok_or(GameError::StaleEntity {
                collection: Collection::Ingredients.as_str(),
                id,
            })?;
        Ok(self.ingredients.remove(index))
    }

    pub fn remove_power_up(&mut self, id: u32) -> Result<PowerUp> {
        let index = self
            .power_ups
            .iter()
            .position(|p| p.id == id)
            .ok_or(GameError::StaleEntity {
                collection: Collection::PowerUps.as_str(),
                id,
            })?;
        Ok(self.power_ups.remove(index))
    }

    pub fn remove_order(&mut self, id: u32) -> Result<Order> {
        let index = self
            .orders
            .iter()
            .position(|o| o.id == id)
            .ok_or(GameError::StaleEntity {
                collection: Collection::Orders.as_str(),
                id,
            })?;
        Ok(self.orders.remove(index))
    }

    // === Debug ===

    /// Every invariant violation currently present (empty when healthy)
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.lives > MAX_LIVES {
            violations.push(format!("lives {} above {MAX_LIVES}", self.lives));
        }
        if !(MIN_COMBO..=MAX_COMBO).contains(&self.combo) {
            violations.push(format!("combo {} outside [{MIN_COMBO}, {MAX_COMBO}]", self.combo));
        }
        let expected_level = 1 + self.score / self.rules.score_step;
        if self.level as u64 != expected_level {
            violations.push(format!(
                "level {} does not match score {} (expected {expected_level})",
                self.level, self.score
            ));
        }
        if self.high_score < self.score {
            violations.push(format!(
                "high score {} below score {}",
                self.high_score, self.score
            ));
        }
        for collection in [
            Collection::Ingredients,
            Collection::Particles,
            Collection::PowerUps,
            Collection::Orders,
        ] {
            let (count, cap) = (self.count(collection), self.capacity(collection));
            if count > cap {
                violations.push(format!("{collection}: {count} exceeds cap {cap}"));
            }
        }
        for order in &self.orders {
            if order.cursor > order.recipe.len() {
                violations.push(format!("order {} cursor past recipe end", order.id));
            }
            if order.completed && order.expired {
                violations.push(format!("order {} both completed and expired", order.id));
            }
        }
        if self.ingredients.iter().any(|i| i.speed < 0.0) {
            violations.push("ingredient with negative speed".to_string());
        }
        if self.lives == 0 && self.phase == Phase::Running {
            violations.push("running with no lives".to_string());
        }
        violations
    }

    pub fn debug_snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            phase: self.phase,
            score: self.score,
            lives: self.lives,
            combo: self.combo,
            level: self.level,
            frame_count: self.frame_count,
            high_score: self.high_score,
            ingredients: self.ingredients.len(),
            particles: self.particles.len(),
            power_ups: self.power_ups.len(),
            orders: self.orders.len(),
            active_power_ups: self.power_up_timers.active_kinds().collect(),
            timing: self.timing,
            stats: self.stats,
            event_counts: self.events.counters(),
            listener_failures: self.events.failures(),
            violations: self.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::StoreError;
    use crate::persistence::MemoryStore;
    use proptest::prelude::*;

    /// Store whose contents outlive the state that wrote them
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<Option<u64>>>);

    impl HighScoreStore for SharedStore {
        fn load(&mut self) -> std::result::Result<Option<u64>, StoreError> {
            Ok(*self.0.borrow())
        }

        fn save(&mut self, score: u64) -> std::result::Result<(), StoreError> {
            *self.0.borrow_mut() = Some(score);
            Ok(())
        }
    }

    fn running() -> GameState {
        let mut state = GameState::new(&GameConfig::default());
        state.start_game();
        state
    }

    #[test]
    fn test_last_life_fires_game_over_once() {
        let mut state = running();
        state.lives = 1;
        assert!(state.lose_life());
        assert_eq!(state.lives, 0);
        assert!(!state.lose_life());
        assert_eq!(state.lives, 0);
        assert_eq!(state.events.emitted(EventKind::GameOver), 1);
    }

    #[test]
    fn test_combo_clamped() {
        let mut state = running();
        state.increase_combo(50);
        assert_eq!(state.combo, MAX_COMBO);
        state.reset_combo();
        assert_eq!(state.combo, MIN_COMBO);
        // No event when nothing changes
        let before = state.events.emitted(EventKind::ComboChanged);
        state.reset_combo();
        assert_eq!(state.events.emitted(EventKind::ComboChanged), before);
    }

    #[test]
    fn test_levels_shorten_spawn_interval() {
        let mut state = running();
        let base = state.timing.spawn_rate;
        assert_eq!(state.add_score(1000), 2);
        assert_eq!(state.level, 3);
        assert_eq!(state.timing.spawn_rate, base - 10);
        assert_eq!(state.events.emitted(EventKind::LevelUp), 2);

        state.add_score(100_000);
        assert_eq!(state.timing.spawn_rate, GameConfig::default().min_spawn_rate);
        assert!(state.validate().is_empty());
    }

    #[test]
    fn test_new_high_score_announced_once_per_run() {
        let mut state =
            GameState::with_store(&GameConfig::default(), Box::new(MemoryStore::with_score(50)));
        assert_eq!(state.high_score, 50);
        state.start_game();
        state.add_score(40);
        assert_eq!(state.events.emitted(EventKind::NewHighScore), 0);
        state.add_score(20);
        state.add_score(20);
        assert_eq!(state.events.emitted(EventKind::NewHighScore), 1);
        assert_eq!(state.high_score, 80);
    }

    #[test]
    fn test_end_game_persists_improved_score() {
        let mut state = GameState::with_store(&GameConfig::default(), Box::new(MemoryStore::new()));
        state.start_game();
        state.add_score(120);
        assert!(state.end_game());
        assert!(!state.end_game());
        assert_eq!(state.phase, Phase::Ended);

        let history: Vec<_> = state.events.history().cloned().collect();
        assert!(history.contains(&GameEvent::GameEnded {
            score: 120,
            high_score: 120
        }));
    }

    #[test]
    fn test_restart_mid_run_ends_and_persists_best() {
        let disk = SharedStore::default();
        let config = GameConfig::default();
        let mut state = GameState::with_store(&config, Box::new(disk.clone()));
        state.start_game();
        state.add_score(1000);

        // Restart while still running
        state.start_game();
        assert_eq!(state.events.emitted(EventKind::GameEnded), 1);
        assert_eq!(*disk.0.borrow(), Some(1000));

        state.add_score(500);
        assert!(state.end_game());
        assert_eq!(state.high_score, 1000);
        assert_eq!(*disk.0.borrow(), Some(1000));

        let reloaded = GameState::with_store(&config, Box::new(disk.clone()));
        assert_eq!(reloaded.high_score, 1000);
    }

    #[test]
    fn test_restart_from_pause_ends_run() {
        let mut state = running();
        state.add_score(40);
        assert!(state.pause_game());
        state.start_game();
        assert_eq!(state.phase, Phase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.events.emitted(EventKind::GameEnded), 1);
        assert_eq!(state.events.emitted(EventKind::GameStarted), 2);
    }

    #[test]
    fn test_lower_score_keeps_persisted_best() {
        let disk = SharedStore(Rc::new(RefCell::new(Some(300))));
        let mut state = GameState::with_store(&GameConfig::default(), Box::new(disk.clone()));
        state.start_game();
        state.add_score(100);
        state.end_game();
        assert_eq!(*disk.0.borrow(), Some(300));
        assert_eq!(state.high_score, 300);
    }

    #[test]
    fn test_corrupt_store_degrades_to_zero() {
        let state =
            GameState::with_store(&GameConfig::default(), Box::new(MemoryStore::with_raw("???")));
        assert_eq!(state.high_score, 0);
    }

    #[test]
    fn test_start_keeps_high_score_only() {
        let mut state = running();
        state.add_score(700);
        state.increase_combo(3);
        state.lose_life();
        state.power_up_timers.activate(PowerUpKind::TimeFreeze);
        state.end_game();

        state.start_game();
        assert_eq!(state.score, 0);
        assert_eq!(state.combo, MIN_COMBO);
        assert_eq!(state.lives, MAX_LIVES);
        assert_eq!(state.level, 1);
        assert_eq!(state.high_score, 700);
        assert!(!state.power_up_timers.time_frozen());
    }

    #[test]
    fn test_pause_resume_transitions() {
        let mut state = GameState::new(&GameConfig::default());
        assert!(!state.pause_game());
        state.start_game();
        assert!(state.pause_game());
        assert!(!state.pause_game());
        assert!(state.resume_game());
        assert!(state.is_running());
    }

    #[test]
    fn test_order_cap_evicts_oldest() {
        let mut state = running();
        for id in 1..=4 {
            state.add_order(Order::new(id, vec![], 1000.0));
        }
        assert_eq!(state.orders.len(), 3);
        assert_eq!(state.orders[0].id, 2);
        assert_eq!(state.events.emitted(EventKind::LimitEnforced), 1);
    }

    #[test]
    fn test_stale_removal_is_an_error() {
        let mut state = running();
        let err = state.remove_order(99).unwrap_err();
        assert_eq!(
            err,
            GameError::StaleEntity {
                collection: "orders",
                id: 99
            }
        );
    }

    #[test]
    fn test_collection_names() {
        assert_eq!("powerUps".parse::<Collection>(), Ok(Collection::PowerUps));
        assert!(matches!(
            "enemies".parse::<Collection>(),
            Err(GameError::UnknownCollection(_))
        ));
    }

    #[test]
    fn test_validate_reports_violations() {
        let mut state = running();
        state.combo = 0;
        state.level = 4;
        let violations = state.validate();
        assert_eq!(violations.len(), 2);
        assert!(state.debug_snapshot().violations.len() == 2);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Score(u64),
        Combo(u32),
        ResetCombo,
        LoseLife,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..500).prop_map(Op::Score),
            (0u32..8).prop_map(Op::Combo),
            Just(Op::ResetCombo),
            Just(Op::LoseLife),
        ]
    }

    proptest! {
        #[test]
        fn prop_core_invariants_hold(ops in prop::collection::vec(op(), 0..60)) {
            let mut state = running();
            let mut last_score = 0;
            for op in ops {
                match op {
                    Op::Score(points) => { state.add_score(points); }
                    Op::Combo(by) => state.increase_combo(by),
                    Op::ResetCombo => state.reset_combo(),
                    Op::LoseLife => { state.lose_life(); }
                }
                prop_assert!((MIN_COMBO..=MAX_COMBO).contains(&state.combo));
                prop_assert!(state.lives <= MAX_LIVES);
                prop_assert!(state.score >= last_score);
                last_score = state.score;
            }
            prop_assert!(state.events.emitted(EventKind::GameOver) <= 1);
        }
    }
}
