//! Game configuration and player preferences
//!
//! `GameConfig` holds every tuned gameplay constant. `Settings` holds player
//! preferences and is persisted separately in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::perf::PerfConfig;
use crate::physics::PhysicsConfig;

/// Gameplay tuning
///
/// Spawn probabilities and intervals are empirically tuned. They are kept
/// here as plain values so they can be overridden from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Playfield ===
    pub canvas_width: f32,
    pub canvas_height: f32,

    // === Collection caps ===
    pub max_ingredients: usize,
    pub max_particles: usize,
    pub max_power_ups: usize,
    pub max_orders: usize,
    /// Power-ups allowed on screen before spawning pauses
    pub max_concurrent_power_ups: usize,

    // === Pools ===
    pub ingredient_pool_size: usize,
    pub particle_pool_size: usize,

    // === Ingredients ===
    /// Fall speed per reference frame before difficulty scaling
    pub ingredient_base_speed: f32,
    /// Random speed spread (0.3 = ±30%)
    pub speed_variation: f32,
    /// Chance an ingredient spawns as a fast outlier
    pub outlier_chance: f32,
    pub outlier_multiplier: f32,
    /// Frames between ingredient spawns at level 1
    pub spawn_rate: u32,
    pub min_spawn_rate: u32,
    /// Frames removed from the spawn interval per level
    pub spawn_rate_step: u32,
    /// Speed scale per point of score, captured at spawn
    pub difficulty_increase_rate: f32,
    /// `fall_progress` advance per reference frame
    pub fall_ramp_step: f32,
    pub trail_length: usize,
    /// Distance below the canvas before an ingredient is culled
    pub offscreen_margin: f32,
    pub sway_amplitude: f32,
    pub sway_frequency: f32,
    /// Chance a spawn picks an ingredient some order is waiting for
    pub needed_ingredient_bias: f32,

    // === Orders ===
    pub order_spawn_chance: f32,
    pub order_base_time_secs: f32,
    pub order_time_per_ingredient_secs: f32,
    pub order_min_fillings: usize,
    pub order_max_fillings: usize,

    // === Power-ups ===
    /// Minimum frames between power-up spawns
    pub power_up_interval_frames: u64,
    pub power_up_spawn_chance: f32,
    pub power_up_fall_speed: f32,

    // === Scoring ===
    pub base_points: u64,
    pub completion_bonus: u64,
    pub combo_complete_bonus: u32,
    pub level_score_step: u64,

    // === Nested ===
    pub physics: PhysicsConfig,
    pub perf: PerfConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 600.0,

            max_ingredients: 25,
            max_particles: 20,
            max_power_ups: 2,
            max_orders: 3,
            max_concurrent_power_ups: 1,

            ingredient_pool_size: 30,
            particle_pool_size: 40,

            ingredient_base_speed: 2.0,
            speed_variation: 0.3,
            outlier_chance: 0.05,
            outlier_multiplier: 1.6,
            spawn_rate: 60,
            min_spawn_rate: 20,
            spawn_rate_step: 5,
            difficulty_increase_rate: 0.0005,
            fall_ramp_step: 0.02,
            trail_length: 6,
            offscreen_margin: 50.0,
            sway_amplitude: 12.0,
            sway_frequency: 0.05,
            needed_ingredient_bias: 0.6,

            order_spawn_chance: 0.01,
            order_base_time_secs: 15.0,
            order_time_per_ingredient_secs: 2.5,
            order_min_fillings: 1,
            order_max_fillings: 4,

            power_up_interval_frames: 900,
            power_up_spawn_chance: 0.01,
            power_up_fall_speed: 1.5,

            base_points: 10,
            completion_bonus: 100,
            combo_complete_bonus: 5,
            level_score_step: 500,

            physics: PhysicsConfig::default(),
            perf: PerfConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse from JSON (missing fields take defaults) and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        fn check(ok: bool, msg: &str) -> Result<()> {
            if ok {
                Ok(())
            } else {
                Err(GameError::InvalidConfig(msg.to_string()))
            }
        }
        fn probability(p: f32) -> bool {
            (0.0..=1.0).contains(&p)
        }

        check(
            self.canvas_width > 0.0 && self.canvas_height > 0.0,
            "canvas size must be positive",
        )?;
        check(
            self.max_ingredients > 0
                && self.max_particles > 0
                && self.max_power_ups > 0
                && self.max_orders > 0,
            "collection caps must be positive",
        )?;
        check(
            self.max_concurrent_power_ups <= self.max_power_ups,
            "max_concurrent_power_ups exceeds max_power_ups",
        )?;
        check(self.ingredient_base_speed > 0.0, "ingredient_base_speed must be positive")?;
        check(
            (0.0..1.0).contains(&self.speed_variation),
            "speed_variation must be in [0, 1)",
        )?;
        check(self.outlier_multiplier >= 1.0, "outlier_multiplier must be >= 1")?;
        check(
            self.min_spawn_rate >= 1 && self.spawn_rate >= self.min_spawn_rate,
            "spawn_rate must be >= min_spawn_rate >= 1",
        )?;
        check(
            self.difficulty_increase_rate >= 0.0,
            "difficulty_increase_rate must be non-negative",
        )?;
        check(
            self.fall_ramp_step > 0.0 && self.fall_ramp_step <= 1.0,
            "fall_ramp_step must be in (0, 1]",
        )?;
        check(
            probability(self.outlier_chance)
                && probability(self.needed_ingredient_bias)
                && probability(self.order_spawn_chance)
                && probability(self.power_up_spawn_chance),
            "probabilities must be in [0, 1]",
        )?;
        check(
            self.order_min_fillings >= 1 && self.order_max_fillings >= self.order_min_fillings,
            "order filling range is empty",
        )?;
        check(self.order_base_time_secs > 0.0, "order_base_time_secs must be positive")?;
        check(self.level_score_step > 0, "level_score_step must be positive")?;
        check(
            self.perf.sample_size > 0 && self.perf.judge_window > 0,
            "perf windows must be positive",
        )?;
        check(self.perf.target_fps > 0.0, "perf target_fps must be positive")?;
        Ok(())
    }
}

/// Player preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Visual Effects ===
    /// Screen shake on wrong ingredients
    pub screen_shake: bool,
    /// Flash on power-up collection
    pub screen_flash: bool,
    /// Particle effects
    pub particles: bool,
    /// Let the performance monitor pick the quality level
    pub auto_quality: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Pause when window loses focus
    pub pause_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (no shake, no flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_shake: true,
            screen_flash: true,
            particles: true,
            auto_quality: true,

            master_volume: 0.8,
            sfx_volume: 1.0,
            pause_on_blur: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective screen flash (respects reduced_motion)
    pub fn effective_screen_flash(&self) -> bool {
        self.screen_flash && !self.reduced_motion
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "ingredient_rush_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = GameConfig::from_json(r#"{ "spawn_rate": 45, "order_spawn_chance": 0.02 }"#)
            .unwrap();
        assert_eq!(config.spawn_rate, 45);
        assert!((config.order_spawn_chance - 0.02).abs() < 1e-6);
        assert_eq!(config.max_ingredients, 25);
        assert_eq!(config.power_up_interval_frames, 900);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        let err = GameConfig::from_json(r#"{ "order_spawn_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));

        let err =
            GameConfig::from_json(r#"{ "spawn_rate": 5, "min_spawn_rate": 10 }"#).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));

        let err = GameConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse(_)));
    }

    #[test]
    fn test_reduced_motion_overrides_effects() {
        let mut settings = Settings::default();
        assert!(settings.effective_screen_shake());
        settings.reduced_motion = true;
        assert!(!settings.effective_screen_shake());
        assert!(!settings.effective_screen_flash());
    }
}
