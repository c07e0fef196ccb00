//! Burger orders
//!
//! An order is a recipe consumed strictly in sequence. Completion and expiry
//! are both terminal.

use rand::Rng;
use serde::Serialize;

use super::catalog::IngredientKind;
use crate::settings::GameConfig;

/// Outcome of offering an ingredient to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckResult {
    /// Matched the next step, more steps remain
    Correct,
    /// Matched the final step
    Completed,
    /// Not the next step, or the order is already finished
    Wrong,
}

/// A customer order
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: u32,
    pub recipe: Vec<IngredientKind>,
    /// Index of the next required ingredient
    pub cursor: usize,
    pub time_limit_ms: f32,
    pub time_left_ms: f32,
    pub completed: bool,
    pub expired: bool,
}

impl Order {
    pub fn new(id: u32, recipe: Vec<IngredientKind>, time_limit_ms: f32) -> Self {
        Self {
            id,
            recipe,
            cursor: 0,
            time_limit_ms,
            time_left_ms: time_limit_ms,
            completed: false,
            expired: false,
        }
    }

    /// Random burger: bottom bun, fillings, top bun
    ///
    /// The filling count upper bound grows by one every two levels.
    pub fn generate(rng: &mut impl Rng, id: u32, config: &GameConfig, level: u32) -> Self {
        let level_bonus = (level.saturating_sub(1) / 2) as usize;
        let max_fillings = (config.order_min_fillings + level_bonus).min(config.order_max_fillings);
        let fillings = rng.random_range(config.order_min_fillings..=max_fillings);

        let mut recipe = Vec::with_capacity(fillings + 2);
        recipe.push(IngredientKind::BunBottom);
        for _ in 0..fillings {
            let pick = rng.random_range(0..IngredientKind::FILLINGS.len());
            recipe.push(IngredientKind::FILLINGS[pick]);
        }
        recipe.push(IngredientKind::BunTop);

        let per_step = config.order_time_per_ingredient_secs * recipe.len() as f32;
        let secs = config.order_base_time_secs + per_step;
        Self::new(id, recipe, secs * 1000.0)
    }

    /// Still accepting ingredients
    pub fn is_active(&self) -> bool {
        !self.completed && !self.expired
    }

    /// Ingredient the cursor is waiting for
    pub fn next_needed(&self) -> Option<IngredientKind> {
        if self.is_active() {
            self.recipe.get(self.cursor).copied()
        } else {
            None
        }
    }

    /// Offer an ingredient; only a match at the cursor advances
    pub fn check_ingredient(&mut self, kind: IngredientKind) -> CheckResult {
        if !self.is_active() || self.recipe.get(self.cursor) != Some(&kind) {
            return CheckResult::Wrong;
        }
        self.cursor += 1;
        if self.cursor == self.recipe.len() {
            self.completed = true;
            CheckResult::Completed
        } else {
            CheckResult::Correct
        }
    }

    /// Count the timer down; true only on the tick the order expires
    pub fn update(&mut self, dt_ms: f32, frozen: bool) -> bool {
        if !self.is_active() || frozen {
            return false;
        }
        self.time_left_ms = (self.time_left_ms - dt_ms).max(0.0);
        if self.time_left_ms <= 0.0 {
            self.expired = true;
            return true;
        }
        false
    }

    /// Completed fraction of the recipe
    pub fn progress(&self) -> f32 {
        if self.recipe.is_empty() {
            return 0.0;
        }
        self.cursor as f32 / self.recipe.len() as f32
    }

    /// Remaining time as a fraction of the limit
    pub fn time_fraction(&self) -> f32 {
        if self.time_limit_ms <= 0.0 {
            return 0.0;
        }
        (self.time_left_ms / self.time_limit_ms).clamp(0.0, 1.0)
    }

    /// Whole seconds left, as used by scoring
    pub fn time_left_secs(&self) -> u64 {
        (self.time_left_ms / 1000.0).floor().max(0.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use IngredientKind::*;

    #[test]
    fn test_three_step_burger() {
        let mut order = Order::new(1, vec![BunBottom, Patty, BunTop], 20_000.0);
        assert_eq!(order.check_ingredient(BunBottom), CheckResult::Correct);
        assert_eq!(order.check_ingredient(Patty), CheckResult::Correct);
        assert_eq!(order.check_ingredient(BunTop), CheckResult::Completed);
        assert!(order.completed);
        assert_eq!(order.check_ingredient(BunBottom), CheckResult::Wrong);
    }

    #[test]
    fn test_out_of_sequence_is_wrong() {
        let mut order = Order::new(1, vec![BunBottom, Patty, BunTop], 20_000.0);
        assert_eq!(order.check_ingredient(Patty), CheckResult::Wrong);
        assert_eq!(order.cursor, 0);
    }

    #[test]
    fn test_expiry_fires_once() {
        let mut order = Order::new(1, vec![BunBottom, BunTop], 50.0);
        assert!(!order.update(30.0, false));
        assert!(order.update(30.0, false));
        assert!(order.expired);
        assert!(!order.update(30.0, false));
        assert_eq!(order.check_ingredient(BunBottom), CheckResult::Wrong);
    }

    #[test]
    fn test_time_freeze_holds_timer() {
        let mut order = Order::new(1, vec![BunBottom, BunTop], 1000.0);
        order.update(500.0, true);
        assert_eq!(order.time_left_ms, 1000.0);
        order.update(500.0, false);
        assert_eq!(order.time_left_ms, 500.0);
    }

    #[test]
    fn test_completed_order_never_expires() {
        let mut order = Order::new(1, vec![BunBottom], 10.0);
        assert_eq!(order.check_ingredient(BunBottom), CheckResult::Completed);
        assert!(!order.update(100.0, false));
        assert!(!order.expired);
    }

    #[test]
    fn test_generated_recipe_shape() {
        let mut rng = Pcg32::seed_from_u64(7);
        let config = GameConfig::default();
        for level in 1..10 {
            let order = Order::generate(&mut rng, level, &config, level);
            assert_eq!(order.recipe.first(), Some(&BunBottom));
            assert_eq!(order.recipe.last(), Some(&BunTop));
            let fillings = order.recipe.len() - 2;
            assert!(fillings >= config.order_min_fillings);
            assert!(fillings <= config.order_max_fillings);
            let expected_ms = (config.order_base_time_secs
                + config.order_time_per_ingredient_secs * order.recipe.len() as f32)
                * 1000.0;
            assert!((order.time_limit_ms - expected_ms).abs() < 1e-3);
        }
    }

    proptest! {
        #[test]
        fn prop_wrong_submissions_never_move_cursor(
            steps in 0usize..3,
            attempts in 1usize..10,
        ) {
            let mut order = Order::new(1, vec![BunBottom, Patty, Cheese, BunTop], 60_000.0);
            for kind in order.recipe.clone().into_iter().take(steps) {
                order.check_ingredient(kind);
            }
            let cursor = order.cursor;
            let wrong = if order.next_needed() == Some(Lettuce) { Bacon } else { Lettuce };
            for _ in 0..attempts {
                prop_assert_eq!(order.check_ingredient(wrong), CheckResult::Wrong);
                prop_assert_eq!(order.cursor, cursor);
            }
        }
    }
}
