//! Closed catalogs of ingredient, power-up and particle kinds
//!
//! Per-kind constants live in lookup tables next to each enum. Parsing an
//! unknown name is an error, never a fallback.

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Ingredient types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientKind {
    BunBottom,
    BunTop,
    Patty,
    Cheese,
    Lettuce,
    Tomato,
    Onion,
    Pickle,
    Bacon,
}

/// Per-ingredient constants
#[derive(Debug, Clone, Copy)]
pub struct IngredientSpec {
    pub name: &'static str,
    pub label: &'static str,
    /// 0xRRGGBB
    pub color: u32,
    pub width: f32,
    pub height: f32,
}

impl IngredientKind {
    pub const ALL: [IngredientKind; 9] = [
        IngredientKind::BunBottom,
        IngredientKind::BunTop,
        IngredientKind::Patty,
        IngredientKind::Cheese,
        IngredientKind::Lettuce,
        IngredientKind::Tomato,
        IngredientKind::Onion,
        IngredientKind::Pickle,
        IngredientKind::Bacon,
    ];

    /// Kinds that go between the buns
    pub const FILLINGS: [IngredientKind; 7] = [
        IngredientKind::Patty,
        IngredientKind::Cheese,
        IngredientKind::Lettuce,
        IngredientKind::Tomato,
        IngredientKind::Onion,
        IngredientKind::Pickle,
        IngredientKind::Bacon,
    ];

    pub fn spec(self) -> IngredientSpec {
        use IngredientKind::*;
        let (name, label, color, width, height) = match self {
            BunBottom => ("bun_bottom", "Bottom Bun", 0xD2_9B_4C, 60.0, 20.0),
            BunTop => ("bun_top", "Top Bun", 0xE0_A8_55, 60.0, 28.0),
            Patty => ("patty", "Patty", 0x6B_3A_1F, 56.0, 18.0),
            Cheese => ("cheese", "Cheese", 0xF7_C8_2E, 58.0, 10.0),
            Lettuce => ("lettuce", "Lettuce", 0x5F_B8_3A, 62.0, 12.0),
            Tomato => ("tomato", "Tomato", 0xE0_3C_31, 50.0, 12.0),
            Onion => ("onion", "Onion", 0xE9_D5_F0, 48.0, 10.0),
            Pickle => ("pickle", "Pickle", 0x7C_A2_3B, 40.0, 10.0),
            Bacon => ("bacon", "Bacon", 0xB5_45_38, 58.0, 12.0),
        };
        IngredientSpec {
            name,
            label,
            color,
            width,
            height,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.spec().name
    }

    pub fn size(self) -> Vec2 {
        let spec = self.spec();
        Vec2::new(spec.width, spec.height)
    }
}

impl fmt::Display for IngredientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngredientKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IngredientKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GameError::UnknownIngredient(s.to_string()))
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Slows falling ingredients
    SpeedBoost,
    /// Stops order timers
    TimeFreeze,
    /// Doubles points
    ScoreMultiplier,
}

/// Per-power-up constants
#[derive(Debug, Clone, Copy)]
pub struct PowerUpSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub duration_ms: f32,
    /// Effect strength while active (fall speed factor or score factor)
    pub multiplier: f32,
    pub color: u32,
    pub radius: f32,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::SpeedBoost,
        PowerUpKind::TimeFreeze,
        PowerUpKind::ScoreMultiplier,
    ];
    pub const COUNT: usize = 3;

    pub fn spec(self) -> PowerUpSpec {
        match self {
            PowerUpKind::SpeedBoost => PowerUpSpec {
                name: "speed_boost",
                label: "Slow-Mo",
                duration_ms: 5000.0,
                multiplier: 0.5,
                color: 0x4F_C3_F7,
                radius: 22.0,
            },
            PowerUpKind::TimeFreeze => PowerUpSpec {
                name: "time_freeze",
                label: "Time Freeze",
                duration_ms: 3000.0,
                multiplier: 0.0,
                color: 0xB3_E5_FC,
                radius: 22.0,
            },
            PowerUpKind::ScoreMultiplier => PowerUpSpec {
                name: "score_multiplier",
                label: "2x Score",
                duration_ms: 10000.0,
                multiplier: 2.0,
                color: 0xFF_D5_4F,
                radius: 22.0,
            },
        }
    }

    /// Stable slot for per-kind arrays
    pub fn index(self) -> usize {
        match self {
            PowerUpKind::SpeedBoost => 0,
            PowerUpKind::TimeFreeze => 1,
            PowerUpKind::ScoreMultiplier => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerUpKind {
    type Err = GameError;

    /// Accepts snake_case and camelCase names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "speed_boost" | "speedBoost" => Ok(PowerUpKind::SpeedBoost),
            "time_freeze" | "timeFreeze" => Ok(PowerUpKind::TimeFreeze),
            "score_multiplier" | "scoreMultiplier" => Ok(PowerUpKind::ScoreMultiplier),
            _ => Err(GameError::UnknownPowerUp(s.to_string())),
        }
    }
}

/// Particle visual variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    Star,
    Circle,
    Triangle,
    /// Floating text (score popups)
    Text,
    Celebration,
}

impl ParticleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticleKind::Star => "star",
            ParticleKind::Circle => "circle",
            ParticleKind::Triangle => "triangle",
            ParticleKind::Text => "text",
            ParticleKind::Celebration => "celebration",
        }
    }
}

impl FromStr for ParticleKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "star" => Ok(ParticleKind::Star),
            "circle" => Ok(ParticleKind::Circle),
            "triangle" => Ok(ParticleKind::Triangle),
            "text" => Ok(ParticleKind::Text),
            "celebration" => Ok(ParticleKind::Celebration),
            _ => Err(GameError::UnknownParticle(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_names_round_trip() {
        for kind in IngredientKind::ALL {
            assert_eq!(kind.as_str().parse::<IngredientKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_ingredient_fails_fast() {
        let err = "anchovy".parse::<IngredientKind>().unwrap_err();
        assert_eq!(err, GameError::UnknownIngredient("anchovy".into()));
    }

    #[test]
    fn test_power_up_camel_case_names() {
        assert_eq!("speedBoost".parse::<PowerUpKind>(), Ok(PowerUpKind::SpeedBoost));
        assert_eq!("timeFreeze".parse::<PowerUpKind>(), Ok(PowerUpKind::TimeFreeze));
        assert_eq!("scoreMultiplier".parse::<PowerUpKind>(), Ok(PowerUpKind::ScoreMultiplier));
        assert!("doubleJump".parse::<PowerUpKind>().is_err());
    }

    #[test]
    fn test_power_up_indices_are_unique() {
        let mut seen = [false; PowerUpKind::COUNT];
        for kind in PowerUpKind::ALL {
            assert!(!seen[kind.index()]);
            seen[kind.index()] = true;
        }
    }

    #[test]
    fn test_particle_kind_parse() {
        assert_eq!("celebration".parse::<ParticleKind>(), Ok(ParticleKind::Celebration));
        assert!(matches!(
            "smoke".parse::<ParticleKind>(),
            Err(GameError::UnknownParticle(_))
        ));
    }

    #[test]
    fn test_fillings_exclude_buns() {
        assert!(!IngredientKind::FILLINGS.contains(&IngredientKind::BunTop));
        assert!(!IngredientKind::FILLINGS.contains(&IngredientKind::BunBottom));
    }
}
