//! Gameplay simulation
//!
//! All gameplay logic lives here, with no rendering or platform dependencies:
//! - Seeded RNG only
//! - Variable timestep normalised to the 60 FPS reference frame
//! - Collections ordered oldest-first (eviction and hit-testing rely on it)

pub mod catalog;
pub mod events;
pub mod ingredient;
pub mod order;
pub mod particle;
pub mod powerup;
pub mod state;
pub mod tick;

pub use catalog::{IngredientKind, IngredientSpec, ParticleKind, PowerUpKind, PowerUpSpec};
pub use events::{EventBus, EventKind, GameEvent, ListenerError, ListenerId};
pub use ingredient::{Ingredient, IngredientArgs, TickContext, TrailPoint};
pub use order::{CheckResult, Order};
pub use particle::{Particle, ParticleArgs, PopupText};
pub use powerup::{PowerUp, PowerUpTimer, PowerUpTimers};
pub use state::{Caps, Collection, DebugSnapshot, GameState, Phase, RunStats, Timing};
pub use tick::{
    CatchOutcome, EffectOptions, ScreenEffects, Simulation, ingredient_points, order_bonus,
};
