//! Ingredient Rush - catch falling ingredients to fill burger orders
//!
//! Core modules:
//! - `sim`: Simulation (entities, game state, event bus, per-tick step)
//! - `pool`: Object pooling for transient entities
//! - `physics`: Stateless motion and collision helpers
//! - `perf`: Frame-time sampling and adaptive quality levels
//! - `input`: Pointer/touch unification into canvas space
//! - `game`: Orchestrator that owns the loop and the collaborators
//! - `renderer`, `audio`, `persistence`, `platform`: host-facing seams

pub mod audio;
pub mod error;
pub mod game;
pub mod input;
pub mod perf;
pub mod persistence;
pub mod physics;
pub mod platform;
pub mod pool;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{GameError, Result, StoreError};
pub use game::Game;
pub use settings::{GameConfig, Settings};

/// Engine-wide constants that are not tuning knobs
pub mod consts {
    /// Reference frame rate that per-tick speeds are expressed in
    pub const REFERENCE_FPS: f32 = 60.0;
    /// Duration of one reference frame in milliseconds
    pub const REFERENCE_FRAME_MS: f32 = 1000.0 / REFERENCE_FPS;
    /// Largest delta-time factor applied in one tick (prevents tunneling after a stall)
    pub const MAX_DT_FACTOR: f32 = 3.0;

    /// Lives at the start of a run
    pub const MAX_LIVES: u8 = 3;
    /// Combo bounds
    pub const MIN_COMBO: u32 = 1;
    pub const MAX_COMBO: u32 = 10;

    /// Particles with life at or below this are culled
    pub const PARTICLE_LIFE_EPSILON: f32 = 0.01;
}

/// Quadratic ease-in on [0, 1]
#[inline]
pub fn ease_in_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Quadratic ease-out on [0, 1]
#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * (2.0 - t)
}

/// Cubic ease-out on [0, 1]
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0) - 1.0;
    t * t * t + 1.0
}
