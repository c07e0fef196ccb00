//! Renderer seam
//!
//! The engine never touches pixels. Each tick it hands the renderer a
//! borrowed view of the entities plus effect intensities, then a serializable
//! UI summary for the HUD.

#[cfg(target_arch = "wasm32")]
pub mod dom;

use serde::Serialize;

use crate::perf::{PerformanceLevel, QualitySettings};
use crate::sim::{
    Ingredient, IngredientKind, Order, Particle, Phase, PowerUp, PowerUpKind, RunStats,
};

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub width: f32,
    pub height: f32,
    pub frame: u64,
    pub ingredients: &'a [Ingredient],
    pub particles: &'a [Particle],
    pub power_ups: &'a [PowerUp],
    pub orders: &'a [Order],
    /// 0..1, decays each tick
    pub screen_shake: f32,
    /// 0..1, decays each tick
    pub screen_flash: f32,
    pub quality: QualitySettings,
}

/// Order card for the HUD
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub id: u32,
    pub recipe: Vec<IngredientKind>,
    pub cursor: usize,
    pub time_left_secs: u64,
    /// Remaining fraction of the time limit
    pub urgency: f32,
}

/// Active power-up badge
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerUpView {
    pub kind: PowerUpKind,
    pub label: &'static str,
    pub time_left_ms: f32,
}

/// HUD state read by the page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiState {
    pub phase: Phase,
    pub score: u64,
    pub high_score: u64,
    pub lives: u8,
    pub combo: u32,
    pub level: u32,
    pub fps: f32,
    pub performance: PerformanceLevel,
    pub orders: Vec<OrderView>,
    pub power_ups: Vec<PowerUpView>,
    pub stats: RunStats,
}

/// Something that draws frames
pub trait Renderer {
    fn draw(&mut self, frame: &FrameView<'_>);

    /// HUD update; called after `draw`
    fn sync_ui(&mut self, _ui: &UiState) {}

    fn resize(&mut self, _width: f32, _height: f32) {}
}

/// Draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw(&mut self, _frame: &FrameView<'_>) {}
}
