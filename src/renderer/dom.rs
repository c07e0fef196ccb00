//! DOM HUD sync for the browser build
//!
//! Canvas pixels belong to the page's own drawing code; this renderer only
//! keeps the HUD elements current and applies screen shake/flash to the
//! canvas element.

use std::fmt::Write as _;

use web_sys::{Document, Element};

use super::{FrameView, Renderer, UiState};
use crate::sim::Phase;

/// Largest shake offset in CSS pixels
const SHAKE_PX: f32 = 8.0;

pub struct DomHud {
    document: Document,
    canvas: Element,
    last_ui: Option<UiState>,
    /// Reused markup buffer for the order list
    markup: String,
}

impl DomHud {
    pub fn new(document: Document, canvas: Element) -> Self {
        Self {
            document,
            canvas,
            last_ui: None,
            markup: String::new(),
        }
    }

    fn set_text(&self, selector: &str, text: &str) {
        if let Some(el) = self.document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(&self, id: &str, visible: bool) {
        if let Some(el) = self.document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn render_orders(&mut self, ui: &UiState) {
        self.markup.clear();
        for order in &ui.orders {
            let _ = write!(
                self.markup,
                "<li class=\"order{}\" data-id=\"{}\"><span class=\"timer\">{}s</span>",
                if order.urgency < 0.25 { " urgent" } else { "" },
                order.id,
                order.time_left_secs
            );
            for (i, kind) in order.recipe.iter().enumerate() {
                let state = if i < order.cursor {
                    "done"
                } else if i == order.cursor {
                    "next"
                } else {
                    ""
                };
                let _ = write!(
                    self.markup,
                    "<span class=\"step {state}\">{}</span>",
                    kind.spec().label
                );
            }
            self.markup.push_str("</li>");
        }
        if let Some(el) = self.document.get_element_by_id("orders") {
            el.set_inner_html(&self.markup);
        }
    }
}

impl Renderer for DomHud {
    fn draw(&mut self, frame: &FrameView<'_>) {
        let style = if frame.screen_shake > 0.0 {
            // Deterministic jitter from the frame counter
            let phase = frame.frame as f32;
            let dx = (phase * 12.9898).sin() * SHAKE_PX * frame.screen_shake;
            let dy = (phase * 78.233).sin() * SHAKE_PX * frame.screen_shake;
            format!("transform: translate({dx:.1}px, {dy:.1}px)")
        } else {
            String::new()
        };
        let _ = self.canvas.set_attribute("style", &style);
        let _ = self
            .canvas
            .set_attribute("data-flash", &format!("{:.2}", frame.screen_flash));
    }

    fn sync_ui(&mut self, ui: &UiState) {
        if self.last_ui.as_ref() == Some(ui) {
            return;
        }

        self.set_text("#hud-score .hud-value", &ui.score.to_string());
        self.set_text("#hud-best .hud-value", &ui.high_score.to_string());
        self.set_text("#hud-lives .hud-value", &ui.lives.to_string());
        self.set_text("#hud-level .hud-value", &ui.level.to_string());
        self.set_text("#hud-fps .hud-value", &format!("{:.0}", ui.fps));

        if let Some(el) = self.document.get_element_by_id("hud-combo") {
            if ui.combo > 1 {
                let changed = self
                    .last_ui
                    .as_ref()
                    .is_some_and(|last| last.combo != ui.combo);
                let class = if changed { "hud-item pop" } else { "hud-item" };
                let _ = el.set_attribute("class", class);
                self.set_text("#hud-combo .hud-value", &format!("x{}", ui.combo));
            } else {
                let _ = el.set_attribute("class", "hud-item hidden");
            }
        }

        let badges: Vec<String> = ui
            .power_ups
            .iter()
            .map(|p| format!("{} {:.0}s", p.label, (p.time_left_ms / 1000.0).ceil()))
            .collect();
        self.set_text("#hud-powerups", &badges.join(" | "));

        self.render_orders(ui);

        self.set_visible("pause-menu", ui.phase == Phase::Paused);
        self.set_visible("game-over", ui.phase == Phase::Ended);
        if ui.phase == Phase::Ended {
            if let Some(el) = self.document.get_element_by_id("final-score") {
                el.set_text_content(Some(&ui.score.to_string()));
            }
            if let Some(el) = self.document.get_element_by_id("final-level") {
                el.set_text_content(Some(&ui.level.to_string()));
            }
        }

        self.last_ui = Some(ui.clone());
    }
}
