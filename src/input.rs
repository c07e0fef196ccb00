//! Pointer and touch unification
//!
//! The host forwards raw pointer/touch coordinates (client space). They are
//! mapped into canvas space with the cached bounding rect and scale, queued,
//! and dispatched to handlers inside the simulation tick.
//!
//! Click handlers run in registration order and stop at the first one that
//! reports the click as handled.

use std::collections::VecDeque;

use glam::Vec2;
use serde::Serialize;

/// Queued events beyond this are dropped (a stalled tab can pile up input)
const MAX_PENDING_EVENTS: usize = 64;

/// Where a pointer event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointerSource {
    Mouse,
    Touch,
    Pen,
}

/// Raw pointer position in client (page) coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub client_x: f32,
    pub client_y: f32,
    pub source: PointerSource,
}

impl PointerInput {
    pub fn mouse(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x,
            client_y,
            source: PointerSource::Mouse,
        }
    }

    pub fn touch(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x,
            client_y,
            source: PointerSource::Touch,
        }
    }
}

/// Canvas placement on the page and its logical (game space) size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanvasMetrics {
    /// Bounding rect in CSS pixels
    pub left: f32,
    pub top: f32,
    pub css_width: f32,
    pub css_height: f32,
    /// Game space size
    pub logical_width: f32,
    pub logical_height: f32,
}

impl CanvasMetrics {
    /// Canvas at the page origin with a 1:1 scale
    pub fn unscaled(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            css_width: width,
            css_height: height,
            logical_width: width,
            logical_height: height,
        }
    }

    /// Game units per CSS pixel
    fn scale(&self) -> Vec2 {
        let sx = if self.css_width > 0.0 {
            self.logical_width / self.css_width
        } else {
            1.0
        };
        let sy = if self.css_height > 0.0 {
            self.logical_height / self.css_height
        } else {
            1.0
        };
        Vec2::new(sx, sy)
    }
}

/// Normalized input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Click { pos: Vec2, source: PointerSource },
    Move { pos: Vec2, source: PointerSource },
    Resize { width: f32, height: f32 },
}

/// Handle returned by the `on_*` registrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u32);

type ClickHandler<C> = Box<dyn FnMut(&mut C, Vec2) -> bool>;
type MoveHandler<C> = Box<dyn FnMut(&mut C, Vec2)>;
type ResizeHandler<C> = Box<dyn FnMut(&mut C, f32, f32)>;

/// Outcome of one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub clicks: usize,
    pub handled_clicks: usize,
    pub moves: usize,
    pub resizes: usize,
}

/// Pointer/touch router over a handler context `C`
pub struct InputRouter<C> {
    metrics: CanvasMetrics,
    scale: Vec2,
    pending: VecDeque<InputEvent>,
    click_handlers: Vec<(HandlerId, ClickHandler<C>)>,
    move_handlers: Vec<(HandlerId, MoveHandler<C>)>,
    resize_handlers: Vec<(HandlerId, ResizeHandler<C>)>,
    next_id: u32,
    last_pointer: Option<Vec2>,
    dropped_events: u64,
}

impl<C> InputRouter<C> {
    pub fn new(metrics: CanvasMetrics) -> Self {
        Self {
            scale: metrics.scale(),
            metrics,
            pending: VecDeque::new(),
            click_handlers: Vec::new(),
            move_handlers: Vec::new(),
            resize_handlers: Vec::new(),
            next_id: 1,
            last_pointer: None,
            dropped_events: 0,
        }
    }

    pub fn metrics(&self) -> &CanvasMetrics {
        &self.metrics
    }

    /// Update the cached rect/scale (call on layout changes)
    pub fn set_metrics(&mut self, metrics: CanvasMetrics) {
        let resized = metrics.logical_width != self.metrics.logical_width
            || metrics.logical_height != self.metrics.logical_height;
        self.metrics = metrics;
        self.scale = metrics.scale();
        if resized {
            self.enqueue(InputEvent::Resize {
                width: metrics.logical_width,
                height: metrics.logical_height,
            });
        }
    }

    /// Change only the game-space size
    pub fn resize(&mut self, width: f32, height: f32) {
        let metrics = CanvasMetrics {
            logical_width: width,
            logical_height: height,
            ..self.metrics
        };
        self.set_metrics(metrics);
    }

    /// Client coordinates to canvas (game) coordinates
    pub fn to_canvas(&self, client_x: f32, client_y: f32) -> Vec2 {
        Vec2::new(
            (client_x - self.metrics.left) * self.scale.x,
            (client_y - self.metrics.top) * self.scale.y,
        )
    }

    /// Last known pointer position in canvas space
    pub fn last_pointer(&self) -> Option<Vec2> {
        self.last_pointer
    }

    pub fn pointer_down(&mut self, input: PointerInput) {
        let pos = self.to_canvas(input.client_x, input.client_y);
        self.last_pointer = Some(pos);
        self.enqueue(InputEvent::Click {
            pos,
            source: input.source,
        });
    }

    pub fn pointer_move(&mut self, input: PointerInput) {
        let pos = self.to_canvas(input.client_x, input.client_y);
        self.last_pointer = Some(pos);
        // Only the latest move matters
        if let Some(InputEvent::Move { pos: last, .. }) = self.pending.back_mut() {
            *last = pos;
            return;
        }
        self.enqueue(InputEvent::Move {
            pos,
            source: input.source,
        });
    }

    fn enqueue(&mut self, event: InputEvent) {
        if self.pending.len() >= MAX_PENDING_EVENTS {
            self.pending.pop_front();
            self.dropped_events += 1;
        }
        self.pending.push_back(event);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    fn allocate_id(&mut self) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register a click handler; return `true` from it to stop propagation
    pub fn on_click(&mut self, handler: impl FnMut(&mut C, Vec2) -> bool + 'static) -> HandlerId {
        let id = self.allocate_id();
        self.click_handlers.push((id, Box::new(handler)));
        id
    }

    pub fn on_move(&mut self, handler: impl FnMut(&mut C, Vec2) + 'static) -> HandlerId {
        let id = self.allocate_id();
        self.move_handlers.push((id, Box::new(handler)));
        id
    }

    pub fn on_resize(&mut self, handler: impl FnMut(&mut C, f32, f32) + 'static) -> HandlerId {
        let id = self.allocate_id();
        self.resize_handlers.push((id, Box::new(handler)));
        id
    }

    /// Unregister any handler; false if the id was unknown
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let before =
            self.click_handlers.len() + self.move_handlers.len() + self.resize_handlers.len();
        self.click_handlers.retain(|(hid, _)| *hid != id);
        self.move_handlers.retain(|(hid, _)| *hid != id);
        self.resize_handlers.retain(|(hid, _)| *hid != id);
        before != self.click_handlers.len() + self.move_handlers.len() + self.resize_handlers.len()
    }

    /// Deliver a click immediately; true if some handler claimed it
    pub fn dispatch_click(&mut self, ctx: &mut C, pos: Vec2) -> bool {
        for (_, handler) in self.click_handlers.iter_mut() {
            if handler(ctx, pos) {
                return true;
            }
        }
        false
    }

    /// Drain queued events into the handlers
    pub fn dispatch(&mut self, ctx: &mut C) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        while let Some(event) = self.pending.pop_front() {
            match event {
                InputEvent::Click { pos, .. } => {
                    summary.clicks += 1;
                    if self.dispatch_click(ctx, pos) {
                        summary.handled_clicks += 1;
                    }
                }
                InputEvent::Move { pos, .. } => {
                    summary.moves += 1;
                    for (_, handler) in self.move_handlers.iter_mut() {
                        handler(ctx, pos);
                    }
                }
                InputEvent::Resize { width, height } => {
                    summary.resizes += 1;
                    for (_, handler) in self.resize_handlers.iter_mut() {
                        handler(ctx, width, height);
                    }
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        hits: Vec<&'static str>,
        moves: Vec<Vec2>,
        sizes: Vec<(f32, f32)>,
    }

    #[test]
    fn test_to_canvas_applies_rect_and_scale() {
        let router: InputRouter<Log> = InputRouter::new(CanvasMetrics {
            left: 100.0,
            top: 50.0,
            css_width: 400.0,
            css_height: 300.0,
            logical_width: 800.0,
            logical_height: 600.0,
        });
        assert_eq!(router.to_canvas(100.0, 50.0), Vec2::ZERO);
        assert_eq!(router.to_canvas(300.0, 200.0), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_click_stops_at_first_handler() {
        let mut router: InputRouter<Log> = InputRouter::new(CanvasMetrics::unscaled(800.0, 600.0));
        router.on_click(|log, _| {
            log.hits.push("first");
            false
        });
        router.on_click(|log, _| {
            log.hits.push("second");
            true
        });
        router.on_click(|log, _| {
            log.hits.push("third");
            true
        });

        let mut log = Log::default();
        router.pointer_down(PointerInput::mouse(10.0, 10.0));
        let summary = router.dispatch(&mut log);
        assert_eq!(log.hits, vec!["first", "second"]);
        assert_eq!(summary.clicks, 1);
        assert_eq!(summary.handled_clicks, 1);
    }

    #[test]
    fn test_remove_handler() {
        let mut router: InputRouter<Log> = InputRouter::new(CanvasMetrics::unscaled(800.0, 600.0));
        let id = router.on_click(|log, _| {
            log.hits.push("gone");
            true
        });
        assert!(router.remove(id));
        assert!(!router.remove(id));

        let mut log = Log::default();
        router.pointer_down(PointerInput::touch(1.0, 1.0));
        let summary = router.dispatch(&mut log);
        assert!(log.hits.is_empty());
        assert_eq!(summary.handled_clicks, 0);
    }

    #[test]
    fn test_moves_coalesce() {
        let mut router: InputRouter<Log> = InputRouter::new(CanvasMetrics::unscaled(800.0, 600.0));
        router.on_move(|log, pos| log.moves.push(pos));
        router.pointer_move(PointerInput::mouse(1.0, 1.0));
        router.pointer_move(PointerInput::mouse(2.0, 2.0));
        router.pointer_move(PointerInput::touch(3.0, 3.0));
        assert_eq!(router.pending_len(), 1);

        let mut log = Log::default();
        router.dispatch(&mut log);
        assert_eq!(log.moves, vec![Vec2::new(3.0, 3.0)]);
        assert_eq!(router.last_pointer(), Some(Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn test_resize_recomputes_scale() {
        let mut router: InputRouter<Log> = InputRouter::new(CanvasMetrics::unscaled(800.0, 600.0));
        router.on_resize(|log, w, h| log.sizes.push((w, h)));
        router.resize(400.0, 300.0);
        assert_eq!(router.to_canvas(800.0, 600.0), Vec2::new(400.0, 300.0));

        let mut log = Log::default();
        router.dispatch(&mut log);
        assert_eq!(log.sizes, vec![(400.0, 300.0)]);
    }

    #[test]
    fn test_pending_queue_is_bounded() {
        let mut router: InputRouter<Log> = InputRouter::new(CanvasMetrics::unscaled(800.0, 600.0));
        for i in 0..(MAX_PENDING_EVENTS + 5) {
            router.pointer_down(PointerInput::mouse(i as f32, 0.0));
        }
        assert_eq!(router.pending_len(), MAX_PENDING_EVENTS);
        assert_eq!(router.dropped_events(), 5);
    }
}
