//! Game orchestrator
//!
//! `Game` owns the simulation and its collaborators and runs one loop
//! iteration per scheduled frame:
//!
//! delta time → perf monitor → timers/spawning/culling → queued input →
//! effect decay → audio cues → renderer → HUD sync → next frame request

use glam::Vec2;

use crate::audio::{AudioSink, NullAudio};
use crate::consts::REFERENCE_FRAME_MS;
use crate::error::Result;
use crate::input::{CanvasMetrics, HandlerId, InputRouter, PointerInput};
use crate::perf::{PerfStats, PerformanceLevel, PerformanceMonitor};
use crate::persistence::HighScoreStore;
use crate::platform::{FrameHandle, FrameScheduler, ManualScheduler};
use crate::renderer::{NullRenderer, Renderer, UiState};
use crate::settings::{GameConfig, Settings};
use crate::sim::{
    EffectOptions, EventKind, GameEvent, ListenerError, ListenerId, Phase, Simulation,
};

/// Largest frame delta fed to the simulation (ms); longer gaps are stalls
const MAX_FRAME_DELTA_MS: f64 = 250.0;

pub struct Game {
    sim: Simulation,
    input: InputRouter<Simulation>,
    perf: PerformanceMonitor,
    scheduler: Box<dyn FrameScheduler>,
    audio: Box<dyn AudioSink>,
    renderer: Box<dyn Renderer>,
    settings: Settings,
    last_timestamp: Option<f64>,
    pending_frame: Option<FrameHandle>,
    looping: bool,
}

impl Game {
    /// Headless game: manual scheduling, no audio, no drawing
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        let metrics = CanvasMetrics::unscaled(config.canvas_width, config.canvas_height);
        let perf = PerformanceMonitor::new(config.perf.clone());
        let sim = Simulation::new(config, seed)?;

        let mut input = InputRouter::new(metrics);
        // Power-ups sit on top of ingredients, so they get first claim
        input.on_click(|sim: &mut Simulation, pos| sim.click_power_up(pos));
        input.on_click(|sim: &mut Simulation, pos| sim.click_ingredient(pos).is_some());
        input.on_resize(|sim: &mut Simulation, width, height| sim.resize(width, height));

        Ok(Self {
            sim,
            input,
            perf,
            scheduler: Box::new(ManualScheduler::new()),
            audio: Box::new(NullAudio),
            renderer: Box::new(NullRenderer),
            settings: Settings::default(),
            last_timestamp: None,
            pending_frame: None,
            looping: false,
        })
    }

    pub fn with_scheduler(mut self, scheduler: Box<dyn FrameScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = audio;
        self.apply_volume();
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_store(mut self, store: Box<dyn HighScoreStore>) -> Self {
        self.sim.set_store(store);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.apply_settings(settings);
        self
    }

    pub fn apply_settings(&mut self, settings: Settings) {
        self.sim.set_options(EffectOptions::from_settings(&settings));
        if settings.auto_quality {
            self.perf.clear_forced_level();
        } else {
            self.perf.force_level(PerformanceLevel::High);
        }
        self.sim.set_quality(self.perf.quality());
        self.settings = settings;
        self.apply_volume();
    }

    fn apply_volume(&mut self) {
        self.audio
            .set_volume(self.settings.master_volume, self.settings.sfx_volume);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    pub fn phase(&self) -> Phase {
        self.sim.state.phase
    }

    /// True while frames are being scheduled
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn perf_stats(&self) -> PerfStats {
        self.perf.stats()
    }

    // === Host lifecycle ===

    /// Begin a fresh run and start scheduling frames
    pub fn start(&mut self) {
        self.sim.start();
        self.input.clear_pending();
        self.last_timestamp = None;
        self.perf.reset();
        self.audio.resume();
        self.looping = true;
        if self.pending_frame.is_none() {
            self.schedule();
        }
    }

    /// Cancel the pending frame and end the run; no tick runs afterwards
    pub fn stop(&mut self) {
        self.looping = false;
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel(handle);
        }
        self.sim.state.end_game();
        self.input.clear_pending();
        self.sync_ui();
        log::info!("Game loop stopped");
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.sim.state.pause_game();
        if paused {
            self.sync_ui();
        }
        paused
    }

    pub fn resume(&mut self) -> bool {
        let resumed = self.sim.state.resume_game();
        if resumed {
            // Time spent paused is not simulated
            self.last_timestamp = None;
            self.audio.resume();
        }
        resumed
    }

    /// Toggle between running and paused
    pub fn toggle_pause(&mut self) -> bool {
        match self.phase() {
            Phase::Running => self.pause(),
            Phase::Paused => self.resume(),
            _ => false,
        }
    }

    /// Auto-pause on tab hide / window blur when the player wants it
    pub fn focus_lost(&mut self) {
        if self.settings.pause_on_blur && self.pause() {
            log::info!("Auto-paused (focus lost)");
        }
    }

    /// New game-space size; applied to the simulation on the next tick
    pub fn resize(&mut self, width: f32, height: f32) {
        self.input.resize(width, height);
        self.renderer.resize(width, height);
    }

    /// New canvas placement (bounding rect and scale)
    pub fn set_canvas_metrics(&mut self, metrics: CanvasMetrics) {
        self.input.set_metrics(metrics);
        self.renderer
            .resize(metrics.logical_width, metrics.logical_height);
    }

    pub fn pointer_down(&mut self, pointer: PointerInput) {
        self.input.pointer_down(pointer);
    }

    pub fn pointer_move(&mut self, pointer: PointerInput) {
        self.input.pointer_move(pointer);
    }

    /// Register an extra click handler after the built-in ones
    pub fn on_click(
        &mut self,
        handler: impl FnMut(&mut Simulation, Vec2) -> bool + 'static,
    ) -> HandlerId {
        self.input.on_click(handler)
    }

    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        self.input.remove(id)
    }

    /// Subscribe to gameplay events
    pub fn on(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&GameEvent) -> std::result::Result<(), ListenerError> + 'static,
    ) -> ListenerId {
        self.sim.state.events.on(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.sim.state.events.off(id)
    }

    // === Loop ===

    /// One loop iteration for a frame timestamp in milliseconds
    pub fn frame(&mut self, timestamp: f64) {
        self.pending_frame = None;
        if !self.looping {
            return;
        }

        let dt_ms = match self.last_timestamp.replace(timestamp) {
            Some(previous) => (timestamp - previous).clamp(0.0, MAX_FRAME_DELTA_MS) as f32,
            None => REFERENCE_FRAME_MS,
        };

        if self.perf.update(timestamp).is_some() {
            self.sim.set_quality(self.perf.quality());
        }

        if self.sim.begin_tick(dt_ms) {
            let summary = self.input.dispatch(&mut self.sim);
            if summary.clicks > 0 {
                log::debug!(
                    "{} of {} clicks hit something",
                    summary.handled_clicks,
                    summary.clicks
                );
            }
        } else {
            // Only layout changes survive a paused or finished tick
            self.input.dispatch(&mut self.sim);
        }
        self.sim.end_tick(dt_ms);

        for cue in self.sim.drain_cues() {
            self.audio.play(cue);
        }

        self.renderer.draw(&self.sim.frame_view());
        self.sync_ui();

        self.schedule();
    }

    fn schedule(&mut self) {
        if self.looping {
            self.pending_frame = self.scheduler.request();
        }
    }

    fn sync_ui(&mut self) {
        let ui = self.ui_state();
        self.renderer.sync_ui(&ui);
    }

    /// HUD summary
    pub fn ui_state(&self) -> UiState {
        self.sim
            .ui_state(self.perf.current_fps(), self.perf.level())
    }
}
