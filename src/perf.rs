//! Frame-time sampling and adaptive quality levels
//!
//! The monitor keeps a rolling window of frame deltas, classifies a
//! performance level every tick and commits a new level only after the
//! debounce window has elapsed with that level dominating recent
//! classifications.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Ring buffer for rolling statistics
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    samples: Vec<T>,
    capacity: usize,
    index: usize,
}

impl<T: Copy> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
            index: 0,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.index] = sample;
        }
        self.index = (self.index + 1) % self.capacity;
    }

    /// Most recently pushed sample
    pub fn latest(&self) -> Option<T> {
        if self.samples.is_empty() {
            return None;
        }
        let idx = (self.index + self.capacity - 1) % self.capacity;
        self.samples.get(idx).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.index = 0;
    }
}

impl RingBuffer<f32> {
    pub fn average(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    pub fn min_max(&self) -> (f32, f32) {
        self.samples
            .iter()
            .fold(None, |acc: Option<(f32, f32)>, &s| match acc {
                None => Some((s, s)),
                Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
            })
            .unwrap_or((0.0, 0.0))
    }
}

/// Discrete quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    #[default]
    High,
    Medium,
    Low,
    Critical,
}

/// Rendering feature bundle for a level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualitySettings {
    pub max_particles: usize,
    pub shadows: bool,
    pub high_res_textures: bool,
    pub effects: bool,
    /// Scales trail length, particle burst size and similar detail
    pub detail_multiplier: f32,
}

impl PerformanceLevel {
    pub const ALL: [PerformanceLevel; 4] = [
        PerformanceLevel::High,
        PerformanceLevel::Medium,
        PerformanceLevel::Low,
        PerformanceLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceLevel::High => "High",
            PerformanceLevel::Medium => "Medium",
            PerformanceLevel::Low => "Low",
            PerformanceLevel::Critical => "Critical",
        }
    }

    pub fn quality(&self) -> QualitySettings {
        match self {
            PerformanceLevel::High => QualitySettings {
                max_particles: 20,
                shadows: true,
                high_res_textures: true,
                effects: true,
                detail_multiplier: 1.0,
            },
            PerformanceLevel::Medium => QualitySettings {
                max_particles: 15,
                shadows: false,
                high_res_textures: true,
                effects: true,
                detail_multiplier: 0.75,
            },
            PerformanceLevel::Low => QualitySettings {
                max_particles: 8,
                shadows: false,
                high_res_textures: false,
                effects: true,
                detail_multiplier: 0.5,
            },
            PerformanceLevel::Critical => QualitySettings {
                max_particles: 4,
                shadows: false,
                high_res_textures: false,
                effects: false,
                detail_multiplier: 0.25,
            },
        }
    }
}

/// Monitor thresholds and window sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfConfig {
    /// Frame deltas kept in the rolling window
    pub sample_size: usize,
    pub target_fps: f32,
    /// Ticks that must pass between committed level changes
    pub debounce_ticks: u32,
    /// Recent classifications a new level must dominate
    pub judge_window: usize,
    /// A frame counts as dropped above this multiple of the target frame time
    pub dropped_frame_factor: f32,
    pub high_fps: f32,
    pub medium_fps: f32,
    pub low_fps: f32,
    pub high_drop_rate: f32,
    pub medium_drop_rate: f32,
    pub low_drop_rate: f32,
    /// Drop ratio below which performance counts as good
    pub good_drop_ratio: f32,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            sample_size: 60,
            target_fps: 60.0,
            debounce_ticks: 120,
            judge_window: 30,
            dropped_frame_factor: 1.5,
            high_fps: 55.0,
            medium_fps: 45.0,
            low_fps: 30.0,
            high_drop_rate: 0.05,
            medium_drop_rate: 0.15,
            low_drop_rate: 0.3,
            good_drop_ratio: 0.2,
        }
    }
}

/// Snapshot for HUD/debug overlays
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerfStats {
    pub current_fps: f32,
    pub average_fps: f32,
    pub min_fps: f32,
    pub max_fps: f32,
    pub dropped_frames: usize,
    pub sample_count: usize,
    pub level: PerformanceLevel,
    pub forced: bool,
}

/// Rolling frame-time monitor with debounced level changes
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    config: PerfConfig,
    frame_times: RingBuffer<f32>,
    last_timestamp: Option<f64>,
    level: PerformanceLevel,
    recent: VecDeque<PerformanceLevel>,
    ticks_since_change: u32,
    forced: Option<PerformanceLevel>,
    level_changes: u32,
}

impl PerformanceMonitor {
    pub fn new(config: PerfConfig) -> Self {
        Self {
            frame_times: RingBuffer::new(config.sample_size),
            recent: VecDeque::with_capacity(config.judge_window),
            config,
            last_timestamp: None,
            level: PerformanceLevel::High,
            ticks_since_change: 0,
            forced: None,
            level_changes: 0,
        }
    }

    /// Target frame time in milliseconds
    pub fn target_frame_ms(&self) -> f32 {
        1000.0 / self.config.target_fps
    }

    /// Feed a frame timestamp (ms). Returns the new level if one was committed.
    pub fn update(&mut self, timestamp_ms: f64) -> Option<PerformanceLevel> {
        let previous = self.last_timestamp.replace(timestamp_ms);
        let delta = (timestamp_ms - previous?) as f32;
        if delta <= 0.0 {
            return None;
        }
        self.record_frame(delta)
    }

    /// Feed a frame delta directly (ms)
    pub fn record_frame(&mut self, delta_ms: f32) -> Option<PerformanceLevel> {
        self.frame_times.push(delta_ms);

        let candidate = self.classify();
        if self.recent.len() >= self.config.judge_window {
            self.recent.pop_front();
        }
        self.recent.push_back(candidate);
        self.ticks_since_change = self.ticks_since_change.saturating_add(1);

        if self.forced.is_some() || self.ticks_since_change < self.config.debounce_ticks {
            return None;
        }

        let (dominant, count) = self.dominant()?;
        if dominant == self.level || count * 2 <= self.recent.len() {
            return None;
        }

        log::info!(
            "Performance level {} -> {} (avg {:.1} fps)",
            self.level.as_str(),
            dominant.as_str(),
            self.average_fps()
        );
        self.level = dominant;
        self.ticks_since_change = 0;
        self.level_changes += 1;
        Some(dominant)
    }

    /// Most frequent recent classification and its count
    fn dominant(&self) -> Option<(PerformanceLevel, usize)> {
        PerformanceLevel::ALL
            .into_iter()
            .map(|level| (level, self.recent.iter().filter(|&&l| l == level).count()))
            .filter(|&(_, count)| count > 0)
            .max_by_key(|&(_, count)| count)
    }

    /// Level implied by the current window, ignoring debounce
    pub fn classify(&self) -> PerformanceLevel {
        let avg = self.average_fps();
        let drops = self.drop_ratio();
        let cfg = &self.config;
        if avg >= cfg.high_fps && drops <= cfg.high_drop_rate {
            PerformanceLevel::High
        } else if avg >= cfg.medium_fps && drops <= cfg.medium_drop_rate {
            PerformanceLevel::Medium
        } else if avg >= cfg.low_fps && drops <= cfg.low_drop_rate {
            PerformanceLevel::Low
        } else {
            PerformanceLevel::Critical
        }
    }

    fn fps_from_ms(&self, ms: f32) -> f32 {
        if ms <= 0.0 {
            0.0
        } else {
            (1000.0 / ms).min(self.config.target_fps)
        }
    }

    pub fn current_fps(&self) -> f32 {
        self.frame_times
            .latest()
            .map(|ms| self.fps_from_ms(ms))
            .unwrap_or(0.0)
    }

    pub fn average_fps(&self) -> f32 {
        self.fps_from_ms(self.frame_times.average())
    }

    /// Worst frame in the window
    pub fn min_fps(&self) -> f32 {
        self.fps_from_ms(self.frame_times.min_max().1)
    }

    /// Best frame in the window
    pub fn max_fps(&self) -> f32 {
        self.fps_from_ms(self.frame_times.min_max().0)
    }

    pub fn dropped_frames(&self) -> usize {
        let threshold = self.target_frame_ms() * self.config.dropped_frame_factor;
        self.frame_times.iter().filter(|&&ms| ms > threshold).count()
    }

    pub fn drop_ratio(&self) -> f32 {
        if self.frame_times.is_empty() {
            0.0
        } else {
            self.dropped_frames() as f32 / self.frame_times.len() as f32
        }
    }

    pub fn is_performance_good(&self) -> bool {
        self.average_fps() >= self.config.low_fps && self.drop_ratio() < self.config.good_drop_ratio
    }

    /// Effective level (forced override wins)
    pub fn level(&self) -> PerformanceLevel {
        self.forced.unwrap_or(self.level)
    }

    pub fn quality(&self) -> QualitySettings {
        self.level().quality()
    }

    /// Pin the level (testing/debugging)
    pub fn force_level(&mut self, level: PerformanceLevel) {
        log::info!("Performance level forced to {}", level.as_str());
        self.forced = Some(level);
    }

    pub fn clear_forced_level(&mut self) {
        self.forced = None;
    }

    /// Committed level changes since creation
    pub fn level_changes(&self) -> u32 {
        self.level_changes
    }

    /// Forget timing history (keeps the committed level)
    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.recent.clear();
        self.last_timestamp = None;
        self.ticks_since_change = 0;
    }

    pub fn stats(&self) -> PerfStats {
        PerfStats {
            current_fps: self.current_fps(),
            average_fps: self.average_fps(),
            min_fps: self.min_fps(),
            max_fps: self.max_fps(),
            dropped_frames: self.dropped_frames(),
            sample_count: self.frame_times.len(),
            level: self.level(),
            forced: self.forced.is_some(),
        }
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(PerfConfig::default())
    }
}
