//! Sound cues and audio sinks
//!
//! The simulation only queues semantic cues. A sink turns them into sound;
//! on the web that is a Web Audio oscillator synth, so no sound files are
//! needed.

use serde::Serialize;

use crate::sim::PowerUpKind;

/// Semantic sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SoundCue {
    /// Correct ingredient caught
    Collect,
    /// Ingredient matched no order
    Error,
    OrderComplete,
    OrderExpired,
    PowerUpActivate(PowerUpKind),
    LifeLost,
    LevelUp,
    GameOver,
}

/// Something that can play cues (fire-and-forget)
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);

    /// Master and effects volume, both 0.0 - 1.0
    fn set_volume(&mut self, _master: f32, _sfx: f32) {}

    /// Resume after a user gesture (browsers start audio suspended)
    fn resume(&mut self) {}
}

/// Discards every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: SoundCue) {}
}

/// Records cues instead of playing them (headless runs, tests)
#[derive(Debug, Default, Clone)]
pub struct CueLog {
    pub played: Vec<SoundCue>,
}

impl AudioSink for CueLog {
    fn play(&mut self, cue: SoundCue) {
        self.played.push(cue);
    }
}

/// Tone step: frequency (Hz), start offset and length (seconds), peak gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    pub delay: f64,
    pub duration: f64,
    pub gain: f32,
    pub wave: Wave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

const fn tone(freq: f32, delay: f64, duration: f64, gain: f32, wave: Wave) -> Tone {
    Tone {
        freq,
        delay,
        duration,
        gain,
        wave,
    }
}

const COLLECT: &[Tone] = &[
    tone(660.0, 0.0, 0.08, 0.3, Wave::Sine),
    tone(880.0, 0.05, 0.1, 0.25, Wave::Sine),
];
const ERROR: &[Tone] = &[tone(140.0, 0.0, 0.2, 0.35, Wave::Sawtooth)];
const ORDER_COMPLETE: &[Tone] = &[
    tone(523.0, 0.0, 0.12, 0.3, Wave::Triangle),
    tone(659.0, 0.1, 0.12, 0.3, Wave::Triangle),
    tone(784.0, 0.2, 0.12, 0.3, Wave::Triangle),
    tone(1047.0, 0.3, 0.25, 0.35, Wave::Triangle),
];
const ORDER_EXPIRED: &[Tone] = &[
    tone(330.0, 0.0, 0.15, 0.3, Wave::Square),
    tone(220.0, 0.15, 0.25, 0.3, Wave::Square),
];
const SLOW_MO: &[Tone] = &[
    tone(880.0, 0.0, 0.3, 0.25, Wave::Sine),
    tone(440.0, 0.1, 0.3, 0.2, Wave::Sine),
];
const TIME_FREEZE: &[Tone] = &[
    tone(1200.0, 0.0, 0.4, 0.2, Wave::Triangle),
    tone(1500.0, 0.05, 0.4, 0.15, Wave::Sine),
];
const DOUBLE_SCORE: &[Tone] = &[
    tone(600.0, 0.0, 0.1, 0.3, Wave::Square),
    tone(900.0, 0.08, 0.1, 0.3, Wave::Square),
    tone(1200.0, 0.16, 0.2, 0.3, Wave::Square),
];
const LIFE_LOST: &[Tone] = &[tone(200.0, 0.0, 0.3, 0.4, Wave::Triangle)];
const LEVEL_UP: &[Tone] = &[
    tone(440.0, 0.0, 0.1, 0.25, Wave::Sine),
    tone(554.0, 0.08, 0.1, 0.25, Wave::Sine),
    tone(659.0, 0.16, 0.2, 0.3, Wave::Sine),
];
const GAME_OVER: &[Tone] = &[
    tone(392.0, 0.0, 0.3, 0.35, Wave::Triangle),
    tone(330.0, 0.3, 0.3, 0.35, Wave::Triangle),
    tone(262.0, 0.6, 0.6, 0.4, Wave::Triangle),
];

/// Note pattern for a cue
pub fn pattern(cue: SoundCue) -> &'static [Tone] {
    match cue {
        SoundCue::Collect => COLLECT,
        SoundCue::Error => ERROR,
        SoundCue::OrderComplete => ORDER_COMPLETE,
        SoundCue::OrderExpired => ORDER_EXPIRED,
        SoundCue::PowerUpActivate(PowerUpKind::SpeedBoost) => SLOW_MO,
        SoundCue::PowerUpActivate(PowerUpKind::TimeFreeze) => TIME_FREEZE,
        SoundCue::PowerUpActivate(PowerUpKind::ScoreMultiplier) => DOUBLE_SCORE,
        SoundCue::LifeLost => LIFE_LOST,
        SoundCue::LevelUp => LEVEL_UP,
        SoundCue::GameOver => GAME_OVER,
    }
}

/// Web Audio oscillator synth
#[cfg(target_arch = "wasm32")]
pub struct WebAudio {
    ctx: Option<web_sys::AudioContext>,
    master_volume: f32,
    sfx_volume: f32,
}

#[cfg(target_arch = "wasm32")]
impl Default for WebAudio {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl WebAudio {
    pub fn new() -> Self {
        // Fails outside a secure context
        let ctx = web_sys::AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.8,
            sfx_volume: 1.0,
        }
    }

    fn effective_volume(&self) -> f32 {
        self.master_volume * self.sfx_volume
    }

    fn play_tone(ctx: &web_sys::AudioContext, step: &Tone, vol: f32) -> Option<()> {
        use web_sys::OscillatorType;

        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;
        osc.set_type(match step.wave {
            Wave::Sine => OscillatorType::Sine,
            Wave::Square => OscillatorType::Square,
            Wave::Triangle => OscillatorType::Triangle,
            Wave::Sawtooth => OscillatorType::Sawtooth,
        });
        osc.frequency().set_value(step.freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        let t = ctx.current_time() + step.delay;
        gain.gain().set_value_at_time(0.0, ctx.current_time()).ok()?;
        gain.gain().set_value_at_time(step.gain * vol, t).ok()?;
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + step.duration)
            .ok()?;
        osc.start_with_when(t).ok()?;
        osc.stop_with_when(t + step.duration + 0.05).ok()?;
        Some(())
    }
}

#[cfg(target_arch = "wasm32")]
impl AudioSink for WebAudio {
    fn play(&mut self, cue: SoundCue) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }
        for step in pattern(cue) {
            if Self::play_tone(ctx, step, vol).is_none() {
                log::debug!("dropped tone for {cue:?}");
                break;
            }
        }
    }

    fn set_volume(&mut self, master: f32, sfx: f32) {
        self.master_volume = master.clamp(0.0, 1.0);
        self.sfx_volume = sfx.clamp(0.0, 1.0);
    }

    fn resume(&mut self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }
}
