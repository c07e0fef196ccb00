//! Typed game events and the bus that delivers them
//!
//! Listeners subscribe to one kind or to every kind. A listener that returns
//! an error or panics is logged and skipped; the remaining listeners still
//! receive the event.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;
use thiserror::Error;

use super::catalog::PowerUpKind;

/// Events kept for debugging
const HISTORY_LEN: usize = 32;

/// Everything observable that happens in a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    GameStarted,
    GamePaused,
    GameResumed,
    GameEnded { score: u64, high_score: u64 },
    ScoreChanged { score: u64, delta: u64 },
    NewHighScore { score: u64 },
    ComboChanged { combo: u32 },
    LifeLost { lives: u8 },
    GameOver { score: u64 },
    LevelUp { level: u32 },
    PowerUpActivated { kind: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    OrderSpawned { id: u32, len: usize },
    OrderCompleted { id: u32, bonus: u64 },
    OrderExpired { id: u32 },
    LimitEnforced { collection: &'static str, capacity: usize },
}

/// Discriminant used for subscriptions and counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    GameStarted,
    GamePaused,
    GameResumed,
    GameEnded,
    ScoreChanged,
    NewHighScore,
    ComboChanged,
    LifeLost,
    GameOver,
    LevelUp,
    PowerUpActivated,
    PowerUpExpired,
    OrderSpawned,
    OrderCompleted,
    OrderExpired,
    LimitEnforced,
}

impl EventKind {
    pub const COUNT: usize = 16;

    pub const ALL: [EventKind; Self::COUNT] = [
        EventKind::GameStarted,
        EventKind::GamePaused,
        EventKind::GameResumed,
        EventKind::GameEnded,
        EventKind::ScoreChanged,
        EventKind::NewHighScore,
        EventKind::ComboChanged,
        EventKind::LifeLost,
        EventKind::GameOver,
        EventKind::LevelUp,
        EventKind::PowerUpActivated,
        EventKind::PowerUpExpired,
        EventKind::OrderSpawned,
        EventKind::OrderCompleted,
        EventKind::OrderExpired,
        EventKind::LimitEnforced,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::GameStarted => EventKind::GameStarted,
            GameEvent::GamePaused => EventKind::GamePaused,
            GameEvent::GameResumed => EventKind::GameResumed,
            GameEvent::GameEnded { .. } => EventKind::GameEnded,
            GameEvent::ScoreChanged { .. } => EventKind::ScoreChanged,
            GameEvent::NewHighScore { .. } => EventKind::NewHighScore,
            GameEvent::ComboChanged { .. } => EventKind::ComboChanged,
            GameEvent::LifeLost { .. } => EventKind::LifeLost,
            GameEvent::GameOver { .. } => EventKind::GameOver,
            GameEvent::LevelUp { .. } => EventKind::LevelUp,
            GameEvent::PowerUpActivated { .. } => EventKind::PowerUpActivated,
            GameEvent::PowerUpExpired { .. } => EventKind::PowerUpExpired,
            GameEvent::OrderSpawned { .. } => EventKind::OrderSpawned,
            GameEvent::OrderCompleted { .. } => EventKind::OrderCompleted,
            GameEvent::OrderExpired { .. } => EventKind::OrderExpired,
            GameEvent::LimitEnforced { .. } => EventKind::LimitEnforced,
        }
    }
}

/// Error a listener can report back to the bus
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

pub type Listener = Box<dyn FnMut(&GameEvent) -> Result<(), ListenerError>>;

/// Handle for `off`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

struct Subscription {
    id: ListenerId,
    /// `None` receives every kind
    kind: Option<EventKind>,
    listener: Listener,
}

/// Synchronous pub/sub bus
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u32,
    emitted: [u64; EventKind::COUNT],
    failures: u64,
    history: VecDeque<GameEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.subscriptions.len())
            .field("failures", &self.failures)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_id: 1,
            emitted: [0; EventKind::COUNT],
            failures: 0,
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    fn subscribe(&mut self, kind: Option<EventKind>, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, kind, listener });
        id
    }

    /// Subscribe to one event kind
    pub fn on(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&GameEvent) -> Result<(), ListenerError> + 'static,
    ) -> ListenerId {
        self.subscribe(Some(kind), Box::new(listener))
    }

    /// Subscribe to every event
    pub fn on_any(
        &mut self,
        listener: impl FnMut(&GameEvent) -> Result<(), ListenerError> + 'static,
    ) -> ListenerId {
        self.subscribe(None, Box::new(listener))
    }

    /// Unsubscribe; false if the id was unknown
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id != id);
        before != self.subscriptions.len()
    }

    /// Deliver to every matching listener in subscription order
    pub fn emit(&mut self, event: GameEvent) {
        let kind = event.kind();
        self.emitted[kind.index()] += 1;
        log::debug!("event: {event:?}");

        for sub in self.subscriptions.iter_mut() {
            if sub.kind.is_some_and(|k| k != kind) {
                continue;
            }
            let listener = &mut sub.listener;
            match catch_unwind(AssertUnwindSafe(|| listener(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    self.failures += 1;
                    log::warn!("listener {:?} rejected {kind:?}: {err}", sub.id);
                }
                Err(_) => {
                    self.failures += 1;
                    log::warn!("listener {:?} panicked on {kind:?}", sub.id);
                }
            }
        }

        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }

    /// Times `kind` has been emitted
    pub fn emitted(&self, kind: EventKind) -> u64 {
        self.emitted[kind.index()]
    }

    /// Listener errors and panics caught so far
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Most recent events, oldest first
    pub fn history(&self) -> impl Iterator<Item = &GameEvent> {
        self.history.iter()
    }

    /// Per-kind emit counts (non-zero only)
    pub fn counters(&self) -> Vec<(EventKind, u64)> {
        EventKind::ALL
            .into_iter()
            .map(|kind| (kind, self.emitted(kind)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}
