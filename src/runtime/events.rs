//! The coordinator's outbound event stream.
//!
//! Subscribers register a callback and receive every event in emission
//! order. A panicking callback is caught and logged; it never breaks the
//! stream or the game loop.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::board::province::Power;
use crate::game::state::{Outcome, PhaseKind, Season};

/// What happened, with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    GameStarted {
        powers: Vec<Power>,
    },
    PhaseStarted {
        year: u16,
        season: Season,
        phase: PhaseKind,
    },
    AgentTurnStarted {
        power: Power,
    },
    AgentTurnCompleted {
        power: Power,
        orders: usize,
        messages: usize,
    },
    AgentTurnFailed {
        power: Power,
        cause: String,
    },
    PressRoundCompleted {
        round: u32,
        messages: usize,
    },
    PhaseResolved {
        year: u16,
        season: Season,
        phase: PhaseKind,
        dislodgements: usize,
        errors: usize,
    },
    GameEnded {
        outcome: Outcome,
    },
}

/// An event as delivered to subscribers and the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub timestamp_ms: u64,
    pub game_id: String,
    #[serde(flatten)]
    pub kind: EventKind,
}

type Callback = Box<dyn Fn(&GameEvent) + Send + Sync>;

/// Subscribe/unsubscribe fan-out for game events.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(u64, Callback)>,
}

impl EventBus {
    pub fn new() -> EventBus {
        EventBus::default()
    }

    /// Registers a callback; the returned id unsubscribes it.
    pub fn subscribe(&mut self, callback: impl Fn(&GameEvent) + Send + Sync + 'static) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: u64) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Delivers an event to every subscriber, containing panics.
    pub fn emit(&self, event: &GameEvent) {
        for (id, callback) in &self.subscribers {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!(subscriber = id, "event callback panicked; continuing");
            }
        }
    }
}
