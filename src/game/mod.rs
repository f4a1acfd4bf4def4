//! Game state and the phase machine that owns it.

pub mod phase;
pub mod state;

pub use phase::{PhaseMachine, PhaseReport};
pub use state::{GameState, Outcome, PendingRetreat, PhaseKind, RetreatDest, Season};
