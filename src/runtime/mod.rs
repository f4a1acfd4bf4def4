//! The runtime: configuration, the event stream, and the coordinator
//! that drives whole games.

pub mod config;
pub mod coordinator;
pub mod events;

pub use config::{AgentConfig, ConfigError, RuntimeConfig};
pub use coordinator::{Coordinator, StopHandle, DEFAULT_MODEL};
pub use events::{EventBus, EventKind, GameEvent};
