//! Agent-side state: sessions, memory, prompts, and compression.

pub mod compress;
pub mod memory;
pub mod prompt;
pub mod session;

pub use compress::CompressionLevel;
pub use memory::{AgentMemory, DiaryEntry, MemoryEvent, RelationshipTag, YearSummary};
pub use prompt::{PowerView, PromptBlock};
pub use session::{assemble_system_prompt, Session, TurnParams};
