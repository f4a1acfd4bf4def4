//! The abstract completion service: text in, text out.
//!
//! The runtime treats the model provider as opaque behind this one
//! operation; provider-specific HTTP adapters live outside the crate.
//! `ScriptedCompletion` is the in-crate double used by integration tests
//! and harnesses to drive whole games without a provider.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who authored a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch at append time.
    pub timestamp_ms: u64,
}

impl ChatMessage {
    pub fn now(role: Role, content: impl Into<String>) -> ChatMessage {
        ChatMessage { role, content: content.into(), timestamp_ms: now_ms() }
    }
}

/// A single completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("provider returned an empty completion")]
    EmptyReply,
}

/// The one inbound dependency of the runtime.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;
}

/// Rough deterministic token estimate: one token per four characters.
/// Telemetry only; never used to gate content.
pub fn estimate_tokens(text: &str) -> u32 {
    (text.len() as u32).div_ceil(4)
}

enum Script {
    /// Replies consumed in order; the last one repeats once exhausted.
    Cycling { replies: VecDeque<String>, last: String },
    /// Replies sampled from a fixed pool with a seeded generator.
    Sampling { pool: Vec<String>, rng: SmallRng },
}

/// A canned `Completion` for tests and offline harnesses.
pub struct ScriptedCompletion {
    script: Mutex<Script>,
}

impl ScriptedCompletion {
    /// Replies are returned in order; after the list is exhausted the
    /// final reply repeats forever.
    pub fn cycling(replies: Vec<String>) -> ScriptedCompletion {
        let last = replies.last().cloned().unwrap_or_default();
        ScriptedCompletion {
            script: Mutex::new(Script::Cycling { replies: replies.into(), last }),
        }
    }

    /// Every reply is an empty ORDERS section: all agents hold.
    pub fn all_hold() -> ScriptedCompletion {
        ScriptedCompletion::cycling(vec!["ORDERS:\n".to_string()])
    }

    /// Replies drawn from `pool` with a seeded generator, for harnesses
    /// that want variety with reproducibility.
    pub fn sampling(seed: u64, pool: Vec<String>) -> ScriptedCompletion {
        ScriptedCompletion {
            script: Mutex::new(Script::Sampling { pool, rng: SmallRng::seed_from_u64(seed) }),
        }
    }
}

#[async_trait]
impl Completion for ScriptedCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let content = {
            let mut script = self.script.lock().expect("script poisoned");
            match &mut *script {
                Script::Cycling { replies, last } => {
                    replies.pop_front().unwrap_or_else(|| last.clone())
                }
                Script::Sampling { pool, rng } => {
                    if pool.is_empty() {
                        return Err(CompletionError::EmptyReply);
                    }
                    pool[rng.gen_range(0..pool.len())].clone()
                }
            }
        };
        let input: u32 = request.messages.iter().map(|m| estimate_tokens(&m.content)).sum();
        Ok(CompletionResponse {
            usage: TokenUsage { input_tokens: input, output_tokens: estimate_tokens(&content) },
            stop_reason: StopReason::EndTurn,
            content,
        })
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
