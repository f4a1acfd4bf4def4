//! Runtime configuration.
//!
//! The externally visible config shape. Unknown options are rejected at
//! parse time; semantic problems (duplicate powers, nonsense bounds) are
//! fatal at startup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::province::Power;

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub power: Power,
    /// Model id; the default model when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Freeform personality note injected into the system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
}

/// Full runtime configuration for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RuntimeConfig {
    pub game_id: String,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub parallel_execution: bool,
    #[serde(default = "default_turn_timeout_ms")]
    pub turn_timeout_ms: u64,
    #[serde(default)]
    pub persist_memory: bool,
    #[serde(default = "default_press_period_minutes")]
    pub press_period_minutes: f64,
    #[serde(default = "default_press_poll_interval_s")]
    pub press_poll_interval_s: u64,
    #[serde(default = "default_max_conversation_history")]
    pub max_conversation_history: usize,
    #[serde(default = "default_max_press_messages")]
    pub max_press_messages_per_channel: usize,
}

fn default_turn_timeout_ms() -> u64 {
    120_000
}

fn default_press_period_minutes() -> f64 {
    1.0
}

fn default_press_poll_interval_s() -> u64 {
    5
}

fn default_max_conversation_history() -> usize {
    20
}

fn default_max_press_messages() -> usize {
    20
}

impl RuntimeConfig {
    /// A minimal config with defaults for everything but the id.
    pub fn for_game(game_id: impl Into<String>) -> RuntimeConfig {
        RuntimeConfig {
            game_id: game_id.into(),
            agents: Vec::new(),
            parallel_execution: false,
            turn_timeout_ms: default_turn_timeout_ms(),
            persist_memory: false,
            press_period_minutes: default_press_period_minutes(),
            press_poll_interval_s: default_press_poll_interval_s(),
            max_conversation_history: default_max_conversation_history(),
            max_press_messages_per_channel: default_max_press_messages(),
        }
    }

    /// Parses and validates a JSON config. Unknown keys are fatal.
    pub fn from_json(text: &str) -> Result<RuntimeConfig, ConfigError> {
        let config: RuntimeConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Startup validation of semantic constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game_id.trim().is_empty() {
            return Err(ConfigError::EmptyGameId);
        }
        let mut seen: Vec<Power> = Vec::new();
        for agent in &self.agents {
            if seen.contains(&agent.power) {
                return Err(ConfigError::DuplicatePower(agent.power));
            }
            seen.push(agent.power);
        }
        if self.turn_timeout_ms == 0 {
            return Err(ConfigError::InvalidBound("turn-timeout-ms must be positive"));
        }
        if self.press_period_minutes <= 0.0 {
            return Err(ConfigError::InvalidBound("press-period-minutes must be positive"));
        }
        if self.max_conversation_history < 2 {
            return Err(ConfigError::InvalidBound("max-conversation-history must be at least 2"));
        }
        if self.max_press_messages_per_channel == 0 {
            return Err(ConfigError::InvalidBound(
                "max-press-messages-per-channel must be positive",
            ));
        }
        Ok(())
    }

    /// The configured agent entry for a power, if any.
    pub fn agent(&self, power: Power) -> Option<&AgentConfig> {
        self.agents.iter().find(|a| a.power == power)
    }
}

/// Fatal configuration problems.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config did not parse: {0}")]
    Malformed(String),

    #[error("game id must not be empty")]
    EmptyGameId,

    #[error("power {0} is configured twice")]
    DuplicatePower(Power),

    #[error("invalid bound: {0}")]
    InvalidBound(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_with_defaults() {
        let config = RuntimeConfig::from_json(r#"{"game-id": "g1"}"#).unwrap();
        assert_eq!(config.game_id, "g1");
        assert_eq!(config.turn_timeout_ms, 120_000);
        assert_eq!(config.max_conversation_history, 20);
        assert_eq!(config.max_press_messages_per_channel, 20);
        assert!(!config.parallel_execution);
    }

    #[test]
    fn full_json_roundtrip() {
        let text = r#"{
            "game-id": "g2",
            "agents": [
                {"power": "France", "model": "big-model", "personality": "bold"},
                {"power": "Germany"}
            ],
            "parallel-execution": true,
            "turn-timeout-ms": 60000,
            "persist-memory": true,
            "press-period-minutes": 2.5,
            "press-poll-interval-s": 10,
            "max-conversation-history": 30,
            "max-press-messages-per-channel": 50
        }"#;
        let config = RuntimeConfig::from_json(text).unwrap();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agent(Power::France).unwrap().model.as_deref(), Some("big-model"));
        assert!(config.agent(Power::Italy).is_none());
        assert!(config.parallel_execution);
        assert_eq!(config.press_period_minutes, 2.5);
    }

    #[test]
    fn unknown_option_rejected() {
        let err = RuntimeConfig::from_json(r#"{"game-id": "g", "frobnicate": 1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn unknown_agent_option_rejected() {
        let err = RuntimeConfig::from_json(
            r#"{"game-id": "g", "agents": [{"power": "France", "elo": 2000}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn unknown_power_rejected() {
        let err = RuntimeConfig::from_json(
            r#"{"game-id": "g", "agents": [{"power": "Narnia"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn duplicate_power_rejected() {
        let err = RuntimeConfig::from_json(
            r#"{"game-id": "g", "agents": [{"power": "France"}, {"power": "France"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::DuplicatePower(Power::France));
    }

    #[test]
    fn bad_bounds_rejected() {
        let err =
            RuntimeConfig::from_json(r#"{"game-id": "g", "turn-timeout-ms": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBound(_)));

        let err = RuntimeConfig::from_json(r#"{"game-id": "g", "press-period-minutes": -1}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBound(_)));

        let err = RuntimeConfig::from_json(r#"{"game-id": ""}"#).unwrap_err();
        assert_eq!(err, ConfigError::EmptyGameId);
    }
}
