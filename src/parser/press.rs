//! The diplomacy (`SEND`) grammar.
//!
//! `SEND <POWER>: "<content>"`, with an optional leading negotiation
//! stage tag (`[OPENING]`, `[COUNTER]`, `[FINAL]`, `[ACCEPT]`,
//! `[REJECT]`) and an optional `IF <condition>, THEN <commitment>`
//! conditional clause inside the content. Power names are
//! case-insensitive; `ALL` addresses every other power.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::province::Power;

/// Where a press message is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recipient {
    Power(Power),
    All,
}

/// The declared stage of a negotiation exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegotiationStage {
    Opening,
    Counter,
    Final,
    Accept,
    Reject,
}

impl NegotiationStage {
    fn parse(s: &str) -> Option<NegotiationStage> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPENING" => Some(NegotiationStage::Opening),
            "COUNTER" => Some(NegotiationStage::Counter),
            "FINAL" => Some(NegotiationStage::Final),
            "ACCEPT" => Some(NegotiationStage::Accept),
            "REJECT" => Some(NegotiationStage::Reject),
            _ => None,
        }
    }
}

/// An `IF ..., THEN ...` clause extracted from a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditional {
    pub condition: String,
    pub commitment: String,
}

/// One outbound press message as parsed from an agent reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiplomaticMessage {
    pub to: Recipient,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<NegotiationStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
}

/// Why a `SEND` line failed to parse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PressError {
    #[error("not a SEND line: '{0}'")]
    NotSend(String),

    #[error("malformed SEND, expected 'SEND <power>: \"...\"': '{0}'")]
    Malformed(String),

    #[error("unknown power '{0}'")]
    UnknownPower(String),

    #[error("empty message content")]
    EmptyContent,
}

/// Parses one `SEND` line.
pub fn parse_send_line(line: &str) -> Result<DiplomaticMessage, PressError> {
    let trimmed = line.trim();
    let rest = strip_send_keyword(trimmed).ok_or_else(|| PressError::NotSend(line.to_string()))?;

    let (target_text, content_text) = rest
        .split_once(':')
        .ok_or_else(|| PressError::Malformed(line.to_string()))?;

    let target_text = target_text.trim();
    let to = if target_text.eq_ignore_ascii_case("all") {
        Recipient::All
    } else {
        Recipient::Power(
            Power::parse(target_text)
                .ok_or_else(|| PressError::UnknownPower(target_text.to_string()))?,
        )
    };

    let content = unquote(content_text.trim());
    if content.is_empty() {
        return Err(PressError::EmptyContent);
    }

    let (stage, content) = take_stage_tag(&content);
    if content.is_empty() {
        return Err(PressError::EmptyContent);
    }
    let conditional = extract_conditional(&content);

    Ok(DiplomaticMessage { to, content, stage, conditional })
}

fn strip_send_keyword(line: &str) -> Option<&str> {
    let upper = line.to_ascii_uppercase();
    if upper.starts_with("SEND TO ") {
        Some(line[8..].trim_start())
    } else if upper.starts_with("SEND ") {
        Some(line[5..].trim_start())
    } else {
        None
    }
}

/// Removes one pair of matching single or double quotes, if present.
fn unquote(s: &str) -> String {
    let s = s.trim();
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return s[1..s.len() - 1].trim().to_string();
        }
    }
    s.to_string()
}

/// Splits a leading `[STAGE]` tag off the content.
fn take_stage_tag(content: &str) -> (Option<NegotiationStage>, String) {
    let trimmed = content.trim_start();
    if let Some(rest) = trimmed.strip_prefix('[') {
        if let Some(close) = rest.find(']') {
            if let Some(stage) = NegotiationStage::parse(&rest[..close]) {
                return (Some(stage), rest[close + 1..].trim().to_string());
            }
        }
    }
    (None, content.trim().to_string())
}

/// Finds an `IF <condition>, THEN <commitment>` clause. The clause stays
/// in the content; this only lifts it into structured metadata.
fn extract_conditional(content: &str) -> Option<Conditional> {
    let upper = content.to_ascii_uppercase();
    let if_pos = if upper.starts_with("IF ") {
        0
    } else {
        upper.find(" IF ").map(|p| p + 1)?
    };
    let after_if = if_pos + 3;

    let then_rel = upper[after_if..]
        .find(", THEN ")
        .map(|p| (p, p + 7))
        .or_else(|| upper[after_if..].find(" THEN ").map(|p| (p, p + 6)))?;

    let condition = content[after_if..after_if + then_rel.0].trim().to_string();
    let commitment = content[after_if + then_rel.1..]
        .trim()
        .trim_end_matches(['.', '!'])
        .to_string();
    if condition.is_empty() || commitment.is_empty() {
        return None;
    }
    Some(Conditional { condition, commitment })
}
