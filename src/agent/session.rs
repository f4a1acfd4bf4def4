//! Per-power agent sessions.
//!
//! A session owns its conversation history, its power's memory, and the
//! turn counter that drives prompt compression. It is the only writer of
//! both: the coordinator hands out `&mut Session` one turn at a time, so
//! prompt building and model calls never interleave for the same power.

use tracing::debug;

use crate::board::province::Power;
use crate::completion::{
    estimate_tokens, ChatMessage, Completion, CompletionError, CompletionRequest, Role,
};
use crate::game::state::{PhaseKind, Season};
use crate::press::PressMessage;

use super::compress::{compress_block, CompressionLevel};
use super::memory::AgentMemory;
use super::prompt::{
    diary_block, game_state_block, order_format_block, power_strategy_block,
    response_guidelines_block, rules_reference_block, strategy_guide_block, PowerView,
};

/// Sampling parameters for one model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for TurnParams {
    fn default() -> Self {
        TurnParams { temperature: 0.7, max_tokens: 2048 }
    }
}

/// One power's conversation with its model.
pub struct Session {
    power: Power,
    model: String,
    history: Vec<ChatMessage>,
    memory: AgentMemory,
    /// Cap on retained non-system messages.
    max_history: usize,
    turns_taken: u32,
}

impl Session {
    pub fn new(power: Power, model: impl Into<String>, max_history: usize) -> Session {
        Session {
            power,
            model: model.into(),
            history: Vec::new(),
            memory: AgentMemory::new(power),
            max_history: max_history.max(2),
            turns_taken: 0,
        }
    }

    pub fn power(&self) -> Power {
        self.power
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn turns_taken(&self) -> u32 {
        self.turns_taken
    }

    pub fn memory(&self) -> &AgentMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut AgentMemory {
        &mut self.memory
    }

    /// The compression level this session's next prompt will use.
    pub fn compression_level(&self) -> CompressionLevel {
        CompressionLevel::for_turn(self.turns_taken)
    }

    /// Installs (or replaces) the system prompt at the head of history.
    pub fn initialize(&mut self, system_prompt: &str) {
        match self.history.first() {
            Some(msg) if msg.role == Role::System => {
                self.history[0] = ChatMessage::now(Role::System, system_prompt);
            }
            _ => {
                self.history.insert(0, ChatMessage::now(Role::System, system_prompt));
            }
        }
    }

    /// Assembles the static system prompt at this session's current
    /// compression level.
    pub fn build_system_prompt(&self, personality: Option<&str>) -> String {
        assemble_system_prompt(self.power, personality, self.compression_level())
    }

    /// Assembles the per-turn user message: state, diary, received
    /// press, and phase instructions.
    pub fn build_turn_prompt(
        &self,
        view: &PowerView,
        press: &[PressMessage],
        phase: PhaseKind,
    ) -> String {
        let level = self.compression_level();
        let mut sections = Vec::new();

        let state = game_state_block(view);
        sections.push(compress_block(&state, level, view, &self.memory));

        let diary = diary_block(&self.memory);
        if !self.memory.diary.is_empty() || !self.memory.year_summaries.is_empty() {
            sections.push(compress_block(&diary, level, view, &self.memory));
        }

        if !press.is_empty() {
            let mut block = String::from("PRESS RECEIVED\n");
            for msg in press {
                let stage = msg
                    .stage
                    .map(|s| format!("[{:?}] ", s).to_ascii_uppercase())
                    .unwrap_or_default();
                block.push_str(&format!("From {}: {}{}\n", msg.from, stage, msg.content));
            }
            sections.push(block);
        }

        sections.push(phase_instructions(phase).to_string());

        let text = sections.join("\n");
        debug!(
            power = %self.power,
            level = ?level,
            tokens = estimate_tokens(&text),
            "turn prompt assembled"
        );
        text
    }

    /// Pushes the turn prompt, calls the model, and records the reply.
    /// Empty or whitespace-only completions are an error; the history
    /// keeps the prompt either way so a retry sees the same context.
    pub async fn call_model(
        &mut self,
        completion: &dyn Completion,
        turn_prompt: String,
        params: TurnParams,
    ) -> Result<String, CompletionError> {
        self.history.push(ChatMessage::now(Role::User, turn_prompt));
        self.trim_history();

        let request = CompletionRequest {
            messages: self.history.clone(),
            model: self.model.clone(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };
        let response = completion.complete(request).await?;
        self.turns_taken += 1;

        if response.content.trim().is_empty() {
            return Err(CompletionError::EmptyReply);
        }

        self.history.push(ChatMessage::now(Role::Assistant, &response.content));
        self.trim_history();
        Ok(response.content)
    }

    /// Appends a structured diary entry about a resolved phase.
    pub fn record_outcome(
        &mut self,
        year: u16,
        season: Season,
        phase: PhaseKind,
        summary: &str,
    ) {
        self.memory.record_diary(year, season, phase, summary);
    }

    /// Drops the oldest non-system message pairs once the cap is
    /// exceeded. The system prompt at index 0 is never dropped.
    fn trim_history(&mut self) {
        let system_count = usize::from(
            self.history.first().map(|m| m.role == Role::System).unwrap_or(false),
        );
        while self.history.len() - system_count > self.max_history {
            // Remove a user/assistant pair where possible to keep the
            // alternation intact.
            self.history.remove(system_count);
            if self.history.len() - system_count > self.max_history
                || self
                    .history
                    .get(system_count)
                    .map(|m| m.role == Role::Assistant)
                    .unwrap_or(false)
            {
                self.history.remove(system_count);
            }
        }
    }
}

/// Builds the static system prompt for a power at a compression level.
pub fn assemble_system_prompt(
    power: Power,
    personality: Option<&str>,
    level: CompressionLevel,
) -> String {
    // The static blocks ignore the view/memory arguments; a placeholder
    // pair keeps the compressor signature uniform.
    let view = PowerView {
        power,
        year: 1901,
        season: Season::Spring,
        phase: PhaseKind::Diplomacy,
        units: Vec::new(),
        sc_ownership: Default::default(),
        pending_retreats: Vec::new(),
        pending_builds: Default::default(),
    };
    let memory = AgentMemory::new(power);

    let mut sections = vec![format!(
        "You are playing Diplomacy as {}. Win by controlling 18 supply centers.",
        power
    )];
    if let Some(personality) = personality {
        sections.push(format!("Personality: {}", personality));
    }
    for block in [
        rules_reference_block(),
        strategy_guide_block(),
        power_strategy_block(power),
        order_format_block(),
        response_guidelines_block(),
    ] {
        let text = compress_block(&block, level, &view, &memory);
        if !text.is_empty() {
            sections.push(text);
        }
    }
    sections.join("\n\n")
}

fn phase_instructions(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Diplomacy => {
            "This is the diplomacy period. Send messages with a DIPLOMACY: \
             section; you may also sketch intended orders, but they are not \
             binding yet."
        }
        PhaseKind::Movement => {
            "Submit your movement orders now in an ORDERS: section, one \
             line per unit."
        }
        PhaseKind::Retreat => {
            "Your dislodged units must retreat or disband. Reply with a \
             RETREATS: section."
        }
        PhaseKind::Build => {
            "Winter adjustments. Reply with a BUILDS: section using BUILD \
             or DISBAND lines to match your center count."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::ScriptedCompletion;
    use crate::game::state::GameState;

    fn session() -> Session {
        Session::new(Power::France, "test-model", 20)
    }

    #[test]
    fn initialize_installs_and_replaces_system_prompt() {
        let mut s = session();
        s.initialize("first");
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.history()[0].role, Role::System);
        s.initialize("second");
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.history()[0].content, "second");
    }

    #[tokio::test]
    async fn call_model_appends_prompt_and_reply() {
        let mut s = session();
        s.initialize("system");
        let c = ScriptedCompletion::cycling(vec!["ORDERS:\nA PAR HOLD".to_string()]);
        let reply = s
            .call_model(&c, "your move".to_string(), TurnParams::default())
            .await
            .unwrap();
        assert!(reply.contains("A PAR HOLD"));
        let roles: Vec<Role> = s.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(s.turns_taken(), 1);
    }

    #[tokio::test]
    async fn empty_reply_is_an_error() {
        let mut s = session();
        s.initialize("system");
        let c = ScriptedCompletion::cycling(vec!["   \n ".to_string()]);
        let err = s
            .call_model(&c, "your move".to_string(), TurnParams::default())
            .await
            .unwrap_err();
        assert_eq!(err, CompletionError::EmptyReply);
    }

    #[tokio::test]
    async fn history_is_bounded_and_keeps_system() {
        let mut s = Session::new(Power::France, "test-model", 4);
        s.initialize("system");
        let c = ScriptedCompletion::cycling(vec!["reply".to_string()]);
        for i in 0..10 {
            s.call_model(&c, format!("turn {}", i), TurnParams::default()).await.unwrap();
        }
        assert!(s.history().len() <= 5, "history length {}", s.history().len());
        assert_eq!(s.history()[0].role, Role::System);
        // Oldest turns are gone, newest remain.
        let text: Vec<&str> = s.history().iter().map(|m| m.content.as_str()).collect();
        assert!(!text.contains(&"turn 0"));
        assert!(text.contains(&"turn 9"));
    }

    #[test]
    fn conversation_entries_are_ordered_by_append_time() {
        let mut s = session();
        s.initialize("system");
        s.history.push(ChatMessage::now(Role::User, "a"));
        s.history.push(ChatMessage::now(Role::Assistant, "b"));
        let times: Vec<u64> = s.history().iter().map(|m| m.timestamp_ms).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }

    #[test]
    fn system_prompt_compression_over_turns() {
        // Turn 0: the power strategy block is present.
        let full = assemble_system_prompt(Power::France, None, CompressionLevel::for_turn(0));
        assert!(full.contains("France Strategy"));

        // Turn 10: aggressive; block gone, under half the size.
        let compressed =
            assemble_system_prompt(Power::France, None, CompressionLevel::for_turn(10));
        assert!(!compressed.contains("France Strategy"));
        assert!(
            compressed.len() < full.len() / 2,
            "aggressive {} vs full {}",
            compressed.len(),
            full.len()
        );
    }

    #[test]
    fn personality_is_included() {
        let text = assemble_system_prompt(
            Power::Turkey,
            Some("cautious and vengeful"),
            CompressionLevel::None,
        );
        assert!(text.contains("cautious and vengeful"));
    }

    #[test]
    fn turn_prompt_includes_state_press_and_instructions() {
        let state = GameState::standard_opening();
        let view = PowerView::of(&state, Power::France);
        let mut s = session();
        let press = vec![PressMessage {
            from: Power::Germany,
            to: crate::parser::press::Recipient::Power(Power::France),
            content: "Shall we split Belgium?".to_string(),
            stage: None,
            conditional: None,
            sent_at_ms: 0,
        }];
        let prompt = s.build_turn_prompt(&view, &press, PhaseKind::Movement);
        assert!(prompt.contains("GAME STATE"));
        assert!(prompt.contains("Shall we split Belgium?"));
        assert!(prompt.contains("ORDERS:"));

        // Diary appears once there is something to remember.
        s.record_outcome(1901, Season::Spring, PhaseKind::Movement, "Bounced in Burgundy.");
        let prompt = s.build_turn_prompt(&view, &[], PhaseKind::Movement);
        assert!(prompt.contains("Bounced in Burgundy."));
    }
}
