//! Per-power agent memory.
//!
//! Trust levels, relationship tags, an event log, goals, and a structured
//! diary. Diary entries for the current year are kept verbatim; at each
//! year boundary they are rolled up into a one-paragraph year summary so
//! memory stays bounded over long games.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::province::Power;
use crate::game::state::{PhaseKind, Season};

/// A coarse relationship label toward another power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipTag {
    Ally,
    Friendly,
    Neutral,
    Wary,
    Enemy,
}

/// A dated entry in the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub year: u16,
    pub text: String,
}

/// One diary entry for the current year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub year: u16,
    pub season: Season,
    pub phase: PhaseKind,
    pub text: String,
}

/// A consolidated summary of a completed year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: u16,
    pub text: String,
}

/// Everything one power remembers across a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMemory {
    pub power: Power,
    /// Trust per power, clamped to [-1, 1]. Absent means unestablished.
    pub trust: BTreeMap<Power, f32>,
    pub relationships: BTreeMap<Power, RelationshipTag>,
    pub events: Vec<MemoryEvent>,
    pub goals: Vec<String>,
    /// Current-year entries, verbatim.
    pub diary: Vec<DiaryEntry>,
    /// Rolled-up summaries of completed years, oldest first.
    pub year_summaries: Vec<YearSummary>,
}

impl AgentMemory {
    pub fn new(power: Power) -> AgentMemory {
        AgentMemory {
            power,
            trust: BTreeMap::new(),
            relationships: BTreeMap::new(),
            events: Vec::new(),
            goals: Vec::new(),
            diary: Vec::new(),
            year_summaries: Vec::new(),
        }
    }

    /// Adjusts trust toward another power, clamped to [-1, 1].
    pub fn adjust_trust(&mut self, toward: Power, delta: f32) {
        let entry = self.trust.entry(toward).or_insert(0.0);
        *entry = (*entry + delta).clamp(-1.0, 1.0);
    }

    pub fn trust_in(&self, toward: Power) -> f32 {
        self.trust.get(&toward).copied().unwrap_or(0.0)
    }

    pub fn tag(&mut self, toward: Power, tag: RelationshipTag) {
        self.relationships.insert(toward, tag);
    }

    pub fn relationship(&self, toward: Power) -> RelationshipTag {
        self.relationships
            .get(&toward)
            .copied()
            .unwrap_or(RelationshipTag::Neutral)
    }

    pub fn record_event(&mut self, year: u16, text: impl Into<String>) {
        self.events.push(MemoryEvent { year, text: text.into() });
    }

    pub fn set_goals(&mut self, goals: Vec<String>) {
        self.goals = goals;
    }

    /// Appends one diary entry for the current year.
    pub fn record_diary(
        &mut self,
        year: u16,
        season: Season,
        phase: PhaseKind,
        text: impl Into<String>,
    ) {
        self.diary.push(DiaryEntry { year, season, phase, text: text.into() });
    }

    /// Rolls the given year's diary entries into one summary and clears
    /// them. Called when the game advances past `year`.
    pub fn roll_up_year(&mut self, year: u16) {
        let entries: Vec<DiaryEntry> =
            self.diary.iter().filter(|e| e.year == year).cloned().collect();
        self.diary.retain(|e| e.year != year);
        if entries.is_empty() {
            return;
        }
        let text = entries
            .iter()
            .map(|e| format!("{:?} {:?}: {}", e.season, e.phase, first_sentence(&e.text)))
            .collect::<Vec<_>>()
            .join(" ");
        self.year_summaries.push(YearSummary { year, text });
    }
}

/// The first sentence of a diary entry, capped at 120 characters.
fn first_sentence(text: &str) -> String {
    let end = text.find(['.', '\n']).map(|i| i + 1).unwrap_or(text.len());
    let mut s: String = text[..end].trim().to_string();
    if s.len() > 120 {
        s.truncate(117);
        s.push_str("...");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_clamps_to_unit_interval() {
        let mut m = AgentMemory::new(Power::France);
        m.adjust_trust(Power::Germany, 0.8);
        m.adjust_trust(Power::Germany, 0.8);
        assert_eq!(m.trust_in(Power::Germany), 1.0);
        m.adjust_trust(Power::Germany, -3.0);
        assert_eq!(m.trust_in(Power::Germany), -1.0);
        assert_eq!(m.trust_in(Power::Italy), 0.0);
    }

    #[test]
    fn relationships_default_neutral() {
        let mut m = AgentMemory::new(Power::France);
        assert_eq!(m.relationship(Power::England), RelationshipTag::Neutral);
        m.tag(Power::England, RelationshipTag::Ally);
        assert_eq!(m.relationship(Power::England), RelationshipTag::Ally);
    }

    #[test]
    fn year_rollup_consolidates_and_clears() {
        let mut m = AgentMemory::new(Power::France);
        m.record_diary(1901, Season::Spring, PhaseKind::Movement, "Took Burgundy. Germany bounced.");
        m.record_diary(1901, Season::Fall, PhaseKind::Movement, "Held everything.");
        m.record_diary(1902, Season::Spring, PhaseKind::Movement, "New year begins.");

        m.roll_up_year(1901);

        assert_eq!(m.diary.len(), 1);
        assert_eq!(m.diary[0].year, 1902);
        assert_eq!(m.year_summaries.len(), 1);
        let summary = &m.year_summaries[0];
        assert_eq!(summary.year, 1901);
        assert!(summary.text.contains("Took Burgundy."));
        assert!(summary.text.contains("Held everything."));
        // Only the first sentence survives.
        assert!(!summary.text.contains("Germany bounced"));
    }

    #[test]
    fn rollup_of_empty_year_adds_nothing() {
        let mut m = AgentMemory::new(Power::France);
        m.roll_up_year(1901);
        assert!(m.year_summaries.is_empty());
    }

    #[test]
    fn long_entries_truncated_in_summary() {
        let mut m = AgentMemory::new(Power::France);
        let long = "x".repeat(400);
        m.record_diary(1901, Season::Spring, PhaseKind::Movement, long);
        m.roll_up_year(1901);
        assert!(m.year_summaries[0].text.len() < 200);
    }

    #[test]
    fn memory_json_roundtrip() {
        let mut m = AgentMemory::new(Power::France);
        m.adjust_trust(Power::Germany, -0.5);
        m.tag(Power::England, RelationshipTag::Ally);
        m.record_event(1901, "England proposed an alliance");
        m.record_diary(1901, Season::Spring, PhaseKind::Movement, "Opened to Burgundy.");
        let json = serde_json::to_string(&m).unwrap();
        let back: AgentMemory = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
