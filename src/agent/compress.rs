//! Prompt compression.
//!
//! The level is a deterministic function of the turn number; each block
//! is shrunk independently, and for every block the emitted length is
//! monotonically non-increasing across none -> moderate -> aggressive.

use std::collections::BTreeSet;

use crate::board::province::{Power, ALL_POWERS};

use super::memory::{AgentMemory, RelationshipTag};
use super::prompt::{BlockKind, PowerView, PromptBlock};

/// How hard to compress, selected by turn number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompressionLevel {
    None,
    Moderate,
    Aggressive,
}

impl CompressionLevel {
    /// Turns 0-3 are verbatim, 4-8 moderate, 9 and later aggressive.
    pub fn for_turn(turn: u32) -> CompressionLevel {
        match turn {
            0..=3 => CompressionLevel::None,
            4..=8 => CompressionLevel::Moderate,
            _ => CompressionLevel::Aggressive,
        }
    }
}

/// A power counts as relevant under aggressive compression when it is an
/// ally or enemy, has units adjacent to ours, or holds 12+ centers.
pub const RELEVANT_CENTER_THRESHOLD: usize = 12;

const RULES_COMPACT: &str = "\
RULES: simultaneous orders; HOLD/MOVE/SUPPORT/CONVOY. Support adds 1
strength and is cut by attacks from elsewhere. Equal moves bounce.
Dislodged units retreat or disband. Fall occupation captures centers;
builds at open home centers. 18 centers wins.";

const RULES_BRIEF: &str = "\
RULES: simultaneous orders; support adds 1, cut by attack; bounces
stand off; Fall captures centers; 18 wins.";

const GUIDE_COMPACT: &str = "\
GUIDANCE: ally before you attack; one front at a time; supported moves
beat lone ones; coalitions form against the leader; stab only for a
center you can keep.";

const GUIDE_BRIEF: &str = "\
GUIDANCE: ally first, one front, support your attacks, beware the
leader.";

const FORMAT_COMPACT: &str = "\
FORMAT: ORDERS: section, one per line. `A PAR -> BUR`, `A PAR HOLD`,
`A GAS SUPPORT A PAR -> BUR`, `F NTH CONVOY A LON -> NWY`, coasts as
`(NC)`. RETREATS:/BUILDS: likewise. DIPLOMACY: `SEND France: \"...\"`.";

const FORMAT_BRIEF: &str = "\
FORMAT: ORDERS: lines like `A PAR -> BUR`; DIPLOMACY: `SEND France:
\"...\"`.";

const GUIDELINES_COMPACT: &str = "\
Reply with REASONING: then ORDERS: (one line per unit); DIPLOMACY:
optional.";

/// Compresses one block. The view and memory feed the game-state and
/// diary blocks; static blocks ignore them.
pub fn compress_block(
    block: &PromptBlock,
    level: CompressionLevel,
    view: &PowerView,
    memory: &AgentMemory,
) -> String {
    if level == CompressionLevel::None {
        return block.text.clone();
    }
    match block.kind {
        BlockKind::RulesReference => pick(level, RULES_COMPACT, RULES_BRIEF),
        BlockKind::StrategyGuide => pick(level, GUIDE_COMPACT, GUIDE_BRIEF),
        BlockKind::PowerStrategy => match level {
            CompressionLevel::Moderate => compact_power_strategy(view.power),
            _ => String::new(),
        },
        BlockKind::OrderFormat => pick(level, FORMAT_COMPACT, FORMAT_BRIEF),
        BlockKind::ResponseGuidelines => match level {
            CompressionLevel::Moderate => GUIDELINES_COMPACT.to_string(),
            _ => String::new(),
        },
        BlockKind::GameState => compact_game_state(view, level, memory),
        BlockKind::Diary => compact_diary(memory, level),
    }
}

fn pick(level: CompressionLevel, moderate: &str, brief: &str) -> String {
    match level {
        CompressionLevel::Aggressive => brief.to_string(),
        _ => moderate.to_string(),
    }
}

fn compact_power_strategy(power: Power) -> String {
    let line = match power {
        Power::England => "England: fleets first; hold the North Sea; pick one continental ally.",
        Power::France => "France: take Iberia; choose Channel or Burgundy as the front.",
        Power::Germany => "Germany: Holland and Denmark; keep England and France divided.",
        Power::Italy => "Italy: Tunis now; Lepanto or an Austrian strike later.",
        Power::Austria => "Austria: cover Trieste; one friend among Russia/Turkey.",
        Power::Russia => "Russia: one war at a time; Sweden north, Black Sea south.",
        Power::Turkey => "Turkey: Bulgaria; settle the Black Sea; expand unhurried.",
    };
    line.to_string()
}

/// Compact `{kind}{prov}` unit notation: `APAR,FBRE`.
fn unit_roster(view: &PowerView, power: Power) -> String {
    let units = view.units_of(power);
    if units.is_empty() {
        return "none".to_string();
    }
    units
        .iter()
        .map(|u| format!("{}{}", u.kind.letter(), u.location))
        .collect::<Vec<_>>()
        .join(",")
}

fn compact_game_state(view: &PowerView, level: CompressionLevel, memory: &AgentMemory) -> String {
    let mut text = format!("STATE {:?} {} {:?}, you are {}.\n", view.season, view.year, view.phase, view.power);

    let detailed: Vec<Power> = match level {
        CompressionLevel::Aggressive => {
            let relevant = relevant_powers(view, memory);
            ALL_POWERS.iter().copied().filter(|p| relevant.contains(p)).collect()
        }
        _ => ALL_POWERS.to_vec(),
    };

    for &power in &detailed {
        text.push_str(&format!(
            "{}: {} [{} SC]\n",
            power,
            unit_roster(view, power),
            view.supply_count(power)
        ));
    }

    let skipped: Vec<Power> = ALL_POWERS
        .iter()
        .copied()
        .filter(|p| !detailed.contains(p))
        .collect();
    if !skipped.is_empty() {
        let fragments: Vec<String> = skipped
            .iter()
            .map(|p| format!("{} {}sc", p, view.supply_count(*p)))
            .collect();
        text.push_str(&format!("Others: {}\n", fragments.join(", ")));
    }

    if !view.pending_builds.is_empty() {
        let fragments: Vec<String> = view
            .pending_builds
            .iter()
            .map(|(p, d)| format!("{} {:+}", p, d))
            .collect();
        text.push_str(&format!("Adjust: {}\n", fragments.join(", ")));
    }
    text
}

/// Allies, enemies, neighbors by unit adjacency, big powers, and self.
pub fn relevant_powers(view: &PowerView, memory: &AgentMemory) -> BTreeSet<Power> {
    let mut out = BTreeSet::new();
    out.insert(view.power);
    for power in ALL_POWERS {
        if power == view.power {
            continue;
        }
        let related = matches!(
            memory.relationship(power),
            RelationshipTag::Ally | RelationshipTag::Friendly | RelationshipTag::Enemy | RelationshipTag::Wary
        );
        if related || view.supply_count(power) >= RELEVANT_CENTER_THRESHOLD {
            out.insert(power);
        }
    }
    out.extend(view.adjacent_powers());
    out
}

/// Diary retention by level: moderate keeps the last 6 entries and 5
/// year summaries; aggressive keeps 4 entries truncated to ~160 chars,
/// 3 summaries, and notes how many earlier years were dropped.
fn compact_diary(memory: &AgentMemory, level: CompressionLevel) -> String {
    let (keep_entries, keep_summaries, truncate) = match level {
        CompressionLevel::Aggressive => (4, 3, Some(160)),
        _ => (6, 5, None),
    };

    let mut text = String::from("DIARY\n");
    let total_summaries = memory.year_summaries.len();
    if truncate.is_some() && total_summaries > keep_summaries {
        text.push_str(&format!("({} earlier years omitted)\n", total_summaries - keep_summaries));
    }
    for summary in memory.year_summaries.iter().skip(total_summaries.saturating_sub(keep_summaries)) {
        text.push_str(&format!("{}: {}\n", summary.year, summary.text));
    }
    let total_entries = memory.diary.len();
    for entry in memory.diary.iter().skip(total_entries.saturating_sub(keep_entries)) {
        let mut body = entry.text.clone();
        if let Some(cap) = truncate {
            if body.len() > cap {
                body.truncate(cap - 3);
                body.push_str("...");
            }
        }
        text.push_str(&format!(
            "{} {:?} {:?}: {}\n",
            entry.year, entry.season, entry.phase, body
        ));
    }
    text
}
