//! Prompt assembly: the power view and the prompt blocks.
//!
//! Agents never see `GameState` directly; they get a `PowerView`, a
//! defensive copy assembled for prompting. The prompt itself is built
//! from named blocks so the compressor can shrink each one independently.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::adjacency::neighbors;
use crate::board::province::{Power, Province, ALL_POWERS};
use crate::board::unit::Unit;
use crate::game::state::{GameState, PendingRetreat, PhaseKind, Season};

use super::memory::AgentMemory;

/// A defensive copy of the public game state, from one power's seat.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerView {
    pub power: Power,
    pub year: u16,
    pub season: Season,
    pub phase: PhaseKind,
    pub units: Vec<Unit>,
    pub sc_ownership: BTreeMap<Province, Power>,
    pub pending_retreats: Vec<PendingRetreat>,
    pub pending_builds: BTreeMap<Power, i32>,
}

impl PowerView {
    pub fn of(state: &GameState, power: Power) -> PowerView {
        PowerView {
            power,
            year: state.year,
            season: state.season,
            phase: state.phase,
            units: state.units.clone(),
            sc_ownership: state.sc_ownership.clone(),
            pending_retreats: state.pending_retreats.clone(),
            pending_builds: state.pending_builds.clone(),
        }
    }

    pub fn units_of(&self, power: Power) -> Vec<Unit> {
        self.units.iter().copied().filter(|u| u.owner == power).collect()
    }

    pub fn supply_count(&self, power: Power) -> usize {
        self.sc_ownership.values().filter(|o| **o == power).count()
    }

    /// Powers with at least one unit adjacent to one of ours.
    pub fn adjacent_powers(&self) -> BTreeSet<Power> {
        let mut out = BTreeSet::new();
        for own in self.units_of(self.power) {
            for kind in [crate::board::UnitKind::Army, crate::board::UnitKind::Fleet] {
                for neighbor in neighbors(own.location, own.coast, kind) {
                    if let Some(other) = self.units.iter().find(|u| u.location == neighbor) {
                        if other.owner != self.power {
                            out.insert(other.owner);
                        }
                    }
                }
            }
        }
        out
    }
}

/// The named prompt blocks the compressor operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    RulesReference,
    StrategyGuide,
    PowerStrategy,
    OrderFormat,
    ResponseGuidelines,
    GameState,
    Diary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptBlock {
    pub kind: BlockKind,
    pub text: String,
}

pub const RULES_REFERENCE: &str = "\
RULES REFERENCE
Diplomacy is played on a map of 75 provinces, 34 of which are supply
centers. Each power commands armies and fleets; every unit has equal
strength. All orders for a phase are written simultaneously and resolved
together. A unit may HOLD, MOVE to an adjacent province, SUPPORT another
unit's hold or move, or (fleets at sea) CONVOY an army across water.
Support adds one strength to the supported action; a move succeeds only
if its strength exceeds the strength of whatever is in, or contesting,
the destination. A support is cut when the supporting unit is attacked
from any province other than the one the support is directed against.
Equal-strength moves into the same province all bounce, and no unit
enters. A unit forced out of its province is dislodged and must retreat
to an adjacent vacant province (never the attacker's origin, never a
province left vacant by a bounce) or disband. Armies may cross water
only when a chain of fleets convoys them; dislodging any fleet of the
chain disrupts the convoy. After the Fall turn, each supply center
belongs to the power occupying it; powers then build in their unoccupied
home centers or disband down to their center count. The first power to
own 18 supply centers wins the game.";

pub const STRATEGY_GUIDE: &str = "\
STRATEGY GUIDE
Diplomacy is won with allies and board position, not tactics alone.
Secure your home centers early, take the neutral centers within reach in
the first year, and pick one front at a time: fighting two wars loses
both. Supported attacks beat unsupported ones, so coordinate with a
neighbor before you move. Every promise you make is information; every
promise you break is a reputation cost that compounds. Watch the two
strongest powers: if someone approaches 12 or more centers, expect the
table to turn on them, and be the one organizing the coalition rather
than its last target. Fleets shape the edges of the map, armies decide
its middle. A stab is only worth it when it gains a center you can keep
and denies your victim any road back.";

pub const ORDER_FORMAT: &str = "\
ORDER FORMAT
Write one order per line in an ORDERS: section. Use 3-letter province
ids. Forms:
  A PAR HOLD
  A PAR -> BUR
  F MAO -> SPA (NC)        (name a coast for BUL, SPA, STP)
  A LON -> NWY VIA CONVOY
  A GAS SUPPORT A PAR -> BUR
  A TYR SUPPORT A VIE      (support in place)
  F NTH CONVOY A LON -> NWY
During retreats, use a RETREATS: section with `A BUR -> GAS` or
`A BUR DISBAND`. During builds, use a BUILDS: section with
`BUILD A PAR`, `BUILD F STP (NC)`, or `DISBAND A UKR`.
To negotiate, use a DIPLOMACY: section with lines like
  SEND France: \"[OPENING] Shall we split Belgium?\"
Stage tags are OPENING, COUNTER, FINAL, ACCEPT, REJECT. A conditional
commitment is written IF <condition>, THEN <commitment>.";

pub const RESPONSE_GUIDELINES: &str = "\
RESPONSE GUIDELINES
Think through the position before you commit. Keep a REASONING: section
for your private analysis; it is never shown to other powers. Then give
exactly one ORDERS: section (and RETREATS:/BUILDS: when those phases
apply) with one order per line for every unit you own, and an optional
DIPLOMACY: section with SEND lines. Do not invent units or provinces.
An order you fail to give defaults to HOLD. Messages are delivered only
during the diplomacy phase, so say what matters now.";

/// The long-form per-power strategy notes.
pub fn power_strategy(power: Power) -> &'static str {
    match power {
        Power::England => "England Strategy\n\
            An island power: you live and die by fleets. Take Norway in \
            1901, contest the North Sea permanently, and decide early \
            whether France or Germany is your continental partner. You are \
            hard to kill but slow to grow; play the long game and never \
            let one power unify the coast from Brest to Kiel.",
        Power::France => "France Strategy\n\
            The strongest corner position. Iberia gives you two builds in \
            1901 if England stays friendly. Choose between the English \
            Channel and Burgundy as your defended border and commit. \
            Germany is your natural first partner and your natural second \
            target; the Mid-Atlantic keeps Italy honest in the south.",
        Power::Germany => "Germany Strategy\n\
            The center of the board: three neighbors, three fronts. \
            Holland and Denmark are yours in 1901 if you open cleanly. \
            Keep England and France fighting each other, lean on one of \
            them with the other's help, and never leave Munich uncovered \
            against Austria or Russia.",
        Power::Italy => "Italy Strategy\n\
            Slow start, strong midgame. Tunis is your only safe 1901 \
            gain. The Lepanto against Turkey is the classic plan; the \
            alternative is an early strike on a distracted Austria. Do \
            not fight France at sea while your east is unsettled.",
        Power::Austria => "Austria Strategy\n\
            The board's most attacked power. Survive 1901 with Trieste \
            covered and Galicia bounced, befriend exactly one of Russia \
            or Turkey, and keep Italy pointed west. Serbia, Greece, and \
            Rumania are your growth; the Balkans reward the power with \
            the most patient diplomacy.",
        Power::Russia => "Russia Strategy\n\
            Four centers and two theaters. In the north, Sweden and the \
            fate of Scandinavia; in the south, Turkey and the Black Sea \
            standoff. You cannot win both early wars; pick one, make \
            peace in the other, and watch England's fleets: a northern \
            coalition against you forms quickly.",
        Power::Turkey => "Turkey Strategy\n\
            The corner fortress. Bulgaria is guaranteed; the Black Sea \
            bounce with Russia is the opening question. Expand through \
            the Balkans with Austria or through Armenia with neither. \
            You are nearly impossible to eliminate; trade speed for \
            safety and arrive at the endgame intact.",
    }
}

pub fn rules_reference_block() -> PromptBlock {
    PromptBlock { kind: BlockKind::RulesReference, text: RULES_REFERENCE.to_string() }
}

pub fn strategy_guide_block() -> PromptBlock {
    PromptBlock { kind: BlockKind::StrategyGuide, text: STRATEGY_GUIDE.to_string() }
}

pub fn power_strategy_block(power: Power) -> PromptBlock {
    PromptBlock { kind: BlockKind::PowerStrategy, text: power_strategy(power).to_string() }
}

pub fn order_format_block() -> PromptBlock {
    PromptBlock { kind: BlockKind::OrderFormat, text: ORDER_FORMAT.to_string() }
}

pub fn response_guidelines_block() -> PromptBlock {
    PromptBlock { kind: BlockKind::ResponseGuidelines, text: RESPONSE_GUIDELINES.to_string() }
}

/// The verbose game-state dump used at compression level `none`.
pub fn game_state_block(view: &PowerView) -> PromptBlock {
    let mut text = format!(
        "GAME STATE\n{:?} {} — {:?} phase. You are {}.\n",
        view.season, view.year, view.phase, view.power
    );
    for power in ALL_POWERS {
        let units = view.units_of(power);
        let centers = view.supply_count(power);
        text.push_str(&format!(
            "{} — {} supply centers, {} units:\n",
            power,
            centers,
            units.len()
        ));
        if units.is_empty() {
            text.push_str("  (no units)\n");
        }
        for unit in units {
            text.push_str(&format!("  {} in {}", unit, unit.location.name()));
            if unit.location.is_supply_center() {
                text.push_str(" [SC]");
            }
            text.push('\n');
        }
    }
    if !view.pending_retreats.is_empty() {
        text.push_str("Dislodged units awaiting retreat:\n");
        for p in &view.pending_retreats {
            let options: Vec<String> =
                p.allowed.iter().map(|d| d.province.id().to_string()).collect();
            text.push_str(&format!(
                "  {} ({}), attacked from {}, may retreat to: {}\n",
                p.unit,
                p.unit.owner,
                p.attacker_from,
                if options.is_empty() { "nowhere (must disband)".to_string() } else { options.join(", ") }
            ));
        }
    }
    if !view.pending_builds.is_empty() {
        text.push_str("Winter adjustments:\n");
        for (power, delta) in &view.pending_builds {
            text.push_str(&format!("  {}: {:+}\n", power, delta));
        }
    }
    PromptBlock { kind: BlockKind::GameState, text }
}

/// The full diary block used at compression level `none`.
pub fn diary_block(memory: &AgentMemory) -> PromptBlock {
    let mut text = String::from("DIARY\n");
    for summary in &memory.year_summaries {
        text.push_str(&format!("{}: {}\n", summary.year, summary.text));
    }
    for entry in &memory.diary {
        text.push_str(&format!(
            "{} {:?} {:?}: {}\n",
            entry.year, entry.season, entry.phase, entry.text
        ));
    }
    PromptBlock { kind: BlockKind::Diary, text }
}
