//! Game state: the complete snapshot of one game between phases.
//!
//! `GameState` is a plain value owned by the phase machine; units are value
//! records whose location is a province id, and any "what's at province X"
//! question goes through an index rebuilt from the authoritative unit list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::province::{Coast, Power, Province, ALL_PROVINCES, PROVINCE_COUNT};
use crate::board::unit::{Unit, UnitKind};

/// The season of a game turn. `Winter` exists only for the build phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Fall,
    Winter,
}

/// The phase the game is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Diplomacy,
    Movement,
    Retreat,
    Build,
}

/// A destination a dislodged unit may legally retreat to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetreatDest {
    pub province: Province,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coast: Option<Coast>,
}

/// A dislodged unit awaiting a retreat order, with its precomputed legal
/// destination set (possibly empty, in which case only disband remains).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRetreat {
    pub unit: Unit,
    pub attacker_from: Province,
    pub allowed: Vec<RetreatDest>,
}

/// The terminal result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Winner { winner: Power },
    Draw { draw: bool },
}

/// Complete game snapshot between phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub year: u16,
    pub season: Season,
    pub phase: PhaseKind,
    pub units: Vec<Unit>,
    /// Supply-center owner by province; neutral centers are absent.
    pub sc_ownership: BTreeMap<Province, Power>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_retreats: Vec<PendingRetreat>,
    /// Signed adjustment per power during the build phase
    /// (positive = builds allowed, negative = disbands required).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pending_builds: BTreeMap<Power, i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl GameState {
    /// An empty board in the given year/season/phase.
    pub fn empty(year: u16, season: Season, phase: PhaseKind) -> GameState {
        GameState {
            year,
            season,
            phase,
            units: Vec::new(),
            sc_ownership: BTreeMap::new(),
            pending_retreats: Vec::new(),
            pending_builds: BTreeMap::new(),
            outcome: None,
        }
    }

    /// The standard 1901 opening: 22 units on their home centers, each
    /// power owning its home supply centers, Spring diplomacy about to
    /// begin.
    pub fn standard_opening() -> GameState {
        let mut state = GameState::empty(1901, Season::Spring, PhaseKind::Diplomacy);

        state.units = vec![
            Unit::fleet(Power::England, Province::Lon),
            Unit::fleet(Power::England, Province::Edi),
            Unit::army(Power::England, Province::Lvp),
            Unit::army(Power::France, Province::Par),
            Unit::army(Power::France, Province::Mar),
            Unit::fleet(Power::France, Province::Bre),
            Unit::army(Power::Germany, Province::Ber),
            Unit::army(Power::Germany, Province::Mun),
            Unit::fleet(Power::Germany, Province::Kie),
            Unit::army(Power::Italy, Province::Rom),
            Unit::army(Power::Italy, Province::Ven),
            Unit::fleet(Power::Italy, Province::Nap),
            Unit::army(Power::Austria, Province::Vie),
            Unit::army(Power::Austria, Province::Bud),
            Unit::fleet(Power::Austria, Province::Tri),
            Unit::army(Power::Russia, Province::Mos),
            Unit::army(Power::Russia, Province::War),
            Unit::fleet(Power::Russia, Province::Sev),
            Unit::fleet_on(Power::Russia, Province::Stp, Coast::South),
            Unit::army(Power::Turkey, Province::Con),
            Unit::army(Power::Turkey, Province::Smy),
            Unit::fleet(Power::Turkey, Province::Ank),
        ];

        for p in ALL_PROVINCES {
            if let Some(power) = p.home_of() {
                if p.is_supply_center() {
                    state.sc_ownership.insert(p, power);
                }
            }
        }

        state
    }

    /// Rebuilds the province-indexed occupancy table from the unit list.
    pub fn unit_index(&self) -> [Option<usize>; PROVINCE_COUNT] {
        let mut index = [None; PROVINCE_COUNT];
        for (i, u) in self.units.iter().enumerate() {
            index[u.location as usize] = Some(i);
        }
        index
    }

    /// The unit at a province, if any.
    pub fn unit_at(&self, province: Province) -> Option<&Unit> {
        self.units.iter().find(|u| u.location == province)
    }

    /// All units of one power.
    pub fn units_of(&self, power: Power) -> Vec<Unit> {
        self.units.iter().copied().filter(|u| u.owner == power).collect()
    }

    pub fn unit_count(&self, power: Power) -> usize {
        self.units.iter().filter(|u| u.owner == power).count()
    }

    pub fn supply_count(&self, power: Power) -> usize {
        self.sc_ownership.values().filter(|o| **o == power).count()
    }

    /// Powers that still have at least one unit on the board.
    pub fn surviving_powers(&self) -> Vec<Power> {
        let mut out: Vec<Power> = Vec::new();
        for u in &self.units {
            if !out.contains(&u.owner) {
                out.push(u.owner);
            }
        }
        out
    }

    /// True once a winner or draw has been recorded.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Checks the cross-phase state invariants. Used by tests and debug
    /// assertions at phase boundaries.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.units.len() > 34 {
            return Err(format!("{} units on the board", self.units.len()));
        }
        let mut seen = [false; PROVINCE_COUNT];
        for u in &self.units {
            if seen[u.location as usize] {
                return Err(format!("two units at {}", u.location));
            }
            seen[u.location as usize] = true;
            if !u.position_is_legal() {
                return Err(format!("illegal position for {}", u));
            }
        }
        for p in self.sc_ownership.keys() {
            if !p.is_supply_center() {
                return Err(format!("{} owned but not a supply center", p));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_opening_is_valid() {
        let state = GameState::standard_opening();
        assert_eq!(state.units.len(), 22);
        assert_eq!(state.year, 1901);
        assert_eq!(state.season, Season::Spring);
        assert_eq!(state.phase, PhaseKind::Diplomacy);
        state.check_invariants().unwrap();
    }

    #[test]
    fn standard_opening_ownership() {
        let state = GameState::standard_opening();
        assert_eq!(state.sc_ownership.len(), 22);
        assert_eq!(state.supply_count(Power::Russia), 4);
        for power in crate::board::ALL_POWERS {
            assert_eq!(state.unit_count(power), state.supply_count(power));
        }
    }

    #[test]
    fn unit_index_matches_unit_list() {
        let state = GameState::standard_opening();
        let index = state.unit_index();
        for (i, u) in state.units.iter().enumerate() {
            assert_eq!(index[u.location as usize], Some(i));
        }
        assert_eq!(index[Province::Nth as usize], None);
    }

    #[test]
    fn surviving_powers_at_opening() {
        let state = GameState::standard_opening();
        assert_eq!(state.surviving_powers().len(), 7);
    }

    #[test]
    fn invariant_catches_duplicate_location() {
        let mut state = GameState::empty(1901, Season::Spring, PhaseKind::Movement);
        state.units.push(Unit::army(Power::France, Province::Par));
        state.units.push(Unit::army(Power::Germany, Province::Par));
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn invariant_catches_army_at_sea() {
        let mut state = GameState::empty(1901, Season::Spring, PhaseKind::Movement);
        state.units.push(Unit::army(Power::England, Province::Nth));
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn state_json_roundtrip() {
        let state = GameState::standard_opening();
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn unknown_fields_ignored_on_read() {
        let state = GameState::empty(1901, Season::Spring, PhaseKind::Diplomacy);
        let mut value = serde_json::to_value(&state).unwrap();
        value["future_field"] = serde_json::json!("ignored");
        let back: GameState = serde_json::from_value(value).unwrap();
        assert_eq!(back.year, 1901);
    }

    #[test]
    fn outcome_json_layout() {
        let win = Outcome::Winner { winner: Power::France };
        assert_eq!(serde_json::to_string(&win).unwrap(), r#"{"winner":"France"}"#);
        let draw = Outcome::Draw { draw: true };
        assert_eq!(serde_json::to_string(&draw).unwrap(), r#"{"draw":true}"#);
    }

    #[test]
    fn kind_of_unit_kept_in_json() {
        let unit = Unit::fleet_on(Power::Russia, Province::Stp, Coast::South);
        let json = serde_json::to_string(&unit).unwrap();
        let back: Unit = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, UnitKind::Fleet);
        assert_eq!(back.coast, Some(Coast::South));
    }
}
