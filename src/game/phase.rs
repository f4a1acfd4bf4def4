//! The phase machine: the only owner and mutator of `GameState`.
//!
//! Sequences DIPLOMACY -> MOVEMENT [-> RETREAT] through the year, updates
//! supply-center ownership after Fall, detects victory, and runs the
//! Winter build phase when some power's centers and units disagree.
//!
//! Calling a resolve method in the wrong phase is a programmer error and
//! panics; orderly misuse by agents is filtered out long before this
//! layer.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::board::order::{BuildAction, Order, RetreatOrder};
use crate::board::province::{Power, ALL_POWERS, ALL_PROVINCES};
use crate::board::unit::{Unit, UnitKind};
use crate::judge::{adjudicate, resolve_builds, resolve_retreats};
use crate::judge::{Adjudication, BuildOutcome, RetreatOutcome};

use super::state::{GameState, Outcome, PendingRetreat, PhaseKind, Season};

/// What one resolving step produced; feeds events, journals, and agent
/// memories.
#[derive(Debug, Clone, Default)]
pub struct PhaseReport {
    pub year: u16,
    pub season: Season,
    pub phase: PhaseKind,
    pub adjudication: Option<Adjudication>,
    pub retreat_outcomes: Vec<RetreatOutcome>,
    pub build_outcomes: Vec<BuildOutcome>,
}

impl Default for Season {
    fn default() -> Self {
        Season::Spring
    }
}

impl Default for PhaseKind {
    fn default() -> Self {
        PhaseKind::Diplomacy
    }
}

/// Owns the game state and drives it through the phase graph.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    state: GameState,
}

impl PhaseMachine {
    pub fn new(state: GameState) -> PhaseMachine {
        PhaseMachine { state }
    }

    /// A machine at the standard 1901 opening.
    pub fn standard() -> PhaseMachine {
        PhaseMachine::new(GameState::standard_opening())
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Consumes the machine, yielding the final state.
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// DIPLOMACY -> MOVEMENT. The press period is over; orders are due.
    pub fn begin_movement(&mut self) {
        self.expect_phase(PhaseKind::Diplomacy);
        self.state.phase = PhaseKind::Movement;
        debug!(year = self.state.year, season = ?self.state.season, "movement phase open");
    }

    /// Adjudicates one batch of movement orders and advances the phase.
    pub fn resolve_movement(
        &mut self,
        orders_by_power: &BTreeMap<Power, Vec<Order>>,
    ) -> PhaseReport {
        self.expect_phase(PhaseKind::Movement);

        let result = adjudicate(&self.state.units, orders_by_power);

        // Relocate every successful mover.
        let mut moved: Vec<(usize, crate::board::Province, Option<crate::board::Coast>)> =
            Vec::new();
        for (i, unit) in self.state.units.iter().enumerate() {
            if let Some(outcome) = result.outcomes.get(&unit.location) {
                if outcome.success {
                    if let Order::Move { dest, dest_coast, .. } = outcome.order {
                        let coast = match unit.kind {
                            UnitKind::Army => None,
                            UnitKind::Fleet => dest_coast,
                        };
                        moved.push((i, dest, coast));
                    }
                }
            }
        }
        for (i, dest, coast) in moved {
            self.state.units[i].location = dest;
            self.state.units[i].coast = coast;
        }

        // Pull dislodged units off the board; they wait in pending_retreats.
        let mut pending: Vec<PendingRetreat> = Vec::new();
        for d in &result.dislodgements {
            self.state.units.retain(|u| {
                !(u.owner == d.unit.owner
                    && u.location == d.unit.location
                    && u.kind == d.unit.kind)
            });
            pending.push(PendingRetreat {
                unit: d.unit,
                attacker_from: d.attacker_from,
                allowed: d.retreats.clone(),
            });
        }

        let report = PhaseReport {
            year: self.state.year,
            season: self.state.season,
            phase: PhaseKind::Movement,
            adjudication: Some(result),
            ..PhaseReport::default()
        };

        debug_assert!(self.state.check_invariants().is_ok());

        if pending.is_empty() {
            self.after_movement();
        } else {
            info!(count = pending.len(), "dislodgements; retreat phase follows");
            self.state.pending_retreats = pending;
            self.state.phase = PhaseKind::Retreat;
        }

        report
    }

    /// Resolves the retreat phase and advances.
    pub fn resolve_retreats(&mut self, orders: &[(Power, RetreatOrder)]) -> PhaseReport {
        self.expect_phase(PhaseKind::Retreat);

        let pending = std::mem::take(&mut self.state.pending_retreats);
        let outcomes = resolve_retreats(orders, &pending);

        for outcome in &outcomes {
            if !outcome.success || outcome.order.is_disband() {
                continue;
            }
            let at = outcome.order.unit.province;
            if let Some(entry) = pending.iter().find(|p| p.unit.location == at) {
                let dest = outcome.order.dest.expect("retreat has a destination");
                let coast = match entry.unit.kind {
                    UnitKind::Army => None,
                    UnitKind::Fleet => outcome
                        .order
                        .dest_coast
                        .or_else(|| single_allowed_coast(entry, dest)),
                };
                self.state.units.push(Unit {
                    kind: entry.unit.kind,
                    owner: entry.unit.owner,
                    location: dest,
                    coast,
                });
            }
        }

        let report = PhaseReport {
            year: self.state.year,
            season: self.state.season,
            phase: PhaseKind::Retreat,
            retreat_outcomes: outcomes,
            ..PhaseReport::default()
        };

        debug_assert!(self.state.check_invariants().is_ok());
        self.after_movement();
        report
    }

    /// Resolves the Winter build phase and opens the next year.
    pub fn resolve_builds(&mut self, orders: &[(Power, crate::board::BuildOrder)]) -> PhaseReport {
        self.expect_phase(PhaseKind::Build);

        let outcomes = resolve_builds(orders, &self.state);
        for outcome in &outcomes {
            if !outcome.success {
                continue;
            }
            match outcome.order.action {
                BuildAction::Build => {
                    let kind = outcome.order.unit_kind.unwrap_or(UnitKind::Army);
                    let province = outcome.order.province;
                    let coast = match kind {
                        UnitKind::Fleet if province.has_multiple_coasts() => outcome.order.coast,
                        _ => None,
                    };
                    self.state.units.push(Unit { kind, owner: outcome.power, location: province, coast });
                }
                BuildAction::Disband => {
                    let at = outcome.order.province;
                    self.state.units.retain(|u| u.location != at);
                }
            }
        }

        let report = PhaseReport {
            year: self.state.year,
            season: self.state.season,
            phase: PhaseKind::Build,
            build_outcomes: outcomes,
            ..PhaseReport::default()
        };

        self.state.pending_builds.clear();
        debug_assert!(self.state.check_invariants().is_ok());
        self.open_next_year();
        report
    }

    /// Shared continuation after Spring/Fall movement or retreat.
    fn after_movement(&mut self) {
        self.state.pending_retreats.clear();
        match self.state.season {
            Season::Spring => {
                self.state.season = Season::Fall;
                self.state.phase = PhaseKind::Diplomacy;
            }
            Season::Fall => self.post_fall(),
            Season::Winter => unreachable!("movement never happens in winter"),
        }
    }

    /// Post-fall bookkeeping: capture supply centers, check victory, and
    /// either enter Winter builds or open the next year directly.
    fn post_fall(&mut self) {
        for p in ALL_PROVINCES {
            if !p.is_supply_center() {
                continue;
            }
            if let Some(unit) = self.state.unit_at(p) {
                self.state.sc_ownership.insert(p, unit.owner);
            }
        }

        if let Some(outcome) = self.victory_check() {
            info!(?outcome, year = self.state.year, "game over");
            self.state.outcome = Some(outcome);
            return;
        }

        let mut adjustments = BTreeMap::new();
        for power in ALL_POWERS {
            let delta = self.state.supply_count(power) as i32 - self.state.unit_count(power) as i32;
            if delta != 0 {
                adjustments.insert(power, delta);
            }
        }

        if adjustments.is_empty() {
            self.open_next_year();
        } else {
            debug!(?adjustments, "winter adjustments");
            self.state.pending_builds = adjustments;
            self.state.season = Season::Winter;
            self.state.phase = PhaseKind::Build;
        }
    }

    /// Victory rules, in precedence order: 18 centers, sole survivor,
    /// lifeless board.
    fn victory_check(&self) -> Option<Outcome> {
        for power in ALL_POWERS {
            if self.state.supply_count(power) >= 18 {
                return Some(Outcome::Winner { winner: power });
            }
        }
        match self.state.surviving_powers().as_slice() {
            [only] => Some(Outcome::Winner { winner: *only }),
            [] => Some(Outcome::Draw { draw: true }),
            _ => None,
        }
    }

    fn open_next_year(&mut self) {
        self.state.year += 1;
        self.state.season = Season::Spring;
        self.state.phase = PhaseKind::Diplomacy;
    }

    fn expect_phase(&self, expected: PhaseKind) {
        assert!(
            !self.state.is_finished(),
            "game is over; no further phases may run"
        );
        assert_eq!(
            self.state.phase, expected,
            "operation requires the {:?} phase, game is in {:?}",
            expected, self.state.phase
        );
    }
}

/// The coast to use when a successful fleet retreat omitted one and a
/// single legal option exists.
fn single_allowed_coast(
    entry: &PendingRetreat,
    dest: crate::board::Province,
) -> Option<crate::board::Coast> {
    let mut options = entry.allowed.iter().filter(|d| d.province == dest);
    let first = options.next()?;
    if options.next().is_none() {
        first.coast
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::order::UnitRef;
    use crate::board::province::Province::*;
    use crate::board::{BuildOrder, Province};

    fn mv(from: Province, to: Province) -> Order {
        Order::Move {
            unit: UnitRef::new(UnitKind::Army, from),
            dest: to,
            dest_coast: None,
            via_convoy: false,
        }
    }

    fn orders(list: Vec<(Power, Vec<Order>)>) -> BTreeMap<Power, Vec<Order>> {
        list.into_iter().collect()
    }

    #[test]
    fn spring_movement_without_dislodgement_goes_to_fall_diplomacy() {
        let mut machine = PhaseMachine::standard();
        machine.begin_movement();
        machine.resolve_movement(&orders(vec![(Power::France, vec![mv(Par, Bur)])]));
        let state = machine.state();
        assert_eq!(state.season, Season::Fall);
        assert_eq!(state.phase, PhaseKind::Diplomacy);
        assert_eq!(state.year, 1901);
        assert_eq!(state.unit_at(Bur).unwrap().owner, Power::France);
    }

    #[test]
    fn dislodgement_enters_retreat_phase() {
        let mut state = GameState::empty(1901, Season::Spring, PhaseKind::Movement);
        state.units = vec![
            Unit::army(Power::France, Par),
            Unit::army(Power::France, Gas),
            Unit::army(Power::Germany, Bur),
        ];
        let mut machine = PhaseMachine::new(state);
        machine.resolve_movement(&orders(vec![(
            Power::France,
            vec![
                mv(Par, Bur),
                Order::Support {
                    unit: UnitRef::new(UnitKind::Army, Gas),
                    supported: UnitRef::new(UnitKind::Army, Par),
                    dest: Some(Bur),
                },
            ],
        )]));
        let state = machine.state();
        assert_eq!(state.phase, PhaseKind::Retreat);
        assert_eq!(state.pending_retreats.len(), 1);
        assert_eq!(state.pending_retreats[0].unit.owner, Power::Germany);
        assert!(!state.pending_retreats[0].allowed.is_empty());
    }

    #[test]
    fn retreat_resolution_continues_the_year() {
        let mut state = GameState::empty(1901, Season::Spring, PhaseKind::Movement);
        state.units = vec![
            Unit::army(Power::France, Par),
            Unit::army(Power::France, Gas),
            Unit::army(Power::Germany, Bur),
        ];
        let mut machine = PhaseMachine::new(state);
        machine.resolve_movement(&orders(vec![(
            Power::France,
            vec![
                mv(Par, Bur),
                Order::Support {
                    unit: UnitRef::new(UnitKind::Army, Gas),
                    supported: UnitRef::new(UnitKind::Army, Par),
                    dest: Some(Bur),
                },
            ],
        )]));
        machine.resolve_retreats(&[(
            Power::Germany,
            RetreatOrder::retreat(UnitRef::new(UnitKind::Army, Bur), Mun),
        )]);
        let state = machine.state();
        assert_eq!(state.season, Season::Fall);
        assert_eq!(state.phase, PhaseKind::Diplomacy);
        assert_eq!(state.unit_at(Mun).unwrap().owner, Power::Germany);
        assert!(state.pending_retreats.is_empty());
    }

    #[test]
    fn fall_updates_supply_ownership() {
        let mut state = GameState::empty(1901, Season::Fall, PhaseKind::Movement);
        state.units = vec![Unit::army(Power::France, Bur)];
        state.sc_ownership.insert(Par, Power::France);
        let mut machine = PhaseMachine::new(state);
        machine.resolve_movement(&orders(vec![(Power::France, vec![mv(Bur, Bel)])]));
        let state = machine.state();
        assert_eq!(state.sc_ownership.get(&Bel), Some(&Power::France));
    }

    #[test]
    fn spring_never_updates_supply_ownership() {
        let mut state = GameState::empty(1901, Season::Spring, PhaseKind::Movement);
        state.units = vec![Unit::army(Power::France, Bur)];
        let mut machine = PhaseMachine::new(state);
        machine.resolve_movement(&orders(vec![(Power::France, vec![mv(Bur, Bel)])]));
        assert!(machine.state().sc_ownership.get(&Bel).is_none());
    }

    #[test]
    fn balanced_fall_skips_builds() {
        let mut state = GameState::empty(1901, Season::Fall, PhaseKind::Movement);
        state.units = vec![Unit::army(Power::France, Par)];
        state.sc_ownership.insert(Par, Power::France);
        let mut machine = PhaseMachine::new(state);
        machine.resolve_movement(&orders(vec![]));
        let state = machine.state();
        assert_eq!(state.year, 1902);
        assert_eq!(state.season, Season::Spring);
        assert_eq!(state.phase, PhaseKind::Diplomacy);
    }

    #[test]
    fn imbalance_enters_winter_builds() {
        let mut state = GameState::empty(1901, Season::Fall, PhaseKind::Movement);
        state.units = vec![Unit::army(Power::France, Bur)];
        state.sc_ownership.insert(Par, Power::France);
        let mut machine = PhaseMachine::new(state);
        machine.resolve_movement(&orders(vec![(Power::France, vec![mv(Bur, Bel)])]));
        let state = machine.state();
        assert_eq!(state.season, Season::Winter);
        assert_eq!(state.phase, PhaseKind::Build);
        assert_eq!(state.pending_builds.get(&Power::France), Some(&1));
    }

    #[test]
    fn builds_open_next_year() {
        let mut state = GameState::empty(1901, Season::Winter, PhaseKind::Build);
        state.sc_ownership.insert(Par, Power::France);
        state.sc_ownership.insert(Bel, Power::France);
        state.units = vec![Unit::army(Power::France, Bel)];
        state.pending_builds.insert(Power::France, 1);
        let mut machine = PhaseMachine::new(state);
        machine.resolve_builds(&[(Power::France, BuildOrder::build(UnitKind::Army, Par))]);
        let state = machine.state();
        assert_eq!(state.year, 1902);
        assert_eq!(state.season, Season::Spring);
        assert_eq!(state.phase, PhaseKind::Diplomacy);
        assert_eq!(state.units.len(), 2);
    }

    #[test]
    fn eighteen_centers_wins() {
        let mut state = GameState::empty(1905, Season::Fall, PhaseKind::Movement);
        state.units = vec![Unit::army(Power::Russia, Mos), Unit::army(Power::France, Par)];
        let centers = [
            Mos, Sev, Stp, War, Vie, Bud, Tri, Ber, Mun, Kie, Den, Swe, Nwy, Edi, Lon, Lvp, Bre,
            Rum,
        ];
        for c in centers {
            state.sc_ownership.insert(c, Power::Russia);
        }
        let mut machine = PhaseMachine::new(state);
        machine.resolve_movement(&orders(vec![]));
        assert_eq!(
            machine.state().outcome,
            Some(Outcome::Winner { winner: Power::Russia })
        );
        assert!(machine.state().is_finished());
    }

    #[test]
    fn sole_survivor_wins() {
        let mut state = GameState::empty(1905, Season::Fall, PhaseKind::Movement);
        state.units = vec![Unit::army(Power::France, Par)];
        state.sc_ownership.insert(Par, Power::France);
        let mut machine = PhaseMachine::new(state);
        machine.resolve_movement(&orders(vec![]));
        assert_eq!(
            machine.state().outcome,
            Some(Outcome::Winner { winner: Power::France })
        );
    }

    #[test]
    fn lifeless_board_is_a_draw() {
        let state = GameState::empty(1905, Season::Fall, PhaseKind::Movement);
        let mut machine = PhaseMachine::new(state);
        machine.resolve_movement(&orders(vec![]));
        assert_eq!(machine.state().outcome, Some(Outcome::Draw { draw: true }));
    }

    #[test]
    fn eighteen_centers_takes_precedence_over_survivorship() {
        let mut state = GameState::empty(1905, Season::Fall, PhaseKind::Movement);
        // France is the sole survivor but Russia holds 18 centers.
        state.units = vec![Unit::army(Power::France, Par)];
        let centers = [
            Mos, Sev, Stp, War, Vie, Bud, Tri, Ber, Mun, Kie, Den, Swe, Nwy, Edi, Lon, Lvp, Bre,
            Rum,
        ];
        for c in centers {
            state.sc_ownership.insert(c, Power::Russia);
        }
        let mut machine = PhaseMachine::new(state);
        machine.resolve_movement(&orders(vec![]));
        assert_eq!(
            machine.state().outcome,
            Some(Outcome::Winner { winner: Power::Russia })
        );
    }

    #[test]
    #[should_panic(expected = "requires the Movement phase")]
    fn resolving_movement_during_diplomacy_panics() {
        let mut machine = PhaseMachine::standard();
        machine.resolve_movement(&BTreeMap::new());
    }

    #[test]
    #[should_panic(expected = "game is over")]
    fn resolving_after_victory_panics() {
        let mut state = GameState::empty(1905, Season::Fall, PhaseKind::Movement);
        state.units = vec![Unit::army(Power::France, Par)];
        state.sc_ownership.insert(Par, Power::France);
        let mut machine = PhaseMachine::new(state);
        machine.resolve_movement(&BTreeMap::new());
        machine.begin_movement();
    }

    #[test]
    fn full_year_cycle() {
        let mut machine = PhaseMachine::standard();
        assert_eq!(machine.state().phase, PhaseKind::Diplomacy);

        machine.begin_movement();
        machine.resolve_movement(&orders(vec![(Power::France, vec![mv(Par, Bur)])]));
        assert_eq!(machine.state().season, Season::Fall);

        machine.begin_movement();
        machine.resolve_movement(&orders(vec![(Power::France, vec![mv(Bur, Bel)])]));
        // France grabbed Belgium: 4 centers, 3 units.
        assert_eq!(machine.state().season, Season::Winter);
        assert_eq!(machine.state().phase, PhaseKind::Build);

        machine.resolve_builds(&[(Power::France, BuildOrder::build(UnitKind::Army, Par))]);
        let state = machine.state();
        assert_eq!(state.year, 1902);
        assert_eq!(state.season, Season::Spring);
        assert_eq!(state.phase, PhaseKind::Diplomacy);
        assert_eq!(state.unit_count(Power::France), 4);
    }
}
