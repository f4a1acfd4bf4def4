//! Build-phase resolution.
//!
//! Validates build and disband orders against each power's adjustment
//! count, and applies civil disorder when a power owes disbands it did not
//! submit: units are removed farthest-from-home first, armies before
//! fleets at equal distance, alphabetical by province id as the final
//! tie-break.

use crate::board::adjacency::neighbors;
use crate::board::order::{BuildAction, BuildOrder};
use crate::board::province::{Power, Province, Terrain, ALL_PROVINCES, PROVINCE_COUNT};
use crate::board::unit::{Unit, UnitKind};
use crate::game::state::GameState;

/// The resolved fate of one build-phase order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub power: Power,
    pub order: BuildOrder,
    pub success: bool,
    pub reason: Option<String>,
}

/// Resolves build-phase orders for all powers.
///
/// For a power owed builds, valid build orders succeed up to the
/// adjustment count. For a power owing disbands, valid disband orders
/// succeed up to the count and any shortfall is covered by civil-disorder
/// disbands appended to the result.
pub fn resolve_builds(orders: &[(Power, BuildOrder)], state: &GameState) -> Vec<BuildOutcome> {
    let mut outcomes = Vec::new();

    for &power in &crate::board::ALL_POWERS {
        let adjustment = *state.pending_builds.get(&power).unwrap_or(&0);
        let own_orders: Vec<&BuildOrder> = orders
            .iter()
            .filter(|(p, _)| *p == power)
            .map(|(_, o)| o)
            .collect();

        if adjustment > 0 {
            resolve_power_builds(power, adjustment as usize, &own_orders, state, &mut outcomes);
        } else if adjustment < 0 {
            resolve_power_disbands(
                power,
                adjustment.unsigned_abs() as usize,
                &own_orders,
                state,
                &mut outcomes,
            );
        } else {
            for order in own_orders {
                outcomes.push(BuildOutcome {
                    power,
                    order: *order,
                    success: false,
                    reason: Some("no adjustment owed".to_string()),
                });
            }
        }
    }

    outcomes
}

fn resolve_power_builds(
    power: Power,
    allowed: usize,
    orders: &[&BuildOrder],
    state: &GameState,
    outcomes: &mut Vec<BuildOutcome>,
) {
    let mut built = 0usize;
    let mut used = [false; PROVINCE_COUNT];
    for &order in orders {
        if order.action != BuildAction::Build {
            outcomes.push(fail(power, *order, "power has builds, not disbands"));
            continue;
        }
        if built >= allowed {
            outcomes.push(fail(power, *order, "build count exhausted"));
            continue;
        }
        if used[order.province as usize] {
            outcomes.push(fail(power, *order, "already built here this phase"));
            continue;
        }
        match validate_build(power, order, state) {
            Ok(()) => {
                used[order.province as usize] = true;
                built += 1;
                outcomes.push(BuildOutcome { power, order: *order, success: true, reason: None });
            }
            Err(reason) => outcomes.push(fail(power, *order, &reason)),
        }
    }
}

fn resolve_power_disbands(
    power: Power,
    needed: usize,
    orders: &[&BuildOrder],
    state: &GameState,
    outcomes: &mut Vec<BuildOutcome>,
) {
    let mut disbanded: Vec<Province> = Vec::new();
    for &order in orders {
        if order.action != BuildAction::Disband {
            outcomes.push(fail(power, *order, "power owes disbands"));
            continue;
        }
        if disbanded.len() >= needed {
            outcomes.push(fail(power, *order, "disband count exhausted"));
            continue;
        }
        if disbanded.contains(&order.province) {
            outcomes.push(fail(power, *order, "already disbanded"));
            continue;
        }
        match state.unit_at(order.province) {
            Some(unit) if unit.owner == power => {
                disbanded.push(order.province);
                outcomes.push(BuildOutcome { power, order: *order, success: true, reason: None });
            }
            Some(_) => outcomes.push(fail(power, *order, "unit belongs to another power")),
            None => outcomes.push(fail(power, *order, "no unit at this province")),
        }
    }

    // Civil disorder covers the shortfall.
    if disbanded.len() < needed {
        let auto = civil_disorder_disbands(power, needed - disbanded.len(), state, &disbanded);
        for order in auto {
            outcomes.push(BuildOutcome {
                power,
                order,
                success: true,
                reason: Some("civil disorder".to_string()),
            });
        }
    }
}

fn fail(power: Power, order: BuildOrder, reason: &str) -> BuildOutcome {
    BuildOutcome { power, order, success: false, reason: Some(reason.to_string()) }
}

fn validate_build(power: Power, order: &BuildOrder, state: &GameState) -> Result<(), String> {
    let prov = order.province;
    if prov.home_of() != Some(power) || !prov.is_supply_center() {
        return Err(format!("{} is not a home supply center of {}", prov, power));
    }
    if state.sc_ownership.get(&prov) != Some(&power) {
        return Err(format!("{} is no longer owned by {}", prov, power));
    }
    if state.unit_at(prov).is_some() {
        return Err(format!("{} is occupied", prov));
    }
    // An omitted unit kind defaults to an army.
    let kind = order.unit_kind.unwrap_or(UnitKind::Army);
    match kind {
        UnitKind::Army => Ok(()),
        UnitKind::Fleet => {
            if prov.terrain() == Terrain::Land {
                return Err(format!("cannot build a fleet inland at {}", prov));
            }
            if prov.has_multiple_coasts() {
                match order.coast {
                    Some(c) if prov.coasts().contains(&c) => Ok(()),
                    Some(_) => Err(format!("{} has no such coast", prov)),
                    None => Err(format!("a fleet at {} needs a coast", prov)),
                }
            } else {
                Ok(())
            }
        }
    }
}

/// Picks units to disband under civil disorder: farthest from any home
/// center first, armies before fleets at equal distance, then
/// alphabetical province order.
pub fn civil_disorder_disbands(
    power: Power,
    count: usize,
    state: &GameState,
    already: &[Province],
) -> Vec<BuildOrder> {
    let mut candidates: Vec<(Unit, u32)> = state
        .units
        .iter()
        .filter(|u| u.owner == power && !already.contains(&u.location))
        .map(|u| (*u, distance_to_home(u.location, power)))
        .collect();

    candidates.sort_by(|(ua, da), (ub, db)| {
        db.cmp(da)
            .then_with(|| {
                let rank = |k: UnitKind| match k {
                    UnitKind::Army => 0,
                    UnitKind::Fleet => 1,
                };
                rank(ua.kind).cmp(&rank(ub.kind))
            })
            .then_with(|| ua.location.id().cmp(ub.location.id()))
    });

    candidates
        .into_iter()
        .take(count)
        .map(|(u, _)| BuildOrder::disband(u.kind, u.location))
        .collect()
}

/// BFS distance from a province to the nearest home center of `power`,
/// over all edges regardless of unit kind.
fn distance_to_home(from: Province, power: Power) -> u32 {
    let home: Vec<Province> = ALL_PROVINCES
        .iter()
        .copied()
        .filter(|p| p.is_supply_center() && p.home_of() == Some(power))
        .collect();
    if home.contains(&from) {
        return 0;
    }

    let mut visited = [false; PROVINCE_COUNT];
    visited[from as usize] = true;
    let mut frontier = vec![from];
    let mut dist = 0u32;

    while !frontier.is_empty() {
        dist += 1;
        let mut next = Vec::new();
        for p in frontier {
            for kind in [UnitKind::Army, UnitKind::Fleet] {
                for n in neighbors(p, None, kind) {
                    if visited[n as usize] {
                        continue;
                    }
                    if home.contains(&n) {
                        return dist;
                    }
                    visited[n as usize] = true;
                    next.push(n);
                }
            }
        }
        frontier = next;
    }

    u32::MAX
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::province::Coast;
    use crate::game::state::{PhaseKind, Season};
    use Province::*;

    fn build_state() -> GameState {
        let mut state = GameState::empty(1901, Season::Winter, PhaseKind::Build);
        for p in ALL_PROVINCES {
            if let Some(power) = p.home_of() {
                state.sc_ownership.insert(p, power);
            }
        }
        state
    }

    #[test]
    fn build_on_owned_home_center() {
        let mut state = build_state();
        state.pending_builds.insert(Power::France, 1);
        let outcomes = resolve_builds(
            &[(Power::France, BuildOrder::build(UnitKind::Army, Par))],
            &state,
        );
        assert!(outcomes[0].success);
    }

    #[test]
    fn build_rejected_on_foreign_home_center() {
        let mut state = build_state();
        state.pending_builds.insert(Power::France, 1);
        let outcomes = resolve_builds(
            &[(Power::France, BuildOrder::build(UnitKind::Army, Ber))],
            &state,
        );
        assert!(!outcomes[0].success);
    }

    #[test]
    fn build_rejected_when_center_lost() {
        let mut state = build_state();
        state.pending_builds.insert(Power::France, 1);
        state.sc_ownership.insert(Par, Power::Germany);
        let outcomes = resolve_builds(
            &[(Power::France, BuildOrder::build(UnitKind::Army, Par))],
            &state,
        );
        assert!(!outcomes[0].success);
    }

    #[test]
    fn build_rejected_when_occupied() {
        let mut state = build_state();
        state.pending_builds.insert(Power::France, 1);
        state.units.push(Unit::army(Power::France, Par));
        let outcomes = resolve_builds(
            &[(Power::France, BuildOrder::build(UnitKind::Army, Par))],
            &state,
        );
        assert!(!outcomes[0].success);
    }

    #[test]
    fn builds_capped_at_adjustment() {
        let mut state = build_state();
        state.pending_builds.insert(Power::France, 1);
        let outcomes = resolve_builds(
            &[
                (Power::France, BuildOrder::build(UnitKind::Army, Par)),
                (Power::France, BuildOrder::build(UnitKind::Army, Mar)),
            ],
            &state,
        );
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
    }

    #[test]
    fn inland_fleet_rejected() {
        let mut state = build_state();
        state.pending_builds.insert(Power::France, 1);
        let outcomes = resolve_builds(
            &[(Power::France, BuildOrder::build(UnitKind::Fleet, Par))],
            &state,
        );
        assert!(!outcomes[0].success);
    }

    #[test]
    fn fleet_at_split_coast_needs_coast() {
        let mut state = build_state();
        state.pending_builds.insert(Power::Russia, 1);
        let missing = resolve_builds(
            &[(Power::Russia, BuildOrder::build(UnitKind::Fleet, Stp))],
            &state,
        );
        assert!(!missing[0].success);

        let with_coast = resolve_builds(
            &[(Power::Russia, BuildOrder::build_fleet_on(Stp, Coast::North))],
            &state,
        );
        assert!(with_coast[0].success);
    }

    #[test]
    fn disband_succeeds_and_is_capped() {
        let mut state = build_state();
        state.pending_builds.insert(Power::France, -1);
        state.units.push(Unit::army(Power::France, Spa));
        state.units.push(Unit::army(Power::France, Par));
        let outcomes = resolve_builds(
            &[
                (Power::France, BuildOrder::disband(UnitKind::Army, Spa)),
                (Power::France, BuildOrder::disband(UnitKind::Army, Par)),
            ],
            &state,
        );
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
    }

    #[test]
    fn civil_disorder_removes_farthest_unit() {
        let mut state = build_state();
        state.pending_builds.insert(Power::France, -1);
        state.units.push(Unit::army(Power::France, Par));
        state.units.push(Unit::army(Power::France, Ukr));
        let outcomes = resolve_builds(&[], &state);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].success);
        assert_eq!(outcomes[0].order.province, Ukr);
        assert_eq!(outcomes[0].reason.as_deref(), Some("civil disorder"));
    }

    #[test]
    fn civil_disorder_prefers_armies_at_equal_distance() {
        let mut state = build_state();
        state.pending_builds.insert(Power::Germany, -1);
        // Both one step from home: army in Silesia, fleet in Baltic Sea.
        state.units.push(Unit::army(Power::Germany, Sil));
        state.units.push(Unit::fleet(Power::Germany, Bal));
        let outcomes = resolve_builds(&[], &state);
        assert_eq!(outcomes[0].order.province, Sil);
        assert_eq!(outcomes[0].order.unit_kind, Some(UnitKind::Army));
    }

    #[test]
    fn civil_disorder_alphabetical_tiebreak() {
        let mut state = build_state();
        state.pending_builds.insert(Power::Germany, -1);
        // Two armies, both one step from home.
        state.units.push(Unit::army(Power::Germany, Sil));
        state.units.push(Unit::army(Power::Germany, Boh));
        let outcomes = resolve_builds(&[], &state);
        assert_eq!(outcomes[0].order.province, Boh);
    }

    #[test]
    fn civil_disorder_tops_up_partial_disbands() {
        let mut state = build_state();
        state.pending_builds.insert(Power::France, -2);
        state.units.push(Unit::army(Power::France, Par));
        state.units.push(Unit::army(Power::France, Ukr));
        state.units.push(Unit::army(Power::France, Mar));
        let outcomes = resolve_builds(
            &[(Power::France, BuildOrder::disband(UnitKind::Army, Mar))],
            &state,
        );
        let successes: Vec<Province> = outcomes
            .iter()
            .filter(|o| o.success)
            .map(|o| o.order.province)
            .collect();
        assert_eq!(successes.len(), 2);
        assert!(successes.contains(&Mar));
        assert!(successes.contains(&Ukr));
    }

    #[test]
    fn balanced_power_orders_are_rejected() {
        let state = build_state();
        let outcomes = resolve_builds(
            &[(Power::France, BuildOrder::build(UnitKind::Army, Par))],
            &state,
        );
        assert!(!outcomes[0].success);
        assert!(outcomes[0].reason.as_deref().unwrap().contains("no adjustment"));
    }

    #[test]
    fn distance_to_home_is_zero_at_home() {
        assert_eq!(distance_to_home(Par, Power::France), 0);
        assert!(distance_to_home(Mos, Power::France) > 2);
    }
}
