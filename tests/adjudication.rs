//! End-to-end adjudication scenarios against the public API.
//!
//! Each scenario sets up literal units and orders and checks the exact
//! outcomes, standoff markings, and dislodgements.

use std::collections::BTreeMap;

use entente::board::order::{Order, UnitRef};
use entente::board::province::{Power, Province};
use entente::board::unit::{Unit, UnitKind};
use entente::judge::{adjudicate, Adjudication};

use Province::*;

fn army_ref(p: Province) -> UnitRef {
    UnitRef::new(UnitKind::Army, p)
}

fn fleet_ref(p: Province) -> UnitRef {
    UnitRef::new(UnitKind::Fleet, p)
}

fn mv(from: Province, to: Province) -> Order {
    Order::Move { unit: army_ref(from), dest: to, dest_coast: None, via_convoy: false }
}

fn fmv(from: Province, to: Province) -> Order {
    Order::Move { unit: fleet_ref(from), dest: to, dest_coast: None, via_convoy: false }
}

fn sup(at: Province, from: Province, to: Province) -> Order {
    Order::Support { unit: army_ref(at), supported: army_ref(from), dest: Some(to) }
}

fn hold(p: Province) -> Order {
    Order::Hold { unit: army_ref(p) }
}

fn run(units: Vec<Unit>, orders: Vec<(Power, Vec<Order>)>) -> Adjudication {
    let map: BTreeMap<Power, Vec<Order>> = orders.into_iter().collect();
    adjudicate(&units, &map)
}

fn success(result: &Adjudication, p: Province) -> bool {
    result.outcomes[&p].success
}

// Two unsupported armies both move to Burgundy: both bounce and Burgundy
// becomes a standoff location.
#[test]
fn scenario_standoff() {
    let result = run(
        vec![Unit::army(Power::France, Par), Unit::army(Power::Germany, Mun)],
        vec![
            (Power::France, vec![mv(Par, Bur)]),
            (Power::Germany, vec![mv(Mun, Bur)]),
        ],
    );
    assert!(!success(&result, Par));
    assert!(!success(&result, Mun));
    assert!(result.standoffs.contains(&Bur));
}

// PAR -> BUR with support from GAS dislodges the holding German army.
#[test]
fn scenario_supported_dislodgement() {
    let result = run(
        vec![
            Unit::army(Power::France, Par),
            Unit::army(Power::France, Gas),
            Unit::army(Power::Germany, Bur),
        ],
        vec![
            (Power::France, vec![mv(Par, Bur), sup(Gas, Par, Bur)]),
            (Power::Germany, vec![hold(Bur)]),
        ],
    );
    assert!(success(&result, Par));
    let bur = &result.outcomes[&Bur];
    assert!(bur.dislodged);
    assert_eq!(bur.dislodged_from, Some(Par));
}

// A third power's attack on the supporter cuts the support and the main
// attack bounces.
#[test]
fn scenario_support_cut_by_third_party() {
    let result = run(
        vec![
            Unit::army(Power::France, Par),
            Unit::army(Power::France, Pic),
            Unit::army(Power::Germany, Bur),
            Unit::army(Power::Germany, Bel),
        ],
        vec![
            (Power::France, vec![mv(Par, Bur), sup(Pic, Par, Bur)]),
            (Power::Germany, vec![hold(Bur), mv(Bel, Pic)]),
        ],
    );
    let pic = &result.outcomes[&Pic];
    assert!(!pic.success);
    assert!(pic.reason.as_deref().unwrap().contains("cut"));
    assert!(!success(&result, Par));
}

// The attacked unit cannot cut the support aimed at it by striking back
// at the supporter.
#[test]
fn scenario_attack_on_the_attacker() {
    let result = run(
        vec![
            Unit::army(Power::France, Par),
            Unit::army(Power::France, Gas),
            Unit::army(Power::Germany, Bur),
        ],
        vec![
            (Power::France, vec![mv(Par, Bur), sup(Gas, Par, Bur)]),
            (Power::Germany, vec![mv(Bur, Gas)]),
        ],
    );
    assert!(success(&result, Gas));
    assert!(success(&result, Par));
}

// A chain of moves into provinces being vacated all succeed together.
#[test]
fn scenario_three_way_rotation() {
    let result = run(
        vec![
            Unit::army(Power::France, Par),
            Unit::army(Power::Germany, Bur),
            Unit::army(Power::Italy, Mar),
        ],
        vec![
            (Power::France, vec![mv(Par, Bur)]),
            (Power::Germany, vec![mv(Bur, Mar)]),
            (Power::Italy, vec![mv(Mar, Gas)]),
        ],
    );
    assert!(success(&result, Par));
    assert!(success(&result, Bur));
    assert!(success(&result, Mar));
}

// Dislodging the North Sea fleet disrupts the London-Norway convoy; the
// army stays home. (The supporting French fleet sits in Heligoland
// Bight, adjacent to the North Sea.)
#[test]
fn scenario_convoy_dislodgement() {
    let result = run(
        vec![
            Unit::army(Power::England, Lon),
            Unit::fleet(Power::England, Nth),
            Unit::fleet(Power::France, Eng),
            Unit::fleet(Power::France, Hel),
        ],
        vec![
            (
                Power::England,
                vec![
                    Order::Move {
                        unit: army_ref(Lon),
                        dest: Nwy,
                        dest_coast: None,
                        via_convoy: true,
                    },
                    Order::Convoy { fleet: fleet_ref(Nth), army: army_ref(Lon), dest: Nwy },
                ],
            ),
            (
                Power::France,
                vec![
                    fmv(Eng, Nth),
                    Order::Support {
                        unit: fleet_ref(Hel),
                        supported: fleet_ref(Eng),
                        dest: Some(Nth),
                    },
                ],
            ),
        ],
    );
    let nth = &result.outcomes[&Nth];
    assert!(nth.dislodged);
    assert_eq!(nth.dislodged_from, Some(Eng));
    let lon = &result.outcomes[&Lon];
    assert!(!lon.success);
}

// Moved-or-dislodged, never both (state invariant 4), checked over a
// busy board.
#[test]
fn moved_and_dislodged_are_mutually_exclusive() {
    let result = run(
        vec![
            Unit::army(Power::France, Par),
            Unit::army(Power::France, Gas),
            Unit::army(Power::Germany, Bur),
            Unit::army(Power::Germany, Mun),
            Unit::army(Power::Italy, Mar),
        ],
        vec![
            (Power::France, vec![mv(Par, Bur), sup(Gas, Par, Bur)]),
            (Power::Germany, vec![mv(Bur, Mar), mv(Mun, Bur)]),
            (Power::Italy, vec![mv(Mar, Pie)]),
        ],
    );
    for outcome in result.outcomes.values() {
        let moved = matches!(outcome.order, Order::Move { .. }) && outcome.success;
        assert!(!(moved && outcome.dislodged));
    }
}

// Every unit on the board receives an outcome, ordered or not.
#[test]
fn adjudication_never_fails_to_produce_outcomes() {
    let units = vec![
        Unit::army(Power::France, Par),
        Unit::army(Power::Germany, Mun),
        Unit::fleet(Power::England, Lon),
        Unit::fleet(Power::Russia, Sev),
    ];
    let result = run(units.clone(), vec![(Power::France, vec![mv(Par, Bur)])]);
    for unit in &units {
        assert!(
            result.outcomes.contains_key(&unit.location),
            "missing outcome at {}",
            unit.location
        );
    }
}

// Retreat destinations exclude the attacker's origin and standoffs.
#[test]
fn dislodgement_computes_retreat_destinations() {
    let result = run(
        vec![
            Unit::army(Power::France, Par),
            Unit::army(Power::France, Gas),
            Unit::army(Power::Germany, Bur),
            Unit::army(Power::Italy, Tyr),
            Unit::army(Power::Austria, Boh),
        ],
        vec![
            (Power::France, vec![mv(Par, Bur), sup(Gas, Par, Bur)]),
            (Power::Germany, vec![hold(Bur)]),
            (Power::Italy, vec![mv(Tyr, Mun)]),
            (Power::Austria, vec![mv(Boh, Mun)]),
        ],
    );
    assert_eq!(result.dislodgements.len(), 1);
    let d = &result.dislodgements[0];
    let dests: Vec<Province> = d.retreats.iter().map(|r| r.province).collect();
    assert!(!dests.contains(&Par));
    assert!(!dests.contains(&Mun));
    assert!(!dests.contains(&Gas));
    assert!(dests.contains(&Ruh));
}

// Beleaguered garrison: two equal supported attacks on one province
// cancel out and the garrison survives.
#[test]
fn beleaguered_garrison_survives() {
    let result = run(
        vec![
            Unit::army(Power::Germany, Mun),
            Unit::army(Power::France, Bur),
            Unit::army(Power::France, Ruh),
            Unit::army(Power::Austria, Tyr),
            Unit::army(Power::Austria, Boh),
        ],
        vec![
            (Power::Germany, vec![hold(Mun)]),
            (Power::France, vec![mv(Bur, Mun), sup(Ruh, Bur, Mun)]),
            (Power::Austria, vec![mv(Tyr, Mun), sup(Boh, Tyr, Mun)]),
        ],
    );
    assert!(!success(&result, Bur));
    assert!(!success(&result, Tyr));
    assert!(!result.outcomes[&Mun].dislodged);
}

// A supported convoyed army can dislodge the defender of its landing
// province.
#[test]
fn convoyed_attack_with_support() {
    let result = run(
        vec![
            Unit::army(Power::England, Lon),
            Unit::fleet(Power::England, Nth),
            Unit::fleet(Power::England, Nrg),
            Unit::army(Power::Russia, Nwy),
        ],
        vec![
            (
                Power::England,
                vec![
                    Order::Move {
                        unit: army_ref(Lon),
                        dest: Nwy,
                        dest_coast: None,
                        via_convoy: true,
                    },
                    Order::Convoy { fleet: fleet_ref(Nth), army: army_ref(Lon), dest: Nwy },
                    Order::Support {
                        unit: fleet_ref(Nrg),
                        supported: army_ref(Lon),
                        dest: Some(Nwy),
                    },
                ],
            ),
            (Power::Russia, vec![hold(Nwy)]),
        ],
    );
    assert!(success(&result, Lon));
    assert!(result.outcomes[&Nwy].dislodged);
}
