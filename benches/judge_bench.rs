use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use entente::board::order::{Order, UnitRef};
use entente::board::province::{Power, Province};
use entente::board::unit::UnitKind;
use entente::game::state::GameState;
use entente::judge::adjudicate;
use entente::parser::parse_reply;

fn all_hold_orders(state: &GameState) -> BTreeMap<Power, Vec<Order>> {
    let mut orders: BTreeMap<Power, Vec<Order>> = BTreeMap::new();
    for unit in &state.units {
        orders.entry(unit.owner).or_default().push(Order::Hold {
            unit: UnitRef::new(unit.kind, unit.location),
        });
    }
    orders
}

fn bench_adjudicate_holds(c: &mut Criterion) {
    let state = GameState::standard_opening();
    let orders = all_hold_orders(&state);
    c.bench_function("adjudicate_22_holds", |b| {
        b.iter(|| adjudicate(black_box(&state.units), black_box(&orders)))
    });
}

fn bench_adjudicate_contested(c: &mut Criterion) {
    let state = GameState::standard_opening();
    let mut orders = all_hold_orders(&state);

    // A realistic contested spring: openings that collide in Burgundy,
    // Galicia, and the Black Sea.
    let mv = |kind: UnitKind, from: Province, to: Province| Order::Move {
        unit: UnitRef::new(kind, from),
        dest: to,
        dest_coast: None,
        via_convoy: false,
    };
    orders.insert(
        Power::France,
        vec![
            mv(UnitKind::Army, Province::Par, Province::Bur),
            mv(UnitKind::Army, Province::Mar, Province::Spa),
            mv(UnitKind::Fleet, Province::Bre, Province::Mao),
        ],
    );
    orders.insert(
        Power::Germany,
        vec![
            mv(UnitKind::Army, Province::Mun, Province::Bur),
            mv(UnitKind::Army, Province::Ber, Province::Kie),
            mv(UnitKind::Fleet, Province::Kie, Province::Den),
        ],
    );
    orders.insert(
        Power::Austria,
        vec![
            mv(UnitKind::Army, Province::Vie, Province::Gal),
            mv(UnitKind::Army, Province::Bud, Province::Ser),
            mv(UnitKind::Fleet, Province::Tri, Province::Alb),
        ],
    );
    orders.insert(
        Power::Russia,
        vec![
            mv(UnitKind::Army, Province::War, Province::Gal),
            mv(UnitKind::Fleet, Province::Sev, Province::Bla),
        ],
    );
    orders.insert(
        Power::Turkey,
        vec![
            mv(UnitKind::Fleet, Province::Ank, Province::Bla),
            mv(UnitKind::Army, Province::Con, Province::Bul),
        ],
    );

    c.bench_function("adjudicate_contested_spring", |b| {
        b.iter(|| adjudicate(black_box(&state.units), black_box(&orders)))
    });
}

fn bench_parse_reply(c: &mut Criterion) {
    let text = "\
REASONING:
The western triangle looks unstable; Burgundy is the key.

ORDERS:
1. **A PAR -> BUR**
2. A MAR → SPA
3. F BRE -> MAO (covering the approach)

DIPLOMACY:
SEND Germany: \"[OPENING] IF you stay out of Burgundy, THEN I will not enter the Rhineland\"
SEND England: \"Shall we keep the Channel demilitarized?\"
";
    c.bench_function("parse_freeform_reply", |b| {
        b.iter(|| parse_reply(black_box(text)))
    });
}

criterion_group!(
    benches,
    bench_adjudicate_holds,
    bench_adjudicate_contested,
    bench_parse_reply
);
criterion_main!(benches);
