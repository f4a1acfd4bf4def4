//! The adjacency graph of the standard map.
//!
//! The graph is stored as one undirected `Edge` per province pair, with a
//! traversal kind (`Land` = armies only, `Sea` = fleets only, `Shore` =
//! both) and optional coast qualifiers on the endpoints that touch a
//! multi-coast province. Both directions of every edge are derived from the
//! same entry, so symmetry holds by construction. All data is compile-time
//! `static`; a per-province index is built lazily for O(neighbors) queries.

use std::sync::LazyLock;

use super::province::{Coast, Power, Province, ALL_PROVINCES, PROVINCE_COUNT};
use super::unit::UnitKind;

/// How an edge may be traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Armies only (inland border, or a land border between coastal
    /// provinces that face different seas).
    Land,
    /// Fleets only (open water, or a coastline reachable from a sea).
    Sea,
    /// Both armies and fleets (adjacent coastal provinces sharing a
    /// sea face).
    Shore,
}

impl EdgeKind {
    const fn passable(self, kind: UnitKind) -> bool {
        match (self, kind) {
            (EdgeKind::Land, UnitKind::Army) => true,
            (EdgeKind::Sea, UnitKind::Fleet) => true,
            (EdgeKind::Shore, _) => true,
            _ => false,
        }
    }
}

/// One undirected adjacency between two provinces.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub a: Province,
    pub a_coast: Option<Coast>,
    pub b: Province,
    pub b_coast: Option<Coast>,
    pub kind: EdgeKind,
}

const fn land(a: Province, b: Province) -> Edge {
    Edge { a, a_coast: None, b, b_coast: None, kind: EdgeKind::Land }
}

const fn sea(a: Province, b: Province) -> Edge {
    Edge { a, a_coast: None, b, b_coast: None, kind: EdgeKind::Sea }
}

/// Fleet-only edge with a coast qualifier on the `b` endpoint.
const fn sea_c(a: Province, b: Province, bc: Coast) -> Edge {
    Edge { a, a_coast: None, b, b_coast: Some(bc), kind: EdgeKind::Sea }
}

const fn shore(a: Province, b: Province) -> Edge {
    Edge { a, a_coast: None, b, b_coast: None, kind: EdgeKind::Shore }
}

use Province::*;

/// Number of undirected edges on the standard map.
pub const EDGE_COUNT: usize = 217;

/// The complete edge table.
///
/// Grouped by kind: open water, sea-to-coast, inland-to-inland,
/// inland-to-coast, shared-shore coastal pairs, land borders between
/// coastal provinces on different seas, and the coast-qualified edges of
/// the three split-coast provinces (BUL, SPA, STP).
pub static EDGES: [Edge; EDGE_COUNT] = [
    // Open water (21)
    sea(Adr, Ion),
    sea(Aeg, Eas),
    sea(Aeg, Ion),
    sea(Bal, Bot),
    sea(Bar, Nrg),
    sea(Eng, Iri),
    sea(Eng, Mao),
    sea(Eng, Nth),
    sea(Gol, Tys),
    sea(Gol, Wes),
    sea(Hel, Nth),
    sea(Ion, Eas),
    sea(Ion, Tys),
    sea(Iri, Mao),
    sea(Iri, Nao),
    sea(Mao, Nao),
    sea(Mao, Wes),
    sea(Nao, Nrg),
    sea(Nth, Nrg),
    sea(Nth, Ska),
    sea(Tys, Wes),
    // Sea to coast (75)
    sea(Adr, Alb),
    sea(Adr, Apu),
    sea(Adr, Tri),
    sea(Adr, Ven),
    sea_c(Aeg, Bul, Coast::South),
    sea(Aeg, Con),
    sea(Aeg, Gre),
    sea(Aeg, Smy),
    sea(Bal, Ber),
    sea(Bal, Den),
    sea(Bal, Kie),
    sea(Bal, Lvn),
    sea(Bal, Pru),
    sea(Bal, Swe),
    sea(Bar, Nwy),
    sea_c(Bar, Stp, Coast::North),
    sea(Bla, Ank),
    sea(Bla, Arm),
    sea_c(Bla, Bul, Coast::East),
    sea(Bla, Con),
    sea(Bla, Rum),
    sea(Bla, Sev),
    sea(Bot, Fin),
    sea(Bot, Lvn),
    sea_c(Bot, Stp, Coast::South),
    sea(Bot, Swe),
    sea(Eas, Smy),
    sea(Eas, Syr),
    sea(Eng, Bel),
    sea(Eng, Bre),
    sea(Eng, Lon),
    sea(Eng, Pic),
    sea(Eng, Wal),
    sea(Gol, Mar),
    sea(Gol, Pie),
    sea_c(Gol, Spa, Coast::South),
    sea(Gol, Tus),
    sea(Hel, Den),
    sea(Hel, Hol),
    sea(Hel, Kie),
    sea(Ion, Alb),
    sea(Ion, Apu),
    sea(Ion, Gre),
    sea(Ion, Nap),
    sea(Ion, Tun),
    sea(Iri, Lvp),
    sea(Iri, Wal),
    sea(Mao, Bre),
    sea(Mao, Gas),
    sea(Mao, Naf),
    sea(Mao, Por),
    sea_c(Mao, Spa, Coast::North),
    sea_c(Mao, Spa, Coast::South),
    sea(Nao, Cly),
    sea(Nao, Lvp),
    sea(Nth, Bel),
    sea(Nth, Den),
    sea(Nth, Edi),
    sea(Nth, Hol),
    sea(Nth, Lon),
    sea(Nth, Nwy),
    sea(Nth, Yor),
    sea(Nrg, Cly),
    sea(Nrg, Edi),
    sea(Nrg, Nwy),
    sea(Ska, Den),
    sea(Ska, Nwy),
    sea(Ska, Swe),
    sea(Tys, Nap),
    sea(Tys, Rom),
    sea(Tys, Tun),
    sea(Tys, Tus),
    sea(Wes, Naf),
    sea_c(Wes, Spa, Coast::South),
    sea(Wes, Tun),
    // Inland to inland (22)
    land(Boh, Gal),
    land(Boh, Mun),
    land(Boh, Sil),
    land(Boh, Tyr),
    land(Boh, Vie),
    land(Bud, Gal),
    land(Bud, Vie),
    land(Bur, Mun),
    land(Bur, Par),
    land(Bur, Ruh),
    land(Gal, Sil),
    land(Gal, Ukr),
    land(Gal, Vie),
    land(Gal, War),
    land(Mos, Ukr),
    land(Mos, War),
    land(Mun, Ruh),
    land(Mun, Sil),
    land(Mun, Tyr),
    land(Sil, War),
    land(Tyr, Vie),
    land(Ukr, War),
    // Inland to coast (35)
    land(Bud, Rum),
    land(Bud, Ser),
    land(Bud, Tri),
    land(Bur, Bel),
    land(Bur, Gas),
    land(Bur, Mar),
    land(Bur, Pic),
    land(Gal, Rum),
    land(Gas, Mar),
    land(Mos, Lvn),
    land(Mos, Sev),
    land(Mos, Stp),
    land(Mun, Ber),
    land(Mun, Kie),
    land(Par, Bre),
    land(Par, Gas),
    land(Par, Pic),
    land(Ruh, Bel),
    land(Ruh, Hol),
    land(Ruh, Kie),
    land(Ser, Alb),
    land(Ser, Bul),
    land(Ser, Gre),
    land(Ser, Rum),
    land(Ser, Tri),
    land(Sil, Ber),
    land(Sil, Pru),
    land(Tyr, Pie),
    land(Tyr, Tri),
    land(Tyr, Ven),
    land(Ukr, Rum),
    land(Ukr, Sev),
    land(Vie, Tri),
    land(War, Lvn),
    land(War, Pru),
    // Coastal pairs on a shared sea face (33)
    shore(Alb, Gre),
    shore(Alb, Tri),
    shore(Ank, Arm),
    shore(Ank, Con),
    shore(Apu, Nap),
    shore(Apu, Ven),
    shore(Bel, Hol),
    shore(Bel, Pic),
    shore(Ber, Kie),
    shore(Ber, Pru),
    shore(Bre, Gas),
    shore(Bre, Pic),
    shore(Cly, Edi),
    shore(Cly, Lvp),
    shore(Con, Smy),
    shore(Den, Kie),
    shore(Den, Swe),
    shore(Edi, Yor),
    shore(Fin, Swe),
    shore(Lon, Wal),
    shore(Lon, Yor),
    shore(Lvp, Wal),
    shore(Mar, Pie),
    shore(Naf, Tun),
    shore(Nwy, Swe),
    shore(Pie, Tus),
    shore(Pru, Lvn),
    shore(Rom, Nap),
    shore(Rom, Tus),
    shore(Sev, Arm),
    shore(Sev, Rum),
    shore(Smy, Syr),
    shore(Tri, Ven),
    // Coastal pairs on different seas: armies only (11)
    land(Ank, Smy),
    land(Apu, Rom),
    land(Arm, Smy),
    land(Arm, Syr),
    land(Edi, Lvp),
    land(Fin, Nwy),
    land(Lvp, Yor),
    land(Pie, Ven),
    land(Rom, Ven),
    land(Tus, Ven),
    land(Wal, Yor),
    // Split-coast fleet passages (11)
    sea_c(Con, Bul, Coast::East),
    sea_c(Con, Bul, Coast::South),
    sea_c(Gre, Bul, Coast::South),
    sea_c(Rum, Bul, Coast::East),
    sea_c(Gas, Spa, Coast::North),
    sea_c(Mar, Spa, Coast::South),
    sea_c(Por, Spa, Coast::North),
    sea_c(Por, Spa, Coast::South),
    sea_c(Fin, Stp, Coast::South),
    sea_c(Lvn, Stp, Coast::South),
    sea_c(Nwy, Stp, Coast::North),
    // Split-coast army borders (9)
    land(Con, Bul),
    land(Gre, Bul),
    land(Rum, Bul),
    land(Gas, Spa),
    land(Mar, Spa),
    land(Por, Spa),
    land(Fin, Stp),
    land(Lvn, Stp),
    land(Nwy, Stp),
];

/// One direction of an edge, as seen from a particular province.
#[derive(Debug, Clone, Copy)]
struct HalfEdge {
    to: Province,
    from_coast: Option<Coast>,
    to_coast: Option<Coast>,
    kind: EdgeKind,
}

/// Per-province directed view of `EDGES`, built on first use.
static NEIGHBOR_INDEX: LazyLock<Vec<Vec<HalfEdge>>> = LazyLock::new(|| {
    let mut index: Vec<Vec<HalfEdge>> = vec![Vec::new(); PROVINCE_COUNT];
    for e in &EDGES {
        index[e.a as usize].push(HalfEdge {
            to: e.b,
            from_coast: e.a_coast,
            to_coast: e.b_coast,
            kind: e.kind,
        });
        index[e.b as usize].push(HalfEdge {
            to: e.a,
            from_coast: e.b_coast,
            to_coast: e.a_coast,
            kind: e.kind,
        });
    }
    index
});

fn half_edges(p: Province) -> &'static [HalfEdge] {
    &NEIGHBOR_INDEX[p as usize]
}

/// A coast qualifier matches when either side leaves it unspecified.
fn coast_matches(edge_coast: Option<Coast>, query_coast: Option<Coast>) -> bool {
    match (edge_coast, query_coast) {
        (Some(e), Some(q)) => e == q,
        _ => true,
    }
}

/// Returns true if a unit of `kind` can move from `(from, from_coast)` to
/// `(to, to_coast)` in one step.
pub fn reachable(
    from: Province,
    from_coast: Option<Coast>,
    to: Province,
    to_coast: Option<Coast>,
    kind: UnitKind,
) -> bool {
    half_edges(from).iter().any(|h| {
        h.to == to
            && h.kind.passable(kind)
            && coast_matches(h.from_coast, from_coast)
            && coast_matches(h.to_coast, to_coast)
    })
}

/// Provinces reachable in one step by a unit of `kind` standing at
/// `(from, from_coast)`. Deduplicated; coast detail is dropped.
pub fn neighbors(from: Province, from_coast: Option<Coast>, kind: UnitKind) -> Vec<Province> {
    let mut out = Vec::new();
    for h in half_edges(from) {
        if !h.kind.passable(kind) || !coast_matches(h.from_coast, from_coast) {
            continue;
        }
        if !out.contains(&h.to) {
            out.push(h.to);
        }
    }
    out
}

/// The destination coasts a fleet at `(from, from_coast)` can land on when
/// entering `to`. Empty when `to` is unreachable; `vec![None]` when `to`
/// has a single coastline.
pub fn coasts_into(
    from: Province,
    from_coast: Option<Coast>,
    to: Province,
) -> Vec<Option<Coast>> {
    let mut out = Vec::new();
    for h in half_edges(from) {
        if h.to != to || !h.kind.passable(UnitKind::Fleet) {
            continue;
        }
        if !coast_matches(h.from_coast, from_coast) {
            continue;
        }
        if !out.contains(&h.to_coast) {
            out.push(h.to_coast);
        }
    }
    out
}

/// Read-only facade over the static map tables.
///
/// All methods are pure and allocation is limited to returned sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct Map;

impl Map {
    pub fn new() -> Self {
        Map
    }

    /// Resolves a 3-letter uppercase id to a province.
    pub fn lookup(&self, id: &str) -> Option<Province> {
        Province::from_id(id)
    }

    /// True when `a` and `b` share an edge passable by `kind`; with
    /// `kind = None`, any edge counts.
    pub fn adjacent(&self, a: Province, b: Province, kind: Option<UnitKind>) -> bool {
        match kind {
            Some(k) => reachable(a, None, b, None, k),
            None => {
                reachable(a, None, b, None, UnitKind::Army)
                    || reachable(a, None, b, None, UnitKind::Fleet)
            }
        }
    }

    /// One-step destinations for a unit of `kind` at `(province, coast)`.
    pub fn neighbors(
        &self,
        province: Province,
        kind: UnitKind,
        coast: Option<Coast>,
    ) -> Vec<Province> {
        neighbors(province, coast, kind)
    }

    /// Destination-coast options for a fleet entering `to` from
    /// `(from, from_coast)`.
    pub fn coasts_into(
        &self,
        from: Province,
        from_coast: Option<Coast>,
        to: Province,
    ) -> Vec<Option<Coast>> {
        coasts_into(from, from_coast, to)
    }

    /// The home supply centers of a power.
    pub fn home_centers(&self, power: Power) -> Vec<Province> {
        ALL_PROVINCES
            .iter()
            .copied()
            .filter(|p| p.is_supply_center() && p.home_of() == Some(power))
            .collect()
    }

    /// All 34 supply centers.
    pub fn supply_centers(&self) -> Vec<Province> {
        ALL_PROVINCES
            .iter()
            .copied()
            .filter(|p| p.is_supply_center())
            .collect()
    }

    pub fn is_sea(&self, p: Province) -> bool {
        p.is_sea()
    }

    pub fn is_land(&self, p: Province) -> bool {
        p.is_land()
    }

    pub fn is_coastal(&self, p: Province) -> bool {
        p.is_coastal()
    }
}
