//! Movement-phase adjudication.
//!
//! Given the units on the board and each power's orders, produces an
//! outcome per province: whether the order succeeded, why it failed, and
//! whether the unit was dislodged. Resolution uses an optimistic
//! guess-and-check fixed point: every order starts as "succeeds", entries
//! are re-evaluated on demand, and a dependency cycle is broken by flipping
//! the guess and checking consistency.
//!
//! Adjudication itself never fails. Orders that do not survive the
//! validation pass degrade to a hold for resolution purposes, with the
//! validation error recorded on the outcome.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::adjacency::{coasts_into, neighbors, reachable};
use crate::board::order::{Order, UnitRef};
use crate::board::province::{Coast, Power, Province, Terrain, PROVINCE_COUNT};
use crate::board::unit::{Unit, UnitKind};
use crate::game::state::RetreatDest;

/// The adjudicated result of one unit's order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOutcome {
    pub power: Power,
    pub order: Order,
    pub success: bool,
    pub reason: Option<String>,
    pub dislodged: bool,
    pub dislodged_from: Option<Province>,
}

/// A unit forced out of its province, with its legal retreat destinations.
#[derive(Debug, Clone, PartialEq)]
pub struct Dislodgement {
    pub unit: Unit,
    pub attacker_from: Province,
    pub retreats: Vec<RetreatDest>,
}

/// The full result of adjudicating one movement phase.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Adjudication {
    /// Outcome per province that had a unit (or a rejected order).
    pub outcomes: BTreeMap<Province, OrderOutcome>,
    /// Provinces left vacant because equally strong moves bounced there.
    /// Units may not retreat into these.
    pub standoffs: BTreeSet<Province>,
    pub dislodgements: Vec<Dislodgement>,
}

/// Why an order was degraded to a hold during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderError {
    NoSuchUnit,
    ForeignUnit,
    MoveToSelf,
    Unreachable,
    CoastRequired,
    NoConvoyPath,
    FleetViaConvoy,
    SupportTargetVacant,
    SupportOutOfRange,
    ConvoyByArmy,
    ConvoyNotAtSea,
    ConvoyTargetNotArmy,
}

impl OrderError {
    fn message(self) -> &'static str {
        match self {
            OrderError::NoSuchUnit => "no unit at the ordered province",
            OrderError::ForeignUnit => "unit belongs to another power",
            OrderError::MoveToSelf => "a unit cannot move to its own province",
            OrderError::Unreachable => "destination is not reachable by this unit",
            OrderError::CoastRequired => "destination has multiple coasts; specify one",
            OrderError::NoConvoyPath => "no chain of convoying fleets covers this move",
            OrderError::FleetViaConvoy => "only armies can be convoyed",
            OrderError::SupportTargetVacant => "supported province is vacant",
            OrderError::SupportOutOfRange => "supporter cannot reach the supported destination",
            OrderError::ConvoyByArmy => "only fleets can convoy",
            OrderError::ConvoyNotAtSea => "convoying fleet must be in a sea province",
            OrderError::ConvoyTargetNotArmy => "only armies can be convoyed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResState {
    Unresolved,
    Guessing,
    Resolved,
}

/// Internal per-unit record used during resolution. `effective` is what
/// resolution sees; `reported` is what the outcome shows.
#[derive(Debug, Clone, Copy)]
struct Entry {
    unit: Unit,
    effective: Order,
    reported: Order,
    error: Option<OrderError>,
    /// Move that depends on a convoy chain.
    convoyed: bool,
    /// Set during resolution when the chain was broken.
    convoy_disrupted: bool,
    state: ResState,
    resolution: bool,
}

impl Entry {
    fn holding(unit: Unit) -> Entry {
        let order = Order::Hold { unit: UnitRef::new(unit.kind, unit.location) };
        Entry {
            unit,
            effective: order,
            reported: order,
            error: None,
            convoyed: false,
            convoy_disrupted: false,
            state: ResState::Unresolved,
            resolution: false,
        }
    }

    fn move_dest(&self) -> Option<Province> {
        match self.effective {
            Order::Move { dest, .. } => Some(dest),
            _ => None,
        }
    }
}

/// Adjudicates one batch of movement orders. Does not touch any game
/// state; the caller applies the result.
pub fn adjudicate(units: &[Unit], orders_by_power: &BTreeMap<Power, Vec<Order>>) -> Adjudication {
    let mut judge = Judge::new(units);
    judge.take_orders(orders_by_power);
    judge.resolve_all();
    judge.into_result()
}

struct Judge {
    entries: Vec<Entry>,
    lookup: [Option<usize>; PROVINCE_COUNT],
    /// Orders that referenced a nonexistent or foreign unit.
    rejected: Vec<(Power, Order, OrderError)>,
}

impl Judge {
    fn new(units: &[Unit]) -> Judge {
        let mut entries = Vec::with_capacity(units.len());
        let mut lookup = [None; PROVINCE_COUNT];
        for &unit in units {
            lookup[unit.location as usize] = Some(entries.len());
            entries.push(Entry::holding(unit));
        }
        Judge { entries, lookup, rejected: Vec::new() }
    }

    fn take_orders(&mut self, orders_by_power: &BTreeMap<Power, Vec<Order>>) {
        for (&power, orders) in orders_by_power {
            for &order in orders {
                self.take_order(power, order);
            }
        }
        // Convoy requirements depend on the full order set, so classify
        // convoyed moves and check static paths after everything is in.
        for i in 0..self.entries.len() {
            self.classify_convoy(i);
        }
    }

    fn take_order(&mut self, power: Power, order: Order) {
        let province = order.unit_province();
        let idx = match self.lookup[province as usize] {
            Some(idx) => idx,
            None => {
                self.rejected.push((power, order, OrderError::NoSuchUnit));
                return;
            }
        };
        if self.entries[idx].unit.owner != power {
            self.rejected.push((power, order, OrderError::ForeignUnit));
            return;
        }

        // Later orders for the same unit replace earlier ones.
        let unit = self.entries[idx].unit;
        match self.validate(unit, order) {
            Ok(effective) => {
                self.entries[idx].effective = effective;
                self.entries[idx].reported = effective;
                self.entries[idx].error = None;
            }
            Err(error) => {
                self.entries[idx].effective = order.degraded_to_hold();
                self.entries[idx].reported = order;
                self.entries[idx].error = Some(error);
            }
        }
    }

    /// Geometry and existence checks. Returns the effective order, which
    /// may differ from the submitted one by an inferred destination coast.
    fn validate(&self, unit: Unit, order: Order) -> Result<Order, OrderError> {
        match order {
            Order::Hold { .. } => Ok(order),

            Order::Move { unit: unit_ref, dest, dest_coast, via_convoy } => {
                if dest == unit.location {
                    return Err(OrderError::MoveToSelf);
                }
                match unit.kind {
                    UnitKind::Army => {
                        if via_convoy || !reachable(unit.location, None, dest, None, UnitKind::Army)
                        {
                            // Convoy requirement; path checked in classify_convoy.
                            if dest.terrain() == Terrain::Sea {
                                return Err(OrderError::Unreachable);
                            }
                            if unit.location.terrain() != Terrain::Coastal
                                || dest.terrain() != Terrain::Coastal
                            {
                                return Err(OrderError::Unreachable);
                            }
                        }
                        Ok(Order::Move { unit: unit_ref, dest, dest_coast: None, via_convoy })
                    }
                    UnitKind::Fleet => {
                        if via_convoy {
                            return Err(OrderError::FleetViaConvoy);
                        }
                        if dest.has_multiple_coasts() {
                            let options = coasts_into(unit.location, unit.coast, dest);
                            match dest_coast {
                                Some(c) if options.contains(&Some(c)) => Ok(order),
                                Some(_) => Err(OrderError::Unreachable),
                                None => match options.as_slice() {
                                    [] => Err(OrderError::Unreachable),
                                    [only] => Ok(Order::Move {
                                        unit: unit_ref,
                                        dest,
                                        dest_coast: *only,
                                        via_convoy: false,
                                    }),
                                    _ => Err(OrderError::CoastRequired),
                                },
                            }
                        } else if reachable(unit.location, unit.coast, dest, None, UnitKind::Fleet)
                        {
                            Ok(Order::Move { unit: unit_ref, dest, dest_coast: None, via_convoy })
                        } else {
                            Err(OrderError::Unreachable)
                        }
                    }
                }
            }

            Order::Support { supported, dest, .. } => {
                let target_idx = self.lookup[supported.province as usize];
                if target_idx.is_none() {
                    return Err(OrderError::SupportTargetVacant);
                }
                let anchor = dest.unwrap_or(supported.province);
                if !reachable(unit.location, unit.coast, anchor, None, unit.kind) {
                    return Err(OrderError::SupportOutOfRange);
                }
                Ok(order)
            }

            Order::Convoy { army, .. } => {
                if unit.kind != UnitKind::Fleet {
                    return Err(OrderError::ConvoyByArmy);
                }
                if unit.location.terrain() != Terrain::Sea {
                    return Err(OrderError::ConvoyNotAtSea);
                }
                match self.lookup[army.province as usize] {
                    Some(idx) if self.entries[idx].unit.kind == UnitKind::Army => Ok(order),
                    _ => Err(OrderError::ConvoyTargetNotArmy),
                }
            }
        }
    }

    /// Marks moves that require a convoy and degrades those with no chain
    /// of convoy orders at all (validation rule; dislodgement of fleets is
    /// handled later during resolution).
    fn classify_convoy(&mut self, idx: usize) {
        let entry = self.entries[idx];
        let (dest, via_convoy) = match entry.effective {
            Order::Move { dest, via_convoy, .. } => (dest, via_convoy),
            _ => return,
        };
        if entry.unit.kind != UnitKind::Army {
            return;
        }
        let adjacent = reachable(entry.unit.location, None, dest, None, UnitKind::Army);
        if adjacent && !via_convoy {
            return;
        }
        if self.static_convoy_path(entry.unit.location, dest) {
            self.entries[idx].convoyed = true;
        } else if adjacent {
            // "via convoy" with no fleets in place falls back to the
            // ordinary land route.
            self.entries[idx].convoyed = false;
        } else {
            self.entries[idx].effective = entry.reported.degraded_to_hold();
            self.entries[idx].error = Some(OrderError::NoConvoyPath);
        }
    }

    /// True if a chain of matching convoy orders links `from` to `to`,
    /// ignoring whether the fleets survive.
    fn static_convoy_path(&self, from: Province, to: Province) -> bool {
        self.convoy_path(from, to, None)
    }

    /// True if a chain of matching convoy orders links `from` to `to`.
    /// With `judge` set, only fleets whose convoy order resolves (i.e. the
    /// fleet is not dislodged) count.
    fn convoy_path(
        &self,
        from: Province,
        to: Province,
        mut judge: Option<&mut dyn FnMut(Province) -> bool>,
    ) -> bool {
        let fleets: Vec<Province> = self
            .entries
            .iter()
            .filter_map(|e| match e.effective {
                Order::Convoy { army, dest, .. }
                    if army.province == from && dest == to && e.unit.location.terrain() == Terrain::Sea =>
                {
                    Some(e.unit.location)
                }
                _ => None,
            })
            .collect();

        let mut queue: Vec<Province> = Vec::new();
        let mut visited = [false; PROVINCE_COUNT];
        for &fleet in &fleets {
            if reachable(from, None, fleet, None, UnitKind::Fleet)
                || adjacent_any_coast(from, fleet)
            {
                if let Some(j) = judge.as_deref_mut() {
                    if !j(fleet) {
                        continue;
                    }
                }
                visited[fleet as usize] = true;
                queue.push(fleet);
            }
        }

        while let Some(current) = queue.pop() {
            if reachable(current, None, to, None, UnitKind::Fleet)
                || adjacent_any_coast(to, current)
            {
                return true;
            }
            for &fleet in &fleets {
                if visited[fleet as usize] {
                    continue;
                }
                if reachable(current, None, fleet, None, UnitKind::Fleet) {
                    if let Some(j) = judge.as_deref_mut() {
                        if !j(fleet) {
                            continue;
                        }
                    }
                    visited[fleet as usize] = true;
                    queue.push(fleet);
                }
            }
        }
        false
    }

    fn resolve_all(&mut self) {
        for i in 0..self.entries.len() {
            let province = self.entries[i].unit.location;
            self.resolve_at(province);
        }
    }

    /// Resolves the order at `province`, guessing optimistically on
    /// dependency cycles and re-checking when the guess proves wrong.
    fn resolve_at(&mut self, province: Province) -> bool {
        let idx = match self.lookup[province as usize] {
            Some(idx) => idx,
            None => return false,
        };

        match self.entries[idx].state {
            ResState::Resolved | ResState::Guessing => return self.entries[idx].resolution,
            ResState::Unresolved => {}
        }

        self.entries[idx].state = ResState::Guessing;
        self.entries[idx].resolution = true;

        let result = self.evaluate(idx);

        if self.entries[idx].state == ResState::Guessing && result != self.entries[idx].resolution {
            self.entries[idx].resolution = result;
            let settled = self.evaluate(idx);
            self.entries[idx].state = ResState::Resolved;
            self.entries[idx].resolution = settled;
            return settled;
        }

        self.entries[idx].state = ResState::Resolved;
        self.entries[idx].resolution = result;
        result
    }

    fn evaluate(&mut self, idx: usize) -> bool {
        match self.entries[idx].effective {
            Order::Hold { .. } => true,
            Order::Move { .. } => self.move_succeeds(idx),
            Order::Support { .. } => self.support_uncut(idx),
            Order::Convoy { .. } => self.convoy_stands(idx),
        }
    }

    fn move_succeeds(&mut self, idx: usize) -> bool {
        let entry = self.entries[idx];
        let dest = entry.move_dest().expect("move entry");
        let origin = entry.unit.location;

        if entry.convoyed {
            let live = self.live_convoy_path(origin, dest);
            self.entries[idx].convoy_disrupted = !live;
            if !live {
                return false;
            }
        }

        let attack = self.attack_strength(idx);
        let hold = self.hold_strength(dest);
        if attack <= hold {
            return false;
        }

        // Head-to-head: the defender is moving straight back at us. A move
        // under convoy passes over the defender and is exempt.
        if !entry.convoyed {
            if let Some(def_idx) = self.lookup[dest as usize] {
                let defender = self.entries[def_idx];
                if defender.move_dest() == Some(origin) && !defender.convoyed {
                    let defend = self.attack_strength(def_idx);
                    if attack <= defend {
                        return false;
                    }
                }
            }
        }

        // Every other move into the same province must be overpowered.
        for other_idx in 0..self.entries.len() {
            if other_idx == idx {
                continue;
            }
            if self.entries[other_idx].move_dest() == Some(dest) {
                let prevent = self.prevent_strength(other_idx);
                if attack <= prevent {
                    return false;
                }
            }
        }

        true
    }

    /// A support holds unless a foreign unit attacks the supporter, with
    /// two exceptions: the attack from the province the support is
    /// directed against cannot cut it (unless that attack arrives by
    /// convoy, or actually dislodges the supporter), and attacks by the
    /// supporter's own power never cut.
    fn support_uncut(&mut self, idx: usize) -> bool {
        let entry = self.entries[idx];
        let my_province = entry.unit.location;
        let my_power = entry.unit.owner;
        let supported_dest = match entry.effective {
            Order::Support { dest, .. } => dest,
            _ => return false,
        };

        for other_idx in 0..self.entries.len() {
            let other = self.entries[other_idx];
            if other.move_dest() != Some(my_province) {
                continue;
            }
            if other.unit.owner == my_power {
                continue;
            }
            if supported_dest == Some(other.unit.location) && !other.convoyed {
                // Attack from the province we are supporting an attack
                // on: cuts only by dislodging the supporter outright.
                if self.resolve_at(other.unit.location) {
                    return false;
                }
                continue;
            }
            if other.convoyed {
                // A convoyed attack reaches the supporter only if its
                // chain survives.
                let origin = other.unit.location;
                let dest = other.move_dest().expect("move entry");
                if !self.live_convoy_path(origin, dest) {
                    continue;
                }
            }
            return false;
        }
        true
    }

    /// A convoy stands while its fleet is not dislodged.
    fn convoy_stands(&mut self, idx: usize) -> bool {
        let fleet_province = self.entries[idx].unit.location;
        for other_idx in 0..self.entries.len() {
            if self.entries[other_idx].move_dest() == Some(fleet_province) {
                let attacker = self.entries[other_idx].unit.location;
                if self.resolve_at(attacker) {
                    return false;
                }
            }
        }
        true
    }

    fn live_convoy_path(&mut self, from: Province, to: Province) -> bool {
        // Resolve the convoy order of every candidate fleet first; the
        // borrow rules keep the path search itself immutable.
        let fleets: Vec<Province> = self
            .entries
            .iter()
            .filter_map(|e| match e.effective {
                Order::Convoy { army, dest, .. } if army.province == from && dest == to => {
                    Some(e.unit.location)
                }
                _ => None,
            })
            .collect();
        let mut alive = [false; PROVINCE_COUNT];
        for fleet in fleets {
            alive[fleet as usize] = self.resolve_at(fleet);
        }
        self.convoy_path(from, to, Some(&mut |p: Province| alive[p as usize]))
    }

    /// 1 + valid supports for this move. Zero against a province held by a
    /// unit of the same power that is not vacating it.
    fn attack_strength(&mut self, idx: usize) -> i32 {
        let entry = self.entries[idx];
        let dest = match entry.move_dest() {
            Some(dest) => dest,
            None => return 0,
        };
        let origin = entry.unit.location;

        if let Some(occ_idx) = self.lookup[dest as usize] {
            let occupant = self.entries[occ_idx];
            if occupant.unit.owner == entry.unit.owner {
                let vacating = occupant.move_dest().is_some()
                    && occupant.move_dest() != Some(origin)
                    && self.resolve_at(dest);
                if !vacating {
                    return 0;
                }
            }
        }

        1 + self.support_count(origin, Some(dest))
    }

    /// 1 + valid supports-to-hold, or 0/1 for a unit that is itself moving.
    fn hold_strength(&mut self, province: Province) -> i32 {
        let idx = match self.lookup[province as usize] {
            Some(idx) => idx,
            None => return 0,
        };
        if self.entries[idx].move_dest().is_some() {
            if self.resolve_at(province) {
                return 0;
            }
            return 1;
        }
        1 + self.support_count(province, None)
    }

    /// Strength with which a move contests its destination against other
    /// arrivals. A head-to-head loser contributes nothing.
    fn prevent_strength(&mut self, idx: usize) -> i32 {
        let entry = self.entries[idx];
        let dest = match entry.move_dest() {
            Some(dest) => dest,
            None => return 0,
        };
        let origin = entry.unit.location;

        if entry.convoyed && !self.live_convoy_path(origin, dest) {
            return 0;
        }

        if !entry.convoyed {
            if let Some(def_idx) = self.lookup[dest as usize] {
                let defender = self.entries[def_idx];
                if defender.move_dest() == Some(origin) && !defender.convoyed {
                    if !self.resolve_at(origin) {
                        return 0;
                    }
                }
            }
        }

        1 + self.support_count(origin, Some(dest))
    }

    /// Counts resolved supports matching (supported province, destination);
    /// `dest = None` matches support-hold orders.
    fn support_count(&mut self, supported: Province, dest: Option<Province>) -> i32 {
        let mut count = 0;
        for idx in 0..self.entries.len() {
            let entry = self.entries[idx];
            match entry.effective {
                Order::Support { supported: s, dest: d, .. }
                    if s.province == supported && d == dest =>
                {
                    if self.resolve_at(entry.unit.location) {
                        count += 1;
                    }
                }
                _ => {}
            }
        }
        count
    }

    fn into_result(mut self) -> Adjudication {
        let mut result = Adjudication::default();

        // Successful moves, by destination.
        let mut arrival: [Option<Province>; PROVINCE_COUNT] = [None; PROVINCE_COUNT];
        let mut contested = [0u8; PROVINCE_COUNT];
        for entry in &self.entries {
            if let Some(dest) = entry.move_dest() {
                contested[dest as usize] = contested[dest as usize].saturating_add(1);
                if entry.resolution {
                    arrival[dest as usize] = Some(entry.unit.location);
                }
            }
        }

        // Dislodgements: a unit that did not move away, standing where a
        // successful move arrived.
        let mut dislodged_at: [Option<Province>; PROVINCE_COUNT] = [None; PROVINCE_COUNT];
        for entry in &self.entries {
            let here = entry.unit.location;
            let moved_away = entry.move_dest().is_some() && entry.resolution;
            if let Some(attacker_from) = arrival[here as usize] {
                if !moved_away {
                    dislodged_at[here as usize] = Some(attacker_from);
                }
            }
        }

        // Standoffs: contested provinces nobody entered and nobody holds.
        for p in crate::board::ALL_PROVINCES {
            let i = p as usize;
            if contested[i] >= 2 && arrival[i].is_none() {
                let vacated = match self.lookup[i] {
                    None => true,
                    Some(idx) => {
                        let e = self.entries[idx];
                        e.move_dest().is_some() && e.resolution
                    }
                };
                if vacated {
                    result.standoffs.insert(p);
                }
            }
        }

        // Post-resolution occupancy, for retreat legality.
        let mut occupied = [false; PROVINCE_COUNT];
        for entry in &self.entries {
            let here = entry.unit.location;
            if let Some(dest) = entry.move_dest() {
                if entry.resolution {
                    occupied[dest as usize] = true;
                    continue;
                }
            }
            if dislodged_at[here as usize].is_none() {
                occupied[here as usize] = true;
            }
        }

        for entry in &self.entries {
            let here = entry.unit.location;
            let dislodged_from = dislodged_at[here as usize];
            // A successful mover has left the province, so it can never
            // also be dislodged; one conjunction covers every order kind.
            let success = entry.resolution && entry.error.is_none() && dislodged_from.is_none();
            let reason = self.failure_reason(entry, dislodged_from);

            result.outcomes.insert(
                here,
                OrderOutcome {
                    power: entry.unit.owner,
                    order: entry.reported,
                    success,
                    reason,
                    dislodged: dislodged_from.is_some(),
                    dislodged_from,
                },
            );

            if let Some(attacker_from) = dislodged_from {
                let retreats = retreat_options(entry.unit, attacker_from, &occupied, &result.standoffs);
                result.dislodgements.push(Dislodgement {
                    unit: entry.unit,
                    attacker_from,
                    retreats,
                });
            }
        }

        // Orders that never attached to a unit.
        self.rejected.sort_by_key(|(_, o, _)| o.unit_province());
        for (power, order, error) in self.rejected.drain(..) {
            result
                .outcomes
                .entry(order.unit_province())
                .or_insert_with(|| OrderOutcome {
                    power,
                    order,
                    success: false,
                    reason: Some(error.message().to_string()),
                    dislodged: false,
                    dislodged_from: None,
                });
        }

        result
    }

    fn failure_reason(&self, entry: &Entry, dislodged_from: Option<Province>) -> Option<String> {
        if let Some(error) = entry.error {
            return Some(error.message().to_string());
        }
        if entry.resolution {
            if dislodged_from.is_some() && entry.move_dest().is_none() {
                return Some("dislodged".to_string());
            }
            return None;
        }
        let text = match entry.effective {
            Order::Move { .. } if entry.convoy_disrupted => "convoy disrupted",
            Order::Move { .. } => "bounced",
            Order::Support { .. } => "support cut",
            Order::Convoy { .. } => "convoying fleet dislodged",
            Order::Hold { .. } => return None,
        };
        Some(text.to_string())
    }
}

/// Adjacency ignoring which coast of a split province is involved; convoy
/// embarkation and landing are coast-agnostic.
fn adjacent_any_coast(coastal: Province, sea: Province) -> bool {
    neighbors(coastal, None, UnitKind::Fleet).contains(&sea)
}

/// Legal retreat destinations: adjacent by unit kind, minus occupied
/// provinces, standoff locations, and the attacker's origin.
fn retreat_options(
    unit: Unit,
    attacker_from: Province,
    occupied: &[bool; PROVINCE_COUNT],
    standoffs: &BTreeSet<Province>,
) -> Vec<RetreatDest> {
    let mut out = Vec::new();
    for dest in neighbors(unit.location, unit.coast, unit.kind) {
        if dest == attacker_from || occupied[dest as usize] || standoffs.contains(&dest) {
            continue;
        }
        if unit.kind == UnitKind::Fleet && dest.has_multiple_coasts() {
            for coast in coasts_into(unit.location, unit.coast, dest) {
                out.push(RetreatDest { province: dest, coast });
            }
        } else {
            out.push(RetreatDest { province: dest, coast: None });
        }
    }
    out
}
