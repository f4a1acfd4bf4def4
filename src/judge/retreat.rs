//! Retreat-phase resolution.
//!
//! Retreat orders are checked against the legal destination sets computed
//! at adjudication time. When two or more dislodged units retreat to the
//! same province, every one of them is destroyed. Dislodged units with no
//! order are disbanded (civil disorder).

use crate::board::order::{RetreatOrder, UnitRef};
use crate::board::province::{Power, Province, PROVINCE_COUNT};
use crate::board::unit::UnitKind;
use crate::game::state::PendingRetreat;

/// The resolved fate of one retreat order.
#[derive(Debug, Clone, PartialEq)]
pub struct RetreatOutcome {
    pub power: Power,
    pub order: RetreatOrder,
    pub success: bool,
    pub reason: Option<String>,
}

/// Resolves a batch of retreat orders against the pending dislodgements.
///
/// The returned list covers every pending retreat: submitted orders in
/// submission order first, then synthesized disbands for units whose power
/// sent nothing usable.
pub fn resolve_retreats(
    orders: &[(Power, RetreatOrder)],
    pending: &[PendingRetreat],
) -> Vec<RetreatOutcome> {
    let mut outcomes = Vec::new();
    let mut ordered = [false; PROVINCE_COUNT];

    // First pass: bind each order to its pending retreat and validate the
    // destination, so conflicts can be counted over valid retreats only.
    let mut valid_dest: Vec<Option<Province>> = Vec::with_capacity(orders.len());
    for (power, order) in orders {
        let bound = validate(*power, order, pending, &mut ordered);
        valid_dest.push(match &bound {
            Ok(dest) => *dest,
            Err(_) => None,
        });
        outcomes.push(match bound {
            Ok(_) => RetreatOutcome {
                power: *power,
                order: *order,
                success: true,
                reason: None,
            },
            Err(reason) => RetreatOutcome {
                power: *power,
                order: *order,
                success: false,
                reason: Some(reason),
            },
        });
    }

    // Conflict pass: all retreats into the same province are destroyed.
    let mut target_count = [0u8; PROVINCE_COUNT];
    for dest in valid_dest.iter().flatten() {
        target_count[*dest as usize] += 1;
    }
    for (i, dest) in valid_dest.iter().enumerate() {
        if let Some(dest) = dest {
            if target_count[*dest as usize] > 1 {
                outcomes[i].success = false;
                outcomes[i].reason = Some("retreat conflict; all units destroyed".to_string());
            }
        }
    }

    // Civil disorder: unordered dislodged units disband.
    for p in pending {
        if !ordered[p.unit.location as usize] {
            outcomes.push(RetreatOutcome {
                power: p.unit.owner,
                order: RetreatOrder::disband(UnitRef::new(p.unit.kind, p.unit.location)),
                success: true,
                reason: Some("no retreat order; disbanded".to_string()),
            });
        }
    }

    outcomes
}

/// Binds an order to a pending retreat and validates its destination.
/// Returns the destination province for a retreat, `None` for a disband.
fn validate(
    power: Power,
    order: &RetreatOrder,
    pending: &[PendingRetreat],
    ordered: &mut [bool; PROVINCE_COUNT],
) -> Result<Option<Province>, String> {
    let at = order.unit.province;
    let entry = pending
        .iter()
        .find(|p| p.unit.location == at)
        .ok_or_else(|| format!("no dislodged unit at {}", at))?;
    if entry.unit.owner != power {
        return Err(format!("dislodged unit at {} belongs to {}", at, entry.unit.owner));
    }
    if ordered[at as usize] {
        return Err(format!("duplicate retreat order for {}", at));
    }
    ordered[at as usize] = true;

    let dest = match order.dest {
        None => return Ok(None),
        Some(dest) => dest,
    };

    let allowed = entry.allowed.iter().any(|d| {
        d.province == dest
            && match (entry.unit.kind, order.dest_coast) {
                (UnitKind::Fleet, Some(c)) => d.coast == Some(c),
                // A fleet may omit the coast when only one option exists.
                _ => true,
            }
    });
    if !allowed {
        return Err(format!("{} is not a legal retreat destination", dest));
    }
    Ok(Some(dest))
}
