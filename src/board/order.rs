//! Order types for the movement, retreat, and build phases.
//!
//! Orders are tagged variants; the adjudicator dispatches on the tag. Each
//! order's `Display` form is the canonical notation that the freeform
//! parser accepts back unchanged, so `parse(order.to_string())` round-trips.

use serde::{Deserialize, Serialize};

use super::province::{Coast, Province};
use super::unit::UnitKind;

/// A reference to a unit as written in an order: an optional `A`/`F`
/// prefix and the province the unit stands in.
///
/// The prefix is what the order's author wrote, not ground truth; the
/// validation pass resolves the reference against the actual board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<UnitKind>,
    pub province: Province,
}

impl UnitRef {
    pub fn new(kind: UnitKind, province: Province) -> UnitRef {
        UnitRef { kind: Some(kind), province }
    }

    pub fn bare(province: Province) -> UnitRef {
        UnitRef { kind: None, province }
    }
}

impl std::fmt::Display for UnitRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{} {}", kind, self.province),
            None => write!(f, "{}", self.province),
        }
    }
}

/// A movement-phase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Order {
    /// `A PAR HOLD`
    Hold { unit: UnitRef },

    /// `A PAR -> BUR`, `F MAO -> SPA (NC)`, `A LON -> NWY VIA CONVOY`
    Move {
        unit: UnitRef,
        dest: Province,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dest_coast: Option<Coast>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        via_convoy: bool,
    },

    /// `A GAS SUPPORT A PAR` (support-hold) or
    /// `A GAS SUPPORT A PAR -> BUR` (support-move)
    Support {
        unit: UnitRef,
        supported: UnitRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dest: Option<Province>,
    },

    /// `F NTH CONVOY A LON -> NWY`
    Convoy {
        fleet: UnitRef,
        army: UnitRef,
        dest: Province,
    },
}

impl Order {
    /// The province of the unit this order is for.
    pub fn unit_province(&self) -> Province {
        match self {
            Order::Hold { unit }
            | Order::Move { unit, .. }
            | Order::Support { unit, .. } => unit.province,
            Order::Convoy { fleet, .. } => fleet.province,
        }
    }

    /// The unit reference this order is for.
    pub fn unit_ref(&self) -> UnitRef {
        match self {
            Order::Hold { unit }
            | Order::Move { unit, .. }
            | Order::Support { unit, .. } => *unit,
            Order::Convoy { fleet, .. } => *fleet,
        }
    }

    /// A hold order for the same unit; used when an order is degraded.
    pub fn degraded_to_hold(&self) -> Order {
        Order::Hold { unit: self.unit_ref() }
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Hold { unit } => write!(f, "{} HOLD", unit),
            Order::Move { unit, dest, dest_coast, via_convoy } => {
                write!(f, "{} -> {}", unit, dest)?;
                if let Some(coast) = dest_coast {
                    write!(f, " ({})", coast)?;
                }
                if *via_convoy {
                    write!(f, " VIA CONVOY")?;
                }
                Ok(())
            }
            Order::Support { unit, supported, dest } => {
                write!(f, "{} SUPPORT {}", unit, supported)?;
                if let Some(dest) = dest {
                    write!(f, " -> {}", dest)?;
                }
                Ok(())
            }
            Order::Convoy { fleet, army, dest } => {
                write!(f, "{} CONVOY {} -> {}", fleet, army, dest)
            }
        }
    }
}

/// A retreat-phase order. `dest = None` means disband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetreatOrder {
    pub unit: UnitRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<Province>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_coast: Option<Coast>,
}

impl RetreatOrder {
    pub fn retreat(unit: UnitRef, dest: Province) -> RetreatOrder {
        RetreatOrder { unit, dest: Some(dest), dest_coast: None }
    }

    pub fn disband(unit: UnitRef) -> RetreatOrder {
        RetreatOrder { unit, dest: None, dest_coast: None }
    }

    pub fn is_disband(&self) -> bool {
        self.dest.is_none()
    }
}

impl std::fmt::Display for RetreatOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.dest {
            Some(dest) => {
                write!(f, "{} -> {}", self.unit, dest)?;
                if let Some(coast) = self.dest_coast {
                    write!(f, " ({})", coast)?;
                }
                Ok(())
            }
            None => write!(f, "{} DISBAND", self.unit),
        }
    }
}

/// Whether a build-phase order creates or removes a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildAction {
    Build,
    Disband,
}

/// A build-phase order: `BUILD F STP (NC)`, `DISBAND A PAR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildOrder {
    pub action: BuildAction,
    pub province: Province,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_kind: Option<UnitKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coast: Option<Coast>,
}

impl BuildOrder {
    pub fn build(kind: UnitKind, province: Province) -> BuildOrder {
        BuildOrder { action: BuildAction::Build, province, unit_kind: Some(kind), coast: None }
    }

    pub fn build_fleet_on(province: Province, coast: Coast) -> BuildOrder {
        BuildOrder {
            action: BuildAction::Build,
            province,
            unit_kind: Some(UnitKind::Fleet),
            coast: Some(coast),
        }
    }

    pub fn disband(kind: UnitKind, province: Province) -> BuildOrder {
        BuildOrder { action: BuildAction::Disband, province, unit_kind: Some(kind), coast: None }
    }
}

impl std::fmt::Display for BuildOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.action {
            BuildAction::Build => write!(f, "BUILD")?,
            BuildAction::Disband => write!(f, "DISBAND")?,
        }
        if let Some(kind) = self.unit_kind {
            write!(f, " {}", kind)?;
        }
        write!(f, " {}", self.province)?;
        if let Some(coast) = self.coast {
            write!(f, " ({})", coast)?;
        }
        Ok(())
    }
}
