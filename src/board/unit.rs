//! Units: armies and fleets with an owner and a board position.

use serde::{Deserialize, Serialize};

use super::province::{Coast, Power, Province, Terrain};

/// The kind of a military unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    Army,
    Fleet,
}

impl UnitKind {
    /// The single-letter order-notation prefix.
    pub const fn letter(self) -> char {
        match self {
            UnitKind::Army => 'A',
            UnitKind::Fleet => 'F',
        }
    }

    /// Parses `A`/`F` (either case) and the long forms `ARMY`/`FLEET`.
    pub fn parse(s: &str) -> Option<UnitKind> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" | "ARMY" => Some(UnitKind::Army),
            "F" | "FLEET" => Some(UnitKind::Fleet),
            _ => None,
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A unit on the board.
///
/// Position invariants: an army is never at sea; `coast` is present iff the
/// location is a multi-coast province and the unit is a fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub kind: UnitKind,
    pub owner: Power,
    pub location: Province,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coast: Option<Coast>,
}

impl Unit {
    pub fn army(owner: Power, location: Province) -> Unit {
        Unit { kind: UnitKind::Army, owner, location, coast: None }
    }

    pub fn fleet(owner: Power, location: Province) -> Unit {
        Unit { kind: UnitKind::Fleet, owner, location, coast: None }
    }

    pub fn fleet_on(owner: Power, location: Province, coast: Coast) -> Unit {
        Unit { kind: UnitKind::Fleet, owner, location, coast: Some(coast) }
    }

    /// Checks the position invariants for this unit.
    pub fn position_is_legal(&self) -> bool {
        match self.kind {
            UnitKind::Army => {
                self.location.terrain() != Terrain::Sea && self.coast.is_none()
            }
            UnitKind::Fleet => {
                self.location.terrain() != Terrain::Land
                    && (self.coast.is_some() == self.location.has_multiple_coasts())
                    && self
                        .coast
                        .map(|c| self.location.coasts().contains(&c))
                        .unwrap_or(true)
            }
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.location)?;
        if let Some(coast) = self.coast {
            write!(f, " ({})", coast)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_kind_parse() {
        assert_eq!(UnitKind::parse("A"), Some(UnitKind::Army));
        assert_eq!(UnitKind::parse("f"), Some(UnitKind::Fleet));
        assert_eq!(UnitKind::parse("Army"), Some(UnitKind::Army));
        assert_eq!(UnitKind::parse("FLEET"), Some(UnitKind::Fleet));
        assert_eq!(UnitKind::parse("x"), None);
    }

    #[test]
    fn army_at_sea_is_illegal() {
        let u = Unit::army(Power::England, Province::Nth);
        assert!(!u.position_is_legal());
    }

    #[test]
    fn fleet_inland_is_illegal() {
        let u = Unit::fleet(Power::Austria, Province::Vie);
        assert!(!u.position_is_legal());
    }

    #[test]
    fn fleet_coast_iff_split_province() {
        assert!(Unit::fleet_on(Power::Russia, Province::Stp, Coast::South).position_is_legal());
        assert!(!Unit::fleet(Power::Russia, Province::Stp).position_is_legal());
        assert!(!Unit::fleet_on(Power::France, Province::Bre, Coast::North).position_is_legal());
        // STP has no east coast.
        assert!(!Unit::fleet_on(Power::Russia, Province::Stp, Coast::East).position_is_legal());
    }

    #[test]
    fn display_forms() {
        assert_eq!(Unit::army(Power::France, Province::Par).to_string(), "A PAR");
        assert_eq!(
            Unit::fleet_on(Power::Russia, Province::Stp, Coast::South).to_string(),
            "F STP (SC)"
        );
    }
}
