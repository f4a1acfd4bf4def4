//! The per-line order grammar.
//!
//! Each function takes one scrubbed line (bullets, numbering, and markdown
//! already removed; arrows normalized to `->`) and produces a structured
//! order or an error describing why the line did not parse. Everything is
//! case-insensitive; province references go through `normalize_province`.

use thiserror::Error;

use crate::board::order::{BuildAction, BuildOrder, Order, RetreatOrder, UnitRef};
use crate::board::province::{Coast, Province};
use crate::board::unit::UnitKind;

use super::normalize::normalize_province;

/// Why a single line failed to parse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LineError {
    #[error("unknown province '{0}'")]
    UnknownProvince(String),

    #[error("line does not match any order shape: '{0}'")]
    Unrecognized(String),

    #[error("missing destination in '{0}'")]
    MissingDestination(String),

    #[error("unknown coast '{0}'")]
    UnknownCoast(String),
}

/// Parses one movement-phase order line.
pub fn parse_order_line(line: &str) -> Result<Order, LineError> {
    let text = prepare(line);
    if text.is_empty() {
        return Err(LineError::Unrecognized(line.to_string()));
    }

    // Convoy flag is a suffix on the whole line.
    let (text, via_convoy) = strip_suffix_word(&text, &["VIA CONVOY", "BY CONVOY"]);

    if let Some((lhs, rhs)) = split_keyword(&text, &[" SUPPORTS ", " SUPPORT ", " S "]) {
        let unit = parse_unit_spec(&lhs)?;
        let (rhs, _) = strip_suffix_word(&rhs, &["HOLDS", "HOLD", "H"]);
        if let Some((sup, dest)) = split_keyword(&rhs, &[" -> ", " TO "]) {
            let supported = parse_unit_spec(&sup)?;
            let (dest, _) = parse_destination(&dest)?;
            return Ok(Order::Support { unit, supported, dest: Some(dest) });
        }
        let supported = parse_unit_spec(&rhs)?;
        return Ok(Order::Support { unit, supported, dest: None });
    }

    if let Some((lhs, rhs)) = split_keyword(&text, &[" CONVOYS ", " CONVOY ", " C "]) {
        let fleet = parse_unit_spec(&lhs)?;
        let (army_text, dest_text) = split_keyword(&rhs, &[" -> ", " TO "])
            .ok_or_else(|| LineError::MissingDestination(line.to_string()))?;
        let army = parse_unit_spec(&army_text)?;
        let (dest, _) = parse_destination(&dest_text)?;
        return Ok(Order::Convoy { fleet, army, dest });
    }

    let (text, holds) = strip_suffix_word(&text, &["HOLDS", "HOLD", "H"]);
    if holds {
        let unit = parse_unit_spec(&text)?;
        return Ok(Order::Hold { unit });
    }

    if let Some((lhs, rhs)) = split_keyword(&text, &[" -> ", " TO "]) {
        let unit = parse_unit_spec(&lhs)?;
        let (dest, dest_coast) = parse_destination(&rhs)?;
        return Ok(Order::Move { unit, dest, dest_coast, via_convoy });
    }

    Err(LineError::Unrecognized(line.to_string()))
}

/// Parses one retreat-phase line: a retreat move or a disband.
pub fn parse_retreat_line(line: &str) -> Result<RetreatOrder, LineError> {
    let text = prepare(line);
    if text.is_empty() {
        return Err(LineError::Unrecognized(line.to_string()));
    }

    let (text, disband) = strip_suffix_word(&text, &["DISBANDS", "DISBAND"]);
    if disband {
        let unit = parse_unit_spec(&text)?;
        return Ok(RetreatOrder::disband(unit));
    }

    if let Some((lhs, rhs)) = split_keyword(&text, &[" -> ", " TO "]) {
        let unit = parse_unit_spec(&lhs)?;
        let (dest, dest_coast) = parse_destination(&rhs)?;
        return Ok(RetreatOrder { unit, dest: Some(dest), dest_coast });
    }

    Err(LineError::Unrecognized(line.to_string()))
}

/// Parses one build-phase line: `BUILD [A|F] PROV [(coast)]` or
/// `DISBAND [A|F] PROV`.
pub fn parse_build_line(line: &str) -> Result<BuildOrder, LineError> {
    let text = prepare(line);

    let (action, rest) = if let Some(rest) = strip_prefix_word(&text, &["BUILD"]) {
        (BuildAction::Build, rest)
    } else if let Some(rest) = strip_prefix_word(&text, &["DISBAND", "REMOVE"]) {
        (BuildAction::Disband, rest)
    } else {
        return Err(LineError::Unrecognized(line.to_string()));
    };

    let (rest, coast) = take_trailing_coast(&rest)?;
    let unit = parse_unit_spec(&rest)?;
    Ok(BuildOrder { action, province: unit.province, unit_kind: unit.kind, coast })
}

/// True when the line looks like it could be an order at all; used by the
/// headerless fallback scan.
pub fn looks_like_order(line: &str) -> bool {
    let text = prepare(line);
    if text.is_empty() {
        return false;
    }
    const MARKERS: &[&str] = &[
        " -> ", " TO ", " SUPPORT", " CONVOY", " HOLD", " S ", " C ",
    ];
    let padded = format!(" {} ", text);
    MARKERS.iter().any(|m| padded.contains(m))
        || text.ends_with(" H")
        || text.starts_with("BUILD ")
        || text.starts_with("DISBAND ")
}

/// Uppercases, collapses whitespace, and canonicalizes the move
/// separators (` - `, `MOVE TO`, `MOVES TO`) to `->`.
fn prepare(line: &str) -> String {
    let text = line
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    text.replace(" MOVES TO ", " -> ")
        .replace(" MOVE TO ", " -> ")
        .replace(" - ", " -> ")
}

/// Splits at the first occurrence of any keyword, in the order given.
fn split_keyword(text: &str, keywords: &[&str]) -> Option<(String, String)> {
    let padded = format!(" {} ", text);
    for kw in keywords {
        if let Some(pos) = padded.find(kw) {
            let lhs = padded[..pos].trim().to_string();
            let rhs = padded[pos + kw.len()..].trim().to_string();
            if !lhs.is_empty() && !rhs.is_empty() {
                return Some((lhs, rhs));
            }
        }
    }
    None
}

/// Strips a trailing standalone word; returns the rest and whether it was
/// found. `A HOL H` strips the `H`, but `HOL` alone is untouched.
fn strip_suffix_word(text: &str, words: &[&str]) -> (String, bool) {
    for w in words {
        if let Some(rest) = text.strip_suffix(w) {
            if let Some(rest) = rest.strip_suffix(' ') {
                return (rest.trim().to_string(), true);
            }
        }
    }
    (text.to_string(), false)
}

fn strip_prefix_word(text: &str, words: &[&str]) -> Option<String> {
    for w in words {
        if let Some(rest) = text.strip_prefix(w) {
            if let Some(rest) = rest.strip_prefix(' ') {
                return Some(rest.trim().to_string());
            }
        }
    }
    None
}

/// Parses `[A|F] <province text>`, tolerating a coast suffix on the
/// province (the unit's true coast comes from the board).
fn parse_unit_spec(text: &str) -> Result<UnitRef, LineError> {
    let (text, _) = take_trailing_coast(text).unwrap_or((text.to_string(), None));
    let mut tokens: Vec<&str> = text.split(' ').collect();
    let kind = tokens
        .first()
        .and_then(|t| UnitKind::parse(t.trim_end_matches('.')));
    if kind.is_some() {
        tokens.remove(0);
    }
    let name = tokens.join(" ");
    let province = normalize_province(&name)
        .ok_or_else(|| LineError::UnknownProvince(name.clone()))?;
    Ok(UnitRef { kind, province })
}

/// Parses a destination with an optional coast: `SPA (NC)`, `SPA/NC`,
/// `STP NC`, or a bare province.
fn parse_destination(text: &str) -> Result<(Province, Option<Coast>), LineError> {
    let (rest, coast) = take_trailing_coast(text)?;
    let province = normalize_province(&rest)
        .ok_or_else(|| LineError::UnknownProvince(rest.clone()))?;
    Ok((province, coast))
}

/// Detaches a trailing coast written as `(NC)`, `/NC`, or a bare `NC`
/// token. A trailing parenthetical that is not a coast is treated as
/// commentary and dropped.
fn take_trailing_coast(text: &str) -> Result<(String, Option<Coast>), LineError> {
    let text = text.trim();

    if let Some(open) = text.rfind('(') {
        if text.ends_with(')') {
            let inner = &text[open + 1..text.len() - 1];
            let rest = text[..open].trim().to_string();
            return match Coast::parse(inner) {
                Some(c) => Ok((rest, Some(c))),
                None => Ok((rest, None)),
            };
        }
    }

    if let Some((rest, after)) = text.rsplit_once('/') {
        return match Coast::parse(after) {
            Some(c) => Ok((rest.trim().to_string(), Some(c))),
            None => Err(LineError::UnknownCoast(after.to_string())),
        };
    }

    if let Some((rest, last)) = text.rsplit_once(' ') {
        if matches!(last, "NC" | "SC" | "EC" | "WC") {
            if let Some(c) = Coast::parse(last) {
                return Ok((rest.trim().to_string(), Some(c)));
            }
        }
    }

    Ok((text.to_string(), None))
}
