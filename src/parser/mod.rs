//! Freeform order parsing.
//!
//! Turns a raw model reply into structured orders and press messages.
//! Extraction is layered and tolerant: locate sections, scrub each line
//! of list markers and markdown, then run the per-line grammars. Parse
//! failures are collected per reply and mirrored into the global failure
//! log for telemetry; they never abort the reply.

pub mod failure_log;
pub mod normalize;
pub mod orders;
pub mod press;

use tracing::debug;

use crate::board::adjacency::reachable;
use crate::board::order::{BuildOrder, Order, RetreatOrder, UnitRef};
use crate::board::province::Power;
use crate::board::unit::UnitKind;
use crate::game::state::GameState;

pub use failure_log::{recent_failures, record_failure, reset_failure_log};
pub use normalize::normalize_province;
pub use orders::{parse_build_line, parse_order_line, parse_retreat_line, LineError};
pub use press::{
    parse_send_line, Conditional, DiplomaticMessage, NegotiationStage, PressError, Recipient,
};

/// Everything extracted from one agent reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReply {
    pub orders: Vec<Order>,
    pub retreat_orders: Vec<RetreatOrder>,
    pub build_orders: Vec<BuildOrder>,
    pub messages: Vec<DiplomaticMessage>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Orders,
    Retreats,
    Builds,
    Diplomacy,
    /// REASONING / ANALYSIS prose; contents are skipped.
    Ignored,
}

/// Parses a full reply: section extraction, then per-line grammars.
pub fn parse_reply(text: &str) -> ParsedReply {
    let mut reply = ParsedReply::default();
    let mut current: Option<Section> = None;
    let mut saw_orders_header = false;

    for raw in text.lines() {
        let trimmed = raw.trim();
        if trimmed.starts_with("```") {
            continue;
        }
        if let Some(section) = section_header(trimmed) {
            saw_orders_header |= section == Section::Orders;
            current = Some(section);
            continue;
        }
        let Some(section) = current else { continue };
        take_line(&mut reply, section, raw);
    }

    // No ORDERS header anywhere: scan the whole text for order-shaped
    // lines and SENDs.
    if !saw_orders_header && reply.orders.is_empty() {
        debug!("no ORDERS header; falling back to whole-text scan");
        for raw in text.lines() {
            let line = scrub_line(raw);
            if line.is_empty() {
                continue;
            }
            if line.to_ascii_uppercase().starts_with("SEND") {
                take_line(&mut reply, Section::Diplomacy, raw);
            } else if orders::looks_like_order(&line) {
                take_line(&mut reply, Section::Orders, raw);
            }
        }
    }

    reply
}

fn take_line(reply: &mut ParsedReply, section: Section, raw: &str) {
    let line = scrub_line(raw);
    if line.is_empty() {
        return;
    }

    match section {
        Section::Ignored => {}
        Section::Orders => {
            // Agents sometimes put SENDs in the order block; accept them.
            if line.to_ascii_uppercase().starts_with("SEND") {
                take_line(reply, Section::Diplomacy, raw);
                return;
            }
            if line.to_ascii_uppercase().starts_with("BUILD")
                || line.to_ascii_uppercase().starts_with("DISBAND")
            {
                take_line(reply, Section::Builds, raw);
                return;
            }
            match orders::parse_order_line(&line) {
                Ok(order) => reply.orders.push(order),
                Err(e) => fail(reply, &line, &e.to_string()),
            }
        }
        Section::Retreats => match orders::parse_retreat_line(&line) {
            Ok(order) => reply.retreat_orders.push(order),
            Err(first_err) => match orders::parse_build_line(&line) {
                // `DISBAND A PAR` written build-style during retreats.
                Ok(b) if b.action == crate::board::order::BuildAction::Disband => {
                    reply.retreat_orders.push(RetreatOrder::disband(UnitRef {
                        kind: b.unit_kind,
                        province: b.province,
                    }));
                }
                _ => fail(reply, &line, &first_err.to_string()),
            },
        },
        Section::Builds => {
            let upper = line.to_ascii_uppercase();
            if matches!(upper.as_str(), "WAIVE" | "NONE" | "NO BUILDS" | "PASS") {
                return;
            }
            match orders::parse_build_line(&line) {
                Ok(order) => reply.build_orders.push(order),
                Err(e) => fail(reply, &line, &e.to_string()),
            }
        }
        Section::Diplomacy => match press::parse_send_line(&line) {
            Ok(msg) => reply.messages.push(msg),
            // Non-SEND prose inside the diplomacy block is commentary.
            Err(PressError::NotSend(_)) => {}
            Err(e) => fail(reply, &line, &e.to_string()),
        },
    }
}

fn fail(reply: &mut ParsedReply, line: &str, error: &str) {
    record_failure(line);
    reply.errors.push(format!("{}: {}", line, error));
}

/// Recognizes a section header line, tolerating markdown headings, bold
/// markers, and fenced-block remnants.
fn section_header(line: &str) -> Option<Section> {
    let cleaned: String = line
        .trim()
        .trim_start_matches(['#', '>', ' '])
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`'))
        .collect();
    let cleaned = cleaned.trim().trim_end_matches(':').trim().to_ascii_uppercase();
    match cleaned.as_str() {
        "ORDERS" | "MY ORDERS" | "FINAL ORDERS" => Some(Section::Orders),
        "RETREATS" | "RETREAT ORDERS" => Some(Section::Retreats),
        "BUILDS" | "BUILD ORDERS" | "ADJUSTMENTS" => Some(Section::Builds),
        "DIPLOMACY" | "MESSAGES" | "PRESS" => Some(Section::Diplomacy),
        "REASONING" | "ANALYSIS" | "NOTES" | "STRATEGY" => Some(Section::Ignored),
        _ => None,
    }
}

/// Normalizes one content line: bullets, numbering, markdown emphasis,
/// unicode arrows, comments, and trailing commentary all go.
fn scrub_line(raw: &str) -> String {
    let mut line = raw.trim().to_string();

    for arrow in ["→", "⇒", "⟶", "=>"] {
        line = line.replace(arrow, "->");
    }

    // Leading bullets.
    loop {
        let stripped = line
            .trim_start()
            .trim_start_matches(['-', '*', '•', '+'])
            .trim_start();
        if stripped.len() == line.trim_start().len() {
            break;
        }
        line = stripped.to_string();
    }

    // Numbered prefix: `1.`, `2)`, `3:`.
    let bytes: Vec<char> = line.chars().collect();
    let digits = bytes.iter().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 && digits < bytes.len() && matches!(bytes[digits], '.' | ')' | ':') {
        line = bytes[digits + 1..].iter().collect::<String>().trim_start().to_string();
    }

    // Markdown emphasis.
    line = line.chars().filter(|c| !matches!(c, '*' | '`' | '_')).collect();

    // Comment markers.
    for marker in ["//", "#"] {
        if let Some(pos) = line.find(marker) {
            line.truncate(pos);
        }
    }

    // Trailing parenthetical commentary; coasts like `(NC)` stay.
    let trimmed = line.trim_end();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.rfind('(') {
            let inner = &trimmed[open + 1..trimmed.len() - 1];
            if crate::board::province::Coast::parse(inner).is_none()
                && !inner.eq_ignore_ascii_case("via convoy")
            {
                line = trimmed[..open].trim_end().to_string();
            }
        }
    }

    line.trim().to_string()
}

/// Post-parse validation against the live game state.
///
/// Drops orders for units the power does not have, moves to unreachable
/// destinations, and convoys issued by armies; every remaining unit of
/// the power gets a default hold. Returned errors go to the per-phase
/// error list.
pub fn validate_movement_orders(
    power: Power,
    parsed: &[Order],
    state: &GameState,
) -> (Vec<Order>, Vec<String>) {
    let mut valid: Vec<Order> = Vec::new();
    let mut errors = Vec::new();
    let mut ordered: Vec<crate::board::Province> = Vec::new();

    for order in parsed {
        let at = order.unit_province();
        let unit = match state.unit_at(at) {
            Some(u) if u.owner == power => *u,
            Some(_) => {
                errors.push(format!("{}: unit at {} is not yours", order, at));
                continue;
            }
            None => {
                errors.push(format!("{}: no unit at {}", order, at));
                continue;
            }
        };

        match order {
            Order::Move { dest, .. } => {
                let direct = reachable(unit.location, unit.coast, *dest, None, unit.kind);
                // A coastal-to-coastal army move may yet be convoyed; the
                // adjudicator settles whether a chain actually exists.
                let convoyable = unit.kind == UnitKind::Army
                    && unit.location.is_coastal()
                    && dest.is_coastal();
                if !direct && !convoyable {
                    errors.push(format!("{}: {} is unreachable from {}", order, dest, at));
                    continue;
                }
            }
            Order::Convoy { .. } => {
                if unit.kind != UnitKind::Fleet {
                    errors.push(format!("{}: armies cannot convoy", order));
                    continue;
                }
            }
            _ => {}
        }

        // Re-anchor the written unit kind to the actual unit.
        valid.push(rewrite_kind(*order, unit.kind));
        ordered.push(at);
    }

    // Unordered units hold.
    for unit in state.units_of(power) {
        if !ordered.contains(&unit.location) {
            valid.push(Order::Hold { unit: UnitRef::new(unit.kind, unit.location) });
        }
    }

    (valid, errors)
}

fn rewrite_kind(order: Order, kind: UnitKind) -> Order {
    match order {
        Order::Hold { unit } => Order::Hold { unit: UnitRef::new(kind, unit.province) },
        Order::Move { unit, dest, dest_coast, via_convoy } => Order::Move {
            unit: UnitRef::new(kind, unit.province),
            dest,
            dest_coast,
            via_convoy,
        },
        Order::Support { unit, supported, dest } => Order::Support {
            unit: UnitRef::new(kind, unit.province),
            supported,
            dest,
        },
        Order::Convoy { fleet, army, dest } => Order::Convoy {
            fleet: UnitRef::new(kind, fleet.province),
            army,
            dest,
        },
    }
}
