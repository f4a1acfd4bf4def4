//! Province-name normalization with fuzzy matching.
//!
//! Resolves a free-text province reference to a province id in three
//! steps: exact 3-letter id match, alias lookup (full names and common
//! variants), and finally bounded edit distance against the full-name
//! table. Everything is case-insensitive.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::board::province::{Province, ALL_PROVINCES};

/// Extra names beyond the canonical full names in the province table.
static EXTRA_ALIASES: &[(&str, Province)] = &[
    ("marseille", Province::Mar),
    ("channel", Province::Eng),
    ("the channel", Province::Eng),
    ("english channel", Province::Eng),
    ("mid atlantic", Province::Mao),
    ("mid-atlantic", Province::Mao),
    ("mid atlantic ocean", Province::Mao),
    ("atlantic", Province::Mao),
    ("gulf of lyons", Province::Gol),
    ("lyon", Province::Gol),
    ("st petersburg", Province::Stp),
    ("saint petersburg", Province::Stp),
    ("petersburg", Province::Stp),
    ("st pete", Province::Stp),
    ("netherlands", Province::Hol),
    ("the netherlands", Province::Hol),
    ("athens", Province::Gre),
    ("romania", Province::Rum),
    ("bothnia", Province::Bot),
    ("heligoland", Province::Hel),
    ("helgoland bight", Province::Hel),
    ("skagerrack", Province::Ska),
    ("tyrol", Province::Tyr),
    ("tyrrhenian", Province::Tys),
    ("norwegian", Province::Nrg),
    ("liverpool", Province::Lvp),
    ("livonia", Province::Lvn),
    ("wales", Province::Wal),
    ("yorkshire", Province::Yor),
    ("north africa", Province::Naf),
    ("tunis", Province::Tun),
];

/// Lowercased lookup table: canonical ids, full names, and aliases.
static ALIAS_TABLE: LazyLock<HashMap<String, Province>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for p in ALL_PROVINCES {
        table.insert(p.id().to_ascii_lowercase(), p);
        table.insert(p.name().to_ascii_lowercase(), p);
        // "St. Petersburg" with and without the period.
        let depunctuated: String = p
            .name()
            .chars()
            .filter(|c| *c != '.')
            .collect::<String>()
            .to_ascii_lowercase();
        table.entry(depunctuated).or_insert(p);
    }
    for (alias, p) in EXTRA_ALIASES {
        table.insert((*alias).to_string(), *p);
    }
    table
});

/// Resolves a free-text province reference, or `None` when nothing
/// matches ("unknown" in the wire format).
pub fn normalize_province(input: &str) -> Option<Province> {
    let trimmed = input.trim().trim_matches(|c: char| !c.is_ascii_alphanumeric());
    if trimmed.is_empty() {
        return None;
    }

    // Exact id match first.
    if let Some(p) = Province::from_id(&trimmed.to_ascii_uppercase()) {
        return Some(p);
    }

    let lowered = squeeze(trimmed);

    if let Some(p) = ALIAS_TABLE.get(&lowered) {
        return Some(*p);
    }

    // Fuzzy only for inputs long enough to carry signal.
    if lowered.len() < 4 {
        return None;
    }
    let budget = if lowered.len() <= 10 { 2 } else { 3 };

    let mut best: Option<(usize, Province)> = None;
    for (name, p) in ALIAS_TABLE.iter() {
        let d = edit_distance(&lowered, name, budget);
        if let Some(d) = d {
            best = match best {
                Some((bd, bp)) if (bd, bp) <= (d, *p) => Some((bd, bp)),
                _ => Some((d, *p)),
            };
        }
    }
    best.map(|(_, p)| p)
}

/// Lowercases and collapses runs of whitespace to single spaces.
fn squeeze(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Levenshtein distance with an upper bound; returns `None` when the
/// distance exceeds `budget`.
fn edit_distance(a: &str, b: &str, budget: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > budget {
        return None;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        let mut row_min = curr[0];
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            row_min = row_min.min(curr[j]);
        }
        if row_min > budget {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let d = prev[b.len()];
    (d <= budget).then_some(d)
}
