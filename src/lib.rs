//! Entente: a multi-agent Diplomacy simulation core.
//!
//! The crate has two halves. The rules engine — the map, the order
//! vocabulary, the adjudicator, and the phase machine — implements the
//! standard 7-power game. The agent runtime — sessions, prompt
//! compression, the press bus, and the coordinator — drives seven
//! model-backed agents through that engine behind one abstract
//! `Completion` service.

pub mod agent;
pub mod board;
pub mod completion;
pub mod game;
pub mod journal;
pub mod judge;
pub mod parser;
pub mod press;
pub mod runtime;
