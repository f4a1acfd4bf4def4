//! The runtime coordinator.
//!
//! Owns the phase machine, one session per power, the press bus, and the
//! event stream, and drives a game from opening to victory. A single
//! agent's failure (timeout, provider error, unusable reply) is
//! contained: the phase continues with default behavior for that power.
//!
//! Press rounds inside the diplomacy period are strictly sequential so a
//! message sent by one power is visible to later powers in the same
//! round, regardless of the `parallel-execution` setting. Other phases
//! poll agents in parallel when configured.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{timeout, Instant};
use tracing::{info, warn};

use crate::agent::prompt::PowerView;
use crate::agent::session::{Session, TurnParams};
use crate::board::order::{BuildOrder, Order, RetreatOrder};
use crate::board::province::{Power, ALL_POWERS};
use crate::completion::{now_ms, Completion};
use crate::game::phase::{PhaseMachine, PhaseReport};
use crate::game::state::{GameState, PhaseKind};
use crate::journal::{GameJournal, JournalRecord};
use crate::parser::{self, ParsedReply};
use crate::press::{PressBus, PressMessage};

use super::config::{ConfigError, RuntimeConfig};
use super::events::{EventBus, EventKind, GameEvent};

/// Model id used for seats with no configured model.
pub const DEFAULT_MODEL: &str = "default";

/// Cooperative stop signal; `stop()` takes effect after the in-flight
/// agent turn completes.
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Drives one game.
pub struct Coordinator {
    config: RuntimeConfig,
    machine: PhaseMachine,
    sessions: BTreeMap<Power, Session>,
    bus: PressBus,
    events: EventBus,
    completion: Arc<dyn Completion>,
    stop: Arc<AtomicBool>,
    /// Press collected for each power but not yet shown to it.
    pending_press: BTreeMap<Power, Vec<PressMessage>>,
    journal: Option<GameJournal>,
}

impl Coordinator {
    /// Validates the config and seats all seven powers.
    pub fn new(
        config: RuntimeConfig,
        completion: Arc<dyn Completion>,
    ) -> Result<Coordinator, ConfigError> {
        config.validate()?;

        let mut sessions = BTreeMap::new();
        for power in ALL_POWERS {
            let agent = config.agent(power);
            let model = agent
                .and_then(|a| a.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string());
            let mut session = Session::new(power, model, config.max_conversation_history);
            let personality = agent.and_then(|a| a.personality.as_deref());
            let system = session.build_system_prompt(personality);
            session.initialize(&system);
            sessions.insert(power, session);
        }

        let bus = PressBus::new(config.max_press_messages_per_channel);
        Ok(Coordinator {
            config,
            machine: PhaseMachine::standard(),
            sessions,
            bus,
            events: EventBus::new(),
            completion,
            stop: Arc::new(AtomicBool::new(false)),
            pending_press: BTreeMap::new(),
            journal: None,
        })
    }

    pub fn state(&self) -> &GameState {
        self.machine.state()
    }

    pub fn session(&self, power: Power) -> &Session {
        &self.sessions[&power]
    }

    pub fn subscribe(
        &mut self,
        callback: impl Fn(&GameEvent) + Send + Sync + 'static,
    ) -> u64 {
        self.events.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: u64) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// Attaches a journal; the coordinator writes events and per-phase
    /// snapshots to it as the game runs.
    pub fn attach_journal(&mut self, mut journal: GameJournal) {
        let _ = journal.append(&JournalRecord::GameConfig {
            game_id: self.config.game_id.clone(),
            agents: self.config.agents.len(),
        });
        self.journal = Some(journal);
    }

    /// Runs until victory, stop, or the end of `max_year`.
    pub async fn run(&mut self, max_year: u16) -> GameState {
        info!(game = %self.config.game_id, "game started");
        self.emit(EventKind::GameStarted { powers: ALL_POWERS.to_vec() });
        self.write_snapshot();

        while !self.stopped()
            && !self.machine.state().is_finished()
            && self.machine.state().year <= max_year
        {
            let before_year = self.machine.state().year;
            match self.machine.state().phase {
                PhaseKind::Diplomacy => {
                    self.diplomacy_phase().await;
                    if self.stopped() {
                        break;
                    }
                    self.machine.begin_movement();
                }
                PhaseKind::Movement => self.movement_phase().await,
                PhaseKind::Retreat => self.retreat_phase().await,
                PhaseKind::Build => self.build_phase().await,
            }
            let after_year = self.machine.state().year;
            if after_year > before_year {
                for session in self.sessions.values_mut() {
                    session.memory_mut().roll_up_year(before_year);
                }
            }
        }

        if let Some(outcome) = self.machine.state().outcome {
            self.emit(EventKind::GameEnded { outcome });
        }
        self.write_snapshot();
        self.machine.state().clone()
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn emit(&mut self, kind: EventKind) {
        let event = GameEvent {
            timestamp_ms: now_ms(),
            game_id: self.config.game_id.clone(),
            kind,
        };
        self.events.emit(&event);
        if let Some(journal) = &mut self.journal {
            let _ = journal.append(&JournalRecord::Event { event });
        }
    }

    fn write_snapshot(&mut self) {
        let state = self.machine.state().clone();
        if let Some(journal) = &mut self.journal {
            let _ = journal.snapshot(&state);
        }
    }

    fn emit_phase_started(&mut self) {
        let state = self.machine.state();
        let (year, season, phase) = (state.year, state.season, state.phase);
        self.emit(EventKind::PhaseStarted { year, season, phase });
    }

    fn emit_phase_resolved(&mut self, report: &PhaseReport, errors: usize) {
        let dislodgements = report
            .adjudication
            .as_ref()
            .map(|a| a.dislodgements.len())
            .unwrap_or(0);
        self.emit(EventKind::PhaseResolved {
            year: report.year,
            season: report.season,
            phase: report.phase,
            dislodgements,
            errors,
        });
        self.write_snapshot();
    }

    /// The bounded press period: sequential rounds until the clock runs
    /// out or a full round passes with no message sent.
    async fn diplomacy_phase(&mut self) {
        self.emit_phase_started();
        self.bus.reopen();

        let deadline =
            Instant::now() + Duration::from_secs_f64(self.config.press_period_minutes * 60.0);
        let mut round: u32 = 0;

        'period: loop {
            round += 1;
            let mut sent_this_round = 0usize;

            for power in self.alive_powers() {
                if self.stopped() || Instant::now() >= deadline {
                    break 'period;
                }
                let press = self.collect_press(power);
                self.emit(EventKind::AgentTurnStarted { power });

                let budget = deadline.saturating_duration_since(Instant::now());
                match self.agent_turn(power, press, PhaseKind::Diplomacy, Some(budget)).await {
                    Ok(reply) => {
                        let parsed = parser::parse_reply(&reply);
                        let mut delivered = 0usize;
                        for msg in &parsed.messages {
                            match self.bus.send(
                                power,
                                msg.to,
                                &msg.content,
                                msg.stage,
                                msg.conditional.clone(),
                            ) {
                                Ok(()) => delivered += 1,
                                Err(e) => warn!(%power, error = %e, "press rejected"),
                            }
                        }
                        sent_this_round += delivered;
                        self.emit(EventKind::AgentTurnCompleted {
                            power,
                            orders: 0,
                            messages: delivered,
                        });
                    }
                    Err(cause) => {
                        // Failure default during diplomacy: silence.
                        self.emit(EventKind::AgentTurnFailed { power, cause });
                    }
                }
            }

            self.emit(EventKind::PressRoundCompleted { round, messages: sent_this_round });
            if sent_this_round == 0 || Instant::now() >= deadline || self.stopped() {
                break;
            }
        }

        // Deliver the tail of the conversation into each power's next
        // prompt, then close the bus for the phase transition.
        for power in ALL_POWERS {
            let tail = self.bus.receive(power);
            if !tail.is_empty() {
                self.pending_press.entry(power).or_default().extend(tail);
            }
        }
        let undelivered = self.bus.drain();
        if !undelivered.is_empty() {
            warn!(count = undelivered.len(), "press left undelivered at phase end");
        }
    }

    async fn movement_phase(&mut self) {
        self.emit_phase_started();
        let powers = self.alive_powers();
        let replies = self.poll_powers(&powers, PhaseKind::Movement).await;

        let mut orders_by_power: BTreeMap<Power, Vec<Order>> = BTreeMap::new();
        let mut error_count = 0usize;

        for (power, outcome) in replies {
            let (parsed, failed) = match outcome {
                Ok(reply) => (parser::parse_reply(&reply), false),
                Err(cause) => {
                    self.emit(EventKind::AgentTurnFailed { power, cause });
                    (ParsedReply::default(), true)
                }
            };
            error_count += parsed.errors.len();

            // A failed agent's units all hold.
            let (orders, validation_errors) =
                parser::validate_movement_orders(power, &parsed.orders, self.machine.state());
            error_count += validation_errors.len();
            for error in &validation_errors {
                warn!(%power, %error, "order rejected");
            }

            if !failed {
                self.emit(EventKind::AgentTurnCompleted {
                    power,
                    orders: orders.len(),
                    messages: 0,
                });
            }
            orders_by_power.insert(power, orders);
        }

        let report = self.machine.resolve_movement(&orders_by_power);
        self.record_outcomes(&report);
        self.emit_phase_resolved(&report, error_count);
    }

    async fn retreat_phase(&mut self) {
        self.emit_phase_started();
        let powers: Vec<Power> = {
            let mut list: Vec<Power> = self
                .machine
                .state()
                .pending_retreats
                .iter()
                .map(|p| p.unit.owner)
                .collect();
            list.sort();
            list.dedup();
            list
        };

        let replies = self.poll_powers(&powers, PhaseKind::Retreat).await;
        let mut orders: Vec<(Power, RetreatOrder)> = Vec::new();
        let mut error_count = 0usize;

        for (power, outcome) in replies {
            match outcome {
                Ok(reply) => {
                    let parsed = parser::parse_reply(&reply);
                    error_count += parsed.errors.len();
                    self.emit(EventKind::AgentTurnCompleted {
                        power,
                        orders: parsed.retreat_orders.len(),
                        messages: 0,
                    });
                    for order in parsed.retreat_orders {
                        orders.push((power, order));
                    }
                }
                Err(cause) => {
                    // Unordered dislodged units auto-disband.
                    self.emit(EventKind::AgentTurnFailed { power, cause });
                }
            }
        }

        let report = self.machine.resolve_retreats(&orders);
        self.record_outcomes(&report);
        self.emit_phase_resolved(&report, error_count);
    }

    async fn build_phase(&mut self) {
        self.emit_phase_started();
        let powers: Vec<Power> =
            self.machine.state().pending_builds.keys().copied().collect();

        let replies = self.poll_powers(&powers, PhaseKind::Build).await;
        let mut orders: Vec<(Power, BuildOrder)> = Vec::new();
        let mut error_count = 0usize;

        for (power, outcome) in replies {
            match outcome {
                Ok(reply) => {
                    let parsed = parser::parse_reply(&reply);
                    error_count += parsed.errors.len();
                    self.emit(EventKind::AgentTurnCompleted {
                        power,
                        orders: parsed.build_orders.len(),
                        messages: 0,
                    });
                    for order in parsed.build_orders {
                        orders.push((power, order));
                    }
                }
                Err(cause) => {
                    // Civil disorder covers missing disbands; missing
                    // builds are simply forfeited.
                    self.emit(EventKind::AgentTurnFailed { power, cause });
                }
            }
        }

        let report = self.machine.resolve_builds(&orders);
        self.record_outcomes(&report);
        self.emit_phase_resolved(&report, error_count);
    }

    /// Polls each power once; parallel across powers when configured.
    async fn poll_powers(
        &mut self,
        powers: &[Power],
        phase: PhaseKind,
    ) -> Vec<(Power, Result<String, String>)> {
        if !self.config.parallel_execution {
            let mut out = Vec::new();
            for &power in powers {
                if self.stopped() {
                    break;
                }
                let press = self.collect_press(power);
                self.emit(EventKind::AgentTurnStarted { power });
                let outcome = self.agent_turn(power, press, phase, None).await;
                out.push((power, outcome));
            }
            return out;
        }

        // Parallel: move each session into its own future, then put it
        // back. Events fire before and after the joined batch.
        for &power in powers {
            self.emit(EventKind::AgentTurnStarted { power });
        }

        let state = self.machine.state().clone();
        let timeout_ms = self.config.turn_timeout_ms;
        let completion = Arc::clone(&self.completion);

        let mut futures = Vec::new();
        for &power in powers {
            let mut session = self.sessions.remove(&power).expect("session exists");
            let press = self.collect_press(power);
            let view = PowerView::of(&state, power);
            let completion = Arc::clone(&completion);
            futures.push(async move {
                let outcome =
                    call_with_timeout(&mut session, &*completion, &view, &press, phase, timeout_ms)
                        .await;
                (power, session, outcome)
            });
        }

        let mut out = Vec::new();
        for (power, session, outcome) in join_all(futures).await {
            self.sessions.insert(power, session);
            out.push((power, outcome));
        }
        out.sort_by_key(|(p, _)| *p);
        out
    }

    /// One sequential agent turn with the per-call timeout (and, during
    /// press, the period deadline) applied.
    async fn agent_turn(
        &mut self,
        power: Power,
        press: Vec<PressMessage>,
        phase: PhaseKind,
        budget: Option<Duration>,
    ) -> Result<String, String> {
        let state = self.machine.state().clone();
        let view = PowerView::of(&state, power);
        let mut timeout_ms = self.config.turn_timeout_ms;
        if let Some(budget) = budget {
            timeout_ms = timeout_ms.min(budget.as_millis() as u64);
        }
        let completion = Arc::clone(&self.completion);
        let personality = self
            .config
            .agent(power)
            .and_then(|a| a.personality.clone());

        let session = self.sessions.get_mut(&power).expect("session exists");
        let system = session.build_system_prompt(personality.as_deref());
        session.initialize(&system);
        call_with_timeout(session, &*completion, &view, &press, phase, timeout_ms).await
    }

    /// Undelivered press for one power: the stash from the last
    /// diplomacy phase plus anything new on the bus.
    fn collect_press(&mut self, power: Power) -> Vec<PressMessage> {
        let mut press = self.pending_press.remove(&power).unwrap_or_default();
        if !self.bus.is_closed() {
            press.extend(self.bus.receive(power));
        }
        press
    }

    fn alive_powers(&self) -> Vec<Power> {
        let mut powers = self.machine.state().surviving_powers();
        powers.sort();
        powers
    }

    /// Writes each power's share of a phase report into its diary.
    fn record_outcomes(&mut self, report: &PhaseReport) {
        for power in ALL_POWERS {
            let summary = summarize_for(power, report);
            if summary.is_empty() {
                continue;
            }
            if let Some(session) = self.sessions.get_mut(&power) {
                session.record_outcome(report.year, report.season, report.phase, &summary);
            }
        }
    }
}

async fn call_with_timeout(
    session: &mut Session,
    completion: &dyn Completion,
    view: &PowerView,
    press: &[PressMessage],
    phase: PhaseKind,
    timeout_ms: u64,
) -> Result<String, String> {
    let prompt = session.build_turn_prompt(view, press, phase);
    let call = session.call_model(completion, prompt, TurnParams::default());
    match timeout(Duration::from_millis(timeout_ms.max(1)), call).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("model call timed out after {} ms", timeout_ms)),
    }
}

/// A one-line per-power summary of a resolved phase.
fn summarize_for(power: Power, report: &PhaseReport) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(adjudication) = &report.adjudication {
        let mine: Vec<String> = adjudication
            .outcomes
            .values()
            .filter(|o| o.power == power)
            .map(|o| {
                if o.dislodged {
                    format!("{} dislodged", o.order)
                } else if o.success {
                    format!("{} ok", o.order)
                } else {
                    format!(
                        "{} failed{}",
                        o.order,
                        o.reason.as_deref().map(|r| format!(" ({})", r)).unwrap_or_default()
                    )
                }
            })
            .collect();
        if !mine.is_empty() {
            parts.push(mine.join("; "));
        }
    }

    for outcome in &report.retreat_outcomes {
        if outcome.power == power {
            parts.push(format!(
                "{} {}",
                outcome.order,
                if outcome.success { "ok" } else { "failed" }
            ));
        }
    }

    for outcome in &report.build_outcomes {
        if outcome.power == power {
            parts.push(format!(
                "{} {}",
                outcome.order,
                if outcome.success { "ok" } else { "failed" }
            ));
        }
    }

    parts.join("; ")
}
