//! The press bus: ordered message delivery between agents in one game.
//!
//! Channels are named: one private channel per unordered pair of powers,
//! one broadcast channel per power, and an optional global channel.
//! Within a channel delivery order equals send order, each message is
//! delivered at most once per recipient, and retention is bounded per
//! channel. A drain closes the bus and hands back everything undelivered;
//! phase transitions use this to stop late press.

use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::board::province::Power;
use crate::parser::press::{Conditional, NegotiationStage, Recipient};

/// Default retained messages per channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 20;

/// A channel name on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelName {
    /// Private channel for an unordered pair; constructor normalizes order.
    Private(Power, Power),
    /// One power to all others.
    Broadcast(Power),
    /// Everyone to everyone, when enabled.
    Global,
}

impl ChannelName {
    /// The private channel between two powers, normalized so argument
    /// order does not matter.
    pub fn private(a: Power, b: Power) -> ChannelName {
        if a <= b {
            ChannelName::Private(a, b)
        } else {
            ChannelName::Private(b, a)
        }
    }
}

/// A message as carried by the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressMessage {
    pub from: Power,
    pub to: Recipient,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<NegotiationStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
    /// Milliseconds since the Unix epoch at send time.
    pub sent_at_ms: u64,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PressBusError {
    #[error("bus is draining; no new messages accepted")]
    Closed,

    #[error("a power cannot message itself")]
    SelfMessage,
}

#[derive(Debug, Default)]
struct Channel {
    /// Retained messages with their sequence numbers, oldest first.
    messages: VecDeque<(u64, PressMessage)>,
    /// Next sequence number to assign.
    next_seq: u64,
    /// Highest sequence delivered per recipient.
    cursors: HashMap<Power, u64>,
}

impl Channel {
    fn push(&mut self, message: PressMessage, capacity: usize) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.messages.len() == capacity {
            if let Some((evicted, _)) = self.messages.pop_front() {
                warn!(seq = evicted, "press channel full; dropping oldest message");
            }
        }
        self.messages.push_back((seq, message));
    }

    /// Messages not yet delivered to `power`, excluding its own sends.
    /// Advances the cursor past everything retained.
    fn deliver(&mut self, power: Power) -> Vec<PressMessage> {
        let cursor = self.cursors.get(&power).copied();
        let mut out = Vec::new();
        let mut last = cursor;
        for (seq, msg) in &self.messages {
            if cursor.map_or(false, |c| *seq <= c) {
                continue;
            }
            last = Some(*seq);
            if msg.from != power {
                out.push(msg.clone());
            }
        }
        if let Some(last) = last {
            self.cursors.insert(power, last);
        }
        out
    }

    /// Messages some recipient has not seen yet.
    fn undelivered(&self, recipients: &[Power]) -> Vec<PressMessage> {
        let mut out = Vec::new();
        for (seq, msg) in &self.messages {
            let pending = recipients.iter().any(|r| {
                *r != msg.from && self.cursors.get(r).map_or(true, |c| *seq > *c)
            });
            if pending {
                out.push(msg.clone());
            }
        }
        out
    }
}

/// The bus itself. One per game; the runtime serializes access.
#[derive(Debug)]
pub struct PressBus {
    capacity: usize,
    global_enabled: bool,
    closed: bool,
    channels: HashMap<ChannelName, Channel>,
}

impl Default for PressBus {
    fn default() -> Self {
        PressBus::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl PressBus {
    pub fn new(capacity: usize) -> PressBus {
        PressBus {
            capacity: capacity.max(1),
            global_enabled: false,
            closed: false,
            channels: HashMap::new(),
        }
    }

    /// Enables the optional global channel; `ALL` messages go there
    /// instead of the sender's broadcast channel.
    pub fn with_global_channel(mut self) -> PressBus {
        self.global_enabled = true;
        self
    }

    /// Routes one message. Private messages go to the pair channel,
    /// `ALL` to the sender's broadcast channel (or the global channel).
    pub fn send(
        &mut self,
        from: Power,
        to: Recipient,
        content: &str,
        stage: Option<NegotiationStage>,
        conditional: Option<Conditional>,
    ) -> Result<(), PressBusError> {
        if self.closed {
            return Err(PressBusError::Closed);
        }
        let channel = match to {
            Recipient::Power(target) if target == from => return Err(PressBusError::SelfMessage),
            Recipient::Power(target) => ChannelName::private(from, target),
            Recipient::All if self.global_enabled => ChannelName::Global,
            Recipient::All => ChannelName::Broadcast(from),
        };
        let message = PressMessage {
            from,
            to,
            content: content.to_string(),
            stage,
            conditional,
            sent_at_ms: now_ms(),
        };
        let capacity = self.capacity;
        self.channels.entry(channel).or_default().push(message, capacity);
        Ok(())
    }

    /// Everything addressed to `power` that it has not seen yet, in
    /// channel FIFO order.
    pub fn receive(&mut self, power: Power) -> Vec<PressMessage> {
        let mut out = Vec::new();
        let names: Vec<ChannelName> = self.channels.keys().copied().collect();
        let mut sorted = names;
        sorted.sort_by_key(|n| match n {
            ChannelName::Private(a, b) => (0, *a as u8, *b as u8),
            ChannelName::Broadcast(p) => (1, *p as u8, 0),
            ChannelName::Global => (2, 0, 0),
        });
        for name in sorted {
            let involves = match name {
                ChannelName::Private(a, b) => a == power || b == power,
                ChannelName::Broadcast(sender) => sender != power,
                ChannelName::Global => true,
            };
            if !involves {
                continue;
            }
            if let Some(channel) = self.channels.get_mut(&name) {
                out.extend(channel.deliver(power));
            }
        }
        out
    }

    /// Retained history of the private channel between two powers,
    /// oldest first. Does not affect delivery cursors.
    pub fn history(&self, a: Power, b: Power) -> Vec<PressMessage> {
        self.channels
            .get(&ChannelName::private(a, b))
            .map(|c| c.messages.iter().map(|(_, m)| m.clone()).collect())
            .unwrap_or_default()
    }

    /// Closes the bus and returns every message some recipient never
    /// received. Further sends fail until `reopen`.
    pub fn drain(&mut self) -> Vec<PressMessage> {
        self.closed = true;
        let mut out = Vec::new();
        let mut names: Vec<ChannelName> = self.channels.keys().copied().collect();
        names.sort_by_key(|n| match n {
            ChannelName::Private(a, b) => (0, *a as u8, *b as u8),
            ChannelName::Broadcast(p) => (1, *p as u8, 0),
            ChannelName::Global => (2, 0, 0),
        });
        for name in names {
            let recipients: Vec<Power> = match name {
                ChannelName::Private(a, b) => vec![a, b],
                ChannelName::Broadcast(sender) => crate::board::ALL_POWERS
                    .iter()
                    .copied()
                    .filter(|p| *p != sender)
                    .collect(),
                ChannelName::Global => crate::board::ALL_POWERS.to_vec(),
            };
            if let Some(channel) = self.channels.get(&name) {
                out.extend(channel.undelivered(&recipients));
            }
        }
        out
    }

    /// Reopens a drained bus for the next press period. Retained history
    /// and cursors survive.
    pub fn reopen(&mut self) {
        self.closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send_text(bus: &mut PressBus, from: Power, to: Power, text: &str) {
        bus.send(from, Recipient::Power(to), text, None, None).unwrap();
    }

    #[test]
    fn private_channel_name_is_order_insensitive() {
        assert_eq!(
            ChannelName::private(Power::France, Power::England),
            ChannelName::private(Power::England, Power::France)
        );
    }

    #[test]
    fn fifo_within_channel() {
        let mut bus = PressBus::default();
        send_text(&mut bus, Power::France, Power::Germany, "first");
        send_text(&mut bus, Power::France, Power::Germany, "second");
        send_text(&mut bus, Power::France, Power::Germany, "third");
        let got = bus.receive(Power::Germany);
        let texts: Vec<&str> = got.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn at_most_once_delivery() {
        let mut bus = PressBus::default();
        send_text(&mut bus, Power::France, Power::Germany, "hello");
        assert_eq!(bus.receive(Power::Germany).len(), 1);
        assert!(bus.receive(Power::Germany).is_empty());
    }

    #[test]
    fn sender_does_not_receive_own_message() {
        let mut bus = PressBus::default();
        send_text(&mut bus, Power::France, Power::Germany, "hello");
        assert!(bus.receive(Power::France).is_empty());
    }

    #[test]
    fn uninvolved_power_sees_nothing() {
        let mut bus = PressBus::default();
        send_text(&mut bus, Power::France, Power::Germany, "secret");
        assert!(bus.receive(Power::Italy).is_empty());
    }

    #[test]
    fn broadcast_reaches_all_others() {
        let mut bus = PressBus::default();
        bus.send(Power::France, Recipient::All, "to everyone", None, None).unwrap();
        assert!(bus.receive(Power::France).is_empty());
        for power in [Power::England, Power::Germany, Power::Turkey] {
            let got = bus.receive(power);
            assert_eq!(got.len(), 1, "{:?}", power);
            assert_eq!(got[0].content, "to everyone");
        }
    }

    #[test]
    fn global_channel_when_enabled() {
        let mut bus = PressBus::new(DEFAULT_CHANNEL_CAPACITY).with_global_channel();
        bus.send(Power::France, Recipient::All, "hello world", None, None).unwrap();
        bus.send(Power::Germany, Recipient::All, "likewise", None, None).unwrap();
        let got = bus.receive(Power::England);
        assert_eq!(got.len(), 2);
        // France sees Germany's message but not its own.
        let got = bus.receive(Power::France);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].from, Power::Germany);
    }

    #[test]
    fn self_message_rejected() {
        let mut bus = PressBus::default();
        assert_eq!(
            bus.send(Power::France, Recipient::Power(Power::France), "hi", None, None),
            Err(PressBusError::SelfMessage)
        );
    }

    #[test]
    fn retention_is_bounded() {
        let mut bus = PressBus::new(3);
        for i in 0..10 {
            send_text(&mut bus, Power::France, Power::Germany, &format!("m{}", i));
        }
        let history = bus.history(Power::France, Power::Germany);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "m7");
        assert_eq!(history[2].content, "m9");
    }

    #[test]
    fn drain_returns_undelivered_and_closes() {
        let mut bus = PressBus::default();
        send_text(&mut bus, Power::France, Power::Germany, "seen");
        bus.receive(Power::Germany);
        send_text(&mut bus, Power::France, Power::Germany, "unseen");

        let undelivered = bus.drain();
        assert_eq!(undelivered.len(), 1);
        assert_eq!(undelivered[0].content, "unseen");

        assert_eq!(
            bus.send(Power::France, Recipient::Power(Power::Germany), "late", None, None),
            Err(PressBusError::Closed)
        );

        bus.reopen();
        assert!(bus
            .send(Power::France, Recipient::Power(Power::Germany), "next phase", None, None)
            .is_ok());
    }

    #[test]
    fn metadata_travels_with_message() {
        let mut bus = PressBus::default();
        bus.send(
            Power::France,
            Recipient::Power(Power::England),
            "IF you leave the Channel, THEN I support you into Belgium",
            Some(NegotiationStage::Opening),
            Some(Conditional {
                condition: "you leave the Channel".to_string(),
                commitment: "I support you into Belgium".to_string(),
            }),
        )
        .unwrap();
        let got = bus.receive(Power::England);
        assert_eq!(got[0].stage, Some(NegotiationStage::Opening));
        assert!(got[0].conditional.is_some());
    }

    #[test]
    fn history_does_not_consume() {
        let mut bus = PressBus::default();
        send_text(&mut bus, Power::France, Power::Germany, "hello");
        assert_eq!(bus.history(Power::France, Power::Germany).len(), 1);
        assert_eq!(bus.receive(Power::Germany).len(), 1);
        assert_eq!(bus.history(Power::France, Power::Germany).len(), 1);
    }
}
