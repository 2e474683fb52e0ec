//! The room registry: who is present and what was said recently.

use std::collections::{HashMap, VecDeque};
use std::sync::Weak;

use parley_protocol::Message;
use parley_transport::ConnectionId;

use crate::{Participant, RoomConfig};

/// Membership set plus bounded message history.
///
/// `Room` is plain data with synchronous methods. It does no I/O and no
/// locking; the room actor owns one and applies commands to it one at a
/// time.
pub struct Room {
    config: RoomConfig,
    /// Non-owning handles, keyed by connection id.
    participants: HashMap<ConnectionId, Weak<dyn Participant>>,
    /// Oldest message at the front. Never longer than `history_limit`.
    history: VecDeque<Message>,
}

impl Room {
    /// Creates an empty room.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_limit),
            participants: HashMap::new(),
            config,
        }
    }

    /// Adds a participant and replays the history to it alone, oldest
    /// message first.
    ///
    /// Joining twice is a no-op: the participant keeps its membership and
    /// does not see the history a second time. A participant that has
    /// already been dropped is ignored. Returns `true` if the participant
    /// was added.
    pub fn join(&mut self, participant: Weak<dyn Participant>) -> bool {
        let Some(member) = participant.upgrade() else {
            tracing::debug!("participant dropped before joining, ignoring");
            return false;
        };
        let id = member.id();

        let already_present = self
            .participants
            .get(&id)
            .is_some_and(|existing| existing.strong_count() > 0);
        if already_present {
            tracing::debug!(%id, "participant already in room");
            return false;
        }

        self.participants.insert(id, participant);
        for msg in &self.history {
            member.deliver(msg);
        }

        tracing::info!(
            %id,
            participants = self.participants.len(),
            replayed = self.history.len(),
            "participant joined"
        );
        true
    }

    /// Removes a participant. Returns `false` if it was not a member.
    pub fn leave(&mut self, id: ConnectionId) -> bool {
        if self.participants.remove(&id).is_none() {
            return false;
        }
        tracing::info!(
            %id,
            participants = self.participants.len(),
            "participant left"
        );
        true
    }

    /// Appends `msg` to the history and broadcasts it to every member,
    /// the sender included.
    ///
    /// Members whose handle no longer upgrades are pruned.
    pub fn deliver(&mut self, msg: Message) {
        let mut dead = Vec::new();
        for (id, participant) in &self.participants {
            match participant.upgrade() {
                Some(member) => member.deliver(&msg),
                None => dead.push(*id),
            }
        }
        self.prune(dead);

        self.history.push_back(msg);
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }
    }

    /// Number of members, including any not yet pruned.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Number of messages in history.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Maximum number of messages kept in history.
    pub fn history_limit(&self) -> usize {
        self.config.history_limit
    }

    /// The history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Message> {
        self.history.iter()
    }

    fn prune(&mut self, dead: Vec<ConnectionId>) {
        for id in dead {
            self.participants.remove(&id);
            tracing::debug!(%id, "pruned dropped participant");
        }
    }
}
