//! In-memory transport.
//!
//! Collects broadcasts instead of sending them. Hosts that pump messages
//! themselves (tests, local hot-seat play, a UI thread handing frames to a
//! socket task) drain it after each call.

use std::collections::VecDeque;

use super::{PeerMessage, Transport};

/// A transport that queues every broadcast until drained.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    sent: VecDeque<PeerMessage>,
}

impl Outbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.sent.len()
    }

    /// Take every queued message, oldest first.
    pub fn drain(&mut self) -> Vec<PeerMessage> {
        self.sent.drain(..).collect()
    }
}

impl Transport for Outbox {
    fn broadcast(&mut self, message: &PeerMessage) {
        self.sent.push_back(message.clone());
    }
}
