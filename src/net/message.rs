//! Messages exchanged between peers.

use serde::{Deserialize, Serialize};

use crate::moves::Move;
use crate::turns::Turn;

/// Everything a peer sends to another peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerMessage {
    /// A move, tagged with the turn it targets and its origin counter.
    Move(Move),
    /// The sender's whole turn log, for a peer that joins or fell behind.
    Sync(SyncState),
    /// Ask peers to answer with a `Sync`.
    RequestSync,
}

/// Full-state sync payload: the turn log, oldest first.
///
/// Turns travel as `{playfield, sequence, moves}`; discarded moves are
/// recomputed by the receiver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub turns: Vec<Turn>,
}
