//! One peer of a game.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use super::{decode, ChangeListener, CodecError, PeerMessage, SyncState, Transport};
use crate::gameplay::{ChangeSet, EngineError, Gameplay};
use crate::moves::Move;

/// A session call failed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// What a session did with an incoming message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Received {
    /// The move was integrated (or was already known). Carries every slot
    /// that changed, including those from parked moves that became ready.
    Integrated(ChangeSet),
    /// The move targets a turn this peer has not reached yet. It is held
    /// back and integrated once the log gets there.
    Parked,
    /// The log was replaced by a sync.
    Replaced(ChangeSet),
    /// A sync was broadcast in answer to a request.
    SyncSent,
}

/// One peer: a [`Gameplay`] wired to a [`Transport`] and a [`ChangeListener`].
///
/// Local moves get the current turn's sequence and a fresh origin counter.
/// The counter follows Lamport's rule: it jumps past every counter seen on
/// incoming moves, so a later local move never takes precedence over a
/// remote move it has already seen.
///
/// Moves for turns the log has not reached are parked, up to one retention
/// window past the current turn. Parked moves that can no longer be
/// integrated are handed back through [`take_dropped`](Self::take_dropped);
/// a host seeing any should ask for a sync.
#[derive(Debug)]
pub struct Session<T: Transport, L: ChangeListener> {
    gameplay: Gameplay,
    transport: T,
    listener: L,

    /// Highest origin counter issued or observed.
    clock: u64,

    /// Moves for turns past the current one, by turn sequence.
    backlog: BTreeMap<u64, Vec<Move>>,

    /// Parked moves given up on since the last `take_dropped`.
    dropped: Vec<Move>,
}

impl<T: Transport, L: ChangeListener> Session<T, L> {
    pub fn new(gameplay: Gameplay, transport: T, listener: L) -> Self {
        Self {
            gameplay,
            transport,
            listener,
            clock: 0,
            backlog: BTreeMap::new(),
            dropped: Vec::new(),
        }
    }

    #[must_use]
    pub fn gameplay(&self) -> &Gameplay {
        &self.gameplay
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    #[must_use]
    pub fn listener(&self) -> &L {
        &self.listener
    }

    #[must_use]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Number of moves waiting for their turn.
    #[must_use]
    pub fn backlog_len(&self) -> usize {
        self.backlog.values().map(Vec::len).sum()
    }

    /// Hand over the parked moves that were dropped: their turn fell out
    /// of the window, or they failed to integrate once it arrived.
    pub fn take_dropped(&mut self) -> Vec<Move> {
        std::mem::take(&mut self.dropped)
    }

    /// Play a local move.
    ///
    /// `draft`'s turn sequence and origin are overwritten. The stamped move
    /// is integrated, then broadcast; it is returned so the caller can later
    /// ask [`is_discarded`](Self::is_discarded) about it.
    #[instrument(skip_all, fields(clock = self.clock))]
    pub fn propose(&mut self, draft: Move) -> Result<Move, EngineError> {
        self.clock += 1;
        let mv = draft.stamped(self.gameplay.last_sequence(), self.clock);

        let mut changes = self.gameplay.integrate_move(mv.clone())?;
        debug!(%mv, "Broadcasting local move");
        self.transport.broadcast(&PeerMessage::Move(mv.clone()));

        changes.merge(self.drain_backlog());
        self.notify(&changes);
        Ok(mv)
    }

    /// Handle a message from another peer.
    #[instrument(skip_all)]
    pub fn receive(&mut self, message: PeerMessage) -> Result<Received, EngineError> {
        match message {
            PeerMessage::Move(mv) => self.receive_move(mv),
            PeerMessage::Sync(state) => {
                info!(turns = state.turns.len(), "Applying sync from peer");
                let mut changes = self.gameplay.new_game(state.turns)?;
                changes.merge(self.drain_backlog());
                self.notify(&changes);
                Ok(Received::Replaced(changes))
            }
            PeerMessage::RequestSync => {
                debug!("Answering sync request");
                self.transport.broadcast(&PeerMessage::Sync(self.sync_state()));
                Ok(Received::SyncSent)
            }
        }
    }

    /// Decode a frame from the transport and handle it.
    pub fn receive_bytes(&mut self, bytes: &[u8]) -> Result<Received, SessionError> {
        let message = decode(bytes)?;
        Ok(self.receive(message)?)
    }

    /// The full log, for a peer that joins late.
    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        SyncState {
            turns: self.gameplay.turns().cloned().collect(),
        }
    }

    /// Check whether `mv` lost a conflict or went stale in its turn.
    ///
    /// False once the turn has been trimmed.
    #[must_use]
    pub fn is_discarded(&self, mv: &Move) -> bool {
        self.gameplay
            .turn(mv.turn_sequence)
            .is_some_and(|turn| turn.invalidated().contains(mv))
    }

    fn receive_move(&mut self, mv: Move) -> Result<Received, EngineError> {
        self.clock = self.clock.max(mv.origin);

        if mv.turn_sequence > self.gameplay.last_sequence() {
            mv.validate()?;
            if mv.turn_sequence > self.park_limit() {
                let err = EngineError::UnknownTurn {
                    sequence: mv.turn_sequence,
                    first: self.gameplay.first_sequence(),
                    last: self.gameplay.last_sequence(),
                };
                error!(error = %err, limit = self.park_limit(), "Refused to park move beyond the window");
                return Err(err);
            }
            debug!(sequence = mv.turn_sequence, origin = mv.origin, "Parking move for a future turn");
            self.backlog.entry(mv.turn_sequence).or_default().push(mv);
            return Ok(Received::Parked);
        }

        let mut changes = self.gameplay.integrate_move(mv)?;
        changes.merge(self.drain_backlog());
        self.notify(&changes);
        Ok(Received::Integrated(changes))
    }

    /// Highest turn sequence a move may be parked for.
    fn park_limit(&self) -> u64 {
        let window = u64::try_from(self.gameplay.config().retention).unwrap_or(u64::MAX);
        self.gameplay.last_sequence().saturating_add(window)
    }

    /// Drop parked moves whose turn was trimmed or lies beyond the window.
    /// A sync can move the log either way.
    fn prune_backlog(&mut self) {
        let first = self.gameplay.first_sequence();
        let limit = self.park_limit();

        let stale: Vec<u64> = self
            .backlog
            .keys()
            .copied()
            .filter(|&sequence| sequence < first || sequence > limit)
            .collect();
        for sequence in stale {
            let moves = self.backlog.remove(&sequence).unwrap_or_default();
            warn!(sequence, first, limit, count = moves.len(), "Dropped parked moves outside the window");
            self.dropped.extend(moves);
        }
    }

    /// Integrate parked moves whose turn now exists. Integrating one batch
    /// can advance the log far enough for the next.
    fn drain_backlog(&mut self) -> ChangeSet {
        self.prune_backlog();
        let mut changes = ChangeSet::new();

        while let Some(sequence) = self.backlog.keys().next().copied() {
            if sequence > self.gameplay.last_sequence() {
                break;
            }
            let moves = self.backlog.remove(&sequence).unwrap_or_default();
            for mv in moves {
                match self.gameplay.integrate_move(mv.clone()) {
                    Ok(more) => changes.merge(more),
                    Err(e) => {
                        warn!(error = %e, %mv, "Dropped parked move");
                        self.dropped.push(mv);
                    }
                }
            }
        }

        changes
    }

    fn notify(&mut self, changes: &ChangeSet) {
        if !changes.is_empty() {
            self.listener.slots_changed(changes);
        }
    }
}
