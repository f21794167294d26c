//! Errors surfaced by the gameplay engine.

use thiserror::Error;

use crate::moves::MoveError;
use crate::playfield::PlayfieldError;

/// Input the engine refused.
///
/// None of these are conflicts: conflicting moves are ordinary input and
/// are absorbed by resolution. These are precondition violations by the
/// caller or by a peer, and the operation that raised one had no effect.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no turn {sequence} in the log (holds {first}..={last})")]
    UnknownTurn { sequence: u64, first: u64, last: u64 },

    #[error("malformed move: {0}")]
    MalformedMove(#[from] MoveError),

    #[error("move for turn {found} listed under turn {expected}")]
    MisplacedMove { expected: u64, found: u64 },

    #[error("turn log is empty")]
    EmptyLog,

    #[error("turn log jumps from {previous} to {next}")]
    SequenceGap { previous: u64, next: u64 },

    #[error("turn {turn} carries a playfield for sequence {playfield}")]
    SnapshotMismatch { turn: u64, playfield: u64 },

    #[error("inconsistent playfield: {0}")]
    InconsistentPlayfield(#[from] PlayfieldError),
}
